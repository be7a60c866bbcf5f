use crate::settings::DriverSettings;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::error::Error;
use std::fs::OpenOptions;

/// Logs a terminal y al fichero `settings.log_file` (en modo append), ambos
/// con el nivel configurado. El target (`TixBot_<robot>`) se muestra siempre.
pub fn init_logging(settings: &DriverSettings) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = settings.log_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&settings.log_file)?;
    let config = ConfigBuilder::new().set_target_level(LevelFilter::Error)
                                     .set_time_format_rfc3339()
                                     .build();
    CombinedLogger::init(vec![TermLogger::new(settings.log_level,
                                              config.clone(),
                                              TerminalMode::Mixed,
                                              ColorChoice::Auto),
                              WriteLogger::new(settings.log_level, config, file)])?;
    Ok(())
}
