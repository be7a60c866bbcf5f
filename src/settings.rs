// Configuración del binario: variables TIXBOT_* y argumentos de línea de
// comandos. La conexión a la BD la resuelve `ticket_persistence`.
use log::{info, LevelFilter};
use std::path::PathBuf;
use std::time::Duration;
use ticket_robot::{load_definitions, RobotDefinition, RobotError};

pub const DEFAULT_LOG_FILE: &str = "tixbot.log";
pub const DEFAULT_ROBOTS_FILE: &str = "robots.json";
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct DriverSettings {
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
    pub robots_file: PathBuf,
    pub interval: Duration,
    pub once: bool,
}

impl DriverSettings {
    pub fn from_lookup<F, A>(lookup: F, args: A) -> Result<Self, String>
        where F: Fn(&str) -> Option<String>,
              A: IntoIterator<Item = String>
    {
        let log_level = lookup("TIXBOT_LOG").and_then(|l| l.parse().ok()).unwrap_or(LevelFilter::Warn);
        let log_file = lookup("TIXBOT_LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.into());
        let robots_file = lookup("TIXBOT_ROBOTS").unwrap_or_else(|| DEFAULT_ROBOTS_FILE.into());
        let interval = match lookup("TIXBOT_INTERVAL_SECS") {
            Some(v) => v.trim()
                        .parse::<u64>()
                        .ok()
                        .filter(|s| *s > 0)
                        .ok_or_else(|| format!("TIXBOT_INTERVAL_SECS inválido: {}", v))?,
            None => DEFAULT_INTERVAL_SECS,
        };
        let mut once = false;
        for arg in args {
            match arg.as_str() {
                "--once" => once = true,
                other => return Err(format!("argumento desconocido: {} (uso: tixbot [--once])", other)),
            }
        }
        Ok(Self { log_level,
                  log_file: log_file.into(),
                  robots_file: robots_file.into(),
                  interval: Duration::from_secs(interval),
                  once })
    }

    /// Definiciones del fichero de robots; si no existe, el robot de
    /// contraseñas integrado.
    pub fn robot_definitions(&self) -> Result<Vec<RobotDefinition>, RobotError> {
        if !self.robots_file.exists() {
            info!("{} no existe; se usa PasswordsBot", self.robots_file.display());
            return Ok(vec![RobotDefinition::passwords_bot()]);
        }
        load_definitions(&self.robots_file)
    }
}
