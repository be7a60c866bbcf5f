//! Binario `tixbot`: ejecuta periódicamente los robots de actualización de
//! tickets.
//!
//! Uso: `tixbot [--once]`. La conexión se toma de `TIXBOT_DB_*` (o `.env`),
//! los robots de `TIXBOT_ROBOTS` (por defecto `robots.json`; si no existe se
//! usa `PasswordsBot`).
mod logging;
mod settings;

use chrono::Utc;
use log::{error, info, warn};
use settings::DriverSettings;
use std::error::Error;
use ticket_domain::{ConnectionParams, TicketRepository};
use ticket_persistence::AnyTicketRepository;
use ticket_robot::{RobotDefinition, TicketRobot};
use uuid::Uuid;

fn build_robots(definitions: &[RobotDefinition],
                params: &ConnectionParams)
                -> Result<Vec<TicketRobot<AnyTicketRepository>>, Box<dyn Error>> {
    let mut robots = Vec::with_capacity(definitions.len());
    for def in definitions {
        let repo = ticket_persistence::new_from_params(params)?;
        match def.build(repo, &params.table) {
            Ok(robot) => {
                info!("Robot {} listo sobre {} ({})", robot.name(), robot.table(), robot.repository().describe());
                robots.push(robot)
            }
            Err(e) => error!("Robot {} descartado: {}", def.name, e),
        }
    }
    if robots.is_empty() {
        return Err("no hay robots utilizables".into());
    }
    Ok(robots)
}

/// Ejecuta cada robot una vez. Devuelve el total de tickets actualizados.
fn run_cycle<R: TicketRepository>(robots: &mut [TicketRobot<R>]) -> usize {
    let cycle = Uuid::new_v4();
    let mut updated = 0;
    let started = Utc::now();
    info!("Ciclo {} iniciado ({} robots)", cycle, robots.len());
    for robot in robots.iter_mut() {
        match robot.run() {
            Ok(report) if report.is_clean() => {
                updated += report.updated;
                info!("[{}] {}: {} de {} tickets actualizados",
                      cycle,
                      robot.name(),
                      report.updated,
                      report.matched)
            }
            Ok(report) => {
                updated += report.updated;
                warn!("[{}] {}: {} actualizados, fallaron {:?}, omitidos {:?}",
                      cycle,
                      robot.name(),
                      report.updated,
                      report.failed_ids(),
                      report.skipped)
            }
            Err(e) if e.is_config() => error!("[{}] {} mal configurado: {}", cycle, robot.name(), e),
            Err(e) => error!("[{}] {} falló: {}", cycle, robot.name(), e),
        }
    }
    let elapsed = Utc::now() - started;
    info!("Ciclo {} terminado en {} ms", cycle, elapsed.num_milliseconds());
    updated
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let settings = DriverSettings::from_lookup(|k| std::env::var(k).ok(), std::env::args().skip(1))?;
    logging::init_logging(&settings)?;

    let params = ticket_persistence::connection_params_from_env()?;
    info!("Conexión: {:?}", params);
    let definitions = settings.robot_definitions()?;
    let mut robots = build_robots(&definitions, &params)?;

    loop {
        run_cycle(&mut robots);
        if settings.once {
            break;
        }
        std::thread::sleep(settings.interval);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticket_domain::{Backend, TicketStubs};
    use ticket_persistence::schema::{create_tickets_table, insert_ticket};
    use ticket_persistence::SqliteTicketRepository;

    #[test]
    fn cycle_updates_sqlite_tickets_once() {
        let path = std::env::temp_dir().join(format!("tixbot_main_{}.db", Uuid::new_v4()));
        {
            let conn = SqliteTicketRepository::new(path.to_str().unwrap()).connect().unwrap();
            create_tickets_table(conn.raw(), "tickets").unwrap();
            for t in TicketStubs::sample_tickets() {
                insert_ticket(conn.raw(), "tickets", &t).unwrap();
            }
        }
        let params = ConnectionParams { backend: Backend::Sqlite,
                                        database: path.to_string_lossy().into_owned(),
                                        table: "tickets".into(),
                                        ..ConnectionParams::default() };
        let mut robots = build_robots(&[RobotDefinition::passwords_bot()], &params).unwrap();
        assert_eq!(run_cycle(&mut robots), 2);
        // los tickets ya abiertos no vuelven a cumplir el filtro
        assert_eq!(run_cycle(&mut robots), 0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unusable_definitions_leave_no_robots() {
        let params = ConnectionParams { backend: Backend::Sqlite, ..ConnectionParams::default() };
        let broken = RobotDefinition { filter: "status ~ 1".into(), ..RobotDefinition::passwords_bot() };
        assert!(build_robots(&[broken], &params).is_err());
    }
}
