//! Crate `ticket-robot`: actualizador periódico de tickets.
//!
//! `TicketRobot` selecciona los tickets que cumplen un filtro, les asigna un
//! conjunto fijo de valores, deja constancia de cada cambio en `update_log`
//! y escribe cada fila por separado. La BD se abstrae con `TicketRepository`
//! (ver `ticket-domain` y `ticket-persistence`).
//!
//! ```rust
//! use ticket_domain::TicketStubs;
//! use ticket_robot::TicketRobot;
//!
//! let repo = TicketStubs::sample_repo("tickets");
//! let mut robot = TicketRobot::new("PasswordsBot", repo, "tickets");
//! robot.set_filter_str(r#"status="Unassigned" AND short LIKE "%password%""#).unwrap();
//! robot.set_updates([("status", "Open"), ("priority", "Low")]).unwrap();
//! let report = robot.run().unwrap();
//! assert_eq!(report.updated, 2);
//! ```
pub mod audit;
pub mod definition;
pub mod errors;
pub mod report;
pub mod robot;

pub use audit::{audit_entry, DEFAULT_ATTRIBUTION};
pub use definition::{load_definitions, parse_definitions, RobotDefinition};
pub use errors::{Result, RobotError};
pub use report::{RowFailure, RunReport};
pub use robot::{Clock, RobotState, TicketRobot, DEFAULT_ROBOT_NAME};
