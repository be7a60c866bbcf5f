// Archivo: errors.rs
// Propósito: errores del robot y alias Result<T> de sus APIs.
use thiserror::Error;
use ticket_domain::{ConfigError, StoreError};

/// Errores que `TicketRobot` devuelve al llamador.
///
/// - `Config`: el robot no está configurado o la configuración es inválida;
///   no se hizo ninguna operación sobre la BD.
/// - `Store`: falló la lectura de tickets. Los fallos de escritura por fila
///   no se propagan, quedan en el `RunReport`.
/// - `Definition`: definición de robot ilegible.
#[derive(Error, Debug)]
pub enum RobotError {
    #[error("Error de configuración: {0}")]
    Config(#[from] ConfigError),
    #[error("Error de almacenamiento: {0}")]
    Store(#[from] StoreError),
    #[error("Definición de robot inválida: {0}")]
    Definition(String),
    #[error("Error de serialización: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RobotError {
    pub fn is_config(&self) -> bool {
        matches!(self, RobotError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, RobotError>;
