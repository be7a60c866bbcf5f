// errors.rs
use thiserror::Error;

/// Errores de configuración del robot. Se detectan antes de cualquier acceso
/// a la base de datos.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("No se definió el filtro del robot (set_filter)")]
  MissingFilter,
  #[error("No se definieron los valores nuevos del robot (set_updates)")]
  MissingUpdates,
  /// Equivalente a un error de tipo: los valores no forman un mapa
  /// campo -> valor utilizable.
  #[error("Valores de actualización inválidos: {0}")]
  InvalidUpdates(String),
  #[error("Nombre de columna o tabla inválido: {0}")]
  InvalidColumn(String),
  #[error("Filtro inválido: {0}")]
  InvalidFilter(String),
}

/// Errores de la capa de almacenamiento (conexión, ejecución o lectura de
/// filas).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
  #[error("Error de conexión: {0}")]
  Connection(String),
  #[error("Error de consulta: {0}")]
  Query(String),
  #[error("Error de decodificación: {0}")]
  Decode(String),
}
