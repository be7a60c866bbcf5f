// connection_params.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Motor de base de datos al que se conecta el robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  #[default]
  Postgres,
  Sqlite,
}

impl std::str::FromStr for Backend {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
      "sqlite" | "sqlite3" => Ok(Backend::Sqlite),
      other => Err(format!("backend desconocido: {}", other)),
    }
  }
}

/// Parámetros de conexión del robot. Los valores por defecto apuntan a una
/// instalación local; en producción se sobreescriben todos.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
  pub backend: Backend,
  pub host: String,
  pub port: Option<u16>,
  pub user: String,
  pub password: String,
  /// Nombre de la base de datos; con SQLite es la ruta del fichero.
  pub database: String,
  pub table: String,
}

impl Default for ConnectionParams {
  fn default() -> Self {
    Self { backend: Backend::default(),
           host: "localhost".into(),
           port: None,
           user: "root".into(),
           password: String::new(),
           database: "oneorzero".into(),
           table: "tickets".into() }
  }
}

impl fmt::Debug for ConnectionParams {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ConnectionParams")
     .field("backend", &self.backend)
     .field("host", &self.host)
     .field("port", &self.port)
     .field("user", &self.user)
     .field("password", &"<redacted>")
     .field("database", &self.database)
     .field("table", &self.table)
     .finish()
  }
}
