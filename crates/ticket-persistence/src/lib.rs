//! Persistencia de tickets sobre bases de datos relacionales.
//!
//! Implementa `TicketRepository` para SQLite (`rusqlite`) y, con la feature
//! `pg`, para Postgres (`postgres`). Todas las sentencias se generan con
//! parámetros enlazados (ver `sql`). `AnyTicketRepository` elige el backend en
//! tiempo de ejecución a partir de `ConnectionParams`.

#[cfg(feature = "pg")]
mod pg_store;
pub mod schema;
pub mod sql;
mod sqlite_store;

#[cfg(feature = "pg")]
pub use pg_store::{PgTicketConnection, PgTicketRepository};
pub use sqlite_store::{SqliteTicketConnection, SqliteTicketRepository};
pub use ticket_domain::{Backend, ConnectionParams};

use ticket_domain::{SelectQuery, StoreError, TicketConnection, TicketRecord,
                    TicketRepository, UpdateStatement};

/// Repositorio seleccionado en tiempo de ejecución.
pub enum AnyTicketRepository {
  Sqlite(SqliteTicketRepository),
  #[cfg(feature = "pg")]
  Postgres(PgTicketRepository),
}

pub enum AnyTicketConnection {
  Sqlite(SqliteTicketConnection),
  #[cfg(feature = "pg")]
  Postgres(PgTicketConnection),
}

impl TicketRepository for AnyTicketRepository {
  type Conn = AnyTicketConnection;

  fn connect(&self) -> Result<Self::Conn, StoreError> {
    match self {
      AnyTicketRepository::Sqlite(r) => r.connect().map(AnyTicketConnection::Sqlite),
      #[cfg(feature = "pg")]
      AnyTicketRepository::Postgres(r) => r.connect().map(AnyTicketConnection::Postgres),
    }
  }

  fn describe(&self) -> String {
    match self {
      AnyTicketRepository::Sqlite(r) => r.describe(),
      #[cfg(feature = "pg")]
      AnyTicketRepository::Postgres(r) => r.describe(),
    }
  }
}

impl TicketConnection for AnyTicketConnection {
  fn fetch(&mut self, query: &SelectQuery) -> Result<Vec<TicketRecord>, StoreError> {
    match self {
      AnyTicketConnection::Sqlite(c) => c.fetch(query),
      #[cfg(feature = "pg")]
      AnyTicketConnection::Postgres(c) => c.fetch(query),
    }
  }

  fn apply(&mut self, update: &UpdateStatement) -> Result<u64, StoreError> {
    match self {
      AnyTicketConnection::Sqlite(c) => c.apply(update),
      #[cfg(feature = "pg")]
      AnyTicketConnection::Postgres(c) => c.apply(update),
    }
  }
}

/// Construye el repositorio indicado por `params.backend`.
pub fn new_from_params(params: &ConnectionParams) -> Result<AnyTicketRepository, StoreError> {
  match params.backend {
    Backend::Sqlite => Ok(AnyTicketRepository::Sqlite(SqliteTicketRepository::new(&params.database))),
    #[cfg(feature = "pg")]
    Backend::Postgres => Ok(AnyTicketRepository::Postgres(PgTicketRepository::new(params))),
    #[cfg(not(feature = "pg"))]
    Backend::Postgres => Err(StoreError::Connection("ticket-persistence se compiló sin la feature 'pg'; habilítela \
                                                     para usar Postgres"
                                                                        .into())),
  }
}

/// Lee los parámetros de conexión de las variables `TIXBOT_DB_*` sobre los
/// valores por defecto. `lookup` permite inyectar el entorno en pruebas.
pub fn connection_params_from<F>(lookup: F) -> Result<ConnectionParams, StoreError>
  where F: Fn(&str) -> Option<String>
{
  let mut params = ConnectionParams::default();
  if let Some(b) = lookup("TIXBOT_DB_BACKEND") {
    params.backend = b.parse().map_err(StoreError::Connection)?;
  }
  if let Some(host) = lookup("TIXBOT_DB_HOST") {
    params.host = host;
  }
  if let Some(port) = lookup("TIXBOT_DB_PORT") {
    let parsed = port.trim()
                     .parse::<u16>()
                     .map_err(|_| StoreError::Connection(format!("TIXBOT_DB_PORT inválido: {}", port)))?;
    params.port = Some(parsed);
  }
  if let Some(user) = lookup("TIXBOT_DB_USER") {
    params.user = user;
  }
  if let Some(pass) = lookup("TIXBOT_DB_PASS") {
    params.password = pass;
  }
  if let Some(db) = lookup("TIXBOT_DB_NAME") {
    params.database = db;
  }
  if let Some(table) = lookup("TIXBOT_DB_TABLE") {
    params.table = table;
  }
  Ok(params)
}

/// Carga `.env` (si existe) y devuelve los parámetros del entorno del
/// proceso.
pub fn connection_params_from_env() -> Result<ConnectionParams, StoreError> {
  dotenvy::dotenv().ok();
  connection_params_from(|k| std::env::var(k).ok())
}

/// Crear repo desde las variables de entorno.
pub fn new_from_env() -> Result<(AnyTicketRepository, ConnectionParams), StoreError> {
  let params = connection_params_from_env()?;
  let repo = new_from_params(&params)?;
  Ok((repo, params))
}
