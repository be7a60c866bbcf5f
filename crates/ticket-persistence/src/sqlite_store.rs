use crate::sql::{render_select, render_update, ColumnTypes, Dialect};
use log::debug;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use std::time::Duration;
use ticket_domain::{FieldValue, SelectQuery, StoreError, TicketConnection, TicketRecord, TicketRepository,
                    UpdateStatement};

pub(crate) fn to_sql_value(v: &FieldValue) -> SqlValue {
  match v {
    FieldValue::Null => SqlValue::Null,
    FieldValue::Int(i) => SqlValue::Integer(*i),
    FieldValue::Text(s) => SqlValue::Text(s.clone()),
  }
}

fn from_sql_value(v: SqlValue) -> FieldValue {
  match v {
    SqlValue::Null => FieldValue::Null,
    SqlValue::Integer(i) => FieldValue::Int(i),
    SqlValue::Real(f) => FieldValue::Text(f.to_string()),
    SqlValue::Text(s) => FieldValue::Text(s),
    SqlValue::Blob(b) => FieldValue::Text(String::from_utf8_lossy(&b).into_owned()),
  }
}

fn map_db_err(e: rusqlite::Error) -> StoreError {
  StoreError::Query(format!("sqlite: {}", e))
}

/// Repositorio SQLite: cada `connect` abre el fichero de base de datos.
#[derive(Debug, Clone)]
pub struct SqliteTicketRepository {
  path: String,
}

impl SqliteTicketRepository {
  pub fn new(path: &str) -> Self {
    Self { path: path.to_string() }
  }

  pub fn path(&self) -> &str {
    &self.path
  }
}

impl TicketRepository for SqliteTicketRepository {
  type Conn = SqliteTicketConnection;

  fn connect(&self) -> Result<Self::Conn, StoreError> {
    let conn = Connection::open(&self.path).map_err(|e| StoreError::Connection(format!("sqlite {}: {}", self.path, e)))?;
    conn.busy_timeout(Duration::from_millis(5000))
        .map_err(|e| StoreError::Connection(format!("sqlite busy_timeout: {}", e)))?;
    Ok(SqliteTicketConnection { conn })
  }

  fn describe(&self) -> String {
    format!("sqlite:{}", self.path)
  }
}

pub struct SqliteTicketConnection {
  conn: Connection,
}

impl SqliteTicketConnection {
  /// Acceso a la conexión subyacente (esquema y datos de prueba).
  pub fn raw(&self) -> &Connection {
    &self.conn
  }
}

impl TicketConnection for SqliteTicketConnection {
  fn fetch(&mut self, query: &SelectQuery) -> Result<Vec<TicketRecord>, StoreError> {
    let rendered = render_select(Dialect::Sqlite, query, &ColumnTypes::new())?;
    debug!("select: {} ({} parámetros)", rendered.sql, rendered.params.len());
    let columns = query.columns.as_slice();
    let mut stmt = self.conn.prepare(&rendered.sql).map_err(map_db_err)?;
    let mut rows = stmt.query(params_from_iter(rendered.params.iter().map(to_sql_value)))
                       .map_err(map_db_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(map_db_err)? {
      let mut values = Vec::with_capacity(columns.len());
      for i in 0..columns.len() {
        let v: SqlValue = row.get(i).map_err(|e| StoreError::Decode(format!("sqlite: {}", e)))?;
        values.push(from_sql_value(v));
      }
      out.push(TicketRecord::from_row(columns, values)?);
    }
    Ok(out)
  }

  fn apply(&mut self, update: &UpdateStatement) -> Result<u64, StoreError> {
    let rendered = render_update(Dialect::Sqlite, update, &ColumnTypes::new())?;
    debug!("update: {} ({} parámetros)", rendered.sql, rendered.params.len());
    let n = self.conn
                .execute(&rendered.sql, params_from_iter(rendered.params.iter().map(to_sql_value)))
                .map_err(map_db_err)?;
    Ok(n as u64)
  }
}
