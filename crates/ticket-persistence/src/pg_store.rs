use crate::sql::{render_select, render_update, ColumnTypes, Dialect};
use log::debug;
use postgres::types::ToSql;
use postgres::{Client, Config, NoTls};
use std::collections::HashMap;
use ticket_domain::{ConnectionParams, FieldValue, SelectQuery, StoreError, TicketConnection, TicketRecord,
                    TicketRepository, UpdateStatement, ID_COLUMN, LASTUPDATE_COLUMN};

fn map_db_err(e: postgres::Error) -> StoreError {
  StoreError::Query(format!("postgres: {}", e))
}

fn to_sql_params(values: &[FieldValue]) -> Vec<Box<dyn ToSql + Sync>> {
  values.iter()
        .map(|v| -> Box<dyn ToSql + Sync> {
          match v {
            FieldValue::Null => Box::new(Option::<String>::None),
            FieldValue::Int(i) => Box::new(*i),
            FieldValue::Text(s) => Box::new(s.clone()),
          }
        })
        .collect()
}

/// Repositorio Postgres. Conexión sin TLS con las credenciales de
/// `ConnectionParams`.
pub struct PgTicketRepository {
  config: Config,
  description: String,
}

impl PgTicketRepository {
  pub fn new(params: &ConnectionParams) -> Self {
    let mut config = Config::new();
    config.host(&params.host).user(&params.user).dbname(&params.database);
    if !params.password.is_empty() {
      config.password(&params.password);
    }
    if let Some(port) = params.port {
      config.port(port);
    }
    let description = format!("postgres://{}@{}:{}/{}",
                              params.user,
                              params.host,
                              params.port.unwrap_or(5432),
                              params.database);
    Self { config, description }
  }
}

impl TicketRepository for PgTicketRepository {
  type Conn = PgTicketConnection;

  fn connect(&self) -> Result<Self::Conn, StoreError> {
    let client = self.config
                     .connect(NoTls)
                     .map_err(|e| StoreError::Connection(format!("{}: {}", self.description, e)))?;
    Ok(PgTicketConnection { client, types: HashMap::new() })
  }

  fn describe(&self) -> String {
    self.description.clone()
  }
}

/// Conexión Postgres. Los tipos de las columnas de cada tabla se consultan
/// una vez por conexión.
pub struct PgTicketConnection {
  client: Client,
  types: HashMap<String, ColumnTypes>,
}

impl PgTicketConnection {
  fn column_types(&mut self, table: &str) -> Result<ColumnTypes, StoreError> {
    if let Some(types) = self.types.get(table) {
      return Ok(types.clone());
    }
    let (schema, name) = match table.split_once('.') {
      Some((schema, name)) => (Some(schema.to_string()), name.to_string()),
      None => (None, table.to_string()),
    };
    let rows = self.client
                   .query("SELECT column_name::text, udt_name::text FROM information_schema.columns WHERE \
                           table_name::text = $1::text AND table_schema::text = COALESCE($2::text, \
                           current_schema()::text)",
                          &[&name, &schema])
                   .map_err(map_db_err)?;
    let mut types = ColumnTypes::new();
    for row in rows {
      let column: String = row.try_get(0).map_err(map_db_err)?;
      let udt: String = row.try_get(1).map_err(map_db_err)?;
      types.insert(column, udt);
    }
    debug!("{}: {} columnas con tipo conocido", table, types.len());
    self.types.insert(table.to_string(), types.clone());
    Ok(types)
  }
}

impl TicketConnection for PgTicketConnection {
  fn fetch(&mut self, query: &SelectQuery) -> Result<Vec<TicketRecord>, StoreError> {
    let types = self.column_types(&query.table)?;
    let rendered = render_select(Dialect::Postgres, query, &types)?;
    debug!("select: {} ({} parámetros)", rendered.sql, rendered.params.len());
    let params = to_sql_params(&rendered.params);
    let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| &**p).collect();
    let rows = self.client.query(rendered.sql.as_str(), &refs).map_err(map_db_err)?;
    let columns = query.columns.as_slice();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
      let mut values = Vec::with_capacity(columns.len());
      for (i, column) in columns.iter().enumerate() {
        let value = if column == ID_COLUMN || column == LASTUPDATE_COLUMN {
          row.try_get::<_, Option<i64>>(i).map(FieldValue::from)
        } else {
          row.try_get::<_, Option<String>>(i).map(FieldValue::from)
        };
        values.push(value.map_err(|e| StoreError::Decode(format!("postgres {}: {}", column, e)))?);
      }
      out.push(TicketRecord::from_row(columns, values)?);
    }
    Ok(out)
  }

  fn apply(&mut self, update: &UpdateStatement) -> Result<u64, StoreError> {
    let types = self.column_types(&update.table)?;
    let rendered = render_update(Dialect::Postgres, update, &types)?;
    debug!("update: {} ({} parámetros)", rendered.sql, rendered.params.len());
    let params = to_sql_params(&rendered.params);
    let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| &**p).collect();
    self.client.execute(rendered.sql.as_str(), &refs).map_err(map_db_err)
  }
}
