// Esquema simplificado de la tabla de tickets (OneOrZero) para SQLite.
// Se usa en pruebas y en el modo local del binario; en producción la tabla
// ya existe y no se migra.
use crate::sql::quote_ident;
use crate::sqlite_store::to_sql_value;
use rusqlite::{params_from_iter, Connection};
use ticket_domain::{validate_identifier, validate_table_name, FieldValue, StoreError, TicketRecord};

/// Columnas de dominio de la tabla de tickets, además de `id`, `lastupdate`
/// y `update_log`.
pub const TICKET_COLUMNS: [&str; 15] = ["groupid", "supporter", "supporter_id", "priority", "status", "user", "email",
                                        "office", "phone", "category", "platform", "short", "survey", "severity",
                                        "project"];

pub fn create_tickets_table(conn: &Connection, table: &str) -> Result<(), StoreError> {
  validate_table_name(table).map_err(|e| StoreError::Query(e.to_string()))?;
  let mut cols = vec!["\"id\" INTEGER PRIMARY KEY".to_string()];
  cols.extend(TICKET_COLUMNS.iter().map(|c| format!("{} TEXT", quote_ident(c))));
  cols.push("\"lastupdate\" INTEGER NOT NULL DEFAULT 0".into());
  cols.push("\"update_log\" TEXT NOT NULL DEFAULT ''".into());
  let ddl = format!("CREATE TABLE IF NOT EXISTS {} ({})", quote_ident(table), cols.join(", "));
  conn.execute(&ddl, []).map_err(|e| StoreError::Query(format!("sqlite: {}", e)))?;
  Ok(())
}

/// Inserta (o reemplaza) un ticket completo.
pub fn insert_ticket(conn: &Connection, table: &str, record: &TicketRecord) -> Result<(), StoreError> {
  validate_table_name(table).map_err(|e| StoreError::Query(e.to_string()))?;
  let mut names = vec![quote_ident("id")];
  let mut values = vec![FieldValue::Int(record.id())];
  for (column, value) in record.assignments() {
    validate_identifier(&column).map_err(|e| StoreError::Query(e.to_string()))?;
    names.push(quote_ident(&column));
    values.push(value);
  }
  let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
  let sql = format!("INSERT OR REPLACE INTO {} ({}) VALUES ({})",
                    quote_ident(table),
                    names.join(", "),
                    placeholders.join(", "));
  conn.execute(&sql, params_from_iter(values.iter().map(to_sql_value))).map_err(|e| StoreError::Query(format!("sqlite: {}", e)))?;
  Ok(())
}
