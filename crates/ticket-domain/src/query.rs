// query.rs
//
// Sentencias estructuradas que el robot entrega a la capa de persistencia.
// Cada backend las traduce a SQL con parámetros enlazados.
use crate::record::TicketRecord;
use crate::updates::{validate_table_name, ColumnSet};
use crate::{ConfigError, FieldValue, TicketFilter};

/// `SELECT <columns> FROM <table> WHERE <filter>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
  pub table: String,
  pub columns: ColumnSet,
  pub filter: TicketFilter,
}

impl SelectQuery {
  pub fn new(table: &str, columns: ColumnSet, filter: TicketFilter) -> Result<Self, ConfigError> {
    validate_table_name(table)?;
    Ok(Self { table: table.to_string(), columns, filter })
  }
}

/// `UPDATE <table> SET <assignments> WHERE id = <id>`, opcionalmente
/// condicionado a que `lastupdate` no haya cambiado desde la lectura.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatement {
  pub table: String,
  pub id: i64,
  pub assignments: Vec<(String, FieldValue)>,
  pub expected_lastupdate: Option<i64>,
}

impl UpdateStatement {
  /// Genera la sentencia a partir de un registro ya procesado. El `id` sale
  /// del conjunto de asignaciones y pasa a la condición.
  pub fn for_record(table: &str, record: &TicketRecord) -> Self {
    Self { table: table.to_string(), id: record.id(), assignments: record.assignments(), expected_lastupdate: None }
  }

  pub fn guarded_by(mut self, lastupdate: i64) -> Self {
    self.expected_lastupdate = Some(lastupdate);
    self
  }
}
