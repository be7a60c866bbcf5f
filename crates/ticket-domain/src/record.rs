// record.rs
use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const ID_COLUMN: &str = "id";
pub const LASTUPDATE_COLUMN: &str = "lastupdate";
pub const UPDATE_LOG_COLUMN: &str = "update_log";
/// Columnas que el robot siempre proyecta, en este orden.
pub const BASE_COLUMNS: [&str; 3] = [ID_COLUMN, LASTUPDATE_COLUMN, UPDATE_LOG_COLUMN];

/// Valor de una columna tal como se lee o se escribe en la tabla de tickets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
  Null,
  Int(i64),
  Text(String),
}

impl FieldValue {
  pub fn is_null(&self) -> bool {
    matches!(self, FieldValue::Null)
  }

  /// Representación textual usada en comparaciones y en el registro de
  /// auditoría. `Null` no tiene texto.
  pub fn as_text(&self) -> Option<String> {
    match self {
      FieldValue::Null => None,
      FieldValue::Int(i) => Some(i.to_string()),
      FieldValue::Text(s) => Some(s.clone()),
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      FieldValue::Null => None,
      FieldValue::Int(i) => Some(*i),
      FieldValue::Text(s) => s.trim().parse().ok(),
    }
  }
}

impl fmt::Display for FieldValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FieldValue::Null => Ok(()),
      FieldValue::Int(i) => write!(f, "{}", i),
      FieldValue::Text(s) => f.write_str(s),
    }
  }
}

impl From<&str> for FieldValue {
  fn from(s: &str) -> Self {
    FieldValue::Text(s.to_string())
  }
}

impl From<String> for FieldValue {
  fn from(s: String) -> Self {
    FieldValue::Text(s)
  }
}

impl From<i64> for FieldValue {
  fn from(i: i64) -> Self {
    FieldValue::Int(i)
  }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
  fn from(v: Option<T>) -> Self {
    v.map(Into::into).unwrap_or(FieldValue::Null)
  }
}

/// Registro en memoria de un ticket leído de la base de datos.
///
/// Se construye a partir de la lista ordenada de columnas proyectadas y la
/// tupla correspondiente; el robot lo modifica (campos nuevos, `lastupdate`,
/// `update_log`) y luego lo consume para generar el `UPDATE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
  id: i64,
  lastupdate: i64,
  update_log: String,
  fields: BTreeMap<String, FieldValue>,
}

impl TicketRecord {
  pub fn new(id: i64) -> Self {
    Self { id, lastupdate: 0, update_log: String::new(), fields: BTreeMap::new() }
  }

  /// Reconstruye un registro a partir de columnas y valores en el mismo
  /// orden. El `id` se convierte a entero; `lastupdate` y `update_log` nulos
  /// se leen como `0` y cadena vacía.
  pub fn from_row(columns: &[String], values: Vec<FieldValue>) -> Result<Self, StoreError> {
    if columns.len() != values.len() {
      return Err(StoreError::Decode(format!("{} columnas pero {} valores", columns.len(), values.len())));
    }
    let mut id = None;
    let mut rec = TicketRecord::new(0);
    for (col, value) in columns.iter().zip(values) {
      match col.as_str() {
        ID_COLUMN => {
          let parsed = value.as_i64()
                            .ok_or_else(|| StoreError::Decode(format!("id no entero: {:?}", value)))?;
          id = Some(parsed);
        }
        LASTUPDATE_COLUMN => {
          rec.lastupdate = match &value {
            FieldValue::Null => 0,
            other => other.as_i64()
                          .ok_or_else(|| StoreError::Decode(format!("lastupdate no entero: {:?}", other)))?,
          };
        }
        UPDATE_LOG_COLUMN => rec.update_log = value.as_text().unwrap_or_default(),
        _ => {
          rec.fields.insert(col.clone(), value);
        }
      }
    }
    rec.id = id.ok_or_else(|| StoreError::Decode("la fila no contiene la columna id".into()))?;
    Ok(rec)
  }

  /// Builder usado por stubs y pruebas.
  pub fn with_field(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
    self.set(column, value.into());
    self
  }

  pub fn with_lastupdate(mut self, ts: i64) -> Self {
    self.lastupdate = ts;
    self
  }

  pub fn with_update_log(mut self, log: &str) -> Self {
    self.update_log = log.to_string();
    self
  }

  pub fn id(&self) -> i64 {
    self.id
  }

  pub fn lastupdate(&self) -> i64 {
    self.lastupdate
  }

  pub fn update_log(&self) -> &str {
    &self.update_log
  }

  pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
    &self.fields
  }

  /// Valor de cualquier columna, incluidas las gestionadas por el robot.
  pub fn get(&self, column: &str) -> Option<FieldValue> {
    match column {
      ID_COLUMN => Some(FieldValue::Int(self.id)),
      LASTUPDATE_COLUMN => Some(FieldValue::Int(self.lastupdate)),
      UPDATE_LOG_COLUMN => Some(FieldValue::Text(self.update_log.clone())),
      other => self.fields.get(other).cloned(),
    }
  }

  /// Asigna una columna. `id` no se puede modificar y se ignora.
  pub fn set(&mut self, column: &str, value: FieldValue) {
    match column {
      ID_COLUMN => {}
      LASTUPDATE_COLUMN => self.lastupdate = value.as_i64().unwrap_or(0),
      UPDATE_LOG_COLUMN => self.update_log = value.as_text().unwrap_or_default(),
      other => {
        self.fields.insert(other.to_string(), value);
      }
    }
  }

  pub fn set_lastupdate(&mut self, ts: i64) {
    self.lastupdate = ts;
  }

  pub fn append_log(&mut self, entry: &str) {
    self.update_log.push_str(entry);
  }

  /// Asignaciones del `UPDATE`: todas las columnas salvo `id`, con
  /// `lastupdate` y `update_log` al final.
  pub fn assignments(&self) -> Vec<(String, FieldValue)> {
    let mut out: Vec<(String, FieldValue)> = self.fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    out.push((LASTUPDATE_COLUMN.to_string(), FieldValue::Int(self.lastupdate)));
    out.push((UPDATE_LOG_COLUMN.to_string(), FieldValue::Text(self.update_log.clone())));
    out
  }
}

impl fmt::Display for TicketRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Ticket#{}", self.id)
  }
}
