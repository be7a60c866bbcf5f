// updates.rs
use crate::record::{BASE_COLUMNS, ID_COLUMN, LASTUPDATE_COLUMN, UPDATE_LOG_COLUMN};
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Valida un nombre de columna. Los identificadores no se pueden enlazar
/// como parámetros, así que sólo se aceptan `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(name: &str) -> Result<(), ConfigError> {
  let mut chars = name.chars();
  let first_ok = chars.next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false);
  if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
    return Err(ConfigError::InvalidColumn(format!("{:?}", name)));
  }
  Ok(())
}

/// Valida un nombre de tabla, opcionalmente calificado con esquema
/// (`helpdesk.tickets`).
pub fn validate_table_name(name: &str) -> Result<(), ConfigError> {
  let parts: Vec<&str> = name.split('.').collect();
  if parts.len() > 2 {
    return Err(ConfigError::InvalidColumn(format!("{:?}", name)));
  }
  parts.into_iter().try_for_each(validate_identifier)
}

/// Conjunto fijo de valores campo -> valor que el robot aplica a cada ticket.
///
/// Se itera en orden lexicográfico de campo, de modo que las entradas del
/// registro de auditoría siempre salen en el mismo orden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSet {
  values: BTreeMap<String, String>,
}

impl UpdateSet {
  pub fn new<I, K, V>(values: I) -> Result<Self, ConfigError>
    where I: IntoIterator<Item = (K, V)>,
          K: Into<String>,
          V: Into<String>
  {
    let mut map = BTreeMap::new();
    for (k, v) in values {
      let key = k.into();
      validate_identifier(&key)?;
      if BASE_COLUMNS.contains(&key.as_str()) {
        return Err(ConfigError::InvalidUpdates(format!("la columna {} la gestiona el robot", key)));
      }
      map.insert(key, v.into());
    }
    if map.is_empty() {
      return Err(ConfigError::InvalidUpdates("el conjunto de valores está vacío".into()));
    }
    Ok(Self { values: map })
  }

  /// Construye el conjunto desde JSON. Cualquier cosa que no sea un objeto
  /// se rechaza; los valores escalares se guardan como texto.
  pub fn from_json(value: &JsonValue) -> Result<Self, ConfigError> {
    let obj = match value {
      JsonValue::Object(obj) => obj,
      other => {
        return Err(ConfigError::InvalidUpdates(format!("se esperaba un objeto, se recibió {}", json_kind(other))));
      }
    };
    let mut pairs = Vec::with_capacity(obj.len());
    for (k, v) in obj {
      let text = match v {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        other => {
          return Err(ConfigError::InvalidUpdates(format!("valor de {} no escalar: {}", k, json_kind(other))));
        }
      };
      pairs.push((k.clone(), text));
    }
    Self::new(pairs)
  }

  pub fn get(&self, field: &str) -> Option<&str> {
    self.values.get(field).map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.values.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

fn json_kind(v: &JsonValue) -> &'static str {
  match v {
    JsonValue::Null => "null",
    JsonValue::Bool(_) => "bool",
    JsonValue::Number(_) => "number",
    JsonValue::String(_) => "string",
    JsonValue::Array(_) => "array",
    JsonValue::Object(_) => "object",
  }
}

/// Lista ordenada de columnas proyectadas en cada lectura: las columnas base
/// seguidas de cada campo del `UpdateSet` que no sea base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
  columns: Vec<String>,
}

impl ColumnSet {
  pub fn base() -> Self {
    Self { columns: vec![ID_COLUMN.to_string(), LASTUPDATE_COLUMN.to_string(), UPDATE_LOG_COLUMN.to_string()] }
  }

  pub fn for_updates(updates: &UpdateSet) -> Self {
    let mut set = Self::base();
    for key in updates.keys() {
      if !set.contains(key) {
        set.columns.push(key.to_string());
      }
    }
    set
  }

  pub fn contains(&self, column: &str) -> bool {
    self.columns.iter().any(|c| c == column)
  }

  pub fn as_slice(&self) -> &[String] {
    &self.columns
  }

  pub fn len(&self) -> usize {
    self.columns.len()
  }

  pub fn is_empty(&self) -> bool {
    self.columns.is_empty()
  }
}

impl Default for ColumnSet {
  fn default() -> Self {
    Self::base()
  }
}
