// sql.rs
//
// Traducción de `SelectQuery` / `UpdateStatement` a SQL parametrizado. Los
// identificadores se validan y se citan con comillas dobles; los valores van
// siempre como parámetros.
//
// En Postgres los tipos de las columnas (`ColumnTypes`, leídos de
// `information_schema`) deciden las conversiones: las comparaciones con
// enteros se hacen en numérico sobre columnas numéricas y los valores de texto
// se convierten al tipo de la columna destino al escribir.
use std::collections::HashMap;
use ticket_domain::{validate_identifier, validate_table_name, Condition, FieldValue, FilterExpr, SelectQuery,
                    StoreError, UpdateStatement, ID_COLUMN, LASTUPDATE_COLUMN};

/// Columna -> nombre del tipo (`udt_name` en Postgres).
pub type ColumnTypes = HashMap<String, String>;

const TEXT_TYPES: [&str; 5] = ["text", "varchar", "bpchar", "name", "citext"];
const NUMERIC_TYPES: [&str; 6] = ["int2", "int4", "int8", "numeric", "float4", "float8"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
  Sqlite,
  Postgres,
}

/// Sentencia lista para ejecutar: texto SQL y parámetros en orden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSql {
  pub sql: String,
  pub params: Vec<FieldValue>,
}

impl RenderedSql {
  fn bind(&mut self, dialect: Dialect, value: FieldValue) -> String {
    self.params.push(value);
    dialect.placeholder(self.params.len())
  }
}

pub fn quote_ident(name: &str) -> String {
  name.split('.').map(|part| format!("\"{}\"", part)).collect::<Vec<_>>().join(".")
}

fn is_integer_column(column: &str) -> bool {
  column == ID_COLUMN || column == LASTUPDATE_COLUMN
}

fn is_numeric_column(column: &str, types: &ColumnTypes) -> bool {
  is_integer_column(column) || types.get(column).map(|t| NUMERIC_TYPES.contains(&t.as_str())).unwrap_or(false)
}

fn as_text_param(value: &FieldValue) -> FieldValue {
  match value {
    FieldValue::Int(i) => FieldValue::Text(i.to_string()),
    other => other.clone(),
  }
}

fn query_err(e: impl std::fmt::Display) -> StoreError {
  StoreError::Query(e.to_string())
}

impl Dialect {
  pub fn placeholder(self, n: usize) -> String {
    match self {
      Dialect::Sqlite => format!("?{}", n),
      Dialect::Postgres => format!("${}", n),
    }
  }

  /// Expresión proyectada. En Postgres se normalizan los tipos para poder
  /// decodificar columnas arbitrarias: enteros como BIGINT y el resto como
  /// TEXT.
  fn select_expr(self, column: &str) -> String {
    let q = quote_ident(column);
    match self {
      Dialect::Sqlite => q,
      Dialect::Postgres if is_integer_column(column) => format!("CAST({} AS BIGINT) AS {}", q, q),
      Dialect::Postgres => format!("CAST({} AS TEXT) AS {}", q, q),
    }
  }

  /// Enlaza `value` para compararlo con `column`. Devuelve las expresiones
  /// izquierda y derecha.
  fn comparison(self, column: &str, value: &FieldValue, types: &ColumnTypes, out: &mut RenderedSql) -> (String, String) {
    let q = quote_ident(column);
    match self {
      Dialect::Sqlite => (q, out.bind(self, value.clone())),
      Dialect::Postgres if matches!(value, FieldValue::Int(_)) && is_numeric_column(column, types) => {
        let ph = out.bind(self, value.clone());
        (q, format!("CAST({} AS BIGINT)", ph))
      }
      Dialect::Postgres => {
        let ph = out.bind(self, as_text_param(value));
        (format!("CAST({} AS TEXT)", q), format!("CAST({} AS TEXT)", ph))
      }
    }
  }

  /// Valor asignado a `column` en un UPDATE.
  fn assignment(self, column: &str, value: &FieldValue, types: &ColumnTypes, out: &mut RenderedSql) -> String {
    if self == Dialect::Sqlite {
      return out.bind(self, value.clone());
    }
    if let FieldValue::Int(_) = value {
      let ph = out.bind(self, value.clone());
      return format!("CAST({} AS BIGINT)", ph);
    }
    let ph = out.bind(self, value.clone());
    match types.get(column) {
      Some(t) if !TEXT_TYPES.contains(&t.as_str()) && validate_identifier(t).is_ok() => {
        format!("CAST(CAST({} AS TEXT) AS {})", ph, quote_ident(t))
      }
      _ => format!("CAST({} AS TEXT)", ph),
    }
  }
}

fn render_condition(dialect: Dialect, cond: &Condition, types: &ColumnTypes, out: &mut RenderedSql) -> String {
  let column = cond.column();
  match cond {
    Condition::Compare { cmp, value, .. } => {
      let (lhs, rhs) = dialect.comparison(column, value, types, out);
      format!("{} {} {}", lhs, cmp.sql(), rhs)
    }
    Condition::Like { pattern, .. } | Condition::NotLike { pattern, .. } => {
      let op = if matches!(cond, Condition::Like { .. }) { "LIKE" } else { "NOT LIKE" };
      let (lhs, rhs) = dialect.comparison(column, &FieldValue::Text(pattern.clone()), types, out);
      format!("{} {} {}", lhs, op, rhs)
    }
    Condition::In { values, .. } => {
      let mut lhs = quote_ident(column);
      let mut items = Vec::with_capacity(values.len());
      for v in values {
        let (l, r) = dialect.comparison(column, v, types, out);
        lhs = l;
        items.push(r);
      }
      format!("{} IN ({})", lhs, items.join(", "))
    }
    Condition::IsNull { .. } => format!("{} IS NULL", quote_ident(column)),
    Condition::IsNotNull { .. } => format!("{} IS NOT NULL", quote_ident(column)),
  }
}

fn render_expr(dialect: Dialect, expr: &FilterExpr, types: &ColumnTypes, out: &mut RenderedSql)
               -> Result<String, StoreError> {
  let group = |parts: &[FilterExpr], sep: &str, out: &mut RenderedSql| -> Result<String, StoreError> {
    let mut rendered = Vec::with_capacity(parts.len());
    for p in parts {
      let s = render_expr(dialect, p, types, out)?;
      match p {
        FilterExpr::And(_) | FilterExpr::Or(_) => rendered.push(format!("({})", s)),
        _ => rendered.push(s),
      }
    }
    Ok(rendered.join(sep))
  };
  match expr {
    FilterExpr::Cond(cond) => {
      validate_identifier(cond.column()).map_err(query_err)?;
      // una lista IN mixta en Postgres necesita un único tipo de comparación
      if let (Dialect::Postgres, Condition::In { values, .. }) = (dialect, cond) {
        if values.iter().any(|v| !matches!(v, FieldValue::Int(_))) {
          let as_text: Vec<FieldValue> = values.iter().map(as_text_param).collect();
          let normalized = Condition::in_list(cond.column(), as_text);
          return Ok(render_condition(dialect, &normalized, types, out));
        }
      }
      Ok(render_condition(dialect, cond, types, out))
    }
    FilterExpr::And(parts) => group(parts, " AND ", out),
    FilterExpr::Or(parts) => group(parts, " OR ", out),
    FilterExpr::Not(inner) => Ok(format!("NOT ({})", render_expr(dialect, inner, types, out)?)),
  }
}

pub fn render_select(dialect: Dialect, query: &SelectQuery, types: &ColumnTypes) -> Result<RenderedSql, StoreError> {
  validate_table_name(&query.table).map_err(query_err)?;
  let mut out = RenderedSql { sql: String::new(), params: Vec::new() };
  let mut projected = Vec::with_capacity(query.columns.len());
  for column in query.columns.as_slice() {
    validate_identifier(column).map_err(query_err)?;
    projected.push(dialect.select_expr(column));
  }
  let predicate = render_expr(dialect, query.filter.expr(), types, &mut out)?;
  out.sql = format!("SELECT {} FROM {} WHERE ({}) ORDER BY {}",
                    projected.join(", "),
                    quote_ident(&query.table),
                    predicate,
                    quote_ident(ID_COLUMN));
  Ok(out)
}

pub fn render_update(dialect: Dialect, update: &UpdateStatement, types: &ColumnTypes)
                     -> Result<RenderedSql, StoreError> {
  validate_table_name(&update.table).map_err(query_err)?;
  if update.assignments.is_empty() {
    return Err(StoreError::Query(format!("UPDATE sin columnas para el ticket {}", update.id)));
  }
  let mut out = RenderedSql { sql: String::new(), params: Vec::new() };
  let mut sets = Vec::with_capacity(update.assignments.len());
  for (column, value) in &update.assignments {
    validate_identifier(column).map_err(query_err)?;
    if column == ID_COLUMN {
      continue;
    }
    let rhs = dialect.assignment(column, value, types, &mut out);
    sets.push(format!("{} = {}", quote_ident(column), rhs));
  }
  let (id_lhs, id_rhs) = dialect.comparison(ID_COLUMN, &FieldValue::Int(update.id), types, &mut out);
  let mut sql = format!("UPDATE {} SET {} WHERE {} = {}", quote_ident(&update.table), sets.join(", "), id_lhs, id_rhs);
  if let Some(expected) = update.expected_lastupdate {
    let (_, guard) = dialect.comparison(LASTUPDATE_COLUMN, &FieldValue::Int(expected), types, &mut out);
    sql.push_str(&format!(" AND COALESCE({}, 0) = {}", quote_ident(LASTUPDATE_COLUMN), guard));
  }
  out.sql = sql;
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use ticket_domain::{ColumnSet, TicketFilter, TicketRecord, UpdateSet};

  fn select_with(filter: &str) -> SelectQuery {
    let filter = TicketFilter::parse(filter).unwrap();
    let updates = UpdateSet::new(vec![("status", "Open"), ("priority", "Low")]).unwrap();
    SelectQuery::new("tickets", ColumnSet::for_updates(&updates), filter).unwrap()
  }

  fn select() -> SelectQuery {
    select_with(r#"status="Unassigned" AND short LIKE "%password%""#)
  }

  fn helpdesk_types() -> ColumnTypes {
    [("id", "int4"), ("lastupdate", "int4"), ("update_log", "text"), ("status", "varchar"),
     ("supporter_id", "int4"), ("groupid", "int4")].iter()
                                                    .map(|(c, t)| (c.to_string(), t.to_string()))
                                                    .collect()
  }

  #[test]
  fn sqlite_select_uses_numbered_placeholders() {
    let r = render_select(Dialect::Sqlite, &select(), &ColumnTypes::new()).unwrap();
    assert_eq!(r.sql,
               "SELECT \"id\", \"lastupdate\", \"update_log\", \"priority\", \"status\" FROM \"tickets\" WHERE \
                (\"status\" = ?1 AND \"short\" LIKE ?2) ORDER BY \"id\"");
    assert_eq!(r.params,
               vec![FieldValue::Text("Unassigned".into()), FieldValue::Text("%password%".into())]);
  }

  #[test]
  fn postgres_select_casts_columns() {
    let r = render_select(Dialect::Postgres, &select(), &ColumnTypes::new()).unwrap();
    assert!(r.sql.starts_with("SELECT CAST(\"id\" AS BIGINT) AS \"id\", CAST(\"lastupdate\" AS BIGINT) AS \"lastupdate\", \
                               CAST(\"update_log\" AS TEXT) AS \"update_log\""));
    assert!(r.sql.contains("CAST(\"status\" AS TEXT) = CAST($1 AS TEXT)"));
    assert!(r.sql.contains("CAST(\"short\" AS TEXT) LIKE CAST($2 AS TEXT)"));
  }

  #[test]
  fn or_not_and_in_keep_grouping_and_parameter_order() {
    let q = select_with(r#"(priority="High" OR priority="Urgent") AND NOT groupid IN (1, 2) AND supporter_id >= 3"#);
    let r = render_select(Dialect::Sqlite, &q, &ColumnTypes::new()).unwrap();
    assert!(r.sql.contains("WHERE ((\"priority\" = ?1 OR \"priority\" = ?2) AND NOT (\"groupid\" IN (?3, ?4)) AND \
                            \"supporter_id\" >= ?5)"),
            "{}",
            r.sql);
    assert_eq!(r.params,
               vec![FieldValue::Text("High".into()),
                    FieldValue::Text("Urgent".into()),
                    FieldValue::Int(1),
                    FieldValue::Int(2),
                    FieldValue::Int(3)]);
  }

  #[test]
  fn postgres_orders_numeric_columns_numerically() {
    let q = select_with("supporter_id > 0 AND groupid IN (1, 2) AND status < 5");
    let r = render_select(Dialect::Postgres, &q, &helpdesk_types()).unwrap();
    assert!(r.sql.contains("\"supporter_id\" > CAST($1 AS BIGINT)"), "{}", r.sql);
    assert!(r.sql.contains("\"groupid\" IN (CAST($2 AS BIGINT), CAST($3 AS BIGINT))"), "{}", r.sql);
    // columna de texto: el entero se compara como texto
    assert!(r.sql.contains("CAST(\"status\" AS TEXT) < CAST($4 AS TEXT)"), "{}", r.sql);
    assert_eq!(r.params[3], FieldValue::Text("5".into()));
  }

  #[test]
  fn postgres_mixed_in_list_compares_as_text() {
    let q = select_with(r#"groupid IN (1, "2")"#);
    let r = render_select(Dialect::Postgres, &q, &helpdesk_types()).unwrap();
    assert!(r.sql.contains("CAST(\"groupid\" AS TEXT) IN (CAST($1 AS TEXT), CAST($2 AS TEXT))"), "{}", r.sql);
    assert_eq!(r.params, vec![FieldValue::Text("1".into()), FieldValue::Text("2".into())]);
  }

  #[test]
  fn update_binds_every_value_and_id_last() {
    let rec = TicketRecord::new(7).with_field("status", "Open\"; DROP TABLE tickets; --")
                                  .with_lastupdate(1_700_000_000)
                                  .with_update_log("log");
    let r = render_update(Dialect::Sqlite, &UpdateStatement::for_record("tickets", &rec), &ColumnTypes::new()).unwrap();
    assert_eq!(r.sql,
               "UPDATE \"tickets\" SET \"status\" = ?1, \"lastupdate\" = ?2, \"update_log\" = ?3 WHERE \"id\" = ?4");
    assert_eq!(r.params[0], FieldValue::Text("Open\"; DROP TABLE tickets; --".into()));
    assert_eq!(r.params[3], FieldValue::Int(7));
  }

  #[test]
  fn postgres_update_converts_text_to_integer_columns() {
    let rec = TicketRecord::new(7).with_field("supporter_id", "12")
                                  .with_field("status", "Open")
                                  .with_lastupdate(1_700_000_000)
                                  .with_update_log("log");
    let r = render_update(Dialect::Postgres, &UpdateStatement::for_record("tickets", &rec), &helpdesk_types()).unwrap();
    assert!(r.sql.contains("\"supporter_id\" = CAST(CAST($2 AS TEXT) AS \"int4\")"), "{}", r.sql);
    assert!(r.sql.contains("\"status\" = CAST($1 AS TEXT)"), "{}", r.sql);
    assert!(r.sql.contains("\"lastupdate\" = CAST($3 AS BIGINT)"), "{}", r.sql);
    assert!(r.sql.contains("\"update_log\" = CAST($4 AS TEXT)"), "{}", r.sql);
    assert!(r.sql.ends_with("WHERE \"id\" = CAST($5 AS BIGINT)"), "{}", r.sql);
    assert_eq!(r.params[1], FieldValue::Text("12".into()));
  }

  #[test]
  fn postgres_update_without_types_keeps_text_casts() {
    let rec = TicketRecord::new(7).with_field("supporter_id", "12");
    let r = render_update(Dialect::Postgres, &UpdateStatement::for_record("tickets", &rec), &ColumnTypes::new()).unwrap();
    assert!(r.sql.contains("\"supporter_id\" = CAST($1 AS TEXT)"), "{}", r.sql);
  }

  #[test]
  fn guarded_update_adds_lastupdate_condition() {
    let rec = TicketRecord::new(3).with_field("status", "Open");
    let stmt = UpdateStatement::for_record("helpdesk.tickets", &rec).guarded_by(10);
    let r = render_update(Dialect::Postgres, &stmt, &ColumnTypes::new()).unwrap();
    assert!(r.sql.starts_with("UPDATE \"helpdesk\".\"tickets\" SET"));
    assert!(r.sql.ends_with("WHERE \"id\" = CAST($4 AS BIGINT) AND COALESCE(\"lastupdate\", 0) = CAST($5 AS BIGINT)"));
    assert_eq!(r.params.last(), Some(&FieldValue::Int(10)));
  }

  #[test]
  fn invalid_identifiers_never_reach_sql() {
    let stmt = UpdateStatement { table: "tickets".into(),
                                 id: 1,
                                 assignments: vec![("status = 1 --".into(), FieldValue::Null)],
                                 expected_lastupdate: None };
    assert!(matches!(render_update(Dialect::Sqlite, &stmt, &ColumnTypes::new()), Err(StoreError::Query(_))));
  }
}
