// filter.rs
//
// Filtro del robot: expresión booleana (AND / OR / NOT) sobre condiciones de
// columnas del ticket. Los valores nunca se interpolan en el SQL; cada backend
// los enlaza como parámetros. También se acepta la sintaxis textual heredada
// (`status="Unassigned" AND short LIKE "%password%"`).
use crate::record::{FieldValue, TicketRecord};
use crate::updates::validate_identifier;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Operadores de comparación binaria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
  Eq,
  NotEq,
  Lt,
  Le,
  Gt,
  Ge,
}

impl CompareOp {
  pub fn sql(self) -> &'static str {
    match self {
      CompareOp::Eq => "=",
      CompareOp::NotEq => "<>",
      CompareOp::Lt => "<",
      CompareOp::Le => "<=",
      CompareOp::Gt => ">",
      CompareOp::Ge => ">=",
    }
  }

  fn holds(self, ord: Ordering) -> bool {
    match self {
      CompareOp::Eq => ord == Ordering::Equal,
      CompareOp::NotEq => ord != Ordering::Equal,
      CompareOp::Lt => ord == Ordering::Less,
      CompareOp::Le => ord != Ordering::Greater,
      CompareOp::Gt => ord == Ordering::Greater,
      CompareOp::Ge => ord != Ordering::Less,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
  Compare { column: String, cmp: CompareOp, value: FieldValue },
  Like { column: String, pattern: String },
  NotLike { column: String, pattern: String },
  In { column: String, values: Vec<FieldValue> },
  IsNull { column: String },
  IsNotNull { column: String },
}

impl Condition {
  pub fn compare(column: &str, cmp: CompareOp, value: impl Into<FieldValue>) -> Self {
    Condition::Compare { column: column.to_string(), cmp, value: value.into() }
  }

  pub fn eq(column: &str, value: impl Into<FieldValue>) -> Self {
    Self::compare(column, CompareOp::Eq, value)
  }

  pub fn not_eq(column: &str, value: impl Into<FieldValue>) -> Self {
    Self::compare(column, CompareOp::NotEq, value)
  }

  pub fn lt(column: &str, value: impl Into<FieldValue>) -> Self {
    Self::compare(column, CompareOp::Lt, value)
  }

  pub fn le(column: &str, value: impl Into<FieldValue>) -> Self {
    Self::compare(column, CompareOp::Le, value)
  }

  pub fn gt(column: &str, value: impl Into<FieldValue>) -> Self {
    Self::compare(column, CompareOp::Gt, value)
  }

  pub fn ge(column: &str, value: impl Into<FieldValue>) -> Self {
    Self::compare(column, CompareOp::Ge, value)
  }

  pub fn like(column: &str, pattern: impl Into<String>) -> Self {
    Condition::Like { column: column.to_string(), pattern: pattern.into() }
  }

  pub fn not_like(column: &str, pattern: impl Into<String>) -> Self {
    Condition::NotLike { column: column.to_string(), pattern: pattern.into() }
  }

  pub fn in_list<I, V>(column: &str, values: I) -> Self
    where I: IntoIterator<Item = V>,
          V: Into<FieldValue>
  {
    Condition::In { column: column.to_string(), values: values.into_iter().map(Into::into).collect() }
  }

  pub fn is_null(column: &str) -> Self {
    Condition::IsNull { column: column.to_string() }
  }

  pub fn is_not_null(column: &str) -> Self {
    Condition::IsNotNull { column: column.to_string() }
  }

  pub fn column(&self) -> &str {
    match self {
      Condition::Compare { column, .. }
      | Condition::Like { column, .. }
      | Condition::NotLike { column, .. }
      | Condition::In { column, .. }
      | Condition::IsNull { column }
      | Condition::IsNotNull { column } => column,
    }
  }

  /// Valores a enlazar como parámetros, en orden.
  pub fn bound_values(&self) -> Vec<FieldValue> {
    match self {
      Condition::Compare { value, .. } => vec![value.clone()],
      Condition::Like { pattern, .. } | Condition::NotLike { pattern, .. } => vec![FieldValue::Text(pattern.clone())],
      Condition::In { values, .. } => values.clone(),
      Condition::IsNull { .. } | Condition::IsNotNull { .. } => Vec::new(),
    }
  }

  /// Evalúa la condición con la lógica de tres valores de SQL: `None` es
  /// desconocido (columna nula o ausente comparada con un valor).
  pub fn eval(&self, record: &TicketRecord) -> Option<bool> {
    let current = record.get(self.column()).unwrap_or(FieldValue::Null);
    match self {
      Condition::Compare { cmp, value, .. } => compare_values(&current, value).map(|ord| cmp.holds(ord)),
      Condition::Like { pattern, .. } => current.as_text().map(|c| like_match(pattern, &c)),
      Condition::NotLike { pattern, .. } => current.as_text().map(|c| !like_match(pattern, &c)),
      Condition::In { values, .. } => {
        let mut unknown = current.is_null();
        for v in values {
          match compare_values(&current, v) {
            Some(Ordering::Equal) => return Some(true),
            Some(_) => {}
            None => unknown = true,
          }
        }
        if unknown {
          None
        } else {
          Some(false)
        }
      }
      Condition::IsNull { .. } => Some(current.is_null()),
      Condition::IsNotNull { .. } => Some(!current.is_null()),
    }
  }

  pub fn matches(&self, record: &TicketRecord) -> bool {
    self.eval(record) == Some(true)
  }
}

/// Compara como enteros cuando el literal es entero y la columna se puede
/// leer como entero; en otro caso compara texto.
fn compare_values(current: &FieldValue, value: &FieldValue) -> Option<Ordering> {
  if current.is_null() || value.is_null() {
    return None;
  }
  if let (FieldValue::Int(v), Some(c)) = (value, current.as_i64()) {
    return Some(c.cmp(v));
  }
  Some(current.as_text()?.cmp(&value.as_text()?))
}

fn fmt_value(f: &mut fmt::Formatter<'_>, v: &FieldValue) -> fmt::Result {
  match v {
    FieldValue::Null => f.write_str("NULL"),
    FieldValue::Int(i) => write!(f, "{}", i),
    FieldValue::Text(s) => write!(f, "{:?}", s),
  }
}

impl fmt::Display for Condition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Condition::Compare { column, cmp, value } => {
        write!(f, "{} {} ", column, cmp.sql())?;
        fmt_value(f, value)
      }
      Condition::Like { column, pattern } => write!(f, "{} LIKE {:?}", column, pattern),
      Condition::NotLike { column, pattern } => write!(f, "{} NOT LIKE {:?}", column, pattern),
      Condition::In { column, values } => {
        write!(f, "{} IN (", column)?;
        for (i, v) in values.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          fmt_value(f, v)?;
        }
        f.write_str(")")
      }
      Condition::IsNull { column } => write!(f, "{} IS NULL", column),
      Condition::IsNotNull { column } => write!(f, "{} IS NOT NULL", column),
    }
  }
}

/// `LIKE` con `%` (cualquier secuencia) y `_` (un carácter), sin distinguir
/// mayúsculas ASCII, como hacen SQLite y MySQL por defecto.
pub fn like_match(pattern: &str, value: &str) -> bool {
  let p: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();
  let v: Vec<char> = value.chars().map(|c| c.to_ascii_lowercase()).collect();
  let (mut pi, mut vi) = (0usize, 0usize);
  let mut backtrack: Option<(usize, usize)> = None;
  while vi < v.len() {
    if pi < p.len() && (p[pi] == '_' || (p[pi] != '%' && p[pi] == v[vi])) {
      pi += 1;
      vi += 1;
    } else if pi < p.len() && p[pi] == '%' {
      backtrack = Some((pi, vi));
      pi += 1;
    } else if let Some((bp, bv)) = backtrack {
      pi = bp + 1;
      vi = bv + 1;
      backtrack = Some((bp, bv + 1));
    } else {
      return false;
    }
  }
  p[pi..].iter().all(|c| *c == '%')
}

/// Árbol de la expresión del filtro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpr {
  Cond(Condition),
  And(Vec<FilterExpr>),
  Or(Vec<FilterExpr>),
  Not(Box<FilterExpr>),
}

impl FilterExpr {
  /// Conjunción; aplana los `And` anidados y devuelve el único término si
  /// sólo hay uno.
  pub fn and(parts: Vec<FilterExpr>) -> Self {
    Self::flatten(parts, true)
  }

  pub fn or(parts: Vec<FilterExpr>) -> Self {
    Self::flatten(parts, false)
  }

  pub fn not(inner: FilterExpr) -> Self {
    FilterExpr::Not(Box::new(inner))
  }

  fn flatten(parts: Vec<FilterExpr>, conjunction: bool) -> Self {
    let mut out = Vec::with_capacity(parts.len());
    for p in parts {
      match p {
        FilterExpr::And(inner) if conjunction => out.extend(inner),
        FilterExpr::Or(inner) if !conjunction => out.extend(inner),
        other => out.push(other),
      }
    }
    if out.len() == 1 {
      return out.remove(0);
    }
    if conjunction {
      FilterExpr::And(out)
    } else {
      FilterExpr::Or(out)
    }
  }

  pub fn eval(&self, record: &TicketRecord) -> Option<bool> {
    match self {
      FilterExpr::Cond(c) => c.eval(record),
      FilterExpr::And(parts) => {
        let mut result = Some(true);
        for p in parts {
          match p.eval(record) {
            Some(false) => return Some(false),
            None => result = None,
            Some(true) => {}
          }
        }
        result
      }
      FilterExpr::Or(parts) => {
        let mut result = Some(false);
        for p in parts {
          match p.eval(record) {
            Some(true) => return Some(true),
            None => result = None,
            Some(false) => {}
          }
        }
        result
      }
      FilterExpr::Not(inner) => inner.eval(record).map(|b| !b),
    }
  }

  fn collect<'a>(&'a self, out: &mut Vec<&'a Condition>) {
    match self {
      FilterExpr::Cond(c) => out.push(c),
      FilterExpr::And(parts) | FilterExpr::Or(parts) => parts.iter().for_each(|p| p.collect(out)),
      FilterExpr::Not(inner) => inner.collect(out),
    }
  }

  fn validate(&self) -> Result<(), ConfigError> {
    match self {
      FilterExpr::Cond(c) => {
        validate_identifier(c.column())?;
        if let Condition::In { values, .. } = c {
          if values.is_empty() {
            return Err(ConfigError::InvalidFilter(format!("lista IN vacía para {}", c.column())));
          }
        }
        Ok(())
      }
      FilterExpr::And(parts) | FilterExpr::Or(parts) => {
        if parts.is_empty() {
          return Err(ConfigError::InvalidFilter("el filtro no tiene condiciones".into()));
        }
        parts.iter().try_for_each(FilterExpr::validate)
      }
      FilterExpr::Not(inner) => inner.validate(),
    }
  }
}

impl From<Condition> for FilterExpr {
  fn from(c: Condition) -> Self {
    FilterExpr::Cond(c)
  }
}

impl fmt::Display for FilterExpr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let join = |f: &mut fmt::Formatter<'_>, parts: &[FilterExpr], sep: &str| -> fmt::Result {
      for (i, p) in parts.iter().enumerate() {
        if i > 0 {
          f.write_str(sep)?;
        }
        match p {
          FilterExpr::And(_) | FilterExpr::Or(_) => write!(f, "({})", p)?,
          _ => write!(f, "{}", p)?,
        }
      }
      Ok(())
    };
    match self {
      FilterExpr::Cond(c) => write!(f, "{}", c),
      FilterExpr::And(parts) => join(f, parts, " AND "),
      FilterExpr::Or(parts) => join(f, parts, " OR "),
      FilterExpr::Not(inner) => write!(f, "NOT ({})", inner),
    }
  }
}

/// Expresión que selecciona los tickets a procesar. Nunca está vacía y todas
/// sus columnas son identificadores válidos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FilterExpr", into = "FilterExpr")]
pub struct TicketFilter {
  expr: FilterExpr,
}

impl TicketFilter {
  pub fn new(expr: FilterExpr) -> Result<Self, ConfigError> {
    expr.validate()?;
    Ok(Self { expr })
  }

  /// Conjunción de condiciones. Un filtro vacío se rechaza: seleccionaría
  /// la tabla completa en cada ciclo.
  pub fn all(conditions: Vec<Condition>) -> Result<Self, ConfigError> {
    Self::new(FilterExpr::and(conditions.into_iter().map(FilterExpr::Cond).collect()))
  }

  /// Disyunción de condiciones.
  pub fn any(conditions: Vec<Condition>) -> Result<Self, ConfigError> {
    Self::new(FilterExpr::or(conditions.into_iter().map(FilterExpr::Cond).collect()))
  }

  /// Interpreta la sintaxis textual heredada.
  pub fn parse(input: &str) -> Result<Self, ConfigError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
      return Err(ConfigError::InvalidFilter("el filtro no tiene condiciones".into()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or_expr()?;
    if let Some(tok) = parser.peek() {
      return Err(ConfigError::InvalidFilter(format!("símbolo inesperado {:?}", tok)));
    }
    Self::new(expr)
  }

  pub fn expr(&self) -> &FilterExpr {
    &self.expr
  }

  /// Condiciones hoja, en orden de aparición.
  pub fn conditions(&self) -> Vec<&Condition> {
    let mut out = Vec::new();
    self.expr.collect(&mut out);
    out
  }

  pub fn matches(&self, record: &TicketRecord) -> bool {
    self.expr.eval(record) == Some(true)
  }
}

impl TryFrom<FilterExpr> for TicketFilter {
  type Error = ConfigError;

  fn try_from(expr: FilterExpr) -> Result<Self, Self::Error> {
    Self::new(expr)
  }
}

impl From<TicketFilter> for FilterExpr {
  fn from(f: TicketFilter) -> Self {
    f.expr
  }
}

impl fmt::Display for TicketFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.expr)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
  Ident(String),
  Str(String),
  Int(i64),
  Cmp(CompareOp),
  Comma,
  LParen,
  RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ConfigError> {
  let chars: Vec<char> = input.chars().collect();
  let mut out = Vec::new();
  let mut i = 0;
  while i < chars.len() {
    let c = chars[i];
    let next = chars.get(i + 1).copied();
    match c {
      c if c.is_whitespace() => i += 1,
      '(' => {
        out.push(Token::LParen);
        i += 1;
      }
      ')' => {
        out.push(Token::RParen);
        i += 1;
      }
      ',' => {
        out.push(Token::Comma);
        i += 1;
      }
      '=' => {
        out.push(Token::Cmp(CompareOp::Eq));
        i += 1;
      }
      '!' if next == Some('=') => {
        out.push(Token::Cmp(CompareOp::NotEq));
        i += 2;
      }
      '<' => {
        let (op, len) = match next {
          Some('>') => (CompareOp::NotEq, 2),
          Some('=') => (CompareOp::Le, 2),
          _ => (CompareOp::Lt, 1),
        };
        out.push(Token::Cmp(op));
        i += len;
      }
      '>' => {
        let (op, len) = if next == Some('=') { (CompareOp::Ge, 2) } else { (CompareOp::Gt, 1) };
        out.push(Token::Cmp(op));
        i += len;
      }
      '"' | '\'' => {
        let quote = c;
        let mut s = String::new();
        i += 1;
        loop {
          match chars.get(i) {
            None => return Err(ConfigError::InvalidFilter("cadena sin cerrar".into())),
            Some('\\') => {
              let escaped = chars.get(i + 1)
                                 .ok_or_else(|| ConfigError::InvalidFilter("escape al final de la cadena".into()))?;
              s.push(*escaped);
              i += 2;
            }
            Some(ch) if *ch == quote => {
              i += 1;
              break;
            }
            Some(ch) => {
              s.push(*ch);
              i += 1;
            }
          }
        }
        out.push(Token::Str(s));
      }
      c if c.is_ascii_digit() || (c == '-' && next.map(|d| d.is_ascii_digit()).unwrap_or(false)) => {
        let start = i;
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
          i += 1;
        }
        let text: String = chars[start..i].iter().collect();
        let n = text.parse::<i64>()
                    .map_err(|_| ConfigError::InvalidFilter(format!("entero fuera de rango: {}", text)))?;
        out.push(Token::Int(n));
      }
      c if c.is_ascii_alphabetic() || c == '_' => {
        let start = i;
        while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
          i += 1;
        }
        out.push(Token::Ident(chars[start..i].iter().collect()));
      }
      other => return Err(ConfigError::InvalidFilter(format!("carácter inesperado {:?}", other))),
    }
  }
  Ok(out)
}

/// Descenso recursivo; precedencia NOT > AND > OR.
struct Parser {
  tokens: Vec<Token>,
  pos: usize,
}

impl Parser {
  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn next(&mut self) -> Option<Token> {
    let tok = self.tokens.get(self.pos).cloned();
    self.pos += 1;
    tok
  }

  fn peek_keyword(&self, kw: &str) -> bool {
    matches!(self.peek(), Some(Token::Ident(s)) if s.eq_ignore_ascii_case(kw))
  }

  fn eat_keyword(&mut self, kw: &str) -> bool {
    let found = self.peek_keyword(kw);
    if found {
      self.pos += 1;
    }
    found
  }

  fn expect_keyword(&mut self, kw: &str) -> Result<(), ConfigError> {
    if self.eat_keyword(kw) {
      Ok(())
    } else {
      Err(ConfigError::InvalidFilter(format!("se esperaba {}", kw)))
    }
  }

  fn or_expr(&mut self) -> Result<FilterExpr, ConfigError> {
    let mut parts = vec![self.and_expr()?];
    while self.eat_keyword("OR") {
      parts.push(self.and_expr()?);
    }
    Ok(FilterExpr::or(parts))
  }

  fn and_expr(&mut self) -> Result<FilterExpr, ConfigError> {
    let mut parts = vec![self.unary()?];
    while self.eat_keyword("AND") {
      parts.push(self.unary()?);
    }
    Ok(FilterExpr::and(parts))
  }

  fn unary(&mut self) -> Result<FilterExpr, ConfigError> {
    if self.eat_keyword("NOT") {
      return Ok(FilterExpr::not(self.unary()?));
    }
    if self.peek() == Some(&Token::LParen) {
      self.pos += 1;
      let inner = self.or_expr()?;
      return match self.next() {
        Some(Token::RParen) => Ok(inner),
        _ => Err(ConfigError::InvalidFilter("falta ')'".into())),
      };
    }
    self.condition()
  }

  fn condition(&mut self) -> Result<FilterExpr, ConfigError> {
    let column = match self.next() {
      Some(Token::Ident(name)) => name,
      other => return Err(ConfigError::InvalidFilter(format!("se esperaba una columna, se encontró {:?}", other))),
    };
    let expr: FilterExpr = match self.next() {
      Some(Token::Cmp(op)) => Condition::compare(&column, op, self.literal()?).into(),
      Some(Token::Ident(kw)) if kw.eq_ignore_ascii_case("LIKE") => Condition::like(&column, self.pattern()?).into(),
      Some(Token::Ident(kw)) if kw.eq_ignore_ascii_case("IN") => Condition::in_list(&column, self.list()?).into(),
      Some(Token::Ident(kw)) if kw.eq_ignore_ascii_case("NOT") => {
        if self.eat_keyword("LIKE") {
          Condition::not_like(&column, self.pattern()?).into()
        } else {
          self.expect_keyword("IN")?;
          FilterExpr::not(Condition::in_list(&column, self.list()?).into())
        }
      }
      Some(Token::Ident(kw)) if kw.eq_ignore_ascii_case("IS") => {
        let negated = self.eat_keyword("NOT");
        self.expect_keyword("NULL")?;
        if negated {
          Condition::is_not_null(&column).into()
        } else {
          Condition::is_null(&column).into()
        }
      }
      other => {
        return Err(ConfigError::InvalidFilter(format!("operador inesperado tras {}: {:?}", column, other)));
      }
    };
    Ok(expr)
  }

  fn literal(&mut self) -> Result<FieldValue, ConfigError> {
    match self.next() {
      Some(Token::Str(s)) => Ok(FieldValue::Text(s)),
      Some(Token::Int(n)) => Ok(FieldValue::Int(n)),
      other => Err(ConfigError::InvalidFilter(format!("se esperaba un valor literal, se encontró {:?}", other))),
    }
  }

  fn pattern(&mut self) -> Result<String, ConfigError> {
    match self.next() {
      Some(Token::Str(s)) => Ok(s),
      other => Err(ConfigError::InvalidFilter(format!("se esperaba un patrón entre comillas, se encontró {:?}", other))),
    }
  }

  fn list(&mut self) -> Result<Vec<FieldValue>, ConfigError> {
    if self.next() != Some(Token::LParen) {
      return Err(ConfigError::InvalidFilter("se esperaba '(' tras IN".into()));
    }
    let mut values = vec![self.literal()?];
    loop {
      match self.next() {
        Some(Token::Comma) => values.push(self.literal()?),
        Some(Token::RParen) => return Ok(values),
        other => return Err(ConfigError::InvalidFilter(format!("lista IN mal formada: {:?}", other))),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ticket() -> TicketRecord {
    TicketRecord::new(1).with_field("status", "Unassigned")
                        .with_field("priority", "High")
                        .with_field("supporter_id", 0i64)
                        .with_field("groupid", "2")
  }

  #[test]
  fn parse_legacy_password_filter() -> Result<(), ConfigError> {
    let f = TicketFilter::parse(r#"status="Unassigned" AND short LIKE "%password%""#)?;
    assert_eq!(f.expr(),
               &FilterExpr::And(vec![Condition::eq("status", "Unassigned").into(),
                                     Condition::like("short", "%password%").into()]));
    Ok(())
  }

  #[test]
  fn parse_keywords_are_case_insensitive_and_parens_flatten() -> Result<(), ConfigError> {
    let f = TicketFilter::parse("(priority <> 'High' and (supporter_id is not null)) AND groupid = 4")?;
    assert_eq!(f.conditions(),
               vec![&Condition::not_eq("priority", "High"),
                    &Condition::is_not_null("supporter_id"),
                    &Condition::eq("groupid", 4i64)]);
    assert!(matches!(f.expr(), FilterExpr::And(parts) if parts.len() == 3));
    Ok(())
  }

  #[test]
  fn parse_or_binds_looser_than_and() -> Result<(), ConfigError> {
    let f = TicketFilter::parse(r#"status="New" AND priority="High" OR priority="Urgent""#)?;
    assert_eq!(f.expr(),
               &FilterExpr::Or(vec![FilterExpr::And(vec![Condition::eq("status", "New").into(),
                                                         Condition::eq("priority", "High").into()]),
                                    Condition::eq("priority", "Urgent").into()]));
    Ok(())
  }

  #[test]
  fn parse_ordering_in_and_not() -> Result<(), ConfigError> {
    let f = TicketFilter::parse("supporter_id > 0 AND lastupdate <= 10 AND groupid IN (1, 2) AND status NOT IN ('Closed')")?;
    assert_eq!(f.conditions(),
               vec![&Condition::gt("supporter_id", 0i64),
                    &Condition::le("lastupdate", 10i64),
                    &Condition::in_list("groupid", [1i64, 2]),
                    &Condition::in_list("status", ["Closed"])]);
    let FilterExpr::And(parts) = f.expr() else { panic!("se esperaba AND") };
    assert!(matches!(parts[3], FilterExpr::Not(_)));

    let f = TicketFilter::parse("NOT (a < 1 OR b >= 'x')")?;
    assert!(matches!(f.expr(), FilterExpr::Not(inner) if matches!(**inner, FilterExpr::Or(_))));
    Ok(())
  }

  #[test]
  fn parse_escaped_quote_stays_in_value() -> Result<(), ConfigError> {
    let f = TicketFilter::parse(r#"short = "say \"hi\"""#)?;
    assert_eq!(f.conditions()[0].bound_values(), vec![FieldValue::Text(r#"say "hi""#.into())]);
    Ok(())
  }

  #[test]
  fn parse_rejects_garbage() {
    for bad in ["a = ", "a = 'x", "a = 1; DROP TABLE tickets", "", "a IN ()", "a IN (1 2)", "a LIKE 3", "a OR", "(a = 1"] {
      assert!(matches!(TicketFilter::parse(bad), Err(ConfigError::InvalidFilter(_))), "{:?}", bad);
    }
    assert!(TicketFilter::all(vec![]).is_err());
    assert!(TicketFilter::all(vec![Condition::in_list("groupid", Vec::<i64>::new())]).is_err());
    assert!(TicketFilter::all(vec![Condition::eq("bad column", "x")]).is_err());
  }

  #[test]
  fn ordering_compares_numbers_numerically() {
    let t = ticket();
    assert!(Condition::gt("groupid", 1i64).matches(&t));
    assert!(!Condition::gt("groupid", 10i64).matches(&t));
    assert!(Condition::ge("supporter_id", 0i64).matches(&t));
    assert!(!Condition::lt("supporter_id", 0i64).matches(&t));
    assert!(Condition::le("priority", "High").matches(&t));
    assert!(Condition::lt("priority", "Low").matches(&t));
  }

  #[test]
  fn in_list_matches_any_member() {
    let t = ticket();
    assert!(Condition::in_list("priority", ["Urgent", "High"]).matches(&t));
    assert!(!Condition::in_list("priority", ["Low"]).matches(&t));
    assert!(Condition::in_list("groupid", [1i64, 2]).matches(&t));
  }

  #[test]
  fn or_and_not_evaluate_like_sql() -> Result<(), ConfigError> {
    let t = ticket();
    assert!(TicketFilter::parse(r#"priority="Urgent" OR priority="High""#)?.matches(&t));
    assert!(!TicketFilter::parse(r#"priority="Urgent" OR priority="Low""#)?.matches(&t));
    assert!(TicketFilter::parse(r#"NOT status="Open""#)?.matches(&t));
    // columna ausente: desconocido, y su negación también
    assert!(!TicketFilter::parse(r#"NOT category="General""#)?.matches(&t));
    assert!(TicketFilter::parse(r#"category="General" OR status="Unassigned""#)?.matches(&t));
    assert!(!TicketFilter::parse(r#"NOT (category="General" AND status="Unassigned")"#)?.matches(&t));
    assert!(!TicketFilter::parse(r#"status NOT IN ("Unassigned", "Open")"#)?.matches(&t));
    Ok(())
  }

  #[test]
  fn like_wildcards() {
    assert!(like_match("%password%", "Password help"));
    assert!(like_match("pass_ord", "password"));
    assert!(like_match("%", ""));
    assert!(!like_match("%password%", "passwd"));
    assert!(like_match("a%b%c", "axxbyyc"));
    assert!(!like_match("a%b%c", "axxbyy"));
  }

  #[test]
  fn null_never_matches_comparison() {
    let rec = TicketRecord::new(1).with_field("status", FieldValue::Null);
    assert!(!Condition::eq("status", "Open").matches(&rec));
    assert!(!Condition::not_eq("status", "Open").matches(&rec));
    assert!(Condition::is_null("status").matches(&rec));
    assert!(Condition::is_null("missing").matches(&rec));
  }

  #[test]
  fn display_round_trips_through_parse() -> Result<(), ConfigError> {
    let f = TicketFilter::parse(r#"(status = "New" OR status = "Unassigned") AND groupid IN (1, 2)"#)?;
    assert_eq!(TicketFilter::parse(&f.to_string())?, f);
    Ok(())
  }

  #[test]
  fn serde_rejects_invalid_filters() {
    let ok = serde_json::to_string(&TicketFilter::parse("groupid > 1").unwrap()).unwrap();
    assert!(serde_json::from_str::<TicketFilter>(&ok).is_ok());
    assert!(serde_json::from_str::<TicketFilter>(r#"{"and": []}"#).is_err());
  }
}
