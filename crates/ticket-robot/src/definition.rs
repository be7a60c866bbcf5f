// Archivo: definition.rs
// Propósito: definiciones de robots en JSON para el binario.
//
// Formato del fichero: una lista de objetos
//   [{"name": "PasswordsBot",
//     "filter": "status=\"Unassigned\" AND short LIKE \"%password%\"",
//     "updates": {"status": "Open", "priority": "Low"}}]
// `attribution` y `optimistic_guard` son opcionales.
use crate::errors::{Result, RobotError};
use crate::robot::TicketRobot;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use ticket_domain::TicketRepository;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotDefinition {
    pub name: String,
    pub filter: String,
    pub updates: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(default)]
    pub optimistic_guard: bool,
}

impl RobotDefinition {
    /// Robot que asigna los tickets sin asignar sobre contraseñas.
    pub fn passwords_bot() -> Self {
        Self { name: "PasswordsBot".into(),
               filter: r#"status="Unassigned" AND short LIKE "%password%""#.into(),
               updates: serde_json::json!({
                   "priority": "Low",
                   "severity": "4 - Low",
                   "status": "Open",
                   "category": "Password Reset",
                   "platform": "Windows",
                   "project": "Not Applicable"
               }),
               attribution: None,
               optimistic_guard: false }
    }

    /// Construye un robot listo para `run` sobre `repository`.
    pub fn build<R>(&self, repository: R, table: &str) -> Result<TicketRobot<R>>
        where R: TicketRepository
    {
        let mut robot = TicketRobot::new(&self.name, repository, table).with_optimistic_guard(self.optimistic_guard);
        if let Some(attribution) = &self.attribution {
            robot = robot.with_attribution(attribution);
        }
        robot.set_filter_str(&self.filter)?;
        robot.set_updates_json(&self.updates)?;
        Ok(robot)
    }
}

pub fn parse_definitions(json: &str) -> Result<Vec<RobotDefinition>> {
    let defs: Vec<RobotDefinition> = serde_json::from_str(json)?;
    if defs.is_empty() {
        return Err(RobotError::Definition("la lista de robots está vacía".into()));
    }
    Ok(defs)
}

pub fn load_definitions(path: &Path) -> Result<Vec<RobotDefinition>> {
    let text = std::fs::read_to_string(path).map_err(|e| RobotError::Definition(format!("{}: {}", path.display(), e)))?;
    parse_definitions(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default() {
        let defs = parse_definitions(r#"[{"name": "A", "filter": "status=\"New\"", "updates": {"status": "Open"}}]"#).unwrap();
        assert_eq!(defs[0].attribution, None);
        assert!(!defs[0].optimistic_guard);
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(parse_definitions("[]"), Err(RobotError::Definition(_))));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        assert!(matches!(parse_definitions("{"), Err(RobotError::Serialization(_))));
    }
}
