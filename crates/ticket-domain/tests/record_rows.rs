use ticket_domain::{FieldValue, StoreError, TicketRecord};

fn cols(names: &[&str]) -> Vec<String> {
  names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn from_row_coerces_id_and_defaults_nulls() -> Result<(), StoreError> {
  let rec = TicketRecord::from_row(&cols(&["id", "lastupdate", "update_log", "status"]),
                                   vec![FieldValue::Text("42".into()),
                                        FieldValue::Null,
                                        FieldValue::Null,
                                        FieldValue::Text("Unassigned".into())])?;
  assert_eq!(rec.id(), 42);
  assert_eq!(rec.lastupdate(), 0);
  assert_eq!(rec.update_log(), "");
  assert_eq!(rec.get("status"), Some(FieldValue::Text("Unassigned".into())));
  Ok(())
}

#[test]
fn from_row_rejects_bad_ids_and_mismatched_lengths() {
  let c = cols(&["id", "lastupdate", "update_log"]);
  assert!(matches!(TicketRecord::from_row(&c, vec![FieldValue::Text("abc".into()), FieldValue::Null, FieldValue::Null]),
                   Err(StoreError::Decode(_))));
  assert!(matches!(TicketRecord::from_row(&c, vec![FieldValue::Int(1)]), Err(StoreError::Decode(_))));
  assert!(matches!(TicketRecord::from_row(&cols(&["status"]), vec![FieldValue::Text("Open".into())]),
                   Err(StoreError::Decode(_))));
}

#[test]
fn assignments_exclude_id_and_end_with_robot_columns() {
  let rec = TicketRecord::new(5).with_field("status", "Open")
                                .with_field("priority", "Low")
                                .with_lastupdate(99)
                                .with_update_log("x");
  let names: Vec<String> = rec.assignments().into_iter().map(|(k, _)| k).collect();
  assert_eq!(names, vec!["priority", "status", "lastupdate", "update_log"]);
}
