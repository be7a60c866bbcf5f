use ticket_domain::{FieldValue, InMemoryConnection, InMemoryTicketRepository, SelectQuery, StoreError,
                    TicketConnection, TicketRecord, TicketRepository, TicketStubs, UpdateStatement};
use ticket_robot::{audit_entry, RobotError, TicketRobot};

const NOW: i64 = 1_700_000_000;

fn password_robot<R: TicketRepository>(repo: R) -> TicketRobot<R> {
    let mut robot = TicketRobot::new("PasswordsBot", repo, "tickets").with_clock(|| NOW);
    robot.set_filter_str(r#"status="Unassigned" AND short LIKE "%password%""#).unwrap();
    robot.set_updates([("status", "Open"), ("priority", "Low")]).unwrap();
    robot
}

fn text(s: &str) -> Option<FieldValue> {
    Some(FieldValue::Text(s.into()))
}

#[test]
fn updates_every_matching_row() {
    let repo = TicketStubs::sample_repo("tickets");
    let mut robot = password_robot(repo.clone());
    let report = robot.run().unwrap();

    assert_eq!(report.matched, 2);
    assert_eq!(report.updated, 2);
    assert!(report.is_clean());
    assert_eq!(repo.issued_updates().len(), 2);
    for id in [7, 8] {
        let t = repo.get(id).unwrap();
        assert_eq!(t.get("status"), text("Open"));
        assert_eq!(t.get("priority"), text("Low"));
        assert_eq!(t.lastupdate(), NOW);
    }
    // filas que no cumplen el filtro quedan intactas
    assert_eq!(repo.get(9).unwrap().get("priority"), text("Low"));
    assert_eq!(repo.get(10).unwrap().get("status"), text("Unassigned"));
    assert_eq!(repo.get(10).unwrap().lastupdate(), 0);
}

#[test]
fn appends_one_entry_per_field_in_key_order() {
    let repo = TicketStubs::sample_repo("tickets");
    let before = repo.get(8).unwrap().update_log().to_string();
    password_robot(repo.clone()).run().unwrap();

    let expected = format!("{}{}{}",
                           before,
                           audit_entry(NOW, "TixBot", "priority", "Low"),
                           audit_entry(NOW, "TixBot", "status", "Open"));
    assert_eq!(repo.get(8).unwrap().update_log(), expected);
    assert_eq!(repo.get(7).unwrap().update_log(),
               "1700000000 $lang_by TixBot --//--$lang_priority changed to Low--//--1700000000 $lang_by TixBot \
                --//--$lang_status changed to Open--//--");
}

#[test]
fn attribution_is_configurable() {
    let repo = TicketStubs::sample_repo("tickets");
    let mut robot = password_robot(repo.clone()).with_attribution("NightShift");
    robot.run().unwrap();
    assert!(repo.get(7).unwrap().update_log().starts_with("1700000000 $lang_by NightShift --//--"));
}

#[test]
fn no_matches_means_no_writes() {
    let repo = TicketStubs::sample_repo("tickets");
    let mut robot = password_robot(repo.clone());
    robot.set_filter_str(r#"status="Closed""#).unwrap();
    let report = robot.run().unwrap();
    assert!(report.is_empty());
    assert_eq!(report.updated, 0);
    assert!(repo.issued_updates().is_empty());
    assert_eq!(repo.select_count(), 1);
    assert_eq!(repo.open_connections(), 0);
}

#[test]
fn empty_cycle_is_logged_as_warning_under_robot_target() {
    testing_logger::setup();
    let repo = TicketStubs::sample_repo("tickets");
    let mut robot = password_robot(repo);
    robot.set_filter_str(r#"status="Closed""#).unwrap();
    robot.run().unwrap();
    testing_logger::validate(|captured| {
        let warnings: Vec<_> = captured.iter()
                                       .filter(|l| l.level == log::Level::Warn && l.target == "TixBot_PasswordsBot")
                                       .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].body, "No hay registros para procesar");
    });
}

#[test]
fn single_row_failure_does_not_stop_the_cycle() {
    let repo = TicketStubs::sample_repo("tickets");
    repo.fail_writes_for(7);
    let mut robot = password_robot(repo.clone());
    let report = robot.run().unwrap();

    assert_eq!(report.matched, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.failed_ids(), vec![7]);
    assert!(matches!(report.failures[0].error, StoreError::Query(_)));
    assert_eq!(repo.get(7).unwrap().get("status"), text("Unassigned"));
    assert_eq!(repo.get(8).unwrap().get("status"), text("Open"));
    // lectura, escritura, y reconexión tras el fallo
    assert_eq!(repo.connect_count(), 3);
    assert_eq!(repo.open_connections(), 0);
}

#[test]
fn connection_released_after_every_run() {
    let repo = TicketStubs::sample_repo("tickets");
    let mut robot = password_robot(repo.clone());
    robot.run().unwrap();
    assert!(!robot.is_connected());
    assert_eq!(repo.open_connections(), 0);

    // segunda pasada: las filas ya no cumplen el filtro
    let report = robot.run().unwrap();
    assert!(report.is_empty());
    assert_eq!(repo.open_connections(), 0);
}

#[test]
fn read_failure_is_returned_and_releases_connection() {
    let repo = TicketStubs::sample_repo("tickets");
    let mut robot = TicketRobot::new("Wrong", repo.clone(), "helpdesk");
    robot.set_filter_str(r#"status="Unassigned""#).unwrap();
    robot.set_updates([("status", "Open")]).unwrap();
    assert!(matches!(robot.run(), Err(RobotError::Store(StoreError::Query(_)))));
    assert_eq!(repo.connect_count(), 1);
    assert_eq!(repo.open_connections(), 0);
    assert!(!robot.is_connected());
}

#[test]
fn connect_failure_is_a_store_error() {
    let repo = TicketStubs::sample_repo("tickets");
    repo.fail_connections(true);
    let mut robot = password_robot(repo.clone());
    assert!(matches!(robot.run(), Err(RobotError::Store(StoreError::Connection(_)))));
    assert!(repo.issued_updates().is_empty());
}

#[test]
fn process_records_does_not_touch_db() {
    let repo = InMemoryTicketRepository::new("tickets");
    let robot = password_robot(repo.clone());
    let out = robot.process_records(vec![TicketRecord::new(1).with_field("status", "Unassigned")]).unwrap();
    assert_eq!(out[0].get("status"), text("Open"));
    assert_eq!(out[0].lastupdate(), NOW);
    assert_eq!(repo.connect_count(), 0);
}

/// Repositorio que simula otro escritor: modifica `victim` justo antes de
/// que llegue su UPDATE.
struct RacingRepo {
    inner: InMemoryTicketRepository,
    victim: i64,
}

struct RacingConn {
    conn: InMemoryConnection,
    repo: InMemoryTicketRepository,
    victim: i64,
}

impl TicketRepository for RacingRepo {
    type Conn = RacingConn;

    fn connect(&self) -> Result<Self::Conn, StoreError> {
        Ok(RacingConn { conn: self.inner.connect()?, repo: self.inner.clone(), victim: self.victim })
    }

    fn describe(&self) -> String {
        "racing".into()
    }
}

impl TicketConnection for RacingConn {
    fn fetch(&mut self, query: &SelectQuery) -> Result<Vec<TicketRecord>, StoreError> {
        self.conn.fetch(query)
    }

    fn apply(&mut self, update: &UpdateStatement) -> Result<u64, StoreError> {
        if update.id == self.victim {
            self.repo.touch(self.victim, "lastupdate", FieldValue::Int(1_650_000_000));
        }
        self.conn.apply(update)
    }
}

#[test]
fn optimistic_guard_skips_rows_changed_by_others() {
    let inner = TicketStubs::sample_repo("tickets");
    let racing = RacingRepo { inner: inner.clone(), victim: 8 };
    let mut robot = password_robot(racing).with_optimistic_guard(true);
    let report = robot.run().unwrap();

    assert_eq!(report.matched, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.skipped, vec![8]);
    assert!(report.failures.is_empty());
    assert_eq!(inner.get(8).unwrap().get("status"), text("Unassigned"));
    assert_eq!(inner.get(7).unwrap().get("status"), text("Open"));
}

#[test]
fn without_guard_last_writer_wins() {
    let inner = TicketStubs::sample_repo("tickets");
    let racing = RacingRepo { inner: inner.clone(), victim: 8 };
    let report = password_robot(racing).run().unwrap();
    assert_eq!(report.updated, 2);
    assert_eq!(inner.get(8).unwrap().lastupdate(), NOW);
}
