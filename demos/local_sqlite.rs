// Demo local: crea una base SQLite temporal con tickets de ejemplo, ejecuta
// PasswordsBot dos veces y muestra el estado final.
//
//   cargo run --example local_sqlite
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::error::Error;
use ticket_domain::{ColumnSet, SelectQuery, TicketConnection, TicketFilter, TicketRepository, TicketStubs};
use ticket_persistence::schema::{create_tickets_table, insert_ticket};
use ticket_persistence::SqliteTicketRepository;
use ticket_robot::RobotDefinition;
use uuid::Uuid;

fn main() -> Result<(), Box<dyn Error>> {
    TermLogger::init(LevelFilter::Debug, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;

    let path = std::env::temp_dir().join(format!("tixbot_demo_{}.db", Uuid::new_v4()));
    let repo = SqliteTicketRepository::new(&path.to_string_lossy());
    {
        let conn = repo.connect()?;
        create_tickets_table(conn.raw(), "tickets")?;
        for t in TicketStubs::sample_tickets() {
            insert_ticket(conn.raw(), "tickets", &t)?;
        }
    }

    let mut robot = RobotDefinition::passwords_bot().build(repo.clone(), "tickets")?;
    for pass in 1..=2 {
        let report = robot.run()?;
        println!("Pasada {}: {} encontrados, {} actualizados", pass, report.matched, report.updated);
    }

    let mut conn = repo.connect()?;
    let all = TicketFilter::parse("id IS NOT NULL")?;
    let columns = ColumnSet::for_updates(robot.updates().ok_or("robot sin valores")?);
    for t in conn.fetch(&SelectQuery::new("tickets", columns, all)?)? {
        println!("{} status={} log={}",
                 t,
                 t.get("status").map(|v| v.to_string()).unwrap_or_default(),
                 t.update_log());
    }
    drop(conn);
    std::fs::remove_file(&path)?;
    Ok(())
}
