use crate::ticket_repository::InMemoryTicketRepository;
use crate::TicketRecord;

pub struct TicketStubs;

impl TicketStubs {
    /// Tickets de ejemplo de una mesa de ayuda: dos pendientes de reinicio de
    /// contraseña, uno ya abierto y uno de correo.
    pub fn sample_tickets() -> Vec<TicketRecord> {
        vec![TicketRecord::new(7).with_field("status", "Unassigned")
                                 .with_field("short", "password help")
                                 .with_field("priority", "High")
                                 .with_field("category", "General"),
             TicketRecord::new(8).with_field("status", "Unassigned")
                                 .with_field("short", "Forgot my PASSWORD again")
                                 .with_field("priority", "Medium")
                                 .with_field("category", "General")
                                 .with_lastupdate(1_400_000_000)
                                 .with_update_log("1400000000 $lang_by helpdesk --//--$lang_status changed to Unassigned--//--"),
             TicketRecord::new(9).with_field("status", "Open")
                                 .with_field("short", "password expired")
                                 .with_field("priority", "Low")
                                 .with_field("category", "Password Reset"),
             TicketRecord::new(10).with_field("status", "Unassigned")
                                  .with_field("short", "mailbox full")
                                  .with_field("priority", "Medium")
                                  .with_field("category", "Email Help")]
    }

    /// Repositorio en memoria pre-poblado con `sample_tickets`.
    pub fn sample_repo(table: &str) -> InMemoryTicketRepository {
        InMemoryTicketRepository::with_rows(table, Self::sample_tickets())
    }
}
