mod connection_params;
mod connection_slot;
mod errors;
mod filter;
mod query;
mod record;
mod ticket_repository;
mod ticket_stubs;
mod updates;

pub use connection_params::{Backend, ConnectionParams};
pub use connection_slot::{ConnectionSlot, Session};
pub use errors::{ConfigError, StoreError};
pub use filter::{like_match, CompareOp, Condition, FilterExpr, TicketFilter};
pub use query::{SelectQuery, UpdateStatement};
pub use record::{FieldValue, TicketRecord, BASE_COLUMNS, ID_COLUMN, LASTUPDATE_COLUMN, UPDATE_LOG_COLUMN};
pub use ticket_repository::{InMemoryConnection, InMemoryTicketRepository, TicketConnection, TicketRepository};
pub use ticket_stubs::TicketStubs;
pub use updates::{validate_identifier, validate_table_name, ColumnSet, UpdateSet};
