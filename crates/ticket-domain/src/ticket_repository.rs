use crate::query::{SelectQuery, UpdateStatement};
use crate::record::TicketRecord;
use crate::{FieldValue, StoreError};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Conexión abierta contra la tabla de tickets.
pub trait TicketConnection {
    /// Ejecuta la lectura y devuelve un registro por fila, con las columnas en
    /// el orden de `query.columns`.
    fn fetch(&mut self, query: &SelectQuery) -> Result<Vec<TicketRecord>, StoreError>;

    /// Ejecuta un `UPDATE` de una fila y devuelve el número de filas
    /// afectadas.
    fn apply(&mut self, update: &UpdateStatement) -> Result<u64, StoreError>;
}

/// Fuente de conexiones a la base de datos de tickets (Postgres, SQLite o
/// memoria).
pub trait TicketRepository: Send + Sync {
    type Conn: TicketConnection;

    /// Abre una conexión nueva.
    fn connect(&self) -> Result<Self::Conn, StoreError>;

    /// Descripción corta para los logs (sin credenciales).
    fn describe(&self) -> String;
}

#[derive(Debug, Default)]
struct InMemoryState {
    rows: BTreeMap<i64, TicketRecord>,
    failing_ids: HashSet<i64>,
    fail_connect: bool,
    connects: usize,
    open_connections: usize,
    selects: usize,
    issued: Vec<UpdateStatement>,
}

/// Implementación en memoria para tests y desarrollo.
///
/// Evalúa el filtro en Rust y permite simular fallos de conexión o de
/// escritura por ticket. Los clones comparten el mismo estado.
#[derive(Debug, Clone)]
pub struct InMemoryTicketRepository {
    table: String,
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryTicketRepository {
    pub fn new(table: &str) -> Self {
        Self { table: table.to_string(), state: Arc::new(Mutex::new(InMemoryState::default())) }
    }

    pub fn with_rows(table: &str, rows: Vec<TicketRecord>) -> Self {
        let repo = Self::new(table);
        for r in rows {
            repo.insert(r);
        }
        repo
    }

    fn state(&self) -> MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert(&self, record: TicketRecord) {
        self.state().rows.insert(record.id(), record);
    }

    pub fn get(&self, id: i64) -> Option<TicketRecord> {
        self.state().rows.get(&id).cloned()
    }

    /// Modifica una fila fuera del robot (otro escritor concurrente).
    pub fn touch(&self, id: i64, column: &str, value: FieldValue) {
        if let Some(row) = self.state().rows.get_mut(&id) {
            row.set(column, value);
        }
    }

    /// Las escrituras sobre `id` fallarán con `StoreError::Query`.
    pub fn fail_writes_for(&self, id: i64) {
        self.state().failing_ids.insert(id);
    }

    pub fn fail_connections(&self, fail: bool) {
        self.state().fail_connect = fail;
    }

    pub fn connect_count(&self) -> usize {
        self.state().connects
    }

    /// Conexiones abiertas en este momento (se decrementa al soltarlas).
    pub fn open_connections(&self) -> usize {
        self.state().open_connections
    }

    pub fn select_count(&self) -> usize {
        self.state().selects
    }

    /// Sentencias `UPDATE` recibidas, incluidas las que fallaron.
    pub fn issued_updates(&self) -> Vec<UpdateStatement> {
        self.state().issued.clone()
    }
}

impl TicketRepository for InMemoryTicketRepository {
    type Conn = InMemoryConnection;

    fn connect(&self) -> Result<Self::Conn, StoreError> {
        let mut st = self.state();
        if st.fail_connect {
            return Err(StoreError::Connection("conexión en memoria deshabilitada".into()));
        }
        st.connects += 1;
        st.open_connections += 1;
        Ok(InMemoryConnection { table: self.table.clone(), state: self.state.clone() })
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.table)
    }
}

/// Conexión del repositorio en memoria.
#[derive(Debug)]
pub struct InMemoryConnection {
    table: String,
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryConnection {
    fn state(&self) -> MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_table(&self, table: &str) -> Result<(), StoreError> {
        if table != self.table {
            return Err(StoreError::Query(format!("no existe la tabla {}", table)));
        }
        Ok(())
    }
}

impl TicketConnection for InMemoryConnection {
    fn fetch(&mut self, query: &SelectQuery) -> Result<Vec<TicketRecord>, StoreError> {
        self.check_table(&query.table)?;
        let mut st = self.state();
        st.selects += 1;
        let columns = query.columns.as_slice();
        let mut out = Vec::new();
        for row in st.rows.values().filter(|r| query.filter.matches(r)) {
            let values = columns.iter().map(|c| row.get(c).unwrap_or(FieldValue::Null)).collect();
            out.push(TicketRecord::from_row(columns, values)?);
        }
        Ok(out)
    }

    fn apply(&mut self, update: &UpdateStatement) -> Result<u64, StoreError> {
        self.check_table(&update.table)?;
        let mut st = self.state();
        st.issued.push(update.clone());
        if st.failing_ids.contains(&update.id) {
            return Err(StoreError::Query(format!("fallo simulado al actualizar el ticket {}", update.id)));
        }
        let row = match st.rows.get_mut(&update.id) {
            Some(row) => row,
            None => return Ok(0),
        };
        if let Some(expected) = update.expected_lastupdate {
            if row.lastupdate() != expected {
                return Ok(0);
            }
        }
        for (column, value) in &update.assignments {
            row.set(column, value.clone());
        }
        Ok(1)
    }
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        let mut st = self.state();
        st.open_connections = st.open_connections.saturating_sub(1);
    }
}
