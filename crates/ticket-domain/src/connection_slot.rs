// connection_slot.rs
use crate::ticket_repository::TicketRepository;
use crate::StoreError;
use log::debug;

/// Ciclo de vida explícito de la conexión del robot: `Absent` u `Open`.
///
/// `acquire` abre la conexión sólo si no existe y la reutiliza en otro caso;
/// `release` la cierra y vuelve al estado ausente.
pub struct ConnectionSlot<R: TicketRepository> {
  repo: R,
  conn: Option<R::Conn>,
  log_target: String,
}

impl<R: TicketRepository> ConnectionSlot<R> {
  pub fn new(repo: R, log_target: &str) -> Self {
    Self { repo, conn: None, log_target: log_target.to_string() }
  }

  pub fn repository(&self) -> &R {
    &self.repo
  }

  pub fn is_open(&self) -> bool {
    self.conn.is_some()
  }

  pub fn acquire(&mut self) -> Result<&mut R::Conn, StoreError> {
    let target = self.log_target.as_str();
    if self.conn.is_some() {
      debug!(target: target, "Conexión a la BD ya establecida.");
    } else {
      debug!(target: target, "Sin conexión a la BD ({}). Estableciendo...", self.repo.describe());
      self.conn = Some(self.repo.connect()?);
      debug!(target: target, "Conexión a la BD establecida.");
    }
    self.conn.as_mut().ok_or_else(|| StoreError::Connection("conexión no disponible".into()))
  }

  pub fn release(&mut self) {
    let target = self.log_target.as_str();
    match self.conn.take() {
      Some(conn) => {
        drop(conn);
        debug!(target: target, "Desconectado de la BD.");
      }
      None => debug!(target: target, "La BD ya estaba desconectada."),
    }
  }

  /// Préstamo con alcance: la conexión se libera al soltar la sesión, en
  /// cualquier camino de salida.
  pub fn session(&mut self) -> Session<'_, R> {
    Session { slot: self }
  }
}

pub struct Session<'a, R: TicketRepository> {
  slot: &'a mut ConnectionSlot<R>,
}

impl<R: TicketRepository> Session<'_, R> {
  pub fn connection(&mut self) -> Result<&mut R::Conn, StoreError> {
    self.slot.acquire()
  }

  /// Cierra la conexión actual; la siguiente llamada a `connection` abre otra.
  pub fn reset(&mut self) {
    self.slot.release();
  }

  pub fn is_open(&self) -> bool {
    self.slot.is_open()
  }
}

impl<R: TicketRepository> Drop for Session<'_, R> {
  fn drop(&mut self) {
    self.slot.release();
  }
}
