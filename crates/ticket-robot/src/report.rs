use ticket_domain::StoreError;

/// Fila que no se pudo escribir en un ciclo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub id: i64,
    pub error: StoreError,
}

/// Resultado de un ciclo de `TicketRobot::run`.
///
/// `matched` cuenta las filas leídas; cada una termina en exactamente uno de
/// `updated`, `failures` o `skipped` (filas que otro escritor modificó, sólo
/// con el guardado optimista activo).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub matched: usize,
    pub updated: usize,
    pub failures: Vec<RowFailure>,
    pub skipped: Vec<i64>,
}

impl RunReport {
    /// true si el ciclo no encontró filas.
    pub fn is_empty(&self) -> bool {
        self.matched == 0
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<i64> {
        self.failures.iter().map(|f| f.id).collect()
    }
}
