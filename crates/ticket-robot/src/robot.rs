// Archivo: robot.rs
// Propósito: `TicketRobot`, el actualizador periódico de tickets.
//
// Un ciclo (`run`) selecciona las filas que cumplen el filtro, les aplica los
// valores nuevos, agrega una entrada de auditoría por campo y escribe cada
// fila por separado. La conexión se abre bajo demanda y se libera al terminar
// cada fase, también cuando hay errores.
use crate::audit::{audit_entry, DEFAULT_ATTRIBUTION};
use crate::errors::Result;
use crate::report::{RowFailure, RunReport};
use chrono::Utc;
use log::{debug, error, info, warn};
use serde_json::Value as JsonValue;
use ticket_domain::{ColumnSet, ConfigError, ConnectionSlot, FieldValue, SelectQuery, TicketConnection,
                    TicketFilter, TicketRecord, TicketRepository, UpdateSet, UpdateStatement};

/// Nombre usado cuando el robot no recibe uno.
pub const DEFAULT_ROBOT_NAME: &str = "UNK";

/// Fuente de marcas de tiempo (segundos desde epoch).
pub type Clock = fn() -> i64;

fn system_clock() -> i64 {
    Utc::now().timestamp()
}

/// Grado de configuración del robot. `run` sólo accede a la BD en `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotState {
    Unconfigured,
    FilterSet,
    UpdatesSet,
    Ready,
}

pub struct TicketRobot<R>
    where R: TicketRepository
{
    name: String,
    log_target: String,
    table: String,
    attribution: String,
    optimistic_guard: bool,
    filter: Option<TicketFilter>,
    updates: Option<UpdateSet>,
    columns: ColumnSet,
    slot: ConnectionSlot<R>,
    clock: Clock,
}

impl<R> TicketRobot<R> where R: TicketRepository
{
    /// Crea un robot sin configurar sobre `table`. Un nombre vacío se
    /// reemplaza por `UNK`; los logs del robot usan el target
    /// `TixBot_<nombre>`.
    pub fn new(name: &str, repository: R, table: &str) -> Self {
        let name = if name.trim().is_empty() { DEFAULT_ROBOT_NAME } else { name.trim() };
        let log_target = format!("TixBot_{}", name);
        debug!(target: log_target.as_str(), "Robot inicializado sobre {} ({})", table, repository.describe());
        Self { name: name.to_string(),
               slot: ConnectionSlot::new(repository, &log_target),
               log_target,
               table: table.to_string(),
               attribution: DEFAULT_ATTRIBUTION.to_string(),
               optimistic_guard: false,
               filter: None,
               updates: None,
               columns: ColumnSet::base(),
               clock: system_clock }
    }

    /// Autor que figura en las entradas de auditoría (por defecto `TixBot`).
    pub fn with_attribution(mut self, attribution: &str) -> Self {
        self.attribution = attribution.to_string();
        self
    }

    /// Con el guardado activo, una fila sólo se escribe si su `lastupdate`
    /// sigue siendo el leído; si otro escritor la modificó, se omite.
    pub fn with_optimistic_guard(mut self, enabled: bool) -> Self {
        self.optimistic_guard = enabled;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filter(&self) -> Option<&TicketFilter> {
        self.filter.as_ref()
    }

    pub fn updates(&self) -> Option<&UpdateSet> {
        self.updates.as_ref()
    }

    /// Columnas que se leen en cada ciclo: las base más las actualizadas.
    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn repository(&self) -> &R {
        self.slot.repository()
    }

    /// true si hay una conexión abierta. Fuera de `run` siempre es false.
    pub fn is_connected(&self) -> bool {
        self.slot.is_open()
    }

    pub fn state(&self) -> RobotState {
        match (self.filter.is_some(), self.updates.is_some()) {
            (false, false) => RobotState::Unconfigured,
            (true, false) => RobotState::FilterSet,
            (false, true) => RobotState::UpdatesSet,
            (true, true) => RobotState::Ready,
        }
    }

    /// Reemplaza el filtro. No toca la BD.
    pub fn set_filter(&mut self, filter: TicketFilter) {
        debug!(target: self.log_target.as_str(), "Filtro: {}", filter);
        self.filter = Some(filter);
    }

    /// Filtro en la sintaxis textual (`status="Unassigned" AND short LIKE
    /// "%password%"`). Si no se puede interpretar, el filtro anterior se
    /// mantiene.
    pub fn set_filter_str(&mut self, filter: &str) -> std::result::Result<(), ConfigError> {
        match TicketFilter::parse(filter) {
            Ok(f) => {
                self.set_filter(f);
                Ok(())
            }
            Err(e) => {
                error!(target: self.log_target.as_str(), "Filtro rechazado: {}", e);
                Err(e)
            }
        }
    }

    /// Reemplaza el conjunto de valores nuevos y recalcula las columnas a
    /// leer. Si los valores son inválidos no se registra nada.
    pub fn set_updates<I, K, V>(&mut self, values: I) -> std::result::Result<(), ConfigError>
        where I: IntoIterator<Item = (K, V)>,
              K: Into<String>,
              V: Into<String>
    {
        let updates = UpdateSet::new(values).inspect_err(|e| {
                                                error!(target: self.log_target.as_str(),
                                                       "Valores nuevos rechazados: {}", e)
                                            })?;
        self.install_updates(updates);
        Ok(())
    }

    /// Igual que `set_updates` pero desde JSON; sólo se acepta un objeto de
    /// valores escalares.
    pub fn set_updates_json(&mut self, values: &JsonValue) -> std::result::Result<(), ConfigError> {
        let updates = UpdateSet::from_json(values).inspect_err(|e| {
                                                      error!(target: self.log_target.as_str(),
                                                             "Valores nuevos rechazados: {}", e)
                                                  })?;
        self.install_updates(updates);
        Ok(())
    }

    fn install_updates(&mut self, updates: UpdateSet) {
        let target = self.log_target.as_str();
        for key in updates.keys() {
            debug!(target: target, "Columna {} agregada a la consulta", key);
        }
        self.columns = ColumnSet::for_updates(&updates);
        self.updates = Some(updates);
    }

    fn check_ready(&self) -> std::result::Result<TicketFilter, ConfigError> {
        let target = self.log_target.as_str();
        let filter = self.filter.clone().ok_or_else(|| {
                                            error!(target: target, "No se definió el filtro. Use set_filter");
                                            ConfigError::MissingFilter
                                        })?;
        if self.updates.is_none() {
            error!(target: target, "No se definieron los valores nuevos. Use set_updates");
            return Err(ConfigError::MissingUpdates);
        }
        Ok(filter)
    }

    /// Aplica los valores nuevos a cada registro: asigna el campo, agrega
    /// una entrada de auditoría por campo y fija `lastupdate`. No toca la
    /// BD.
    pub fn process_records(&self, records: Vec<TicketRecord>) -> std::result::Result<Vec<TicketRecord>, ConfigError> {
        let updates = self.updates.as_ref().ok_or(ConfigError::MissingUpdates)?;
        let target = self.log_target.as_str();
        let mut out = Vec::with_capacity(records.len());
        for mut record in records {
            let now = (self.clock)();
            for (field, value) in updates.iter() {
                record.set(field, FieldValue::Text(value.to_string()));
                record.append_log(&audit_entry(now, &self.attribution, field, value));
            }
            record.set_lastupdate(now);
            debug!(target: target, "{} procesado", record);
            out.push(record);
        }
        Ok(out)
    }

    /// Ejecuta un ciclo completo.
    ///
    /// Errores de configuración y de lectura se devuelven sin escribir nada.
    /// Un fallo al escribir una fila se registra en el informe, la conexión
    /// se descarta y el ciclo sigue con la fila siguiente.
    pub fn run(&mut self) -> Result<RunReport> {
        let filter = self.check_ready()?;
        let query = SelectQuery::new(&self.table, self.columns.clone(), filter).inspect_err(|e| {
                                                                                   error!(target: self.log_target.as_str(),
                                                                                          "Consulta inválida: {}", e)
                                                                               })?;

        let records = self.fetch(&query)?;
        if records.is_empty() {
            warn!(target: self.log_target.as_str(), "No hay registros para procesar");
            return Ok(RunReport::default());
        }

        let originals: Vec<i64> = records.iter().map(TicketRecord::lastupdate).collect();
        let processed = self.process_records(records)?;
        debug!(target: self.log_target.as_str(), "{} registros procesados", processed.len());

        let report = self.write_back(processed, originals);
        info!(target: self.log_target.as_str(),
              "Ciclo terminado: {} leídos, {} actualizados, {} con error, {} omitidos",
              report.matched,
              report.updated,
              report.failures.len(),
              report.skipped.len());
        Ok(report)
    }

    fn fetch(&mut self, query: &SelectQuery) -> Result<Vec<TicketRecord>> {
        let target = self.log_target.as_str();
        let mut session = self.slot.session();
        debug!(target: target, "Consultando registros");
        let records = session.connection()
                             .and_then(|conn| conn.fetch(query))
                             .inspect_err(|e| error!(target: target, "Error al consultar registros: {}", e))?;
        for record in &records {
            debug!(target: target, "{} encontrado", record);
        }
        Ok(records)
    }

    fn write_back(&mut self, processed: Vec<TicketRecord>, originals: Vec<i64>) -> RunReport {
        let target = self.log_target.as_str();
        let mut report = RunReport { matched: processed.len(), ..RunReport::default() };
        let mut session = self.slot.session();
        for (record, original) in processed.iter().zip(originals) {
            let mut statement = UpdateStatement::for_record(&self.table, record);
            if self.optimistic_guard {
                statement = statement.guarded_by(original);
            }
            match session.connection().and_then(|conn| conn.apply(&statement)) {
                Ok(0) if self.optimistic_guard => {
                    warn!(target: target, "{} cambió después de leerlo; no se actualiza", record);
                    report.skipped.push(record.id());
                }
                Ok(rows) => {
                    if rows == 0 {
                        warn!(target: target, "{} ya no existe en la BD", record);
                    } else {
                        info!(target: target, "{} actualizado en la BD", record);
                    }
                    report.updated += 1;
                }
                Err(e) => {
                    error!(target: target, "{} no se pudo actualizar: {}", record, e);
                    report.failures.push(RowFailure { id: record.id(), error: e });
                    session.reset();
                }
            }
        }
        report
    }
}
