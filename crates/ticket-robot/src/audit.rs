// Archivo: audit.rs
// Propósito: formato de las entradas que el robot agrega a `update_log`.
//
// Es el formato de OneOrZero: cada cambio genera una cabecera con marca de
// tiempo y autor seguida de la descripción del cambio, ambas terminadas en
// `--//--`. Los `$lang_*` los traduce la interfaz web.

/// Atribución por defecto de los cambios hechos por el robot.
pub const DEFAULT_ATTRIBUTION: &str = "TixBot";

const SEPARATOR: &str = "--//--";

/// Entrada de auditoría para un campo cambiado en el instante `ts`
/// (segundos desde epoch).
pub fn audit_entry(ts: i64, attribution: &str, field: &str, value: &str) -> String {
    format!("{ts} $lang_by {attribution} {SEPARATOR}$lang_{field} changed to {value}{SEPARATOR}")
}
