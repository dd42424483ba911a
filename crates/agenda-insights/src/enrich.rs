//! Location metadata enrichment

use crate::types::ProjectRecord;

/// Stamp the configured region and discipline onto every record in place.
///
/// Values are applied verbatim, including empty strings when the location
/// has no metadata configured. Order and length of the slice are
/// untouched.
pub fn apply_location_metadata(records: &mut [ProjectRecord], region: &str, discipline: &str) {
    for record in records.iter_mut() {
        record.region = region.to_string();
        record.discipline = discipline.to_string();
    }
}
