use super::model::{MetaboliteRecord, MetaboliteRegistry, Row, UNKNOWN};

/// Build the identifier → metadata lookup from metabolite-info rows.
///
/// Rows without a `metabolite_id` are skipped. A repeated identifier
/// overwrites the earlier entry. A missing or empty `subclass` becomes
/// `"Unknown"`. Never fails.
pub fn build_registry(rows: &[Row]) -> MetaboliteRegistry {
    let mut registry = MetaboliteRegistry::default();
    let mut skipped = 0usize;

    for row in rows {
        let Some(id) = row.text("metabolite_id") else {
            skipped += 1;
            continue;
        };
        registry.insert(MetaboliteRecord {
            id,
            name: row.text("name").unwrap_or_default(),
            subclass: row.text("subclass").unwrap_or_else(|| UNKNOWN.to_string()),
        });
    }

    log::debug!(
        "registry: {} metabolite(s) from {} row(s), {skipped} skipped",
        registry.len(),
        rows.len()
    );
    registry
}
