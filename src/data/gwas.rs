use super::model::{AssociationPoint, AssociationSeries, MetaboliteRegistry, Row};

/// Build the Manhattan plot series from GWAS rows.
///
/// A row survives only when `position` and `lod` are both numbers that are
/// neither zero nor NaN. Survivors keep source order and are annotated from
/// the registry.
pub fn build_series(rows: &[Row], registry: &MetaboliteRegistry) -> AssociationSeries {
    let series: AssociationSeries = rows
        .iter()
        .filter_map(|row| {
            let position = truthy(row.number("position"))?;
            let lod = truthy(row.number("lod"))?;
            let id = row.text("metabolite_id").unwrap_or_default();
            let info = registry.resolve(&id);
            Some(AssociationPoint {
                id,
                name: info.name,
                subclass: info.subclass,
                snp: row.text("snp").unwrap_or_default(),
                position,
                lod,
            })
        })
        .collect();

    log::debug!(
        "gwas: {} point(s) kept, {} row(s) dropped",
        series.len(),
        rows.len() - series.len()
    );
    series
}

// Zero counts as missing for both fields; see DESIGN.md before changing.
fn truthy(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}
