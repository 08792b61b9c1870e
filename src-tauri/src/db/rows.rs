use rusqlite::{types::Type, Row};

use crate::models::{Interval, IntervalCategory};

/// Column list matching [`row_to_interval`]; `lc` is the joined `label_colors` row.
pub const INTERVAL_COLUMNS: &str = "i.id AS id, i.category AS category, i.label AS label, \
     i.secondary_label AS secondary_label, i.source_url AS source_url, i.domain AS domain, \
     COALESCE(i.color, lc.color) AS color, i.begin_ms AS begin_ms, i.end_ms AS end_ms";

pub const INTERVAL_FROM: &str =
    "FROM intervals i LEFT JOIN label_colors lc ON lc.label = i.label";

pub fn row_to_interval(row: &Row) -> Result<Interval, rusqlite::Error> {
    let category: String = row.get("category")?;
    let category = IntervalCategory::parse(&category).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown interval category '{category}'").into(),
        )
    })?;

    Ok(Interval {
        id: row.get("id")?,
        category,
        label: row.get("label")?,
        secondary_label: row.get("secondary_label")?,
        source_url: row.get("source_url")?,
        domain: row.get("domain")?,
        color_override: row.get("color")?,
        begin_ms: row.get("begin_ms")?,
        end_ms: row.get("end_ms")?,
    })
}
