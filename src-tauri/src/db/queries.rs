use anyhow::{bail, Context, Result};
use rusqlite::params;

use crate::{
    models::{Interval, IntervalCategory, NewInterval, SearchParams, SearchResult},
    timeline::IntervalRepository,
};

use super::{
    rows::{row_to_interval, INTERVAL_COLUMNS, INTERVAL_FROM},
    Database,
};

const SEARCH_FILTER: &str = "WHERE i.end_ms > ?1 AND i.begin_ms < ?2
       AND (?3 IS NULL OR i.category = ?3)
       AND (?4 IS NULL
            OR instr(lower(i.label), lower(?4)) > 0
            OR instr(lower(i.secondary_label), lower(?4)) > 0)";

impl Database {
    /// Intervals of one category overlapping `[from, to]`, oldest first.
    pub async fn find_intervals(
        &self,
        from: i64,
        to: i64,
        category: IntervalCategory,
    ) -> Result<Vec<Interval>> {
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {INTERVAL_COLUMNS} {INTERVAL_FROM}
                 WHERE i.category = ?1 AND i.end_ms > ?2 AND i.begin_ms < ?3
                 ORDER BY i.begin_ms ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![category.as_str(), from, to], row_to_interval)?;

            let mut intervals = Vec::new();
            for row in rows {
                intervals.push(row?);
            }
            Ok(intervals)
        })
        .await
    }

    /// Page of matching intervals, newest first. `total` and `total_duration`
    /// cover every match, not just the page.
    pub async fn search_intervals(&self, search: SearchParams) -> Result<SearchResult> {
        self.execute(move |conn| {
            let category = search.category.map(|c| c.as_str());
            let text = search.text.as_deref().filter(|t| !t.trim().is_empty());

            let (total, total_duration): (i64, i64) = conn
                .query_row(
                    &format!(
                        "SELECT COUNT(*), COALESCE(SUM(i.end_ms - i.begin_ms), 0)
                         FROM intervals i {SEARCH_FILTER}"
                    ),
                    params![search.from, search.to, category, text],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .context("failed to count search matches")?;

            let sql = format!(
                "SELECT {INTERVAL_COLUMNS} {INTERVAL_FROM} {SEARCH_FILTER}
                 ORDER BY i.begin_ms DESC
                 LIMIT ?5 OFFSET ?6"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![
                    search.from,
                    search.to,
                    category,
                    text,
                    search.limit.max(0),
                    search.offset.max(0),
                ],
                row_to_interval,
            )?;

            let mut items = Vec::new();
            for row in rows {
                items.push(row?);
            }

            Ok(SearchResult {
                items,
                total,
                total_duration,
            })
        })
        .await
    }

    /// Colors every interval carrying `label` and remembers the choice for
    /// intervals recorded later.
    pub async fn set_label_color(&self, label: &str, color: &str) -> Result<()> {
        let label = label.to_string();
        let color = color.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE intervals SET color = ?1 WHERE label = ?2",
                params![color, label],
            )
            .context("failed to recolor intervals")?;
            tx.execute(
                "INSERT INTO label_colors (label, color) VALUES (?1, ?2)
                 ON CONFLICT(label) DO UPDATE SET color = excluded.color",
                params![label, color],
            )
            .context("failed to store label color")?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn delete_intervals(&self, ids: &[i64]) -> Result<()> {
        let ids = ids.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            for id in &ids {
                tx.execute("DELETE FROM intervals WHERE id = ?1", params![id])?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn insert_interval(&self, input: NewInterval) -> Result<Interval> {
        if input.begin_ms > input.end_ms {
            bail!(
                "interval ends ({}) before it begins ({})",
                input.end_ms,
                input.begin_ms
            );
        }

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO intervals
                    (category, label, secondary_label, source_url, domain, color, begin_ms, end_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    input.category.as_str(),
                    input.label,
                    input.secondary_label,
                    input.source_url,
                    input.domain,
                    input.color_override,
                    input.begin_ms,
                    input.end_ms,
                ],
            )
            .context("failed to insert interval")?;

            Ok(Interval {
                id: conn.last_insert_rowid(),
                category: input.category,
                label: input.label,
                secondary_label: input.secondary_label,
                source_url: input.source_url,
                domain: input.domain,
                color_override: input.color_override,
                begin_ms: input.begin_ms,
                end_ms: input.end_ms,
            })
        })
        .await
    }
}

impl IntervalRepository for Database {
    async fn fetch_intervals(
        &self,
        from: i64,
        to: i64,
        category: IntervalCategory,
    ) -> Result<Vec<Interval>> {
        self.find_intervals(from, to, category).await
    }

    async fn search_intervals(&self, params: SearchParams) -> Result<SearchResult> {
        Database::search_intervals(self, params).await
    }

    async fn set_interval_color(&self, label: &str, color: &str) -> Result<()> {
        self.set_label_color(label, color).await
    }

    async fn delete_intervals(&self, ids: &[i64]) -> Result<()> {
        Database::delete_intervals(self, ids).await
    }
}
