use std::{future::Future, sync::Arc};

use anyhow::Result;
use serde::Serialize;

use crate::models::{Interval, IntervalCategory, SearchParams, SearchResult, TimeRange};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_warn};

/// Storage for activity intervals. Implemented by the SQLite database and by
/// test doubles.
pub trait IntervalRepository: Send + Sync + 'static {
    fn fetch_intervals(
        &self,
        from: i64,
        to: i64,
        category: IntervalCategory,
    ) -> impl Future<Output = Result<Vec<Interval>>> + Send;

    fn search_intervals(
        &self,
        params: SearchParams,
    ) -> impl Future<Output = Result<SearchResult>> + Send;

    fn set_interval_color(
        &self,
        label: &str,
        color: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_intervals(&self, ids: &[i64]) -> impl Future<Output = Result<()>> + Send;
}

/// Intervals of one query range, one list per category.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntervalSet {
    pub app_items: Vec<Interval>,
    pub status_items: Vec<Interval>,
    pub log_items: Vec<Interval>,
}

impl IntervalSet {
    pub fn get(&self, category: IntervalCategory) -> &[Interval] {
        match category {
            IntervalCategory::AppActivity => &self.app_items,
            IntervalCategory::Status => &self.status_items,
            IntervalCategory::ManualLog => &self.log_items,
        }
    }

    pub fn find(&self, id: i64) -> Option<&Interval> {
        IntervalCategory::ALL
            .iter()
            .flat_map(|category| self.get(*category))
            .find(|interval| interval.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.app_items.is_empty() && self.status_items.is_empty() && self.log_items.is_empty()
    }
}

/// Front door to the repository. Failures never reach the caller: reads
/// degrade to empty data and writes report `false`, with the cause logged.
pub struct RepositoryClient<R> {
    repo: Arc<R>,
}

impl<R> Clone for RepositoryClient<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: IntervalRepository> RepositoryClient<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    pub async fn fetch_intervals(
        &self,
        range: TimeRange,
        category: IntervalCategory,
    ) -> Vec<Interval> {
        match self
            .repo
            .fetch_intervals(range.start(), range.end(), category)
            .await
        {
            Ok(items) => {
                let total = items.len();
                let items: Vec<Interval> =
                    items.into_iter().filter(Interval::is_well_formed).collect();
                if items.len() != total {
                    log_warn!(
                        "dropped {} malformed {} intervals",
                        total - items.len(),
                        category.as_str()
                    );
                }
                items
            }
            Err(err) => {
                log_error!("failed to fetch {} intervals: {err:#}", category.as_str());
                Vec::new()
            }
        }
    }

    /// The three categories are requested independently and joined here.
    pub async fn fetch_all(&self, range: TimeRange) -> IntervalSet {
        let (app_items, status_items, log_items) = tokio::join!(
            self.fetch_intervals(range, IntervalCategory::AppActivity),
            self.fetch_intervals(range, IntervalCategory::Status),
            self.fetch_intervals(range, IntervalCategory::ManualLog),
        );

        log_debug!(
            "fetched {} app, {} status, {} log intervals",
            app_items.len(),
            status_items.len(),
            log_items.len()
        );

        IntervalSet {
            app_items,
            status_items,
            log_items,
        }
    }

    pub async fn search(&self, params: SearchParams) -> SearchResult {
        match self.repo.search_intervals(params).await {
            Ok(result) => result,
            Err(err) => {
                log_error!("interval search failed: {err:#}");
                SearchResult::default()
            }
        }
    }

    pub async fn set_interval_color(&self, label: &str, color: &str) -> bool {
        match self.repo.set_interval_color(label, color).await {
            Ok(()) => true,
            Err(err) => {
                log_error!("failed to set color for '{label}': {err:#}");
                false
            }
        }
    }

    pub async fn delete_intervals(&self, ids: &[i64]) -> bool {
        if ids.is_empty() {
            return true;
        }
        match self.repo.delete_intervals(ids).await {
            Ok(()) => true,
            Err(err) => {
                log_error!("failed to delete {} intervals: {err:#}", ids.len());
                false
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{interval, MemoryRepository};
    use super::*;
    use crate::models::HOUR_MS;

    fn range() -> TimeRange {
        TimeRange::new(0, 24 * HOUR_MS).unwrap()
    }

    #[tokio::test]
    async fn fetch_all_splits_categories() {
        let repo = MemoryRepository::with_items(vec![
            interval(1, IntervalCategory::AppActivity, "Editor", 0, HOUR_MS),
            interval(2, IntervalCategory::Status, "ONLINE", 0, 2 * HOUR_MS),
            interval(3, IntervalCategory::ManualLog, "Review", HOUR_MS, 2 * HOUR_MS),
            interval(4, IntervalCategory::AppActivity, "Late", 30 * HOUR_MS, 31 * HOUR_MS),
        ]);
        let client = RepositoryClient::new(Arc::new(repo));

        let set = client.fetch_all(range()).await;
        assert_eq!(set.app_items.len(), 1);
        assert_eq!(set.status_items.len(), 1);
        assert_eq!(set.log_items.len(), 1);
        assert_eq!(set.find(3).map(|i| i.label.as_str()), Some("Review"));
        assert_eq!(client.repository().fetches(), 3);
    }

    #[tokio::test]
    async fn failures_degrade_to_empty_results() {
        let repo = MemoryRepository::with_items(vec![interval(
            1,
            IntervalCategory::AppActivity,
            "Editor",
            0,
            HOUR_MS,
        )]);
        repo.set_failing(true);
        let client = RepositoryClient::new(Arc::new(repo));

        assert!(client.fetch_all(range()).await.is_empty());
        assert_eq!(client.search(SearchParams::new(0, HOUR_MS)).await, SearchResult::default());
        assert!(!client.set_interval_color("Editor", "#fff").await);
        assert!(!client.delete_intervals(&[1]).await);
    }

    #[tokio::test]
    async fn malformed_rows_are_dropped() {
        let repo = MemoryRepository::with_items(vec![
            interval(1, IntervalCategory::AppActivity, "Ok", 0, HOUR_MS),
            interval(2, IntervalCategory::AppActivity, "Backwards", 3 * HOUR_MS, HOUR_MS),
        ]);
        let client = RepositoryClient::new(Arc::new(repo));

        let items = client
            .fetch_intervals(range(), IntervalCategory::AppActivity)
            .await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 1);
    }
}
