//! Collection cycle driver.
//!
//! One cycle fetches every enabled sport from both feeds with a bounded
//! number of provider calls in flight, merges per sport, writes the merged
//! records into today's partition and runs predictions for pregame matches.
//! Nothing that goes wrong inside a cycle stops the next one.

use crate::config::CollectorConfig;
use crate::engine::merge::{merge, MergeStats};
use crate::engine::predictor::{form_cache, FormCache, Predictor};
use crate::feed::sports::Sport;
use crate::feed::types::MatchRecord;
use crate::feed::MatchFeed;
use crate::store::MatchStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Merged output of one sport for one cycle.
#[derive(Debug)]
pub struct SportBatch {
    pub sport: &'static Sport,
    pub merged: Vec<MatchRecord>,
    pub merge_stats: MergeStats,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub started_at: Option<DateTime<Utc>>,
    pub sports_processed: usize,
    pub total_matches: usize,
    pub stored: usize,
    pub failed: usize,
    pub predictions: usize,
    pub partitions_dropped: usize,
    pub duration: Duration,
    pub errors: Vec<String>,
}

pub struct Collector {
    feed_a: Arc<dyn MatchFeed>,
    feed_b: Arc<dyn MatchFeed>,
    store: MatchStore,
    sports: Vec<&'static Sport>,
    max_concurrent: usize,
    retention_days: u32,
    form_cache: FormCache,
}

impl Collector {
    pub fn new(
        feed_a: Arc<dyn MatchFeed>,
        feed_b: Arc<dyn MatchFeed>,
        store: MatchStore,
        sports: Vec<&'static Sport>,
        settings: &CollectorConfig,
    ) -> Self {
        Self {
            feed_a,
            feed_b,
            store,
            sports,
            max_concurrent: settings.max_concurrent_fetches.max(1),
            retention_days: settings.retention_days,
            form_cache: form_cache(),
        }
    }

    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    pub fn feeds(&self) -> [&Arc<dyn MatchFeed>; 2] {
        [&self.feed_a, &self.feed_b]
    }

    /// Fetch and merge every enabled sport. Sport tasks are isolated: a
    /// provider error or a panicking task only adds to the error list.
    pub async fn collect(&self) -> (Vec<SportBatch>, Vec<String>) {
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (idx, &sport) in self.sports.iter().enumerate() {
            let feed_a = self.feed_a.clone();
            let feed_b = self.feed_b.clone();
            let permits = permits.clone();
            tasks.spawn(async move { (idx, collect_sport(feed_a, feed_b, sport, permits).await) });
        }

        let mut batches = Vec::with_capacity(self.sports.len());
        let mut errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(pair) => batches.push(pair),
                Err(e) => {
                    tracing::error!(error = %e, "sport task failed");
                    errors.push(format!("sport task failed: {}", e));
                }
            }
        }
        batches.sort_by_key(|(idx, _)| *idx);
        (batches.into_iter().map(|(_, b)| b).collect(), errors)
    }

    pub async fn run_cycle(&mut self) -> CycleReport {
        self.run_cycle_for(Local::now().date_naive()).await
    }

    /// One full cycle writing into the partitions of `day`.
    pub async fn run_cycle_for(&mut self, day: NaiveDate) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport {
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        let (batches, task_errors) = self.collect().await;
        report.errors.extend(task_errors);

        for batch in batches {
            report.sports_processed += 1;
            report.total_matches += batch.merged.len();
            report.errors.extend(batch.errors.iter().cloned());
            if batch.merged.is_empty() {
                continue;
            }

            match self.store.upsert_batch(batch.sport.key, day, &batch.merged) {
                Ok(outcome) => {
                    report.stored += outcome.inserted;
                    report.failed += outcome.failed;
                    tracing::info!(
                        sport = batch.sport.key,
                        submitted = outcome.submitted,
                        inserted = outcome.inserted,
                        failed = outcome.failed,
                        "stored matches"
                    );
                }
                Err(e) => {
                    report.failed += batch.merged.len();
                    tracing::warn!(sport = batch.sport.key, error = %e, "store batch failed");
                    report.errors.push(format!("{}: store: {:#}", batch.sport.key, e));
                }
            }

            report.predictions +=
                predict_pregame(&self.store, &mut self.form_cache, batch.sport, &batch.merged);
        }

        match self.store.drop_partitions_older_than(self.retention_days, day) {
            Ok(dropped) => report.partitions_dropped = dropped.len(),
            Err(e) => {
                tracing::warn!(error = %e, "retention sweep failed");
                report.errors.push(format!("retention: {:#}", e));
            }
        }

        report.duration = started.elapsed();
        tracing::info!(
            sports = report.sports_processed,
            matches = report.total_matches,
            stored = report.stored,
            failed = report.failed,
            predictions = report.predictions,
            errors = report.errors.len(),
            elapsed_ms = report.duration.as_millis() as u64,
            "collection cycle complete"
        );
        report
    }

    /// Run cycles every `interval` until Ctrl-C.
    pub async fn run_forever(mut self, interval: Duration) -> Result<()> {
        tracing::info!(
            sports = self.sports.len(),
            interval_s = interval.as_secs(),
            "continuous collection started"
        );
        loop {
            let report = self.run_cycle().await;
            for err in &report.errors {
                tracing::warn!(error = %err, "cycle error");
            }
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                signal = tokio::signal::ctrl_c() => {
                    signal.context("listen for ctrl-c")?;
                    tracing::info!("shutdown requested");
                    return Ok(());
                }
            }
        }
    }
}

async fn fetch_bounded(
    feed: &dyn MatchFeed,
    sport: &'static Sport,
    permits: &Semaphore,
) -> Result<Vec<MatchRecord>> {
    let _permit = permits.acquire().await.context("fetch permits closed")?;
    feed.fetch_matches(sport).await
}

/// Both feeds for one sport, concurrently. A failed feed contributes an
/// empty list and the other feed's records stand alone.
async fn collect_sport(
    feed_a: Arc<dyn MatchFeed>,
    feed_b: Arc<dyn MatchFeed>,
    sport: &'static Sport,
    permits: Arc<Semaphore>,
) -> SportBatch {
    let (res_a, res_b) = tokio::join!(
        fetch_bounded(feed_a.as_ref(), sport, &permits),
        fetch_bounded(feed_b.as_ref(), sport, &permits),
    );

    let mut errors = Vec::new();
    let mut take = |res: Result<Vec<MatchRecord>>, feed: &dyn MatchFeed| match res {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(sport = sport.key, source = %feed.source(), error = %e, "feed fetch failed");
            errors.push(format!("{}/{}: {:#}", sport.key, feed.source(), e));
            Vec::new()
        }
    };
    let list_a = take(res_a, feed_a.as_ref());
    let list_b = take(res_b, feed_b.as_ref());

    let (merged, merge_stats) = merge(list_a, list_b);
    tracing::debug!(
        sport = sport.key,
        only_a = merge_stats.only_a,
        only_b = merge_stats.only_b,
        merged = merge_stats.merged,
        duplicates = merge_stats.duplicates,
        "merged sport"
    );

    SportBatch {
        sport,
        merged,
        merge_stats,
        errors,
    }
}

fn predict_pregame(
    store: &MatchStore,
    cache: &mut FormCache,
    sport: &Sport,
    matches: &[MatchRecord],
) -> usize {
    let predictor = Predictor::new(store);
    let mut made = 0;
    for rec in matches.iter().filter(|r| !r.status.is_live()) {
        match predictor.predict(cache, &rec.home_team, &rec.away_team, sport.key) {
            Ok(p) => {
                made += 1;
                tracing::debug!(
                    sport = sport.key,
                    home = %rec.home_team,
                    away = %rec.away_team,
                    outcome = p.outcome.as_str(),
                    confidence = p.confidence,
                    "prediction"
                );
            }
            Err(e) => {
                tracing::warn!(sport = sport.key, match_id = %rec.match_id, error = %e, "prediction failed");
            }
        }
    }
    made
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::sports::lookup;
    use crate::feed::types::{DataSource, MatchStatus};
    use crate::feed::{FeedStats, SportListing};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeFeed {
        source: DataSource,
        lists: HashMap<&'static str, Vec<MatchRecord>>,
        failing: Vec<&'static str>,
        panicking: Vec<&'static str>,
    }

    impl FakeFeed {
        fn new(source: DataSource) -> Self {
            Self {
                source,
                lists: HashMap::new(),
                failing: Vec::new(),
                panicking: Vec::new(),
            }
        }

        fn with(mut self, sport: &'static str, recs: Vec<MatchRecord>) -> Self {
            self.lists.insert(sport, recs);
            self
        }
    }

    #[async_trait]
    impl MatchFeed for FakeFeed {
        fn source(&self) -> DataSource {
            self.source
        }

        async fn fetch_matches(&self, sport: &'static Sport) -> Result<Vec<MatchRecord>> {
            if self.panicking.contains(&sport.key) {
                panic!("fake feed panic");
            }
            if self.failing.contains(&sport.key) {
                anyhow::bail!("fake timeout");
            }
            Ok(self.lists.get(sport.key).cloned().unwrap_or_default())
        }

        async fn list_sports(&self) -> Result<Vec<SportListing>> {
            Ok(Vec::new())
        }

        fn stats(&self) -> FeedStats {
            FeedStats::default()
        }
    }

    fn rec(source: DataSource, sport: &str, id: &str, home: &str, away: &str) -> MatchRecord {
        let mut r = MatchRecord::new(source, sport, id.into(), home.into(), away.into());
        r.tournament = "League".into();
        r.start_time = 1000;
        r
    }

    fn settings() -> CollectorConfig {
        CollectorConfig {
            max_concurrent_fetches: 2,
            ..Default::default()
        }
    }

    fn sports(keys: &[&str]) -> Vec<&'static Sport> {
        keys.iter().map(|k| lookup(k).unwrap()).collect()
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    #[tokio::test]
    async fn test_cycle_merges_and_stores() {
        let a = FakeFeed::new(DataSource::Xbet).with(
            "soccer",
            vec![rec(DataSource::Xbet, "soccer", "a1", "Team X", "Team Y"), rec(DataSource::Xbet, "soccer", "a2", "P", "Q")],
        );
        let b = FakeFeed::new(DataSource::Iscj)
            .with("soccer", vec![rec(DataSource::Iscj, "soccer", "b1", "team x", "team y")]);
        let mut collector = Collector::new(
            Arc::new(a),
            Arc::new(b),
            MatchStore::open_in_memory().unwrap(),
            sports(&["soccer"]),
            &settings(),
        );

        let report = collector.run_cycle_for(today()).await;
        assert_eq!(report.sports_processed, 1);
        assert_eq!(report.total_matches, 2);
        assert_eq!(report.stored, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.predictions, 2);
        assert!(report.errors.is_empty());

        let stored = collector.store().query("soccer", today()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].match_id, "a1");
        assert_eq!(stored[0].data_source, DataSource::Both);
        assert_eq!(stored[1].data_source, DataSource::Xbet);
    }

    #[tokio::test]
    async fn test_failed_feed_yields_other_list() {
        let mut a = FakeFeed::new(DataSource::Xbet);
        a.failing.push("soccer");
        let b = FakeFeed::new(DataSource::Iscj)
            .with("soccer", vec![rec(DataSource::Iscj, "soccer", "b1", "X", "Y")]);
        let mut collector = Collector::new(
            Arc::new(a),
            Arc::new(b),
            MatchStore::open_in_memory().unwrap(),
            sports(&["soccer"]),
            &settings(),
        );

        let report = collector.run_cycle_for(today()).await;
        assert_eq!(report.stored, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("soccer/xbet"));
        let stored = collector.store().query("soccer", today()).unwrap();
        assert_eq!(stored[0].data_source, DataSource::Iscj);
    }

    #[tokio::test]
    async fn test_panicking_sport_is_isolated() {
        let mut a = FakeFeed::new(DataSource::Xbet)
            .with("tennis", vec![rec(DataSource::Xbet, "tennis", "t1", "A", "B")]);
        a.panicking.push("soccer");
        let b = FakeFeed::new(DataSource::Iscj);
        let mut collector = Collector::new(
            Arc::new(a),
            Arc::new(b),
            MatchStore::open_in_memory().unwrap(),
            sports(&["soccer", "tennis"]),
            &settings(),
        );

        let report = collector.run_cycle_for(today()).await;
        assert_eq!(report.sports_processed, 1);
        assert_eq!(report.stored, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("sport task failed"));
    }

    #[tokio::test]
    async fn test_collect_keeps_catalog_order() {
        let a = FakeFeed::new(DataSource::Xbet);
        let b = FakeFeed::new(DataSource::Iscj);
        let order = ["tennis", "soccer", "basketball", "cricket"];
        let collector = Collector::new(
            Arc::new(a),
            Arc::new(b),
            MatchStore::open_in_memory().unwrap(),
            sports(&order),
            &settings(),
        );
        let (batches, errors) = collector.collect().await;
        assert!(errors.is_empty());
        let keys: Vec<_> = batches.iter().map(|b| b.sport.key).collect();
        assert_eq!(keys, order);
    }

    #[tokio::test]
    async fn test_live_matches_are_not_predicted() {
        let mut live = rec(DataSource::Xbet, "soccer", "l1", "L", "M");
        live.status = MatchStatus::Live;
        let a = FakeFeed::new(DataSource::Xbet).with("soccer", vec![live]);
        let mut collector = Collector::new(
            Arc::new(a),
            Arc::new(FakeFeed::new(DataSource::Iscj)),
            MatchStore::open_in_memory().unwrap(),
            sports(&["soccer"]),
            &settings(),
        );
        let report = collector.run_cycle_for(today()).await;
        assert_eq!(report.stored, 1);
        assert_eq!(report.predictions, 0);
    }

    #[tokio::test]
    async fn test_repoll_overwrites() {
        let mut first = rec(DataSource::Xbet, "soccer", "a1", "X", "Y");
        first.score = "0:1".into();
        let mut collector = Collector::new(
            Arc::new(FakeFeed::new(DataSource::Xbet).with("soccer", vec![first])),
            Arc::new(FakeFeed::new(DataSource::Iscj)),
            MatchStore::open_in_memory().unwrap(),
            sports(&["soccer"]),
            &settings(),
        );
        collector.run_cycle_for(today()).await;
        collector.run_cycle_for(today()).await;
        assert_eq!(collector.store().query("soccer", today()).unwrap().len(), 1);
        assert_eq!(collector.store().stats().unwrap().total_records, 1);
    }
}
