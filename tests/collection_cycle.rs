// Full collection cycle with in-process feeds and an in-memory store

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{Local, NaiveDate};
    use match_collector::collector::Collector;
    use match_collector::config::CollectorConfig;
    use match_collector::engine::predictor::{form_cache, Outcome, Predictor};
    use match_collector::feed::sports::{lookup, Sport};
    use match_collector::feed::types::{DataSource, MatchRecord};
    use match_collector::feed::{FeedStats, MatchFeed, SportListing};
    use match_collector::store::MatchStore;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Serves a fixed list per sport and counts calls.
    struct ScriptedFeed {
        source: DataSource,
        sport: &'static str,
        records: Vec<MatchRecord>,
        fail: bool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl MatchFeed for ScriptedFeed {
        fn source(&self) -> DataSource {
            self.source
        }

        async fn fetch_matches(&self, sport: &'static Sport) -> Result<Vec<MatchRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("{} HTTP error (503): unavailable", self.source);
            }
            if sport.key == self.sport {
                Ok(self.records.clone())
            } else {
                Ok(Vec::new())
            }
        }

        async fn list_sports(&self) -> Result<Vec<SportListing>> {
            Ok(Vec::new())
        }

        fn stats(&self) -> FeedStats {
            FeedStats {
                requests: u64::from(self.calls.load(Ordering::SeqCst)),
                ..Default::default()
            }
        }
    }

    fn feed(source: DataSource, sport: &'static str, records: Vec<MatchRecord>) -> ScriptedFeed {
        ScriptedFeed {
            source,
            sport,
            records,
            fail: false,
            calls: AtomicU32::new(0),
        }
    }

    fn fixture(source: DataSource, id: &str, home: &str, away: &str) -> MatchRecord {
        let mut r = MatchRecord::new(source, "soccer", id.into(), home.into(), away.into());
        r.tournament = "League Z".into();
        r.start_time = 1000;
        r
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    #[tokio::test]
    async fn test_scenario_cycle_stores_merged_record() {
        let mut a = fixture(DataSource::Xbet, "a-1", "Team X", "Team Y");
        a.odds_home = Some(1.5);
        let mut b = fixture(DataSource::Iscj, "b-1", "team x", "team y");
        b.tournament = "league z".into();
        b.odds_away = Some(2.5);
        b.event_count = 4;

        let sports = vec![lookup("soccer").unwrap(), lookup("tennis").unwrap()];
        let mut collector = Collector::new(
            Arc::new(feed(DataSource::Xbet, "soccer", vec![a])),
            Arc::new(feed(DataSource::Iscj, "soccer", vec![b])),
            MatchStore::open_in_memory().unwrap(),
            sports,
            &CollectorConfig::default(),
        );

        let report = collector.run_cycle_for(today()).await;
        assert_eq!(report.sports_processed, 2);
        assert_eq!(report.total_matches, 1);
        assert_eq!(report.stored, 1);
        assert!(report.errors.is_empty());

        let stored = collector.store().query("soccer", today()).unwrap();
        assert_eq!(stored.len(), 1);
        let m = &stored[0];
        assert_eq!(m.match_id, "a-1");
        assert_eq!(m.home_team, "Team X");
        assert_eq!(m.away_team, "Team Y");
        assert_eq!(m.odds_home, Some(1.5));
        assert_eq!(m.odds_away, Some(2.5));
        assert_eq!(m.event_count, 4);
        assert_eq!(m.data_source, DataSource::Both);
        assert!(collector.store().query("tennis", today()).unwrap().is_empty());

        for f in collector.feeds() {
            assert_eq!(f.stats().requests, 2);
        }
    }

    #[tokio::test]
    async fn test_provider_outage_is_not_fatal() {
        let mut down = feed(DataSource::Xbet, "soccer", Vec::new());
        down.fail = true;
        let up = feed(
            DataSource::Iscj,
            "soccer",
            vec![fixture(DataSource::Iscj, "b-1", "P", "Q"), fixture(DataSource::Iscj, "b-2", "R", "S")],
        );
        let mut collector = Collector::new(
            Arc::new(down),
            Arc::new(up),
            MatchStore::open_in_memory().unwrap(),
            vec![lookup("soccer").unwrap()],
            &CollectorConfig::default(),
        );

        let first = collector.run_cycle_for(today()).await;
        let second = collector.run_cycle_for(today()).await;
        for report in [&first, &second] {
            assert_eq!(report.stored, 2);
            assert_eq!(report.errors.len(), 1);
            assert!(report.errors[0].contains("503"));
        }
        assert_eq!(collector.store().stats().unwrap().total_records, 2);
    }

    #[tokio::test]
    async fn test_stored_history_drives_prediction() {
        let store = MatchStore::open_in_memory().unwrap();
        for (i, score) in ["2:0", "3:1", "1:0"].iter().enumerate() {
            let mut played = fixture(DataSource::Both, &format!("h{i}"), "Team X", "Team Y");
            played.start_time = 1000 + i as i64;
            played.score = score.to_string();
            store.upsert("soccer", today(), &played).unwrap();
        }

        let mut collector = Collector::new(
            Arc::new(feed(DataSource::Xbet, "soccer", vec![fixture(DataSource::Xbet, "next", "Team X", "Team Y")])),
            Arc::new(feed(DataSource::Iscj, "soccer", Vec::new())),
            store,
            vec![lookup("soccer").unwrap()],
            &CollectorConfig::default(),
        );
        let report = collector.run_cycle_for(today()).await;
        assert_eq!(report.predictions, 1);

        let predictor = Predictor::new(collector.store());
        let mut cache = form_cache();
        let p = predictor.predict(&mut cache, "Team X", "Team Y", "soccer").unwrap();
        assert_eq!(p.outcome, Outcome::HomeWin);
        assert_eq!(p.home_form, 1.0);
        assert_eq!(p.away_form, 0.0);
        assert_eq!(p.head_to_head, 1.0);

        let score = predictor.predict_score(&mut cache, "Team X", "Team Y", "soccer").unwrap();
        assert_eq!(score.predicted_score, "2:0");
        assert_eq!(score.expected_home_goals, 2.0);
        assert!(score.confidence <= 70.0);
    }
}
