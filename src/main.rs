use anyhow::{Context, Result};
use match_collector::collector::{Collector, CycleReport};
use match_collector::config::Config;
use match_collector::feed::iscj::IscjFeed;
use match_collector::feed::sports::{self, Sport};
use match_collector::feed::xbet::XbetFeed;
use match_collector::feed::MatchFeed;
use match_collector::store::MatchStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "match-collector.log";

#[tokio::main]
async fn main() -> Result<()> {
    // Load saved overrides from .env (real env vars take precedence)
    Config::load_env_file();
    let mut config = Config::load(Path::new("config.toml"))?;
    config.apply_env_overrides();

    let log_file = std::fs::File::create(LOG_FILE)
        .with_context(|| format!("Failed to create log file {}", LOG_FILE))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let once = std::env::args().any(|arg| arg == "--once");
    let status = std::env::args().any(|arg| arg == "--status");

    let sports: Vec<&'static Sport> = config
        .sports
        .enabled_keys()
        .into_iter()
        .filter_map(sports::lookup)
        .collect();

    let feed_a: Arc<dyn MatchFeed> = Arc::new(XbetFeed::new(&config.xbet)?);
    let feed_b: Arc<dyn MatchFeed> =
        Arc::new(IscjFeed::new(&config.iscj, config.collector.horizon_days)?);
    let store = MatchStore::open(&config.collector.db_path)?;

    println!();
    println!("  Match Collector v0.1.0");
    println!("  ======================");
    println!();
    println!("  Database:  {}", config.collector.db_path.display());
    println!("  Sports:    {} enabled", sports.len());
    println!("  Interval:  {} min", config.collector.interval_minutes);
    println!("  Log file:  {}", LOG_FILE);
    println!();

    tracing::info!(
        db = %config.collector.db_path.display(),
        sports = sports.len(),
        "match collector starting"
    );

    let mut collector = Collector::new(feed_a, feed_b, store, sports, &config.collector);

    if status {
        return print_status(&collector).await;
    }

    if once {
        let report = collector.run_cycle().await;
        print_report(&report);
        return Ok(());
    }

    let interval = Duration::from_secs(config.collector.interval_minutes.max(1) * 60);
    println!("  Collecting every {} min. Ctrl-C to stop.", config.collector.interval_minutes);
    collector.run_forever(interval).await
}

async fn print_status(collector: &Collector) -> Result<()> {
    for feed in collector.feeds() {
        println!("  [{}] sports", feed.source());
        match feed.list_sports().await {
            Ok(listing) => {
                for s in listing {
                    println!(
                        "    {:>5}  {:<28} {:<16} {}",
                        s.provider_id,
                        s.name,
                        s.key.unwrap_or("-"),
                        s.match_count.map(|c| c.to_string()).unwrap_or_default()
                    );
                }
            }
            Err(e) => println!("    unavailable: {:#}", e),
        }
        let stats = feed.stats();
        println!(
            "    requests={} failures={} throttled={} matches={}",
            stats.requests, stats.failures, stats.throttled, stats.matches
        );
        println!();
    }

    let stats = collector.store().stats()?;
    println!("  Store");
    println!("    partitions:    {}", stats.partitions);
    println!("    total records: {}", stats.total_records);
    println!("    sports:        {}", stats.sports.join(", "));
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        println!("    range:         {} .. {}", oldest, newest);
    }
    println!();
    Ok(())
}

fn print_report(report: &CycleReport) {
    println!("  Cycle finished in {:.1}s", report.duration.as_secs_f64());
    println!("    sports:      {}", report.sports_processed);
    println!("    matches:     {}", report.total_matches);
    println!("    stored:      {}", report.stored);
    println!("    failed:      {}", report.failed);
    println!("    predictions: {}", report.predictions);
    if report.partitions_dropped > 0 {
        println!("    dropped:     {} partitions", report.partitions_dropped);
    }
    for err in &report.errors {
        println!("    error: {}", err);
    }
    println!();
}
