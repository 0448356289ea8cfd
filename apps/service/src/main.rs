mod config;
mod database;
mod monitoring;
mod notify;
mod pool;
mod reporting;
mod validation;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::Config;
use crate::database::models::Monitor;
use crate::database::{Database, DatabaseImpl};
use crate::monitoring::{CheckExecutor, HttpProber, SiteStatusManager, TickScheduler};
use crate::notify::NotificationBus;
use crate::notify::log::LogSubscriber;
use crate::notify::users::UserNotifier;
use crate::reporting::{AvailabilityReport, DailyBucketPolicy, ReportAnalyzer};
use crate::reporting::format::format_duration;
use crate::validation::validate_monitor_url;

#[derive(Parser)]
#[command(name = "sitewatch")]
#[command(about = "Availability monitoring for HTTP endpoints")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitoring engine
    Run,
    /// Add a monitor for a URL
    Add {
        /// User the monitor belongs to
        #[arg(long)]
        user: i64,
        /// URL to watch
        url: String,
        /// Seconds between checks
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },
    /// Remove a monitor
    Remove {
        /// User the monitor belongs to
        #[arg(long)]
        user: i64,
        url: String,
    },
    /// Change how often a monitor runs
    SetInterval {
        /// User the monitor belongs to
        #[arg(long)]
        user: i64,
        url: String,
        /// New interval in seconds
        interval: u64,
    },
    /// List a user's monitors
    List {
        #[arg(long)]
        user: i64,
    },
    /// Print the availability report for a URL
    Report {
        url: String,
        /// Window length in days
        #[arg(long, default_value_t = 7)]
        days: i64,
        /// Show days without checks as zero rows instead of omitting them
        #[arg(long)]
        all_days: bool,
    },
    /// Print weekly reports for every monitor a user has
    ReportAll {
        #[arg(long)]
        user: i64,
        /// Show days without checks as zero rows instead of omitting them
        #[arg(long)]
        all_days: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _guard = logger::init("sitewatch");

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Run => run(config).await,
        Commands::Add { user, url, interval } => add_monitor(config, user, url, interval).await,
        Commands::Remove { user, url } => remove_monitor(config, user, url).await,
        Commands::SetInterval { user, url, interval } => {
            set_interval(config, user, url, interval).await
        }
        Commands::List { user } => list_monitors(config, user).await,
        Commands::Report { url, days, all_days } => {
            print_report(config, url, days, all_days).await
        }
        Commands::ReportAll { user, all_days } => {
            print_user_reports(config, user, all_days).await
        }
    }
}

/// Open the database pool and make sure the schema is current
async fn connect(config: &Config) -> Result<Arc<dyn Database>> {
    let pool = pool::open_pool(&config.database_path).await?;

    let conn = pool.get().await?;
    database::initialize_database(&conn).await?;
    drop(conn);

    Ok(Arc::new(DatabaseImpl::new_from_pool(pool)))
}

async fn run(config: Config) -> Result<()> {
    info!("Starting availability monitor");
    info!("{}", config);

    let database = connect(&config).await?;

    let bus = Arc::new(NotificationBus::new());
    bus.subscribe(Arc::new(LogSubscriber)).await;
    bus.subscribe(Arc::new(UserNotifier::new(database.clone()))).await;

    let status = Arc::new(SiteStatusManager::new(
        database.clone(),
        bus,
        config.failure_threshold,
    ));
    let prober = Arc::new(HttpProber::new(config.request_timeout)?);
    let executor = Arc::new(CheckExecutor::new(prober, database.clone(), status));
    let scheduler = TickScheduler::new(
        database,
        executor,
        Duration::from_secs(config.tick_duration),
        config.max_concurrent_ticks,
    );

    tokio::select! {
        _ = scheduler.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    Ok(())
}

async fn add_monitor(config: Config, user: i64, url: String, interval: u64) -> Result<()> {
    validate_monitor_url(&url)?;
    if interval == 0 {
        anyhow::bail!("Interval must be positive");
    }

    let database = connect(&config).await?;

    if database.get_monitor(user, &url).await?.is_some() {
        anyhow::bail!("User {} already monitors {}", user, url);
    }

    database
        .save_monitor(&Monitor::new(user, url.clone(), interval))
        .await?;
    println!("Monitoring {} every {}s for user {}", url, interval, user);
    Ok(())
}

async fn remove_monitor(config: Config, user: i64, url: String) -> Result<()> {
    let database = connect(&config).await?;

    if database.delete_monitor(user, &url).await? == 0 {
        anyhow::bail!("User {} has no monitor for {}", user, url);
    }

    println!("Stopped monitoring {} for user {}", url, user);
    Ok(())
}

async fn set_interval(config: Config, user: i64, url: String, interval: u64) -> Result<()> {
    if interval == 0 {
        anyhow::bail!("Interval must be positive");
    }

    let database = connect(&config).await?;

    if database.update_monitor_interval(user, &url, interval).await? == 0 {
        anyhow::bail!("User {} has no monitor for {}", user, url);
    }

    println!("Checking {} every {}s", url, interval);
    Ok(())
}

async fn list_monitors(config: Config, user: i64) -> Result<()> {
    let database = connect(&config).await?;
    let monitors = database.get_user_monitors(user).await?;

    if monitors.is_empty() {
        println!("User {} has no monitors", user);
        return Ok(());
    }

    for monitor in monitors {
        let status = match database.get_site(&monitor.url).await? {
            Some(site) => site.status.to_string(),
            None => "unchecked".to_string(),
        };
        println!(
            "{}  every {}s  {}",
            monitor.url, monitor.interval_seconds, status
        );
    }
    Ok(())
}

fn analyzer_for(database: Arc<dyn Database>, config: &Config, all_days: bool) -> ReportAnalyzer {
    let analyzer = ReportAnalyzer::new(database, config.failure_threshold);
    if all_days {
        analyzer.with_daily_policy(DailyBucketPolicy::IncludeEmpty)
    } else {
        analyzer
    }
}

async fn print_report(config: Config, url: String, days: i64, all_days: bool) -> Result<()> {
    if days <= 0 {
        anyhow::bail!("Days must be positive");
    }

    let database = connect(&config).await?;
    let analyzer = analyzer_for(database, &config, all_days);

    let report = if days == 7 {
        analyzer.weekly_report(&url, None).await?
    } else {
        let end = chrono::Utc::now();
        analyzer
            .report(&url, end - chrono::Duration::days(days), end)
            .await?
    };

    render_report(&report);
    Ok(())
}

async fn print_user_reports(config: Config, user: i64, all_days: bool) -> Result<()> {
    let database = connect(&config).await?;
    let analyzer = analyzer_for(database, &config, all_days);

    let reports = analyzer.user_reports(user, None).await?;
    if reports.is_empty() {
        println!("User {} has no monitors", user);
        return Ok(());
    }

    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            println!();
            println!("{}", "-".repeat(60));
            println!();
        }
        render_report(report);
    }
    Ok(())
}

fn render_report(report: &AvailabilityReport) {
    println!("Availability report for {}", report.url);
    println!(
        "{} to {}",
        report.window_start.format("%Y-%m-%d %H:%M"),
        report.window_end.format("%Y-%m-%d %H:%M")
    );
    println!();

    let stats = &report.stats;
    println!(
        "Uptime: {:.2}%  ({}/{} checks)",
        stats.uptime_percentage, stats.successful_checks, stats.total_checks
    );
    if stats.downtime_seconds > 0 {
        println!("Downtime: {}", format_duration(stats.downtime_seconds));
    }
    if let Some(avg) = stats.average_response_time_ms {
        println!(
            "Response time: avg {:.2}ms  min {}ms  max {}ms",
            avg,
            stats.min_response_time_ms.unwrap_or(0),
            stats.max_response_time_ms.unwrap_or(0)
        );
    }

    if !report.incidents.is_empty() {
        println!();
        println!("Incidents:");
        for incident in report.incidents.iter().take(5) {
            println!(
                "  {}  {}  ({})",
                incident.started_at.format("%Y-%m-%d %H:%M"),
                format_duration(incident.duration_seconds),
                incident.reason
            );
        }
        if report.incidents.len() > 5 {
            println!("  ... and {} more", report.incidents.len() - 5);
        }
    }

    if !report.daily.is_empty() {
        println!();
        println!("Daily:");
        for day in &report.daily {
            let filled = ((day.uptime_percentage / 10.0).round() as usize).min(10);
            let bar = format!("{}{}", "#".repeat(filled), "-".repeat(10 - filled));
            println!(
                "  {}  [{}] {:>5.1}%  {} checks",
                day.date, bar, day.uptime_percentage, day.total_checks
            );
        }
    }
}
