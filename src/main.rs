use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Datelike;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use footy_tables::config::Settings;
use footy_tables::export::{self, Format};
use footy_tables::fetch::HttpPageFetcher;
use footy_tables::sync::FailurePolicy;
use footy_tables::{MatchRecord, bundled, fixture, results, store, update};

#[derive(Parser)]
#[command(author, version, about = "AFL fixtures and results as tidy tables")]
struct Cli {
    /// Write the table here instead of stdout; format follows the extension.
    #[arg(short, long, global = true)]
    out: Option<PathBuf>,

    /// Stdout format.
    #[arg(long, value_enum, default_value_t = StdoutFormat::Csv, global = true)]
    format: StdoutFormat,

    /// Skip the on-disk HTTP cache.
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fixture for one season, with inferred rounds.
    Fixture {
        /// Defaults to the current year.
        #[arg(short, long)]
        season: Option<i32>,
        /// Fixture page or template with `{season}`; overrides FOOTY_FIXTURE_URL.
        #[arg(long)]
        url: Option<String>,
    },
    /// Historical results from the results list.
    Results {
        #[arg(long)]
        from: Option<i32>,
        #[arg(long)]
        to: Option<i32>,
        /// Results list location; overrides FOOTY_RESULTS_URL.
        #[arg(long)]
        url: Option<String>,
    },
    /// Fetch results missing from the local store.
    Update {
        /// SQLite store; overrides FOOTY_DB_PATH.
        #[arg(long)]
        db: Option<PathBuf>,
        /// Keep going when single matches fail to fetch.
        #[arg(long)]
        best_effort: bool,
        /// Refetch ids the archive already has.
        #[arg(long)]
        untrusted_archive: bool,
    },
    /// The dataset shipped with the crate.
    Bundled,
}

#[derive(Clone, Copy, ValueEnum)]
enum StdoutFormat {
    Csv,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env();
    if cli.no_cache {
        settings.http_cache = false;
    }

    let (sheet, records) = match cli.command {
        Command::Fixture { season, url } => {
            let season = season.unwrap_or_else(|| chrono::Utc::now().year());
            if let Some(url) = url {
                settings.fixture_url = Some(url);
            }
            let locator = settings
                .fixture_locator(season)
                .ok_or_else(|| anyhow!("no fixture url; pass --url or set FOOTY_FIXTURE_URL"))?;
            let fetcher = HttpPageFetcher::new(&settings)?;
            let rows = fixture::get_fixture(&fetcher, &locator, season)
                .with_context(|| format!("fixture for {season}"))?;
            ("Fixture", rows)
        }
        Command::Results { from, to, url } => {
            if let Some(url) = url {
                settings.results_url = url;
            }
            let seasons = match (from, to) {
                (None, None) => None,
                (from, to) => Some(from.unwrap_or(i32::MIN)..=to.unwrap_or(i32::MAX)),
            };
            let fetcher = HttpPageFetcher::new(&settings)?;
            let rows = results::get_match_results(&fetcher, &settings.results_url, seasons)
                .context("match results")?;
            ("Results", rows)
        }
        Command::Update {
            db,
            best_effort,
            untrusted_archive,
        } => {
            if db.is_some() {
                settings.db_path = db;
            }
            if untrusted_archive {
                settings.trust_archive = false;
            }
            let db_path = settings
                .resolved_db_path()
                .context("unable to resolve sqlite path")?;
            let failure_policy = if best_effort {
                FailurePolicy::BestEffort
            } else {
                FailurePolicy::AbortAll
            };

            let mut conn = store::open_db(&db_path)?;
            let fetcher = HttpPageFetcher::new(&settings)?;
            let outcome = update::update_results(&mut conn, &fetcher, &settings, failure_policy)?;
            eprintln!("DB: {}", db_path.display());
            eprintln!(
                "Planned {} / fetched {} / failed {}",
                outcome.planned.len(),
                outcome.fetched.len(),
                outcome.failures.len()
            );
            for (id, err) in outcome.failures.iter().take(6) {
                eprintln!("   - {id}: {err}");
            }
            ("Results", outcome.records)
        }
        Command::Bundled => ("Results", bundled::match_results()?),
    };

    emit(cli.out.as_deref(), cli.format, sheet, &records)
}

fn emit(out: Option<&Path>, format: StdoutFormat, sheet: &str, records: &[MatchRecord]) -> Result<()> {
    if let Some(path) = out {
        let format = Format::from_path(path)
            .ok_or_else(|| anyhow!("unknown output format for {}", path.display()))?;
        return export::write_file(path, format, sheet, records);
    }
    let stdout = io::stdout().lock();
    match format {
        StdoutFormat::Csv => export::write_csv(stdout, records),
        StdoutFormat::Json => export::write_json(stdout, records),
    }
}
