//! # Shotlist CLI (`shotlist`)
//!
//! ## Usage
//!
//! ```bash
//! shotlist --config ./config/shotlist.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shotlist session` | Interactive workflow: script → people → search → select → export |
//! | `shotlist extract <file>` | Print the people mentioned in a script as JSON |
//! | `shotlist search "<name>"` | Search videos and photos for one person |
//! | `shotlist run <file>` | Non-interactive pipeline that selects everything |
//! | `shotlist filters` | List the collection filters and their codes |
//!
//! Credentials are read from the environment: `OPENAI_API_KEY` for the
//! `openai` extractor, and the variables named by `[getty].api_key_env` /
//! `[getty].api_secret_env` (default `GETTY_API_KEY` / `GETTY_API_SECRET`).
//! Logging is controlled with `RUST_LOG` (default `shotlist=info`).

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use shotlist::bundle::HttpFetcher;
use shotlist::config::{self, Config};
use shotlist::export;
use shotlist::extractor;
use shotlist::filters::{Collection, FilterConfig};
use shotlist::gateway::{GettyGateway, MediaGateway, UnavailableGateway};
use shotlist::llm;
use shotlist::models::{MediaKind, Person};
use shotlist::progress::ProgressMode;
use shotlist::search;
use shotlist::session::{self, Services};
use shotlist::workflow::Workflow;

const DEFAULT_CONFIG: &str = "./config/shotlist.toml";

/// Shotlist: turn a script into a curated bundle of licensed editorial media.
#[derive(Parser)]
#[command(
    name = "shotlist",
    about = "Shotlist: find licensed editorial media for every person in a script",
    version,
    long_about = "Shotlist extracts the people mentioned in a script with a generative model, \
    searches the Getty Images editorial catalogue for videos and photos of each of them, and \
    packages the picks as a ZIP archive plus a CSV metadata sheet."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/shotlist.toml` when it exists; built-in defaults
    /// are used otherwise.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Progress output on stderr: `off`, `human`, or `json`.
    /// Defaults to `human` when stderr is a terminal.
    #[arg(long, global = true, value_parser = parse_progress)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session.
    ///
    /// Reads one command per line from stdin. Type `help` inside the
    /// session for the command list.
    Session,

    /// Extract the people mentioned in a script.
    ///
    /// Prints a JSON array of `{name, searchTerm}` objects.
    Extract {
        /// Script file (`-` for stdin).
        script: PathBuf,
    },

    /// Search videos and photos for a single name.
    ///
    /// Prints the normalized results as JSON.
    Search {
        /// Name to search for.
        name: String,

        /// Append the phrase marker to the search phrase.
        #[arg(long)]
        augment: bool,

        /// Restrict to a collection (key or code); repeatable.
        #[arg(long = "collection")]
        collections: Vec<String>,
    },

    /// Run the whole pipeline without prompts.
    ///
    /// Extracts people, searches, selects every result of `--kind`, then
    /// writes the CSV and/or ZIP.
    Run {
        /// Script file (`-` for stdin).
        script: PathBuf,

        /// Which results to select.
        #[arg(long, value_enum, default_value = "all")]
        kind: KindArg,

        /// Write the CSV export here.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the ZIP bundle here.
        #[arg(long)]
        zip: Option<PathBuf>,
    },

    /// List collection filters and their provider codes.
    Filters,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Video,
    Photo,
    All,
}

impl KindArg {
    fn kinds(self) -> &'static [MediaKind] {
        match self {
            KindArg::Video => &[MediaKind::Video],
            KindArg::Photo => &[MediaKind::Photo],
            KindArg::All => &MediaKind::ALL,
        }
    }
}

fn parse_progress(s: &str) -> Result<ProgressMode, String> {
    ProgressMode::parse(s).ok_or_else(|| format!("invalid progress mode '{}': off, human, json", s))
}

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(config::load_config(path)?),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            Ok(config::load_config(Path::new(DEFAULT_CONFIG))?)
        }
        None => {
            tracing::debug!("no config file; using defaults");
            Ok(Config::default())
        }
    }
}

fn read_script(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))
}

fn gateway_for(cfg: &Config) -> Box<dyn MediaGateway> {
    match GettyGateway::from_config(&cfg.getty) {
        Ok(gateway) => Box::new(gateway),
        Err(e) => {
            tracing::warn!(error = %e, "provider credentials unavailable; searches will fail");
            Box::new(UnavailableGateway::new(e.to_string()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shotlist=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let progress_mode = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);

    // Commands that don't require config
    if let Commands::Filters = cli.command {
        for collection in Collection::ALL {
            println!(
                "{:<14} {:<4} {}",
                collection.key(),
                collection.code(),
                collection.display_name()
            );
        }
        return Ok(());
    }

    let cfg = load(cli.config.as_deref())?;
    let progress = progress_mode.reporter();

    match cli.command {
        Commands::Session => {
            let model = llm::create_model(&cfg.extractor)?;
            let gateway = gateway_for(&cfg);
            let fetcher = HttpFetcher::new(cfg.bundle.timeout_secs)?;
            let services = Services {
                model: model.as_ref(),
                gateway: gateway.as_ref(),
                fetcher: &fetcher,
                progress: progress.as_ref(),
                concurrency: cfg.bundle.concurrency,
            };
            let mut workflow = Workflow::new(cfg.filters.clone(), cfg.search.policy());
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            session::run_session(&mut workflow, &services, stdin, &mut stdout).await?;
        }
        Commands::Extract { script } => {
            let text = read_script(&script)?;
            let model = llm::create_model(&cfg.extractor)?;
            let people = extractor::extract_people(model.as_ref(), &text).await?;
            println!("{}", serde_json::to_string_pretty(&people)?);
        }
        Commands::Search {
            name,
            augment,
            collections,
        } => {
            let mut filter = FilterConfig {
                phrase_augmentation: augment || cfg.filters.phrase_augmentation,
                ..cfg.filters.clone()
            };
            for c in &collections {
                let Some(collection) = Collection::parse(c) else {
                    bail!("Unknown collection: '{}'. See `shotlist filters`.", c);
                };
                filter.set(collection, true);
            }
            let gateway = GettyGateway::from_config(&cfg.getty)?;
            let person = Person {
                name: name.clone(),
                search_term: name,
            };
            let results =
                search::search_person(&gateway, &person, &filter, &cfg.search.policy()).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Run {
            script,
            kind,
            csv,
            zip,
        } => {
            if csv.is_none() && zip.is_none() {
                bail!("Nothing to write: pass --csv and/or --zip");
            }
            let text = read_script(&script)?;
            let model = llm::create_model(&cfg.extractor)?;
            let gateway = GettyGateway::from_config(&cfg.getty)?;

            let mut workflow = Workflow::new(cfg.filters.clone(), cfg.search.policy());
            workflow.submit_script(&text)?;
            let people = workflow.generate_shotlist(model.as_ref()).await?;
            eprintln!("found {} people", people.len());
            workflow.search(&gateway, progress.as_ref()).await?;
            for k in kind.kinds() {
                workflow.select_all_global(*k)?;
            }
            if workflow.selections().is_empty() {
                bail!("No results found for any person in the script");
            }

            if let Some(path) = csv {
                let text = workflow.compile_export()?;
                export::write_export(text, Some(&path))?;
            }
            if let Some(path) = zip {
                let fetcher = HttpFetcher::new(cfg.bundle.timeout_secs)?;
                let bundle = workflow
                    .package_bundle(&fetcher, cfg.bundle.concurrency, progress.as_ref())
                    .await?;
                bundle.write_to(&path)?;
                eprintln!(
                    "Bundled {} files to {} ({} failed)",
                    bundle.packaged.len(),
                    path.display(),
                    bundle.failed.len()
                );
            }
            println!("ok");
        }
        Commands::Filters => unreachable!(),
    }

    Ok(())
}
