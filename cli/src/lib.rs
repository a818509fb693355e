mod history_file;

pub use history_file::FileHistory;

use anyhow::Context;
use anyhow::Result;
use catalog_course_search::Action;
use catalog_course_search::HistoryBridge;
use catalog_course_search::HistoryEntry;
use catalog_course_search::HistoryWrite;
use catalog_course_search::SearchConfig;
use catalog_course_search::SearchParams;
use catalog_course_search::StaticFilterCatalog;
use catalog_course_search::catalog::active_selections;
use catalog_course_search::catalog::autocomplete;
use catalog_course_search::codec::split_url;
use catalog_course_search::decode;
use catalog_course_search::encode;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Drive course-search parameters against a file-backed navigation history.
#[derive(Debug, Parser)]
#[command(name = "course-search", version)]
pub struct Cli {
    /// TOML file overriding the default limit and search path.
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a URL or query string into search params.
    Decode {
        #[arg(value_name = "URL|QUERY")]
        location: String,
    },
    /// Print the canonical query string for params given as JSON.
    Encode {
        #[arg(value_name = "JSON")]
        params: String,
    },
    /// Apply a batch of actions and record the result in the history.
    Dispatch {
        #[command(flatten)]
        history: HistoryArgs,
        /// JSON array of actions (or a single action object).
        #[arg(value_name = "ACTIONS_JSON")]
        actions: String,
    },
    /// Step back in the history and print the restored params.
    Back {
        #[command(flatten)]
        history: HistoryArgs,
    },
    /// Step forward in the history and print the restored params.
    Forward {
        #[command(flatten)]
        history: HistoryArgs,
    },
    /// Label the values selected in a location using a facet catalog.
    Selections {
        #[command(flatten)]
        catalog: CatalogArgs,
        #[arg(value_name = "URL|QUERY")]
        location: String,
    },
    /// Suggest facet values whose label contains the given text.
    Suggest {
        #[command(flatten)]
        catalog: CatalogArgs,
        #[arg(value_name = "TEXT")]
        needle: String,
        /// Maximum number of suggestions.
        #[arg(long = "limit", default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Debug, clap::Args)]
pub struct HistoryArgs {
    /// JSON file holding the navigation history stack.
    #[arg(long = "history", value_name = "FILE")]
    pub path: PathBuf,
}

#[derive(Debug, clap::Args)]
pub struct CatalogArgs {
    /// JSON file holding the facet catalog served with search results.
    #[arg(long = "catalog", value_name = "FILE")]
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
struct DispatchOutcome<'a> {
    mounted: HistoryWrite,
    write: HistoryWrite,
    url: Option<&'a str>,
    params: &'a SearchParams,
}

#[derive(Debug, Serialize)]
struct Restored {
    url: String,
    params: SearchParams,
}

pub fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => SearchConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => SearchConfig::default(),
    };
    match cli.command {
        Command::Decode { location } => {
            let (_, query) = split_url(&location);
            print_json(&decode(query, &config))
        }
        Command::Encode { params } => {
            let params: SearchParams =
                serde_json::from_str(&params).context("parse search params JSON")?;
            println!("{}", encode(&params));
            Ok(())
        }
        Command::Dispatch { history, actions } => {
            let actions = parse_actions(&actions)?;
            run_dispatch(&history.path, config, actions)
        }
        Command::Back { history } => run_navigate(&history.path, config, Direction::Back),
        Command::Forward { history } => run_navigate(&history.path, config, Direction::Forward),
        Command::Selections { catalog, location } => {
            let catalog = load_catalog(&catalog.path)?;
            let (_, query) = split_url(&location);
            print_json(&active_selections(&decode(query, &config), &catalog))
        }
        Command::Suggest {
            catalog,
            needle,
            limit,
        } => {
            let catalog = load_catalog(&catalog.path)?;
            print_json(&autocomplete(&catalog, &needle, limit))
        }
    }
}

fn parse_actions(raw: &str) -> Result<Vec<Action>> {
    let value: serde_json::Value = serde_json::from_str(raw).context("parse actions JSON")?;
    let actions: serde_json::Result<Vec<Action>> = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|action| vec![action])
    };
    actions.context("actions must be objects tagged with a known `type`")
}

fn run_dispatch(path: &Path, config: SearchConfig, actions: Vec<Action>) -> Result<()> {
    let history = FileHistory::open(path, &config.search_path)?;
    let (mut bridge, mounted) =
        HistoryBridge::mount(history, config).context("mount search history")?;
    let write = bridge
        .dispatch(actions)
        .context("record dispatch in search history")?;
    let history = bridge.port().stack();
    print_json(&DispatchOutcome {
        mounted,
        write,
        url: history.current().map(|entry| entry.url.as_str()),
        params: bridge.current_params(),
    })
}

#[derive(Clone, Copy, Debug)]
enum Direction {
    Back,
    Forward,
}

fn run_navigate(path: &Path, config: SearchConfig, direction: Direction) -> Result<()> {
    let mut history = FileHistory::open(path, &config.search_path)?;
    let moved = match direction {
        Direction::Back => history.back()?,
        Direction::Forward => history.forward()?,
    };
    let Some(entry) = moved else {
        let side = match direction {
            Direction::Back => "previous",
            Direction::Forward => "next",
        };
        anyhow::bail!("no {side} entry in {}", path.display());
    };
    print_json(&restore(history, config, &entry)?)
}

fn restore(history: FileHistory, config: SearchConfig, entry: &HistoryEntry) -> Result<Restored> {
    let mut bridge = HistoryBridge::attach(history, config).context("read search history")?;
    let params = bridge.restore(entry).clone();
    Ok(Restored {
        url: entry.url.clone(),
        params,
    })
}

fn load_catalog(path: &Path) -> Result<StaticFilterCatalog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read facet catalog {}", path.display()))?;
    StaticFilterCatalog::from_json(&raw).context("parse facet catalog")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
