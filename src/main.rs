use anyhow::{anyhow, Context};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;

use comicat::config::{default_database_path, RemoteConfig};
use comicat::search::SearchEngine;
use comicat::{BaseUrl, Catalog, Field, RemoteClient, Synchronizer};

const DEFAULT_LOG_ENV: &str = "comicat=info";

#[derive(Debug, StructOpt)]
#[structopt(name = "comicat", about = "webcomic catalog mirror & search")]
enum Cmd {
    /// Creates the catalog database and applies migrations.
    #[structopt(name = "setup")]
    Setup {
        /// Database path. If not provided defaults to ~/comicat.sqlite
        #[structopt(long, parse(from_os_str))]
        db: Option<PathBuf>,
    },

    /// Pulls new and grown comics from the remote catalog.
    #[structopt(name = "sync")]
    Sync {
        /// Database path. If not provided defaults to ~/comicat.sqlite
        #[structopt(long, parse(from_os_str))]
        db: Option<PathBuf>,
        /// Root of the remote JSON API.
        #[structopt(long)]
        api_root: BaseUrl,
        /// Root of the static host serving thumbnails and pages.
        #[structopt(long)]
        static_root: BaseUrl,
        /// Per-request timeout in seconds.
        #[structopt(long, default_value = "30")]
        timeout: u64,
        /// Re-fetch every comic instead of only new or grown ones.
        #[structopt(long)]
        full: bool,
    },

    /// Prints a single comic with all of its pages. Name must match exactly.
    #[structopt(name = "show")]
    Show {
        name: String,
        #[structopt(long, parse(from_os_str))]
        db: Option<PathBuf>,
    },

    /// Lists comics page by page, best rated first.
    #[structopt(name = "browse")]
    Browse {
        #[structopt(default_value = "1")]
        page: usize,
        #[structopt(short, long, default_value = "10")]
        limit: usize,
        #[structopt(long, parse(from_os_str))]
        db: Option<PathBuf>,
    },

    /// Fuzzy search over one comic attribute.
    #[structopt(name = "search")]
    Search {
        /// One of: name, artist, category, tag
        #[structopt(short, long, default_value = "name")]
        by: String,
        query: Vec<String>,
        #[structopt(short, long, default_value = "10")]
        limit: usize,
        #[structopt(long, parse(from_os_str))]
        db: Option<PathBuf>,
    },

    /// Comics carrying any of the given keywords, matched exactly.
    #[structopt(name = "search-keywords")]
    SearchKeywords {
        keywords: Vec<String>,
        #[structopt(short, long, default_value = "10")]
        limit: usize,
        #[structopt(long, parse(from_os_str))]
        db: Option<PathBuf>,
    },

    /// Keywords by number of comics using them.
    #[structopt(name = "keywords")]
    Keywords {
        #[structopt(default_value = "1")]
        page: usize,
        #[structopt(short, long, default_value = "10")]
        limit: usize,
        #[structopt(long, parse(from_os_str))]
        db: Option<PathBuf>,
    },
}

fn open_catalog(db: Option<PathBuf>) -> anyhow::Result<Catalog> {
    let path = db.unwrap_or_else(default_database_path);
    log::debug!("Opening SQLite DB at {:?}", path);
    Catalog::open(&path).with_context(|| format!("Cannot open catalog at {:?}", path))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Cmd {
    fn process(self) -> anyhow::Result<()> {
        match self {
            Cmd::Setup { db } => {
                open_catalog(db)?;
                log::info!("Setup succeeded.");
            }
            Cmd::Sync {
                db,
                api_root,
                static_root,
                timeout,
                full,
            } => {
                let config = RemoteConfig::builder()
                    .api_root(api_root)
                    .static_root(static_root)
                    .timeout(Duration::from_secs(timeout))
                    .build()
                    .map_err(|e| anyhow!("{}", e))?;
                let mut catalog = open_catalog(db)?;
                let sync = Synchronizer::new(RemoteClient::new(config));

                let report = if full {
                    sync.run_full(&mut catalog)?
                } else {
                    sync.run(&mut catalog)?
                };
                print_json(&report)?;
            }
            Cmd::Show { name, db } => {
                let catalog = open_catalog(db)?;
                match SearchEngine::new(&catalog).get(&name)? {
                    Some(comic) => print_json(&comic)?,
                    None => return Err(anyhow!("Comic not found: {}", name)),
                }
            }
            Cmd::Browse { page, limit, db } => {
                let catalog = open_catalog(db)?;
                let search = SearchEngine::new(&catalog);
                let max_page = search.max_page(limit)?;
                log::info!("Page {} of {}", page, max_page + 1);
                print_json(&search.by_page(page, limit)?)?;
            }
            Cmd::Search {
                by,
                query,
                limit,
                db,
            } => {
                let query = query.join(" ");
                let catalog = open_catalog(db)?;
                let search = SearchEngine::new(&catalog);
                let found = match by.as_str() {
                    "name" => search.by_name(&query, limit)?,
                    "artist" => search.by_field(Field::Artist, &query, limit)?,
                    "category" => search.by_field(Field::Category, &query, limit)?,
                    "tag" => search.by_field(Field::Tag, &query, limit)?,
                    other => return Err(anyhow!("Unknown search attribute: {}", other)),
                };
                if found.is_empty() {
                    log::info!("No comics found for {:?}", query);
                }
                print_json(&found)?;
            }
            Cmd::SearchKeywords {
                keywords,
                limit,
                db,
            } => {
                let catalog = open_catalog(db)?;
                print_json(&SearchEngine::new(&catalog).by_keywords(&keywords, limit)?)?;
            }
            Cmd::Keywords { page, limit, db } => {
                let catalog = open_catalog(db)?;
                print_json(&SearchEngine::new(&catalog).keyword_page(page, limit)?)?;
            }
        }

        Ok(())
    }
}

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(DEFAULT_LOG_ENV));

    let opt = Cmd::from_args();
    log::debug!("opt: {:?}", opt);

    if let Err(e) = opt.process() {
        log::error!(
            "Error: {}, source: {:?}",
            e,
            e.chain().nth(1).map(ToString::to_string)
        );
        std::process::exit(1)
    }
}
