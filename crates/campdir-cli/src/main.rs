//! campdir command-line client.
//!
//! Every invocation opens a sync session against the shared document file,
//! applies one intent, flushes the pending save and exits. `watch` keeps the
//! session open and prints each state change.
//!
//! ## Usage
//!
//! ```bash
//! campdir show --region region-satkania-pouroshova
//! campdir add-ward-person region-satkania-pouroshova ward-pouroshova-1 Karim 017XXXXXXXX
//! campdir export --format html --scope all -o directory.html
//! RUST_LOG=campdir_client=debug campdir watch
//! ```

mod config;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use campdir_client::{SessionHandle, spawn_session};
use campdir_store::{FileCache, FsDocumentService};
use campdir_tree::{
    DEFAULT_TITLE, ExportScope, Filters, UNION_RESPONSIBLE_CAP, filter_options, filter_stats, flatten,
    to_csv, to_printable_html, union_at_capacity,
};
use campdir_types::{FormData, FormInput, FormKind};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{CliConfig, SeedSetting};

/// Shared region directory with local-first sync.
#[derive(Parser, Debug)]
#[command(name = "campdir")]
#[command(about = "Region / union / ward contact directory")]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/campdir/config.ron)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Shared document file
    #[arg(long, global = true)]
    document: Option<PathBuf>,

    /// Local cache file
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Seed: "embedded", an http(s) URL, or a JSON file
    #[arg(long, global = true)]
    seed: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Default)]
struct FilterArgs {
    #[arg(long, default_value = "")]
    region: String,
    #[arg(long, default_value = "")]
    union: String,
    #[arg(long, default_value = "")]
    ward: String,
}

impl FilterArgs {
    fn filters(&self) -> Filters {
        Filters::new(&self.region, &self.union, &self.ward)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExportFormat {
    Csv,
    Html,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the (filtered) tree
    Show {
        #[command(flatten)]
        filters: FilterArgs,
        /// Print JSON instead of an outline
        #[arg(long)]
        json: bool,
    },
    /// List selectable unions and wards and the totals for a region
    Options {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Rename a union
    EditUnion { union_id: String, name: String },
    /// Add a ward to a union or a ward-direct region
    AddWard { parent_id: String, name: String },
    EditWard {
        parent_id: String,
        ward_id: String,
        name: String,
    },
    DeleteWard { parent_id: String, ward_id: String },
    AddUnionPerson {
        union_id: String,
        name: String,
        phone: String,
    },
    EditUnionPerson {
        union_id: String,
        person_id: String,
        name: String,
        phone: String,
    },
    DeleteUnionPerson { union_id: String, person_id: String },
    AddWardPerson {
        parent_id: String,
        ward_id: String,
        name: String,
        phone: String,
    },
    EditWardPerson {
        parent_id: String,
        ward_id: String,
        person_id: String,
        name: String,
        phone: String,
    },
    DeleteWardPerson {
        parent_id: String,
        ward_id: String,
        person_id: String,
    },
    /// Write the directory as CSV or a printable HTML document
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
        /// all | filtered
        #[arg(long, default_value = "filtered")]
        scope: ExportScope,
        #[arg(long, default_value = DEFAULT_TITLE)]
        title: String,
        #[arg(long, default_value_t = 30)]
        rows_per_page: usize,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the whole directory with the seed
    Reset,
    /// Delete everything, locally and remotely
    Clear,
    /// Follow remote changes until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    tracing::debug!(document = %config.document.display(), cache = %config.cache.display(), "config loaded");

    let service = Arc::new(FsDocumentService::new(&config.document));
    let cache = Arc::new(FileCache::new(&config.cache));
    let adapter = Arc::new(config.sync.build_adapter(service, config.seed.source()));
    let session = spawn_session(adapter, cache, config.sync.clone());
    session.wait_until_live().await?;
    if tokio::time::timeout(config.sync.read_timeout(), session.wait_until_connected())
        .await
        .is_err()
    {
        tracing::warn!("remote did not answer, continuing with the local tree");
    }

    run(&session, args.command).await?;

    session.flush().await?;
    session.shutdown().await?;
    Ok(())
}

fn load_config(args: &Args) -> Result<CliConfig> {
    let mut config = match args.config.clone().or_else(CliConfig::default_path) {
        Some(path) => CliConfig::load(&path).with_context(|| format!("loading {}", path.display()))?,
        None => CliConfig::default(),
    };
    if let Some(document) = &args.document {
        config.document = document.clone();
    }
    if let Some(cache) = &args.cache {
        config.cache = cache.clone();
    }
    if let Some(seed) = &args.seed {
        config.seed = SeedSetting::parse(seed);
    }
    Ok(config)
}

fn validate(kind: FormKind, name: &str, phone: &str) -> Result<FormData> {
    FormInput::new(name, phone)
        .validate(kind)
        .map_err(|errors| anyhow::anyhow!("{}", render::validation(&errors)))
}

async fn run(session: &SessionHandle, command: Command) -> Result<()> {
    let before = session.state().version;

    match command {
        Command::Show { filters, json } => {
            session.set_filters(filters.filters()).await?;
            let state = session.state();
            if json {
                println!("{}", serde_json::to_string_pretty(&*state.filtered)?);
            } else {
                print!("{}", render::tree(&state.filtered));
            }
            return Ok(());
        }
        Command::Options { filters } => {
            let state = session.state();
            let filters = filters.filters();
            print!("{}", render::options(&filter_options(&state.tree, &filters)));
            match filter_stats(&state.tree, &filters) {
                Some(stats) => println!("{}", render::stats(&stats)),
                None => eprintln!("choose a region with --region"),
            }
            return Ok(());
        }
        Command::EditUnion { union_id, name } => {
            let form = validate(FormKind::Union, &name, "")?;
            session.edit_union_name(&union_id, &form.name).await?;
        }
        Command::AddWard { parent_id, name } => {
            let form = validate(FormKind::Ward, &name, "")?;
            let id = session.add_ward(&parent_id, &form.name).await?;
            report_created(session, before, &id);
        }
        Command::EditWard {
            parent_id,
            ward_id,
            name,
        } => {
            let form = validate(FormKind::Ward, &name, "")?;
            session.edit_ward(&parent_id, &ward_id, &form.name).await?;
        }
        Command::DeleteWard { parent_id, ward_id } => {
            session.delete_ward(&parent_id, &ward_id).await?;
        }
        Command::AddUnionPerson { union_id, name, phone } => {
            let form = validate(FormKind::UnionPerson, &name, &phone)?;
            if union_at_capacity(&session.state().tree, &union_id) {
                bail!("union {union_id} already has {UNION_RESPONSIBLE_CAP} responsible persons");
            }
            let id = session.add_union_person(&union_id, &form.name, form.phone).await?;
            report_created(session, before, &id);
        }
        Command::EditUnionPerson {
            union_id,
            person_id,
            name,
            phone,
        } => {
            let form = validate(FormKind::UnionPerson, &name, &phone)?;
            session
                .edit_union_person(&union_id, &person_id, &form.name, form.phone)
                .await?;
        }
        Command::DeleteUnionPerson { union_id, person_id } => {
            session.delete_union_person(&union_id, &person_id).await?;
        }
        Command::AddWardPerson {
            parent_id,
            ward_id,
            name,
            phone,
        } => {
            let form = validate(FormKind::WardPerson, &name, &phone)?;
            let id = session
                .add_ward_person(&parent_id, &ward_id, &form.name, form.phone)
                .await?;
            report_created(session, before, &id);
        }
        Command::EditWardPerson {
            parent_id,
            ward_id,
            person_id,
            name,
            phone,
        } => {
            let form = validate(FormKind::WardPerson, &name, &phone)?;
            session
                .edit_ward_person(&parent_id, &ward_id, &person_id, &form.name, form.phone)
                .await?;
        }
        Command::DeleteWardPerson {
            parent_id,
            ward_id,
            person_id,
        } => {
            session.delete_ward_person(&parent_id, &ward_id, &person_id).await?;
        }
        Command::Export {
            filters,
            format,
            scope,
            title,
            rows_per_page,
            output,
        } => {
            session.set_filters(filters.filters()).await?;
            let state = session.state();
            let rows = flatten(scope.select(&state.tree, &state.filtered));
            let text = match format {
                ExportFormat::Csv => to_csv(&rows),
                ExportFormat::Html => to_printable_html(&rows, &title, rows_per_page),
            };
            match output {
                Some(path) => {
                    tokio::fs::write(&path, text)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("{} rows written to {}", rows.len(), path.display());
                }
                None => print!("{text}"),
            }
            return Ok(());
        }
        Command::Reset => {
            session.reset_to_seed().await?;
            eprintln!("directory reset to seed");
            return Ok(());
        }
        Command::Clear => {
            if session.clear_all().await? {
                eprintln!("directory cleared");
            } else {
                eprintln!("directory cleared locally; remote unreachable");
            }
            return Ok(());
        }
        Command::Watch => return watch(session).await,
    }

    if session.state().version == before {
        eprintln!("nothing changed (unknown id?)");
    }
    Ok(())
}

fn report_created(session: &SessionHandle, before: u64, id: &str) {
    if session.state().version != before {
        println!("{id}");
    }
}

async fn watch(session: &SessionHandle) -> Result<()> {
    let mut states = session.subscribe_state();
    println!("{}", render::status(&states.borrow_and_update()));

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", render::status(&states.borrow_and_update()));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
