use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use favgen_core::{AssetId, AssetRef, Crop, DocId, Selection, SettingsDoc, UserId};
use favgen_magick::MagickTranscoder;
use favgen_pipeline::{doctor, Config, Pipeline};
use favgen_store::{DocStore, FsAssetStore, NotificationSink, NotifyKind, NotifyOptions};
use favgen_store_sqlite::SqliteDocStore;

#[derive(Parser)]
#[command(name = "favgen", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize favgen here (creates .favgen/, config, db, primary doc)
    Init,

    /// Validate tooling: ImageMagick on PATH, writable roots
    Doctor,

    /// Set or clear the favicon source selection, then rebuild as a
    /// post-save side effect
    Select {
        /// Asset id to select; omit together with --clear to empty the field
        #[arg(long, conflicts_with = "clear")]
        asset: Option<String>,
        #[arg(long, default_value = "png")]
        extension: String,
        /// Crop as left,top,width,height
        #[arg(long)]
        crop: Option<String>,
        #[arg(long, default_value_t = false)]
        clear: bool,
    },

    /// Rebuild the favicon files from the current selection. Returns
    /// immediately if the selection has not changed or has not been made.
    Build {
        /// User to send progress notifications to
        #[arg(long)]
        notify_user_id: Option<String>,
    },

    /// Show the persisted markup and fingerprint
    Status,
}

/// Notification sink for a terminal session: messages go to stdout.
struct StdoutNotifier;

impl NotificationSink for StdoutNotifier {
    fn notify(&self, user: &UserId, message: &str, options: &NotifyOptions) {
        let tag = match options.kind {
            NotifyKind::Info => "info",
            NotifyKind::Error => "error",
        };
        println!("[{}] to {}: {}", tag, user.as_str(), message);
    }
}

fn open_pipeline(cfg: Config) -> Result<(Arc<Pipeline>, Arc<SqliteDocStore>)> {
    let docs = Arc::new(SqliteDocStore::open(&cfg.db_path())?);
    let assets = Arc::new(FsAssetStore::new(
        cfg.asset_root(),
        cfg.project.public_base_url.clone(),
        cfg.rendition_catalog(),
    ));
    let transcoder = Arc::new(MagickTranscoder::new(cfg.runtime.convert_binary.clone()));
    let pipeline = Arc::new(Pipeline::new(cfg, assets, docs.clone(), transcoder, Arc::new(StdoutNotifier)));
    Ok((pipeline, docs))
}

fn load_config() -> Result<Config> {
    let root = std::env::current_dir()?;
    let path = Config::config_path(&root);
    if !path.exists() {
        return Err(anyhow!("no config at {}; run `favgen init` first", path.display()));
    }
    Config::load_from(&path)
}

fn parse_crop(s: &str) -> Result<Crop> {
    let parts: Vec<u32> = s
        .split(',')
        .map(|p| p.trim().parse::<u32>().context("crop values must be integers"))
        .collect::<Result<_>>()?;
    if parts.len() != 4 {
        return Err(anyhow!("crop must be left,top,width,height"));
    }
    Ok(Crop { left: parts[0], top: parts[1], width: parts[2], height: parts[3] })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Init => {
            let root = std::env::current_dir()?;
            let path = Config::config_path(&root);
            let cfg = if path.exists() {
                Config::load_from(&path)?
            } else {
                let cfg = Config::default_for(&root);
                cfg.save_to(&path)?;
                cfg
            };
            let docs = SqliteDocStore::open(&cfg.db_path())?;
            let primary = DocId::from_str(cfg.project.primary_doc_id.clone());
            if docs.load_settings(&primary).is_err() {
                docs.save_settings(&SettingsDoc::new(primary, None))?;
            }
            println!("Initialized favgen in {}", root.display());
        }
        Command::Doctor => {
            let cfg = load_config()?;
            doctor(&cfg)?;
            println!("OK");
        }
        Command::Select { asset, extension, crop, clear } => {
            let cfg = load_config()?;
            let primary = DocId::from_str(cfg.project.primary_doc_id.clone());
            let selection = if clear {
                Selection::default()
            } else {
                let asset = asset.ok_or_else(|| anyhow!("--asset is required unless --clear"))?;
                Selection {
                    asset: Some(AssetRef { id: AssetId::from_str(asset), extension }),
                    crop: crop.as_deref().map(parse_crop).transpose()?,
                }
            };

            let (pipeline, docs) = open_pipeline(cfg)?;
            docs.save_selection(&primary, &selection)?;
            println!("Selection saved");

            // The save itself is done; the rebuild runs detached. Joining here
            // only keeps the process alive until it finishes.
            if let Some(handle) = pipeline.on_document_saved(primary, None) {
                let _ = handle.join();
            }
        }
        Command::Build { notify_user_id } => {
            let cfg = load_config()?;
            let primary = DocId::from_str(cfg.project.primary_doc_id.clone());
            let (pipeline, _docs) = open_pipeline(cfg)?;
            let user = notify_user_id.map(UserId::from_str);
            let outcome = pipeline.build(&primary, user.as_ref())?;
            println!("Build finished: {:?}", outcome);
        }
        Command::Status => {
            let cfg = load_config()?;
            let primary = DocId::from_str(cfg.project.primary_doc_id.clone());
            let docs = SqliteDocStore::open(&cfg.db_path())?;
            let doc = docs.load_settings(&primary)?;
            println!("Doc: {}", doc.id.as_str());
            println!("Fingerprint: {}", doc.favicon_fingerprint);
            match &doc.selection.asset {
                Some(a) => println!("Selection: {} (.{})", a.id.as_str(), a.extension),
                None => println!("Selection: none"),
            }
            if doc.favicon_links.is_empty() {
                println!("Links: (none)");
            } else {
                print!("{}", doc.favicon_links);
            }
        }
    }

    Ok(())
}
