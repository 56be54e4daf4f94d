use std::path::Path;
use std::path::PathBuf;

use fhc_history::ClickAction;
use fhc_history::EntryStore;
use fhc_history::HistoryConfig;
use fhc_history::RestoreMenuService;
use fhc_history::browse;
use fhc_history::dates;
use fhc_history::factory;
use fhc_history::menu::AffordanceKind;
use fhc_history::menu::MemoryMenu;
use fhc_history::menu::RESTORE_PARENT_ID;
use fhc_history::rank::RankLimits;
use fhc_history::rank::rank_with_limits;
use fhc_history::sanitize;
use fhc_history::types::EntryId;
use fhc_history::types::FieldKind;

use crate::page::CONTEXT;
use crate::page::StdoutChannel;
use crate::page::UrlTab;

/// Width of the value column in `list` output.
const LIST_VALUE_WIDTH: usize = 60;

/// History subcommands.
#[derive(Debug, clap::Subcommand)]
pub enum HistoryCommand {
    /// Record a field value as if it had been typed on `host`.
    Add {
        #[arg(long)]
        host: String,
        #[arg(long)]
        name: String,
        /// Field kind: input, textarea, html, iframe, div or any other tag.
        #[arg(long, default_value = "textarea")]
        kind: String,
        /// Capture time as `YYYY-MM-DDTHH:MM:SS.mmm` (UTC); defaults to now.
        #[arg(long)]
        at: Option<String>,
        value: String,
    },
    /// List entries, most recently used first.
    List {
        /// Keep entries captured on this host.
        #[arg(long)]
        host: Option<String>,
        /// Keep entries for these field names (repeatable).
        #[arg(long = "field")]
        fields: Vec<String>,
    },
    /// Print one entry as JSON.
    Show { id: EntryId },
    /// Replace the value of an entry.
    Edit { id: EntryId, value: String },
    /// Remove an entry by id.
    Rm { id: EntryId },
    /// Export entries to stdout as JSONL.
    Export,
    /// Import JSONL entries from stdin.
    Import,
    /// Show basic statistics about stored entries.
    Stats,
    /// Print ranked restore candidates for a host as JSON.
    Suggest {
        #[arg(long)]
        host: String,
        /// Maximum candidates per group (defaults to the configured value).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Build the restore menu for a page and print its items.
    Menu {
        #[arg(long)]
        url: String,
    },
    /// Activate a restore menu item on a page.
    Restore {
        #[arg(long)]
        url: String,
        /// Menu item id, e.g. `editfld12` or `editfldMore`.
        item: String,
    },
    /// Migrate a JSONL file to a SQLite database.
    Migrate {
        /// Path to the source JSONL file
        #[arg(long)]
        jsonl: PathBuf,
        /// Path to the destination SQLite database file
        #[arg(long)]
        sqlite: PathBuf,
    },
    /// Compact a JSONL file by removing invalid lines and duplicate ids.
    Compact {
        /// Input JSONL file to compact
        #[arg(long)]
        input: PathBuf,
        /// Output JSONL file to write results
        #[arg(long)]
        output: PathBuf,
    },
}

/// Execute a history command against the store in `store_dir`.
pub async fn run(cmd: HistoryCommand, store_dir: &Path, config_path: &Path) -> anyhow::Result<()> {
    match cmd {
        HistoryCommand::Migrate { jsonl, sqlite } => {
            let n = factory::migrate_jsonl_to_sqlite(&jsonl, &sqlite)?;
            println!("Migrated {n} entries");
            return Ok(());
        }
        HistoryCommand::Compact { input, output } => {
            let (read, written) = factory::compact_jsonl(&input, &output)?;
            println!("Read {read} lines, wrote {written} entries");
            return Ok(());
        }
        _ => {}
    }

    let config = HistoryConfig::load(Some(config_path))?;
    let store = factory::open_store(&config, store_dir)?;
    tracing::debug!(backend = config.backend.as_str(), dir = %store_dir.display(), "opened store");

    match cmd {
        HistoryCommand::Add {
            host,
            name,
            kind,
            at,
            value,
        } => {
            let now = match at {
                Some(at) => dates::from_iso_string(&at)?,
                None => dates::now_micros(),
            };
            let id = store.record_capture(&host, &name, FieldKind::parse(&kind), &value, now)?;
            println!("{id}");
        }
        HistoryCommand::List { host, fields } => {
            let fields = (!fields.is_empty()).then_some(fields);
            let entries = browse::entries_for_page(store.as_ref(), fields.as_deref(), host.as_deref())?;
            let now = dates::now_micros();
            for entry in entries {
                let label = sanitize::display_label(&entry.value, usize::MAX);
                println!(
                    "{}\t{}\t{}\t{}\t{} ({} ago)\t{}",
                    entry.id,
                    entry.host,
                    entry.name,
                    entry.kind,
                    dates::to_date_string(entry.last_used),
                    dates::fuzzy_age(entry.last_used, now),
                    sanitize::ellipsis(&label, LIST_VALUE_WIDTH, true),
                );
            }
        }
        HistoryCommand::Show { id } => {
            let entry = store.get(id)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        HistoryCommand::Edit { id, value } => {
            let mut entry = store.get(id)?;
            entry.value = value;
            store.update(&entry)?;
        }
        HistoryCommand::Rm { id } => {
            store.delete(id)?;
        }
        HistoryCommand::Export => {
            let mut out = std::io::stdout().lock();
            store.export(&mut out)?;
        }
        HistoryCommand::Import => {
            let mut input = std::io::stdin().lock();
            let n = store.import(&mut input)?;
            println!("Imported {n} entries");
        }
        HistoryCommand::Stats => {
            let stats = store.stats()?;
            println!("{stats}");
        }
        HistoryCommand::Suggest { host, limit } => {
            let limits = RankLimits {
                max_per_group: limit.unwrap_or(config.max_per_group),
                ..config.rank_limits()
            };
            let candidates = rank_with_limits(store.as_ref(), &host, limits)?;
            println!("{}", serde_json::to_string(&candidates)?);
        }
        HistoryCommand::Menu { url } => {
            let service = menu_service(store, &url, &config);
            service.on_context_activated(CONTEXT).await;
            service.inspect(|_, menu| {
                for item in menu.children_of(RESTORE_PARENT_ID) {
                    match item.kind {
                        AffordanceKind::Separator => println!("{}\t----", item.id),
                        AffordanceKind::Normal => println!("{}\t{}", item.id, item.title),
                    }
                }
            });
        }
        HistoryCommand::Restore { url, item } => {
            let service = menu_service(store, &url, &config);
            match service.on_click(&item, CONTEXT)? {
                // The channel already printed the message.
                ClickAction::Restored(_) => {}
                ClickAction::OpenManager => println!("open manager"),
                ClickAction::Ignored => println!("ignored"),
            }
        }
        HistoryCommand::Migrate { .. } | HistoryCommand::Compact { .. } => {}
    }
    Ok(())
}

fn menu_service(
    store: Box<dyn EntryStore>,
    url: &str,
    config: &HistoryConfig,
) -> RestoreMenuService<Box<dyn EntryStore>, MemoryMenu, UrlTab, StdoutChannel> {
    RestoreMenuService::new(
        store,
        MemoryMenu::with_restore_parent(),
        UrlTab::new(url),
        StdoutChannel,
        config,
    )
}
