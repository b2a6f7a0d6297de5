use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli_style;

use brickshelf::catalog_client::RebrickableClient;
use brickshelf::collection::{AddOutcome, CollectionService, ImportOutcome};
use brickshelf::collection_store::SqliteCollectionStore;
use brickshelf::config::{AppConfig, CliConfig, FileConfig, LogLevel, DEFAULT_REQUEST_TIMEOUT_SEC};
use brickshelf::enrichment::{derive_category, Enricher};
use brickshelf::view::{all_themes, display_image_url, filter_items, group_by_theme, ALL_THEMES};
use cli_style::{
    confirm, get_prompt, get_styles, print_api_key_status, print_empty_list, print_error,
    print_goodbye, print_help, print_info, print_item_details, print_key_value,
    print_section_footer, print_section_header, print_success, print_theme_group, print_warning,
    print_welcome, CommandHelp,
};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Track your construction-toy set collection.
///
/// Without a COMMAND an interactive shell is opened.
#[derive(Parser, Debug)]
#[command(styles=get_styles(), version = env!("APP_VERSION"))]
struct CliArgs {
    /// Path of the collection database.
    #[clap(long, value_parser = parse_path)]
    pub db: Option<PathBuf>,

    /// Optional TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Catalog API key used when none is saved in the database.
    #[clap(long)]
    pub api_key: Option<String>,

    /// Root of the catalog API.
    #[clap(long)]
    pub api_base_url: Option<String>,

    /// Timeout in seconds for catalog requests.
    #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SEC)]
    pub request_timeout_sec: u64,

    /// Log verbosity. The LOG_LEVEL environment variable takes precedence.
    #[clap(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Run a single shell command and exit, e.g. `add 75313`.
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db.clone(),
            api_key: self.api_key.clone(),
            api_base_url: self.api_base_url.clone(),
            request_timeout_sec: self.request_timeout_sec,
            log_level: self.log_level,
        }
    }
}

#[derive(Parser)]
#[command(styles=get_styles(), name = "", disable_help_subcommand = true)]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Adds a set by its catalog code and fetches its details.
    Add {
        code: String,
        /// Product page, defaults to the building instructions page.
        #[clap(long)]
        url: Option<String>,
    },

    /// Lists the collection grouped by theme.
    List {
        /// Only show sets in this theme.
        #[clap(long)]
        theme: Option<String>,
        /// Only show sets whose code or name contains this text.
        #[clap(long)]
        search: Option<String>,
    },

    /// Shows all themes with their number of sets.
    Themes,

    /// Shows every detail of one set.
    Show { code: String },

    /// Fetches fresh details for every set from the catalog.
    Sync,

    /// Removes a set from the collection.
    Delete {
        code: String,
        /// Skip the confirmation.
        #[clap(long)]
        yes: bool,
    },

    /// Removes every set from the collection.
    Clear {
        /// Skip both confirmations.
        #[clap(long)]
        yes: bool,
    },

    /// Imports a library export or a "lego_sets" list.
    Import { file: PathBuf },

    /// Exports the whole collection as JSON.
    Export { file: Option<PathBuf> },

    /// Manages the catalog API key.
    ApiKey {
        #[command(subcommand)]
        action: ApiKeyAction,
    },

    /// Shows the path of the current collection db.
    Where,

    /// Shows the available commands.
    Help,

    /// Close this program.
    Exit,
}

#[derive(Subcommand)]
enum ApiKeyAction {
    /// Saves the key in the collection database.
    Set { key: String },
    /// Shows which key is in use.
    Show,
    /// Removes the saved key.
    Delete,
}

const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "add",
        args: "<code> [--url URL]",
        description: "Add a set and fetch its details",
    },
    CommandHelp {
        name: "delete",
        args: "<code> [--yes]",
        description: "Remove a set",
    },
    CommandHelp {
        name: "clear",
        args: "[--yes]",
        description: "Remove every set",
    },
    CommandHelp {
        name: "sync",
        args: "",
        description: "Refresh every set from the catalog",
    },
    CommandHelp {
        name: "list",
        args: "[--theme T] [--search S]",
        description: "List sets grouped by theme",
    },
    CommandHelp {
        name: "themes",
        args: "",
        description: "List themes",
    },
    CommandHelp {
        name: "show",
        args: "<code>",
        description: "Show one set",
    },
    CommandHelp {
        name: "import",
        args: "<file>",
        description: "Import a library export or set list",
    },
    CommandHelp {
        name: "export",
        args: "[file]",
        description: "Export the collection as JSON",
    },
    CommandHelp {
        name: "api-key",
        args: "set <key> | show | delete",
        description: "Manage the catalog API key",
    },
    CommandHelp {
        name: "where",
        args: "",
        description: "Show the database path",
    },
    CommandHelp {
        name: "help",
        args: "",
        description: "Show this help",
    },
    CommandHelp {
        name: "exit",
        args: "",
        description: "Close the shell",
    },
];

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

/// Process exit code for a command run outside the shell. The error
/// itself is printed by the caller.
fn one_shot_exit_code(result: &CommandExecutionResult) -> i32 {
    match result {
        CommandExecutionResult::Ok | CommandExecutionResult::Exit => 0,
        CommandExecutionResult::Error(_) => 1,
    }
}

/// Where the collection lives for this session.
struct Session {
    service: CollectionService,
    db_location: String,
}

async fn execute_command(args: Vec<String>, session: &mut Session) -> CommandExecutionResult {
    if args.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));
    let command = match cli {
        Ok(cli) => cli.command,
        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
            return CommandExecutionResult::Ok;
        }
    };

    let service = &mut session.service;
    match command {
        InnerCommand::Add { code, url } => match service.add(&code, url.as_deref()).await {
            Ok(AddOutcome::Added { item, enriched }) => {
                print_success(&format!("Added {} ({})", item.code, item.resolved_name));
                if !enriched {
                    print_warning("No API key set, catalog details were not fetched.");
                }
            }
            Ok(AddOutcome::AlreadyExists(item)) => {
                print_warning(&format!(
                    "A set with code {} already exists in your collection.",
                    item.code
                ));
            }
            Err(err) => return CommandExecutionResult::Error(err.to_string()),
        },

        InnerCommand::List { theme, search } => {
            let theme = match theme {
                Some(theme) => match find_theme(service, &theme) {
                    Some(theme) => theme,
                    None => {
                        return CommandExecutionResult::Error(format!(
                            "Unknown theme {}. Run 'themes' to see them.",
                            theme
                        ))
                    }
                },
                None => ALL_THEMES.to_string(),
            };
            let filtered = filter_items(service.items(), &theme, search.as_deref().unwrap_or(""));

            print_section_header(&format!("Collection ({} sets)", filtered.len()));
            if filtered.is_empty() {
                print_empty_list("No sets found. Try adjusting your search or filter.");
            } else {
                for (theme, items) in group_by_theme(filtered) {
                    print_theme_group(&theme, &items);
                }
            }
            print_section_footer();
        }

        InnerCommand::Themes => {
            let items = service.items();
            print_section_header("Themes");
            for theme in all_themes(items) {
                let count = filter_items(items, &theme, "").len();
                print_key_value(&theme, &count.to_string());
            }
            print_section_footer();
        }

        InnerCommand::Show { code } => match service.get(&code) {
            Some(item) => {
                print_item_details(item, &derive_category(item), &display_image_url(item))
            }
            None => {
                return CommandExecutionResult::Error(format!(
                    "Set {} is not in the collection",
                    code.trim()
                ))
            }
        },

        InnerCommand::Sync => match service.sync().await {
            Ok(report) => {
                if report.enrichment_skipped {
                    print_warning("No API key set, nothing was fetched. Use 'api-key set <key>'.");
                } else {
                    print_success(&format!(
                        "Sync complete: {} sets, {} updated.",
                        report.total, report.updated
                    ));
                }
            }
            Err(err) => {
                return CommandExecutionResult::Error(format!("Sync failed: {}", err));
            }
        },

        InnerCommand::Delete { code, yes } => {
            match confirm_or_skip(yes, &format!("Delete set {} from your collection?", code)) {
                Ok(true) => match service.delete(&code) {
                    Ok(item) => print_success(&format!("Deleted {} ({})", item.code, item.resolved_name)),
                    Err(err) => return CommandExecutionResult::Error(err.to_string()),
                },
                Ok(false) => print_info("Nothing deleted."),
                Err(err) => return CommandExecutionResult::Error(err.to_string()),
            }
        }

        InnerCommand::Clear { yes } => {
            let confirmed = confirm_or_skip(
                yes,
                "Delete ALL sets from your collection? This cannot be undone!",
            )
            .and_then(|first| {
                if first {
                    confirm_or_skip(yes, "Last chance! Permanently delete everything?")
                } else {
                    Ok(false)
                }
            });
            match confirmed {
                Ok(true) => match service.clear() {
                    Ok(removed) => print_success(&format!(
                        "Collection cleared, {} sets removed.",
                        removed
                    )),
                    Err(err) => return CommandExecutionResult::Error(err.to_string()),
                },
                Ok(false) => print_info("Nothing deleted."),
                Err(err) => return CommandExecutionResult::Error(err.to_string()),
            }
        }

        InnerCommand::Import { file } => match service.import_file(&file).await {
            Ok(ImportOutcome::Imported { added, duplicates }) => {
                if duplicates > 0 {
                    print_success(&format!(
                        "Imported {} set(s). {} duplicate(s) skipped.",
                        added, duplicates
                    ));
                } else {
                    print_success(&format!("Successfully imported {} set(s).", added));
                }
                print_info("Run 'sync' to fetch details from the catalog.");
            }
            Ok(ImportOutcome::NothingNew { .. }) => {
                print_info("All sets from the file already exist in your collection.");
            }
            Err(err) => {
                return CommandExecutionResult::Error(format!("Failed to import: {}", err));
            }
        },

        InnerCommand::Export { file } => match service.export_file(file.as_deref()).await {
            Ok(path) => print_success(&format!(
                "Exported {} sets to {}",
                service.items().len(),
                path.display()
            )),
            Err(err) => return CommandExecutionResult::Error(err.to_string()),
        },

        InnerCommand::ApiKey { action } => match action {
            ApiKeyAction::Set { key } => match service.set_api_key(&key) {
                Ok(()) => print_success("API key saved."),
                Err(err) => return CommandExecutionResult::Error(err.to_string()),
            },
            ApiKeyAction::Show => match service.api_key_status() {
                Ok(status) => print_api_key_status(&status),
                Err(err) => return CommandExecutionResult::Error(err.to_string()),
            },
            ApiKeyAction::Delete => match service.delete_api_key() {
                Ok(()) => print_success("API key removed."),
                Err(err) => return CommandExecutionResult::Error(err.to_string()),
            },
        },

        InnerCommand::Where => print_key_value("Database", &session.db_location),

        InnerCommand::Help => print_help(COMMANDS),

        InnerCommand::Exit => return CommandExecutionResult::Exit,
    }
    CommandExecutionResult::Ok
}

/// Matches a user-typed theme against the collection's themes, ignoring case.
fn find_theme(service: &CollectionService, theme: &str) -> Option<String> {
    all_themes(service.items())
        .into_iter()
        .find(|known| known.eq_ignore_ascii_case(theme.trim()))
}

fn confirm_or_skip(skip: bool, question: &str) -> std::io::Result<bool> {
    if skip {
        return Ok(true);
    }
    confirm(question)
}

#[derive(rustyline_derive::Hinter)]
struct MyHelper {
    commands_names: Vec<String>,
}

impl MyHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        MyHelper { commands_names }
    }
}

impl Completer for MyHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for MyHelper {}
impl Validator for MyHelper {}
impl Helper for MyHelper {}

fn init_logging(level: LogLevel) {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(level.as_filter().into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init();
}

/// Opens the collection database, or an in-memory one if that fails.
fn open_store(db_path: &Path) -> Result<(Arc<SqliteCollectionStore>, String)> {
    match SqliteCollectionStore::new(db_path) {
        Ok(store) => Ok((Arc::new(store), db_path.display().to_string())),
        Err(err) => {
            error!("Could not open {:?}: {:#}", db_path, err);
            print_error(&format!(
                "Could not open the collection database at {}: {:#}",
                db_path.display(),
                err
            ));
            print_warning("Using a temporary in-memory collection. Changes will not be saved.");
            let store = SqliteCollectionStore::in_memory()?;
            Ok((Arc::new(store), "(in memory)".to_string()))
        }
    }
}

fn run_shell(runtime: &tokio::runtime::Runtime, session: &mut Session, history_path: &Path) -> Result<()> {
    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<MyHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(MyHelper::new()));
    let _ = rl.load_history(history_path);

    print_welcome(&session.db_location, session.service.items().len());
    if session.service.effective_api_key().is_none() {
        print_warning("No API key set. Use 'api-key set <key>' to fetch set details.");
    }

    let prompt = get_prompt();
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);
                let args = shlex::split(&line)
                    .unwrap_or_else(|| line.split_whitespace().map(String::from).collect());
                match runtime.block_on(execute_command(args, session)) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => break,
                    CommandExecutionResult::Error(err) => {
                        print_error(&err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                print_error(&format!("{:?}", e));
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(history_path) {
        error!("Failed to save shell history to {:?}: {}", history_path, e);
    }
    print_goodbye();
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;
    init_logging(config.log_level);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let (store, db_location) = open_store(&config.db_path)?;
    let client = RebrickableClient::new(&config.api_base_url, config.request_timeout_sec)?;
    let mut service = CollectionService::new(
        store.clone(),
        store,
        Enricher::new(Arc::new(client)),
        config.api_key.clone(),
    );
    if let Err(err) = service.load() {
        print_error(&format!(
            "Could not load data from the local database: {}",
            err
        ));
    }

    let mut session = Session {
        service,
        db_location,
    };

    if !cli_args.command.is_empty() {
        let result = runtime.block_on(execute_command(cli_args.command.clone(), &mut session));
        if let CommandExecutionResult::Error(err) = &result {
            print_error(err);
        }
        match one_shot_exit_code(&result) {
            0 => return Ok(()),
            code => std::process::exit(code),
        }
    }

    let history_path = config.db_path.with_extension("history");
    run_shell(&runtime, &mut session, &history_path)
}
