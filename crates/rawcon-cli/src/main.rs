mod buffer_cmd;
mod history_cmd;
mod output;
mod request_cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use rawcon::config::ConsoleConfig;
use rawcon::console::Console;
use rawcon::logging;
use rawcon::paths;
use rawcon::remote;
use rawcon::store::SqliteStore;

#[derive(Parser)]
#[command(
    name = "rawcon",
    version,
    about = "Raw HTTP console for the campaign backend"
)]
struct Cli {
    /// Base URL for this invocation (overrides the saved one)
    #[arg(long, global = true, env = "RAWCON_BASE_URL")]
    base_url: Option<String>,

    /// Log request resolution and store diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Exit 2 when the command did not fully succeed
    #[arg(long, global = true)]
    fail_on_error: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current campaign, base URL and history size
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Campaign list, selection and creation
    Campaign {
        #[command(subcommand)]
        action: CampaignAction,
    },
    /// Actor selection
    Actor {
        #[command(subcommand)]
        action: ActorAction,
    },
    /// Chat turns
    Turn {
        #[command(subcommand)]
        action: TurnAction,
    },
    /// Campaign settings schema and patches
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Manage the editable request bodies
    Buffer {
        #[command(subcommand)]
        action: buffer_cmd::BufferAction,
    },
    /// Request/response history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings and file locations
    Show,
    /// Save the base URL (omit URL or pass --clear to remove it)
    BaseUrl {
        url: Option<String>,
        #[arg(long, conflicts_with = "url")]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum CampaignAction {
    /// Fetch the campaign list from the server
    List,
    /// Print known campaigns without a request
    Options,
    /// Make a campaign current (omit ID to clear)
    Select { id: Option<String> },
    /// Create a campaign from the create buffer
    Create,
}

#[derive(Subcommand)]
enum ActorAction {
    /// Set actor_id in the select-actor buffer
    Apply { actor_id: String },
    /// Send the select-actor buffer
    Select,
}

#[derive(Subcommand)]
enum TurnAction {
    /// Set user_input in the turn buffer
    Input { text: String },
    /// Send the turn buffer
    Send,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Fetch the settings schema for the current campaign
    Schema,
    /// Apply the settings-patch buffer to the current campaign
    Apply,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List recorded requests, newest first
    List {
        /// Show request and response bodies for every entry
        #[arg(long)]
        full: bool,
    },
    /// Show one entry (0 is the newest)
    Show {
        index: usize,
        /// Print only the request body
        #[arg(long, conflicts_with = "response")]
        request: bool,
        /// Print only the response body
        #[arg(long)]
        response: bool,
    },
    /// Write the history to a timestamped JSON file
    Export {
        /// Target directory (default: config `[export] dir`, else cwd)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Remove all entries
    Clear,
}

/// Open the persisted console state for this invocation.
fn open_console(cli: &Cli) -> anyhow::Result<(Console<SqliteStore>, ConsoleConfig)> {
    let path =
        paths::db_path().ok_or_else(|| anyhow::anyhow!("cannot determine console DB path"))?;
    let store = SqliteStore::open(&path)?;
    let client = remote::http::build_client()?;
    let config = ConsoleConfig::load();
    let console = Console::open(store, client, cli.base_url.as_deref(), &config);
    Ok((console, config))
}

fn or_exit(r: anyhow::Result<i32>) -> i32 {
    r.unwrap_or_else(|e| {
        eprintln!("[rawcon] error: {e:#}");
        1
    })
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let (mut console, config) = open_console(cli)?;
    let fail = cli.fail_on_error;
    let code = match &cli.command {
        Commands::Status { json } => request_cmd::cmd_status(&console, *json),
        Commands::Config { action } => match action {
            ConfigAction::Show => request_cmd::cmd_config_show(&console, &config),
            ConfigAction::BaseUrl { url, clear } => {
                let url = if *clear { None } else { url.as_deref() };
                output::finish(&console.save_base_url(url), fail)
            }
        },
        Commands::Campaign { action } => match action {
            CampaignAction::List => request_cmd::cmd_campaign_list(&mut console, fail),
            CampaignAction::Options => request_cmd::cmd_campaign_options(&console),
            CampaignAction::Select { id } => {
                output::finish(&console.select_campaign(id.as_deref().unwrap_or("")), fail)
            }
            CampaignAction::Create => request_cmd::cmd_campaign_create(&mut console, fail),
        },
        Commands::Actor { action } => match action {
            ActorAction::Apply { actor_id } => output::finish(&console.apply_actor(actor_id), fail),
            ActorAction::Select => request_cmd::cmd_actor_select(&mut console, fail),
        },
        Commands::Turn { action } => match action {
            TurnAction::Input { text } => output::finish(&console.apply_user_input(text), fail),
            TurnAction::Send => output::finish_projection(&console.send_turn(), fail),
        },
        Commands::Settings { action } => match action {
            SettingsAction::Schema => output::finish_projection(&console.load_schema(), fail),
            SettingsAction::Apply => output::finish_projection(&console.apply_settings(), fail),
        },
        Commands::Buffer { action } => buffer_cmd::run_buffer_action(&mut console, action, fail)?,
        Commands::History { action } => match action {
            HistoryAction::List { full } => history_cmd::cmd_history_list(&console, *full),
            HistoryAction::Show {
                index,
                request,
                response,
            } => history_cmd::cmd_history_show(&console, *index, *request, *response),
            HistoryAction::Export { dir } => {
                let dir = dir
                    .clone()
                    .or_else(|| config.export_dir.clone())
                    .unwrap_or_else(|| PathBuf::from("."));
                history_cmd::cmd_history_export(&console, &dir)?
            }
            HistoryAction::Clear => output::finish(&console.clear_history(), fail),
        },
    };
    Ok(code)
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let exit_code = or_exit(run(&cli));
    std::process::exit(exit_code);
}
