use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use is_terminal::IsTerminal;
use std::io::Write;
use std::path::{Path, PathBuf};

use snitch::directory::{Channel, UserDirectory};
use snitch::history::{extract_calls, RawHistory};
use snitch::progress::Spinner;
use snitch::renderer::graph::render_call_graph;
use snitch::renderer::ReportView;
use snitch::report::{build_report, Delivery, ReportRequest, RunMode};
use snitch::slack::{ClientSettings, SlackClient, DEFAULT_API_BASE};
use snitch::window::ActivityWindow;
use snitch::{logging, matcher, secrets, snapshot};

// Help text constants
const HELP_MAIN: &str = "\
snitch: who has been quiet in a Slack channel?

Commands:
    report       Render (and optionally post) a channel activity report.
    list-users   Print workspace members as CSV (input for --user-file).
    match        Match first names from a names file against a roster.

Usage:
    snitch report -i input.csv -o output.csv -u users.csv [--dry-run]

More help:
    snitch --help report
    snitch --help list-users
    snitch --help match";

const HELP_REPORT: &str = "\
Render a channel activity report

Usage:
    snitch report -i <channel.csv> -u <users.csv> [-o <channel.csv>] [options]

Options:
    -i, --input-channel-file <path>   CSV with channel_id,channel_name of the channel to read.
    -o, --output-channel-file <path>  CSV with the channel to post to (required unless --dry-run).
    -u, --user-file <path>            CSV with user_id,user_name,real_name of tracked users.
    -t, --token-file <path>           File with the API token (SLACK_API_TOKEN wins if set).
    --days <window>                   Lookback window: 7, 7d or 2w (default: 7).
    --views <list>                    Comma-separated: lite,full,calls,graph,participation,initiation,callout.
    --code-block                      Wrap the report in a fixed-width code block.
    -r, --dry-run                     Print the report instead of posting it.
    -y, --yes                         Post without asking for confirmation.
    -b, --bot-name <name>             Display name used for the post.
    --max-messages <n>                History records to fetch at most (default: 1000).
    --save-raw [path]                 Save the fetched history (default: $SNITCH_DATA_DIR/raw/<channel>.json).
    --from-raw <path>                 Render from a saved history instead of fetching.
    --graph <path>                    Also write the call graph as a DOT file.

Examples:
  snitch report -i standup.csv -u users.csv --days 5 --views lite,callout --dry-run
  snitch report -i standup.csv -o team.csv -u users.csv --views full,participation --code-block";

const HELP_LIST_USERS: &str = "\
Print workspace members as CSV

Usage:
    snitch list-users [-t <token.txt>] [--api-base <url>] > users.csv

Deleted accounts are skipped. The output has the user_id,user_name,real_name
header expected by `snitch report --user-file`; trim it to the people to track.

Options:
    -t, --token-file <path>   File with the API token (SLACK_API_TOKEN wins if set).
    --api-base <url>          Slack Web API base URL.";

const HELP_MATCH: &str = "\
Match first names against a roster

Usage:
    snitch match --roster <roster.csv> --names <names.txt>

For every line of the names file, the first word is searched literally and
case-insensitively in each roster line. Each hit prints as:
    Match: <first name> : <roster line>";

#[derive(Parser)]
#[command(name = "snitch", disable_help_flag = true)]
#[command(about = "Channel inactivity reporter", long_about = None)]
struct Cli {
    /// Show help (global or per topic). Example: snitch --help report
    #[arg(long, value_name = "TOPIC", num_args = 0..=1, default_missing_value = "")]
    help: Option<String>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also append logs to <dir>/snitch.log
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render (and optionally post) a channel activity report
    Report(ReportArgs),
    /// Print workspace members as CSV
    ListUsers {
        /// File with the API token
        #[arg(short, long)]
        token_file: Option<PathBuf>,

        /// Slack Web API base URL
        #[arg(long, default_value = DEFAULT_API_BASE)]
        api_base: String,
    },
    /// Match first names from a names file against a roster file
    Match {
        /// Roster file, one entry per line
        #[arg(long)]
        roster: PathBuf,

        /// Names file, one real name per line
        #[arg(long)]
        names: PathBuf,
    },
}

#[derive(Args)]
struct ReportArgs {
    #[arg(short, long)]
    input_channel_file: PathBuf,

    #[arg(short, long)]
    output_channel_file: Option<PathBuf>,

    #[arg(short, long)]
    user_file: PathBuf,

    #[arg(short, long)]
    token_file: Option<PathBuf>,

    #[arg(long, default_value = "7")]
    days: String,

    #[arg(long, default_value = "lite")]
    views: String,

    #[arg(long)]
    code_block: bool,

    #[arg(short = 'r', long)]
    dry_run: bool,

    #[arg(short, long)]
    yes: bool,

    #[arg(short, long)]
    bot_name: Option<String>,

    #[arg(long, default_value_t = 1000)]
    max_messages: usize,

    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "")]
    save_raw: Option<String>,

    #[arg(long, value_name = "PATH", conflicts_with = "save_raw")]
    from_raw: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    graph: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,
}

/// Tokio runtime plus API client, created only when a run needs the network.
struct Remote {
    runtime: tokio::runtime::Runtime,
    client: SlackClient,
}

impl Remote {
    fn connect(token_file: Option<&Path>, api_base: &str) -> Result<Self> {
        let token = secrets::resolve_token(token_file)?;
        let settings = ClientSettings {
            api_base: api_base.to_string(),
            ..ClientSettings::default()
        };
        let client = SlackClient::new(token, settings)?;
        let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
        Ok(Self { runtime, client })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(help_topic) = cli.help {
        let topic = help_topic.trim();
        match help_text(topic) {
            Some(text) => println!("{}", text),
            None => println!("Unknown help topic: {}", topic),
        }
        return Ok(());
    }

    logging::init_logging(cli.log_dir.as_deref(), cli.verbose)?;

    match cli.command {
        Some(Commands::Report(args)) => run_report(args),
        Some(Commands::ListUsers {
            token_file,
            api_base,
        }) => run_list_users(token_file.as_deref(), &api_base),
        Some(Commands::Match { roster, names }) => {
            for found in matcher::match_files(&roster, &names)? {
                println!("{}", found);
            }
            Ok(())
        }
        None => {
            eprintln!("No command specified. Use --help for usage.");
            eprintln!("Example: snitch report -i standup.csv -u users.csv --dry-run");
            Ok(())
        }
    }
}

fn help_text(topic: &str) -> Option<&'static str> {
    match topic.to_ascii_lowercase().as_str() {
        "" => Some(HELP_MAIN),
        "report" => Some(HELP_REPORT),
        "list-users" => Some(HELP_LIST_USERS),
        "match" => Some(HELP_MATCH),
        _ => None,
    }
}

fn run_report(args: ReportArgs) -> Result<()> {
    let window = ActivityWindow::parse(&args.days, Utc::now())?;
    let views = ReportView::parse_list(&args.views)?;
    let mode = RunMode::from_dry_run(args.dry_run);

    let input_channel = Channel::load_from_file(&args.input_channel_file)?;
    let output_channel = match args.output_channel_file {
        Some(ref path) => Channel::load_from_file(path)?,
        None if mode == RunMode::DryRun => input_channel.clone(),
        None => bail!("--output-channel-file is required unless --dry-run is given"),
    };
    let directory = UserDirectory::load_from_file(&args.user_file)?;
    if directory.is_empty() {
        tracing::warn!("No users in {}", args.user_file.display());
    }

    let needs_remote = args.from_raw.is_none() || mode == RunMode::Post;
    let remote = if needs_remote {
        Some(Remote::connect(args.token_file.as_deref(), &args.api_base)?)
    } else {
        None
    };

    let history = load_history(&args, &input_channel, &window, remote.as_ref())?;

    if let Some(ref raw_path) = args.save_raw {
        let path = if raw_path.is_empty() {
            let data_root = snapshot::resolve_data_root();
            snapshot::default_snapshot_path(&data_root, &input_channel.channel_id)
        } else {
            PathBuf::from(raw_path)
        };
        snapshot::save(&history, &path)?;
    }

    if let Some(ref graph_path) = args.graph {
        let calls = extract_calls(&history.messages);
        let dot = render_call_graph(&calls, &directory).to_text();
        std::fs::write(graph_path, dot + "\n")
            .with_context(|| format!("Failed to write call graph: {}", graph_path.display()))?;
        eprintln!("Call graph written to: {}", graph_path.display());
    }

    let request = ReportRequest {
        channel: &input_channel,
        output_channel: &output_channel,
        window,
        directory: &directory,
        history: &history,
        views: &views,
        code_block: args.code_block,
        mode,
    };
    let outcome = build_report(&request);

    if let Some(ref warning) = outcome.warning {
        eprintln!("{}", warning);
    }

    match outcome.delivery {
        Delivery::Print => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", outcome.text)?;
        }
        Delivery::Post { channel_id } => {
            if !args.yes && std::io::stdin().is_terminal() {
                eprintln!("{}\n", outcome.text);
                let confirmed = inquire::Confirm::new(&format!(
                    "Post this report to {}?",
                    output_channel.channel_name
                ))
                .with_default(false)
                .prompt()?;
                if !confirmed {
                    eprintln!("Post cancelled.");
                    return Ok(());
                }
            }

            let remote = remote.context("No API client available for posting")?;
            let ts = remote.runtime.block_on(remote.client.post_message(
                &channel_id,
                &outcome.text,
                args.bot_name.as_deref(),
            ))?;
            tracing::info!("Posted report to {} (ts {})", channel_id, ts);
            eprintln!("Report posted to #{}", output_channel.channel_name);
        }
    }

    Ok(())
}

fn load_history(
    args: &ReportArgs,
    channel: &Channel,
    window: &ActivityWindow,
    remote: Option<&Remote>,
) -> Result<RawHistory> {
    if let Some(ref path) = args.from_raw {
        return snapshot::load(path);
    }

    let remote = remote.context("No API client available for fetching history")?;
    let spinner = Spinner::start(&format!("Fetching history of #{}", channel.channel_name));
    let result = remote.runtime.block_on(remote.client.fetch_history(
        &channel.channel_id,
        window.threshold_timestamp(),
        args.max_messages,
    ));
    match result {
        Ok(history) => {
            spinner.finish(&format!(
                "Fetched {} records from #{}",
                history.messages.len(),
                channel.channel_name
            ));
            Ok(history)
        }
        Err(err) => {
            spinner.clear();
            Err(err)
        }
    }
}

fn run_list_users(token_file: Option<&Path>, api_base: &str) -> Result<()> {
    let remote = Remote::connect(token_file, api_base)?;
    let spinner = Spinner::start("Listing workspace members");
    let users = remote.runtime.block_on(remote.client.list_users());
    spinner.clear();

    let directory = UserDirectory::from_users(users?);
    directory.write_csv(std::io::stdout().lock())?;
    Ok(())
}
