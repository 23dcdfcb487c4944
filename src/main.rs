//! CLI entry point for `mailscope`.

use std::io::Write;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mailscope::config::Config;
use mailscope::export;
use mailscope::imap::fetch::{fetch_summaries, FetchRequest, ProgressFn};
use mailscope::imap::session::{self, Credentials, ServerAddress};
use mailscope::model::summary::MessageSummary;

/// Inspect an IMAP mailbox: sender, recipient, subject, date, size and
/// attachment names for a range of messages.
#[derive(Parser)]
#[command(name = "mailscope", version, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// IMAP server in host[:port] form (default port 143)
    #[arg(short, long, value_name = "ADDRESS")]
    server: Option<String>,

    /// Username; the password is asked for interactively and not echoed
    #[arg(short, long, value_name = "USER")]
    user: Option<String>,

    /// Use TLS
    #[arg(long)]
    ssl: bool,

    /// Range of messages, e.g. "1:10" or "3,7:*" (all by default)
    #[arg(short = 'n', long = "range", value_name = "RANGE")]
    range: Option<String>,

    /// Mailbox to inspect
    #[arg(short, long, value_name = "NAME")]
    mailbox: Option<String>,

    /// Print the report as JSON instead of tab-separated text
    #[arg(long)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => return cmd_completions(shell),
        Some(Commands::Manpage) => return cmd_manpage(),
        None => {}
    }

    let (Some(server), Some(user)) = (cli.server.as_deref(), cli.user.as_deref()) else {
        Cli::command().print_help()?;
        std::process::exit(1);
    };

    let config = mailscope::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    cmd_inspect(&cli, server, user, &config)
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_path = mailscope::config::log_file_path(config);
    let log_dir = mailscope::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_name = log_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "mailscope.log".into());
        let file_appender = tracing_appender::rolling::never(&log_dir, file_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailscope", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Prompt for the password, connect, fetch and print the report.
fn cmd_inspect(cli: &Cli, server: &str, user: &str, config: &Config) -> anyhow::Result<()> {
    let address = ServerAddress::parse(server, config.server.default_port)?;
    tracing::info!(server = %address, "Parsed server address");

    // Read the password before any network activity.
    let password = mailscope::terminal::prompt_password("Enter your password: ")?;
    let credentials = Credentials {
        username: user.to_string(),
        password,
    };

    let mailbox = cli.mailbox.as_deref().unwrap_or(&config.server.mailbox);
    let request = FetchRequest {
        mailbox,
        range: cli.range.as_deref(),
        buffer_capacity: config.fetch.buffer_capacity,
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} Fetching {pos}/{len} {msg}")
            .expect("valid template"),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let update = |current: usize, total: usize| {
        pb.set_length(total as u64);
        pb.set_position(current as u64);
    };
    let progress: ProgressFn = &update;

    let summaries = runtime.block_on(async {
        let mut session = session::connect(&address, cli.ssl, &credentials).await?;
        let outcome = fetch_summaries(&mut session, &request, Some(progress)).await;
        session::conclude(&mut session, outcome).await
    });
    pb.finish_and_clear();
    let summaries = summaries?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if cli.json || config.report.format == "json" {
        export::json::write_json(&mut out, &summaries)?;
    } else {
        export::text::write_report(&mut out, &summaries, &config.report_options())?;
    }
    out.flush()?;

    print_totals(&summaries);
    Ok(())
}

/// Print a one-line summary of the fetched messages to stderr.
fn print_totals(summaries: &[MessageSummary]) {
    use humansize::{format_size, BINARY};

    let total_size: u64 = summaries.iter().map(|s| s.size).sum();
    let attachments: usize = summaries.iter().map(|s| s.attachment_count()).sum();
    eprintln!(
        "  {} message(s), {} attachment(s), {} total",
        summaries.len(),
        attachments,
        format_size(total_size, BINARY)
    );
}
