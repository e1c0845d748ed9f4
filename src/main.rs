//! CLI entry point for `pst2md`.

use std::path::PathBuf;
use std::time::Instant;

use clap::{CommandFactory, Parser};

use pst2md::config::Config;
use pst2md::pipeline::has_pst_extension;
use pst2md::pool::{self, FileOutcome, OutcomeReport};
use pst2md::progress::Progress;

#[derive(Parser)]
#[command(
    name = "pst2md",
    version,
    about = "Extract emails from Outlook PST files to Markdown format",
    after_help = "Examples:\n  pst2md -i emails.pst\n  pst2md -i file1.pst file2.pst -o ./output -w 2"
)]
struct Cli {
    /// Input PST file(s)
    #[arg(
        short,
        long,
        value_name = "PST",
        num_args = 1..,
        required_unless_present_any = ["completions", "manpage"]
    )]
    input: Vec<PathBuf>,

    /// Output directory (default: same directory as each input PST)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Number of PST files processed in parallel (default: 1)
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL", exclusive = true)]
    completions: Option<clap_complete::Shell>,

    /// Print a man page and exit
    #[arg(long, exclusive = true)]
    manpage: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        return cmd_completions(shell);
    }
    if cli.manpage {
        return cmd_manpage();
    }

    let config = pst2md::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    cmd_convert(&cli, &config)
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = pst2md::config::log_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "pst2md.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "pst2md", &mut std::io::stdout());
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

/// Convert every input PST and print a summary.
fn cmd_convert(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let inputs: Vec<PathBuf> = cli
        .input
        .iter()
        .map(|p| std::path::absolute(p).unwrap_or_else(|_| p.clone()))
        .collect();

    for pst in &inputs {
        if !has_pst_extension(pst) {
            tracing::warn!(path = %pst.display(), "Input may not be a PST file");
        }
    }

    let output = cli
        .output
        .as_ref()
        .map(|o| std::path::absolute(o).unwrap_or_else(|_| o.clone()));
    let workers = pool::effective_workers(
        cli.workers.unwrap_or(config.general.workers),
        inputs.len(),
    );

    let progress = if cli.json {
        Progress::hidden()
    } else {
        println!(
            "Processing {} PST file(s) with {} worker(s)",
            inputs.len(),
            workers
        );
        println!();
        Progress::new()
    };

    let start = Instant::now();
    let outcomes = pool::run_all(
        &inputs,
        output.as_deref(),
        workers,
        config,
        &progress,
        &pst2md::mailbox::connect_default,
    );
    let elapsed = start.elapsed();

    if cli.json {
        print_summary_json(&outcomes, elapsed)?;
    } else {
        print_summary_table(&outcomes, elapsed);
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} PST file(s) failed", outcomes.len());
    }
    Ok(())
}

/// Print per-file results and totals.
fn print_summary_table(outcomes: &[FileOutcome], elapsed: std::time::Duration) {
    use humansize::{format_size, BINARY};

    println!();
    println!("{}", "=".repeat(50));
    println!("Summary");
    println!("{}", "=".repeat(50));

    let mut total = 0usize;
    let mut total_bytes = 0u64;
    for outcome in outcomes {
        let name = outcome
            .pst
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| outcome.pst.display().to_string());
        match &outcome.result {
            Ok(stats) => {
                print!("  {name}: {} emails processed", stats.messages);
                if stats.skipped > 0 {
                    print!(", {} skipped", stats.skipped);
                }
                println!(
                    " ({} attachment(s), {})",
                    stats.attachments,
                    format_size(stats.bytes, BINARY)
                );
                total += stats.messages;
                total_bytes += stats.bytes;
            }
            Err(e) => println!("  {name}: FAILED - {e}"),
        }
    }

    println!();
    println!(
        "Total: {total} emails converted to Markdown ({}, {:.2?})",
        format_size(total_bytes, BINARY),
        elapsed
    );
}

/// Print per-file results as JSON.
fn print_summary_json(outcomes: &[FileOutcome], elapsed: std::time::Duration) -> anyhow::Result<()> {
    let files: Vec<OutcomeReport> = outcomes.iter().map(OutcomeReport::from).collect();
    let total: usize = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .map(|s| s.messages)
        .sum();

    let summary = serde_json::json!({
        "files": files,
        "total_messages": total,
        "failed": outcomes.iter().filter(|o| o.result.is_err()).count(),
        "elapsed_ms": elapsed.as_millis(),
    });

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
