use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use aura::session::{HandsFreeSession, Turn};
use aura::tools::CATALOG;
use aura::{Config, ControlLoop, LogSpeaker, WakeWordDetector};

/// Commands the demo walks through
const DEMO_COMMANDS: &[&str] = &[
    "set brightness to 50",
    "turn up the volume",
    "mute",
    "open chrome",
    "take a screenshot",
    "what time is it",
    "what is machine learning",
    "play despacito on youtube",
    "create folder named test",
];

/// Aura - hands-free voice assistant core
#[derive(Parser)]
#[command(name = "aura", version, about)]
struct Cli {
    /// How the assistant addresses you
    #[arg(short, long, env = "AURA_USER_NAME")]
    user_name: Option<String>,

    /// Report actions without running them
    #[arg(long, env = "AURA_DRY_RUN")]
    dry_run: bool,

    /// Never call the remote model, even if an API key is set
    #[arg(long)]
    offline: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Hands-free session over transcripts read from stdin, one per line
    Listen,
    /// Handle a single utterance
    Ask {
        /// What to say
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Run the demo command list and print statistics
    Demo {
        /// Actually perform the actions instead of a dry run
        #[arg(long)]
        live: bool,
    },
    /// List the local function catalog
    Catalog,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,aura=info",
        1 => "info,aura=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load();
    if let Some(name) = cli.user_name {
        config.assistant.user_name = name;
    }
    if cli.dry_run {
        config.executor.dry_run = true;
    }

    match cli.command.unwrap_or(Command::Listen) {
        Command::Listen => listen(&config, cli.offline).await,
        Command::Ask { text } => {
            let control = ControlLoop::from_config(&config, cli.offline)?;
            let response = control.process_command(&text.join(" ")).await;
            println!("{response}");
            Ok(())
        }
        Command::Demo { live } => {
            if !live {
                config.executor.dry_run = true;
            }
            demo(&config, cli.offline).await
        }
        Command::Catalog => {
            for function in CATALOG {
                println!("{:<48} {}", function.signature(), function.description);
            }
            Ok(())
        }
    }
}

async fn listen(config: &Config, offline: bool) -> anyhow::Result<()> {
    let control = Arc::new(ControlLoop::from_config(config, offline)?);
    let detector = WakeWordDetector::new(config.assistant.wake_words.iter().cloned())?;
    let mut session = HandsFreeSession::new(Arc::clone(&control), detector, LogSpeaker);

    tracing::info!(
        wake_words = ?config.assistant.wake_words,
        remote = control.has_remote(),
        "listening for transcripts on stdin"
    );
    session.greet().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match session.handle_transcript(&line).await? {
            Turn::Ignored => tracing::debug!(transcript = %line, "ignored"),
            Turn::Awaiting => tracing::debug!("awaiting command"),
            Turn::Responded(_) => {}
        }
    }

    println!("\n{}", control.stats());
    Ok(())
}

async fn demo(config: &Config, offline: bool) -> anyhow::Result<()> {
    let control = ControlLoop::from_config(config, offline)?;
    println!("{}\n", control.greeting());

    for command in DEMO_COMMANDS {
        println!("> {command}");
        let response = control.process_command(command).await;
        println!("< {response}\n");
    }

    println!("{}", control.stats());
    Ok(())
}
