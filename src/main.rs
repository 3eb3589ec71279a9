use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, QueueCommands};
use config::Config;
use tourney::connectivity::{ConnectivitySignal, HttpProbe, QueueDrainer, QueueNotice};
use tourney::domain::{Item, Pair, Preference, RatingTable};
use tourney::queue::{DrainOutcome, PersistenceQueue};
use tourney::rating::RatingRecorder;
use tourney::remote::{HttpRemoteSave, RemoteSave};
use tourney::scheduler::MatchScheduler;

fn setup_logging(level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tourney")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("tourney.log");

    // Setup env_logger with file output; RUST_LOG wins over the configured level
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Vote { names, user, offline } => handle_vote_command(names, user, *offline, config).await,
        Commands::Queue { command } => handle_queue_command(command, config).await,
    }
}

fn open_queue(config: &Config) -> Result<Arc<PersistenceQueue>> {
    let queue = PersistenceQueue::open_dir(&config.storage.queue_dir, config.queue_config())
        .context(format!("Failed to open queue in {}", config.storage.queue_dir.display()))?;
    Ok(Arc::new(queue))
}

fn open_sink(config: &Config) -> Result<Arc<dyn RemoteSave>> {
    let sink = HttpRemoteSave::new(config.sink_config()).context("Failed to create remote client")?;
    Ok(Arc::new(sink))
}

fn read_names(path: &Path) -> Result<Vec<Item>> {
    let content = fs::read_to_string(path).context(format!("Failed to read names from {}", path.display()))?;
    let items: Vec<Item> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Item::named)
        .collect();

    if items.len() < 2 {
        return Err(eyre!("Need at least two names in {}, found {}", path.display(), items.len()));
    }
    Ok(items)
}

/// One line of user input during a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoteInput {
    Pick(Preference),
    Defer,
    Undo,
    Quit,
}

fn parse_vote_input(line: &str) -> Option<VoteInput> {
    match line.trim().to_lowercase().as_str() {
        "1" => Some(VoteInput::Pick(Preference::Left)),
        "2" => Some(VoteInput::Pick(Preference::Right)),
        "b" => Some(VoteInput::Pick(Preference::Both)),
        "n" => Some(VoteInput::Pick(Preference::Neither)),
        "s" => Some(VoteInput::Defer),
        "u" => Some(VoteInput::Undo),
        "q" => Some(VoteInput::Quit),
        _ => None,
    }
}

fn spawn_notice_printer(mut notices: broadcast::Receiver<QueueNotice>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(QueueNotice::Drained { processed, remaining }) => {
                    println!(
                        "{} sent {} queued save(s), {} still pending",
                        "Synced:".green(),
                        processed,
                        remaining
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::debug!("Notice printer skipped {} notices", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

async fn handle_vote_command(names: &Path, user: &str, offline: bool, config: &Config) -> Result<()> {
    let items = read_names(names)?;
    info!("Starting vote for user {} over {} names", user, items.len());

    let queue = open_queue(config)?;
    if !queue.is_empty() {
        println!("{} {} save(s) pending from an earlier session", "Queue:".yellow(), queue.len());
    }

    // Without a probe URL the session trusts the --offline flag
    let probe = match config.probe_config()? {
        Some(probe_config) if !offline => Some(HttpProbe::new(probe_config).context("Failed to create probe")?),
        _ => None,
    };
    let signal = ConnectivitySignal::new(!offline && probe.is_none());
    let probe_handle = probe.map(|probe| probe.spawn(signal.clone()));

    let drainer = Arc::new(QueueDrainer::new(queue.clone(), open_sink(config)?));
    let printer = spawn_notice_printer(drainer.subscribe());
    let drain_handle = {
        let drainer = drainer.clone();
        let online = signal.subscribe();
        tokio::spawn(async move { drainer.run(online).await })
    };

    let mut scheduler = MatchScheduler::new(items.clone()).context("Failed to build tournament")?;
    let recorder = RatingRecorder::new(user, &items, config.elo(), queue.clone());
    let recorder_handle = tokio::spawn(recorder.run(scheduler.subscribe()));

    println!(
        "{} {} pairs. 1/2 pick a side, b both, n neither, s skip, u undo, q quit",
        "Vote:".cyan(),
        scheduler.pairs().len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let (pair, revisiting) = match scheduler.next_match() {
            Some(pair) => (pair, false),
            None => match scheduler.next_deferred() {
                Some(pair) => (pair, true),
                None => break,
            },
        };

        print_prompt(&scheduler, &pair, revisiting);
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        match parse_vote_input(&line) {
            Some(VoteInput::Pick(preference)) => {
                if let Err(e) = scheduler.add_preference(&pair.left.id, &pair.right.id, preference) {
                    println!("{} {}", "Error:".red(), e);
                }
            }
            Some(VoteInput::Defer) if revisiting => {
                println!("{}", "Skipped pairs must be decided now".yellow());
            }
            Some(VoteInput::Defer) => {
                scheduler.defer_current();
            }
            Some(VoteInput::Undo) => match scheduler.undo_last_preference() {
                Some(undone) => println!("{} {}", "Undone:".yellow(), undone),
                None => println!("{}", "Nothing to undo".yellow()),
            },
            Some(VoteInput::Quit) => break,
            None => println!("{} {:?}", "Unknown input:".red(), line.trim()),
        }
    }

    let progress = scheduler.progress();
    drop(scheduler);
    let table = recorder_handle.await.context("Rating recorder failed")?;
    print_ranking(&table, &items);
    if progress.remaining() > 0 {
        println!("{} {} pair(s) left undecided", "Note:".yellow(), progress.remaining());
    }

    if let Some(handle) = probe_handle {
        handle.abort();
    }
    if signal.is_online() {
        report_drain(&drainer.drain_now().await);
    }

    // Closing the signal ends the drainer, which closes the notice channel
    drop(signal);
    drain_handle.await.context("Queue drainer failed")?;
    drop(drainer);
    printer.await.context("Notice printer failed")?;

    queue.flush().context("Failed to write queue")?;
    if !queue.is_empty() {
        println!(
            "{} {} save(s) still queued; run `tourney queue drain` when back online",
            "Queue:".yellow(),
            queue.len()
        );
    }
    Ok(())
}

fn print_prompt(scheduler: &MatchScheduler, pair: &Pair, revisiting: bool) {
    let progress = scheduler.progress();
    let tag = if revisiting { " (skipped earlier)" } else { "" };
    println!(
        "[{}/{}]{} 1) {}  vs  2) {}",
        progress.resolved + 1,
        progress.total,
        tag.dimmed(),
        pair.left.label.bold(),
        pair.right.label.bold()
    );
}

fn print_ranking(table: &RatingTable, items: &[Item]) {
    println!("{}", "Ranking:".green().bold());
    for (position, (id, rating)) in table.ranked().into_iter().enumerate() {
        let label = items
            .iter()
            .find(|item| &item.id == id)
            .map(|item| item.label.as_str())
            .unwrap_or(id.as_str());
        println!(
            "  {:>2}. {:<24} {:>7.1}  ({}W {}L)",
            position + 1,
            label,
            rating.value,
            rating.wins,
            rating.losses
        );
    }
}

fn report_drain(outcome: &DrainOutcome) {
    match outcome {
        DrainOutcome::AlreadyRunning => println!("{}", "A drain is already in progress".yellow()),
        DrainOutcome::Completed(report) => {
            println!("{} delivered {} save(s)", "Drain:".cyan(), report.processed);
            if let Some(id) = &report.halted_on {
                println!(
                    "{} halted on {}: {}",
                    "Drain:".red(),
                    id,
                    report.error.as_deref().unwrap_or("unknown error")
                );
            }
            if let Some(id) = &report.dead_lettered {
                println!("{} moved {} to dead letters", "Drain:".red(), id);
            }
        }
    }
}

async fn handle_queue_command(command: &QueueCommands, config: &Config) -> Result<()> {
    info!("Handling queue command: {:?}", command);
    let queue = open_queue(config)?;

    match command {
        QueueCommands::Status => {
            let pending = queue.get_queue();
            println!("{} {} pending", "Queue:".cyan(), pending.len());
            for item in &pending {
                println!(
                    "  {}  {}  attempts={}  enqueued={}",
                    item.id,
                    item.kind(),
                    item.attempts,
                    item.enqueued_at.to_rfc3339()
                );
            }
            let dead = queue.dead_letters();
            if !dead.is_empty() {
                println!("{} {} dead-lettered", "Queue:".red(), dead.len());
                for item in &dead {
                    println!("  {}  {}  attempts={}", item.id, item.kind(), item.attempts);
                }
            }
        }
        QueueCommands::Drain => {
            let sink = open_sink(config)?;
            let outcome = queue.drain(sink.as_ref()).await;
            report_drain(&outcome);
            println!("{} {} pending", "Queue:".cyan(), queue.len());
        }
        QueueCommands::RequeueDead => {
            let moved = queue.requeue_dead_letters().context("Failed to requeue dead letters")?;
            println!("{} moved {} save(s) back to the queue", "Queue:".green(), moved);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let level = if cli.is_verbose() {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };
    setup_logging(level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
