//! termquest CLI - play the terminal widgets in a real terminal
//!
//! Usage:
//!   termquest                          # Interactive simulated terminal
//!   termquest -c 'cat readme.txt'      # Run one command line and exit
//!   termquest monk                     # CyberMonk, progress saved per user
//!   termquest monk -c 'cd forest_deeper'
//!   termquest podvigh --seed 7         # Podvigh tile walk
//!   termquest podvigh --keys ddddg     # Play keys and print the screen

mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use termquest::adventure::{FileStorage, MemoryStorage, Monk, Storage};
use termquest::exploration::{Game, Key};
use termquest::{OutputEvent, Signal, SubPrompt, Terminal};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use repl::LineReader;

/// termquest - simulated terminal, text adventure and tile walk
#[derive(Parser, Debug)]
#[command(name = "termquest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run the given command line in the terminal and exit
    #[arg(short = 'c')]
    command: Option<String>,

    /// Use the short prompt (`u@s:~$`)
    #[arg(long, global = true)]
    compact: bool,

    /// Skip the welcome banner
    #[arg(long)]
    no_banner: bool,

    #[command(subcommand)]
    subcommand: Option<SubCmd>,
}

#[derive(Subcommand, Debug)]
enum SubCmd {
    /// Play CyberMonk
    Monk {
        /// Run these lines and exit
        #[arg(short = 'c')]
        commands: Vec<String>,

        /// Directory holding the save slot (default: per-user data dir)
        #[arg(long)]
        state_dir: Option<PathBuf>,

        /// Keep progress in memory only
        #[arg(long, conflicts_with = "state_dir")]
        no_save: bool,
    },
    /// Play Podvigh
    Podvigh {
        /// Seed for a reproducible walk
        #[arg(long)]
        seed: Option<u64>,

        /// Start in this zone (Forest, Ruins, Desert)
        #[arg(long)]
        zone: Option<String>,

        /// Press these keys, print the screen and exit
        #[arg(long)]
        keys: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never mix with game output (RUST_LOG=termquest=debug)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match args.subcommand {
        Some(SubCmd::Monk {
            commands,
            state_dir,
            no_save,
        }) => run_monk(commands, state_dir, no_save, args.compact),
        Some(SubCmd::Podvigh { seed, zone, keys }) => run_podvigh(seed, zone, keys),
        None => run_terminal(args.command, args.compact, !args.no_banner).await,
    }
}

async fn run_terminal(command: Option<String>, compact: bool, banner: bool) -> Result<()> {
    if let Some(cmd) = command {
        let mut term = Terminal::builder().compact_prompt(compact).banner(false).build();
        let result = term.exec(&cmd).await.context("Failed to execute command")?;
        if !result.stdout.is_empty() {
            println!("{}", result.stdout);
        }
        if !result.stderr.is_empty() {
            eprintln!("{}", result.stderr);
        }
        if let Some(Signal::Sudo(_)) = result.signal {
            eprintln!("sudo: a password is required, run interactively");
            std::process::exit(1);
        }
        std::process::exit(result.exit_code);
    }

    let mut term = Terminal::builder()
        .compact_prompt(compact)
        .banner(banner)
        .build();
    let mut reader = LineReader::new(repl::history_path("terminal"))?;

    loop {
        term.tick();
        print_events(term.take_events());

        let masked = term.pending_prompt() == Some(SubPrompt::Password);
        let prompt = if masked {
            String::new()
        } else {
            format!("{} ", term.prompt())
        };
        let Some(line) = reader.read(&prompt, !masked)? else {
            break;
        };
        if !masked && matches!(line.trim(), "exit" | "logout") {
            break;
        }
        term.submit(&line).await;
    }

    reader.save();
    Ok(())
}

fn run_monk(
    commands: Vec<String>,
    state_dir: Option<PathBuf>,
    no_save: bool,
    compact: bool,
) -> Result<()> {
    let storage: Arc<dyn Storage> = if no_save {
        Arc::new(MemoryStorage::new())
    } else {
        let dir = state_dir
            .or_else(repl::data_dir)
            .context("No data directory available, pass --state-dir or --no-save")?;
        let storage = FileStorage::new(dir);
        tracing::debug!(dir = %storage.dir().display(), "cybermonk save directory");
        Arc::new(storage)
    };
    let mut monk = Monk::with_storage(storage).compact_prompt(compact);

    if !commands.is_empty() {
        monk.take_events();
        for line in &commands {
            monk.submit(line);
        }
        print_events(monk.take_events());
        return Ok(());
    }

    let mut reader = LineReader::new(repl::history_path("monk"))?;
    loop {
        print_events(monk.take_events());
        let Some(line) = reader.read(&format!("{} ", monk.prompt()), true)? else {
            break;
        };
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        monk.submit(&line);

        let status = monk.status();
        tracing::trace!(
            location = %status.location,
            image = status.image,
            unlocked = %status.unlocked_summary(),
            "cybermonk status"
        );
    }

    reader.save();
    Ok(())
}

fn run_podvigh(seed: Option<u64>, zone: Option<String>, keys: Option<String>) -> Result<()> {
    let mut builder = Game::builder();
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    if let Some(zone) = zone {
        builder = builder.zone(zone);
    }
    let mut game = builder.build().context("Failed to start Podvigh")?;

    if let Some(keys) = keys {
        press_all(&mut game, &keys);
        print_screen(&game);
        return Ok(());
    }

    let mut reader = LineReader::new(None)?;
    println!("Goal: Find the Sanctuary by growing your Faith. Explore and survive!");
    println!("Controls: Move (WASD) | Interact (G) | Ignore (E) | Restart (R), then Enter");
    loop {
        game.tick();
        print_screen(&game);
        let Some(line) = reader.read("> ", false)? else {
            break;
        };
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        press_all(&mut game, &line);
    }
    Ok(())
}

fn press_all(game: &mut Game, keys: &str) {
    for c in keys.chars().filter(|c| !c.is_whitespace()) {
        game.press(Key::from_char(c));
    }
}

fn print_screen(game: &Game) {
    for row in game.render() {
        println!("{row}");
    }
    println!("{}   Zone: {}", game.status_line(), game.zone_name());
    for line in game.message_box() {
        println!("{line}");
    }
}

fn print_events(events: Vec<OutputEvent>) {
    for event in events {
        match event {
            OutputEvent::Line(line) => println!("{line}"),
            OutputEvent::Clear => print!("\x1b[2J\x1b[H"),
        }
    }
}
