//! Roboyard CLI
//!
//! Terminal front end: plays sessions on stdin, checks board files and
//! prints completion statistics.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use roboyard_core::{
    parse_board, Color, Config, DifficultyTier, Direction, FileSessionStore, LevelDirectory,
    RandomBoardGenerator, SessionController, SessionPhase,
};
use roboyard_solver::{CancelFlag, IterativeDeepeningSolver, Solve, WorkerSolverPort};
use roboyard_stats::{CompletionStore, MarkdownSummary};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Roboyard - sliding robot puzzles
///
/// Robots slide until they hit a wall, another robot or the edge of the
/// board. Bring each robot onto its target in as few moves as you can.
#[derive(Parser, Debug)]
#[command(name = "roboyard")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: roboyard.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a game in the terminal
    Play {
        /// Difficulty tier for a random game: 1-4 or beginner, advanced, insane, impossible
        #[arg(short, long, value_name = "N")]
        tier: Option<String>,

        /// Play a level from the level directory
        #[arg(short, long, value_name = "ID", conflicts_with = "load")]
        level: Option<u32>,

        /// Resume a saved game
        #[arg(long, value_name = "SLOT")]
        load: Option<u32>,

        /// Seed for the board generator
        #[arg(long, value_name = "N")]
        seed: Option<u64>,
    },

    /// Parse a board file and print its optimal solution
    Check {
        /// Board file in Roboyard notation
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print completion statistics
    Stats,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    let result = match args.command {
        Command::Play {
            tier,
            level,
            load,
            seed,
        } => {
            run_play(
                args.config.as_deref(),
                PlayOptions {
                    tier,
                    level,
                    load,
                    seed,
                },
            )
            .await
        }
        Command::Check { file } => run_check(args.config.as_deref(), &file),
        Command::Stats => run_stats(args.config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads configuration from the specified path or the default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

// ============================================================================
// play
// ============================================================================

#[derive(Debug)]
struct PlayOptions {
    tier: Option<String>,
    level: Option<u32>,
    load: Option<u32>,
    seed: Option<u64>,
}

/// One line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayCommand {
    Move(Color, Direction),
    Undo,
    Hint,
    Reset,
    Save(u32),
    Show,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<PlayCommand, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["undo" | "u"] => Ok(PlayCommand::Undo),
        ["hint" | "h"] => Ok(PlayCommand::Hint),
        ["reset"] => Ok(PlayCommand::Reset),
        ["show"] => Ok(PlayCommand::Show),
        ["help" | "?"] => Ok(PlayCommand::Help),
        ["quit" | "q" | "exit"] => Ok(PlayCommand::Quit),
        ["save", slot] => slot
            .parse()
            .map(PlayCommand::Save)
            .map_err(|_| format!("'{slot}' is not a save slot number")),
        [robot, direction] => {
            let color =
                Color::from_name(robot).ok_or_else(|| format!("unknown robot '{robot}'"))?;
            let direction = Direction::from_name(direction)
                .ok_or_else(|| format!("unknown direction '{direction}'"))?;
            Ok(PlayCommand::Move(color, direction))
        }
        [] => Err("type a command, or 'help'".to_string()),
        _ => Err(format!("unknown command '{}'", line.trim())),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <robot> <n|e|s|w>   slide a robot, e.g. 'red e'");
    println!("  undo                take back the last move");
    println!("  hint                show the next move of the solution");
    println!("  reset               put every robot back on its starting cell");
    println!("  save <slot>         save the game");
    println!("  show                print the board");
    println!("  quit                leave");
}

async fn run_play(config_path: Option<&str>, options: PlayOptions) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let tier = match options.tier.as_deref() {
        Some(t) => DifficultyTier::from_str_case_insensitive(t).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown tier '{t}'\n\nSuggestion: Use 1-4 or beginner, advanced, insane, impossible"
            )
        })?,
        None => config.difficulty,
    };

    let generator = options
        .seed
        .map_or_else(RandomBoardGenerator::new, RandomBoardGenerator::seeded);
    let solver = WorkerSolverPort::new(IterativeDeepeningSolver::new(config.solver_max_depth));
    let stats = Arc::new(
        CompletionStore::open(&config.stats_file).map_err(|e| anyhow::anyhow!("{e}"))?,
    );

    let mut session = SessionController::new(&config, Box::new(generator), Box::new(solver))
        .with_statistics(stats.clone())
        .with_store(Box::new(FileSessionStore::new(&config.save_dir)))
        .with_levels(Box::new(LevelDirectory::new(&config.level_dir)));

    if let Some(slot) = options.load {
        session.load_saved(slot)?;
        println!("Resumed save slot {slot}");
    } else if let Some(id) = options.level {
        session.load_level(id)?;
        println!("Level {id}");
    } else {
        println!("Generating a {tier} board {}...", tier.band());
        session.new_game(tier)?;
        session.settle().await;
    }

    print_board(&session);
    print_solver_state(&session);
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        session.pump();

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        if execute(&mut session, command) == Flow::Quit {
            break;
        }
    }

    println!(
        "{} level(s) completed, {} star(s) in total.",
        stats.levels_completed(),
        stats.total_stars()
    );
    Ok(())
}

/// Whether the play loop keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Runs one player command. Errors are reported and play goes on.
fn execute(session: &mut SessionController, command: PlayCommand) -> Flow {
    match command {
        PlayCommand::Move(color, direction) => {
            let outcome = match session.try_move(color, direction) {
                Ok(outcome) => outcome,
                Err(e) => {
                    println!("{e}");
                    return Flow::Continue;
                }
            };
            if !outcome.applied {
                if session.is_complete() {
                    println!("The puzzle is solved. 'undo' to keep playing or 'quit'.");
                } else {
                    println!("The {color} robot cannot move {direction}.");
                }
                return Flow::Continue;
            }
            print_board(session);
            println!(
                "Moved {color} {direction}: {} squares ({} moves)",
                outcome.squares,
                session.metrics().move_count
            );
            if outcome.completed {
                print_completion(session);
            }
        }
        PlayCommand::Undo => {
            if session.undo() {
                print_board(session);
            } else {
                println!("Nothing to undo.");
            }
        }
        PlayCommand::Hint => match session.hint() {
            Some(mv) => println!("Hint: {mv}"),
            None if session.is_solver_running() => println!("The solver is still working."),
            None if session.solution().is_none() => println!("No hints for this board."),
            None => println!("No hints left."),
        },
        PlayCommand::Reset => {
            if session.reset_robots() {
                print_board(session);
            }
        }
        PlayCommand::Save(slot) => match session.save(slot, format!("Slot {slot}")) {
            Ok(()) => println!("Saved to slot {slot}."),
            Err(e) => println!("{e}"),
        },
        PlayCommand::Show => {
            print_board(session);
            print_solver_state(session);
        }
        PlayCommand::Help => print_help(),
        PlayCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn print_board(session: &SessionController) {
    if let Some(board) = session.board() {
        println!("{board}");
    }
}

fn print_solver_state(session: &SessionController) {
    if session.is_solver_running() {
        println!("Solver is working on this board; hints will follow.");
    } else if let Some(solution) = session.solution() {
        println!("Can be solved in {} moves.", solution.len());
    } else if session.phase() == SessionPhase::Active {
        println!("The solver gave up on this board; no hints available.");
    }
}

fn print_completion(session: &SessionController) {
    let metrics = session.metrics();
    let stars = session.current_stars().unwrap_or(0);
    println!();
    println!("=== Solved ===");
    println!("Moves: {}", metrics.move_count);
    if let Some(solution) = session.solution() {
        println!("Optimal: {}", solution.len());
    }
    println!("Hints: {}", metrics.hints_shown);
    println!("Time: {}s", metrics.elapsed().as_secs());
    println!("Stars: {stars}");
}

// ============================================================================
// check
// ============================================================================

fn run_check(config_path: Option<&str>, file: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let text = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("Failed to read '{}': {e}", file.display()))?;
    let board = parse_board(&text)?;

    println!("{board}");
    println!(
        "{}x{} board, {} robot(s), {} target(s), {} wall(s)",
        board.width(),
        board.height(),
        board.robots().len(),
        board.targets().len(),
        board.walls().count()
    );

    let solver = IterativeDeepeningSolver::new(config.solver_max_depth);
    match solver.solve(&board, &CancelFlag::new()) {
        Ok(moves) => {
            println!("Optimal solution: {} moves", moves.len());
            for (i, mv) in moves.iter().enumerate() {
                println!("  {}. {mv}", i + 1);
            }
            let tiers: Vec<_> = DifficultyTier::ALL
                .iter()
                .filter(|t| t.band().contains(moves.len()))
                .map(ToString::to_string)
                .collect();
            if !tiers.is_empty() {
                println!("Fits tier(s): {}", tiers.join(", "));
            }
        }
        Err(e) => println!("No solution: {e}"),
    }
    Ok(())
}

// ============================================================================
// stats
// ============================================================================

fn run_stats(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = CompletionStore::open(&config.stats_file)?;
    print!("{}", MarkdownSummary::new(&store.snapshot()).generate());
    Ok(())
}
