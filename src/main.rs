//! sgf-go: inspect, normalize and replay SGF game records.
//!
//! ## Usage
//!
//! - `sgf-go info game.sgf` - Summary of the game
//! - `sgf-go normalize game.sgf [-o out.sgf] [--keep-original]` - Rewrite as canonical SGF
//! - `sgf-go board game.sgf [--move N]` - Print the position after a mainline move
//! - `sgf-go position game.sgf --move N` - SGF of the position plus the remaining moves
//! - `sgf-go lanes game.sgf` - Show the lane assigned to every variation
//! - `sgf-go compare a.sgf b.sgf` - Check whether two files hold the same game
//!
//! Logging goes to stderr and is controlled by `SGF_LOG` (default `warn`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sgf_go::board::Board;
use sgf_go::coord::display_label;
use sgf_go::{Game, NodeId, compare, sgf};

/// Inspect, normalize and replay SGF game records
#[derive(Parser)]
#[command(name = "sgf-go")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless SGF_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print game properties, counts and timing statistics
    Info { file: PathBuf },
    /// Parse and write the game back as canonical SGF
    Normalize {
        file: PathBuf,
        /// Destination; defaults to rewriting the input file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Copy an existing destination to <file>.orig.<millis> first
        #[arg(long)]
        keep_original: bool,
    },
    /// Print the board after a mainline move
    Board {
        file: PathBuf,
        /// Move number; defaults to the last move
        #[arg(short, long = "move")]
        move_no: Option<u32>,
    },
    /// Print SGF for the position at a mainline move and the moves after it
    Position {
        file: PathBuf,
        #[arg(short, long = "move")]
        move_no: u32,
    },
    /// List every variation with its lane
    Lanes { file: PathBuf },
    /// Compare two files byte for byte and as games
    Compare { a: PathBuf, b: PathBuf },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SGF_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { file } => info(&load(&file)?),
        Commands::Normalize {
            file,
            output,
            keep_original,
        } => {
            let game = load(&file)?;
            let dest = output.unwrap_or(file);
            if keep_original {
                if let Some(backup) = sgf::write_to_path_with_backup(&game, &dest)
                    .with_context(|| format!("writing {}", dest.display()))?
                {
                    eprintln!("kept original as {}", backup.display());
                }
            } else {
                sgf::write_to_path(&game, &dest)
                    .with_context(|| format!("writing {}", dest.display()))?;
            }
            Ok(())
        }
        Commands::Board { file, move_no } => {
            let game = load(&file)?;
            let target = match move_no {
                Some(n) => mainline_move(&game, n)?,
                None => game.last_move().unwrap_or(game.root()),
            };
            let mut board = Board::new();
            board.fast_forward_to(&game, target)?;
            print!("{board}");
            Ok(())
        }
        Commands::Position { file, move_no } => {
            let game = load(&file)?;
            let target = mainline_move(&game, move_no)?;
            let mut board = Board::new();
            board.fast_forward_to(&game, target)?;
            println!("{}", game.position_sgf(target, &board));
            Ok(())
        }
        Commands::Lanes { file } => {
            lanes(&load(&file)?);
            Ok(())
        }
        Commands::Compare { a, b } => {
            let identical = compare::binary_compare(&a, &b)?;
            let same = identical || compare::compare_sgf(&a, &b)?;
            println!("identical bytes: {identical}");
            println!("same game: {same}");
            Ok(())
        }
    }
}

fn load(path: &Path) -> Result<Game> {
    sgf::from_path(path).with_context(|| format!("loading {}", path.display()))
}

fn mainline_move(game: &Game, move_no: u32) -> Result<NodeId> {
    match game
        .mainline()
        .find(|&id| game.node(id).move_no() == Some(move_no))
    {
        Some(id) => Ok(id),
        None => bail!(
            "move {move_no} is not on the mainline ({} moves)",
            game.move_count()
        ),
    }
}

fn info(game: &Game) -> Result<()> {
    for (key, values) in game.properties().iter() {
        println!("{key}: {}", values.join(", "));
    }
    println!("moves: {}", game.move_count());
    println!("nodes: {}", game.node_count());
    if let Some(last) = game.last_move() {
        let node = game.node(last);
        let point = match node.coords()? {
            Some((x, y)) => display_label(x, y),
            None => "pass".to_string(),
        };
        println!("last move: {} {point}", node.move_no().unwrap_or(0));
    }
    if game.timing_info_found() {
        for (color, t) in [("black", game.black_timings()), ("white", game.white_timings())] {
            println!(
                "{color} time per move: min {}s max {}s avg {}s median {}s",
                t.min, t.max, t.average, t.median
            );
        }
    }
    Ok(())
}

fn lanes(game: &Game) {
    for id in game.preorder() {
        let node = game.node(id);
        let starts_line = node.parent().is_some() && node.prev().is_none();
        if !starts_line {
            continue;
        }
        let length = game.line_from(id).count();
        println!(
            "variation at move {} ({} nodes): lane {}",
            node.line_move_no(),
            length,
            node.lane()
        );
    }
}
