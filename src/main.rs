//! Interactive match runner for the bundled games.
//!
//! Defaults to human as player 1 against the engine. `--player1 ai
//! --player2 ai` gives an engine-vs-engine exhibition match.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use rand::RngCore;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use mcts::games::connect4::Connect4;
use mcts::games::tictactoe::TicTacToe;
use mcts::{mcts, Arena, GameState, Outcome, SearchConfig};

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum GameChoice {
    Tictactoe,
    Connect4,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Seat {
    Human,
    Ai,
}

#[derive(Parser, Debug)]
#[command(name = "play", version, about = "Play the bundled games against the engine")]
struct Args {
    /// Game to play
    #[arg(value_enum, default_value_t = GameChoice::Tictactoe)]
    game: GameChoice,

    /// Who controls player 1 (X)
    #[arg(long, value_enum, default_value_t = Seat::Human)]
    player1: Seat,

    /// Who controls player 2 (O)
    #[arg(long, value_enum, default_value_t = Seat::Ai)]
    player2: Seat,

    /// Search iterations per engine move
    #[arg(long, default_value_t = 1400)]
    iterations: u32,

    /// Random playouts per unresolved leaf
    #[arg(long, default_value_t = 31)]
    playouts: u32,

    /// Ply budget for the minimax probe at each leaf
    #[arg(long, default_value_t = 3)]
    minimax_depth: u32,

    /// UCB1 exploration constant
    #[arg(long, default_value_t = 1.2)]
    exploration: f32,

    /// Capacity of the search node pool
    #[arg(long, default_value_t = 100_000)]
    nodes: usize,

    /// RNG seed for reproducible engine play (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    let args = Args::parse();
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.start())
        .expect("failed to initialize logging");

    match args.game {
        GameChoice::Tictactoe => run_match(TicTacToe::new(), &args),
        GameChoice::Connect4 => run_match(Connect4::new(), &args),
    }
}

fn run_match<G>(mut board: G, args: &Args)
where
    G: GameState + Display,
    G::Move: Display + FromStr,
    <G::Move as FromStr>::Err: Display,
{
    let config = SearchConfig {
        max_iterations: args.iterations,
        max_playouts: args.playouts,
        minimax_depth: args.minimax_depth,
        exploration: args.exploration,
    };
    let mut arena = Arena::new(args.nodes);
    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("engine seed {seed}");
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut roll = move || rng.next_u64();

    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        println!("\n{board}");
        let mover = board.current_player();
        let seat = if mover == 1 { args.player1 } else { args.player2 };
        let mv = match seat {
            Seat::Human => match read_move(&board, &mut input) {
                Some(mv) => mv,
                None => return,
            },
            Seat::Ai => {
                let res = mcts(&board, &mut arena, &config, &mut roll);
                if res.errors.chunk_overflow > 0 {
                    log::warn!(
                        "node pool ran dry after {} iterations; consider --nodes",
                        res.iterations
                    );
                }
                match res.best {
                    Some(mv) => {
                        println!("{} plays {mv}", seat_name(mover).bold());
                        mv
                    }
                    None => {
                        println!("{}", "no legal moves left".yellow());
                        return;
                    }
                }
            }
        };
        match board.apply_move(mv) {
            Outcome::Running => board.switch_player(),
            Outcome::Fin => {
                println!("\n{board}");
                println!("{} wins!", seat_name(mover).green().bold());
                return;
            }
            Outcome::Draw => {
                println!("\n{board}");
                println!("{}", "Draw.".yellow().bold());
                return;
            }
            Outcome::Invalid => {
                println!("{}", "that move is not playable".red());
            }
        }
    }
}

/// Prompts until the user enters a legal move. Returns `None` on EOF.
fn read_move<G>(board: &G, input: &mut impl BufRead) -> Option<G::Move>
where
    G: GameState,
    G::Move: FromStr,
    <G::Move as FromStr>::Err: Display,
{
    let mut legal = vec![G::Move::default(); G::MAX_MOVES];
    let n = board.generate_moves(&mut legal);
    loop {
        print!("{} ", "your move:".cyan());
        io::stdout().flush().ok();
        let mut line = String::new();
        if input.read_line(&mut line).ok()? == 0 {
            return None;
        }
        match line.trim().parse::<G::Move>() {
            Ok(mv) if legal[..n].contains(&mv) => return Some(mv),
            Ok(_) => println!("{}", "that move is not available".red()),
            Err(err) => println!("{}", err.to_string().red()),
        }
    }
}

fn seat_name(player: u8) -> &'static str {
    if player == 1 {
        "player 1 (X)"
    } else {
        "player 2 (O)"
    }
}
