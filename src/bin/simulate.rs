//! Headless batch simulator
//!
//! Plays many seeded episodes in parallel without a timer and reports how often
//! the board gets filled, how often the snake crashes, and whether any committed
//! body ever broke an invariant.
//!
//! Usage: simulate [--games N] [--grid N] [--seed N] [--max-ticks N] [--config path]

use std::env;
use std::process;
use std::str::FromStr;

use hamiltonian_snake::config::{validate_grid_size, Config};
use hamiltonian_snake::simulation::run_batch;

fn print_usage() {
    eprintln!("Snake Batch Simulator");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  simulate [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --games <N>             Number of episodes (default: 100)");
    eprintln!("  --grid <N>              Even grid size (default: from config)");
    eprintln!("  --seed <N>              First seed; episode i uses seed + i (default: 0)");
    eprintln!("  --max-ticks <N>         Tick cap per episode (default: 50 * grid^2)");
    eprintln!("  --config <path>         Path to Snake.toml (default: Snake.toml)");
    eprintln!("  --help                  Show this help message");
}

fn parse_value<T: FromStr>(flag: &str, value: Option<&String>) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    let value = value.ok_or_else(|| format!("{} requires an argument", flag))?;
    value
        .parse::<T>()
        .map_err(|e| format!("Invalid value '{}' for {}: {}", value, flag, e))
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(0);
    }

    let mut games: usize = 100;
    let mut grid: Option<i32> = None;
    let mut seed: u64 = 0;
    let mut max_ticks: Option<u64> = None;
    let mut config_path = "Snake.toml".to_string();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        let parsed = match args[i].as_str() {
            "--games" => parse_value(&args[i], value).map(|v| games = v),
            "--grid" => parse_value(&args[i], value).map(|v| grid = Some(v)),
            "--seed" => parse_value(&args[i], value).map(|v| seed = v),
            "--max-ticks" => parse_value(&args[i], value).map(|v| max_ticks = Some(v)),
            "--config" => value
                .cloned()
                .ok_or_else(|| "--config requires an argument".to_string())
                .map(|v| config_path = v),
            other => Err(format!("Unknown option '{}'", other)),
        };

        if let Err(e) = parsed {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
        i += 2;
    }

    let config = Config::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });

    let grid = grid.unwrap_or(config.game.grid_size);
    if let Err(e) = validate_grid_size(grid, config.game.max_grid_size) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    let max_ticks = max_ticks.unwrap_or(50 * (grid as u64) * (grid as u64));

    println!("\n═══════════════════════════════════════════════════════════");
    println!("                 BATCH SIMULATION");
    println!("═══════════════════════════════════════════════════════════");
    println!("Grid:           {}x{}", grid, grid);
    println!("Episodes:       {}", games);
    println!("Seeds:          {}..{}", seed, seed + games as u64);
    println!("Tick cap:       {}", max_ticks);
    println!("═══════════════════════════════════════════════════════════\n");

    let (results, summary) = run_batch(&config, grid, games, seed, max_ticks);

    for result in results.iter().filter(|r| r.outcome.map_or(false, |o| o.is_crash())) {
        println!(
            "  seed {:>6}: {:?} after {} ticks (length {})",
            result.seed, result.outcome, result.ticks, result.final_length
        );
    }

    let pct = |count: usize| {
        if summary.episodes == 0 {
            0.0
        } else {
            count as f64 * 100.0 / summary.episodes as f64
        }
    };

    println!("\n═══════════════════════════════════════════════════════════");
    println!("Boards filled:  {} ({:.1}%)", summary.boards_filled, pct(summary.boards_filled));
    println!("Crashes:        {} ({:.1}%)", summary.crashes, pct(summary.crashes));
    println!("Capped:         {} ({:.1}%)", summary.capped, pct(summary.capped));
    println!("Average score:  {:.1}", summary.average_score);
    println!("Average ticks:  {:.1}", summary.average_ticks);
    println!("Violations:     {}", summary.invariant_violations);
    println!("═══════════════════════════════════════════════════════════\n");

    if summary.invariant_violations > 0 {
        process::exit(1);
    }
}
