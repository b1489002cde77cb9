//! Serpent Arena headless runner
//!
//! Plays one match at 60 Hz with the player steering in a slow circle and
//! logs the outcome.
//!
//! Usage: `serpent-arena [tuning.json] [seed]`

use std::process::ExitCode;

use serpent_arena::{Session, TickInput, Tuning};

const FRAME_DT: f32 = 1.0 / 60.0;
const MAX_SECONDS: u32 = 180;
const REPORT_EVERY: u32 = 30;

fn load_tuning(path: Option<&str>) -> Result<Tuning, String> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
            Tuning::from_json(&json).map_err(|e| format!("{}: {}", path, e))
        }
        None => Ok(Tuning::default()),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let tuning = match load_tuning(args.first().map(String::as_str)) {
        Ok(tuning) => tuning,
        Err(e) => {
            log::error!("Could not load tuning: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let seed = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(12345);

    let mut session = match Session::new(tuning, seed, "Player") {
        Ok(session) => session,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let frames_per_second = (1.0 / FRAME_DT).round() as u32;
    let mut heading = 0.0f32;
    'run: for second in 1..=MAX_SECONDS {
        for _ in 0..frames_per_second {
            heading += 0.6 * FRAME_DT;
            let input = TickInput {
                heading: Some(heading),
                ..TickInput::default()
            };
            session.step(FRAME_DT, &input);
            if session.world().is_game_over() {
                break 'run;
            }
        }
        if second % REPORT_EVERY == 0 {
            let world = session.world();
            log::info!(
                "t={:.0}s alive={} consumables={}",
                world.clock(),
                world.alive_count(),
                world.consumables().len()
            );
        }
    }

    let world = session.world();
    match (world.is_game_over(), world.winner()) {
        (true, Some(id)) => {
            let name = world.agent(id).map(|a| a.name.as_str()).unwrap_or("?");
            log::info!("Winner: {} ({}) after {:.1}s", name, id, world.clock());
        }
        (true, None) => log::info!("No survivors after {:.1}s", world.clock()),
        (false, _) => log::info!("Time limit reached with {} alive", world.alive_count()),
    }

    let board = session.leaderboard();
    for (rank, entry) in board.entries.iter().enumerate() {
        log::info!(
            "{:>2}. {:<8} len={:<4} score={}{}",
            rank + 1,
            entry.name,
            entry.length,
            entry.score,
            if entry.is_player { "  <- you" } else { "" }
        );
    }
    if let Some(player) = session.player() {
        if board.rank_of(player).is_none() {
            log::info!("Player outside the top {}", board.entries.len());
        }
    }

    ExitCode::SUCCESS
}
