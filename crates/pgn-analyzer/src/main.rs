//! PGN analyzer
//!
//! Imports a PGN game, replays it through a game session and prints every ply
//! with the engine's evaluation when an engine is available.

use anyhow::Context;
use tracing::info;

use analysis_bridge::{AnalysisBridge, BridgeConfig};
use chess_core::{Color, GameSession};

const USAGE: &str = "usage: pgn-analyzer <file.pgn> [--depth N] [--no-engine]";

#[derive(Debug, PartialEq, Eq)]
struct Args {
    path: String,
    depth: Option<u32>,
    engine: bool,
}

/// Parse `<file.pgn> [--depth N] [--no-engine]` from CLI args
fn parse_args(args: &[String]) -> Option<Args> {
    let mut path = None;
    let mut depth = None;
    let mut engine = true;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--depth" => {
                depth = Some(args.get(i + 1)?.parse().ok()?);
                i += 1;
            }
            "--no-engine" => engine = false,
            arg if arg.starts_with("--") => return None,
            arg => {
                if path.replace(arg.to_string()).is_some() {
                    return None;
                }
            }
        }
        i += 1;
    }

    Some(Args {
        path: path?,
        depth,
        engine,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let Some(args) = parse_args(&argv) else {
        anyhow::bail!(USAGE);
    };

    let text = std::fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read {}", args.path))?;
    let mut session = GameSession::from_pgn(&text)
        .with_context(|| format!("failed to import {}", args.path))?;
    info!(path = %args.path, plies = session.notations().len(), "game imported");

    if args.engine {
        let mut config = BridgeConfig::from_env();
        if let Some(depth) = args.depth {
            config.depth = depth;
        }
        if let Some(bridge) = AnalysisBridge::try_spawn(&config).await {
            session.attach_analysis(bridge);
        }
    }

    let meta = session.metadata();
    println!("{} vs {} ({}, {})", meta.white, meta.black, meta.event, meta.date);
    println!("{}", "=".repeat(60));

    for (ply, san) in session.notations().iter().enumerate() {
        let before = &session.history()[ply];
        let after = &session.history()[ply + 1];
        let number = match before.side_to_move() {
            Color::White => format!("{}.", before.fullmove_number()),
            Color::Black => format!("{}...", before.fullmove_number()),
        };

        match session.analysis() {
            Some(bridge) => {
                let state = bridge.evaluate(&after.to_fen()).await?;
                let best = state.best_move.as_deref().unwrap_or("-");
                println!("{number:<6} {san:<8} {:>7}  best {best}", state.display());
            }
            None => println!("{number:<6} {san}"),
        }
    }

    println!("{}", "=".repeat(60));
    match session.tip().result().describe(session.tip().side_to_move()) {
        Some(description) => println!("{description}"),
        None => println!("Result: {}", session.metadata().result),
    }

    if let Some(bridge) = session.detach_analysis() {
        bridge.shutdown().await;
    }
    Ok(())
}
