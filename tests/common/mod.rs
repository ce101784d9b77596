#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use analysis_bridge::{AnalysisBridge, BridgeConfig};
use chess_core::{GameSession, Square};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

/// Commands the fake engine has received, in order.
pub type Received = Arc<Mutex<Vec<String>>>;

/// A scripted UCI engine on the far end of an in-memory pipe.
#[derive(Default, Clone)]
pub struct FakeEngine {
    /// Lines sent in answer to `go`, keyed by the FEN of the position.
    pub responses: HashMap<String, Vec<String>>,
    /// Positions whose final `bestmove` is withheld until `stop`.
    pub hold: HashSet<String>,
    /// Extra lines emitted on `stop`, before the withheld `bestmove`.
    pub on_stop: Vec<String>,
    /// Position on which the engine hangs up instead of searching.
    pub crash_on: Option<String>,
}

impl FakeEngine {
    pub fn respond(mut self, fen: &str, lines: &[&str]) -> Self {
        self.responses
            .insert(fen.to_string(), lines.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn hold(mut self, fen: &str) -> Self {
        self.hold.insert(fen.to_string());
        self
    }
}

pub fn config() -> BridgeConfig {
    BridgeConfig {
        depth: 10,
        ..BridgeConfig::default()
    }
}

/// Run `engine` over a duplex pipe and complete the bridge handshake.
pub async fn connect(engine: FakeEngine, config: &BridgeConfig) -> (AnalysisBridge, Received) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (read, write) = tokio::io::split(client);
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    tokio::spawn(run(server, engine, received.clone()));
    let bridge = AnalysisBridge::connect(read, write, config)
        .await
        .expect("handshake with fake engine");
    (bridge, received)
}

async fn run(stream: DuplexStream, engine: FakeEngine, received: Received) {
    let (read, mut write) = tokio::io::split(stream);
    let mut lines = BufReader::new(read).lines();
    let mut position = String::new();
    let mut withheld: Option<String> = None;

    while let Ok(Some(line)) = lines.next_line().await {
        received.lock().unwrap().push(line.clone());
        let mut out: Vec<String> = Vec::new();
        match line.as_str() {
            "uci" => {
                out.push("id name FakeFish".to_string());
                out.push("uciok".to_string());
            }
            "isready" => out.push("readyok".to_string()),
            "stop" => {
                if let Some(best) = withheld.take() {
                    out.extend(engine.on_stop.iter().cloned());
                    out.push(best);
                }
            }
            "quit" => return,
            cmd if cmd.starts_with("position fen ") => {
                position = cmd["position fen ".len()..].to_string();
            }
            cmd if cmd.starts_with("go") => {
                if engine.crash_on.as_deref() == Some(position.as_str()) {
                    return;
                }
                let mut script = engine.responses.get(&position).cloned().unwrap_or_else(|| {
                    vec![
                        "info depth 1 score cp 0 pv a2a3".to_string(),
                        "bestmove a2a3".to_string(),
                    ]
                });
                if engine.hold.contains(&position) {
                    withheld = script.pop();
                }
                out.extend(script);
            }
            _ => {}
        }
        for l in out {
            if write.write_all(format!("{l}\n").as_bytes()).await.is_err() {
                return;
            }
        }
        let _ = write.flush().await;
    }
}

pub fn sq(s: &str) -> Square {
    Square::parse(s).unwrap()
}

/// Play a sequence of from/to pairs through `select`, panicking on any rejection.
pub fn play(session: &mut GameSession, moves: &[(&str, &str)]) {
    for (from, to) in moves {
        session.select(sq(from), None);
        let outcome = session.select(sq(to), None);
        assert!(
            matches!(outcome, chess_core::SelectOutcome::Moved { .. }),
            "{from}{to}: {outcome:?}"
        );
    }
}
