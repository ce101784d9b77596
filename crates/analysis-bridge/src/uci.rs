//! UCI protocol: outbound commands and inbound line parsing.
//!
//! Inbound lines are parsed by token position, the way engines emit them;
//! anything unrecognized is kept as `Other` and ignored by the bridge.

use std::fmt;

/// Commands sent to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    SetOption { name: String, value: String },
    Position { fen: String },
    GoDepth(u32),
    Stop,
    Quit,
}

impl UciCommand {
    pub fn set_option(name: &str, value: impl fmt::Display) -> Self {
        UciCommand::SetOption {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciCommand::Uci => f.write_str("uci"),
            UciCommand::IsReady => f.write_str("isready"),
            UciCommand::UciNewGame => f.write_str("ucinewgame"),
            UciCommand::SetOption { name, value } => {
                write!(f, "setoption name {name} value {value}")
            }
            UciCommand::Position { fen } => write!(f, "position fen {fen}"),
            UciCommand::GoDepth(depth) => write!(f, "go depth {depth}"),
            UciCommand::Stop => f.write_str("stop"),
            UciCommand::Quit => f.write_str("quit"),
        }
    }
}

/// Engine score, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Mate in N moves; negative when the side to move is being mated.
    Mate(i32),
}

/// The fields of an `info` line the bridge uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    /// 1-based line index.
    pub multipv: u32,
    pub score: Option<Score>,
    pub pv: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    UciOk,
    ReadyOk,
    Info(InfoLine),
    /// `best` is `None` for `bestmove (none)`, sent when there is no legal move.
    BestMove {
        best: Option<String>,
        ponder: Option<String>,
    },
    Other,
}

impl InfoLine {
    /// Walk the tokens after `info`. The `pv` field runs to the end of the
    /// line, or up to a `bmc` or `string` field.
    fn parse<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Self {
        let mut info = InfoLine {
            depth: None,
            multipv: 1,
            score: None,
            pv: Vec::new(),
        };
        while let Some(token) = tokens.next() {
            match token {
                "depth" => info.depth = tokens.next().and_then(|t| t.parse().ok()),
                "multipv" => {
                    info.multipv = tokens.next().and_then(|t| t.parse().ok()).unwrap_or(1);
                }
                "score" => {
                    let unit = tokens.next();
                    let value = tokens.next().and_then(|t| t.parse().ok());
                    info.score = match (unit, value) {
                        (Some("cp"), Some(cp)) => Some(Score::Centipawns(cp)),
                        (Some("mate"), Some(moves)) => Some(Score::Mate(moves)),
                        _ => None,
                    };
                }
                "pv" => {
                    for mv in tokens.by_ref() {
                        match mv {
                            "string" => return info,
                            "bmc" => break,
                            _ => info.pv.push(mv.to_string()),
                        }
                    }
                }
                // Free text to the end of the line.
                "string" => break,
                _ => {}
            }
        }
        info
    }
}

impl EngineLine {
    pub fn parse(line: &str) -> Self {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("uciok") => EngineLine::UciOk,
            Some("readyok") => EngineLine::ReadyOk,
            Some("info") => EngineLine::Info(InfoLine::parse(tokens)),
            Some("bestmove") => {
                let best = tokens.next().filter(|mv| *mv != "(none)").map(String::from);
                let ponder = match (tokens.next(), tokens.next()) {
                    (Some("ponder"), Some(mv)) => Some(mv.to_string()),
                    _ => None,
                };
                EngineLine::BestMove { best, ponder }
            }
            _ => EngineLine::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_strings() {
        assert_eq!(UciCommand::Uci.to_string(), "uci");
        assert_eq!(
            UciCommand::set_option("MultiPV", 3).to_string(),
            "setoption name MultiPV value 3"
        );
        assert_eq!(
            UciCommand::Position {
                fen: "8/8/8/8/8/8/8/K6k w - - 0 1".to_string()
            }
            .to_string(),
            "position fen 8/8/8/8/8/8/8/K6k w - - 0 1"
        );
        assert_eq!(UciCommand::GoDepth(18).to_string(), "go depth 18");
    }

    fn info(line: &str) -> InfoLine {
        match EngineLine::parse(line) {
            EngineLine::Info(info) => info,
            other => panic!("expected an info line, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_mate_score() {
        let parsed = info("info depth 20 score mate -3 nodes 100000 pv e2e4");
        assert_eq!(parsed.score, Some(Score::Mate(-3)));
        assert_eq!(parsed.depth, Some(20));
    }

    #[test]
    fn test_pv_stops_at_trailing_fields() {
        let parsed = info("info depth 7 score cp 12 pv g1f3 d7d5 bmc 0.41");
        assert_eq!(parsed.pv, vec!["g1f3", "d7d5"]);

        let parsed = info("info depth 7 multipv 3 pv c2c4 string depth 99 cp 5");
        assert_eq!(parsed.pv, vec!["c2c4"]);
        assert_eq!(parsed.depth, Some(7));
        assert_eq!(parsed.multipv, 3);
        assert_eq!(parsed.score, None);
    }

    #[test]
    fn test_seldepth_is_not_depth() {
        let parsed = info("info seldepth 30 depth 12 score cp 8");
        assert_eq!(parsed.depth, Some(12));
        assert_eq!(parsed.score, Some(Score::Centipawns(8)));
    }

    #[test]
    fn test_parse_info_line() {
        let line = "info depth 14 seldepth 20 multipv 2 score cp -41 lowerbound nodes 9000 pv d7d5 e4d5";
        assert_eq!(
            EngineLine::parse(line),
            EngineLine::Info(InfoLine {
                depth: Some(14),
                multipv: 2,
                score: Some(Score::Centipawns(-41)),
                pv: vec!["d7d5".to_string(), "e4d5".to_string()],
            })
        );
    }

    #[test]
    fn test_parse_info_without_score() {
        let parsed = info("info depth 3 currmove e2e4 currmovenumber 1");
        assert_eq!(parsed.score, None);
        assert_eq!(parsed.multipv, 1);
        assert!(parsed.pv.is_empty());
    }

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(
            EngineLine::parse("bestmove e2e4 ponder e7e5"),
            EngineLine::BestMove {
                best: Some("e2e4".to_string()),
                ponder: Some("e7e5".to_string()),
            }
        );
        assert_eq!(
            EngineLine::parse("bestmove (none)"),
            EngineLine::BestMove {
                best: None,
                ponder: None
            }
        );
    }

    #[test]
    fn test_parse_acks_and_noise() {
        assert_eq!(EngineLine::parse("readyok\n"), EngineLine::ReadyOk);
        assert_eq!(EngineLine::parse("uciok"), EngineLine::UciOk);
        assert_eq!(EngineLine::parse("id name Stockfish 16"), EngineLine::Other);
        assert_eq!(EngineLine::parse(""), EngineLine::Other);
    }
}
