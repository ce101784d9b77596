//! Evaluation state as seen by callers: scores from White's point of view,
//! in pawns, clamped to [-10, 10].

use serde::{Deserialize, Serialize};

use crate::uci::{InfoLine, Score};

/// Evaluations are clamped to +/- this many pawns; a forced mate reports the
/// bound itself alongside `mate_in`.
pub const EVALUATION_LIMIT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgePhase {
    #[default]
    Uninitialized,
    Ready,
    Searching,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Side to move from the second FEN field. Anything but `b` is White.
    pub fn from_fen(fen: &str) -> Self {
        match fen.split_whitespace().nth(1) {
            Some("b") => Side::Black,
            _ => Side::White,
        }
    }

    fn sign(self) -> i32 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }
}

/// Convert an engine score (side-to-move relative) to White's perspective.
/// Returns the clamped evaluation in pawns and the signed mate distance in moves.
pub fn white_relative(score: Score, side: Side) -> (f64, Option<i32>) {
    let sign = side.sign();
    match score {
        Score::Centipawns(cp) => {
            let pawns = f64::from(cp * sign) / 100.0;
            (pawns.clamp(-EVALUATION_LIMIT, EVALUATION_LIMIT), None)
        }
        // Side to move is already mated.
        Score::Mate(0) => (-EVALUATION_LIMIT * f64::from(sign), Some(0)),
        Score::Mate(moves) => {
            let moves = moves * sign;
            (EVALUATION_LIMIT * f64::from(moves.signum()), Some(moves))
        }
    }
}

/// One principal variation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PvLine {
    pub evaluation: f64,
    pub mate_in: Option<i32>,
    /// UCI moves, e.g. `e2e4`.
    pub moves: Vec<String>,
}

impl PvLine {
    /// Format for display, e.g. "+0.35", "M3" or "-M2".
    pub fn display(&self) -> String {
        match self.mate_in {
            Some(moves) if moves > 0 => format!("M{moves}"),
            Some(moves) if moves < 0 => format!("-M{}", -moves),
            Some(_) if self.evaluation < 0.0 => "-M0".to_string(),
            Some(_) => "M0".to_string(),
            None => format!("{:+.2}", self.evaluation),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisState {
    pub phase: BridgePhase,
    /// Position of the current or last search.
    pub fen: Option<String>,
    /// Deepest depth reported for the current search.
    pub depth: u32,
    pub multi_pv: u32,
    pub lines: Vec<PvLine>,
    /// From the most recent completed search only.
    pub best_move: Option<String>,
    pub ponder: Option<String>,
}

impl AnalysisState {
    pub fn new(multi_pv: u32) -> Self {
        Self {
            phase: BridgePhase::Uninitialized,
            fen: None,
            depth: 0,
            multi_pv,
            lines: vec![PvLine::default(); multi_pv as usize],
            best_move: None,
            ponder: None,
        }
    }

    /// Evaluation of the best line, 0 before any report.
    pub fn evaluation(&self) -> f64 {
        self.lines.first().map_or(0.0, |line| line.evaluation)
    }

    pub fn mate_in(&self) -> Option<i32> {
        self.lines.first().and_then(|line| line.mate_in)
    }

    pub fn display(&self) -> String {
        self.lines
            .first()
            .map(PvLine::display)
            .unwrap_or_else(|| "+0.00".to_string())
    }

    /// Clear per-search fields for a new position.
    pub(crate) fn begin_search(&mut self, fen: &str) {
        self.phase = BridgePhase::Searching;
        self.fen = Some(fen.to_string());
        self.depth = 0;
        self.lines = vec![PvLine::default(); self.multi_pv as usize];
        self.best_move = None;
        self.ponder = None;
    }

    /// Fold an `info` report into the matching line. Returns false if the
    /// report carried nothing to record.
    pub(crate) fn record(&mut self, info: &InfoLine, side: Side) -> bool {
        let Some(score) = info.score else {
            return false;
        };
        let Some(line) = self.lines.get_mut(info.multipv.saturating_sub(1) as usize) else {
            return false;
        };
        let (evaluation, mate_in) = white_relative(score, side);
        line.evaluation = evaluation;
        line.mate_in = mate_in;
        if !info.pv.is_empty() {
            line.moves = info.pv.clone();
        }
        if let Some(depth) = info.depth {
            self.depth = self.depth.max(depth);
        }
        true
    }
}
