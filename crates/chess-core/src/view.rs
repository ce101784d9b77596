//! Read-only snapshot of a session for the presentation layer.

use analysis_bridge::AnalysisState;
use serde::Serialize;

use crate::game::{GameSession, Selection};
use crate::moves::{DrawReason, GameResult};
use crate::types::{Color, Square};

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    /// Rank 8 first, FEN piece letters, `None` for empty squares.
    pub grid: Vec<Vec<Option<char>>>,
    pub side_to_move: Color,
    pub last_move: Option<(Square, Square)>,
    pub selection: Option<Selection>,
    pub in_check: bool,
    pub result: GameResult,
    /// Draw the side to move may claim in the displayed position.
    pub claimable_draw: Option<DrawReason>,
    pub description: Option<String>,
    pub notations: Vec<String>,
    pub cursor: usize,
    pub fen: String,
    pub analysis: Option<AnalysisState>,
}

impl GameSession {
    pub fn view(&self) -> SessionView {
        let board = self.current();
        SessionView {
            grid: board
                .grid()
                .iter()
                .map(|row| row.iter().map(|p| p.map(|p| p.to_char())).collect())
                .collect(),
            side_to_move: board.side_to_move(),
            last_move: board.last_move(),
            selection: self.selection().cloned(),
            in_check: board.in_check(),
            result: board.result(),
            claimable_draw: board.claimable_draw(),
            description: self.description(),
            notations: self.notations().to_vec(),
            cursor: self.cursor(),
            fen: board.to_fen(),
            analysis: self.analysis().map(|bridge| bridge.state()),
        }
    }

    pub fn view_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_json_shape() {
        let mut session = GameSession::new();
        session.select(Square::parse("e2").unwrap(), None);
        session.select(Square::parse("e4").unwrap(), None);

        let value: serde_json::Value = serde_json::from_str(&session.view_json().unwrap()).unwrap();
        assert_eq!(value["side_to_move"], "black");
        assert_eq!(value["cursor"], 1);
        assert_eq!(value["notations"][0], "e4");
        assert_eq!(value["grid"][0][0], "r");
        assert_eq!(value["grid"][4][4], "P");
        assert!(value["grid"][6][4].is_null());
        assert_eq!(value["result"]["state"], "ongoing");
        assert!(value["claimable_draw"].is_null());
        assert!(value["analysis"].is_null());
    }
}
