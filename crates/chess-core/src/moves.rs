//! Move values and the classifications produced by applying them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Color, PieceKind, Square};

/// Piece a pawn may promote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Promotion {
    Queen,
    Knight,
    Rook,
    Bishop,
}

impl Promotion {
    pub const ALL: [Promotion; 4] = [
        Promotion::Queen,
        Promotion::Knight,
        Promotion::Rook,
        Promotion::Bishop,
    ];

    pub const fn kind(self) -> PieceKind {
        match self {
            Promotion::Queen => PieceKind::Queen,
            Promotion::Knight => PieceKind::Knight,
            Promotion::Rook => PieceKind::Rook,
            Promotion::Bishop => PieceKind::Bishop,
        }
    }

    pub const fn san_letter(self) -> char {
        match self {
            Promotion::Queen => 'Q',
            Promotion::Knight => 'N',
            Promotion::Rook => 'R',
            Promotion::Bishop => 'B',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'Q' => Some(Promotion::Queen),
            'N' => Some(Promotion::Knight),
            'R' => Some(Promotion::Rook),
            'B' => Some(Promotion::Bishop),
            _ => None,
        }
    }
}

/// Metadata tag of a move. Drives the auxiliary board mutations in `Board::apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Quiet,
    Capture,
    DoublePush,
    EnPassant,
    CastleKingside,
    CastleQueenside,
    Promotion(Promotion),
}

impl MoveKind {
    pub const fn is_castle(self) -> bool {
        matches!(self, MoveKind::CastleKingside | MoveKind::CastleQueenside)
    }

    pub const fn promotion(self) -> Option<Promotion> {
        match self {
            MoveKind::Promotion(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub kind: MoveKind,
}

impl Move {
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self { from, to, kind }
    }

    /// Long algebraic form used by the analysis protocol, e.g. `e7e8q`.
    pub fn to_uci(&self) -> String {
        let mut s = format!("{}{}", self.from, self.to);
        if let Some(p) = self.kind.promotion() {
            s.push(p.san_letter().to_ascii_lowercase());
        }
        s
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}

/// Classification of a committed move, for callers that map moves to effects.
/// Variants are ordered by priority: a checking capture reports `Check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    Quiet,
    Capture,
    Castle,
    Promotion,
    Check,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    InsufficientMaterial,
    FiftyMoveRule,
    Repetition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum GameResult {
    #[default]
    Ongoing,
    Checkmate,
    Stalemate,
    Draw(DrawReason),
}

impl GameResult {
    pub const fn is_over(self) -> bool {
        !matches!(self, GameResult::Ongoing)
    }

    /// PGN result token given the side to move in the final position.
    pub fn pgn_token(self, side_to_move: Color) -> &'static str {
        match self {
            GameResult::Ongoing => "*",
            GameResult::Checkmate => match side_to_move {
                Color::White => "0-1",
                Color::Black => "1-0",
            },
            GameResult::Stalemate | GameResult::Draw(_) => "1/2-1/2",
        }
    }

    /// Human-readable description, `None` while the game is ongoing.
    pub fn describe(self, side_to_move: Color) -> Option<String> {
        match self {
            GameResult::Ongoing => None,
            GameResult::Checkmate => Some(format!(
                "{} wins by checkmate",
                side_to_move.opposite().name()
            )),
            GameResult::Stalemate => Some("Draw by stalemate".to_string()),
            GameResult::Draw(DrawReason::InsufficientMaterial) => {
                Some("Draw by insufficient material".to_string())
            }
            GameResult::Draw(DrawReason::FiftyMoveRule) => {
                Some("Draw by the fifty-move rule".to_string())
            }
            GameResult::Draw(DrawReason::Repetition) => {
                Some("Draw by threefold repetition".to_string())
            }
        }
    }
}
