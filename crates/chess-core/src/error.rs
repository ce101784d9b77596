//! Rules engine error types

use thiserror::Error;

use crate::types::{Color, Square};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 6 fields, found {0}")]
    FieldCount(usize),

    #[error("invalid piece placement: {0}")]
    Placement(String),

    #[error("invalid side to move: {0}")]
    SideToMove(String),

    #[error("invalid castling rights: {0}")]
    Castling(String),

    #[error("invalid en passant target: {0}")]
    EnPassant(String),

    #[error("invalid move clock: {0}")]
    Clock(String),

    #[error("expected exactly one {color:?} king, found {count}")]
    KingCount { color: Color, count: usize },
}

/// Rejected move input. The board is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("no piece on {0}")]
    EmptySquare(Square),

    #[error("piece on {square} belongs to {owner:?}, but {to_move:?} is to move")]
    WrongColor {
        square: Square,
        owner: Color,
        to_move: Color,
    },

    #[error("illegal move {from} -> {to}")]
    Illegal { from: Square, to: Square },

    #[error("the game is already over")]
    GameOver,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanError {
    #[error("malformed move token: {0}")]
    Malformed(String),

    #[error("no legal move matches {0}")]
    NoLegalMove(String),

    #[error("move {0} is ambiguous")]
    Ambiguous(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PgnError {
    #[error("invalid FEN header: {0}")]
    Fen(#[from] FenError),

    #[error("ply {ply}: cannot play {token}: {source}")]
    IllegalMove {
        ply: usize,
        token: String,
        #[source]
        source: SanError,
    },

    #[error("ply {ply}: cannot play {token}: {source}")]
    Rejected {
        ply: usize,
        token: String,
        #[source]
        source: MoveError,
    },
}
