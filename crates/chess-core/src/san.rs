//! Standard Algebraic Notation: generation from a move and resolution of a
//! token back to the unique legal move it names.

use std::sync::LazyLock;

use regex::Regex;

use crate::board::Board;
use crate::error::{MoveError, SanError};
use crate::moves::{GameResult, Move, MoveKind, Promotion};
use crate::types::{Piece, PieceKind, Square};

static SAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([KQRBN])?([a-h])?([1-8])?x?([a-h][1-8])(?:=?([QRBN]))?$").unwrap()
});

/// SAN for `mv`, using `before` for disambiguation and `after` for the
/// check/mate suffix.
pub(crate) fn render(before: &Board, mv: &Move, after: &Board) -> String {
    let mut san = match mv.kind {
        MoveKind::CastleKingside => "O-O".to_string(),
        MoveKind::CastleQueenside => "O-O-O".to_string(),
        _ => {
            let Some(piece) = before.piece_at(mv.from) else {
                return mv.to_uci();
            };
            let capture = mv.kind == MoveKind::EnPassant || before.piece_at(mv.to).is_some();
            let mut out = String::new();
            match piece.kind.san_letter() {
                None if capture => out.push(mv.from.file_char()),
                None => {}
                Some(letter) => {
                    out.push(letter);
                    out.push_str(&disambiguation(before, mv, piece));
                }
            }
            if capture {
                out.push('x');
            }
            out.push_str(&mv.to.to_string());
            if let Some(p) = mv.kind.promotion() {
                out.push('=');
                out.push(p.san_letter());
            }
            out
        }
    };

    if after.result() == GameResult::Checkmate {
        san.push('#');
    } else if after.in_check() {
        san.push('+');
    }
    san
}

/// File if that is unique among the rivals, else rank, else both.
fn disambiguation(board: &Board, mv: &Move, piece: Piece) -> String {
    let rivals: Vec<Square> = Square::all()
        .filter(|&sq| sq != mv.from && board.piece_at(sq) == Some(piece))
        .filter(|&sq| board.legal_moves(sq).iter().any(|m| m.to == mv.to))
        .collect();
    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals.iter().any(|sq| sq.col() == mv.from.col());
    let shares_rank = rivals.iter().any(|sq| sq.row() == mv.from.row());
    if !shares_file {
        mv.from.file_char().to_string()
    } else if !shares_rank {
        mv.from.rank_char().to_string()
    } else {
        mv.from.to_string()
    }
}

/// Resolve a SAN token against `board`. Check, mate and annotation suffixes
/// are ignored; a promotion without a piece letter defaults to a queen.
pub fn resolve(board: &Board, token: &str) -> Result<Move, SanError> {
    let cleaned = token.trim_end_matches(['+', '#', '!', '?']);
    match cleaned {
        "O-O" | "0-0" => return castle(board, MoveKind::CastleKingside, token),
        "O-O-O" | "0-0-0" => return castle(board, MoveKind::CastleQueenside, token),
        _ => {}
    }

    let caps = SAN_RE
        .captures(cleaned)
        .ok_or_else(|| SanError::Malformed(token.to_string()))?;

    let kind = caps
        .get(1)
        .and_then(|m| m.as_str().chars().next())
        .and_then(PieceKind::from_code)
        .unwrap_or(PieceKind::Pawn);
    let file_hint = caps.get(2).map(|m| m.as_str().as_bytes()[0] - b'a');
    let row_hint = caps.get(3).map(|m| b'8' - m.as_str().as_bytes()[0]);
    let to = Square::parse(&caps[4]).ok_or_else(|| SanError::Malformed(token.to_string()))?;
    let promotion = caps
        .get(5)
        .and_then(|m| m.as_str().chars().next())
        .and_then(Promotion::from_letter);

    let piece = Piece::new(kind, board.side_to_move());
    let candidates: Vec<Move> = Square::all()
        .filter(|&sq| board.piece_at(sq) == Some(piece))
        .filter(|sq| file_hint.map_or(true, |f| sq.col() == f))
        .filter(|sq| row_hint.map_or(true, |r| sq.row() == r))
        .flat_map(|sq| board.legal_moves(sq))
        .filter(|mv| mv.to == to)
        .filter(|mv| match (mv.kind.promotion(), promotion) {
            (Some(p), Some(wanted)) => p == wanted,
            (Some(p), None) => p == Promotion::Queen,
            (None, Some(_)) => false,
            (None, None) => true,
        })
        .collect();

    match candidates.as_slice() {
        [mv] => Ok(*mv),
        [] => Err(SanError::NoLegalMove(token.to_string())),
        _ => Err(SanError::Ambiguous(token.to_string())),
    }
}

fn castle(board: &Board, kind: MoveKind, token: &str) -> Result<Move, SanError> {
    let king = board.king_square(board.side_to_move());
    board
        .legal_moves(king)
        .into_iter()
        .find(|mv| mv.kind == kind)
        .ok_or_else(|| SanError::NoLegalMove(token.to_string()))
}

impl Board {
    /// SAN of a legal move in this position.
    pub fn to_san(&self, mv: Move) -> Result<String, MoveError> {
        self.apply(mv).map(|outcome| outcome.san)
    }

    pub fn parse_san(&self, token: &str) -> Result<Move, SanError> {
        resolve(self, token)
    }
}
