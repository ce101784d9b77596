//! A single chess position and the full legal-move rules.
//!
//! `Board` is a value type: move generation and move application never touch
//! `self`, they work on copies. `Board::apply` hands back a fresh snapshot and
//! the caller replaces its reference.

use crate::error::MoveError;
use crate::moves::{DrawReason, GameResult, Move, MoveKind, MoveStatus, Promotion};
use crate::san;
use crate::types::{CastlingRights, Color, Piece, PieceKind, Square};

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];
const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Plies without a capture or pawn move after which a draw may be claimed.
const FIFTY_MOVE_PLIES: u32 = 100;

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// Result of a successful `Board::apply`.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub board: Board,
    pub mv: Move,
    pub san: String,
    pub status: MoveStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub(crate) grid: [[Option<Piece>; 8]; 8],
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) last_move: Option<(Square, Square)>,
    pub(crate) in_check: bool,
    pub(crate) result: GameResult,
    pub(crate) claimable_draw: Option<DrawReason>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// The standard starting array.
    pub fn new() -> Self {
        let mut grid = [[None; 8]; 8];
        for (col, kind) in BACK_RANK.iter().enumerate() {
            grid[0][col] = Some(Piece::new(*kind, Color::Black));
            grid[1][col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            grid[6][col] = Some(Piece::new(PieceKind::Pawn, Color::White));
            grid[7][col] = Some(Piece::new(*kind, Color::White));
        }
        Self {
            grid,
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            last_move: None,
            in_check: false,
            result: GameResult::Ongoing,
            claimable_draw: None,
        }
    }

    pub fn grid(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.grid
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.grid[square.row() as usize][square.col() as usize]
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Source and destination of the move that produced this position.
    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.last_move
    }

    /// Whether the side to move is in check.
    pub fn in_check(&self) -> bool {
        self.in_check
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub(crate) fn set_result(&mut self, result: GameResult) {
        self.result = result;
    }

    /// A draw the side to move may claim without the game having ended:
    /// the fifty-move rule here, threefold repetition once a session has
    /// seen the history.
    pub fn claimable_draw(&self) -> Option<DrawReason> {
        self.claimable_draw
    }

    pub(crate) fn set_claimable_draw(&mut self, reason: Option<DrawReason>) {
        self.claimable_draw = reason;
    }

    fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.grid[square.row() as usize][square.col() as usize] = piece;
    }

    fn is_empty(&self, square: Square) -> bool {
        self.piece_at(square).is_none()
    }

    fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| match self.piece_at(sq) {
            Some(p) if p.color == color => Some((sq, p)),
            _ => None,
        })
    }

    /// Location of `color`'s king.
    ///
    /// # Panics
    ///
    /// Panics if that king is missing. Boards built from the starting array or
    /// a validated FEN always carry both kings, so a missing king means the
    /// position was corrupted upstream.
    pub fn king_square(&self, color: Color) -> Square {
        match self
            .pieces(color)
            .find(|(_, p)| p.kind == PieceKind::King)
        {
            Some((sq, _)) => sq,
            None => panic!("board invariant violated: no {color:?} king on the board"),
        }
    }

    /// Whether `color`'s king is attacked.
    pub fn is_check(&self, color: Color) -> bool {
        self.is_attacked(self.king_square(color), color.opposite())
    }

    /// Scan outward from `target` for the nearest piece on every line an
    /// attacker of color `by` could use.
    pub fn is_attacked(&self, target: Square, by: Color) -> bool {
        let ray_hits = |directions: &[(i8, i8); 4], slider: PieceKind| {
            directions.iter().any(|&(dr, dc)| {
                let mut current = target;
                let mut distance = 0;
                while let Some(next) = current.offset(dr, dc) {
                    distance += 1;
                    current = next;
                    if let Some(piece) = self.piece_at(current) {
                        return piece.color == by
                            && (piece.kind == slider
                                || piece.kind == PieceKind::Queen
                                || (piece.kind == PieceKind::King && distance == 1));
                    }
                }
                false
            })
        };

        if ray_hits(&ROOK_DIRECTIONS, PieceKind::Rook)
            || ray_hits(&BISHOP_DIRECTIONS, PieceKind::Bishop)
        {
            return true;
        }

        let knight = Piece::new(PieceKind::Knight, by);
        if KNIGHT_OFFSETS
            .iter()
            .filter_map(|&(dr, dc)| target.offset(dr, dc))
            .any(|sq| self.piece_at(sq) == Some(knight))
        {
            return true;
        }

        // A pawn of `by` attacks diagonally forward, so look one row behind it.
        let pawn = Piece::new(PieceKind::Pawn, by);
        [-1, 1]
            .iter()
            .filter_map(|&dc| target.offset(-by.forward(), dc))
            .any(|sq| self.piece_at(sq) == Some(pawn))
    }

    /// Legal moves of the piece on `square`, already filtered for king safety.
    pub fn legal_moves(&self, square: Square) -> Vec<Move> {
        let Some(piece) = self.piece_at(square) else {
            return Vec::new();
        };
        self.candidate_moves(square, piece)
            .into_iter()
            .filter(|mv| self.is_safe(mv))
            .collect()
    }

    /// Every legal move for the side to move.
    pub fn all_legal_moves(&self) -> Vec<Move> {
        self.pieces(self.side_to_move)
            .flat_map(|(sq, _)| self.legal_moves(sq))
            .collect()
    }

    fn has_legal_move(&self, color: Color) -> bool {
        self.pieces(color)
            .any(|(sq, _)| !self.legal_moves(sq).is_empty())
    }

    /// Play `mv` on a scratch copy and require the mover's king not be in check.
    pub fn is_safe(&self, mv: &Move) -> bool {
        let Some(piece) = self.piece_at(mv.from) else {
            return false;
        };
        !self.make_move(mv).is_check(piece.color)
    }

    fn candidate_moves(&self, from: Square, piece: Piece) -> Vec<Move> {
        let mut moves = Vec::new();
        match piece.kind {
            PieceKind::Pawn => self.pawn_moves(from, piece.color, &mut moves),
            PieceKind::Knight => self.step_moves(from, piece.color, &KNIGHT_OFFSETS, &mut moves),
            PieceKind::Bishop => self.slide_moves(from, piece.color, &BISHOP_DIRECTIONS, &mut moves),
            PieceKind::Rook => self.slide_moves(from, piece.color, &ROOK_DIRECTIONS, &mut moves),
            PieceKind::Queen => {
                self.slide_moves(from, piece.color, &ROOK_DIRECTIONS, &mut moves);
                self.slide_moves(from, piece.color, &BISHOP_DIRECTIONS, &mut moves);
            }
            PieceKind::King => {
                self.step_moves(from, piece.color, &KING_OFFSETS, &mut moves);
                self.castle_moves(from, piece.color, &mut moves);
            }
        }
        moves
    }

    fn slide_moves(&self, from: Square, color: Color, directions: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(dr, dc) in directions {
            let mut current = from;
            while let Some(to) = current.offset(dr, dc) {
                current = to;
                match self.piece_at(to) {
                    None => moves.push(Move::new(from, to, MoveKind::Quiet)),
                    Some(p) => {
                        if p.color != color {
                            moves.push(Move::new(from, to, MoveKind::Capture));
                        }
                        break;
                    }
                }
            }
        }
    }

    fn step_moves(&self, from: Square, color: Color, offsets: &[(i8, i8)], moves: &mut Vec<Move>) {
        for to in offsets.iter().filter_map(|&(dr, dc)| from.offset(dr, dc)) {
            match self.piece_at(to) {
                None => moves.push(Move::new(from, to, MoveKind::Quiet)),
                Some(p) if p.color != color => moves.push(Move::new(from, to, MoveKind::Capture)),
                Some(_) => {}
            }
        }
    }

    fn pawn_moves(&self, from: Square, color: Color, moves: &mut Vec<Move>) {
        let dir = color.forward();
        let push = |to: Square, kind: MoveKind, moves: &mut Vec<Move>| {
            if to.row() == color.promotion_row() {
                moves.extend(
                    Promotion::ALL
                        .iter()
                        .map(|&p| Move::new(from, to, MoveKind::Promotion(p))),
                );
            } else {
                moves.push(Move::new(from, to, kind));
            }
        };

        if let Some(one) = from.offset(dir, 0) {
            if self.is_empty(one) {
                push(one, MoveKind::Quiet, moves);
                if from.row() == color.pawn_start_row() {
                    if let Some(two) = one.offset(dir, 0) {
                        if self.is_empty(two) {
                            push(two, MoveKind::DoublePush, moves);
                        }
                    }
                }
            }
        }

        for dc in [-1, 1] {
            let Some(to) = from.offset(dir, dc) else {
                continue;
            };
            match self.piece_at(to) {
                Some(p) if p.color != color => push(to, MoveKind::Capture, moves),
                None if color == self.side_to_move
                    && self.en_passant == Some(to)
                    && Square::new(from.row(), to.col()).and_then(|v| self.piece_at(v))
                        == Some(Piece::new(PieceKind::Pawn, color.opposite())) =>
                {
                    moves.push(Move::new(from, to, MoveKind::EnPassant));
                }
                _ => {}
            }
        }
    }

    fn castle_moves(&self, from: Square, color: Color, moves: &mut Vec<Move>) {
        let back = color.back_rank();
        if Square::new(back, 4) != Some(from) {
            return;
        }
        let rook = Some(Piece::new(PieceKind::Rook, color));
        let empty = |cols: &[u8]| {
            cols.iter()
                .filter_map(|&c| Square::new(back, c))
                .all(|sq| self.is_empty(sq))
        };
        let rook_home = |col: u8| Square::new(back, col).and_then(|sq| self.piece_at(sq)) == rook;

        let kingside = self.castling.kingside(color) && empty(&[5, 6]) && rook_home(7);
        let queenside = self.castling.queenside(color) && empty(&[1, 2, 3]) && rook_home(0);
        if !(kingside || queenside) || self.is_check(color) {
            return;
        }

        if kingside && !self.transit_attacked(from, 5, color) {
            if let Some(to) = Square::new(back, 6) {
                moves.push(Move::new(from, to, MoveKind::CastleKingside));
            }
        }
        if queenside && !self.transit_attacked(from, 3, color) {
            if let Some(to) = Square::new(back, 2) {
                moves.push(Move::new(from, to, MoveKind::CastleQueenside));
            }
        }
    }

    /// Move the king to its transit square on a scratch copy and re-run check detection.
    fn transit_attacked(&self, king: Square, transit_col: u8, color: Color) -> bool {
        let Some(transit) = Square::new(king.row(), transit_col) else {
            return true;
        };
        let mut scratch = self.clone();
        let piece = scratch.piece_at(king);
        scratch.set(king, None);
        scratch.set(transit, piece);
        scratch.is_check(color)
    }

    /// Raw mutation of a copy: placement, rights, en passant, clocks, side to move.
    /// Terminal state is left to `finish_turn`.
    fn make_move(&self, mv: &Move) -> Board {
        let mut next = self.clone();
        let Some(piece) = next.piece_at(mv.from) else {
            return next;
        };
        let color = piece.color;
        let captured = next.piece_at(mv.to);

        next.set(mv.from, None);
        next.en_passant = None;
        match mv.kind {
            MoveKind::DoublePush => next.en_passant = mv.from.offset(color.forward(), 0),
            MoveKind::EnPassant => {
                if let Some(victim) = Square::new(mv.from.row(), mv.to.col()) {
                    next.set(victim, None);
                }
            }
            MoveKind::CastleKingside => next.relocate_rook(mv.from.row(), 7, 5),
            MoveKind::CastleQueenside => next.relocate_rook(mv.from.row(), 0, 3),
            _ => {}
        }
        let placed = match mv.kind {
            MoveKind::Promotion(p) => Piece::new(p.kind(), color),
            _ => piece,
        };
        next.set(mv.to, Some(placed));

        if piece.kind == PieceKind::King {
            next.castling.revoke_all(color);
        }
        if piece.kind == PieceKind::Rook && mv.from.row() == color.back_rank() {
            match mv.from.col() {
                0 => next.castling.revoke_queenside(color),
                7 => next.castling.revoke_kingside(color),
                _ => {}
            }
        }
        if let Some(victim) = captured {
            if victim.kind == PieceKind::Rook && mv.to.row() == victim.color.back_rank() {
                match mv.to.col() {
                    0 => next.castling.revoke_queenside(victim.color),
                    7 => next.castling.revoke_kingside(victim.color),
                    _ => {}
                }
            }
        }

        let resets_clock = piece.kind == PieceKind::Pawn || captured.is_some();
        next.halfmove_clock = if resets_clock {
            0
        } else {
            self.halfmove_clock + 1
        };
        if color == Color::Black {
            next.fullmove_number += 1;
        }
        next.side_to_move = color.opposite();
        next.last_move = Some((mv.from, mv.to));
        next
    }

    fn relocate_rook(&mut self, row: u8, from_col: u8, to_col: u8) {
        if let (Some(from), Some(to)) = (Square::new(row, from_col), Square::new(row, to_col)) {
            let rook = self.piece_at(from);
            self.set(from, None);
            self.set(to, rook);
        }
    }

    /// Recompute check and terminal state for the side to move.
    pub(crate) fn finish_turn(&mut self) {
        let side = self.side_to_move;
        self.in_check = self.is_check(side);
        self.result = if !self.has_legal_move(side) {
            if self.in_check {
                GameResult::Checkmate
            } else {
                GameResult::Stalemate
            }
        } else if self.insufficient_material() {
            GameResult::Draw(DrawReason::InsufficientMaterial)
        } else {
            GameResult::Ongoing
        };
        self.claimable_draw = (!self.result.is_over() && self.halfmove_clock >= FIFTY_MOVE_PLIES)
            .then_some(DrawReason::FiftyMoveRule);
    }

    /// King vs king, king and one minor vs king, or one minor each.
    ///
    /// One bishop per side never counts as a draw, whatever the square colors.
    /// Same-colored bishops are a dead position in practice; that case is not
    /// recognized here.
    pub fn insufficient_material(&self) -> bool {
        let mut white = Vec::new();
        let mut black = Vec::new();
        for sq in Square::all() {
            let Some(piece) = self.piece_at(sq) else {
                continue;
            };
            if piece.kind == PieceKind::King {
                continue;
            }
            if !piece.kind.is_minor() {
                return false;
            }
            match piece.color {
                Color::White => white.push(piece.kind),
                Color::Black => black.push(piece.kind),
            }
        }
        match (white.as_slice(), black.as_slice()) {
            ([], []) | ([_], []) | ([], [_]) => true,
            ([a], [b]) => !(*a == PieceKind::Bishop && *b == PieceKind::Bishop),
            _ => false,
        }
    }

    /// Validate `mv` against this position and return the resulting snapshot.
    ///
    /// `self` is never modified; on error nothing changes.
    pub fn apply(&self, mv: Move) -> Result<MoveOutcome, MoveError> {
        let piece = self
            .piece_at(mv.from)
            .ok_or(MoveError::EmptySquare(mv.from))?;
        if piece.color != self.side_to_move {
            return Err(MoveError::WrongColor {
                square: mv.from,
                owner: piece.color,
                to_move: self.side_to_move,
            });
        }
        if self.result.is_over() {
            return Err(MoveError::GameOver);
        }
        if !self.legal_moves(mv.from).contains(&mv) {
            return Err(MoveError::Illegal {
                from: mv.from,
                to: mv.to,
            });
        }

        let captured = mv.kind == MoveKind::EnPassant || self.piece_at(mv.to).is_some();
        let mut board = self.make_move(&mv);
        board.finish_turn();

        let san = san::render(self, &mv, &board);
        let status = if board.result.is_over() {
            MoveStatus::GameOver
        } else if board.in_check {
            MoveStatus::Check
        } else if mv.kind.promotion().is_some() {
            MoveStatus::Promotion
        } else if mv.kind.is_castle() {
            MoveStatus::Castle
        } else if captured {
            MoveStatus::Capture
        } else {
            MoveStatus::Quiet
        };

        Ok(MoveOutcome {
            board,
            mv,
            san,
            status,
        })
    }

    /// Find the legal move from `from` to `to`, choosing `promotion` (queen by
    /// default) when the move promotes.
    pub fn find_move(&self, from: Square, to: Square, promotion: Option<Promotion>) -> Option<Move> {
        let wanted = promotion.unwrap_or(Promotion::Queen);
        self.legal_moves(from)
            .into_iter()
            .filter(|mv| mv.to == to)
            .find(|mv| match mv.kind.promotion() {
                Some(p) => p == wanted,
                None => true,
            })
    }
}
