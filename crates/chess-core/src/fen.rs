//! FEN import/export: six space-separated fields.

use crate::board::Board;
use crate::error::FenError;
use crate::moves::GameResult;
use crate::types::{CastlingRights, Color, Piece, PieceKind, Square};

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Board {
    /// Build a board from a FEN string. Check and terminal state are derived
    /// from the position, not taken on trust.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::FieldCount(fields.len()));
        }

        let grid = parse_placement(fields[0])?;

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        let castling = parse_castling(fields[2])?;

        let en_passant = match fields[3] {
            "-" => None,
            s => {
                let sq = Square::parse(s).ok_or_else(|| FenError::EnPassant(s.to_string()))?;
                // Empty target directly behind an opposing pawn that just double-pushed.
                let row = match side_to_move {
                    Color::White => 2,
                    Color::Black => 5,
                };
                let pushed = Some(Piece::new(PieceKind::Pawn, side_to_move.opposite()));
                let victim = sq.offset(-side_to_move.forward(), 0);
                if sq.row() != row
                    || grid[sq.row() as usize][sq.col() as usize].is_some()
                    || victim.map(|v| grid[v.row() as usize][v.col() as usize]) != Some(pushed)
                {
                    return Err(FenError::EnPassant(s.to_string()));
                }
                Some(sq)
            }
        };

        let halfmove_clock = fields[4]
            .parse()
            .map_err(|_| FenError::Clock(fields[4].to_string()))?;
        let fullmove_number: u32 = fields[5]
            .parse()
            .map_err(|_| FenError::Clock(fields[5].to_string()))?;
        if fullmove_number == 0 {
            return Err(FenError::Clock(fields[5].to_string()));
        }

        for color in [Color::White, Color::Black] {
            let king = Some(Piece::new(PieceKind::King, color));
            let count = grid.iter().flatten().filter(|p| **p == king).count();
            if count != 1 {
                return Err(FenError::KingCount { color, count });
            }
        }

        let mut board = Board {
            grid,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
            last_move: None,
            in_check: false,
            result: GameResult::Ongoing,
            claimable_draw: None,
        };
        board.finish_turn();
        Ok(board)
    }

    /// Export the position as FEN.
    pub fn to_fen(&self) -> String {
        let placement = self
            .grid
            .iter()
            .map(|row| {
                let mut out = String::new();
                let mut empty = 0;
                for square in row {
                    match square {
                        None => empty += 1,
                        Some(piece) => {
                            if empty > 0 {
                                out.push_str(&empty.to_string());
                                empty = 0;
                            }
                            out.push(piece.to_char());
                        }
                    }
                }
                if empty > 0 {
                    out.push_str(&empty.to_string());
                }
                out
            })
            .collect::<Vec<_>>()
            .join("/");

        let mut castling = String::new();
        if self.castling.white_kingside {
            castling.push('K');
        }
        if self.castling.white_queenside {
            castling.push('Q');
        }
        if self.castling.black_kingside {
            castling.push('k');
        }
        if self.castling.black_queenside {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let en_passant = self
            .en_passant
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{} {} {} {} {} {}",
            placement,
            self.side_to_move.fen_char(),
            castling,
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// The first four FEN fields: what makes two positions the same for
    /// repetition purposes.
    pub fn position_key(&self) -> String {
        let fen = self.to_fen();
        fen.split(' ').take(4).collect::<Vec<_>>().join(" ")
    }
}

fn parse_placement(placement: &str) -> Result<[[Option<Piece>; 8]; 8], FenError> {
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != 8 {
        return Err(FenError::Placement(placement.to_string()));
    }

    let mut grid = [[None; 8]; 8];
    for (r, row) in rows.iter().enumerate() {
        let mut col = 0usize;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                if skip == 0 || skip > 8 {
                    return Err(FenError::Placement(placement.to_string()));
                }
                col += skip as usize;
            } else {
                let piece =
                    Piece::from_char(c).ok_or_else(|| FenError::Placement(placement.to_string()))?;
                if col >= 8 {
                    return Err(FenError::Placement(placement.to_string()));
                }
                grid[r][col] = Some(piece);
                col += 1;
            }
            if col > 8 {
                return Err(FenError::Placement(placement.to_string()));
            }
        }
        if col != 8 {
            return Err(FenError::Placement(placement.to_string()));
        }
    }
    Ok(grid)
}

fn parse_castling(field: &str) -> Result<CastlingRights, FenError> {
    let mut rights = CastlingRights::default();
    if field == "-" {
        return Ok(rights);
    }
    for c in field.chars() {
        match c {
            'K' => rights.white_kingside = true,
            'Q' => rights.white_queenside = true,
            'k' => rights.black_kingside = true,
            'q' => rights.black_queenside = true,
            _ => return Err(FenError::Castling(field.to_string())),
        }
    }
    Ok(rights)
}
