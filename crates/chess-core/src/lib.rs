//! Chess rules, notation and game sessions.

pub mod board;
pub mod error;
pub mod fen;
pub mod game;
pub mod game_data;
pub mod moves;
pub mod pgn;
pub mod san;
pub mod types;
pub mod view;

pub use board::{Board, MoveOutcome};
pub use error::{FenError, MoveError, PgnError, SanError};
pub use fen::STANDARD_START_FEN;
pub use game::{GameSession, SelectOutcome, Selection};
pub use game_data::GameMetadata;
pub use moves::{DrawReason, GameResult, Move, MoveKind, MoveStatus, Promotion};
pub use types::{CastlingRights, Color, Piece, PieceKind, Square};
pub use view::SessionView;
