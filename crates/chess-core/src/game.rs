//! Game session: snapshot history, read cursor, click selection and the
//! optional analysis bridge.

use analysis_bridge::AnalysisBridge;
use serde::Serialize;
use tracing::debug;

use crate::board::{Board, MoveOutcome};
use crate::error::{FenError, MoveError, PgnError, SanError};
use crate::game_data::GameMetadata;
use crate::moves::{DrawReason, GameResult, MoveStatus, Promotion};
use crate::pgn;
use crate::san;
use crate::types::Square;

/// The selected square and where its piece may legally go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub square: Square,
    pub destinations: Vec<Square>,
}

/// What a call to [`GameSession::select`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected(Selection),
    Deselected,
    Moved { san: String, status: MoveStatus },
    /// Nothing was played; any selection has been cleared.
    Rejected(MoveError),
}

#[derive(Debug)]
pub struct GameSession {
    history: Vec<Board>,
    notations: Vec<String>,
    cursor: usize,
    selection: Option<Selection>,
    metadata: GameMetadata,
    analysis: Option<AnalysisBridge>,
    analysis_enabled: bool,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    /// A new game from the standard starting position.
    pub fn new() -> Self {
        Self::with_board(Board::new(), GameMetadata::default())
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Ok(Self::with_board(Board::from_fen(fen)?, GameMetadata::default()))
    }

    /// Import a PGN game. Every move is replayed through [`select`](Self::select)
    /// and the session is left showing the initial position. A drawn result
    /// header claims any draw open in the final position.
    pub fn from_pgn(text: &str) -> Result<Self, PgnError> {
        let parsed = pgn::parse_pgn(text);
        let start = match parsed.start_fen.as_deref() {
            Some(fen) => Board::from_fen(fen)?,
            None => Board::new(),
        };
        let mut session = Self::with_board(start, parsed.metadata);

        for (i, token) in parsed.moves.iter().enumerate() {
            let illegal = |source: SanError| PgnError::IllegalMove {
                ply: i + 1,
                token: token.clone(),
                source,
            };
            let mv = san::resolve(session.current(), token).map_err(illegal)?;
            session.selection = None;
            session.select(mv.from, None);
            let source = match session.select(mv.to, mv.kind.promotion()) {
                SelectOutcome::Moved { .. } => continue,
                SelectOutcome::Rejected(err) => err,
                _ => MoveError::Illegal {
                    from: mv.from,
                    to: mv.to,
                },
            };
            return Err(PgnError::Rejected {
                ply: i + 1,
                token: token.clone(),
                source,
            });
        }

        if session.metadata.result == "1/2-1/2" {
            session.claim_draw();
        }
        debug!(plies = session.notations.len(), "imported PGN");
        session.peek(0);
        Ok(session)
    }

    fn with_board(board: Board, metadata: GameMetadata) -> Self {
        Self {
            history: vec![board],
            notations: Vec::new(),
            cursor: 0,
            selection: None,
            metadata,
            analysis: None,
            analysis_enabled: false,
        }
    }

    /// Start over from this session's initial position. Metadata and any
    /// attached bridge are kept; the result header is cleared.
    pub fn reset(&mut self) {
        self.history.truncate(1);
        self.notations.clear();
        self.cursor = 0;
        self.selection = None;
        self.metadata.result = "*".to_string();
        self.analyze_current(false);
    }

    /// Click on `square`.
    ///
    /// Without a selection, a piece of the side to move becomes selected and
    /// anything else clears. With a selection, a cached destination plays the
    /// move (`promotion` is used only if the move promotes, queen by default),
    /// another own piece switches the selection, and any other square clears
    /// it as a rejected move.
    pub fn select(&mut self, square: Square, promotion: Option<Promotion>) -> SelectOutcome {
        let (over, piece, side) = {
            let board = self.current();
            (board.result().is_over(), board.piece_at(square), board.side_to_move())
        };
        if over {
            self.selection = None;
            return SelectOutcome::Rejected(MoveError::GameOver);
        }

        let own_piece = piece.is_some_and(|p| p.color == side);
        if let Some(selection) = self.selection.take() {
            if selection.destinations.contains(&square) {
                return self.commit(selection.square, square, promotion);
            }
            if square == selection.square {
                return SelectOutcome::Deselected;
            }
            if !own_piece {
                return SelectOutcome::Rejected(MoveError::Illegal {
                    from: selection.square,
                    to: square,
                });
            }
        }

        if !own_piece {
            return SelectOutcome::Deselected;
        }
        let mut destinations: Vec<Square> = self
            .current()
            .legal_moves(square)
            .into_iter()
            .map(|mv| mv.to)
            .collect();
        destinations.dedup();
        let selection = Selection {
            square,
            destinations,
        };
        self.selection = Some(selection.clone());
        SelectOutcome::Selected(selection)
    }

    fn commit(&mut self, from: Square, to: Square, promotion: Option<Promotion>) -> SelectOutcome {
        let board = self.current();
        let Some(mv) = board.find_move(from, to, promotion) else {
            return SelectOutcome::Rejected(MoveError::Illegal { from, to });
        };
        let MoveOutcome {
            board: mut next,
            san,
            status,
            ..
        } = match board.apply(mv) {
            Ok(outcome) => outcome,
            Err(err) => return SelectOutcome::Rejected(err),
        };

        // A move from an earlier ply discards the old continuation.
        self.history.truncate(self.cursor + 1);
        self.notations.truncate(self.cursor);

        if !next.result().is_over() {
            let key = next.position_key();
            let seen = self.history.iter().filter(|b| b.position_key() == key).count();
            if seen >= 2 {
                next.set_claimable_draw(Some(DrawReason::Repetition));
            }
        }

        debug!(ply = self.notations.len() + 1, %mv, %san, ?status, "move committed");
        self.history.push(next);
        self.notations.push(san.clone());
        self.cursor = self.history.len() - 1;
        if let Some(description) = self.description() {
            debug!(%description, "game over");
        }
        self.analyze_current(true);

        SelectOutcome::Moved { san, status }
    }

    /// End the game by claiming the draw open in the final position, either
    /// threefold repetition or the fifty-move rule. Only possible at the tip.
    pub fn claim_draw(&mut self) -> Option<DrawReason> {
        if !self.is_at_tip() {
            return None;
        }
        let board = &mut self.history[self.cursor];
        let reason = board.claimable_draw()?;
        board.set_result(GameResult::Draw(reason));
        board.set_claimable_draw(None);
        self.selection = None;
        debug!(?reason, "draw claimed");
        self.analyze_current(false);
        Some(reason)
    }

    /// Step the cursor back one ply. Returns false at the initial position.
    pub fn backward(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.move_cursor(self.cursor - 1);
        true
    }

    /// Step the cursor forward one ply. Returns false at the tip.
    pub fn forward(&mut self) -> bool {
        if self.is_at_tip() {
            return false;
        }
        self.move_cursor(self.cursor + 1);
        true
    }

    /// Jump to `index` in the history. Out-of-range indices are ignored;
    /// peeking at the cursor itself only resubmits the position for analysis.
    pub fn peek(&mut self, index: usize) -> bool {
        if index >= self.history.len() {
            return false;
        }
        if index == self.cursor {
            self.analyze_current(false);
        } else {
            self.move_cursor(index);
        }
        true
    }

    fn move_cursor(&mut self, index: usize) {
        self.cursor = index;
        self.selection = None;
        self.analyze_current(false);
    }

    /// Hand the displayed position to the bridge. Navigation only resubmits
    /// while analysis is enabled or once the game has ended.
    fn analyze_current(&self, committed: bool) {
        let Some(bridge) = &self.analysis else {
            return;
        };
        if committed || self.analysis_enabled || self.tip().result().is_over() {
            bridge.submit(&self.current().to_fen());
        }
    }

    pub fn export_fen(&self) -> String {
        self.current().to_fen()
    }

    /// The whole game as PGN, independent of the cursor. The result token
    /// comes from the final position once the game is over, else from the
    /// `Result` header.
    pub fn export_pgn(&self) -> String {
        let tip = self.tip();
        let result = if tip.result().is_over() {
            tip.result().pgn_token(tip.side_to_move())
        } else {
            self.metadata.result.as_str()
        };
        pgn::write_pgn(&self.metadata, &self.history[0], &self.notations, result)
    }

    pub fn current(&self) -> &Board {
        &self.history[self.cursor]
    }

    pub fn tip(&self) -> &Board {
        &self.history[self.history.len() - 1]
    }

    pub fn is_at_tip(&self) -> bool {
        self.cursor + 1 == self.history.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history(&self) -> &[Board] {
        &self.history
    }

    pub fn notations(&self) -> &[String] {
        &self.notations
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Cached destinations of the current selection, empty without one.
    pub fn legal_destinations(&self) -> &[Square] {
        self.selection
            .as_ref()
            .map(|s| s.destinations.as_slice())
            .unwrap_or(&[])
    }

    /// Terminal status of the displayed position, e.g. "Black wins by checkmate".
    pub fn description(&self) -> Option<String> {
        let board = self.current();
        board.result().describe(board.side_to_move())
    }

    pub fn metadata(&self) -> &GameMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut GameMetadata {
        &mut self.metadata
    }

    pub fn analysis(&self) -> Option<&AnalysisBridge> {
        self.analysis.as_ref()
    }

    pub fn analysis_enabled(&self) -> bool {
        self.analysis_enabled
    }

    /// Turning analysis on submits the displayed position right away.
    pub fn set_analysis_enabled(&mut self, enabled: bool) {
        self.analysis_enabled = enabled;
        if enabled {
            self.analyze_current(false);
        }
    }

    /// Attach a bridge, replacing any previous one, and enable analysis.
    pub fn attach_analysis(&mut self, bridge: AnalysisBridge) {
        self.analysis = Some(bridge);
        self.set_analysis_enabled(true);
    }

    pub fn detach_analysis(&mut self) -> Option<AnalysisBridge> {
        self.analysis_enabled = false;
        self.analysis.take()
    }
}
