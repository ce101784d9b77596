/// Game session scenarios played through `select`, the same path the UI uses.
mod common;

use chess_core::{
    Board, Color, DrawReason, GameResult, GameSession, MoveError, MoveStatus, PieceKind,
    Promotion, SelectOutcome,
};
use common::{play, sq};

#[test]
fn test_en_passant_capture_removes_passed_pawn() {
    let mut session = GameSession::new();
    play(&mut session, &[("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5")]);
    assert_eq!(session.current().en_passant(), Some(sq("d6")));

    let SelectOutcome::Selected(selection) = session.select(sq("e5"), None) else {
        panic!("e5 pawn should be selectable");
    };
    assert!(selection.destinations.contains(&sq("d6")));

    assert_eq!(
        session.select(sq("d6"), None),
        SelectOutcome::Moved {
            san: "exd6".to_string(),
            status: MoveStatus::Capture
        }
    );
    let board = session.current();
    assert_eq!(board.piece_at(sq("d5")), None);
    assert_eq!(
        board.piece_at(sq("d6")).map(|p| (p.kind, p.color)),
        Some((PieceKind::Pawn, Color::White))
    );
    assert_eq!(board.en_passant(), None);
}

#[test]
fn test_en_passant_expires_after_one_ply() {
    let mut session = GameSession::new();
    play(
        &mut session,
        &[("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5"), ("h2", "h3"), ("h7", "h6")],
    );
    session.select(sq("e5"), None);
    assert!(!session.legal_destinations().contains(&sq("d6")));
}

#[test]
fn test_moved_rook_revokes_kingside_castling() {
    let mut session = GameSession::new();
    play(
        &mut session,
        &[
            ("e2", "e4"),
            ("e7", "e5"),
            ("g1", "f3"),
            ("b8", "c6"),
            ("f1", "c4"),
            ("g8", "f6"),
            ("h1", "g1"),
            ("f8", "c5"),
            ("g1", "h1"),
            ("d7", "d6"),
        ],
    );
    // f1 and g1 are empty and the rook is home again.
    assert_eq!(session.current().piece_at(sq("f1")), None);
    assert_eq!(session.current().piece_at(sq("g1")), None);
    assert!(!session.current().castling_rights().kingside(Color::White));
    assert!(session.current().castling_rights().queenside(Color::White));

    session.select(sq("e1"), None);
    assert!(!session.legal_destinations().contains(&sq("g1")));
    assert_eq!(
        session.select(sq("g1"), None),
        SelectOutcome::Rejected(MoveError::Illegal {
            from: sq("e1"),
            to: sq("g1")
        })
    );
}

#[test]
fn test_castling_moves_rook_and_reports_status() {
    let mut session = GameSession::new();
    play(
        &mut session,
        &[("e2", "e4"), ("e7", "e5"), ("g1", "f3"), ("b8", "c6"), ("f1", "c4"), ("g8", "f6")],
    );
    session.select(sq("e1"), None);
    assert_eq!(
        session.select(sq("g1"), None),
        SelectOutcome::Moved {
            san: "O-O".to_string(),
            status: MoveStatus::Castle
        }
    );
    let board = session.current();
    assert_eq!(board.piece_at(sq("f1")).map(|p| p.kind), Some(PieceKind::Rook));
    assert_eq!(board.piece_at(sq("h1")), None);
    assert!(!board.castling_rights().queenside(Color::White));
}

#[test]
fn test_scholars_mate() {
    let mut session = GameSession::new();
    play(
        &mut session,
        &[("e2", "e4"), ("e7", "e5"), ("d1", "h5"), ("b8", "c6"), ("f1", "c4"), ("g8", "f6")],
    );
    session.select(sq("h5"), None);
    assert_eq!(
        session.select(sq("f7"), None),
        SelectOutcome::Moved {
            san: "Qxf7#".to_string(),
            status: MoveStatus::GameOver
        }
    );

    let board = session.current();
    assert_eq!(board.result(), GameResult::Checkmate);
    assert!(board.in_check());
    assert!(board.all_legal_moves().is_empty());
    assert_eq!(session.description().as_deref(), Some("White wins by checkmate"));
    assert!(session.export_pgn().trim_end().ends_with("4. Qxf7# 1-0"));

    // No further input is accepted.
    assert_eq!(
        session.select(sq("e8"), None),
        SelectOutcome::Rejected(MoveError::GameOver)
    );
}

#[test]
fn test_fools_mate_black_wins() {
    let mut session = GameSession::new();
    play(&mut session, &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")]);
    assert_eq!(session.notations().last().map(String::as_str), Some("Qh4#"));
    assert_eq!(session.description().as_deref(), Some("Black wins by checkmate"));
    assert!(session.export_pgn().trim_end().ends_with("0-1"));
}

#[test]
fn test_promotion_choices_give_distinct_san() {
    // The a2 pawn keeps king and knight against king and pawn from being a dead draw.
    let fen = "3r3k/4P3/8/8/8/8/p7/4K3 w - - 0 1";
    let mut session = GameSession::from_fen(fen).unwrap();

    session.select(sq("e7"), None);
    assert_eq!(
        session.select(sq("d8"), Some(Promotion::Knight)),
        SelectOutcome::Moved {
            san: "exd8=N".to_string(),
            status: MoveStatus::Promotion
        }
    );
    assert_eq!(
        session.current().piece_at(sq("d8")).map(|p| p.kind),
        Some(PieceKind::Knight)
    );

    assert!(session.backward());
    session.select(sq("e7"), None);
    assert_eq!(
        session.select(sq("d8"), Some(Promotion::Queen)),
        SelectOutcome::Moved {
            san: "exd8=Q+".to_string(),
            status: MoveStatus::Check
        }
    );
    assert_eq!(session.notations(), ["exd8=Q+"]);
}

#[test]
fn test_promotion_defaults_to_queen() {
    let mut session = GameSession::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    session.select(sq("a7"), None);
    let SelectOutcome::Moved { san, status } = session.select(sq("a8"), None) else {
        panic!("promotion should be played");
    };
    assert_eq!(san, "a8=Q+");
    assert_eq!(status, MoveStatus::Check);
}

#[test]
fn test_king_versus_king_is_a_draw() {
    let mut session = GameSession::from_fen("4k3/8/8/8/8/8/3q4/4K3 w - - 0 1").unwrap();
    play(&mut session, &[("e1", "d2")]);
    assert_eq!(session.notations(), ["Kxd2"]);
    assert_eq!(
        session.current().result(),
        GameResult::Draw(DrawReason::InsufficientMaterial)
    );
    assert_eq!(session.description().as_deref(), Some("Draw by insufficient material"));
    assert!(session.export_pgn().trim_end().ends_with("1/2-1/2"));
}

#[test]
fn test_king_and_bishop_versus_king_is_a_draw() {
    let mut session = GameSession::from_fen("4k3/8/8/8/8/8/3r4/3BK3 w - - 0 1").unwrap();
    play(&mut session, &[("e1", "d2")]);
    assert_eq!(
        session.current().result(),
        GameResult::Draw(DrawReason::InsufficientMaterial)
    );
}

/// Known gap: one bishop each on squares of the same color cannot mate, but
/// the material table counts one minor each as a draw only when the pair is
/// not bishop against bishop, whatever the square colors. This asserts the
/// current behavior.
#[test]
fn test_same_colored_bishops_are_not_a_draw() {
    let mut session = GameSession::from_fen("2b1k3/8/8/8/8/8/8/3BK3 w - - 0 1").unwrap();
    play(&mut session, &[("e1", "e2")]);

    // c8 and d1 are both light squares.
    let parity = |s: &str| (sq(s).row() + sq(s).col()) % 2;
    assert_eq!(parity("c8"), parity("d1"));
    assert_eq!(session.current().result(), GameResult::Ongoing);
}

#[test]
fn test_new_move_truncates_future() {
    let mut session = GameSession::new();
    play(&mut session, &[("e2", "e4"), ("e7", "e5"), ("g1", "f3")]);
    assert!(session.backward());
    assert!(session.backward());
    assert_eq!(session.cursor(), 1);

    play(&mut session, &[("d7", "d5")]);
    assert_eq!(session.notations(), ["e4", "d5"]);
    assert_eq!(session.notations().len(), session.cursor());
    assert_eq!(session.history().len(), 3);
    assert!(session.is_at_tip());
    assert!(!session.forward());
}

#[test]
fn test_peek_at_cursor_is_idempotent() {
    let mut session = GameSession::new();
    play(&mut session, &[("e2", "e4"), ("e7", "e5"), ("g1", "f3")]);
    session.peek(1);
    session.select(sq("e7"), None);

    let fen = session.export_fen();
    let view = serde_json::to_value(session.view()).unwrap();
    assert!(session.peek(session.cursor()));
    assert_eq!(session.export_fen(), fen);
    assert_eq!(serde_json::to_value(session.view()).unwrap(), view);
    assert!(session.selection().is_some());
}

#[test]
fn test_peek_out_of_range_is_ignored() {
    let mut session = GameSession::new();
    play(&mut session, &[("e2", "e4")]);
    assert!(!session.peek(2));
    assert_eq!(session.cursor(), 1);
}

#[test]
fn test_navigation_does_not_mutate_history() {
    let mut session = GameSession::new();
    play(&mut session, &[("e2", "e4"), ("c7", "c5"), ("g1", "f3")]);
    let history = session.history().to_vec();
    session.peek(0);
    assert_eq!(session.export_fen(), Board::new().to_fen());
    session.forward();
    session.peek(3);
    session.backward();
    assert_eq!(session.history(), history.as_slice());
    assert_eq!(session.notations(), ["e4", "c5", "Nf3"]);
}

#[test]
fn test_fen_round_trip_over_a_game() {
    let session = GameSession::from_pgn(
        "1. e4 c5 2. Nf3 d6 3. d4 cxd4 4. Nxd4 Nf6 5. Nc3 a6 6. Be3 e5 7. Nb3 Be6 \
         8. f3 Be7 9. Qd2 O-O 10. O-O-O Nbd7 11. g4 b5 12. g5 b4 13. Ne2 Ne8 *",
    )
    .unwrap();
    assert_eq!(session.history().len(), 27);
    for board in session.history() {
        let fen = board.to_fen();
        assert_eq!(Board::from_fen(&fen).unwrap().to_fen(), fen);
    }
}

#[test]
fn test_legal_moves_never_expose_own_king() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        "4k3/8/8/8/1b6/8/3P4/4K3 w - - 0 1",
    ];
    for fen in fens {
        let board = Board::from_fen(fen).unwrap();
        let mover = board.side_to_move();
        for mv in board.all_legal_moves() {
            let after = board.apply(mv).unwrap().board;
            assert!(!after.is_check(mover), "{fen}: {mv} leaves the king in check");
        }
    }
}

#[test]
fn test_pinned_piece_cannot_move_off_the_pin() {
    // The d2 pawn is pinned by the b4 bishop.
    let board = Board::from_fen("4k3/8/8/8/1b6/8/3P4/4K3 w - - 0 1").unwrap();
    assert!(board.legal_moves(sq("d2")).is_empty());
}
