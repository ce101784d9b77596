//! PGN parsing and export, regex-based.
//!
//! Parsing only splits the text into headers and SAN tokens; the tokens are
//! replayed by the game session through the same path as interactive moves.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::board::Board;
use crate::fen::STANDARD_START_FEN;
use crate::game_data::GameMetadata;
use crate::types::Color;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"((?:[^"\\]|\\.)*)"\]"#).unwrap());
static HEADER_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]*\}").unwrap());
static LINE_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";[^\n]*").unwrap());
static VARIATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^()]*\)").unwrap());
static MOVE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.+").unwrap());

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];
const LINE_WIDTH: usize = 80;

/// Headers and movetext of a single PGN game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPgn {
    pub metadata: GameMetadata,
    /// Start position from a `[FEN]` header, if any.
    pub start_fen: Option<String>,
    pub moves: Vec<String>,
}

/// Split a PGN string into headers and SAN tokens. Never fails: anything that
/// is not a header, comment, variation, number, NAG or result token is
/// returned as a move and judged when it is replayed.
pub fn parse_pgn(pgn: &str) -> ParsedPgn {
    let mut metadata = GameMetadata::unknown();
    let mut start_fen = None;

    for cap in HEADER_RE.captures_iter(pgn) {
        let key = &cap[1];
        let value = unescape(&cap[2]);
        match key {
            "FEN" => start_fen = Some(value),
            // Implied by the presence of FEN.
            "SetUp" => {}
            _ => metadata.set(key, value),
        }
    }

    ParsedPgn {
        metadata,
        start_fen,
        moves: extract_moves(pgn),
    }
}

/// Extract SAN tokens from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_LINE_RE.replace_all(pgn, "");
    let no_comments = COMMENT_RE.replace_all(&no_headers, "");
    let no_comments = LINE_COMMENT_RE.replace_all(&no_comments, "");

    // Innermost first until nothing nests.
    let mut text = no_comments.into_owned();
    loop {
        let stripped = VARIATION_RE.replace_all(&text, "").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }

    text.split_whitespace()
        .map(|token| MOVE_NUMBER_RE.replace(token, ""))
        .filter(|token| !token.is_empty())
        .filter(|token| !RESULT_TOKENS.contains(&token.as_ref()))
        .filter(|token| !token.starts_with('$'))
        .map(|token| token.trim_end_matches(['!', '?']).to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render a game as PGN. `start` is the position before the first SAN in
/// `notations`; a non-standard start adds `SetUp`/`FEN` headers.
pub fn write_pgn(metadata: &GameMetadata, start: &Board, notations: &[String], result: &str) -> String {
    let mut out = String::new();
    for (key, value) in metadata.tags() {
        let value = if key == "Result" { result } else { value };
        let _ = writeln!(out, "[{} \"{}\"]", key, escape(value));
    }
    let start_fen = start.to_fen();
    if start_fen != STANDARD_START_FEN {
        let _ = writeln!(out, "[SetUp \"1\"]");
        let _ = writeln!(out, "[FEN \"{}\"]", start_fen);
    }
    out.push('\n');

    let mut tokens = Vec::with_capacity(notations.len() * 3 / 2 + 1);
    let mut number = start.fullmove_number();
    let mut side = start.side_to_move();
    for (i, san) in notations.iter().enumerate() {
        match side {
            Color::White => tokens.push(format!("{number}.")),
            Color::Black if i == 0 => tokens.push(format!("{number}...")),
            Color::Black => {}
        }
        tokens.push(san.clone());
        if side == Color::Black {
            number += 1;
        }
        side = side.opposite();
    }
    tokens.push(result.to_string());

    let mut line = String::new();
    for token in tokens {
        if !line.is_empty() && line.len() + 1 + token.len() > LINE_WIDTH {
            out.push_str(&line);
            out.push('\n');
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&token);
    }
    out.push_str(&line);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pgn_basic() {
        let pgn = r#"[White "Player1"]
[Black "Player2"]
[Result "1-0"]
[Date "2025.01.15"]
[TimeControl "600"]

1. e4 e5 2. Nf3 Nc6 1-0"#;

        let game = parse_pgn(pgn);
        assert_eq!(game.metadata.white, "Player1");
        assert_eq!(game.metadata.black, "Player2");
        assert_eq!(game.metadata.result, "1-0");
        assert_eq!(game.metadata.date, "2025.01.15");
        assert_eq!(game.metadata.get("TimeControl"), Some("600"));
        assert_eq!(game.start_fen, None);
        assert_eq!(game.moves, vec!["e4", "e5", "Nf3", "Nc6"]);
    }

    #[test]
    fn test_strips_comments_variations_and_nags() {
        let pgn = "1. e4 {best by test} e5 (1... c5 2. Nf3 (2. c3 d5) d6) 2. Nf3 $1 ; a line comment\n\
                   Nc6!? 3.Bb5 a6 *";
        let game = parse_pgn(pgn);
        assert_eq!(game.moves, vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
    }

    #[test]
    fn test_black_continuation_and_fen_header() {
        let pgn = r#"[SetUp "1"]
[FEN "4k3/8/8/8/8/8/4P3/4K3 b - - 0 12"]

12... Kd7 13. e4 *"#;
        let game = parse_pgn(pgn);
        assert_eq!(
            game.start_fen.as_deref(),
            Some("4k3/8/8/8/8/8/4P3/4K3 b - - 0 12")
        );
        assert!(!game.metadata.extra.contains_key("SetUp"));
        assert_eq!(game.moves, vec!["Kd7", "e4"]);
    }

    #[test]
    fn test_escaped_header_value() {
        let game = parse_pgn(r#"[Event "The \"Big\" One"]"#);
        assert_eq!(game.metadata.event, r#"The "Big" One"#);
    }

    #[test]
    fn test_write_pgn_headers_and_numbers() {
        let mut meta = GameMetadata::unknown();
        meta.set("White", "Alice");
        meta.set("ECO", "C20");
        let moves: Vec<String> = ["e4", "e5", "Nf3"].iter().map(|s| s.to_string()).collect();
        let pgn = write_pgn(&meta, &Board::new(), &moves, "*");

        let expected = "[Event \"?\"]\n[Site \"?\"]\n[Date \"????.??.??\"]\n[Round \"?\"]\n\
                        [White \"Alice\"]\n[Black \"?\"]\n[Result \"*\"]\n[ECO \"C20\"]\n\n\
                        1. e4 e5 2. Nf3 *\n";
        assert_eq!(pgn, expected);
    }

    #[test]
    fn test_write_pgn_from_black_start() {
        let start = Board::from_fen("4k3/8/8/8/8/8/4P3/4K3 b - - 0 12").unwrap();
        let moves: Vec<String> = ["Kd7", "e4"].iter().map(|s| s.to_string()).collect();
        let pgn = write_pgn(&GameMetadata::unknown(), &start, &moves, "*");
        assert!(pgn.contains("[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/4P3/4K3 b - - 0 12\"]\n"));
        assert!(pgn.ends_with("\n12... Kd7 13. e4 *\n"));
    }

    #[test]
    fn test_write_pgn_wraps_movetext() {
        let moves: Vec<String> = std::iter::repeat(["Nf3", "Nf6", "Ng1", "Ng8"])
            .take(10)
            .flatten()
            .map(String::from)
            .collect();
        let pgn = write_pgn(&GameMetadata::unknown(), &Board::new(), &moves, "1/2-1/2");
        let movetext = pgn.split("\n\n").nth(1).unwrap();
        assert!(movetext.lines().count() > 1);
        assert!(movetext.lines().all(|line| line.len() <= LINE_WIDTH));
        assert!(movetext.trim_end().ends_with("1/2-1/2"));
    }
}
