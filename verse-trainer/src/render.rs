//! Text rendering of a learning session for the terminal

use verse_common::learning::{Cell, LearningSession};
use verse_common::model::Round;

const HIDDEN: char = '_';

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const UNDERLINE: &str = "\x1b[4m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Use ANSI colors instead of marker lines
    pub ansi: bool,
    /// Prefix each word with its 1-based number (round 2)
    pub numbered: bool,
}

/// Status line: round, stanza, repeat, overall percentage
pub fn status_line(session: &LearningSession) -> String {
    let mut line = format!(
        "Round {}/2 | Stanza {}/{} | Repeat {}/3 | {:.0}%",
        session.round(),
        session.stanza_index() + 1,
        session.stanza_count(),
        session.repeat_count() + 1,
        session.progress_percent(),
    );
    if session.round() == Round::Second && session.try_number() > 0 {
        line.push_str(&format!(" | Try {}", session.try_number() + 1));
    }
    line
}

/// Render the current stanza
///
/// Without ANSI, a marker line follows each text line: `^` under the cursor
/// and `x` under wrong chars.
pub fn render_stanza(session: &LearningSession, options: RenderOptions) -> String {
    let cells = session.cells();
    let chars: Vec<char> = session.current_stanza().chars().collect();

    let mut out = String::new();
    let mut text = String::new();
    let mut marks = String::new();
    let mut word = 0;

    for (pos, cell) in cells.iter().enumerate() {
        let ch = chars.get(pos).copied().unwrap_or(' ');
        if ch == '\n' {
            flush_line(&mut out, &mut text, &mut marks, options.ansi);
            continue;
        }

        let starts_word = !ch.is_whitespace()
            && (pos == 0 || chars.get(pos - 1).map_or(true, |c| c.is_whitespace()));
        if starts_word {
            word += 1;
            if options.numbered {
                let label = format!("{}:", word);
                marks.push_str(&" ".repeat(label.chars().count()));
                text.push_str(&label);
            }
        }

        let (glyph, mark) = glyph(cell);
        if options.ansi {
            text.push_str(&styled(cell, glyph));
        } else {
            text.push(glyph);
        }
        marks.push(mark);
    }
    flush_line(&mut out, &mut text, &mut marks, options.ansi);
    out
}

fn glyph(cell: &Cell) -> (char, char) {
    let cursor = if cell.is_current() { '^' } else { ' ' };
    match *cell {
        Cell::Plain(ch) => (ch, ' '),
        Cell::Typed { ch, correct: true } => (ch, ' '),
        Cell::Typed { ch, correct: false } => (ch, 'x'),
        Cell::Pending { ch, .. } | Cell::Visible { ch, .. } | Cell::Hinted { ch, .. } => (ch, cursor),
        Cell::Hidden { .. } => (HIDDEN, cursor),
    }
}

fn styled(cell: &Cell, glyph: char) -> String {
    let mut style = String::new();
    match cell {
        Cell::Typed { correct: true, .. } => style.push_str(GREEN),
        Cell::Typed { correct: false, .. } => style.push_str(RED),
        Cell::Hinted { .. } | Cell::Hidden { .. } => style.push_str(DIM),
        _ => {}
    }
    if cell.is_current() {
        style.push_str(UNDERLINE);
    }
    if style.is_empty() {
        glyph.to_string()
    } else {
        format!("{}{}{}", style, glyph, RESET)
    }
}

fn flush_line(out: &mut String, text: &mut String, marks: &mut String, ansi: bool) {
    out.push_str(text);
    out.push('\n');
    if !ansi && !marks.trim().is_empty() {
        out.push_str(marks.trim_end());
        out.push('\n');
    }
    text.clear();
    marks.clear();
}
