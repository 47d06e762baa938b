//! Styled terminal output for the importer's progress reporting.
//!
//! Status lines carry a coloured glyph. Failures go to stderr so a
//! redirected stdout keeps only the progress log.

use owo_colors::OwoColorize;

const MUTED: (u8, u8, u8) = (160, 160, 160);
const HEADER: (u8, u8, u8) = (181, 174, 254);
const RULE_WIDTH: usize = 50;

/// Kind of status line, each with its own glyph and colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Done,
    Failed,
    Caution,
    Note,
}

impl Tone {
    fn glyph(self) -> &'static str {
        match self {
            Tone::Done => "✓",
            Tone::Failed => "✗",
            Tone::Caution => "⚠",
            Tone::Note => "ℹ",
        }
    }

    fn rgb(self) -> (u8, u8, u8) {
        match self {
            Tone::Done => (152, 225, 152),
            Tone::Failed => (255, 160, 160),
            Tone::Caution => (255, 230, 160),
            Tone::Note => (160, 200, 255),
        }
    }
}

/// Print one status line in the given tone
pub fn status(tone: Tone, message: &str) {
    let (r, g, b) = tone.rgb();
    let line = format!("{} {}", tone.glyph().truecolor(r, g, b).bold(), message.bright_white());
    match tone {
        Tone::Failed => eprintln!("{}", line),
        _ => println!("{}", line),
    }
}

/// Family banner: a title over a horizontal rule
pub fn section(title: &str) {
    let (r, g, b) = HEADER;
    println!("\n{}", title.truecolor(r, g, b).bold());
    println!("{}", muted(&"─".repeat(RULE_WIDTH)));
}

pub fn key_value(key: &str, value: &str) {
    println!("  {} {}", muted(&format!("{}:", key)), value.bright_white());
}

/// Per-record chatter such as "Importing ..." and "Skipping ..."
pub fn dimmed(message: &str) {
    println!("{}", muted(message));
}

pub fn blank() {
    println!();
}

fn muted(text: &str) -> String {
    let (r, g, b) = MUTED;
    text.truecolor(r, g, b).to_string()
}
