//! Tablature stream alignment
//!
//! Raw tab input arrives as one character stream per instrument
//! string. The aligner merges them into synchronized columns: every
//! iteration consumes one token from *every* stream in lock-step, so a
//! resting string can never lag behind a playing one, and bar lines
//! must arrive simultaneously on all strings.
//!
//! Unequal token widths (a two-digit fret against a single dash) are
//! resolved by re-extending the narrower streams: space absorbs into
//! space, a note absorbs adjacent space, and two digit runs
//! concatenate, which is how a two-digit fret typed one digit at a
//! time comes back together.

use std::collections::VecDeque;

use crate::edit::error::TabParseError;
use crate::models::tabline::{TabColumn, TabLine};

/// One raw element of a per-string input stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TabToken {
    /// Rest columns (`-` or blank).
    Space { width: usize },
    /// Measure separator.
    Bar,
    /// Fret digits plus the columns they occupy (absorbing space can
    /// make a note wider than its digits).
    Note { digits: String, width: usize },
}

impl TabToken {
    pub fn width(&self) -> usize {
        match self {
            TabToken::Space { width } => *width,
            TabToken::Bar => 1,
            TabToken::Note { width, .. } => *width,
        }
    }

    fn is_space(&self) -> bool {
        matches!(self, TabToken::Space { .. })
    }

    fn is_bar(&self) -> bool {
        matches!(self, TabToken::Bar)
    }
}

/// Tokenize one string's raw input. Adjacent digits form one note.
pub fn tokenize(input: &str) -> Result<VecDeque<TabToken>, TabParseError> {
    let mut tokens = VecDeque::new();
    let mut digits = String::new();

    for ch in input.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        if !digits.is_empty() {
            let width = digits.len();
            tokens.push_back(TabToken::Note {
                digits: std::mem::take(&mut digits),
                width,
            });
        }
        match ch {
            '-' | ' ' => tokens.push_back(TabToken::Space { width: 1 }),
            '|' => tokens.push_back(TabToken::Bar),
            other => return Err(TabParseError::InvalidToken(other)),
        }
    }
    if !digits.is_empty() {
        let width = digits.len();
        tokens.push_back(TabToken::Note { digits, width });
    }
    Ok(tokens)
}

/// Result of a successful alignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignedTab {
    pub columns: Vec<Option<TabColumn>>,

    /// Columns per measure, taken from the first closed measure;
    /// 0 when the input has no bar lines.
    pub bar_length: usize,
}

impl AlignedTab {
    /// Wrap the aligned columns in a tab line model.
    pub fn into_tab_line(self, tuning: Vec<String>) -> TabLine {
        let mut tab = TabLine::new(tuning);
        tab.columns = self.columns;
        tab.bar_length = self.bar_length;
        tab
    }
}

/// Merge `next` onto `token`, left to right.
fn extend(token: TabToken, next: TabToken) -> Result<TabToken, TabParseError> {
    match (token, next) {
        (_, TabToken::Bar) | (TabToken::Bar, _) => Err(TabParseError::BarUnaligned),
        (TabToken::Space { width: a }, TabToken::Space { width: b }) => {
            Ok(TabToken::Space { width: a + b })
        }
        (TabToken::Space { width: a }, TabToken::Note { digits, width }) => Ok(TabToken::Note {
            digits,
            width: a + width,
        }),
        (TabToken::Note { digits, width }, TabToken::Space { width: b }) => Ok(TabToken::Note {
            digits,
            width: width + b,
        }),
        (
            TabToken::Note {
                digits: mut a,
                width: wa,
            },
            TabToken::Note { digits: b, width: wb },
        ) => {
            a.push_str(&b);
            Ok(TabToken::Note {
                digits: a,
                width: wa + wb,
            })
        }
    }
}

/// Align one token stream per string into synchronized columns.
pub fn align(mut streams: Vec<VecDeque<TabToken>>) -> Result<AlignedTab, TabParseError> {
    let strings = streams.len();
    let mut columns: Vec<Option<TabColumn>> = Vec::new();
    let mut bar_length = 0usize;
    let mut since_bar = 0usize;

    loop {
        let exhausted = streams.iter().filter(|s| s.is_empty()).count();
        if exhausted == strings {
            break;
        }
        if exhausted > 0 {
            return Err(TabParseError::RaggedStreams);
        }

        let mut row: Vec<TabToken> = Vec::with_capacity(strings);
        for stream in &mut streams {
            row.push(stream.pop_front().ok_or(TabParseError::RaggedStreams)?);
        }

        let bars = row.iter().filter(|t| t.is_bar()).count();
        if bars == strings {
            // A measure closed on every string at once. The first
            // closure fixes the bar length.
            if bar_length == 0 {
                bar_length = since_bar;
                log::debug!("tab alignment: bar length {bar_length}");
            }
            since_bar = 0;
            continue;
        }
        if bars > 0 {
            return Err(TabParseError::BarUnaligned);
        }

        // Re-extend narrower streams until the whole row agrees on a
        // width. Rows mixing rests and notes are consumed in the same
        // lock-step as any other row, keeping resting strings aligned
        // with playing ones.
        loop {
            let target = row.iter().map(TabToken::width).max().unwrap_or(0);
            if row.iter().all(|t| t.width() == target) {
                break;
            }
            for (token, stream) in row.iter_mut().zip(&mut streams) {
                while token.width() < target {
                    let next = stream.pop_front().ok_or(TabParseError::RaggedStreams)?;
                    let merged = extend(std::mem::replace(token, TabToken::Bar), next)?;
                    *token = merged;
                }
            }
        }

        since_bar += 1;
        if row.iter().all(TabToken::is_space) {
            columns.push(None);
        } else {
            let mut column = TabColumn::new(strings);
            for (string, token) in row.iter().enumerate() {
                if let TabToken::Note { digits, .. } = token {
                    let fret: u8 = digits
                        .parse()
                        .ok()
                        .filter(|f| *f < 100)
                        .ok_or_else(|| TabParseError::FretTooLarge(digits.clone()))?;
                    column.notes[string] = Some(fret);
                }
            }
            columns.push(Some(column));
        }
    }

    Ok(AlignedTab {
        columns,
        bar_length,
    })
}

/// Tokenize and align raw per-string input in one step.
pub fn align_strings(inputs: &[&str]) -> Result<AlignedTab, TabParseError> {
    let streams = inputs
        .iter()
        .map(|s| tokenize(s))
        .collect::<Result<Vec<_>, _>>()?;
    align(streams)
}
