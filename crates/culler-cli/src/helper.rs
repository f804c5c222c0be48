use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

const COMMANDS: &[&str] = &[
    "keep", "delete", "undo", "commit", "refresh", "goto", "status", "help", "quit",
];

/// Rustyline helper for the review prompt: completes command words and,
/// after `g`/`goto`, item ids.
#[derive(Clone, Default)]
pub struct ReviewHelper {
    item_ids: Vec<String>,
}

impl ReviewHelper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the ids offered after `goto`.
    pub fn set_item_ids(&mut self, ids: Vec<String>) {
        self.item_ids = ids;
    }

    fn candidates<'a>(&'a self, line: &str) -> (usize, Vec<&'a str>) {
        match line.split_once(' ') {
            Some((verb, partial)) if verb == "g" || verb == "goto" => {
                let start = line.len() - partial.len();
                let ids = self
                    .item_ids
                    .iter()
                    .map(String::as_str)
                    .filter(|id| id.starts_with(partial))
                    .collect();
                (start, ids)
            }
            Some(_) => (0, Vec::new()),
            None => (
                0,
                COMMANDS
                    .iter()
                    .copied()
                    .filter(|cmd| !line.is_empty() && cmd.starts_with(line))
                    .collect(),
            ),
        }
    }
}

impl Helper for ReviewHelper {}

impl Completer for ReviewHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, found) = self.candidates(&line[..pos]);
        let pairs = found
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.to_string(),
                replacement: candidate.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Highlighter for ReviewHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        match line.split_whitespace().next() {
            Some("d" | "delete") => Owned(line.bright_red().to_string()),
            Some("k" | "keep") => Owned(line.bright_green().to_string()),
            Some("c" | "commit") => Owned(line.bright_yellow().to_string()),
            _ => Borrowed(line),
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ReviewHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        let (start, found) = self.candidates(line);
        // Only hint when the prefix picks exactly one candidate.
        match found.as_slice() {
            [only] if only.len() > line.len() - start => {
                Some(only[line.len() - start..].bright_black().to_string())
            }
            _ => None,
        }
    }
}

impl Validator for ReviewHelper {}
