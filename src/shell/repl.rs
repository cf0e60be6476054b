//! REPL loop: line editing, in-memory history and tab completion around a `Session`.

use crate::error::ApiError;
use crate::presentation::error;
use crate::shell::help::banner;
use crate::shell::session::{Outcome, Session};
use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Words the completer offers, refreshed before every prompt.
#[derive(Debug, Default)]
struct CompletionData {
    words: Vec<String>,
}

fn refresh_completion_data(data: &Arc<RwLock<CompletionData>>, session: &Session) {
    let words = session.completion_words();
    match data.write() {
        Ok(mut guard) => guard.words = words,
        Err(poisoned) => poisoned.into_inner().words = words,
    }
}

struct ShellHelper {
    data: Arc<RwLock<CompletionData>>,
}

impl ShellHelper {
    fn new(data: Arc<RwLock<CompletionData>>) -> Self {
        Self { data }
    }

    /// Case-insensitive prefix match.
    fn pairs_from_prefix(items: &[String], prefix: &str) -> Vec<Pair> {
        let prefix = prefix.to_ascii_lowercase();
        items
            .iter()
            .filter(|item| item.to_ascii_lowercase().starts_with(&prefix))
            .map(|item| Pair {
                display: item.clone(),
                replacement: item.clone(),
            })
            .collect()
    }
}

impl Helper for ShellHelper {}

impl Highlighter for ShellHelper {}

impl Hinter for ShellHelper {
    type Hint = String;
    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Validator for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace())
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &line[start..pos];
        let data = match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok((start, Self::pairs_from_prefix(&data.words, word)))
    }
}

/// Run the interactive loop until `exit` or end of input.
///
/// Command errors are printed and the loop continues.
pub fn run(session: &mut Session, show_banner: bool) -> Result<(), ApiError> {
    let data = Arc::new(RwLock::new(CompletionData::default()));
    let mut editor: Editor<ShellHelper, DefaultHistory> = Editor::new().map_err(|e| {
        ApiError::Io(std::io::Error::other(format!(
            "Failed to initialise line editor: {}",
            e
        )))
    })?;
    editor.set_helper(Some(ShellHelper::new(Arc::clone(&data))));

    if show_banner {
        println!("{}\n", banner());
    }

    loop {
        refresh_completion_data(&data, session);

        let line = match editor.readline(&session.prompt()) {
            Ok(line) => line,
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => continue,
            Err(e) => {
                return Err(ApiError::Io(std::io::Error::other(format!(
                    "readline error: {}",
                    e
                ))))
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Err(e) = editor.add_history_entry(line) {
            debug!(error = %e, "failed to record history");
        }

        match session.execute_line(line) {
            Ok(Outcome::Exit) => break,
            Ok(Outcome::Output(text)) if text.is_empty() => {}
            Ok(Outcome::Output(text)) => println!("{}", text),
            Err(e) => eprintln!("{}", error(&e.to_string())),
        }
    }

    println!("{}", "Goodbye!".dimmed());
    Ok(())
}
