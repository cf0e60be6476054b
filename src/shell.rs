//! Interactive shell: parse, session (route table), help and the REPL loop.

mod help;
pub mod parse;
pub mod repl;
pub mod session;

pub use help::{banner, help_text};
pub use parse::{parse_line, tokenize, CdTarget, Command, ListArgs, ListLimit, SortSpec};
pub use session::{coerce_value, Confirmer, DialoguerConfirmer, Outcome, Session};
