//! Shell help text.

use crate::navigation::ContextFrame;
use owo_colors::OwoColorize;

const SEARCH_AND_NAVIGATION: &[(&str, &str)] = &[
    ("search <Object> <term>", "Search records (--limit N, --fields A, B, --in A, B)"),
    ("get <Object> <Id>", "Open a record by Id"),
    ("query <SOQL>", "Run a raw SOQL query"),
    ("<number>", "Select a record from the last listing"),
    ("select <number>", "Same as typing the number"),
    ("cd <relationship>", "Enter a relationship of the current record and list it"),
    ("cd .. | back", "Go up one level (cd ../.. for two)"),
    ("cd /", "Return to the root"),
    ("ls [-n N | --all]", "List records here (default 10, max 2000)"),
    ("ls | sort <Field> [-desc]", "List sorted by a field"),
];

const RECORD_COMMANDS: &[(&str, &str)] = &[
    ("view", "Show all populated fields of the current record"),
    ("show <field...> | show all", "Show selected fields"),
    ("fields", "List the object's fields"),
    ("relationships", "List navigable relationships"),
    ("related [relationship]", "List relationships, or enter one and list it"),
    ("update <field> <value> [-y]", "Change a field value"),
    ("history [field] [-n N]", "Show field history"),
];

const ACCOUNT_COMMANDS: &[(&str, &str)] = &[
    ("parent [fields]", "Go to the parent account"),
    ("ultimateparent [fields]", "Go to the top of the account hierarchy"),
    ("children [fields]", "List child accounts"),
];

const GENERAL_COMMANDS: &[(&str, &str)] = &[
    ("describe [Object]", "Describe an object's fields and relationships"),
    ("objects [--all] | list objects", "List available objects"),
    ("clear", "Clear the screen"),
    ("help", "Show this help"),
    ("exit | quit", "Leave the shell"),
];

fn section(out: &mut String, title: &str, entries: &[(&str, &str)]) {
    out.push_str(&format!("\n{}\n", title.bold()));
    for (usage, description) in entries {
        out.push_str(&format!("  {:<32} {}\n", usage.cyan(), description));
    }
}

/// Help for the current position; record commands only once a record is selected.
pub fn help_text(current: Option<&ContextFrame>) -> String {
    let mut out = String::from("sfcli: browse Salesforce like a file system\n");
    section(&mut out, "Search & navigation", SEARCH_AND_NAVIGATION);
    if let Some(frame) = current {
        section(
            &mut out,
            &format!("Record commands ({})", frame.object_type),
            RECORD_COMMANDS,
        );
        if frame.object_type.eq_ignore_ascii_case("Account") {
            section(&mut out, "Account hierarchy", ACCOUNT_COMMANDS);
        }
    } else {
        out.push_str("\nSelect a record to see record commands (view, update, history, ...).\n");
    }
    section(&mut out, "General", GENERAL_COMMANDS);
    out.push_str("\nExample:\n  search Account Acme\n  1\n  cd Opportunities\n  ls | sort CloseDate -desc\n");
    out
}

/// Startup banner.
pub fn banner() -> String {
    format!(
        "{}\nType 'help' for commands, 'exit' to quit.",
        "sfcli: interactive Salesforce navigator".bold()
    )
}
