//! Shell parse: tokenizes REPL lines and turns them into typed `Command`s,
//! including flag, limit and sort parsing.

use crate::error::InputError;
use crate::query::SortDirection;

/// Verbs recognised at the start of a line (used for completion).
pub const VERBS: [&str; 25] = [
    "search",
    "get",
    "query",
    "cd",
    "back",
    "ls",
    "dir",
    "list",
    "view",
    "show",
    "fields",
    "relationships",
    "related",
    "update",
    "history",
    "parent",
    "ultimateparent",
    "children",
    "describe",
    "objects",
    "select",
    "help",
    "clear",
    "exit",
    "quit",
];

const SEARCH_USAGE: &str = "search <Object> <term> [--limit N] [--fields A, B] [--in A, B]";
const LS_USAGE: &str = "ls [-n N | --limit N | --all] [| sort <Field> [-asc|-desc]]";

/// Where `cd` goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CdTarget {
    /// `..` (repeatable as `../..`)
    Up(usize),
    /// `/`
    Root,
    Relationship(String),
}

/// How many records `ls` asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListLimit {
    #[default]
    Default,
    Count(usize),
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListArgs {
    pub limit: ListLimit,
    pub sort: Option<SortSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchArgs {
    pub object_type: String,
    pub term: String,
    pub limit: Option<usize>,
    /// Columns to return (`--fields`)
    pub fields: Option<Vec<String>>,
    /// Columns the LIKE filter matches (`--in`)
    pub match_fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowTarget {
    All,
    Fields(Vec<String>),
}

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(SearchArgs),
    Get {
        object_type: String,
        record_id: String,
    },
    Query {
        soql: String,
    },
    Cd(CdTarget),
    Ls(ListArgs),
    View,
    Show(ShowTarget),
    Fields,
    Relationships,
    Related(Option<String>),
    Update {
        field: String,
        value: String,
        confirmed: bool,
    },
    History {
        field: Option<String>,
        limit: Option<usize>,
    },
    Parent {
        fields: Vec<String>,
    },
    UltimateParent {
        fields: Vec<String>,
    },
    Children {
        fields: Vec<String>,
    },
    Describe {
        object_type: Option<String>,
    },
    Objects {
        all: bool,
    },
    /// Quick-select by 1-based position (bare number or `select n`)
    Select(usize),
    Help,
    Clear,
    Exit,
}

/// Split a line into tokens. Whitespace separates; a token that starts with
/// `"` or `'` runs to the matching quote; an unquoted `|` is its own token.
pub fn tokenize(line: &str) -> Result<Vec<String>, InputError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted_token = false;

    for c in line.chars() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            '"' | '\'' if current.is_empty() && !quoted_token => {
                quote = Some(c);
                quoted_token = true;
            }
            '|' => {
                flush(&mut tokens, &mut current, &mut quoted_token);
                tokens.push("|".to_string());
            }
            c if c.is_whitespace() => flush(&mut tokens, &mut current, &mut quoted_token),
            c => current.push(c),
        }
    }
    if quote.is_some() {
        return Err(InputError::UnterminatedQuote);
    }
    flush(&mut tokens, &mut current, &mut quoted_token);
    Ok(tokens)
}

fn flush(tokens: &mut Vec<String>, current: &mut String, quoted_token: &mut bool) {
    if !current.is_empty() || *quoted_token {
        tokens.push(std::mem::take(current));
    }
    *quoted_token = false;
}

/// Parse a positive record count.
pub fn parse_limit(raw: &str) -> Result<usize, InputError> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n as usize),
        _ => Err(InputError::InvalidLimit(raw.to_string())),
    }
}

/// Split `A, B C` style field lists on commas and whitespace.
fn field_list<'a, I>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    tokens
        .into_iter()
        .flat_map(|t| t.split(','))
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_flag(token: &str) -> bool {
    token.starts_with("--") || token == "-n" || token == "-y"
}

/// Parse one REPL line. Blank lines parse to `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, InputError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed
            .parse::<usize>()
            .map(|n| Some(Command::Select(n)))
            .map_err(|_| InputError::InvalidNumber(trimmed.to_string()));
    }

    let split_at = trimmed
        .find(|c: char| c.is_whitespace() || c == '|')
        .unwrap_or(trimmed.len());
    let (verb, rest) = trimmed.split_at(split_at);
    let verb = verb.to_ascii_lowercase();

    if verb == "query" {
        let soql = rest.trim();
        if soql.is_empty() {
            return Err(InputError::Usage("query <SOQL>"));
        }
        return Ok(Some(Command::Query {
            soql: soql.to_string(),
        }));
    }

    let args = tokenize(rest)?;
    let command = match verb.as_str() {
        "search" | "find" => Command::Search(parse_search(&args)?),
        "get" => match args.as_slice() {
            [object_type, record_id] => Command::Get {
                object_type: object_type.clone(),
                record_id: record_id.clone(),
            },
            _ => return Err(InputError::Usage("get <Object> <Id>")),
        },
        "cd" => Command::Cd(parse_cd(&args)?),
        "back" => Command::Cd(CdTarget::Up(1)),
        "list" if args.first().is_some_and(|a| a.eq_ignore_ascii_case("objects")) => {
            Command::Objects {
                all: args.iter().skip(1).any(|a| a == "--all"),
            }
        }
        "ls" | "dir" | "list" => Command::Ls(parse_list_args(&args)?),
        "view" => Command::View,
        "show" => match args.as_slice() {
            [] => return Err(InputError::Usage("show <field> [field...] | show all")),
            [only] if only.eq_ignore_ascii_case("all") => Command::Show(ShowTarget::All),
            fields => Command::Show(ShowTarget::Fields(field_list(fields))),
        },
        "fields" => Command::Fields,
        "relationships" | "rels" => Command::Relationships,
        "related" => Command::Related(args.first().cloned()),
        "update" => parse_update(&args)?,
        "history" => parse_history(&args)?,
        "parent" => Command::Parent {
            fields: field_list(&args),
        },
        "ultimateparent" => Command::UltimateParent {
            fields: field_list(&args),
        },
        "children" => Command::Children {
            fields: field_list(&args),
        },
        "describe" => Command::Describe {
            object_type: args.first().cloned(),
        },
        "objects" => Command::Objects {
            all: args.iter().any(|a| a == "--all"),
        },
        "select" => match args.as_slice() {
            [n] => Command::Select(
                n.parse::<usize>()
                    .map_err(|_| InputError::InvalidNumber(n.clone()))?,
            ),
            _ => return Err(InputError::Usage("select <number>")),
        },
        "help" | "?" => Command::Help,
        "clear" | "cls" => Command::Clear,
        "exit" | "quit" | "q" => Command::Exit,
        _ => return Err(InputError::UnknownCommand(verb)),
    };
    Ok(Some(command))
}

fn parse_search(args: &[String]) -> Result<SearchArgs, InputError> {
    let mut positional: Vec<&String> = Vec::new();
    let mut limit = None;
    let mut fields = None;
    let mut match_fields = None;

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-n" | "--limit" => {
                let value = args.get(i + 1).ok_or(InputError::Usage(SEARCH_USAGE))?;
                limit = Some(parse_limit(value)?);
                i += 2;
            }
            "--fields" | "--in" => {
                let end = args[i + 1..]
                    .iter()
                    .position(|a| is_flag(a))
                    .map(|p| i + 1 + p)
                    .unwrap_or(args.len());
                let list = field_list(&args[i + 1..end]);
                if list.is_empty() {
                    return Err(InputError::Usage(SEARCH_USAGE));
                }
                if arg == "--fields" {
                    fields = Some(list);
                } else {
                    match_fields = Some(list);
                }
                i = end;
            }
            _ if arg.starts_with("--limit=") => {
                limit = Some(parse_limit(&arg["--limit=".len()..])?);
                i += 1;
            }
            _ => {
                positional.push(&args[i]);
                i += 1;
            }
        }
    }

    match positional.split_first() {
        Some((object_type, term)) if !term.is_empty() => Ok(SearchArgs {
            object_type: object_type.to_string(),
            term: term
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            limit,
            fields,
            match_fields,
        }),
        _ => Err(InputError::Usage(SEARCH_USAGE)),
    }
}

fn parse_cd(args: &[String]) -> Result<CdTarget, InputError> {
    let [target] = args else {
        return Err(InputError::Usage("cd <relationship> | cd .. | cd /"));
    };
    let target = target.as_str();
    if target == "/" || target == "~" {
        return Ok(CdTarget::Root);
    }
    let segments: Vec<&str> = target.trim_end_matches('/').split('/').collect();
    if segments.iter().all(|s| *s == "..") {
        return Ok(CdTarget::Up(segments.len()));
    }
    Ok(CdTarget::Relationship(target.to_string()))
}

/// `ls` flags and the optional `| sort <Field> [-asc|-desc]` pipe.
pub fn parse_list_args(args: &[String]) -> Result<ListArgs, InputError> {
    let mut parts = args.split(|a| a == "|");
    let flags = parts.next().unwrap_or_default();
    let pipe = parts.next();
    if parts.next().is_some() {
        return Err(InputError::UnsupportedPipe);
    }

    let mut list = ListArgs::default();
    let mut i = 0;
    while i < flags.len() {
        let flag = flags[i].as_str();
        match flag {
            "-n" | "--limit" => {
                let value = flags.get(i + 1).ok_or(InputError::Usage(LS_USAGE))?;
                list.limit = ListLimit::Count(parse_limit(value)?);
                i += 2;
            }
            "--all" | "-a" => {
                list.limit = ListLimit::All;
                i += 1;
            }
            _ if flag.starts_with("--limit=") => {
                list.limit = ListLimit::Count(parse_limit(&flag["--limit=".len()..])?);
                i += 1;
            }
            _ => return Err(InputError::Usage(LS_USAGE)),
        }
    }

    if let Some(pipe) = pipe {
        list.sort = Some(match pipe {
            [verb, field] if verb.eq_ignore_ascii_case("sort") => SortSpec {
                field: field.clone(),
                direction: SortDirection::Asc,
            },
            [verb, field, direction] if verb.eq_ignore_ascii_case("sort") => SortSpec {
                field: field.clone(),
                direction: SortDirection::from_flag(direction)?,
            },
            [verb, ..] if verb.eq_ignore_ascii_case("sort") => {
                return Err(InputError::Usage("ls | sort <Field> [-asc|-desc]"))
            }
            _ => return Err(InputError::UnsupportedPipe),
        });
    }
    Ok(list)
}

fn parse_update(args: &[String]) -> Result<Command, InputError> {
    let confirmed = args.iter().any(|a| a == "-y" || a == "--yes");
    let rest: Vec<&String> = args
        .iter()
        .filter(|a| *a != "-y" && *a != "--yes")
        .collect();
    match rest.split_first() {
        Some((field, value)) if !value.is_empty() => Ok(Command::Update {
            field: field.to_string(),
            value: value
                .iter()
                .map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            confirmed,
        }),
        _ => Err(InputError::Usage("update <field> <value> [--yes]")),
    }
}

fn parse_history(args: &[String]) -> Result<Command, InputError> {
    let mut field = None;
    let mut limit = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-n" | "--limit" => {
                let value = args
                    .get(i + 1)
                    .ok_or(InputError::Usage("history [field] [--limit N]"))?;
                limit = Some(parse_limit(value)?);
                i += 2;
            }
            other if other.starts_with("--limit=") => {
                limit = Some(parse_limit(&other["--limit=".len()..])?);
                i += 1;
            }
            other if field.is_none() => {
                field = Some(other.to_string());
                i += 1;
            }
            _ => return Err(InputError::Usage("history [field] [--limit N]")),
        }
    }
    Ok(Command::History { field, limit })
}
