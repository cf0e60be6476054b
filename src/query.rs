//! Query Builder
//!
//! Turns typed query parts into SOQL and SOSL text. Identifiers (object and
//! field names) are validated; values only ever enter a statement through
//! [`quote_literal`] or [`like_pattern`], which escape them for the target
//! syntax. Nothing here talks to the network.

use crate::error::InputError;
use std::fmt::Write as _;

/// Sort direction for `ORDER BY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse a `-asc` / `-desc` flag (leading dashes optional, case-insensitive).
    pub fn from_flag(flag: &str) -> Result<Self, InputError> {
        match flag.trim_start_matches('-').to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(InputError::InvalidSortOrder(flag.to_string())),
        }
    }

    pub fn as_soql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Check an object or field name: `[A-Za-z0-9_]` segments joined by `.`.
pub fn validate_identifier(name: &str) -> Result<&str, InputError> {
    let valid = !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(name)
    } else {
        Err(InputError::InvalidIdentifier(name.to_string()))
    }
}

fn escape_soql(value: &str, escape_wildcards: bool) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '%' if escape_wildcards => out.push_str("\\%"),
            '_' if escape_wildcards => out.push_str("\\_"),
            other => out.push(other),
        }
    }
    out
}

/// Render a string value as a quoted SOQL literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_soql(value, false))
}

/// Render a free-text term as a quoted `LIKE '%term%'` pattern.
pub fn like_pattern(term: &str) -> String {
    format!("'%{}%'", escape_soql(term, true))
}

/// A `WHERE` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `f1 LIKE '%term%' OR f2 LIKE '%term%' ...`
    Like { fields: Vec<String>, term: String },
    /// `field = 'value'`
    Eq { field: String, value: String },
    /// Conjunction of filters
    And(Vec<Filter>),
}

impl Filter {
    pub fn like(fields: Vec<String>, term: impl Into<String>) -> Self {
        Filter::Like {
            fields,
            term: term.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    fn render(&self) -> Result<String, InputError> {
        match self {
            Filter::Like { fields, term } => {
                if fields.is_empty() {
                    return Err(InputError::Usage("search needs at least one field to match"));
                }
                let pattern = like_pattern(term);
                let parts = fields
                    .iter()
                    .map(|f| Ok(format!("{} LIKE {}", validate_identifier(f)?, pattern)))
                    .collect::<Result<Vec<_>, InputError>>()?;
                if parts.len() == 1 {
                    Ok(parts.into_iter().collect())
                } else {
                    Ok(format!("({})", parts.join(" OR ")))
                }
            }
            Filter::Eq { field, value } => Ok(format!(
                "{} = {}",
                validate_identifier(field)?,
                quote_literal(value)
            )),
            Filter::And(filters) => {
                let parts = filters
                    .iter()
                    .map(Filter::render)
                    .collect::<Result<Vec<_>, InputError>>()?;
                Ok(parts.join(" AND "))
            }
        }
    }
}

/// One SOQL statement, constructed per command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub object_type: String,
    pub filter: Option<Filter>,
    pub fields: Vec<String>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<usize>,
}

impl QuerySpec {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            filter: None,
            fields: vec!["Id".to_string()],
            order_by: None,
            limit: None,
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `SELECT ... FROM ... [WHERE ...] [ORDER BY ...] [LIMIT n]`
    pub fn to_soql(&self) -> Result<String, InputError> {
        let fields = dedup_fields(&self.fields)?;
        let mut soql = format!(
            "SELECT {} FROM {}",
            fields.join(", "),
            validate_identifier(&self.object_type)?
        );
        if let Some(filter) = &self.filter {
            let _ = write!(soql, " WHERE {}", filter.render()?);
        }
        if let Some((field, direction)) = &self.order_by {
            let _ = write!(
                soql,
                " ORDER BY {} {}",
                validate_identifier(field)?,
                direction.as_soql()
            );
        }
        if let Some(limit) = self.limit {
            let _ = write!(soql, " LIMIT {}", limit);
        }
        Ok(soql)
    }

    /// `SELECT COUNT() FROM ... [WHERE ...]`, ignoring fields, order and limit.
    pub fn to_count_soql(&self) -> Result<String, InputError> {
        let mut soql = format!(
            "SELECT COUNT() FROM {}",
            validate_identifier(&self.object_type)?
        );
        if let Some(filter) = &self.filter {
            let _ = write!(soql, " WHERE {}", filter.render()?);
        }
        Ok(soql)
    }
}

/// Validate and de-duplicate a field list (case-insensitive), keeping first occurrence.
fn dedup_fields(fields: &[String]) -> Result<Vec<&str>, InputError> {
    if fields.is_empty() {
        return Err(InputError::Usage("a query needs at least one field"));
    }
    let mut seen: Vec<String> = Vec::with_capacity(fields.len());
    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        let field = validate_identifier(field)?;
        let key = field.to_ascii_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            out.push(field);
        }
    }
    Ok(out)
}

/// Name-field search: `LIKE` across `match_fields`, ordered by the name field.
pub fn search_spec(
    object_type: &str,
    term: &str,
    match_fields: Vec<String>,
    return_fields: Vec<String>,
    name_field: &str,
    limit: usize,
) -> QuerySpec {
    QuerySpec::new(object_type)
        .fields(return_fields)
        .filter(Filter::like(match_fields, term))
        .order_by(name_field, SortDirection::Asc)
        .limit(limit)
}

/// Records of `object_type` whose `link_field` points at `parent_id`.
pub fn related_spec(
    object_type: &str,
    link_field: &str,
    parent_id: &str,
    fields: Vec<String>,
    order: Option<(String, SortDirection)>,
    limit: usize,
) -> QuerySpec {
    let mut spec = QuerySpec::new(object_type)
        .fields(fields)
        .filter(Filter::eq(link_field, parent_id))
        .limit(limit);
    if let Some((field, direction)) = order {
        spec = spec.order_by(field, direction);
    }
    spec
}

/// A single record by id with selected fields.
pub fn record_by_id_spec(object_type: &str, record_id: &str, fields: Vec<String>) -> QuerySpec {
    QuerySpec::new(object_type)
        .fields(fields)
        .filter(Filter::eq("Id", record_id))
}

/// Field history from `<Object>History`, newest first.
pub fn history_spec(
    object_type: &str,
    record_id: &str,
    field: Option<&str>,
    limit: usize,
) -> QuerySpec {
    let parent_filter = Filter::eq(format!("{}Id", object_type), record_id);
    let filter = match field {
        Some(field) => Filter::And(vec![parent_filter, Filter::eq("Field", field)]),
        None => parent_filter,
    };
    QuerySpec::new(format!("{}History", object_type))
        .fields([
            "Id",
            "Field",
            "OldValue",
            "NewValue",
            "CreatedDate",
            "CreatedBy.Name",
        ])
        .filter(filter)
        .order_by("CreatedDate", SortDirection::Desc)
        .limit(limit)
}

/// Child accounts of an account, ordered by name.
pub fn child_accounts_spec(account_id: &str, fields: Vec<String>, limit: usize) -> QuerySpec {
    QuerySpec::new("Account")
        .fields(fields)
        .filter(Filter::eq("ParentId", account_id))
        .order_by("Name", SortDirection::Asc)
        .limit(limit)
}

const SOSL_RESERVED: &[char] = &[
    '?', '&', '|', '!', '{', '}', '[', ']', '(', ')', '^', '~', '*', ':', '\\', '"', '\'', '+',
    '-',
];

/// Escape a term for use inside `FIND {...}`. Multi-word terms become a phrase.
pub fn sosl_term(term: &str) -> String {
    let trimmed = term.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(trimmed);
    let mut escaped = String::with_capacity(unquoted.len());
    for c in unquoted.chars() {
        if SOSL_RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    if unquoted.chars().any(char::is_whitespace) || unquoted.len() != trimmed.len() {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}

/// `FIND {term} IN ALL FIELDS RETURNING Object(fields ORDER BY name LIMIT n)`
pub fn build_sosl(
    object_type: &str,
    term: &str,
    fields: &[String],
    order_field: &str,
    limit: usize,
) -> Result<String, InputError> {
    let fields = dedup_fields(fields)?;
    Ok(format!(
        "FIND {{{}}} IN ALL FIELDS RETURNING {}({} ORDER BY {} LIMIT {})",
        sosl_term(term),
        validate_identifier(object_type)?,
        fields.join(", "),
        validate_identifier(order_field)?,
        limit
    ))
}
