//! Shell session: navigation state plus the single route table for shell commands.
//!
//! A `Session` owns the CRM client, the schema cache, the navigation stack and
//! the current Result Set. Every handler returns rendered text or an error;
//! nothing here prints.

use crate::config::{SearchStrategy, ShellConfig};
use crate::crm::client::CrmClient;
use crate::crm::schema::{filter_objects, SchemaCache};
use crate::crm::types::{display_value, Record};
use crate::error::{ApiError, CrmError, InputError, NavigationError};
use crate::navigation::{ActiveRelationship, ContextFrame, Navigator, ResultSet};
use crate::presentation::{
    format_describe, format_field_table, format_fields, format_history, format_objects,
    format_query_result, format_record, format_relationships, format_result_set, info, success,
    warning,
};
use crate::query::{
    build_sosl, child_accounts_spec, history_spec, record_by_id_spec, related_spec, search_spec,
    validate_identifier,
};
use crate::shell::help::help_text;
use crate::shell::parse::{
    parse_line, CdTarget, Command, ListArgs, ListLimit, SearchArgs, ShowTarget, VERBS,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Columns shown after moving to a parent account.
const ACCOUNT_SUMMARY_FIELDS: [&str; 5] = [
    "Id",
    "Name",
    "ShippingStreet",
    "ShippingCity",
    "ShippingState",
];

/// Columns fetched for child-account listings.
const CHILD_ACCOUNT_FIELDS: [&str; 6] = [
    "Id",
    "ParentId",
    "Name",
    "ShippingStreet",
    "ShippingCity",
    "ShippingState",
];

/// Columns per related listing.
const RELATED_LIST_COLUMNS: usize = 5;

const COMPLETION_OBJECTS: [&str; 8] = [
    "Account",
    "Contact",
    "Opportunity",
    "Lead",
    "Case",
    "Task",
    "Event",
    "User",
];

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// Asks the user to confirm a write.
pub trait Confirmer {
    fn confirm(&self, prompt: &str) -> Result<bool, ApiError>;
}

/// Terminal confirmation prompt (defaults to no).
pub struct DialoguerConfirmer;

impl Confirmer for DialoguerConfirmer {
    fn confirm(&self, prompt: &str) -> Result<bool, ApiError> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| {
                ApiError::Io(std::io::Error::other(format!(
                    "Failed to get user input: {}",
                    e
                )))
            })
    }
}

/// What the REPL should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    Exit,
}

/// Interactive shell state
pub struct Session {
    client: Box<dyn CrmClient>,
    schema: SchemaCache,
    nav: Navigator,
    /// Full records fetched this session, by Id
    records: HashMap<String, Record>,
    config: ShellConfig,
    confirmer: Box<dyn Confirmer>,
}

/// Interpret `raw` with the type of the field's current value.
///
/// Booleans accept true/1/yes/t/y; numbers fall back to text when unparseable.
pub fn coerce_value(raw: &str, current: &Value) -> Value {
    match current {
        Value::Bool(_) => Value::Bool(matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "t" | "y"
        )),
        Value::Number(n) if n.is_i64() || n.is_u64() => match raw.trim().parse::<i64>() {
            Ok(i) => Value::from(i),
            Err(_) => coerce_float(raw),
        },
        Value::Number(_) => coerce_float(raw),
        _ => Value::String(raw.to_string()),
    }
}

fn coerce_float(raw: &str) -> Value {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

impl Session {
    pub fn new(client: Box<dyn CrmClient>, config: ShellConfig) -> Self {
        Self {
            client,
            schema: SchemaCache::new(),
            nav: Navigator::new(),
            records: HashMap::new(),
            config,
            confirmer: Box::new(DialoguerConfirmer),
        }
    }

    pub fn with_confirmer(mut self, confirmer: Box<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn prompt(&self) -> String {
        self.nav.prompt()
    }

    /// Parse and run one input line.
    pub fn execute_line(&mut self, line: &str) -> Result<Outcome, ApiError> {
        match parse_line(line)? {
            Some(command) => self.execute(command),
            None => Ok(Outcome::Output(String::new())),
        }
    }

    /// Execute a shell command via the single route table.
    pub fn execute(&mut self, command: Command) -> Result<Outcome, ApiError> {
        debug!(command = ?command, depth = self.nav.depth(), "dispatch");
        let output = match command {
            Command::Search(args) => self.handle_search(args),
            Command::Get {
                object_type,
                record_id,
            } => self.handle_get(&object_type, &record_id),
            Command::Query { soql } => self.handle_query(&soql),
            Command::Cd(target) => self.handle_cd(target),
            Command::Ls(args) => self.handle_ls(args),
            Command::View => self.handle_view(),
            Command::Show(target) => self.handle_show(target),
            Command::Fields => self.handle_fields(),
            Command::Relationships => self.handle_relationships(),
            Command::Related(name) => self.handle_related(name),
            Command::Update {
                field,
                value,
                confirmed,
            } => self.handle_update(&field, &value, confirmed),
            Command::History { field, limit } => self.handle_history(field, limit),
            Command::Parent { fields } => self.handle_parent(fields, false),
            Command::UltimateParent { fields } => self.handle_parent(fields, true),
            Command::Children { fields } => self.handle_children(fields),
            Command::Describe { object_type } => self.handle_describe(object_type),
            Command::Objects { all } => self.handle_objects(all),
            Command::Select(index) => self.handle_select(index),
            Command::Help => Ok(help_text(self.nav.current())),
            Command::Clear => Ok(CLEAR_SCREEN.to_string()),
            Command::Exit => return Ok(Outcome::Exit),
        };
        if let Err(e) = &output {
            debug!(error = %e, "command failed");
        }
        output.map(Outcome::Output)
    }

    /// Words offered by tab completion: verbs, common objects, and the current
    /// record's relationships and fields (from cache only).
    pub fn completion_words(&self) -> Vec<String> {
        let mut words: Vec<String> = VERBS.iter().map(|v| v.to_string()).collect();
        words.extend(COMPLETION_OBJECTS.iter().map(|o| o.to_string()));
        if let Some(frame) = self.nav.current() {
            if let Some(describe) = self.schema.cached(&frame.object_type) {
                words.extend(
                    describe
                        .child_relationships
                        .iter()
                        .filter_map(|r| r.relationship_name.clone()),
                );
                words.extend(describe.fields.iter().map(|f| f.name.clone()));
            } else if let Some(record) = self.records.get(&frame.record_id) {
                words.extend(record.field_names().map(str::to_string));
            }
        }
        words.sort();
        words.dedup();
        words
    }

    fn current_frame(&self) -> Result<ContextFrame, NavigationError> {
        self.nav
            .current()
            .cloned()
            .ok_or(NavigationError::NoRecordSelected)
    }

    fn location(&self) -> String {
        if self.nav.stack().is_root() {
            "root".to_string()
        } else {
            self.nav.stack().breadcrumb().join(" / ")
        }
    }

    /// Full record, from this session's cache when already fetched.
    fn load_record(&mut self, object_type: &str, record_id: &str) -> Result<Record, ApiError> {
        if let Some(record) = self.records.get(record_id) {
            return Ok(record.clone());
        }
        let record = self.client.get_record(object_type, record_id)?;
        self.records.insert(record_id.to_string(), record.clone());
        Ok(record)
    }

    /// Push a record frame for a fetched record.
    fn enter_record(&mut self, object_type: &str, record: Record) -> ContextFrame {
        let record_id = record.id().unwrap_or_default().to_string();
        let frame = ContextFrame::record(object_type, record_id.clone(), record.display_name());
        self.records.insert(record_id, record);
        self.nav.enter(frame.clone());
        frame
    }

    fn require_account(
        &self,
        command: &'static str,
    ) -> Result<ContextFrame, NavigationError> {
        let frame = self.current_frame()?;
        if frame.object_type.eq_ignore_ascii_case("Account") {
            Ok(frame)
        } else {
            Err(NavigationError::AccountOnly {
                command,
                object: frame.object_type,
            })
        }
    }

    fn handle_search(&mut self, args: SearchArgs) -> Result<String, ApiError> {
        let object_type = validate_identifier(&args.object_type)?.to_string();
        let name_field = self.schema.name_field(self.client.as_ref(), &object_type)?;
        let limit = self
            .config
            .clamp_limit(args.limit.unwrap_or(self.config.search_limit));

        let mut fields = vec!["Id".to_string()];
        match (&args.fields, self.config.search_fields_for(&object_type)) {
            (Some(requested), _) => fields.extend(requested.iter().cloned()),
            (None, Some(configured)) => fields.extend(configured.iter().cloned()),
            (None, None) => fields.push(name_field.clone()),
        }
        let match_fields = args
            .match_fields
            .clone()
            .unwrap_or_else(|| vec![name_field.clone()]);
        let like = search_spec(
            &object_type,
            &args.term,
            match_fields,
            fields.clone(),
            &name_field,
            limit,
        );

        let mut found = None;
        if self.config.search_strategy == SearchStrategy::Sosl && args.match_fields.is_none() {
            let sosl = build_sosl(&object_type, &args.term, &fields, &name_field, limit)?;
            match self.client.search(&sosl) {
                Ok(records) if !records.is_empty() => found = Some(records),
                Ok(_) => debug!("SOSL returned nothing, falling back to LIKE"),
                Err(e) => warn!(error = %e, "SOSL search failed, falling back to LIKE"),
            }
        }
        let records = match found {
            Some(records) => records,
            None => self.client.query(&like.to_soql()?)?.records,
        };
        let total = match self.client.query(&like.to_count_soql()?) {
            Ok(count) => count.total_size,
            Err(e) => {
                warn!(error = %e, "count query failed");
                records.len()
            }
        };

        self.nav.reset();
        if records.is_empty() {
            return Ok(info(&format!(
                "No {} records found matching '{}'.",
                object_type, args.term
            )));
        }
        let results = ResultSet::new(
            object_type.as_str(),
            format!("{} matching '{}'", object_type, args.term),
            records,
        )
        .with_total(total);
        let out = format!(
            "{}\n{}",
            format_result_set(&results, None),
            info("Type a number to select a record.")
        );
        self.nav.set_results(results);
        Ok(out)
    }

    fn handle_get(&mut self, object_type: &str, record_id: &str) -> Result<String, ApiError> {
        let object_type = validate_identifier(object_type)?;
        let record_id = validate_identifier(record_id)?;
        let record = self.client.get_record(object_type, record_id)?;
        let object_type = record.object_type().unwrap_or(object_type).to_string();
        let rendered = format_record(&record, &object_type, self.client.instance_url());
        self.enter_record(&object_type, record);
        Ok(rendered)
    }

    fn handle_query(&mut self, soql: &str) -> Result<String, ApiError> {
        let result = self.client.query(soql)?;
        let out = format_query_result(&result.records, result.total_size);

        let object_type = result
            .records
            .first()
            .and_then(|r| r.object_type())
            .map(str::to_string);
        let selectable = result.records.iter().all(|r| r.id().is_some());
        match object_type {
            Some(object_type) if selectable => {
                self.nav.set_results(
                    ResultSet::new(object_type, "Query Results", result.records)
                        .with_total(result.total_size),
                );
                Ok(format!("{}\n{}", out, info("Type a number to select a record.")))
            }
            _ => Ok(out),
        }
    }

    fn handle_cd(&mut self, target: CdTarget) -> Result<String, ApiError> {
        match target {
            CdTarget::Up(levels) => {
                let mut moved = 0;
                while moved < levels && self.nav.leave() {
                    moved += 1;
                }
                if moved == 0 {
                    return Ok(info("Already at root level."));
                }
                let mut out = info(&format!("Now at {}", self.location()));
                if let Some(results) = self.nav.results() {
                    out.push('\n');
                    out.push_str(&info(&format!(
                        "{} record(s) from '{}' available. Use 'ls' to list them.",
                        results.len(),
                        results.title
                    )));
                }
                Ok(out)
            }
            CdTarget::Root => {
                self.nav.reset();
                Ok(info("Returned to root."))
            }
            CdTarget::Relationship(name) => {
                let frame = self.current_frame()?;
                let relationship = self.schema.resolve_relationship(
                    self.client.as_ref(),
                    &frame.object_type,
                    &name,
                )?;
                let entered = frame.enter_relationship(ActiveRelationship {
                    name: relationship.name,
                    child_object: relationship.child_object,
                    link_field: relationship.link_field,
                });
                self.nav.enter(entered.clone());
                let moved = info(&format!("Now in {}", self.location()));
                match self.list_related(&entered, ListArgs::default()) {
                    Ok(listing) => Ok(format!("{}\n{}", moved, listing)),
                    Err(e) => {
                        warn!(error = %e, "related records not loaded on cd");
                        Ok(format!(
                            "{}\n{}",
                            moved,
                            warning(&format!("Could not load records: {}. Try 'ls'.", e))
                        ))
                    }
                }
            }
        }
    }

    fn handle_ls(&mut self, args: ListArgs) -> Result<String, ApiError> {
        if let Some(frame) = self.nav.current().filter(|f| f.is_relationship()).cloned() {
            return self.list_related(&frame, args);
        }
        if let Some(results) = self.nav.results_mut() {
            if let Some(sort) = &args.sort {
                results.sort_by_field(&sort.field, sort.direction)?;
            }
            let rows = match args.limit {
                ListLimit::Count(n) => Some(n),
                ListLimit::Default | ListLimit::All => None,
            };
            return Ok(format_result_set(results, rows));
        }
        match self.nav.current().cloned() {
            Some(_) => self.handle_relationships(),
            None => Ok(info(
                "Nothing to list. Use 'search <Object> <term>' to find records.",
            )),
        }
    }

    fn list_related(&mut self, frame: &ContextFrame, args: ListArgs) -> Result<String, ApiError> {
        let Some(relationship) = frame.relationship.as_ref() else {
            return Err(NavigationError::NoRecordSelected.into());
        };
        let limit = match args.limit {
            ListLimit::Default => self.config.default_list_size,
            ListLimit::Count(n) => self.config.clamp_limit(n),
            ListLimit::All => self.config.max_limit,
        };
        let fields = self.schema.query_fields(
            self.client.as_ref(),
            &relationship.child_object,
            RELATED_LIST_COLUMNS,
        )?;
        let order = args.sort.map(|s| (s.field, s.direction));
        let spec = related_spec(
            &relationship.child_object,
            &relationship.link_field,
            &frame.record_id,
            fields,
            order,
            limit,
        );
        let result = self.client.query(&spec.to_soql()?)?;
        let results = ResultSet::new(
            relationship.child_object.as_str(),
            format!("{} for {}", relationship.name, frame.display_name),
            result.records,
        );
        let out = if results.is_empty() {
            info(&format!(
                "No {} found for {}.",
                relationship.name, frame.display_name
            ))
        } else {
            format!(
                "{}\n{}",
                format_result_set(&results, None),
                info("Type a number to select a record.")
            )
        };
        self.nav.set_results(results);
        Ok(out)
    }

    fn handle_view(&mut self) -> Result<String, ApiError> {
        let frame = self.current_frame()?;
        let record = self.load_record(&frame.object_type, &frame.record_id)?;
        Ok(format_record(
            &record,
            &frame.object_type,
            self.client.instance_url(),
        ))
    }

    fn handle_show(&mut self, target: ShowTarget) -> Result<String, ApiError> {
        let requested = match target {
            ShowTarget::All => return self.handle_view(),
            ShowTarget::Fields(fields) => fields,
        };
        let frame = self.current_frame()?;
        let record = self.load_record(&frame.object_type, &frame.record_id)?;

        let mut rows = Vec::new();
        let mut missing = Vec::new();
        for name in &requested {
            let found = if name.contains('.') {
                record.get(name).map(|v| (name.clone(), v))
            } else {
                record.find_field(name).map(|(k, v)| (k.to_string(), v))
            };
            match found {
                Some((field, value)) => rows.push((field, display_value(value))),
                None => missing.push(name.clone()),
            }
        }
        if rows.is_empty() {
            return Err(NavigationError::UnknownField(missing.join(", ")).into());
        }
        let mut out = format_field_table(
            &format!("{}: {}", frame.object_type, frame.display_name),
            &rows,
        );
        if !missing.is_empty() {
            out.push('\n');
            out.push_str(&warning(&format!(
                "Fields not found: {}",
                missing.join(", ")
            )));
        }
        Ok(out)
    }

    fn handle_fields(&mut self) -> Result<String, ApiError> {
        let frame = self.current_frame()?;
        let record = self.load_record(&frame.object_type, &frame.record_id)?;
        let describe = self
            .schema
            .describe(self.client.as_ref(), &frame.object_type)?;
        Ok(format_fields(describe, Some(&record)))
    }

    fn handle_relationships(&mut self) -> Result<String, ApiError> {
        let frame = self.current_frame()?;
        let relationships = self
            .schema
            .child_relationships(self.client.as_ref(), &frame.object_type)?;
        Ok(format_relationships(&frame.object_type, &relationships))
    }

    fn handle_related(&mut self, name: Option<String>) -> Result<String, ApiError> {
        match name {
            None => self.handle_relationships(),
            Some(name) => self.handle_cd(CdTarget::Relationship(name)),
        }
    }

    fn handle_update(
        &mut self,
        field: &str,
        value: &str,
        confirmed: bool,
    ) -> Result<String, ApiError> {
        let frame = self.current_frame()?;
        let record = self.load_record(&frame.object_type, &frame.record_id)?;
        let (field, current) = record
            .find_field(field)
            .map(|(k, v)| (k.to_string(), v.clone()))
            .ok_or_else(|| NavigationError::UnknownField(field.to_string()))?;
        let new_value = coerce_value(value, &current);

        if !confirmed {
            let prompt = format!(
                "Update {} from '{}' to '{}'?",
                field,
                display_value(&current),
                display_value(&new_value)
            );
            if !self.confirmer.confirm(&prompt)? {
                return Ok(info("Update cancelled."));
            }
        }

        let mut changes = Map::new();
        changes.insert(field.clone(), new_value.clone());
        self.client
            .update_record(&frame.object_type, &frame.record_id, &changes)?;
        if let Some(cached) = self.records.get_mut(&frame.record_id) {
            cached.set(field.clone(), new_value.clone());
        }
        Ok(success(&format!(
            "Updated {} = '{}' on {}",
            field,
            display_value(&new_value),
            frame.display_name
        )))
    }

    fn handle_history(
        &mut self,
        field: Option<String>,
        limit: Option<usize>,
    ) -> Result<String, ApiError> {
        let frame = self.current_frame()?;
        let field = match field {
            Some(requested) => {
                let record = self.load_record(&frame.object_type, &frame.record_id)?;
                let canonical = record
                    .find_field(&requested)
                    .map(|(k, _)| k.to_string())
                    .ok_or(NavigationError::UnknownField(requested))?;
                Some(canonical)
            }
            None => None,
        };
        let limit = self
            .config
            .clamp_limit(limit.unwrap_or(self.config.history_limit));
        let spec = history_spec(
            &frame.object_type,
            &frame.record_id,
            field.as_deref(),
            limit,
        );
        let entries = match self.client.query(&spec.to_soql()?) {
            Ok(result) => result.records,
            Err(e) => {
                warn!(error = %e, object = %frame.object_type, "history query failed");
                Vec::new()
            }
        };
        let title = match &field {
            Some(field) => format!("{} history for {}", field, frame.display_name),
            None => format!("Field history for {}", frame.display_name),
        };
        Ok(format_history(&title, &entries))
    }

    fn handle_parent(&mut self, fields: Vec<String>, ultimate: bool) -> Result<String, ApiError> {
        let (command, link_field, kind) = if ultimate {
            (
                "ultimateparent",
                self.config.ultimate_parent_field.clone(),
                "ultimate parent",
            )
        } else {
            ("parent", "ParentId".to_string(), "parent")
        };
        let frame = self.require_account(command)?;
        let record = self.load_record(&frame.object_type, &frame.record_id)?;
        let parent_id = record
            .find_field(&link_field)
            .map(|(_, v)| display_value(v))
            .unwrap_or_default();
        if parent_id.is_empty() {
            return Ok(info(&format!("{} has no {} account.", frame.display_name, kind)));
        }
        let parent_id = validate_identifier(&parent_id)?.to_string();

        // Requested fields may be relationship paths the record endpoint won't expand.
        let selected = if fields.is_empty() {
            None
        } else {
            let spec = record_by_id_spec("Account", &parent_id, fields.clone());
            self.client.query(&spec.to_soql()?)?.records.into_iter().next()
        };
        let parent = self.client.get_record("Account", &parent_id)?;
        let shown: Vec<String> = if fields.is_empty() {
            ACCOUNT_SUMMARY_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            fields
        };
        let source = selected.as_ref().unwrap_or(&parent);
        let rows: Vec<(String, String)> = shown
            .iter()
            .map(|name| match source.find_field(name) {
                Some((field, value)) => (field.to_string(), display_value(value)),
                None => (name.clone(), source.text(name)),
            })
            .collect();
        let entered = self.enter_record("Account", parent);
        Ok(format!(
            "{}\n{}",
            success(&format!("Moved to {} account: {}", kind, entered.display_name)),
            format_field_table(&format!("Account: {}", entered.display_name), &rows)
        ))
    }

    fn handle_children(&mut self, fields: Vec<String>) -> Result<String, ApiError> {
        let frame = self.require_account("children")?;
        let columns: Vec<String> = if fields.is_empty() {
            CHILD_ACCOUNT_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            ["Id", "ParentId"]
                .iter()
                .map(|f| f.to_string())
                .chain(fields)
                .collect()
        };
        let spec = child_accounts_spec(&frame.record_id, columns, self.config.children_limit);
        let count = self.client.query(&spec.to_count_soql()?)?.total_size;
        if count == 0 {
            return Ok(info(&format!("{} has no child accounts.", frame.display_name)));
        }
        let result = self.client.query(&spec.to_soql()?)?;
        let results = ResultSet::new(
            "Account",
            format!("Child accounts of {}", frame.display_name),
            result.records,
        )
        .with_total(count);
        let out = format!(
            "{}\n{}",
            format_result_set(&results, None),
            info("Type a number to select a child account.")
        );
        self.nav.set_results(results);
        Ok(out)
    }

    fn handle_describe(&mut self, object_type: Option<String>) -> Result<String, ApiError> {
        let object_type = match object_type {
            Some(object_type) => object_type,
            None => match (self.nav.current(), self.nav.results()) {
                (Some(frame), _) => match &frame.relationship {
                    Some(rel) => rel.child_object.clone(),
                    None => frame.object_type.clone(),
                },
                (None, Some(results)) => results.object_type.clone(),
                (None, None) => return Err(InputError::Usage("describe <Object>").into()),
            },
        };
        let object_type = validate_identifier(&object_type)?;
        let detailed = self
            .schema
            .describe_detailed(self.client.as_ref(), object_type)?;
        Ok(format_describe(&detailed))
    }

    fn handle_objects(&mut self, all: bool) -> Result<String, ApiError> {
        let objects = filter_objects(self.client.describe_global()?, all);
        Ok(format_objects(&objects, all))
    }

    fn handle_select(&mut self, index: usize) -> Result<String, ApiError> {
        let results = self
            .nav
            .results()
            .filter(|r| !r.is_empty())
            .ok_or(NavigationError::NothingToSelect)?;
        let chosen = results.get(index)?;
        let object_type = chosen
            .object_type()
            .unwrap_or(&results.object_type)
            .to_string();
        let record_id = chosen
            .id()
            .ok_or_else(|| CrmError::InvalidResponse("selected record has no Id".to_string()))?
            .to_string();

        let record = self.client.get_record(&object_type, &record_id)?;
        let frame = self.enter_record(&object_type, record);
        Ok(format!(
            "{}\n{}",
            success(&format!("Selected {}: {}", object_type, frame.display_name)),
            info("Use 'view' for all fields, 'relationships' to see where you can go.")
        ))
    }
}
