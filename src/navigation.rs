//! Navigation Context
//!
//! The shell's position is a stack of frames. A record frame stands on one
//! record; a relationship frame stands inside one child relationship of that
//! record. The current Result Set belongs to the top frame: entering a frame
//! sets the previous results aside and leaving it brings them back.

use crate::crm::types::{compare_values, Record};
use crate::error::NavigationError;
use crate::query::SortDirection;

/// A child relationship the user has entered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRelationship {
    pub name: String,
    pub child_object: String,
    pub link_field: String,
}

/// One level of navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFrame {
    pub object_type: String,
    pub record_id: String,
    pub display_name: String,
    pub relationship: Option<ActiveRelationship>,
}

impl ContextFrame {
    pub fn record(
        object_type: impl Into<String>,
        record_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            record_id: record_id.into(),
            display_name: display_name.into(),
            relationship: None,
        }
    }

    /// Frame inside `relationship` of the record this frame stands on.
    pub fn enter_relationship(&self, relationship: ActiveRelationship) -> Self {
        Self {
            relationship: Some(relationship),
            ..self.clone()
        }
    }

    pub fn relationship_name(&self) -> Option<&str> {
        self.relationship.as_ref().map(|r| r.name.as_str())
    }

    pub fn is_relationship(&self) -> bool {
        self.relationship.is_some()
    }

    /// Breadcrumb label: `Object:Name` for records, the relationship name otherwise.
    pub fn label(&self) -> String {
        match &self.relationship {
            Some(rel) => rel.name.clone(),
            None => format!("{}:{}", self.object_type, truncate(&self.display_name, 30)),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Ordered frames, root first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextStack {
    frames: Vec<ContextFrame>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: ContextFrame) {
        self.frames.push(frame);
    }

    /// Remove the top frame. No-op at root.
    pub fn pop(&mut self) -> Option<ContextFrame> {
        self.frames.pop()
    }

    pub fn current(&self) -> Option<&ContextFrame> {
        self.frames.last()
    }

    pub fn reset(&mut self) {
        self.frames.clear();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_root(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame labels from root to top.
    pub fn breadcrumb(&self) -> Vec<String> {
        self.frames.iter().map(ContextFrame::label).collect()
    }
}

/// Records from the last search or listing, addressable by 1-based position
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub object_type: String,
    pub title: String,
    pub records: Vec<Record>,
    /// Server-side total when known; may exceed `records.len()`.
    pub total_count: Option<usize>,
}

impl ResultSet {
    pub fn new(object_type: impl Into<String>, title: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            object_type: object_type.into(),
            title: title.into(),
            records,
            total_count: None,
        }
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total_count = Some(total.max(self.records.len()));
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total(&self) -> usize {
        self.total_count.unwrap_or(self.records.len())
    }

    /// Record at 1-based `index`.
    pub fn get(&self, index: usize) -> Result<&Record, NavigationError> {
        index
            .checked_sub(1)
            .and_then(|i| self.records.get(i))
            .ok_or(NavigationError::SelectionOutOfRange {
                index,
                len: self.records.len(),
            })
    }

    /// Column names in first-seen order across all records.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in &self.records {
            for name in record.field_names() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    /// Sort in place by `field` (case-insensitive name). Nulls sort last
    /// ascending. Positions are renumbered to match.
    pub fn sort_by_field(
        &mut self,
        field: &str,
        direction: SortDirection,
    ) -> Result<(), NavigationError> {
        let names = self.field_names();
        let Some(canonical) = names.iter().find(|n| n.eq_ignore_ascii_case(field)).cloned() else {
            return Err(NavigationError::UnknownSortField {
                field: field.to_string(),
                available: names.join(", "),
            });
        };
        self.records.sort_by(|a, b| {
            let ordering = compare_values(a.get(&canonical), b.get(&canonical));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        Ok(())
    }
}

/// Stack plus the Result Set scoped to its top frame
#[derive(Debug, Default)]
pub struct Navigator {
    stack: ContextStack,
    results: Option<ResultSet>,
    set_aside: Vec<Option<ResultSet>>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack(&self) -> &ContextStack {
        &self.stack
    }

    pub fn current(&self) -> Option<&ContextFrame> {
        self.stack.current()
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    pub fn results_mut(&mut self) -> Option<&mut ResultSet> {
        self.results.as_mut()
    }

    pub fn set_results(&mut self, results: ResultSet) {
        self.results = Some(results);
    }

    /// Push a frame; the current results are kept for when it is left.
    pub fn enter(&mut self, frame: ContextFrame) {
        self.set_aside.push(self.results.take());
        self.stack.push(frame);
    }

    /// Pop the top frame and restore the results it set aside.
    /// Returns false (and changes nothing) at root.
    pub fn leave(&mut self) -> bool {
        if self.stack.pop().is_none() {
            return false;
        }
        self.results = self.set_aside.pop().flatten();
        true
    }

    /// Back to root with no results.
    pub fn reset(&mut self) {
        self.stack.reset();
        self.set_aside.clear();
        self.results = None;
    }

    /// Prompt text, e.g. `sf [Account:Acme / Contacts]> `.
    pub fn prompt(&self) -> String {
        if self.stack.is_root() {
            match &self.results {
                Some(results) => format!("sf [{}]> ", results.object_type),
                None => "sf> ".to_string(),
            }
        } else {
            format!("sf [{}]> ", self.stack.breadcrumb().join(" / "))
        }
    }
}
