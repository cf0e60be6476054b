//! Schema Cache
//!
//! Describe results are fetched once per object type per session and reused
//! for name-field lookup, default query fields, relationship resolution and
//! the `describe`/`fields` views.

use crate::crm::client::CrmClient;
use crate::crm::types::{FieldDescribe, ObjectDescribe, SObjectSummary};
use crate::error::{ApiError, CrmError, NavigationError};
use std::collections::HashMap;
use tracing::debug;

/// Fields every object carries that are maintained by the platform.
pub const SYSTEM_FIELDS: [&str; 6] = [
    "Id",
    "CreatedDate",
    "CreatedById",
    "LastModifiedDate",
    "LastModifiedById",
    "SystemModstamp",
];

/// Preferred columns for related-record listings, in priority order.
const PREFERRED_LIST_FIELDS: [&str; 16] = [
    "Name",
    "Subject",
    "Title",
    "Status",
    "Type",
    "Priority",
    "Description",
    "ActivityDate",
    "DueDate",
    "Email",
    "Phone",
    "Company",
    "Amount",
    "StageName",
    "CloseDate",
    "CreatedDate",
];

/// Relationship names shown first in listings.
pub const COMMON_RELATIONSHIPS: [&str; 13] = [
    "Contacts",
    "Opportunities",
    "Cases",
    "Tasks",
    "Events",
    "Notes",
    "Attachments",
    "ActivityHistories",
    "OpenActivities",
    "ChildAccounts",
    "Orders",
    "Contracts",
    "Assets",
];

/// Plural names accepted when the describe has no matching relationship.
const LEGACY_RELATIONSHIPS: [(&str, &str); 14] = [
    ("Contacts", "Contact"),
    ("Opportunities", "Opportunity"),
    ("OpportunityLineItems", "OpportunityLineItem"),
    ("Cases", "Case"),
    ("Tasks", "Task"),
    ("Events", "Event"),
    ("Leads", "Lead"),
    ("Contracts", "Contract"),
    ("Orders", "Order"),
    ("Assets", "Asset"),
    ("Invoices", "Invoice"),
    ("Quotes", "SBQQ__Quote__c"),
    ("Accounts", "Account"),
    ("Products", "Product2"),
];

/// A navigable child relationship of an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRelationship {
    pub name: String,
    pub child_object: String,
    pub link_field: String,
}

impl ChildRelationship {
    pub fn is_common(&self) -> bool {
        COMMON_RELATIONSHIPS.contains(&self.name.as_str())
    }
}

/// Child relationships that have a name, sorted by name.
pub fn child_relationships(describe: &ObjectDescribe) -> Vec<ChildRelationship> {
    let mut relationships: Vec<ChildRelationship> = describe
        .child_relationships
        .iter()
        .filter_map(|r| {
            r.relationship_name.as_ref().map(|name| ChildRelationship {
                name: name.clone(),
                child_object: r.child_sobject.clone(),
                link_field: r.field.clone(),
            })
        })
        .collect();
    relationships.sort_by(|a, b| a.name.cmp(&b.name));
    relationships
}

/// The field that best labels a record: `Name` if it is text, else the first
/// text field that is not `Id`, else `Id`.
pub fn name_field(describe: &ObjectDescribe) -> String {
    let is_text = |f: &&FieldDescribe| f.field_type == "string";
    if describe.fields.iter().filter(is_text).any(|f| f.name == "Name") {
        return "Name".to_string();
    }
    describe
        .fields
        .iter()
        .filter(is_text)
        .find(|f| f.name != "Id")
        .map(|f| f.name.clone())
        .unwrap_or_else(|| "Id".to_string())
}

/// Up to `max` columns for listing records: `Id`, preferred fields that exist,
/// then other short scalar fields.
pub fn query_fields(describe: &ObjectDescribe, max: usize) -> Vec<String> {
    let mut fields = vec!["Id".to_string()];
    for preferred in PREFERRED_LIST_FIELDS {
        if fields.len() >= max {
            return fields;
        }
        if let Some(field) = describe.fields.iter().find(|f| f.name == preferred) {
            fields.push(field.name.clone());
        }
    }
    for field in &describe.fields {
        if fields.len() >= max {
            break;
        }
        let scalar = matches!(field.field_type.as_str(), "string" | "picklist" | "boolean");
        if scalar && !fields.contains(&field.name) {
            fields.push(field.name.clone());
        }
    }
    fields
}

/// Field on `child` that points at `parent`: `<Parent>Id` when present, else
/// any reference field targeting `parent`.
pub fn link_field(parent: &str, child: &ObjectDescribe) -> Option<String> {
    let conventional = format!("{}Id", parent);
    if let Some(field) = child.field(&conventional) {
        return Some(field.name.clone());
    }
    child
        .fields
        .iter()
        .find(|f| f.reference_to.iter().any(|t| t.eq_ignore_ascii_case(parent)))
        .map(|f| f.name.clone())
}

/// Match a user-typed relationship name against an object's relationships.
///
/// Case-insensitive; `Foo__c` and `Foo__r` are interchangeable; a unique child
/// object name also matches.
pub fn match_relationship<'a>(
    relationships: &'a [ChildRelationship],
    requested: &str,
) -> Option<&'a ChildRelationship> {
    let by_name = |name: &str| {
        relationships
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    };
    if let Some(found) = by_name(requested) {
        return Some(found);
    }
    let lower = requested.to_ascii_lowercase();
    let swapped = if let Some(stem) = lower.strip_suffix("__c") {
        Some(format!("{}__r", stem))
    } else {
        lower.strip_suffix("__r").map(|stem| format!("{}__c", stem))
    };
    if let Some(found) = swapped.as_deref().and_then(by_name) {
        return Some(found);
    }
    let mut by_child = relationships
        .iter()
        .filter(|r| r.child_object.eq_ignore_ascii_case(requested));
    match (by_child.next(), by_child.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// Field category in the detailed describe view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCategory {
    Standard,
    Custom,
    System,
    Formula,
    Lookup,
}

impl FieldCategory {
    pub fn of(field: &FieldDescribe) -> Self {
        if field.calculated {
            FieldCategory::Formula
        } else if field.is_reference() {
            FieldCategory::Lookup
        } else if field.custom {
            FieldCategory::Custom
        } else if SYSTEM_FIELDS.contains(&field.name.as_str()) {
            FieldCategory::System
        } else {
            FieldCategory::Standard
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldCategory::Standard => "Standard Fields",
            FieldCategory::Custom => "Custom Fields",
            FieldCategory::System => "System Fields",
            FieldCategory::Formula => "Formula Fields",
            FieldCategory::Lookup => "Lookup Fields",
        }
    }

    pub const ALL: [FieldCategory; 5] = [
        FieldCategory::Standard,
        FieldCategory::Custom,
        FieldCategory::Lookup,
        FieldCategory::Formula,
        FieldCategory::System,
    ];
}

/// A lookup from this object to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRelationship {
    pub field: String,
    pub relationship_name: Option<String>,
    pub reference_to: Vec<String>,
}

/// Describe result organised for display
#[derive(Debug, Clone)]
pub struct DetailedDescribe {
    pub object: ObjectDescribe,
    pub categories: Vec<(FieldCategory, Vec<FieldDescribe>)>,
    pub parents: Vec<ParentRelationship>,
    pub children: Vec<ChildRelationship>,
}

impl DetailedDescribe {
    pub fn from_describe(describe: &ObjectDescribe) -> Self {
        let categories = FieldCategory::ALL
            .iter()
            .map(|category| {
                let mut fields: Vec<FieldDescribe> = describe
                    .fields
                    .iter()
                    .filter(|f| FieldCategory::of(f) == *category)
                    .cloned()
                    .collect();
                fields.sort_by(|a, b| a.name.cmp(&b.name));
                (*category, fields)
            })
            .collect();
        let parents = describe
            .fields
            .iter()
            .filter(|f| f.is_reference())
            .map(|f| ParentRelationship {
                field: f.name.clone(),
                relationship_name: f.relationship_name.clone(),
                reference_to: f.reference_to.clone(),
            })
            .collect();
        Self {
            object: describe.clone(),
            categories,
            parents,
            children: child_relationships(describe),
        }
    }

    pub fn field_count(&self) -> usize {
        self.object.fields.len()
    }

    pub fn count(&self, category: FieldCategory) -> usize {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, fields)| fields.len())
            .unwrap_or(0)
    }
}

/// Objects worth browsing: queryable, createable and not custom settings,
/// unless `show_all`. Sorted by name.
pub fn filter_objects(objects: Vec<SObjectSummary>, show_all: bool) -> Vec<SObjectSummary> {
    let mut objects: Vec<SObjectSummary> = objects
        .into_iter()
        .filter(|o| show_all || (!o.custom_setting && o.queryable && o.createable))
        .collect();
    objects.sort_by(|a, b| a.name.cmp(&b.name));
    objects
}

/// Per-session cache of describe results keyed by lower-cased object name
#[derive(Debug, Default)]
pub struct SchemaCache {
    describes: HashMap<String, ObjectDescribe>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe `object_type`, fetching only on first use.
    pub fn describe(
        &mut self,
        client: &dyn CrmClient,
        object_type: &str,
    ) -> Result<&ObjectDescribe, CrmError> {
        let key = object_type.to_ascii_lowercase();
        if !self.describes.contains_key(&key) {
            debug!(object = object_type, "describe (cache miss)");
            let describe = client.describe(object_type)?;
            self.describes.insert(key.clone(), describe);
        }
        self.describes
            .get(&key)
            .ok_or_else(|| CrmError::InvalidResponse(format!("No describe for {}", object_type)))
    }

    /// Already-fetched describe, without touching the network.
    pub fn cached(&self, object_type: &str) -> Option<&ObjectDescribe> {
        self.describes.get(&object_type.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.describes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.describes.is_empty()
    }

    pub fn name_field(
        &mut self,
        client: &dyn CrmClient,
        object_type: &str,
    ) -> Result<String, CrmError> {
        Ok(name_field(self.describe(client, object_type)?))
    }

    pub fn query_fields(
        &mut self,
        client: &dyn CrmClient,
        object_type: &str,
        max: usize,
    ) -> Result<Vec<String>, CrmError> {
        Ok(query_fields(self.describe(client, object_type)?, max))
    }

    pub fn child_relationships(
        &mut self,
        client: &dyn CrmClient,
        object_type: &str,
    ) -> Result<Vec<ChildRelationship>, CrmError> {
        Ok(child_relationships(self.describe(client, object_type)?))
    }

    /// Resolve a user-typed relationship name on `object_type`.
    ///
    /// Falls back to well-known plural names, discovering the link field from
    /// the child's describe.
    pub fn resolve_relationship(
        &mut self,
        client: &dyn CrmClient,
        object_type: &str,
        requested: &str,
    ) -> Result<ChildRelationship, ApiError> {
        let relationships = self.child_relationships(client, object_type)?;
        if let Some(found) = match_relationship(&relationships, requested) {
            return Ok(found.clone());
        }

        let legacy = LEGACY_RELATIONSHIPS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(requested));
        let Some((name, child_object)) = legacy else {
            return Err(NavigationError::UnknownRelationship {
                object: object_type.to_string(),
                name: requested.to_string(),
            }
            .into());
        };
        debug!(relationship = *name, child = *child_object, "legacy relationship name");
        let child = self.describe(client, child_object)?;
        let link = link_field(object_type, child).ok_or_else(|| {
            NavigationError::UnresolvedLinkField {
                parent: object_type.to_string(),
                child: child_object.to_string(),
            }
        })?;
        Ok(ChildRelationship {
            name: name.to_string(),
            child_object: child_object.to_string(),
            link_field: link,
        })
    }

    pub fn describe_detailed(
        &mut self,
        client: &dyn CrmClient,
        object_type: &str,
    ) -> Result<DetailedDescribe, CrmError> {
        Ok(DetailedDescribe::from_describe(
            self.describe(client, object_type)?,
        ))
    }
}
