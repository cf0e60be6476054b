//! Schema presentation: relationships, field lists, describe, object catalogue.

use super::messages::{heading, info};
use super::records::truncate;
use crate::crm::schema::{ChildRelationship, DetailedDescribe, FieldCategory};
use crate::crm::types::{FieldDescribe, ObjectDescribe, Record, SObjectSummary};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

const OTHER_RELATIONSHIPS_SHOWN: usize = 20;
const OTHER_OBJECTS_SHOWN: usize = 20;

/// Standard objects listed first by `objects`.
const COMMON_OBJECTS: [&str; 14] = [
    "Account",
    "Contact",
    "Opportunity",
    "Lead",
    "Case",
    "Task",
    "Event",
    "Campaign",
    "Product2",
    "Pricebook2",
    "Order",
    "Contract",
    "Asset",
    "User",
];

fn relationship_table(relationships: &[&ChildRelationship]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Relationship", "Object", "Via Field"]);
    for rel in relationships {
        table.add_row(vec![
            rel.name.clone(),
            rel.child_object.clone(),
            rel.link_field.clone(),
        ]);
    }
    table
}

/// Child relationships, common ones first, others capped.
pub fn format_relationships(object_type: &str, relationships: &[ChildRelationship]) -> String {
    if relationships.is_empty() {
        return info(&format!("{} has no navigable relationships.", object_type));
    }
    let (common, other): (Vec<&ChildRelationship>, Vec<&ChildRelationship>) =
        relationships.iter().partition(|r| r.is_common());

    let mut out = format!("{}\n", heading(&format!("Relationships for {}", object_type)));
    if !common.is_empty() {
        out.push_str(&format!("Common:\n{}\n", relationship_table(&common)));
    }
    if !other.is_empty() {
        let shown: Vec<&ChildRelationship> =
            other.iter().take(OTHER_RELATIONSHIPS_SHOWN).copied().collect();
        out.push_str(&format!("Other:\n{}\n", relationship_table(&shown)));
        if other.len() > shown.len() {
            out.push_str(&format!("... and {} more\n", other.len() - shown.len()));
        }
    }
    out.push_str("Use 'cd <relationship>' to navigate, then 'ls' to list records.");
    out
}

fn type_detail(field: &FieldDescribe) -> String {
    match field.field_type.as_str() {
        "string" | "textarea" | "url" | "email" | "phone" => match field.length {
            Some(len) if len > 0 => format!("{}({})", field.field_type, len),
            _ => field.field_type.clone(),
        },
        "currency" | "double" | "percent" => match (field.precision, field.scale) {
            (Some(p), Some(s)) => format!("{}({},{})", field.field_type, p, s),
            _ => field.field_type.clone(),
        },
        "reference" if field.is_reference() => {
            format!("reference({})", field.reference_to.join(", "))
        }
        _ => field.field_type.clone(),
    }
}

fn field_flags(field: &FieldDescribe) -> String {
    let mut flags = Vec::new();
    if field.required() {
        flags.push("required".to_string());
    }
    if field.unique {
        flags.push("unique".to_string());
    }
    if field.external_id {
        flags.push("external id".to_string());
    }
    if !field.picklist_values.is_empty() {
        let values: Vec<&str> = field
            .picklist_values
            .iter()
            .filter(|p| p.active)
            .take(5)
            .map(|p| p.value.as_str())
            .collect();
        let more = field.picklist_values.len().saturating_sub(values.len());
        let mut listed = values.join(", ");
        if more > 0 {
            listed.push_str(&format!(" (+{})", more));
        }
        flags.push(listed);
    }
    if let Some(help) = &field.inline_help_text {
        flags.push(truncate(help, 40));
    }
    flags.join("; ")
}

/// Fields of an object; the last column marks fields set on `record`.
pub fn format_fields(describe: &ObjectDescribe, record: Option<&Record>) -> String {
    let mut fields: Vec<&FieldDescribe> = describe.fields.iter().collect();
    fields.sort_by(|a, b| a.name.cmp(&b.name));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    let mut header = vec!["Field", "Label", "Type"];
    if record.is_some() {
        header.push("Set");
    }
    table.set_header(header);
    for field in &fields {
        let mut row = vec![field.name.clone(), field.label.clone(), type_detail(field)];
        if let Some(record) = record {
            let set = !record.text(&field.name).is_empty();
            row.push(if set { "●" } else { "" }.to_string());
        }
        table.add_row(row);
    }
    format!(
        "{}\n{}\n{} field(s)",
        heading(&format!("Fields for {}", describe.name)),
        table,
        fields.len()
    )
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Full describe: properties, field categories, parent and child relationships.
pub fn format_describe(detailed: &DetailedDescribe) -> String {
    let object = &detailed.object;
    let mut out = format!("{}\n", heading(&format!("{} ({})", object.name, object.label)));

    let mut props = Table::new();
    props.load_preset(UTF8_BORDERS_ONLY);
    props.set_header(vec!["Property", "Value"]);
    props.add_row(vec!["Plural label", object.label_plural.as_str()]);
    props.add_row(vec!["Custom", yes_no(object.custom)]);
    props.add_row(vec!["Queryable", yes_no(object.queryable)]);
    props.add_row(vec!["Searchable", yes_no(object.searchable)]);
    props.add_row(vec!["Createable", yes_no(object.createable)]);
    props.add_row(vec!["Updateable", yes_no(object.updateable)]);
    props.add_row(vec!["Deletable", yes_no(object.deletable)]);
    out.push_str(&format!("{}\n", props));

    let counts: Vec<String> = FieldCategory::ALL
        .iter()
        .map(|c| format!("{} {}", detailed.count(*c), c.label().to_lowercase()))
        .collect();
    out.push_str(&format!(
        "{} fields: {}\n\n",
        detailed.field_count(),
        counts.join(", ")
    ));

    for (category, fields) in &detailed.categories {
        if fields.is_empty() {
            continue;
        }
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Field", "Label", "Type", "Details"]);
        for field in fields {
            table.add_row(vec![
                field.name.clone(),
                field.label.clone(),
                type_detail(field),
                field_flags(field),
            ]);
        }
        out.push_str(&format!("{}\n{}\n\n", heading(category.label()), table));
    }

    if !detailed.parents.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Field", "Relationship", "References"]);
        for parent in &detailed.parents {
            table.add_row(vec![
                parent.field.clone(),
                parent.relationship_name.clone().unwrap_or_default(),
                parent.reference_to.join(", "),
            ]);
        }
        out.push_str(&format!("{}\n{}\n\n", heading("Parent Relationships"), table));
    }

    if !detailed.children.is_empty() {
        let shown: Vec<&ChildRelationship> = detailed
            .children
            .iter()
            .take(OTHER_RELATIONSHIPS_SHOWN)
            .collect();
        out.push_str(&format!(
            "{}\n{}\n",
            heading("Child Relationships"),
            relationship_table(&shown)
        ));
        if detailed.children.len() > shown.len() {
            out.push_str(&format!(
                "... and {} more (see 'relationships')\n",
                detailed.children.len() - shown.len()
            ));
        }
    }
    out.trim_end().to_string()
}

fn object_table(objects: &[&SObjectSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Object", "Label"]);
    for object in objects {
        table.add_row(vec![object.name.clone(), object.label.clone()]);
    }
    table
}

/// Object catalogue: common standard objects, custom objects, then the rest.
pub fn format_objects(objects: &[SObjectSummary], show_all: bool) -> String {
    if objects.is_empty() {
        return info("No objects available.");
    }
    let common: Vec<&SObjectSummary> = COMMON_OBJECTS
        .iter()
        .filter_map(|name| objects.iter().find(|o| o.name == *name))
        .collect();
    let custom: Vec<&SObjectSummary> = objects.iter().filter(|o| o.custom).collect();
    let other: Vec<&SObjectSummary> = objects
        .iter()
        .filter(|o| !o.custom && !COMMON_OBJECTS.contains(&o.name.as_str()))
        .collect();

    let mut out = format!("{}\n", heading("Salesforce Objects"));
    if !common.is_empty() {
        out.push_str(&format!("Common:\n{}\n", object_table(&common)));
    }
    if !custom.is_empty() {
        out.push_str(&format!("Custom:\n{}\n", object_table(&custom)));
    }
    if !other.is_empty() {
        let limit = if show_all { other.len() } else { OTHER_OBJECTS_SHOWN };
        let shown: Vec<&SObjectSummary> = other.iter().take(limit).copied().collect();
        out.push_str(&format!("Other:\n{}\n", object_table(&shown)));
        if other.len() > shown.len() {
            out.push_str(&format!(
                "... and {} more (use 'objects --all')\n",
                other.len() - shown.len()
            ));
        }
    }
    out.push_str(&format!("Total: {} object(s)", objects.len()));
    out
}
