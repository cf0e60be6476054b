//! In-memory CRM fake shared by the integration tests.

use serde_json::{json, Map, Value};
use sfcli::config::ShellConfig;
use sfcli::crm::types::{ChildRelationshipDescribe, FieldDescribe};
use sfcli::crm::{CrmClient, ObjectDescribe, QueryResult, Record, SObjectSummary};
use sfcli::error::{ApiError, CrmError};
use sfcli::shell::{Confirmer, Session};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Every statement and write the fake received, in order.
#[derive(Debug, Default)]
pub struct CallLog {
    pub statements: Vec<String>,
    pub updates: Vec<(String, String, Map<String, Value>)>,
    pub fetched: Vec<String>,
}

impl CallLog {
    /// Last non-count SOQL statement.
    pub fn last_select(&self) -> Option<&str> {
        self.statements
            .iter()
            .rev()
            .find(|s| s.starts_with("SELECT ") && !s.starts_with("SELECT COUNT()"))
            .map(String::as_str)
    }
}

pub struct FakeCrm {
    log: Rc<RefCell<CallLog>>,
    rows: HashMap<String, Vec<Record>>,
    records: HashMap<String, Record>,
    describes: HashMap<String, ObjectDescribe>,
    sosl_hits: Vec<Record>,
}

pub fn record(object_type: &str, fields: Value) -> Record {
    let mut map = match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.insert("attributes".to_string(), json!({ "type": object_type }));
    Record(map)
}

fn field(name: &str, field_type: &str) -> FieldDescribe {
    FieldDescribe {
        name: name.to_string(),
        label: name.to_string(),
        field_type: field_type.to_string(),
        nillable: true,
        updateable: true,
        ..FieldDescribe::default()
    }
}

fn reference(name: &str, target: &str) -> FieldDescribe {
    FieldDescribe {
        reference_to: vec![target.to_string()],
        ..field(name, "reference")
    }
}

fn child(relationship: &str, object: &str, link: &str) -> ChildRelationshipDescribe {
    ChildRelationshipDescribe {
        relationship_name: Some(relationship.to_string()),
        child_sobject: object.to_string(),
        field: link.to_string(),
        cascade_delete: false,
    }
}

fn describe(
    name: &str,
    fields: Vec<FieldDescribe>,
    children: Vec<ChildRelationshipDescribe>,
) -> ObjectDescribe {
    ObjectDescribe {
        name: name.to_string(),
        label: name.to_string(),
        label_plural: format!("{}s", name),
        queryable: true,
        searchable: true,
        createable: true,
        updateable: true,
        fields,
        child_relationships: children,
        ..ObjectDescribe::default()
    }
}

/// Object name after `FROM`.
fn from_object(soql: &str) -> Option<String> {
    let upper = soql.to_ascii_uppercase();
    let start = upper.find(" FROM ")? + " FROM ".len();
    soql[start..]
        .split_whitespace()
        .next()
        .map(|s| s.to_ascii_lowercase())
}

/// The id from a `WHERE Id = '...'` filter, when the query has one.
fn id_filter(soql: &str) -> Option<String> {
    let start = soql.find("WHERE Id = '")? + "WHERE Id = '".len();
    soql[start..].split('\'').next().map(str::to_string)
}

impl FakeCrm {
    /// A small org: two Acme accounts with a parent chain, contacts,
    /// opportunities and a custom invoice object.
    pub fn new() -> Self {
        let accounts = vec![
            record(
                "Account",
                json!({
                    "Id": "001A", "Name": "Acme Corp", "ParentId": "001P",
                    "Ultimate_Parent__c": "001U", "Industry": "Manufacturing",
                    "AnnualRevenue": 1000000.0, "NumberOfEmployees": 250,
                    "ShippingCity": "Denver"
                }),
            ),
            record(
                "Account",
                json!({
                    "Id": "001B", "Name": "Acme West", "ParentId": "001A",
                    "Ultimate_Parent__c": "001U", "Industry": "Retail",
                    "AnnualRevenue": 50000.0, "NumberOfEmployees": 12,
                    "ShippingCity": "Boise"
                }),
            ),
        ];
        let parent = record(
            "Account",
            json!({
                "Id": "001P", "Name": "Acme Holdings", "ParentId": "001U",
                "Ultimate_Parent__c": "001U", "Industry": "Finance"
            }),
        );
        let ultimate = record(
            "Account",
            json!({
                "Id": "001U", "Name": "Acme Global", "ParentId": null,
                "Ultimate_Parent__c": null, "Industry": "Finance"
            }),
        );
        let contacts = vec![record(
            "Contact",
            json!({ "Id": "003A", "Name": "Pat Lee", "Email": "pat@acme.test", "AccountId": "001A" }),
        )];
        let opportunities = vec![
            record(
                "Opportunity",
                json!({ "Id": "006A", "Name": "Renewal", "StageName": "Prospecting",
                        "CloseDate": "2024-03-01", "Amount": 5000, "AccountId": "001A" }),
            ),
            record(
                "Opportunity",
                json!({ "Id": "006B", "Name": "Expansion", "StageName": "Closed Won",
                        "CloseDate": "2024-06-15", "Amount": 12000, "AccountId": "001A" }),
            ),
        ];
        let invoices = vec![record(
            "Invoice__c",
            json!({ "Id": "a01A", "Name": "INV-0001", "Account__c": "001A" }),
        )];

        let mut records = HashMap::new();
        for r in accounts
            .iter()
            .chain([&parent, &ultimate])
            .chain(contacts.iter())
            .chain(opportunities.iter())
            .chain(invoices.iter())
        {
            if let Some(id) = r.id() {
                records.insert(id.to_string(), r.clone());
            }
        }

        let mut rows = HashMap::new();
        rows.insert("account".to_string(), accounts);
        rows.insert("contact".to_string(), contacts);
        rows.insert("opportunity".to_string(), opportunities);
        rows.insert("invoice__c".to_string(), invoices);

        let mut describes = HashMap::new();
        describes.insert(
            "account".to_string(),
            describe(
                "Account",
                vec![
                    field("Id", "id"),
                    field("Name", "string"),
                    reference("ParentId", "Account"),
                    reference("Ultimate_Parent__c", "Account"),
                    field("Industry", "picklist"),
                    field("AnnualRevenue", "currency"),
                    field("NumberOfEmployees", "int"),
                    field("ShippingCity", "string"),
                ],
                vec![
                    child("ChildAccounts", "Account", "ParentId"),
                    child("Contacts", "Contact", "AccountId"),
                    child("Opportunities", "Opportunity", "AccountId"),
                    child("Invoices__r", "Invoice__c", "Account__c"),
                    ChildRelationshipDescribe {
                        relationship_name: None,
                        child_sobject: "AccountShare".to_string(),
                        field: "AccountId".to_string(),
                        cascade_delete: true,
                    },
                ],
            ),
        );
        describes.insert(
            "contact".to_string(),
            describe(
                "Contact",
                vec![
                    field("Id", "id"),
                    field("Name", "string"),
                    field("Email", "email"),
                    reference("AccountId", "Account"),
                ],
                vec![child("Cases", "Case", "ContactId")],
            ),
        );
        describes.insert(
            "opportunity".to_string(),
            describe(
                "Opportunity",
                vec![
                    field("Id", "id"),
                    field("Name", "string"),
                    field("StageName", "picklist"),
                    field("CloseDate", "date"),
                    field("Amount", "currency"),
                    reference("AccountId", "Account"),
                ],
                Vec::new(),
            ),
        );
        describes.insert(
            "invoice__c".to_string(),
            describe(
                "Invoice__c",
                vec![
                    field("Id", "id"),
                    field("Name", "string"),
                    reference("Account__c", "Account"),
                ],
                Vec::new(),
            ),
        );

        Self {
            log: Rc::new(RefCell::new(CallLog::default())),
            rows,
            records,
            describes,
            sosl_hits: Vec::new(),
        }
    }

    /// Records SOSL returns for every search.
    pub fn with_sosl_hits(mut self, hits: Vec<Record>) -> Self {
        self.sosl_hits = hits;
        self
    }

    pub fn log(&self) -> Rc<RefCell<CallLog>> {
        Rc::clone(&self.log)
    }
}

impl CrmClient for FakeCrm {
    fn query(&self, soql: &str) -> Result<QueryResult, CrmError> {
        self.log.borrow_mut().statements.push(soql.to_string());
        let object = from_object(soql)
            .ok_or_else(|| CrmError::Request(format!("MALFORMED_QUERY: {}", soql)))?;
        let rows = self
            .rows
            .get(&object)
            .ok_or_else(|| CrmError::Request(format!("INVALID_TYPE: {}", object)))?;
        if soql.starts_with("SELECT COUNT()") {
            return Ok(QueryResult {
                total_size: rows.len(),
                done: true,
                records: Vec::new(),
                next_records_url: None,
            });
        }
        let rows = match id_filter(soql) {
            Some(id) => rows
                .iter()
                .filter(|r| r.id() == Some(id.as_str()))
                .cloned()
                .collect(),
            None => rows.clone(),
        };
        Ok(QueryResult::from_records(rows))
    }

    fn search(&self, sosl: &str) -> Result<Vec<Record>, CrmError> {
        self.log.borrow_mut().statements.push(sosl.to_string());
        Ok(self.sosl_hits.clone())
    }

    fn get_record(&self, object_type: &str, record_id: &str) -> Result<Record, CrmError> {
        self.log.borrow_mut().fetched.push(record_id.to_string());
        self.records
            .get(record_id)
            .cloned()
            .ok_or_else(|| CrmError::NotFound(format!("{} {}", object_type, record_id)))
    }

    fn update_record(
        &self,
        object_type: &str,
        record_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), CrmError> {
        self.log.borrow_mut().updates.push((
            object_type.to_string(),
            record_id.to_string(),
            fields.clone(),
        ));
        Ok(())
    }

    fn describe(&self, object_type: &str) -> Result<ObjectDescribe, CrmError> {
        self.describes
            .get(&object_type.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| CrmError::NotFound(format!("sObject type '{}'", object_type)))
    }

    fn describe_global(&self) -> Result<Vec<SObjectSummary>, CrmError> {
        Ok(self
            .describes
            .values()
            .map(|d| SObjectSummary {
                name: d.name.clone(),
                label: d.label.clone(),
                custom: d.name.ends_with("__c"),
                custom_setting: false,
                queryable: true,
                createable: true,
            })
            .collect())
    }

    fn instance_url(&self) -> Option<&str> {
        Some("https://acme.my.salesforce.com")
    }
}

/// Answers every confirmation the same way and counts the prompts.
pub struct FixedConfirmer {
    pub answer: bool,
    pub prompts: Rc<RefCell<Vec<String>>>,
}

impl Confirmer for FixedConfirmer {
    fn confirm(&self, prompt: &str) -> Result<bool, ApiError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        Ok(self.answer)
    }
}

/// Session over the default fake org plus its call log.
pub fn session() -> (Session, Rc<RefCell<CallLog>>) {
    session_with(FakeCrm::new())
}

pub fn session_with(crm: FakeCrm) -> (Session, Rc<RefCell<CallLog>>) {
    let log = crm.log();
    (Session::new(Box::new(crm), ShellConfig::default()), log)
}

/// Run lines that must succeed; returns the last output.
pub fn run(session: &mut Session, lines: &[&str]) -> String {
    let mut last = String::new();
    for line in lines {
        match session.execute_line(line) {
            Ok(sfcli::shell::Outcome::Output(out)) => last = out,
            Ok(sfcli::shell::Outcome::Exit) => last.clear(),
            Err(e) => panic!("'{}' failed: {}", line, e),
        }
    }
    last
}
