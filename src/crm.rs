//! CRM access: the client seam, the Salesforce REST adapter, wire types and
//! the per-session schema cache.

pub mod client;
pub mod salesforce;
pub mod schema;
pub mod types;

pub use client::CrmClient;
pub use salesforce::SalesforceClient;
pub use schema::{ChildRelationship, SchemaCache};
pub use types::{ObjectDescribe, QueryResult, Record, SObjectSummary};
