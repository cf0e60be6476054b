//! The CRM client seam.
//!
//! Sessions talk to the CRM only through [`CrmClient`], so tests drive the
//! whole shell against an in-memory fake.

use crate::crm::types::{ObjectDescribe, QueryResult, Record, SObjectSummary};
use crate::error::CrmError;
use serde_json::{Map, Value};

/// Blocking CRM API used by the shell.
pub trait CrmClient {
    /// Run SOQL, following pagination until `done`.
    fn query(&self, soql: &str) -> Result<QueryResult, CrmError>;

    /// Run SOSL and return the matching records.
    fn search(&self, sosl: &str) -> Result<Vec<Record>, CrmError>;

    /// Fetch one record with all fields.
    fn get_record(&self, object_type: &str, record_id: &str) -> Result<Record, CrmError>;

    /// Write field values to one record.
    fn update_record(
        &self,
        object_type: &str,
        record_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), CrmError>;

    fn describe(&self, object_type: &str) -> Result<ObjectDescribe, CrmError>;

    fn describe_global(&self) -> Result<Vec<SObjectSummary>, CrmError>;

    /// Base URL of the org, used to print record links.
    fn instance_url(&self) -> Option<&str> {
        None
    }
}

impl<C: CrmClient + ?Sized> CrmClient for Box<C> {
    fn query(&self, soql: &str) -> Result<QueryResult, CrmError> {
        (**self).query(soql)
    }

    fn search(&self, sosl: &str) -> Result<Vec<Record>, CrmError> {
        (**self).search(sosl)
    }

    fn get_record(&self, object_type: &str, record_id: &str) -> Result<Record, CrmError> {
        (**self).get_record(object_type, record_id)
    }

    fn update_record(
        &self,
        object_type: &str,
        record_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), CrmError> {
        (**self).update_record(object_type, record_id, fields)
    }

    fn describe(&self, object_type: &str) -> Result<ObjectDescribe, CrmError> {
        (**self).describe(object_type)
    }

    fn describe_global(&self) -> Result<Vec<SObjectSummary>, CrmError> {
        (**self).describe_global()
    }

    fn instance_url(&self) -> Option<&str> {
        (**self).instance_url()
    }
}
