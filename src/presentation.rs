//! Presentation: text formatters for records, schema views and shell messages.
//!
//! Every formatter returns a `String`; printing is left to the caller.

mod messages;
mod records;
mod schema;

pub use messages::{error, heading, info, success, warning};
pub use records::{
    format_field_table, format_history, format_query_result, format_record, format_result_set,
    format_timestamp, truncate,
};
pub use schema::{format_describe, format_fields, format_objects, format_relationships};
