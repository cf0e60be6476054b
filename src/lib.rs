//! sfcli: Interactive Salesforce CRM navigation
//!
//! A shell that lets you browse CRM records like a file system: search, pick a
//! record by number, `cd` into its relationships, `ls` related records, and
//! inspect or update fields along the way.

pub mod cli;
pub mod config;
pub mod crm;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod presentation;
pub mod query;
pub mod shell;
