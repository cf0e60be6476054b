//! Record commands: view/show, update, history, account hierarchy, schema views.

use crate::integration::test_utils::{run, session, CallLog, FakeCrm, FixedConfirmer};
use serde_json::json;
use sfcli::config::ShellConfig;
use sfcli::error::{ApiError, InputError, NavigationError};
use sfcli::shell::Session;
use std::cell::RefCell;
use std::rc::Rc;

/// Session whose confirmations always get `answer`, plus the prompts shown and the call log.
fn session_answering(
    answer: bool,
) -> (Session, Rc<RefCell<Vec<String>>>, Rc<RefCell<CallLog>>) {
    let prompts = Rc::new(RefCell::new(Vec::new()));
    let crm = FakeCrm::new();
    let log = crm.log();
    let session = Session::new(Box::new(crm), ShellConfig::default()).with_confirmer(Box::new(
        FixedConfirmer {
            answer,
            prompts: Rc::clone(&prompts),
        },
    ));
    (session, prompts, log)
}

#[test]
fn test_record_commands_need_a_record() {
    let (mut session, _log) = session();
    for line in ["view", "show Name", "fields", "relationships", "history", "update Name X -y"] {
        let err = session.execute_line(line).unwrap_err();
        assert!(
            matches!(err, ApiError::Navigation(NavigationError::NoRecordSelected)),
            "{} should need a record, got {}",
            line,
            err
        );
    }
}

#[test]
fn test_view_uses_cached_record() {
    let (mut session, log) = session();
    let out = run(&mut session, &["get Account 001A", "view"]);
    assert!(out.contains("Acme Corp"));
    assert!(out.contains("Manufacturing"));
    assert!(out.contains("https://acme.my.salesforce.com/001A"));
    assert_eq!(log.borrow().fetched, vec!["001A".to_string()]);
}

#[test]
fn test_show_reports_missing_fields() {
    let (mut session, _log) = session();
    let out = run(&mut session, &["get Account 001A", "show industry Bogus"]);
    assert!(out.contains("Industry"));
    assert!(out.contains("Manufacturing"));
    assert!(out.contains("Fields not found: Bogus"));

    let err = session.execute_line("show Nope").unwrap_err();
    assert!(matches!(
        err,
        ApiError::Navigation(NavigationError::UnknownField(_))
    ));
}

#[test]
fn test_update_confirmed_writes_coerced_value() {
    let (mut session, prompts, _log) = session_answering(true);
    run(&mut session, &["get Account 001A"]);

    let out = run(&mut session, &["update numberofemployees 300"]);
    assert!(out.contains("Updated NumberOfEmployees = '300'"));
    assert_eq!(prompts.borrow().len(), 1);
    assert!(prompts.borrow()[0].contains("from '250' to '300'"));

    let out = run(&mut session, &["show NumberOfEmployees"]);
    assert!(out.contains("300"), "cache reflects the update: {}", out);
}

#[test]
fn test_update_declined_changes_nothing() {
    let (mut session, prompts, log) = session_answering(false);
    let out = run(&mut session, &["get Account 001A", "update Industry Banking"]);
    assert!(out.contains("Update cancelled."));
    assert!(log.borrow().updates.is_empty());
    assert_eq!(prompts.borrow().len(), 1);
}

#[test]
fn test_update_with_yes_skips_prompt() {
    let (mut session, prompts, log) = session_answering(false);
    run(&mut session, &["get Account 001A", "update Industry Banking and Finance -y"]);

    assert!(prompts.borrow().is_empty());
    let log = log.borrow();
    assert_eq!(log.updates.len(), 1);
    let (object, id, fields) = &log.updates[0];
    assert_eq!(object, "Account");
    assert_eq!(id, "001A");
    assert_eq!(fields.get("Industry"), Some(&json!("Banking and Finance")));
}

#[test]
fn test_update_unknown_field() {
    let (mut session, _log) = session();
    run(&mut session, &["get Account 001A"]);
    let err = session.execute_line("update Colour red -y").unwrap_err();
    assert!(matches!(
        err,
        ApiError::Navigation(NavigationError::UnknownField(_))
    ));
    let err = session.execute_line("update Industry").unwrap_err();
    assert!(matches!(err, ApiError::Input(InputError::Usage(_))));
}

#[test]
fn test_parent_only_for_accounts() {
    let (mut session, _log) = session();
    run(&mut session, &["get Contact 003A"]);
    let err = session.execute_line("parent").unwrap_err();
    assert!(matches!(
        err,
        ApiError::Navigation(NavigationError::AccountOnly {
            command: "parent",
            ..
        })
    ));
    assert!(session.execute_line("children").is_err());
    assert_eq!(session.navigator().depth(), 1);
}

#[test]
fn test_parent_and_ultimate_parent_move_up_the_hierarchy() {
    let (mut session, _log) = session();
    let out = run(&mut session, &["get Account 001A", "parent"]);
    assert!(out.contains("Moved to parent account: Acme Holdings"));
    assert_eq!(session.navigator().depth(), 2);
    assert_eq!(session.navigator().current().unwrap().record_id, "001P");

    run(&mut session, &["ultimateparent"]);
    assert_eq!(session.navigator().current().unwrap().record_id, "001U");

    let out = run(&mut session, &["parent"]);
    assert!(out.contains("Acme Global has no parent account."));
    assert_eq!(session.navigator().depth(), 3);

    run(&mut session, &["cd .."]);
    assert_eq!(session.navigator().current().unwrap().record_id, "001P");
}

#[test]
fn test_parent_with_fields_queries_them_by_id() {
    let (mut session, log) = session();
    let out = run(&mut session, &["get Account 001A", "parent Name NumberOfEmployees"]);
    assert!(out.contains("Moved to parent account: Acme Holdings"));
    assert!(out.contains("NumberOfEmployees"));
    assert_eq!(
        log.borrow().last_select().unwrap(),
        "SELECT Name, NumberOfEmployees FROM Account WHERE Id = '001P'"
    );
    assert_eq!(session.navigator().current().unwrap().record_id, "001P");
}

#[test]
fn test_children_lists_selectable_accounts() {
    let (mut session, log) = session();
    let out = run(&mut session, &["get Account 001A", "children"]);
    assert!(out.contains("Child accounts of Acme Corp"));
    let log_ref = log.borrow();
    assert!(log_ref
        .statements
        .iter()
        .any(|s| s == "SELECT COUNT() FROM Account WHERE ParentId = '001A'"));
    assert!(log_ref
        .last_select()
        .unwrap()
        .ends_with("WHERE ParentId = '001A' ORDER BY Name ASC LIMIT 50"));
    drop(log_ref);

    run(&mut session, &["2"]);
    assert_eq!(session.navigator().current().unwrap().record_id, "001B");
}

#[test]
fn test_history_without_tracking_is_empty() {
    let (mut session, log) = session();
    let out = run(&mut session, &["get Account 001A", "history Industry -n 5"]);
    assert!(out.contains("No field history found"));
    assert_eq!(
        log.borrow().statements.last().unwrap(),
        "SELECT Id, Field, OldValue, NewValue, CreatedDate, CreatedBy.Name FROM AccountHistory \
         WHERE AccountId = '001A' AND Field = 'Industry' ORDER BY CreatedDate DESC LIMIT 5"
    );
}

#[test]
fn test_relationships_and_fields_views() {
    let (mut session, _log) = session();
    let out = run(&mut session, &["get Account 001A", "relationships"]);
    assert!(out.contains("Opportunities"));
    assert!(out.contains("Invoices__r"));
    assert!(!out.contains("AccountShare"), "unnamed relationships are hidden");

    let out = run(&mut session, &["fields"]);
    assert!(out.contains("AnnualRevenue"));
    assert!(out.contains("8 field(s)"));

    let out = run(&mut session, &["ls"]);
    assert!(out.contains("Relationships for Account"));
}

#[test]
fn test_describe_defaults_to_context() {
    let (mut session, _log) = session();
    let err = session.execute_line("describe").unwrap_err();
    assert!(matches!(err, ApiError::Input(InputError::Usage(_))));

    let out = run(&mut session, &["describe Opportunity"]);
    assert!(out.contains("Opportunity"));
    assert!(out.contains("StageName"));

    let out = run(&mut session, &["get Account 001A", "cd Contacts", "describe"]);
    assert!(out.contains("Contact"));
    assert!(out.contains("Email"));
}

#[test]
fn test_objects_listing() {
    let (mut session, _log) = session();
    let out = run(&mut session, &["list objects"]);
    assert!(out.contains("Account"));
    assert!(out.contains("Custom:"));
    assert!(out.contains("Invoice__c"));
    assert!(out.contains("Total: 4 object(s)"));
}

#[test]
fn test_query_results_are_selectable() {
    let (mut session, _log) = session();
    let out = run(&mut session, &["query SELECT Id, Name FROM Opportunity"]);
    assert!(out.contains("Renewal"));
    run(&mut session, &["1"]);
    let frame = session.navigator().current().unwrap();
    assert_eq!(frame.object_type, "Opportunity");
    assert_eq!(frame.record_id, "006A");
}

#[test]
fn test_help_lists_record_commands_in_context() {
    let (mut session, _log) = session();
    let out = run(&mut session, &["help"]);
    assert!(!out.contains("ultimateparent"));
    let out = run(&mut session, &["get Account 001A", "?"]);
    assert!(out.contains("ultimateparent"));
}
