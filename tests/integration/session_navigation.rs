//! Navigation through a session: search, quick-select, cd and ls.

use crate::integration::test_utils::{record, run, session, session_with, FakeCrm};
use serde_json::json;
use sfcli::error::{ApiError, InputError, NavigationError};
use sfcli::shell::Outcome;

#[test]
fn test_cd_up_at_root_is_noop() {
    let (mut session, log) = session();
    let out = run(&mut session, &["cd .."]);
    assert!(out.contains("Already at root level."));
    assert_eq!(session.navigator().depth(), 0);
    assert!(session.navigator().results().is_none());
    assert!(log.borrow().statements.is_empty());
}

#[test]
fn test_search_falls_back_to_like_and_counts() {
    let (mut session, log) = session();
    let out = run(&mut session, &["search Account Acme"]);

    assert!(out.contains("Acme Corp"));
    assert!(out.contains("Type a number to select a record."));
    let log = log.borrow();
    assert!(log.statements[0].starts_with("FIND {Acme} IN ALL FIELDS RETURNING Account("));
    assert_eq!(
        log.statements[1],
        "SELECT Id, Name, ParentId, ShippingStreet, ShippingCity, ShippingState, ShippingPostalCode \
         FROM Account WHERE Name LIKE '%Acme%' ORDER BY Name ASC LIMIT 200"
    );
    assert_eq!(
        log.statements[2],
        "SELECT COUNT() FROM Account WHERE Name LIKE '%Acme%'"
    );
    assert_eq!(session.navigator().results().map(|r| r.len()), Some(2));
    assert_eq!(session.prompt(), "sf [Account]> ");
}

#[test]
fn test_search_uses_sosl_hits_when_present() {
    let hit = record("Account", json!({ "Id": "001A", "Name": "Acme Corp" }));
    let (mut session, log) = session_with(FakeCrm::new().with_sosl_hits(vec![hit]));
    run(&mut session, &["search Account Acme"]);

    let log = log.borrow();
    assert!(log.statements[0].starts_with("FIND "));
    assert!(log.last_select().is_none(), "no LIKE query after a SOSL hit");
    assert_eq!(session.navigator().results().map(|r| r.len()), Some(1));
}

#[test]
fn test_search_term_quote_is_escaped() {
    let (mut session, log) = session();
    run(&mut session, &["search Contact O'Brien"]);

    let log = log.borrow();
    let select = log.last_select().unwrap();
    assert!(
        select.contains(r"WHERE Name LIKE '%O\'Brien%'"),
        "unescaped quote in: {}",
        select
    );
    assert!(log.statements[0].contains(r"O\'Brien"));
}

#[test]
fn test_search_limit_is_clamped() {
    let (mut session, log) = session();
    run(&mut session, &["search Account Acme --limit 5000"]);
    assert!(log.borrow().last_select().unwrap().ends_with("LIMIT 2000"));
}

#[test]
fn test_quick_select_pushes_exactly_one_frame() {
    let (mut session, log) = session();
    run(&mut session, &["search Account Acme"]);

    let err = session.execute_line("5").unwrap_err();
    assert!(matches!(
        err,
        ApiError::Navigation(NavigationError::SelectionOutOfRange { index: 5, len: 2 })
    ));
    assert_eq!(session.navigator().depth(), 0);
    assert!(session.execute_line("0").is_err());
    assert_eq!(session.navigator().depth(), 0);

    let out = run(&mut session, &["2"]);
    assert!(out.contains("Selected Account: Acme West"));
    assert_eq!(session.navigator().depth(), 1);
    let frame = session.navigator().current().unwrap();
    assert_eq!(frame.record_id, "001B");
    assert_eq!(frame.object_type, "Account");
    assert_eq!(log.borrow().fetched, vec!["001B".to_string()]);
    assert_eq!(session.prompt(), "sf [Account:Acme West]> ");
}

#[test]
fn test_select_without_results() {
    let (mut session, _log) = session();
    let err = session.execute_line("1").unwrap_err();
    assert!(matches!(
        err,
        ApiError::Navigation(NavigationError::NothingToSelect)
    ));
}

#[test]
fn test_leaving_a_record_restores_search_results() {
    let (mut session, _log) = session();
    run(&mut session, &["search Account Acme", "1"]);
    assert!(session.navigator().results().is_none());

    let out = run(&mut session, &["cd .."]);
    assert!(out.contains("Now at root"));
    assert_eq!(session.navigator().depth(), 0);
    assert_eq!(session.navigator().results().map(|r| r.len()), Some(2));

    run(&mut session, &["2"]);
    assert_eq!(session.navigator().current().unwrap().record_id, "001B");
}

#[test]
fn test_search_resets_the_stack() {
    let (mut session, _log) = session();
    run(&mut session, &["search Account Acme", "1", "cd Opportunities"]);
    assert_eq!(session.navigator().depth(), 2);

    run(&mut session, &["search Account West"]);
    assert_eq!(session.navigator().depth(), 0);
    assert!(session.navigator().results().is_some());
}

#[test]
fn test_cd_relationship_requires_record() {
    let (mut session, _log) = session();
    let err = session.execute_line("cd Opportunities").unwrap_err();
    assert!(matches!(
        err,
        ApiError::Navigation(NavigationError::NoRecordSelected)
    ));

    run(&mut session, &["get Account 001A", "cd Opportunities"]);
    assert_eq!(session.navigator().depth(), 2);
    assert_eq!(session.prompt(), "sf [Account:Acme Corp / Opportunities]> ");
    let frame = session.navigator().current().unwrap();
    assert_eq!(frame.relationship_name(), Some("Opportunities"));
}

#[test]
fn test_cd_relationship_lists_selectable_records() {
    let (mut session, log) = session();
    let out = run(&mut session, &["get Account 001A", "cd Contacts"]);
    assert!(out.contains("Pat Lee"));
    assert!(log
        .borrow()
        .last_select()
        .unwrap()
        .ends_with("FROM Contact WHERE AccountId = '001A' LIMIT 10"));

    run(&mut session, &["1"]);
    assert_eq!(session.navigator().depth(), 3);
    assert_eq!(session.navigator().current().unwrap().record_id, "003A");
}

#[test]
fn test_relationship_names_match_loosely() {
    let (mut session, _log) = session();
    run(&mut session, &["get Account 001A", "cd opportunities"]);
    assert_eq!(
        session.navigator().current().unwrap().relationship_name(),
        Some("Opportunities")
    );

    run(&mut session, &["cd ..", "cd Invoices__c"]);
    assert_eq!(
        session.navigator().current().unwrap().relationship_name(),
        Some("Invoices__r")
    );

    run(&mut session, &["cd .."]);
    let err = session.execute_line("cd Widgets").unwrap_err();
    assert!(matches!(
        err,
        ApiError::Navigation(NavigationError::UnknownRelationship { .. })
    ));
}

#[test]
fn test_ls_limits_in_relationship() {
    let (mut session, log) = session();
    run(&mut session, &["get Account 001A", "cd Opportunities", "ls"]);
    assert_eq!(
        log.borrow().last_select().unwrap(),
        "SELECT Id, Name, Amount, StageName, CloseDate FROM Opportunity \
         WHERE AccountId = '001A' LIMIT 10"
    );

    run(&mut session, &["ls -n 50"]);
    assert!(log.borrow().last_select().unwrap().ends_with("LIMIT 50"));

    run(&mut session, &["ls -n 5000"]);
    assert!(log.borrow().last_select().unwrap().ends_with("LIMIT 2000"));

    run(&mut session, &["ls --all"]);
    assert!(log.borrow().last_select().unwrap().ends_with("LIMIT 2000"));

    let err = session.execute_line("ls -n 0").unwrap_err();
    assert!(matches!(err, ApiError::Input(InputError::InvalidLimit(_))));
}

#[test]
fn test_ls_sort_direction() {
    let (mut session, log) = session();
    run(
        &mut session,
        &["get Account 001A", "cd Opportunities", "ls | sort CloseDate -desc"],
    );
    assert!(log
        .borrow()
        .last_select()
        .unwrap()
        .ends_with("WHERE AccountId = '001A' ORDER BY CloseDate DESC LIMIT 10"));

    run(&mut session, &["ls -n 3 | sort Amount -asc"]);
    assert!(log
        .borrow()
        .last_select()
        .unwrap()
        .ends_with("ORDER BY Amount ASC LIMIT 3"));
}

#[test]
fn test_ls_sorts_search_results_locally() {
    let (mut session, log) = session();
    run(&mut session, &["search Account Acme"]);
    let before = log.borrow().statements.len();

    let out = run(&mut session, &["ls | sort NumberOfEmployees -asc"]);
    assert_eq!(log.borrow().statements.len(), before, "sorted without a query");
    let west = out.find("Acme West").unwrap();
    let corp = out.find("Acme Corp").unwrap();
    assert!(west < corp);

    let first = session.navigator().results().unwrap().get(1).unwrap();
    assert_eq!(first.id(), Some("001B"));

    let err = session.execute_line("ls | sort Bogus").unwrap_err();
    assert!(matches!(
        err,
        ApiError::Navigation(NavigationError::UnknownSortField { .. })
    ));
}

#[test]
fn test_select_from_related_listing_and_back() {
    let (mut session, _log) = session();
    run(&mut session, &["get Account 001A", "related Opportunities", "2"]);
    assert_eq!(session.navigator().depth(), 3);
    assert_eq!(session.navigator().current().unwrap().record_id, "006B");

    run(&mut session, &["cd .."]);
    assert_eq!(session.navigator().depth(), 2);
    assert_eq!(
        session.navigator().results().map(|r| r.object_type.as_str()),
        Some("Opportunity")
    );

    run(&mut session, &["cd /"]);
    assert_eq!(session.navigator().depth(), 0);
    assert_eq!(session.prompt(), "sf> ");
}

#[test]
fn test_cd_up_two_levels() {
    let (mut session, _log) = session();
    run(&mut session, &["get Account 001A", "cd Contacts", "1", "cd ../.."]);
    assert_eq!(session.navigator().depth(), 1);
    assert_eq!(session.navigator().current().unwrap().record_id, "001A");
}

#[test]
fn test_errors_do_not_end_the_session() {
    let (mut session, _log) = session();
    let err = session.execute_line("frobnicate now").unwrap_err();
    assert!(!err.is_fatal());
    assert!(err.to_string().contains("Unknown command: frobnicate"));

    let err = session.execute_line("get Account 001Z").unwrap_err();
    assert!(!err.is_fatal());
    assert_eq!(session.navigator().depth(), 0);

    assert_eq!(session.execute_line("exit").unwrap(), Outcome::Exit);
}
