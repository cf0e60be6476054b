//! One-shot CLI commands that need no CRM connection, plus the one-shot bridge.

use crate::integration::test_utils::session;
use clap::Parser;
use sfcli::cli::{run_one_shot, shell_command, Cli, Commands, ConfigCommands, RunContext};
use sfcli::error::ApiError;
use tempfile::TempDir;

#[test]
fn test_init_writes_env_template_once() {
    let temp_dir = TempDir::new().unwrap();
    let context = RunContext::new(temp_dir.path().to_path_buf(), None).unwrap();

    let out = context.execute(&Commands::Init { force: false }).unwrap();
    assert!(out.contains(".env"));
    let content = std::fs::read_to_string(temp_dir.path().join(".env")).unwrap();
    assert!(content.contains("SF_SECURITY_TOKEN="));
    assert!(content.contains("SF_DOMAIN=login"));

    let err = context.execute(&Commands::Init { force: false }).unwrap_err();
    assert!(matches!(err, ApiError::ConfigError(_)));
    assert!(context.execute(&Commands::Init { force: true }).is_ok());
}

#[test]
fn test_config_show_masks_secrets() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("sfcli-test.toml");
    std::fs::write(
        &config_file,
        "[salesforce]\nusername = \"me@example.com\"\npassword = \"hunter2\"\n",
    )
    .unwrap();
    let context = RunContext::new(temp_dir.path().to_path_buf(), Some(config_file)).unwrap();

    let out = context
        .execute(&Commands::Config {
            command: ConfigCommands::Show,
        })
        .unwrap();
    assert!(!out.contains("hunter2"));
    assert!(out.contains("********"));
    assert!(out.contains("[shell]"));
    assert!(out.contains("sfcli-test.toml"));
}

#[test]
fn test_bad_limits_stop_the_run_context() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("limits.toml");
    std::fs::write(&config_file, "[shell]\nsearch_limit = 0\n").unwrap();

    let err = match RunContext::new(temp_dir.path().to_path_buf(), Some(config_file)) {
        Ok(_) => panic!("search_limit = 0 should be rejected"),
        Err(e) => e,
    };
    assert!(matches!(err, ApiError::ConfigError(_)));
    assert!(err.to_string().contains("shell.search_limit must be greater than zero"));
}

#[test]
fn test_one_shot_commands_run_through_a_session() {
    let (mut session, log) = session();

    let cli = Cli::try_parse_from(["sfcli", "objects"]).unwrap();
    let command = shell_command(cli.command.as_ref().unwrap()).unwrap();
    let out = run_one_shot(&mut session, command).unwrap();
    assert!(out.contains("Total: 4 object(s)"));

    let cli = Cli::try_parse_from(["sfcli", "query", "SELECT Id, Name FROM Contact"]).unwrap();
    let command = shell_command(cli.command.as_ref().unwrap()).unwrap();
    let out = run_one_shot(&mut session, command).unwrap();
    assert!(out.contains("Pat Lee"));
    assert_eq!(
        log.borrow().statements.last().unwrap(),
        "SELECT Id, Name FROM Contact"
    );
}

#[test]
fn test_search_limit_must_be_positive() {
    assert!(Cli::try_parse_from(["sfcli", "search", "Account", "Acme", "--limit", "0"]).is_err());
    assert!(Cli::try_parse_from(["sfcli", "search", "Account", "Acme", "-n", "-3"]).is_err());
    assert!(Cli::try_parse_from(["sfcli", "search", "Account", "Acme", "-n", "ten"]).is_err());

    let cli = Cli::try_parse_from(["sfcli", "search", "Account", "Acme", "-n", "5"]).unwrap();
    match cli.command {
        Some(Commands::Search { limit, .. }) => assert_eq!(limit, Some(5)),
        other => panic!("expected search, got {:?}", other),
    }
}
