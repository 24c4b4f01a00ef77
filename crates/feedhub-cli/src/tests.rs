use super::*;
use clap::Parser;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["feedhub-cli"]).expect("parse should succeed");
    assert!(cli.command.is_none());
}

#[test]
fn db_migrate_parses() {
    let cli = Cli::try_parse_from(["feedhub-cli", "db", "migrate"]).expect("parse should succeed");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn add_feed_parses_feed_type() {
    let cli = Cli::try_parse_from([
        "feedhub-cli",
        "add-feed",
        "--url",
        "https://example.com/rss.xml",
        "--name",
        "Example",
        "--feed-type",
        "atom",
    ])
    .expect("parse should succeed");
    match cli.command {
        Some(Commands::AddFeed {
            url,
            name,
            feed_type,
            description,
            image_url,
        }) => {
            assert_eq!(url, "https://example.com/rss.xml");
            assert_eq!(name, "Example");
            assert_eq!(feed_type, Some(FeedType::Atom));
            assert!(description.is_none());
            assert!(image_url.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn add_feed_rejects_unknown_feed_type() {
    let result = Cli::try_parse_from([
        "feedhub-cli",
        "add-feed",
        "--url",
        "https://example.com/feed",
        "--name",
        "Example",
        "--feed-type",
        "json",
    ]);
    assert!(result.is_err());
}

#[test]
fn add_feed_requires_url() {
    let result = Cli::try_parse_from(["feedhub-cli", "add-feed", "--name", "Example"]);
    assert!(result.is_err());
}

#[test]
fn follow_rejects_invalid_uuid() {
    let result = Cli::try_parse_from([
        "feedhub-cli",
        "follow",
        "--user",
        "not-a-uuid",
        "--feed",
        "00000000-0000-0000-0000-000000000001",
    ]);
    assert!(result.is_err());
}

#[test]
fn tick_parses() {
    let cli = Cli::try_parse_from(["feedhub-cli", "tick"]).expect("parse should succeed");
    assert!(matches!(cli.command, Some(Commands::Tick)));
}

#[test]
fn errors_defaults() {
    let cli = Cli::try_parse_from(["feedhub-cli", "errors"]).expect("parse should succeed");
    assert!(matches!(
        cli.command,
        Some(Commands::Errors {
            unresolved: false,
            limit: 50,
            offset: 0,
            mark_notified: false
        })
    ));
}

#[test]
fn errors_flags_parse() {
    let cli = Cli::try_parse_from([
        "feedhub-cli",
        "errors",
        "--unresolved",
        "--limit",
        "5",
        "--offset",
        "10",
        "--mark-notified",
    ])
    .expect("parse should succeed");
    assert!(matches!(
        cli.command,
        Some(Commands::Errors {
            unresolved: true,
            limit: 5,
            offset: 10,
            mark_notified: true
        })
    ));
}

#[test]
fn resolve_error_takes_notes() {
    let cli = Cli::try_parse_from(["feedhub-cli", "resolve-error", "42", "--notes", "dns fixed"])
        .expect("parse should succeed");
    match cli.command {
        Some(Commands::ResolveError { id, notes }) => {
            assert_eq!(id, 42);
            assert_eq!(notes.as_deref(), Some("dns fixed"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn notifications_accepts_negative_interval() {
    let cli = Cli::try_parse_from([
        "feedhub-cli",
        "notifications",
        "--user",
        "00000000-0000-0000-0000-000000000001",
        "--interval=-5",
    ])
    .expect("parse should succeed");
    assert!(matches!(
        cli.command,
        Some(Commands::Notifications {
            interval: Some(-5),
            ..
        })
    ));
}
