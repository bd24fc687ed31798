// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use clap::CommandFactory;
use yare::parameterized;

#[test]
fn command_definition_is_valid() {
    Cli::command().debug_assert();
}

#[parameterized(
    post = { "post", ActionKind::Post },
    message = { "message", ActionKind::Message },
    draft_any_case = { "Draft", ActionKind::Draft },
)]
fn enqueue_parses_kind(arg: &str, expected: ActionKind) {
    let cli = Cli::try_parse_from(["tether", "enqueue", arg, "{}"]).unwrap();
    match cli.command {
        Command::Enqueue { kind, payload } => {
            assert_eq!(kind, expected);
            assert_eq!(payload, "{}");
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn unknown_kind_is_rejected() {
    assert!(Cli::try_parse_from(["tether", "enqueue", "story", "{}"]).is_err());
}

#[test]
fn global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["tether", "pending", "-vv", "--data-dir", "/tmp/t"]).unwrap();
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/t")));
}

#[test]
fn agent_cache_requires_urls() {
    assert!(Cli::try_parse_from(["tether", "agent", "cache"]).is_err());
    let cli = Cli::try_parse_from(["tether", "agent", "cache", "/a", "/b"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Agent(AgentCommand::Cache { ref urls }) if urls.len() == 2
    ));
}
