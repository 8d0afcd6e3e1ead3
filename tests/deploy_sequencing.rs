#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the three sequencers, driven through
//! [`deploy::run`] with a scripted runner.

mod common;

use std::sync::Arc;

use common::{ScriptedRunner, TestRoot, context};
use dotfiles_installer::config::Config;
use dotfiles_installer::config::catalog::{InstallMode, Profile, WINDOWS_COMPONENTS};
use dotfiles_installer::deploy::policy::{OutcomePolicy, WindowsPolicy};
use dotfiles_installer::deploy::{self, Cancellation, RunRequest, SYNC_KEY, Target};
use dotfiles_installer::remote::HostKeyPolicy;

const REGISTRY: &str = "\
machines:
  devbox:
    user: alice
    host: 10.0.0.5
    os: linux
  gaming-pc:
    user: alice
    host: 10.0.0.6
    password: hunter2
    os: windows
";

fn target(root: &TestRoot, name: &str) -> Target {
    let config = Config::load(root.path());
    Target::remote(config.machines.get(name).expect("machine").clone())
}

// ---------------------------------------------------------------------------
// Local
// ---------------------------------------------------------------------------

#[test]
fn local_report_keys_match_selection_when_all_succeed() {
    let root = TestRoot::new();
    let runner = Arc::new(ScriptedRunner::succeeding());
    let (ctx, reporter) = context(root.path(), runner.clone());
    let request = RunRequest::new(
        Target::Local,
        Profile::Medium.components().iter().copied(),
        InstallMode::Full,
    )
    .unwrap();

    let report = deploy::run(&request, &ctx);

    assert_eq!(
        report.keys().collect::<Vec<_>>(),
        Profile::Medium.components()
    );
    assert!(report.all_ok());
    assert_eq!(runner.calls().len(), 5);
    let progress = reporter.progress();
    assert_eq!(progress.len(), 5);
    for (i, (index, total, component)) in progress.iter().enumerate() {
        assert_eq!(*index, i);
        assert_eq!(*total, 5);
        assert_eq!(component, Profile::Medium.components()[i]);
    }
}

#[test]
fn local_report_keys_match_selection_when_all_fail() {
    let root = TestRoot::new();
    let runner = Arc::new(ScriptedRunner::failing());
    let (ctx, _) = context(root.path(), runner.clone());
    let request = RunRequest::new(Target::Local, ["zsh", "git"], InstallMode::Update).unwrap();

    let report = deploy::run(&request, &ctx);

    assert_eq!(report.keys().collect::<Vec<_>>(), ["zsh", "git"]);
    assert_eq!(report.failed(), 2);
    assert_eq!(runner.calls().len(), 2, "a failure does not stop the run");
}

#[test]
fn cancelled_local_run_records_remaining_components() {
    let root = TestRoot::new();
    let runner = Arc::new(ScriptedRunner::succeeding());
    let cancel = Cancellation::new();
    let (ctx, _) = context(root.path(), runner.clone());
    let ctx = ctx.with_cancellation(cancel.clone());
    cancel.cancel();
    let request = RunRequest::new(Target::Local, ["zsh", "git"], InstallMode::Full).unwrap();

    let report = deploy::run(&request, &ctx);

    assert!(report.is_cancelled());
    assert_eq!(report.get("zsh"), Some(false));
    assert_eq!(report.get("git"), Some(false));
    assert!(runner.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Remote Unix
// ---------------------------------------------------------------------------

#[test]
fn unix_deploy_syncs_then_runs_each_setup() {
    let root = TestRoot::new().with_machines(REGISTRY);
    let runner = Arc::new(ScriptedRunner::succeeding());
    let (ctx, reporter) = context(root.path(), runner.clone());
    let request =
        RunRequest::new(target(&root, "devbox"), ["zsh", "tmux"], InstallMode::Full).unwrap();

    let report = deploy::run(&request, &ctx);

    assert!(report.all_ok());
    let calls = runner.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].program(), "rsync");
    assert_eq!(calls[1].program(), "ssh");
    assert!(calls[1].last_arg().unwrap().ends_with("setup_zsh"));
    assert!(calls[2].last_arg().unwrap().ends_with("setup_tmux"));
    assert!(reporter.lines().contains(&"Sync complete".to_string()));
}

#[test]
fn unix_sync_failure_runs_nothing() {
    let root = TestRoot::new().with_machines(REGISTRY);
    let runner = Arc::new(
        ScriptedRunner::with_responses(vec![(false, vec!["rsync: connection refused"])])
            .then(true),
    );
    let (ctx, reporter) = context(root.path(), runner.clone());
    let request =
        RunRequest::new(target(&root, "devbox"), ["zsh", "git"], InstallMode::Full).unwrap();

    let report = deploy::run(&request, &ctx);

    assert_eq!(report.results(), [(SYNC_KEY.to_string(), false)]);
    assert_eq!(runner.calls().len(), 1);
    assert!(reporter.progress().is_empty());
    assert!(
        reporter
            .lines()
            .contains(&"rsync: connection refused".to_string())
    );
}

#[test]
fn strict_host_keys_drop_relaxed_options() {
    let root = TestRoot::new().with_machines(REGISTRY);
    let runner = Arc::new(ScriptedRunner::succeeding());
    let (ctx, _) = context(root.path(), runner.clone());
    let ctx = ctx.with_host_keys(HostKeyPolicy::Strict);
    let request = RunRequest::new(target(&root, "devbox"), ["git"], InstallMode::Full).unwrap();

    let _ = deploy::run(&request, &ctx);

    for call in runner.calls() {
        assert!(
            !call
                .arguments()
                .iter()
                .any(|a| a.contains("StrictHostKeyChecking")),
            "{call}"
        );
    }
}

// ---------------------------------------------------------------------------
// Remote Windows
// ---------------------------------------------------------------------------

#[test]
fn windows_password_never_reaches_the_command_line() {
    let root = TestRoot::new().with_machines(REGISTRY);
    let runner = Arc::new(ScriptedRunner::succeeding());
    let (ctx, _) = context(root.path(), runner.clone());
    let request =
        RunRequest::new(target(&root, "gaming-pc"), ["system"], InstallMode::Full).unwrap();

    let report = deploy::run(&request, &ctx);

    assert_eq!(report.get("system"), Some(true));
    for call in runner.calls() {
        assert_eq!(call.program(), "sshpass");
        assert_eq!(call.env_var("SSHPASS"), Some("hunter2"));
        assert!(call.arguments().iter().all(|a| !a.contains("hunter2")));
        assert!(!format!("{call:?}").contains("hunter2"));
    }
}

#[test]
fn windows_full_catalog_records_every_component() {
    let root = TestRoot::new()
        .with_machines(REGISTRY)
        .with_extensions("ms-python.python\n");
    let runner = Arc::new(ScriptedRunner::failing());
    let (ctx, reporter) = context(root.path(), runner.clone());
    let ids: Vec<&str> = WINDOWS_COMPONENTS.iter().map(|c| c.id).collect();
    let request =
        RunRequest::new(target(&root, "gaming-pc"), ids.clone(), InstallMode::Full).unwrap();

    let report = deploy::run(&request, &ctx);

    assert_eq!(report.keys().collect::<Vec<_>>(), ids);
    // Everything failed, yet only best-effort rules apply.
    assert_eq!(report.get("debloat"), Some(true));
    assert_eq!(report.get("telemetry"), Some(true));
    assert_eq!(report.get("system"), Some(true));
    assert_eq!(report.get("chrome"), Some(true));
    assert_eq!(reporter.progress().len(), ids.len());
}

#[test]
fn windows_strict_chrome_policy_reports_failure() {
    let root = TestRoot::new().with_machines(REGISTRY);
    let runner = Arc::new(ScriptedRunner::failing());
    let (ctx, _) = context(root.path(), runner);
    let ctx = ctx.with_windows_policy(WindowsPolicy {
        chrome: OutcomePolicy::Strict,
        ..WindowsPolicy::default()
    });
    let request =
        RunRequest::new(target(&root, "gaming-pc"), ["chrome"], InstallMode::Full).unwrap();

    assert_eq!(deploy::run(&request, &ctx).get("chrome"), Some(false));
}

#[test]
fn windows_extensions_are_capped_in_file_order() {
    let mut content = String::from("# editor extensions\n\n");
    for i in 0..12 {
        content.push_str(&format!("publisher.ext{i:02}\n"));
    }
    content.push_str("# trailing comment\n");
    let root = TestRoot::new()
        .with_machines(REGISTRY)
        .with_extensions(&content);
    let runner = Arc::new(ScriptedRunner::succeeding());
    let (ctx, _) = context(root.path(), runner.clone());
    let request =
        RunRequest::new(target(&root, "gaming-pc"), ["vscode"], InstallMode::Full).unwrap();

    let report = deploy::run(&request, &ctx);

    assert_eq!(report.get("vscode"), Some(true));
    let installs: Vec<String> = runner
        .remote_commands()
        .into_iter()
        .filter(|c| c.contains("--install-extension"))
        .collect();
    assert_eq!(installs.len(), 10);
    for (i, cmd) in installs.iter().enumerate() {
        assert!(cmd.contains(&format!("publisher.ext{i:02}")), "{cmd}");
    }
}
