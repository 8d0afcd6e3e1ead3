//! Local installation: one `bash -c` invocation per component.
use std::path::Path;

use super::{Context, RunReport, RunRequest, for_each_component};
use crate::config::catalog::{InstallMode, is_setup_name};
use crate::exec::CommandSpec;

/// Shell snippet that loads the setup library and runs `setup_<component>`.
///
/// `set -e` makes any failing command inside the setup routine surface as a
/// non-zero exit of the whole invocation.
#[must_use]
pub fn setup_script(root: &Path, component: &str, mode: InstallMode) -> String {
    let root = root.display();
    format!(
        "set -e
source \"{root}/lib/utils.sh\"
source \"{root}/lib/os.sh\"
source \"{root}/lib/packages.sh\"
{flags}
detect_os
setup_{component}
",
        flags = mode.shell_flags()
    )
}

/// The process invocation for one component.
#[must_use]
pub fn setup_command(root: &Path, component: &str, mode: InstallMode) -> CommandSpec {
    CommandSpec::new("bash")
        .arg("-c")
        .arg(setup_script(root, component, mode))
        .current_dir(root)
        .missing_hint("bash is not installed (required for local installation)")
}

/// Install every selected component on this machine, in order.
///
/// A failing component does not stop the run.
#[must_use]
pub fn install(request: &RunRequest, ctx: &Context) -> RunReport {
    let mut report = RunReport::new(request.target());
    let mode = request.mode();
    for_each_component(request, ctx, &mut report, |component| {
        if !is_setup_name(component) {
            ctx.say(&format!("Error: invalid component id '{component}'"));
            return false;
        }
        tracing::debug!("local setup_{component} ({mode})");
        ctx.exec(&setup_command(&ctx.root, component, mode))
    });
    report
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::deploy::Target;
    use crate::deploy::test_helpers::{ScriptedRunner, make_context};

    fn request(components: &[&str], mode: InstallMode) -> RunRequest {
        RunRequest::new(Target::Local, components.iter().copied(), mode).unwrap()
    }

    #[test]
    fn script_sources_libraries_then_calls_setup() {
        let script = setup_script(Path::new("/home/me/dotfiles"), "zsh", InstallMode::Config);
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(
            lines,
            vec![
                "set -e",
                "source \"/home/me/dotfiles/lib/utils.sh\"",
                "source \"/home/me/dotfiles/lib/os.sh\"",
                "source \"/home/me/dotfiles/lib/packages.sh\"",
                "USE_SUDO=false; UPDATE_MODE=false",
                "detect_os",
                "setup_zsh",
            ]
        );
    }

    #[test]
    fn command_runs_bash_in_root() {
        let spec = setup_command(Path::new("/d"), "git", InstallMode::Full);
        assert_eq!(spec.program(), "bash");
        assert_eq!(spec.arguments()[0], "-c");
        assert_eq!(spec.cwd(), Some(Path::new("/d")));
        assert!(spec.arguments()[1].contains("USE_SUDO=true; UPDATE_MODE=false"));
    }

    #[test]
    fn all_success_key_set_equals_selection() {
        let runner = Arc::new(ScriptedRunner::succeeding());
        let (ctx, _) = make_context("/d", runner.clone());
        let report = install(&request(&["zsh", "vim", "git"], InstallMode::Full), &ctx);
        assert_eq!(report.keys().collect::<Vec<_>>(), vec!["zsh", "vim", "git"]);
        assert!(report.all_ok());
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn all_failure_still_attempts_every_component() {
        let runner = Arc::new(ScriptedRunner::failing());
        let (ctx, _) = make_context("/d", runner.clone());
        let report = install(&request(&["zsh", "vim", "git"], InstallMode::Full), &ctx);
        assert_eq!(report.keys().collect::<Vec<_>>(), vec!["zsh", "vim", "git"]);
        assert_eq!(report.failed(), 3);
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn progress_follows_input_order() {
        let runner = Arc::new(ScriptedRunner::succeeding());
        let (ctx, reporter) = make_context("/d", runner);
        let _ = install(
            &request(&["git", "editorconfig", "zsh"], InstallMode::Full),
            &ctx,
        );
        assert_eq!(
            reporter.progress(),
            vec![
                (0, 3, "git".to_string()),
                (1, 3, "editorconfig".to_string()),
                (2, 3, "zsh".to_string()),
            ]
        );
    }

    #[test]
    fn mode_flags_reach_every_invocation() {
        let runner = Arc::new(ScriptedRunner::succeeding());
        let (ctx, _) = make_context("/d", runner.clone());
        let _ = install(&request(&["zsh", "git"], InstallMode::Update), &ctx);
        for call in runner.calls() {
            assert!(call.arguments()[1].contains("USE_SUDO=true; UPDATE_MODE=true"));
        }
    }

    #[test]
    fn partial_failure_is_recorded_per_component() {
        let runner = Arc::new(ScriptedRunner::with_responses(vec![
            (true, vec!["ok"]),
            (false, vec!["boom"]),
            (true, vec![]),
        ]));
        let (ctx, reporter) = make_context("/d", runner);
        let report = install(&request(&["zsh", "vim", "git"], InstallMode::Full), &ctx);
        assert_eq!(report.get("zsh"), Some(true));
        assert_eq!(report.get("vim"), Some(false));
        assert_eq!(report.get("git"), Some(true));
        assert_eq!(reporter.lines(), vec!["ok", "boom"]);
    }

    #[test]
    fn unsafe_id_is_rejected_without_running() {
        let runner = Arc::new(ScriptedRunner::succeeding());
        let (ctx, reporter) = make_context("/d", runner.clone());
        let report = install(&request(&["zsh; reboot"], InstallMode::Full), &ctx);
        assert_eq!(report.get("zsh; reboot"), Some(false));
        assert!(runner.calls().is_empty());
        assert!(reporter.lines()[0].starts_with("Error: invalid component id"));
    }
}
