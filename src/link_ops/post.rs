//! Post-install actions: a free-form shell command run unelevated after a
//! verified install. Failures are reported, never fatal; the install has
//! already succeeded by the time this runs.

use tracing::{info, warn};

use crate::errors::LinkError;
use crate::exec::{CommandLine, CommandRunner, Elevation};

#[derive(Debug, Clone)]
pub struct PostOutcome {
    pub ok: bool,
    pub output: String,
}

pub fn run_post_action(
    runner: &dyn CommandRunner,
    command: &str,
) -> Result<PostOutcome, LinkError> {
    // Advisory check that the first word resolves to something runnable;
    // the command still runs either way since shell builtins never resolve.
    if let Ok(words) = shell_words::split(command)
        && let Some(program) = words.first()
        && which::which(program).is_err()
    {
        warn!(program = %program, "post-install program not found on PATH");
    }

    let cmd = CommandLine::new("sh").arg("-c").arg(command);
    let out = runner.run(&cmd, Elevation::None)?;
    let output = out.combined();
    if out.success {
        info!(command, "post-install command ran");
    } else {
        warn!(command, output = %output, "post-install command failed");
    }
    Ok(PostOutcome {
        ok: out.success,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{ExecOutput, ScriptedRunner};

    #[test]
    fn command_goes_through_sh_dash_c() {
        let runner = ScriptedRunner::new();
        let outcome = run_post_action(
            &runner,
            "defaults write com.apple.dock autohide -bool true",
        )
        .unwrap();
        assert!(outcome.ok);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.starts_with("sh -c "));
        assert_eq!(calls[0].1, Elevation::None);
    }

    #[test]
    fn failure_is_reported_not_raised() {
        let runner = ScriptedRunner::with_responses([ExecOutput::fail("no such domain")]);
        let outcome = run_post_action(&runner, "defaults read nope").unwrap();
        assert!(!outcome.ok);
        assert_eq!(outcome.output, "no such domain");
    }
}
