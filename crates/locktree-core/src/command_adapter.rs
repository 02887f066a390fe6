use std::path::Path;

use crate::command_runner::{CommandOutput, CommandRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandFailure {
    pub(crate) command: String,
    pub(crate) status: i32,
    pub(crate) stderr: String,
}

pub(crate) fn run_program(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<CommandOutput, String> {
    run_program_with_input(runner, program, args, cwd, None)
}

pub(crate) fn run_program_with_input(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    input: Option<&str>,
) -> Result<CommandOutput, String> {
    runner
        .run_with_input(program, args, cwd, input)
        .map_err(|error| format!("{program}: {error}"))
}

/// Treats the listed exit codes as success, everything else as a failure.
pub(crate) fn ensure_status(
    args: &[&str],
    output: CommandOutput,
    accepted: &[i32],
) -> Result<CommandOutput, CommandFailure> {
    if accepted.contains(&output.status_code) {
        return Ok(output);
    }

    let stderr = output.stderr.trim();
    Err(CommandFailure {
        command: args.join(" "),
        status: output.status_code,
        stderr: if stderr.is_empty() {
            output.stdout.trim().to_string()
        } else {
            stderr.to_string()
        },
    })
}

pub(crate) fn ensure_success(
    args: &[&str],
    output: CommandOutput,
) -> Result<CommandOutput, CommandFailure> {
    ensure_status(args, output, &[0])
}
