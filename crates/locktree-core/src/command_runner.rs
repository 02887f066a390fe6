use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, anyhow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Blocking process boundary. Every git and git-lfs invocation goes through it.
pub trait CommandRunner {
    /// Runs `program`, feeding `input` to its stdin when given.
    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        input: Option<&str>,
    ) -> anyhow::Result<CommandOutput>;

    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> anyhow::Result<CommandOutput> {
        self.run_with_input(program, args, cwd, None)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        input: Option<&str>,
    ) -> anyhow::Result<CommandOutput> {
        let mut command = Command::new(program);
        command.args(args);

        if let Some(working_directory) = cwd {
            command.current_dir(working_directory);
        }

        // git-lfs prompts for credentials on a tty otherwise.
        command.env("GIT_TERMINAL_PROMPT", "0");

        let output = match input {
            None => command.output()?,
            Some(input) => {
                command
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
                let mut child = command.spawn()?;
                let mut stdin = child
                    .stdin
                    .take()
                    .ok_or_else(|| anyhow!("{program} stdin was not captured"))?;

                // Written from a second thread so a full stdout pipe cannot stall the child.
                let input = input.to_string();
                let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));
                let output = child.wait_with_output()?;
                writer
                    .join()
                    .map_err(|_| anyhow!("{program} stdin writer panicked"))?
                    .with_context(|| format!("failed to write {program} stdin"))?;
                output
            }
        };

        Ok(CommandOutput {
            status_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
