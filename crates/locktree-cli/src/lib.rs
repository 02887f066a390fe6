pub mod cli;
pub mod diagnostics;
pub mod dispatch;

use anyhow::Result;
use clap::Parser;
use locktree_app::App;
use locktree_core::command_runner::SystemCommandRunner;

use crate::cli::Cli;
use crate::diagnostics::DiagnosticsSession;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let diagnostics = DiagnosticsSession::initialize(cli.diagnostics)?;
    if let Some(path) = diagnostics.path() {
        eprintln!("Diagnostics enabled: {}", path.display());
    }

    let command_runner = SystemCommandRunner::new();
    let app = App::new(&command_runner);

    dispatch::run_with_deps(cli, &app, &diagnostics)
}
