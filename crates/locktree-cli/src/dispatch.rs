use anyhow::Result;
use comfy_table::{Cell, ContentArrangement, Table};
use locktree_app::{App, LockController, LockOutcome, StatusReport};
use locktree_core::doctor::{CheckState, DoctorReport};
use locktree_core::lfs::LockAction;

use crate::cli::{Cli, Command};
use crate::diagnostics::{DiagnosticsSession, Event};

pub fn run_with_deps(cli: Cli, app: &App<'_>, diagnostics: &DiagnosticsSession) -> Result<()> {
    let result = match cli.command {
        Some(Command::Doctor) => run_doctor_command(app, diagnostics),
        Some(Command::Status) => run_status_command(app, diagnostics),
        Some(Command::Lock { path }) => {
            run_lock_command(app, diagnostics, &path, LockAction::Lock)
        }
        Some(Command::Unlock { path }) => {
            run_lock_command(app, diagnostics, &path, LockAction::Unlock)
        }
        None => run_root_command(app, diagnostics),
    };

    if let Err(error) = &result {
        diagnostics.record(Event::Failed(error));
    }

    result
}

fn open_controller(app: &App<'_>, diagnostics: &DiagnosticsSession) -> Result<LockController> {
    let config = app.ensure_config_ready()?;
    let repository = app.ensure_repository_ready(&config)?;
    diagnostics.record(Event::Opening(&repository));

    let controller = app.open(repository)?;
    diagnostics.record(Event::Loaded(&controller));

    Ok(controller)
}

fn run_root_command(app: &App<'_>, diagnostics: &DiagnosticsSession) -> Result<()> {
    diagnostics.record(Event::Command("root"));
    let controller = open_controller(app, diagnostics)?;

    let summary = locktree_tui::run_root(app, controller)?;
    diagnostics.record(Event::TreeClosed(summary));

    Ok(())
}

fn run_doctor_command(app: &App<'_>, diagnostics: &DiagnosticsSession) -> Result<()> {
    diagnostics.record(Event::Command("doctor"));
    let report = app.doctor()?;
    diagnostics.record(Event::Doctor(&report.summary()));
    print_doctor_report(&report);
    Ok(())
}

fn run_status_command(app: &App<'_>, diagnostics: &DiagnosticsSession) -> Result<()> {
    diagnostics.record(Event::Command("status"));
    let controller = open_controller(app, diagnostics)?;
    print_status_report(&controller.status_report());
    Ok(())
}

fn run_lock_command(
    app: &App<'_>,
    diagnostics: &DiagnosticsSession,
    path: &str,
    action: LockAction,
) -> Result<()> {
    diagnostics.record(Event::Command(action.as_str()));

    let mut controller = open_controller(app, diagnostics)?;
    let outcome = match action {
        LockAction::Lock => app.lock(&mut controller, path)?,
        LockAction::Unlock => app.unlock(&mut controller, path)?,
    };
    diagnostics.record(Event::Lock {
        action,
        path,
        outcome,
    });

    let message = match (outcome, action) {
        (LockOutcome::Applied, LockAction::Lock) => "locked",
        (LockOutcome::Applied, LockAction::Unlock) => "unlocked",
        (LockOutcome::Skipped, LockAction::Lock) => "already locked",
        (LockOutcome::Skipped, LockAction::Unlock) => "already unlocked",
    };
    println!("{path}: {message}");

    Ok(())
}

fn print_doctor_report(report: &DoctorReport) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Status", "Details"]);

    for check in &report.checks {
        let status = match check.state {
            CheckState::Pass => "PASS",
            CheckState::Fail => "FAIL",
        };

        table.add_row(vec![
            Cell::new(check.name.as_str()),
            Cell::new(status),
            Cell::new(check.details.as_str()),
        ]);
    }

    println!("{table}");
    println!("{}", report.summary());
}

fn print_status_report(report: &StatusReport) {
    println!("{} ({})", report.name, report.root.display());

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Path", "Lock"]);

    for row in &report.rows {
        table.add_row(vec![
            Cell::new(row.path.as_str()),
            Cell::new(if row.locked { "Locked" } else { "Unlocked" }),
        ]);
    }

    println!("{table}");
    println!("{}", report.summary());
}
