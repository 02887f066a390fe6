use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};

use locktree_app::PendingRequest;
use locktree_core::command_runner::SystemCommandRunner;
use locktree_core::lfs::{self, LfsError};
use ratatui::Frame;
use ratatui::text::{Line, Text};

use crate::theme;
use crate::ui::modal::{ModalSpec, render_modal};

const FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

#[derive(Debug, Clone, Default)]
pub(crate) struct LoadingState {
    frame_index: usize,
}

impl LoadingState {
    pub(crate) fn next_frame(&mut self) {
        self.frame_index = (self.frame_index + 1) % FRAMES.len();
    }

    fn current_frame(&self) -> &'static str {
        FRAMES[self.frame_index]
    }
}

/// Runs one lock service call off the UI thread and reports its result on
/// the returned channel.
pub(crate) trait LockWorker {
    fn spawn(&self, repo_root: PathBuf, request: PendingRequest) -> Receiver<Result<(), LfsError>>;
}

#[derive(Debug, Default)]
pub(crate) struct SystemLockWorker;

impl LockWorker for SystemLockWorker {
    fn spawn(&self, repo_root: PathBuf, request: PendingRequest) -> Receiver<Result<(), LfsError>> {
        let (sender, receiver) = mpsc::channel();
        std::thread::spawn(move || {
            let runner = SystemCommandRunner::new();
            let result = lfs::run_action(&repo_root, request.action, &request.path, &runner);
            let _ = sender.send(result);
        });
        receiver
    }
}

pub(crate) fn render_loading_modal(
    frame: &mut Frame<'_>,
    title: &str,
    message: &str,
    loading: &LoadingState,
) {
    let body = Text::from(vec![
        Line::from(""),
        Line::from(format!("{} {}", loading.current_frame(), message)),
    ]);
    render_modal(
        frame,
        ModalSpec {
            title,
            title_style: theme::focus_prompt(),
            body,
            key_hint: Some("Waiting for git-lfs    Ctrl-C: quit"),
            width_pct: 60,
            height_pct: 30,
        },
    );
}
