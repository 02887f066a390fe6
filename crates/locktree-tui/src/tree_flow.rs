use std::collections::HashSet;
use std::sync::mpsc::{Receiver, TryRecvError};

use crossterm::event::{Event, KeyEvent};
use locktree_app::{LockController, PendingRequest};
use locktree_core::command_runner::CommandRunner;
use locktree_core::lfs::{LfsError, LockAction};
use locktree_core::paths::TrackedPath;
use locktree_core::tree::{LockStatus, NodeId};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, ScrollbarOrientation};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;
use tui_tree_widget::{Scrollbar as TreeScrollbar, Tree, TreeItem, TreeState};

use crate::TreeSummary;
use crate::keymap;
use crate::theme;
use crate::ui::loading::{LoadingState, LockWorker, render_loading_modal};
use crate::ui::modal::{render_error_modal, render_notice_modal};
use crate::ui::text::{
    compact_hint, focus_line, key_hint_height, key_hint_paragraph, label_value_line,
    wrapped_paragraph,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlowSignal {
    Continue,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Overlay {
    Error(String),
    Notice(String),
}

struct InFlight {
    request: PendingRequest,
    receiver: Receiver<Result<(), LfsError>>,
    loading: LoadingState,
}

#[derive(Debug, Clone)]
struct VisibleRow {
    id: NodeId,
    identifier: Vec<usize>,
}

pub(crate) struct TreeScreen {
    controller: LockController,
    worker: Box<dyn LockWorker>,
    collapsed: HashSet<TrackedPath>,
    visible: Vec<VisibleRow>,
    cursor: usize,
    filter: Input,
    editing_filter: bool,
    overlay: Option<Overlay>,
    in_flight: Option<InFlight>,
    summary: TreeSummary,
}

impl TreeScreen {
    pub(crate) fn new(controller: LockController, worker: Box<dyn LockWorker>) -> Self {
        let mut screen = Self {
            controller,
            worker,
            collapsed: HashSet::new(),
            visible: Vec::new(),
            cursor: 0,
            filter: Input::default(),
            editing_filter: false,
            overlay: None,
            in_flight: None,
            summary: TreeSummary::default(),
        };
        screen.refresh_visible();
        screen
    }

    pub(crate) fn summary(&self) -> TreeSummary {
        self.summary
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent, runner: &dyn CommandRunner) -> FlowSignal {
        if self.in_flight.is_some() {
            return FlowSignal::Continue;
        }

        if self.overlay.is_some() {
            if keymap::is_confirm(key) || keymap::is_back(key) {
                self.overlay = None;
            }
            return FlowSignal::Continue;
        }

        if self.editing_filter {
            if keymap::is_confirm(key) || keymap::is_back(key) {
                self.editing_filter = false;
            } else if self.filter.handle_event(&Event::Key(key)).is_some() {
                self.cursor = 0;
                self.refresh_visible();
            }
            return FlowSignal::Continue;
        }

        if keymap::is_quit(key) || keymap::is_back(key) {
            return FlowSignal::Exit;
        }

        if keymap::is_filter(key) {
            self.editing_filter = true;
        } else if keymap::is_up(key) {
            self.cursor = self.cursor.saturating_sub(1);
        } else if keymap::is_down(key) {
            if self.cursor + 1 < self.visible.len() {
                self.cursor += 1;
            }
        } else if keymap::is_collapse(key) {
            self.collapse_current();
        } else if keymap::is_expand(key) {
            self.expand_current();
        } else if keymap::is_toggle(key) {
            self.start_request(None);
        } else if keymap::is_lock(key) {
            self.start_request(Some(LockAction::Lock));
        } else if keymap::is_unlock(key) {
            self.start_request(Some(LockAction::Unlock));
        } else if keymap::is_refresh(key) {
            self.refresh(runner);
        }

        FlowSignal::Continue
    }

    /// Advances the spinner and applies a finished lock call, if any.
    pub(crate) fn on_tick(&mut self) {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return;
        };
        in_flight.loading.next_frame();

        let result = match in_flight.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(LfsError::Execute(
                "lock worker exited without reporting a result".to_string(),
            )),
        };

        let Some(finished) = self.in_flight.take() else {
            return;
        };

        match self.controller.finish(result) {
            Ok(_) => self.summary.applied += 1,
            Err(error) => {
                self.summary.failed += 1;
                self.overlay = Some(Overlay::Error(format!(
                    "Failed to {} {}.\n\n{error}",
                    finished.request.action.as_str(),
                    finished.request.path
                )));
            }
        }
    }

    fn selected(&self) -> Option<NodeId> {
        self.visible.get(self.cursor).map(|row| row.id)
    }

    fn start_request(&mut self, action: Option<LockAction>) {
        let Some(id) = self.selected() else {
            return;
        };
        let Some(path) = self.controller.tree().node(id).path().cloned() else {
            return;
        };
        let action = action.unwrap_or_else(|| self.controller.toggle_action(&path));

        match self.controller.begin(action, &path) {
            Ok(Some(request)) => {
                let receiver = self
                    .worker
                    .spawn(self.controller.repository().root.clone(), request.clone());
                self.in_flight = Some(InFlight {
                    request,
                    receiver,
                    loading: LoadingState::default(),
                });
            }
            Ok(None) => {
                let state = match action {
                    LockAction::Lock => "locked",
                    LockAction::Unlock => "unlocked",
                };
                self.overlay = Some(Overlay::Notice(format!("{path} is already {state}.")));
            }
            Err(error) => self.overlay = Some(Overlay::Error(error.to_string())),
        }
    }

    fn refresh(&mut self, runner: &dyn CommandRunner) {
        match self.controller.refresh(runner) {
            Ok(()) => self.refresh_visible(),
            Err(error) => {
                self.overlay = Some(Overlay::Error(format!("Refresh failed.\n\n{error}")));
            }
        }
    }

    fn collapse_current(&mut self) {
        let Some(row) = self.visible.get(self.cursor).cloned() else {
            return;
        };
        let node = self.controller.tree().node(row.id);

        if !node.is_file()
            && !self.filtering()
            && let Some(path) = node.path()
            && !self.collapsed.contains(path)
        {
            self.collapsed.insert(path.clone());
            self.refresh_visible();
            return;
        }

        let parent = &row.identifier[..row.identifier.len().saturating_sub(1)];
        if let Some(index) = self
            .visible
            .iter()
            .position(|candidate| !parent.is_empty() && candidate.identifier == parent)
        {
            self.cursor = index;
        }
    }

    fn expand_current(&mut self) {
        let Some(id) = self.selected() else {
            return;
        };
        if let Some(path) = self.controller.tree().node(id).path()
            && self.collapsed.remove(path)
        {
            self.refresh_visible();
        }
    }

    fn filtering(&self) -> bool {
        !self.filter.value().trim().is_empty()
    }

    fn needle(&self) -> Option<String> {
        let value = self.filter.value().trim();
        (!value.is_empty()).then(|| value.to_lowercase())
    }

    fn subtree_matches(&self, id: NodeId, needle: Option<&str>) -> bool {
        let Some(needle) = needle else {
            return true;
        };

        let tree = self.controller.tree();
        let node = tree.node(id);
        let own = node
            .path()
            .is_some_and(|path| path.to_string().to_lowercase().contains(needle));

        own || node
            .children()
            .iter()
            .any(|child| self.subtree_matches(*child, Some(needle)))
    }

    fn refresh_visible(&mut self) {
        let needle = self.needle();
        let tree = self.controller.tree();
        let mut visible = Vec::new();

        for child in tree.node(tree.root()).children() {
            self.push_visible(*child, Vec::new(), needle.as_deref(), &mut visible);
        }

        self.visible = visible;
        if self.visible.is_empty() {
            self.cursor = 0;
        } else if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len() - 1;
        }
    }

    fn push_visible(
        &self,
        id: NodeId,
        mut identifier: Vec<usize>,
        needle: Option<&str>,
        visible: &mut Vec<VisibleRow>,
    ) {
        if !self.subtree_matches(id, needle) {
            return;
        }

        identifier.push(id.index());
        visible.push(VisibleRow {
            id,
            identifier: identifier.clone(),
        });

        let node = self.controller.tree().node(id);
        let open = needle.is_some()
            || node
                .path()
                .is_none_or(|path| !self.collapsed.contains(path));
        if open {
            for child in node.children() {
                self.push_visible(*child, identifier.clone(), needle, visible);
            }
        }
    }

    fn label_for(&self, id: NodeId) -> Line<'static> {
        let tree = self.controller.tree();
        let node = tree.node(id);
        let (marker, style) = match tree.status(id) {
            LockStatus::Locked => ("[L]", theme::locked_text()),
            LockStatus::Mixed => ("[~]", theme::mixed_text()),
            LockStatus::Unlocked => ("[ ]", theme::secondary_text()),
        };
        let name = if node.is_file() {
            node.name().to_string()
        } else {
            format!("{}/", node.name())
        };

        Line::from(vec![
            Span::styled(marker, style),
            Span::raw(" "),
            Span::raw(name),
        ])
    }

    fn tree_items(&self) -> Vec<TreeItem<'static, usize>> {
        let needle = self.needle();
        let tree = self.controller.tree();
        tree.node(tree.root())
            .children()
            .iter()
            .filter_map(|child| self.tree_item_for(*child, needle.as_deref()))
            .collect()
    }

    fn tree_item_for(&self, id: NodeId, needle: Option<&str>) -> Option<TreeItem<'static, usize>> {
        if !self.subtree_matches(id, needle) {
            return None;
        }

        let node = self.controller.tree().node(id);
        let label = self.label_for(id);
        if node.is_file() {
            return Some(TreeItem::new_leaf(id.index(), label));
        }

        let children = node
            .children()
            .iter()
            .filter_map(|child| self.tree_item_for(*child, needle))
            .collect();
        Some(TreeItem::new(id.index(), label, children).expect("node ids are unique"))
    }

    fn tree_state(&self) -> TreeState<usize> {
        let mut state = TreeState::default();
        let filtering = self.filtering();
        let tree = self.controller.tree();

        for row in &self.visible {
            let node = tree.node(row.id);
            let open = filtering || node.path().is_none_or(|path| !self.collapsed.contains(path));
            if !node.is_file() && open {
                state.open(row.identifier.clone());
            }
        }

        if let Some(row) = self.visible.get(self.cursor) {
            state.select(row.identifier.clone());
        }
        state
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let key_text = if self.editing_filter {
            compact_hint(
                area.width,
                "Type: filter    Backspace: delete    Enter/Esc: back to tree",
                "Type filter    Backspace delete    Enter/Esc: tree",
                "Type filter | Enter/Esc tree",
            )
        } else {
            compact_hint(
                area.width,
                "Space: toggle lock    L: lock    U: unlock    h/l: fold    j/k: move    /: filter    r: refresh    q: quit",
                "Space toggle    L lock    U unlock    h/l fold    /: filter    r refresh    q quit",
                "Space | L | U | h/l | / | r | q",
            )
        };
        let footer_height = key_hint_height(area.width, key_text);
        let [header, filter_area, body, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        self.render_header(frame, header);
        self.render_filter(frame, filter_area);
        self.render_tree(frame, body);

        let keys = key_hint_paragraph(key_text).block(theme::key_block());
        frame.render_widget(keys, footer);

        if let Some(in_flight) = &self.in_flight {
            let message = format!(
                "git lfs {} {}",
                in_flight.request.action.as_str(),
                in_flight.request.path
            );
            render_loading_modal(frame, "Working", &message, &in_flight.loading);
        } else if let Some(overlay) = &self.overlay {
            match overlay {
                Overlay::Error(message) => {
                    render_error_modal(frame, message, "Enter/Esc: continue");
                }
                Overlay::Notice(message) => {
                    render_notice_modal(frame, "Nothing to do", message, "Enter/Esc: continue");
                }
            }
        }
    }

    fn render_header(&self, frame: &mut Frame<'_>, area: ratatui::layout::Rect) {
        let tree = self.controller.tree();
        let repository = self.controller.repository();
        let locked = tree.locked_files().count();
        let counts = format!(
            "{locked} locked of {} files    refreshed {}",
            tree.file_count(),
            self.controller.loaded_at().unwrap_or("never")
        );

        let text = Text::from(vec![
            focus_line(repository.name.clone()),
            label_value_line("Root", repository.root.display().to_string()),
            label_value_line("Locks", counts),
        ]);
        frame.render_widget(
            wrapped_paragraph(text).block(theme::chrome("locktree")),
            area,
        );
    }

    fn render_filter(&self, frame: &mut Frame<'_>, area: ratatui::layout::Rect) {
        let width = area.width.saturating_sub(2) as usize;
        let scroll = self.filter.visual_scroll(width);
        let filter = Paragraph::new(self.filter.value())
            .scroll((0, scroll as u16))
            .block(theme::chrome(if self.editing_filter {
                focus_line("Filter")
            } else {
                Line::from("Filter (/ to focus)")
            }));
        frame.render_widget(filter, area);

        if self.editing_filter && width > 0 {
            let visual = self.filter.visual_cursor();
            let relative = visual.saturating_sub(scroll).min(width.saturating_sub(1));
            frame.set_cursor_position((area.x + 1 + relative as u16, area.y + 1));
        }
    }

    fn render_tree(&self, frame: &mut Frame<'_>, area: ratatui::layout::Rect) {
        let title = if self.editing_filter {
            Line::from("Files")
        } else {
            focus_line("Files")
        };

        let items = self.tree_items();
        if items.is_empty() {
            let message = if self.filtering() {
                "No lockable files match the filter."
            } else {
                "No lockable files were found."
            };
            frame.render_widget(wrapped_paragraph(message).block(theme::chrome(title)), area);
            return;
        }

        let mut state = self.tree_state();
        let tree = Tree::new(&items)
            .expect("node ids are unique")
            .block(theme::chrome(title))
            .experimental_scrollbar(Some(
                TreeScrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(None)
                    .end_symbol(None),
            ))
            .highlight_style(theme::tree_highlight())
            .highlight_symbol(">> ");
        frame.render_stateful_widget(tree, area, &mut state);
    }
}
