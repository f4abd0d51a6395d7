// View mode state machine: user control state and its single transition function.

use crate::models::{ModeKind, RangeWindow, ViewMode};

/// What the mode and window selectors currently show. The window is kept while
/// in Latest so returning to Range restores the previous choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    pub kind: ModeKind,
    pub window: RangeWindow,
}

/// User input that can change the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    SelectMode(ModeKind),
    SelectWindow(RangeWindow),
    Refresh,
}

/// What to do with the auto-refresh timer after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    Start,
    Stop,
    Keep,
}

/// Outcome of applying one [`UserAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: ViewState,
    pub scheduler: SchedulerCommand,
    /// Auto-refresh indicator and range controls are shown in exactly one mode each.
    pub auto_refresh_visible: bool,
    pub range_controls_visible: bool,
    /// Whether the action should kick off a refresh cycle.
    pub refresh: bool,
}

impl ViewState {
    pub fn new(kind: ModeKind, window: RangeWindow) -> Self {
        Self { kind, window }
    }

    /// The view a refresh cycle started now would show.
    pub fn view_mode(self) -> ViewMode {
        match self.kind {
            ModeKind::Latest => ViewMode::Latest,
            ModeKind::Range => ViewMode::Range {
                window: self.window,
            },
        }
    }

    /// Scheduler and visibility settings that belong to the current mode.
    pub fn enter(self) -> Transition {
        let latest = self.kind == ModeKind::Latest;
        Transition {
            state: self,
            scheduler: if latest {
                SchedulerCommand::Start
            } else {
                SchedulerCommand::Stop
            },
            auto_refresh_visible: latest,
            range_controls_visible: !latest,
            refresh: true,
        }
    }

    pub fn apply(self, action: UserAction) -> Transition {
        match action {
            // Re-selecting the current mode behaves like entering it again.
            UserAction::SelectMode(kind) => ViewState { kind, ..self }.enter(),
            UserAction::SelectWindow(window) => Transition {
                refresh: self.kind == ModeKind::Range,
                ..self.stay(ViewState { window, ..self })
            },
            UserAction::Refresh => Transition {
                refresh: true,
                ..self.stay(self)
            },
        }
    }

    fn stay(self, state: ViewState) -> Transition {
        let latest = self.kind == ModeKind::Latest;
        Transition {
            state,
            scheduler: SchedulerCommand::Keep,
            auto_refresh_visible: latest,
            range_controls_visible: !latest,
            refresh: false,
        }
    }
}
