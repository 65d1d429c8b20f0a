#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    List,
    Chat,
    NewConversation,
}

/// Visibility of the floating help widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WidgetView {
    pub open: bool,
    pub minimized: bool,
    pub pane: Pane,
}

impl WidgetView {
    pub fn open(&mut self) {
        self.open = true;
        self.minimized = false;
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn minimize(&mut self) {
        self.minimized = true;
    }

    pub fn restore(&mut self) {
        self.minimized = false;
    }

    pub fn show(&mut self, pane: Pane) {
        self.pane = pane;
    }

    /// Messages are actually on screen
    pub fn can_see_chat(&self) -> bool {
        self.open && !self.minimized && self.pane == Pane::Chat
    }
}
