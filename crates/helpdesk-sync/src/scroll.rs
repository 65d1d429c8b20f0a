#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    AtBottom,
    ScrolledUp,
}

/// What kind of message just landed in the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// The list went from empty to populated
    FirstLoad,
    /// Written by the local participant, including the optimistic echo
    Own,
    /// Written by the other party
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    SnapToBottom,
    /// Leave the viewport alone and surface the "new messages" affordance
    ShowNewMessages,
    Stay,
}

/// Auto-scroll policy for the message pane
///
/// `state` only changes through scroll reports and arrivals, so an arrival is
/// always judged against the position recorded before the new content was
/// laid out.
#[derive(Debug, Clone)]
pub struct ScrollPolicy {
    state: ScrollState,
    threshold_px: f64,
    new_messages_visible: bool,
}

impl ScrollPolicy {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            state: ScrollState::AtBottom,
            threshold_px,
            new_messages_visible: false,
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn new_messages_visible(&self) -> bool {
        self.new_messages_visible
    }

    /// Record the pane's distance from the bottom after a user scroll
    pub fn on_scroll(&mut self, distance_from_bottom: f64) -> ScrollState {
        self.state = if distance_from_bottom < self.threshold_px {
            ScrollState::AtBottom
        } else {
            ScrollState::ScrolledUp
        };

        if self.state == ScrollState::AtBottom {
            self.new_messages_visible = false;
        }
        self.state
    }

    pub fn on_arrival(&mut self, arrival: Arrival) -> ScrollAction {
        match (arrival, self.state) {
            (Arrival::FirstLoad, _) | (Arrival::Own, _) | (Arrival::Remote, ScrollState::AtBottom) => {
                self.jump_to_bottom();
                ScrollAction::SnapToBottom
            }
            (Arrival::Remote, ScrollState::ScrolledUp) => {
                self.new_messages_visible = true;
                ScrollAction::ShowNewMessages
            }
        }
    }

    /// The user followed the affordance down
    pub fn jump_to_bottom(&mut self) {
        self.state = ScrollState::AtBottom;
        self.new_messages_visible = false;
    }

    pub fn reset(&mut self) {
        self.jump_to_bottom();
    }
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self::new(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrolled_up() -> ScrollPolicy {
        let mut policy = ScrollPolicy::new(100.0);
        policy.on_scroll(480.0);
        policy
    }

    #[test]
    fn test_threshold() {
        let mut policy = ScrollPolicy::new(100.0);
        assert_eq!(policy.on_scroll(99.0), ScrollState::AtBottom);
        assert_eq!(policy.on_scroll(100.0), ScrollState::ScrolledUp);
    }

    #[test]
    fn test_own_message_snaps_even_when_scrolled_up() {
        let mut policy = scrolled_up();
        policy.on_arrival(Arrival::Remote);
        assert!(policy.new_messages_visible());

        assert_eq!(policy.on_arrival(Arrival::Own), ScrollAction::SnapToBottom);
        assert_eq!(policy.state(), ScrollState::AtBottom);
        assert!(!policy.new_messages_visible());
    }

    #[test]
    fn test_remote_message_while_scrolled_up_stays() {
        let mut policy = scrolled_up();
        assert_eq!(policy.on_arrival(Arrival::Remote), ScrollAction::ShowNewMessages);
        assert_eq!(policy.state(), ScrollState::ScrolledUp);
        assert!(policy.new_messages_visible());
    }

    #[test]
    fn test_remote_message_at_bottom_follows() {
        let mut policy = ScrollPolicy::default();
        assert_eq!(policy.on_arrival(Arrival::Remote), ScrollAction::SnapToBottom);
        assert_eq!(policy.state(), ScrollState::AtBottom);
    }

    #[test]
    fn test_first_load_always_snaps() {
        let mut policy = scrolled_up();
        assert_eq!(policy.on_arrival(Arrival::FirstLoad), ScrollAction::SnapToBottom);
    }

    #[test]
    fn test_scrolling_down_clears_affordance() {
        let mut policy = scrolled_up();
        policy.on_arrival(Arrival::Remote);
        policy.on_scroll(10.0);
        assert!(!policy.new_messages_visible());
    }
}
