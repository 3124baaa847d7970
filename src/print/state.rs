use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PrintState {
    #[default]
    Idle,
    Capturing,
    Assembling,
    Saving,
    Done,
    Cancelled,
    Failed,
}

impl PrintState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PrintState::Done | PrintState::Cancelled | PrintState::Failed)
    }

    /// Legal edges of the session lifecycle. Any live state may fail.
    pub fn can_transition_to(self, next: PrintState) -> bool {
        use PrintState::*;

        match (self, next) {
            (Idle, Capturing)
            | (Capturing, Assembling | Cancelled)
            | (Assembling, Saving)
            | (Saving, Done | Cancelled) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PrintState::*;

    #[test]
    fn happy_path_is_legal() {
        let path = [Idle, Capturing, Assembling, Saving, Done];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn cancellation_only_from_capture_or_save() {
        assert!(Capturing.can_transition_to(Cancelled));
        assert!(Saving.can_transition_to(Cancelled));
        assert!(!Assembling.can_transition_to(Cancelled));
        assert!(!Idle.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_are_final() {
        for terminal in [Done, Cancelled, Failed] {
            assert!(terminal.is_terminal());
            for next in [Idle, Capturing, Assembling, Saving, Done, Cancelled, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn any_live_state_can_fail() {
        for live in [Idle, Capturing, Assembling, Saving] {
            assert!(live.can_transition_to(Failed));
        }
    }

    #[test]
    fn no_skipping_ahead() {
        assert!(!Idle.can_transition_to(Saving));
        assert!(!Capturing.can_transition_to(Done));
        assert!(!Assembling.can_transition_to(Done));
    }
}
