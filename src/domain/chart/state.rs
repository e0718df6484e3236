//! Chart sampling lifecycle.
//!
//! ```text
//! Uninitialized --init--> Initialized --start--> Running <--stop/start--> Stopped
//!       ^                      |                    |                        |
//!       +-------clear----------+--------clear-------+----------clear---------+
//! ```
//!
//! Clearing discards the buffer and lands straight back in `Uninitialized`.

use serde::Serialize;

use crate::domain::foundation::StateMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartState {
    #[default]
    Uninitialized,
    Initialized,
    Running,
    Stopped,
}

impl ChartState {
    pub fn is_running(&self) -> bool {
        matches!(self, ChartState::Running)
    }

    /// True once `init` bound the chart to a sensor.
    pub fn is_bound(&self) -> bool {
        !matches!(self, ChartState::Uninitialized)
    }
}

impl StateMachine for ChartState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ChartState::*;
        matches!(
            (self, target),
            (Uninitialized, Initialized)
                | (Initialized, Running)
                | (Running, Stopped)
                | (Stopped, Running)
                | (Initialized, Uninitialized)
                | (Running, Uninitialized)
                | (Stopped, Uninitialized)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ChartState::*;
        match self {
            Uninitialized => vec![Initialized],
            Initialized => vec![Running, Uninitialized],
            Running => vec![Stopped, Uninitialized],
            Stopped => vec![Running, Uninitialized],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_only_from_initialized_or_stopped() {
        assert!(ChartState::Initialized.can_transition_to(&ChartState::Running));
        assert!(ChartState::Stopped.can_transition_to(&ChartState::Running));
        assert!(!ChartState::Uninitialized.can_transition_to(&ChartState::Running));
        assert!(!ChartState::Running.can_transition_to(&ChartState::Running));
    }

    #[test]
    fn every_bound_state_can_clear() {
        for state in [ChartState::Initialized, ChartState::Running, ChartState::Stopped] {
            assert_eq!(
                state.transition_to(ChartState::Uninitialized),
                Ok(ChartState::Uninitialized)
            );
        }
    }

    #[test]
    fn no_state_is_terminal() {
        for state in [
            ChartState::Uninitialized,
            ChartState::Initialized,
            ChartState::Running,
            ChartState::Stopped,
        ] {
            assert!(!state.is_terminal());
        }
    }
}
