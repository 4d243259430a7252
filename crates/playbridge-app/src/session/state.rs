//! Sign-in state owned by the session controller

/// Sign-in lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// `initialize` not called yet
    #[default]
    Uninitialized,
    /// Identity service missing on this device; everything degrades to no-ops
    Unavailable,
    Disconnected,
    SilentAttempting,
    Connected,
}

impl SessionPhase {
    pub fn is_initialized(&self) -> bool {
        !matches!(self, SessionPhase::Uninitialized | SessionPhase::Unavailable)
    }
}

/// Session flags mutated only by the controller's transition functions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// An interactive sign-in or resolution flow is on screen
    pub intent_in_progress: bool,
    /// The automatic resolution for the current failure episode was spent
    pub resolving_failure: bool,
    pub silent_attempted: bool,
    /// Bumped on every sign-in cycle and sign-out; completions carry the
    /// epoch they were started under
    pub epoch: u64,
}

impl SessionState {
    pub fn connected(&self) -> bool {
        self.phase == SessionPhase::Connected
    }

    /// Completions started under an older epoch are stale
    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    /// Reset to a fresh disconnected session, invalidating in-flight work
    pub fn reset(&mut self, phase: SessionPhase) {
        *self = SessionState {
            phase,
            epoch: self.epoch + 1,
            ..Default::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_bumps_epoch() {
        let mut state = SessionState {
            phase: SessionPhase::Connected,
            intent_in_progress: true,
            resolving_failure: true,
            silent_attempted: true,
            epoch: 4,
        };
        state.reset(SessionPhase::Disconnected);

        assert_eq!(state.phase, SessionPhase::Disconnected);
        assert!(!state.intent_in_progress);
        assert!(!state.resolving_failure);
        assert!(!state.is_current(4));
        assert!(state.is_current(5));
    }

    #[test]
    fn test_initialized_phases() {
        assert!(!SessionPhase::Uninitialized.is_initialized());
        assert!(!SessionPhase::Unavailable.is_initialized());
        assert!(SessionPhase::Disconnected.is_initialized());
        assert!(SessionPhase::Connected.is_initialized());
    }
}
