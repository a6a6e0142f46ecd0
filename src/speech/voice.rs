//! Voice activity state machine.
//!
//! Exactly one voice activity is live at a time: idle, capturing from the
//! microphone, or speaking a synthesized reply. Entering either active
//! state from the other forces a transition through `Idle` first; the
//! caller uses the returned interrupted state to tear the old activity
//! down before starting the new one.

/// Mutually exclusive voice modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Capturing,
    Speaking,
}

/// Tracks the current voice mode and enforces mutual exclusion.
#[derive(Debug, Default)]
pub struct VoiceStateMachine {
    state: VoiceState,
}

impl VoiceStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == VoiceState::Idle
    }

    /// Enter `Capturing`, returning any activity that was interrupted.
    pub fn begin_capture(&mut self) -> Option<VoiceState> {
        let interrupted = self.interrupt();
        self.state = VoiceState::Capturing;
        interrupted
    }

    /// Enter `Speaking`, returning any activity that was interrupted.
    pub fn begin_speaking(&mut self) -> Option<VoiceState> {
        let interrupted = self.interrupt();
        self.state = VoiceState::Speaking;
        interrupted
    }

    /// Return to `Idle` on stop, completion, or error.
    pub fn finish(&mut self) {
        self.state = VoiceState::Idle;
    }

    fn interrupt(&mut self) -> Option<VoiceState> {
        match self.state {
            VoiceState::Idle => None,
            active => {
                self.state = VoiceState::Idle;
                Some(active)
            }
        }
    }
}
