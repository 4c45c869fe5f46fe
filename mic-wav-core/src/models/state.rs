/// Recorder state machine.
///
/// ```text
/// Idle --start()--> Recording --stop()--> Finalizing --> Idle
/// ```
///
/// `Idle` is both the initial state and the state between sessions. Failed
/// sessions also land back in `Idle`; the error is reported by `stop()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Finalizing,
}

impl RecorderState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Finalizing => "finalizing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        let state = RecorderState::default();
        assert!(state.is_idle());
        assert!(!state.is_recording());
        assert_eq!(state.label(), "idle");
    }
}
