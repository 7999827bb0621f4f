//! Redraw coalescing.
//!
//! Any number of redraw requests between two display frames collapse into a
//! single draw:
//!
//! ```text
//! Idle --schedule--> Scheduled --take_frame--> Idle
//!   \                    |
//!    +----detach-----> Detached (terminal)
//! ```

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedrawState {
    #[default]
    Idle,
    Scheduled,
    Detached,
}

/// One-redraw-per-frame state machine.
#[derive(Debug, Default, Clone)]
pub struct RedrawScheduler {
    state: RedrawState,
    /// Requests absorbed by an already pending redraw
    coalesced: u64,
    /// Frames actually handed out
    frames: u64,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a redraw on the next frame.
    ///
    /// Returns `true` only when this call moved the scheduler to `Scheduled`.
    pub fn schedule(&mut self) -> bool {
        match self.state {
            RedrawState::Idle => {
                self.state = RedrawState::Scheduled;
                true
            }
            RedrawState::Scheduled => {
                self.coalesced += 1;
                false
            }
            RedrawState::Detached => false,
        }
    }

    /// Called once per display frame; `true` means draw now.
    pub fn take_frame(&mut self) -> bool {
        if self.state == RedrawState::Scheduled {
            self.state = RedrawState::Idle;
            self.frames += 1;
            true
        } else {
            false
        }
    }

    /// Drop a pending redraw without drawing.
    pub fn cancel(&mut self) {
        if self.state == RedrawState::Scheduled {
            self.state = RedrawState::Idle;
        }
    }

    /// Stop for good. Safe to call more than once.
    pub fn detach(&mut self) {
        self.state = RedrawState::Detached;
    }

    #[inline]
    pub fn state(&self) -> RedrawState {
        self.state
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.state == RedrawState::Scheduled
    }

    #[inline]
    pub fn is_detached(&self) -> bool {
        self.state == RedrawState::Detached
    }

    #[inline]
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
