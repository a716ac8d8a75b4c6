//! Second-resolution exam countdown.
//!
//! The countdown is a plain value; whoever owns it decides how seconds are
//! delivered (a tokio interval in the services crate, direct calls in tests).

/// Result of advancing the countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Time is left; carries the remaining seconds after this tick.
    Running { remaining_secs: u32 },
    /// The countdown just reached zero. Returned exactly once.
    Expired,
    /// The countdown already expired or was stopped; nothing happened.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    Expired,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    total_secs: u32,
    remaining_secs: u32,
    state: State,
}

impl Countdown {
    #[must_use]
    pub fn new(total_secs: u32) -> Self {
        Self {
            total_secs,
            remaining_secs: total_secs,
            state: State::Running,
        }
    }

    #[must_use]
    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.total_secs - self.remaining_secs
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.state == State::Expired
    }

    /// Consume one elapsed second.
    pub fn tick(&mut self) -> Tick {
        if self.state != State::Running {
            return Tick::Stopped;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = State::Expired;
            return Tick::Expired;
        }
        Tick::Running {
            remaining_secs: self.remaining_secs,
        }
    }

    /// Freeze the countdown; later ticks are no-ops. Has no effect after expiry.
    pub fn stop(&mut self) {
        if self.state == State::Running {
            self.state = State::Stopped;
        }
    }
}
