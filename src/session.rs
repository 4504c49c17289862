use std::fmt;

pub const SESSION_SECS: u32 = 60;
pub const INITIAL_DISAPPEAR_MS: u64 = 1000;
pub const MIN_DISAPPEAR_MS: u64 = 600;
pub const RAMP_STEP_MS: u64 = 30;
pub const RAMP_EVERY_SECS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Running,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    EmptyUsername,
    AlreadyStarted,
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::EmptyUsername => write!(f, "Please enter your name!"),
            StartError::AlreadyStarted => write!(f, "a session is already in progress"),
        }
    }
}

impl std::error::Error for StartError {}

/// One play-through, from start until the countdown expires
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    pub username: String,
    pub score: u32,
    pub time_left_secs: u32,
    pub disappear_interval_ms: u64,
}

impl GameSession {
    /// Trims the name; an empty result is rejected.
    pub fn new(username: &str) -> Result<Self, StartError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StartError::EmptyUsername);
        }

        Ok(Self {
            username: username.to_string(),
            score: 0,
            time_left_secs: SESSION_SECS,
            disappear_interval_ms: INITIAL_DISAPPEAR_MS,
        })
    }

    /// One countdown second. Returns true when time has run out.
    pub fn on_tick(&mut self) -> bool {
        self.time_left_secs = self.time_left_secs.saturating_sub(1);
        self.disappear_interval_ms = ramp(self.time_left_secs, self.disappear_interval_ms);
        self.time_left_secs == 0
    }
}

/// Difficulty step applied after the countdown reaches `time_left_secs`
pub fn ramp(time_left_secs: u32, interval_ms: u64) -> u64 {
    if time_left_secs % RAMP_EVERY_SECS == 0 && interval_ms > MIN_DISAPPEAR_MS {
        interval_ms.saturating_sub(RAMP_STEP_MS).max(MIN_DISAPPEAR_MS)
    } else {
        interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_defaults() {
        let s = GameSession::new("Ann").unwrap();
        assert_eq!(s.username, "Ann");
        assert_eq!(s.score, 0);
        assert_eq!(s.time_left_secs, 60);
        assert_eq!(s.disappear_interval_ms, 1000);
    }

    #[test]
    fn username_is_trimmed() {
        let s = GameSession::new("  Bo \t").unwrap();
        assert_eq!(s.username, "Bo");
    }

    #[test]
    fn blank_username_rejected() {
        assert_eq!(GameSession::new(""), Err(StartError::EmptyUsername));
        assert_eq!(GameSession::new("   "), Err(StartError::EmptyUsername));
    }

    #[test]
    fn ramp_only_on_multiples_of_five() {
        assert_eq!(ramp(59, 1000), 1000);
        assert_eq!(ramp(55, 1000), 970);
        assert_eq!(ramp(0, 700), 670);
    }

    #[test]
    fn ramp_respects_floor() {
        assert_eq!(ramp(5, 600), 600);
        assert_eq!(ramp(5, 610), 600);
        assert_eq!(ramp(5, 630), 600);
    }

    #[test]
    fn five_ticks_shorten_interval_once() {
        let mut s = GameSession::new("Ann").unwrap();
        for _ in 0..5 {
            assert!(!s.on_tick());
        }
        assert_eq!(s.time_left_secs, 55);
        assert_eq!(s.disappear_interval_ms, 970);
    }

    #[test]
    fn full_session_interval_is_non_increasing_step_function() {
        let mut s = GameSession::new("Ann").unwrap();
        let mut previous = s.disappear_interval_ms;
        let mut steps = 0;

        loop {
            let finished = s.on_tick();
            let current = s.disappear_interval_ms;
            assert!(current <= previous);
            assert!(current >= MIN_DISAPPEAR_MS);
            if current != previous {
                assert_eq!(previous - current, 30);
                assert_eq!(s.time_left_secs % 5, 0);
                steps += 1;
            }
            previous = current;
            if finished {
                break;
            }
        }

        assert_eq!(steps, 12);
        assert_eq!(s.disappear_interval_ms, 640);
        assert_eq!(s.time_left_secs, 0);
    }

    #[test]
    fn tick_at_zero_stays_at_zero() {
        let mut s = GameSession::new("Ann").unwrap();
        s.time_left_secs = 0;
        assert!(s.on_tick());
        assert_eq!(s.time_left_secs, 0);
    }

    #[test]
    fn start_error_message() {
        assert_eq!(
            StartError::EmptyUsername.to_string(),
            "Please enter your name!"
        );
    }
}
