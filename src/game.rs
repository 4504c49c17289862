use crate::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::leaderboard::{LeaderboardClient, LeaderboardEntry};
use crate::scheduler::Scheduler;
use crate::score::{ReactionSummary, ScoreTracker, FEEDBACK_MS, FLASH_MS};
use crate::session::{GameSession, SessionPhase, StartError};
use crate::spawner::{Area, Position, TargetPhase, TargetSpawner, TargetState};
use chrono::Local;
use log::{debug, info, warn};

pub const TICK_MS: u64 = 1000;
pub const POP_IN_MS: u64 = 50;
pub const RESPAWN_AFTER_DISAPPEAR_MS: u64 = 200;
pub const RESPAWN_AFTER_HIT_MS: u64 = 100;
pub const DEFAULT_LEADERBOARD_SIZE: usize = 5;

/// Every delayed action in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Tick,
    Disappear,
    Respawn,
    PopIn,
    Flash,
    Feedback(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Hit,
    Miss,
    Ignored,
}

/// What the results screen shows once the countdown ends
#[derive(Debug, Clone, PartialEq)]
pub struct GameResults {
    pub username: String,
    pub score: u32,
    pub hits: u32,
    pub misses: u32,
    pub accuracy: Option<f64>,
    pub reaction: Option<ReactionSummary>,
    pub personal_best: bool,
    pub standings: Vec<LeaderboardEntry>,
    /// The score could not be saved
    pub write_error: Option<String>,
    /// The standings could not be fetched
    pub read_error: Option<String>,
}

/// Drives a session through Idle -> Running -> Ended.
///
/// Time is virtual: the caller feeds elapsed milliseconds to [`Game::advance`]
/// and due timers fire in deadline order. Only a running session reacts to
/// timers and clicks.
pub struct Game {
    phase: SessionPhase,
    session: Option<GameSession>,
    target: TargetState,
    tracker: ScoreTracker,
    spawner: TargetSpawner,
    timers: Scheduler<Timer>,
    area: Area,
    now: u64,
    spawn_count: u64,
    results: Option<GameResults>,
    leaderboard: Box<dyn LeaderboardClient>,
    leaderboard_size: usize,
    analytics: Option<Box<dyn AnalyticsSink>>,
}

impl Game {
    pub fn new(leaderboard: Box<dyn LeaderboardClient>) -> Self {
        Self {
            phase: SessionPhase::Idle,
            session: None,
            target: TargetState::default(),
            tracker: ScoreTracker::new(),
            spawner: TargetSpawner::new(),
            timers: Scheduler::new(),
            area: Area::default(),
            now: 0,
            spawn_count: 0,
            results: None,
            leaderboard,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            analytics: None,
        }
    }

    pub fn with_spawner(mut self, spawner: TargetSpawner) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn with_analytics(mut self, sink: Box<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(sink);
        self
    }

    pub fn with_leaderboard_size(mut self, n: usize) -> Self {
        self.leaderboard_size = n;
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn has_finished(&self) -> bool {
        self.phase == SessionPhase::Ended
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn target(&self) -> &TargetState {
        &self.target
    }

    pub fn tracker(&self) -> &ScoreTracker {
        &self.tracker
    }

    pub fn results(&self) -> Option<&GameResults> {
        self.results.as_ref()
    }

    pub fn area(&self) -> Area {
        self.area
    }

    /// Virtual clock in milliseconds
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn spawn_count(&self) -> u64 {
        self.spawn_count
    }

    pub fn is_pending(&self, timer: Timer) -> bool {
        self.timers.is_pending(timer)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn score(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.score)
    }

    pub fn time_left_secs(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.time_left_secs)
    }

    /// Play area dimensions; takes effect from the next spawn
    pub fn resize(&mut self, area: Area) {
        if area != self.area {
            debug!("play area resized to {}x{}", area.width, area.height);
        }
        self.area = area;
    }

    /// Idle -> Running
    pub fn start(&mut self, username: &str) -> Result<(), StartError> {
        if self.phase != SessionPhase::Idle {
            return Err(StartError::AlreadyStarted);
        }

        let session = GameSession::new(username)?;
        info!("session started for {}", session.username);

        self.session = Some(session);
        self.phase = SessionPhase::Running;
        self.spawn();
        self.timers.schedule(Timer::Tick, self.now, TICK_MS);
        Ok(())
    }

    /// Discard the session and return to Idle, keeping the stores and RNG
    pub fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
        self.session = None;
        self.target = TargetState::default();
        self.tracker = ScoreTracker::new();
        self.timers.clear();
        self.spawn_count = 0;
        self.results = None;
    }

    /// Move the clock forward by `elapsed_ms`, firing due timers in order
    pub fn advance(&mut self, elapsed_ms: u64) {
        let until = self.now + elapsed_ms;
        while let Some((deadline, timer)) = self.timers.pop_due(until) {
            self.now = deadline;
            self.fire(timer);
        }
        self.now = until;
    }

    /// Handle a click at play-area-relative cell (x, y)
    pub fn click(&mut self, x: u16, y: u16) -> ClickOutcome {
        if self.phase != SessionPhase::Running || !self.area.contains(x, y) {
            return ClickOutcome::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return ClickOutcome::Ignored;
        };

        if self.target.is_clickable() && self.target.covers(x, y) {
            self.timers.cancel(Timer::Disappear);
            self.timers.cancel(Timer::PopIn);
            self.target.phase = TargetPhase::Hit;

            let reaction = self.target.shown_at.map(|at| self.now - at);
            let id = self
                .tracker
                .hit(&mut session.score, self.target.position, reaction);

            self.timers.schedule(Timer::Flash, self.now, FLASH_MS);
            self.timers.schedule(Timer::Feedback(id), self.now, FEEDBACK_MS);
            self.timers
                .schedule(Timer::Respawn, self.now, RESPAWN_AFTER_HIT_MS);
            ClickOutcome::Hit
        } else {
            let id = self.tracker.miss(&mut session.score, Position::new(x, y));
            self.timers.schedule(Timer::Flash, self.now, FLASH_MS);
            self.timers.schedule(Timer::Feedback(id), self.now, FEEDBACK_MS);
            ClickOutcome::Miss
        }
    }

    fn fire(&mut self, timer: Timer) {
        if self.phase != SessionPhase::Running {
            return;
        }

        match timer {
            Timer::Tick => {
                let expired = match self.session.as_mut() {
                    Some(session) => session.on_tick(),
                    None => true,
                };
                if expired {
                    self.end();
                } else {
                    self.timers.schedule(Timer::Tick, self.now, TICK_MS);
                }
            }
            Timer::Disappear => {
                self.target.phase = TargetPhase::Hidden;
                self.timers
                    .schedule(Timer::Respawn, self.now, RESPAWN_AFTER_DISAPPEAR_MS);
            }
            Timer::Respawn => self.spawn(),
            Timer::PopIn => {
                if self.target.phase == TargetPhase::PopIn {
                    self.target.phase = TargetPhase::Shown;
                }
            }
            Timer::Flash => self.tracker.clear_flash(),
            Timer::Feedback(id) => self.tracker.expire_feedback(id),
        }
    }

    fn spawn(&mut self) {
        let interval = match self.session.as_ref() {
            Some(session) => session.disappear_interval_ms,
            None => return,
        };

        self.timers.cancel(Timer::Disappear);
        self.timers.cancel(Timer::Respawn);

        let previous = (self.spawn_count > 0).then_some(self.target.position);
        let next = self.spawner.next_position(self.area, previous);

        self.target.last_position = previous;
        self.target.position = next;
        self.target.phase = TargetPhase::PopIn;
        self.target.shown_at = Some(self.now);
        self.spawn_count += 1;

        self.timers.schedule(Timer::PopIn, self.now, POP_IN_MS);
        self.timers.schedule(Timer::Disappear, self.now, interval);
    }

    /// Running -> Ended
    fn end(&mut self) {
        self.phase = SessionPhase::Ended;
        self.timers.clear();
        self.target.phase = TargetPhase::Hidden;
        self.tracker.clear_visuals();

        let Some(session) = self.session.as_ref() else {
            return;
        };
        let username = session.username.clone();
        let score = session.score;
        info!("session ended for {} with score {}", username, score);

        let mut write_error = None;
        let mut read_error = None;

        let personal_best = match self.leaderboard.submit_score(&username, score) {
            Ok(improved) => improved,
            Err(e) => {
                warn!("leaderboard write failed: {:#}", e);
                write_error = Some(e.to_string());
                false
            }
        };

        let standings = match self.leaderboard.fetch_top(self.leaderboard_size) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("leaderboard read failed: {:#}", e);
                read_error = Some(e.to_string());
                Vec::new()
            }
        };

        if let Some(sink) = self.analytics.as_mut() {
            let event = AnalyticsEvent::GameFinished {
                username: username.clone(),
                score,
                at: Local::now(),
            };
            if let Err(e) = sink.record(&event) {
                warn!("analytics event {} dropped: {:#}", event.name(), e);
            }
        }

        self.results = Some(GameResults {
            username,
            score,
            hits: self.tracker.hits,
            misses: self.tracker.misses,
            accuracy: self.tracker.accuracy(),
            reaction: self.tracker.reaction_summary(),
            personal_best,
            standings,
            write_error,
            read_error,
        });
    }
}
