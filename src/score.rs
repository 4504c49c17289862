use crate::spawner::Position;

pub const FEEDBACK_MS: u64 = 800;
pub const FLASH_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Gain,
    Penalty,
}

/// Floating "+1" / "-1" marker inside the play area
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub id: u64,
    pub kind: FeedbackKind,
    pub position: Position,
}

impl Feedback {
    pub fn text(&self) -> &'static str {
        match self.kind {
            FeedbackKind::Gain => "+1",
            FeedbackKind::Penalty => "-1",
        }
    }
}

/// Score bookkeeping plus the transient visuals tied to it
#[derive(Debug, Default)]
pub struct ScoreTracker {
    pub hits: u32,
    pub misses: u32,
    pub flash: Option<FeedbackKind>,
    pub feedback: Vec<Feedback>,
    pub reaction_times_ms: Vec<f64>,
    next_feedback_id: u64,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a hit to `score` and returns the id of the new marker
    pub fn hit(&mut self, score: &mut u32, at: Position, reaction_ms: Option<u64>) -> u64 {
        *score += 1;
        self.hits += 1;
        if let Some(ms) = reaction_ms {
            self.reaction_times_ms.push(ms as f64);
        }
        self.push_feedback(FeedbackKind::Gain, at)
    }

    /// Applies a miss to `score`, never going below zero
    pub fn miss(&mut self, score: &mut u32, at: Position) -> u64 {
        *score = score.saturating_sub(1);
        self.misses += 1;
        self.push_feedback(FeedbackKind::Penalty, at)
    }

    pub fn expire_feedback(&mut self, id: u64) {
        self.feedback.retain(|f| f.id != id);
    }

    pub fn clear_flash(&mut self) {
        self.flash = None;
    }

    pub fn clear_visuals(&mut self) {
        self.flash = None;
        self.feedback.clear();
    }

    /// Hit percentage over all clicks, None before the first click
    pub fn accuracy(&self) -> Option<f64> {
        let clicks = self.hits + self.misses;
        if clicks == 0 {
            None
        } else {
            Some((self.hits as f64 / clicks as f64 * 100.0).round())
        }
    }

    pub fn reaction_summary(&self) -> Option<ReactionSummary> {
        ReactionSummary::from_samples(&self.reaction_times_ms)
    }

    fn push_feedback(&mut self, kind: FeedbackKind, position: Position) -> u64 {
        let id = self.next_feedback_id;
        self.next_feedback_id += 1;
        self.flash = Some(kind);
        self.feedback.push(Feedback { id, kind, position });
        id
    }
}

/// Mean and population standard deviation of hit reaction times
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionSummary {
    pub mean_ms: f64,
    pub std_dev_ms: f64,
}

impl ReactionSummary {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let mean_ms = samples.iter().sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|v| {
                let diff = v - mean_ms;
                diff * diff
            })
            .sum::<f64>()
            / n;

        Some(Self {
            mean_ms,
            std_dev_ms: variance.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_increments_by_one() {
        let mut tracker = ScoreTracker::new();
        let mut score = 3;
        tracker.hit(&mut score, Position::new(2, 2), Some(250));
        assert_eq!(score, 4);
        assert_eq!(tracker.hits, 1);
        assert_eq!(tracker.flash, Some(FeedbackKind::Gain));
        assert_eq!(tracker.reaction_times_ms, vec![250.0]);
    }

    #[test]
    fn miss_never_goes_negative() {
        let mut tracker = ScoreTracker::new();
        let mut score = 1;
        for _ in 0..10 {
            tracker.miss(&mut score, Position::new(0, 0));
        }
        assert_eq!(score, 0);
        assert_eq!(tracker.misses, 10);
        assert_eq!(tracker.flash, Some(FeedbackKind::Penalty));
    }

    #[test]
    fn feedback_markers_expire_individually() {
        let mut tracker = ScoreTracker::new();
        let mut score = 0;
        let a = tracker.hit(&mut score, Position::new(1, 1), None);
        let b = tracker.miss(&mut score, Position::new(5, 3));
        assert_ne!(a, b);
        assert_eq!(tracker.feedback.len(), 2);

        tracker.expire_feedback(a);
        assert_eq!(tracker.feedback.len(), 1);
        assert_eq!(tracker.feedback[0].text(), "-1");
        assert_eq!(tracker.feedback[0].position, Position::new(5, 3));
    }

    #[test]
    fn accuracy_counts_all_clicks() {
        let mut tracker = ScoreTracker::new();
        assert_eq!(tracker.accuracy(), None);
        let mut score = 0;
        tracker.hit(&mut score, Position::new(1, 1), None);
        tracker.hit(&mut score, Position::new(1, 1), None);
        tracker.hit(&mut score, Position::new(1, 1), None);
        tracker.miss(&mut score, Position::new(1, 1));
        assert_eq!(tracker.accuracy(), Some(75.0));
    }

    #[test]
    fn reaction_summary_of_samples() {
        assert_eq!(ReactionSummary::from_samples(&[]), None);

        let single = ReactionSummary::from_samples(&[420.0]).unwrap();
        assert_eq!(single.mean_ms, 420.0);
        assert_eq!(single.std_dev_ms, 0.0);

        let spread = ReactionSummary::from_samples(&[200.0, 400.0]).unwrap();
        assert_eq!(spread.mean_ms, 300.0);
        assert_eq!(spread.std_dev_ms, 100.0);
    }
}
