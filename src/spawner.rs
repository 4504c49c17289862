use rand::{rngs::StdRng, Rng, SeedableRng};

pub const TARGET_WIDTH: u16 = 4;
pub const TARGET_HEIGHT: u16 = 2;
pub const EDGE_BUFFER: u16 = 1;

/// Play area size in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Area {
    pub width: u16,
    pub height: u16,
}

impl Area {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

impl Position {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// How the target currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPhase {
    Hidden,
    /// just spawned, growing in
    PopIn,
    Shown,
    /// brief burst after a successful hit; not clickable
    Hit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetState {
    pub phase: TargetPhase,
    pub position: Position,
    pub last_position: Option<Position>,
    /// virtual clock time the target last became visible
    pub shown_at: Option<u64>,
}

impl Default for TargetState {
    fn default() -> Self {
        Self {
            phase: TargetPhase::Hidden,
            position: Position::new(EDGE_BUFFER, EDGE_BUFFER),
            last_position: None,
            shown_at: None,
        }
    }
}

impl TargetState {
    pub fn is_clickable(&self) -> bool {
        matches!(self.phase, TargetPhase::PopIn | TargetPhase::Shown)
    }

    /// Whether area-relative cell (x, y) falls on the target
    pub fn covers(&self, x: u16, y: u16) -> bool {
        let p = self.position;
        x >= p.x
            && x < p.x.saturating_add(TARGET_WIDTH)
            && y >= p.y
            && y < p.y.saturating_add(TARGET_HEIGHT)
    }
}

/// Inclusive sampling range for one axis, clamped so min <= max
pub fn axis_bounds(area_dim: u16, target_dim: u16, buffer: u16) -> (u16, u16) {
    let min = buffer;
    let max = area_dim
        .saturating_sub(target_dim)
        .saturating_sub(buffer)
        .max(min);
    (min, max)
}

/// Chooses target positions that never repeat the previous one
#[derive(Debug)]
pub struct TargetSpawner {
    rng: StdRng,
}

impl TargetSpawner {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniformly sample a position in `area`, redrawing while it equals `last`.
    ///
    /// When the clamped bounds leave exactly one position, it is returned even
    /// if it repeats.
    pub fn next_position(&mut self, area: Area, last: Option<Position>) -> Position {
        let (min_x, max_x) = axis_bounds(area.width, TARGET_WIDTH, EDGE_BUFFER);
        let (min_y, max_y) = axis_bounds(area.height, TARGET_HEIGHT, EDGE_BUFFER);

        if min_x == max_x && min_y == max_y {
            return Position::new(min_x, min_y);
        }

        loop {
            let candidate = Position::new(
                self.rng.gen_range(min_x..=max_x),
                self.rng.gen_range(min_y..=max_y),
            );
            if Some(candidate) != last {
                return candidate;
            }
        }
    }
}

impl Default for TargetSpawner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_bounds_normal() {
        assert_eq!(axis_bounds(80, 4, 1), (1, 75));
        assert_eq!(axis_bounds(20, 2, 1), (1, 17));
    }

    #[test]
    fn axis_bounds_degenerate_is_clamped() {
        assert_eq!(axis_bounds(5, 4, 1), (1, 1));
        assert_eq!(axis_bounds(3, 4, 1), (1, 1));
        assert_eq!(axis_bounds(0, 4, 1), (1, 1));
    }

    #[test]
    fn positions_stay_in_bounds() {
        let mut spawner = TargetSpawner::with_seed(7);
        let area = Area::new(40, 12);
        let mut last = None;
        for _ in 0..500 {
            let p = spawner.next_position(area, last);
            assert!(p.x >= EDGE_BUFFER && p.x <= 40 - TARGET_WIDTH - EDGE_BUFFER);
            assert!(p.y >= EDGE_BUFFER && p.y <= 12 - TARGET_HEIGHT - EDGE_BUFFER);
            last = Some(p);
        }
    }

    #[test]
    fn consecutive_positions_differ() {
        let mut spawner = TargetSpawner::with_seed(42);
        // Tiny area: 2 x 2 candidate positions makes repeats likely
        let area = Area::new(TARGET_WIDTH + 2 * EDGE_BUFFER + 1, TARGET_HEIGHT + 2 * EDGE_BUFFER + 1);
        let mut last = None;
        for _ in 0..1000 {
            let p = spawner.next_position(area, last);
            assert_ne!(Some(p), last);
            last = Some(p);
        }
    }

    #[test]
    fn single_position_area_reuses_it() {
        let mut spawner = TargetSpawner::with_seed(1);
        let area = Area::new(2, 2);
        let first = spawner.next_position(area, None);
        let second = spawner.next_position(area, Some(first));
        assert_eq!(first, Position::new(1, 1));
        assert_eq!(second, first);
    }

    #[test]
    fn seeded_spawners_agree() {
        let area = Area::new(60, 20);
        let mut a = TargetSpawner::with_seed(99);
        let mut b = TargetSpawner::with_seed(99);
        for _ in 0..20 {
            assert_eq!(a.next_position(area, None), b.next_position(area, None));
        }
    }

    #[test]
    fn covers_matches_target_rect() {
        let target = TargetState {
            phase: TargetPhase::Shown,
            position: Position::new(10, 5),
            last_position: None,
            shown_at: Some(0),
        };
        assert!(target.covers(10, 5));
        assert!(target.covers(13, 6));
        assert!(!target.covers(14, 5));
        assert!(!target.covers(10, 7));
        assert!(!target.covers(9, 5));
    }

    #[test]
    fn only_popin_and_shown_are_clickable() {
        let mut t = TargetState::default();
        assert!(!t.is_clickable());
        t.phase = TargetPhase::PopIn;
        assert!(t.is_clickable());
        t.phase = TargetPhase::Shown;
        assert!(t.is_clickable());
        t.phase = TargetPhase::Hit;
        assert!(!t.is_clickable());
    }
}
