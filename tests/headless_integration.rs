use std::sync::mpsc;
use std::time::Duration;

use reflex::game::{ClickOutcome, Game};
use reflex::leaderboard::{LeaderboardClient, SqliteLeaderboard};
use reflex::runtime::{FixedTicker, GameEvent, Runner, TestEventSource};
use reflex::session::SessionPhase;
use reflex::spawner::{Area, TargetSpawner};

fn seeded_game(board: Box<dyn LeaderboardClient>) -> Game {
    let mut game = Game::new(board).with_spawner(TargetSpawner::with_seed(2024));
    game.resize(Area::new(40, 12));
    game
}

// Headless integration using the internal runtime + Game without a TTY.
// Clicks arrive through the channel-backed event source, each Tick advances
// the virtual clock by a fixed slice.
#[test]
fn headless_clicks_flow_through_runner() {
    let mut game = seeded_game(Box::new(reflex::leaderboard::MemoryLeaderboard::new()));
    game.start("Ann").unwrap();
    game.advance(100);

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    let p = game.target().position;
    tx.send(GameEvent::Click {
        column: p.x,
        row: p.y,
    })
    .unwrap();

    let mut outcomes = Vec::new();
    for _ in 0..20u32 {
        match runner.step() {
            GameEvent::Tick => game.advance(10),
            GameEvent::Click { column, row } => outcomes.push(game.click(column, row)),
            GameEvent::Resize | GameEvent::Key(_) => {}
        }
    }

    assert_eq!(outcomes, vec![ClickOutcome::Hit]);
    assert_eq!(game.score(), 1);
    assert!(game.spawn_count() >= 2, "hit should have respawned the target");
}

#[test]
fn headless_session_ends_and_persists_best_score() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("leaderboard.db");

    for round in 0..2u32 {
        let board = SqliteLeaderboard::open(&db_path).unwrap();
        let mut game = seeded_game(Box::new(board));
        game.start("Ann").unwrap();

        // Hit every target in the first round, idle through the second
        while !game.has_finished() {
            game.advance(25);
            if round == 0 && game.target().is_clickable() {
                let p = game.target().position;
                game.click(p.x, p.y);
            }
        }

        assert_eq!(game.phase(), SessionPhase::Ended);
        let results = game.results().unwrap();
        assert_eq!(results.standings.len(), 1);
        if round == 0 {
            assert!(results.score > 0);
            assert!(results.personal_best);
        } else {
            assert_eq!(results.score, 0);
            assert!(!results.personal_best);
        }
    }

    let board = SqliteLeaderboard::open(&db_path).unwrap();
    let top = board.fetch_top(5).unwrap();
    assert_eq!(top.len(), 1);
    assert!(top[0].score > 0);
}

#[test]
fn headless_degenerate_area_still_plays() {
    let mut game = Game::new(Box::new(reflex::leaderboard::MemoryLeaderboard::new()));
    game.resize(Area::new(3, 1));
    game.start("Tiny").unwrap();
    game.advance(60_000);
    assert!(game.has_finished());
}
