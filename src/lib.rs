// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod analytics;
pub mod app_dirs;
pub mod config;
pub mod game;
pub mod leaderboard;
pub mod runtime;
pub mod scheduler;
pub mod score;
pub mod session;
pub mod spawner;
