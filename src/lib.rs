// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds the CLI and terminal setup.
pub mod anti_cheat;
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod loader;
pub mod question;
pub mod report;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod ui;

/// Event loop tick; the exam clock itself only moves in whole seconds
pub const TICK_RATE_MS: u64 = 100;
