// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod config;
pub mod counter;
pub mod cue;
pub mod dispatch;
pub mod engine;
pub mod runtime;
pub mod session;
pub mod store;
pub mod ui;
pub mod util;
