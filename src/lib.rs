// LogPane - lib.rs
//
// Library entry point. Exposes every layer so hosts (the bundled CLI, a GUI
// shell, integration tests) drive the same view state.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
