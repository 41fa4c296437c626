// LogPane - app/mod.rs
//
// Application layer: load orchestration, file location, view state.
// Dependencies: core layer, platform::fs.

pub mod load;
pub mod locator;
pub mod state;
