// LogPane - core/mod.rs
//
// Core business logic layer.
// Must NOT depend on: platform, app, or open files itself. Readers are
// handed in as `BufRead`; discovery only lists directories.

pub mod cancel;
pub mod discovery;
pub mod filter;
pub mod model;
pub mod parser;
