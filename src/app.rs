//! Application module: exposes the app model used by the TUI and runtime.
//!
//! `App` lives in `app::model` and holds the library view, the cursor and
//! the services the key handlers drive.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
