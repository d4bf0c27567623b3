//! Persisted per-user state: favorites, play history, listening statistics
//! and preferences.

mod model;
mod store;

pub use store::{UserData, UserDataError};

#[cfg(test)]
mod tests;
