//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema used to drive runtime
//! behavior and helpers to resolve the config, data and log locations.

mod load;
mod schema;

pub use load::{default_log_path, default_user_data_path};
pub use schema::*;
