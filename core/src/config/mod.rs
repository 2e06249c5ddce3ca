//! Application config.
//!
//! - `types.rs` holds the data structures and their serde defaults.
//! - `load.rs` does the IO: file lookup, parsing and env overrides.

mod load;
mod types;

pub use load::{load_default, load_from, DEFAULT_CONFIG_FILE};
pub use types::*;
