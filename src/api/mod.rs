pub mod api;
pub mod error;

pub use api::{config, not_found};
