//! API request handlers

mod health;
mod jobs;
mod resources;

pub use health::*;
pub use jobs::*;
pub use resources::*;
