mod client;
mod error;
pub mod planner;
mod retry;
mod types;

pub use client::*;
pub use error::*;
pub use retry::*;
pub use types::*;
