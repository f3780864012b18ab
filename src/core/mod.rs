//! Core domain models
//!
//! Configuration layers, the repository layout, build stages, run state and
//! the errors a hook run can end with.

pub mod config;
pub mod error;
pub mod repository;
pub mod stage;
pub mod state;

pub use config::*;
pub use error::*;
pub use repository::*;
pub use stage::*;
pub use state::*;
