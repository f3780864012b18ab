//! Repository administration: scaffolding, reporting and removal
//!
//! None of this runs inside a hook. The hooks only assume that what
//! [`init`] creates is still in place.

pub mod info;
pub mod scaffold;

pub use info::{info, CommitInfo, RepositoryInfo};
pub use scaffold::{init, remove, InitReport};
