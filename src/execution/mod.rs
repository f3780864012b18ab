//! Hook execution
//!
//! The [`HookEngine`] drives both hooks; the [`TargetRunner`] runs the
//! targets of one stage.

pub mod checkout;
pub mod engine;
pub mod events;
pub mod lock;
pub mod runner;
pub mod swap;

pub use checkout::{Checkout, GitCheckout};
pub use engine::{DeployReport, HookEngine};
pub use events::{EventBus, EventHandler, HookEvent};
pub use lock::RepositoryLock;
pub use runner::TargetRunner;
pub use swap::BuildfileSwap;
