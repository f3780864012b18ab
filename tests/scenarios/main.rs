//! Scenario-based tests for cricic hook runs

#[path = "../helpers.rs"]
mod helpers;

mod post_receive;
mod target_runner;
