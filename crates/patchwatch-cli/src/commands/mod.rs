//! CLI command implementations.

pub mod common;
pub mod config;
pub mod inspect;
pub mod patches;
pub mod run;
pub mod widgets;
