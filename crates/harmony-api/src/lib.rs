//! # Harmony-API
//!
//! Embedding surface for the Harmony engine.
//!
//! ## Components
//!
//! - `config` - layered [`HarmonyConfig`] (file + `HARMONY_` environment)
//! - `telemetry` - `tracing-subscriber` bootstrap
//! - `state` - per-user [`SessionRegistry`]
//! - `service` - [`MatchmakingService`] facade routing calls to sessions
//!
//! The `harmony-session` binary drives a session from the terminal.

pub mod config;
pub mod service;
pub mod state;
pub mod telemetry;

pub use config::*;
pub use service::*;
pub use state::*;
pub use telemetry::*;
