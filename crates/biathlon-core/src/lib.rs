//! Competitor state machine, event dispatch, and results for the biathlon
//! race-log processor.
//!
//! This crate replays a race event log: each line is parsed, applied to the
//! competitor it names, narrated, and at the end the results table is
//! built from whatever state every competitor reached.
//!
//! # Modules
//!
//! - [`clock`] -- `HH:MM:SS.mmm` timestamp codec.
//! - [`config`] -- Race configuration loading and validation into
//!   [`RaceRules`].
//! - [`runner`] -- The per-competitor state machine, [`Runner`].
//! - [`range`] -- Firing range occupancy.
//! - [`result`] -- One competitor's result line and its rendering.
//! - [`event_log`] -- Log line parser.
//! - [`dispatch`] -- [`EventDispatcher`] and the [`Narrator`] sink.
//! - [`race`] -- The replay loop with error policy and cancellation.
//! - [`report`] -- The final [`ResultsTable`].
//! - [`operator`] -- Stop signal and error policy shared with the engine.
//!
//! [`RaceRules`]: config::RaceRules
//! [`Runner`]: runner::Runner
//! [`EventDispatcher`]: dispatch::EventDispatcher
//! [`Narrator`]: dispatch::Narrator
//! [`ResultsTable`]: report::ResultsTable

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod event_log;
pub mod operator;
pub mod race;
pub mod range;
pub mod report;
pub mod result;
pub mod runner;
