//! `retrotrack`: live Super Metroid progress tracking for RetroArch.
//!
//! A background poll loop reads emulator memory over the RetroArch UDP
//! network command interface, decodes it into game attributes, infers
//! boss and final-boss phase progress, and publishes the result to a
//! shared cache served over HTTP.

pub mod api;
pub mod cli;
pub mod config;
pub mod decode;
pub mod error;
pub mod inference;
pub mod observability;
pub mod poller;
pub mod transport;
