//! Background polling pipeline: capture, decode, infer, publish.

pub mod cache;
pub mod capture;
pub mod poll_loop;

pub use cache::{Cache, TrackerHandle};
pub use poll_loop::{
    DEFAULT_ERROR_BACKOFF, DEFAULT_POLL_INTERVAL, PollConfig, PollLoop, TickOutcome,
};
