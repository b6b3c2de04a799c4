//! Job dispatcher client for EBI-style analysis services
//!
//! The dispatcher model is submit, poll, fetch: a job is submitted with a
//! parameter set, polled until it reports `FINISHED`, and its outputs are
//! then fetched by name. This crate wraps that protocol in [`JobRunner`],
//! which fingerprints every request and caches both job ids and result
//! payloads on disk, so repeated runs of the same analysis cost nothing and
//! completed work can be replayed offline.
//!
//! # Layers
//!
//! - [`transport`]: the HTTP protocol surface, behind the [`JobTransport`]
//!   trait so tests can script a dispatcher
//! - [`poll`]: submission and the bounded status polling loop
//! - [`executor`]: cached execution on top of the two
//! - [`testing`]: a scripted transport for downstream tests

mod error;

pub mod config;
pub mod executor;
pub mod poll;
pub mod testing;
pub mod transport;

pub use config::{ClientConfig, PollConfig};
pub use error::{Error, Result};
pub use executor::{FetchOptions, JobRunner};
pub use poll::{JobStatus, PollSchedule};
pub use transport::{JobHandle, JobTransport, RestTransport, SubmitResponse};
