//! Typed access to dispatcher job results
//!
//! Job outputs come back as raw payloads; this crate turns them into typed
//! values. [`BlastJob`] parses the BLAST `json` report and exposes the
//! rendered visualisations, [`AlignmentJob`] parses the summary header of
//! the pairwise alignment text format. Every fetch goes through the cached
//! client, so results are downloaded at most once per job and output.

mod error;

pub mod alignment;
pub mod blast;
pub mod image;

pub use alignment::{AlignmentJob, AlignmentStats, Ratio};
pub use blast::{BlastJob, BlastReport, Hit, Hsp, SimpleHit};
pub use error::{Error, Result};
pub use image::{ImageFormat, RenderedImage};
