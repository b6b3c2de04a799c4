//! Pairwise alignment job access and summary parsing
//!
//! The alignment tools report in a text format whose comment header carries
//! the summary figures (`# Identity:       8/10 (80.0%)`).
//! [`AlignmentStats`] parses those lines; the aligned sequences themselves
//! stay available as raw text.

use crate::error::{Error, Result};
use ebitools_client::{FetchOptions, JobHandle, JobRunner};
use serde::Serialize;

/// Dispatcher service name for EMBOSS needle jobs
pub const SERVICE: &str = "emboss_needle";

const ALIGNMENT_OUTPUT: &str = "out";

/// A count over a total, with the percentage the tool reported
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ratio {
    /// Number of matching positions
    pub count: u64,
    /// Alignment length the count is taken over
    pub total: u64,
    /// Percentage as printed by the tool
    pub percent: f64,
}

impl std::fmt::Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({:.1}%)", self.count, self.total, self.percent)
    }
}

/// Summary figures from an alignment's comment header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentStats {
    /// Alignment length including gaps
    pub length: u64,
    /// Identical positions
    pub identity: Ratio,
    /// Identical or similar positions
    pub similarity: Ratio,
    /// Gap positions
    pub gaps: Ratio,
    /// Alignment score
    pub score: f64,
}

impl AlignmentStats {
    /// Parse the summary header out of an alignment in text format
    pub fn parse(text: &str) -> Result<Self> {
        let mut length = None;
        let mut identity = None;
        let mut similarity = None;
        let mut gaps = None;
        let mut score = None;

        for line in text.lines() {
            let Some(rest) = line.strip_prefix('#') else {
                continue;
            };
            let Some((key, value)) = rest.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "Length" => length = value.parse().ok(),
                "Identity" => identity = parse_ratio(value),
                "Similarity" => similarity = parse_ratio(value),
                "Gaps" => gaps = parse_ratio(value),
                "Score" => score = value.parse().ok(),
                _ => {}
            }
        }

        Ok(Self {
            length: length.ok_or_else(|| Error::parse("alignment header has no Length line"))?,
            identity: identity
                .ok_or_else(|| Error::parse("alignment header has no Identity line"))?,
            similarity: similarity
                .ok_or_else(|| Error::parse("alignment header has no Similarity line"))?,
            gaps: gaps.ok_or_else(|| Error::parse("alignment header has no Gaps line"))?,
            score: score.ok_or_else(|| Error::parse("alignment header has no Score line"))?,
        })
    }
}

/// Parse a `8/10 (80.0%)` value
fn parse_ratio(raw: &str) -> Option<Ratio> {
    let (fraction, rest) = raw.split_once('(')?;
    let (count, total) = fraction.trim().split_once('/')?;
    let percent = rest.trim().strip_suffix("%)")?;
    Some(Ratio {
        count: count.trim().parse().ok()?,
        total: total.trim().parse().ok()?,
        percent: percent.trim().parse().ok()?,
    })
}

/// Handle to a finished pairwise alignment job with cached result access
#[derive(Clone)]
pub struct AlignmentJob {
    runner: JobRunner,
    handle: JobHandle,
    fetch: FetchOptions,
}

impl AlignmentJob {
    /// Wrap a finished job for result access
    #[must_use]
    pub fn new(runner: JobRunner, handle: JobHandle) -> Self {
        Self {
            runner,
            handle,
            fetch: FetchOptions::default(),
        }
    }

    /// Apply cache interaction flags to every fetch through this job
    #[must_use]
    pub fn with_fetch_options(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    /// The dispatcher job id
    #[must_use]
    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    /// Fetch the alignment in the tool's text format
    pub async fn text(&self) -> Result<String> {
        let value = self
            .runner
            .fetch_output(SERVICE, &self.handle, ALIGNMENT_OUTPUT, self.fetch)
            .await?;
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| Error::parse("alignment output is not text"))
    }

    /// Fetch the alignment and parse its summary header
    pub async fn stats(&self) -> Result<AlignmentStats> {
        AlignmentStats::parse(&self.text().await?)
    }
}
