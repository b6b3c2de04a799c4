//! BLAST report model and job accessors
//!
//! The dispatcher's `json` output is a flat report with a `hits` list, each
//! hit carrying UniProt annotations and one or more scored alignments
//! (HSPs). [`BlastReport`] mirrors that structure verbatim; [`SimpleHit`]
//! flattens a hit onto its single alignment and decodes the UniProt section
//! and evidence codes into readable labels.

use crate::error::{Error, Result};
use crate::image::{ImageFormat, RenderedImage};
use ebitools_client::{FetchOptions, JobHandle, JobRunner};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Dispatcher service name for NCBI BLAST jobs
pub const SERVICE: &str = "ncbiblast";

/// Protein existence label for a UniProt evidence level code
#[must_use]
pub fn evidence_label(level: &str) -> Option<&'static str> {
    match level.trim() {
        "1" => Some("1. Experimental evidence at protein level"),
        "2" => Some("2. Experimental evidence at transcript level"),
        "3" => Some("3. Protein inferred from homology"),
        "4" => Some("4. Protein predicted"),
        "5" => Some("5. Protein uncertain"),
        _ => None,
    }
}

/// Human-readable name for a UniProt section code
#[must_use]
pub fn database_label(code: &str) -> Option<&'static str> {
    match code.trim() {
        "SP" => Some("Swiss-Prot (Reviewed)"),
        "TR" => Some("TrEMBL (Unreviewed)"),
        _ => None,
    }
}

/// Parsed `json` output of a BLAST job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastReport {
    /// Program that produced the report
    pub program: String,
    /// Program version string
    pub version: String,
    /// Definition line of the query sequence
    #[serde(default)]
    pub query_def: String,
    /// Length of the query sequence
    #[serde(default)]
    pub query_len: u64,
    /// Database hits, best first
    #[serde(default)]
    pub hits: Vec<Hit>,
}

impl BlastReport {
    /// Parse the report from the dispatcher's `json` output
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|source| Error::parse(format!("BLAST report is not valid JSON: {source}")))
    }

    /// Flattened view of all hits
    ///
    /// Hits without a scored alignment are skipped with a warning.
    #[must_use]
    pub fn simple_hits(&self) -> Vec<SimpleHit> {
        self.hits.iter().filter_map(SimpleHit::from_hit).collect()
    }

    /// Flattened view of the hit with the given accession
    #[must_use]
    pub fn by_accession(&self, accession: &str) -> Option<SimpleHit> {
        self.hits
            .iter()
            .find(|hit| hit.hit_acc == accession)
            .and_then(SimpleHit::from_hit)
    }
}

impl std::fmt::Display for BlastReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} with {} hits>", self.version, self.hits.len())
    }
}

/// One database hit
///
/// Field names mirror the dispatcher's JSON keys.
#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Rank of the hit in the report
    pub hit_num: u32,
    /// UniProt section code (`SP` or `TR`)
    #[serde(default)]
    pub hit_db: String,
    /// Full database identifier
    pub hit_id: String,
    /// Accession
    pub hit_acc: String,
    /// Raw description line
    #[serde(default)]
    pub hit_desc: String,
    /// Link to the database record
    #[serde(default)]
    pub hit_url: String,
    /// Protein description
    #[serde(default)]
    pub hit_uni_de: String,
    /// Species
    #[serde(default)]
    pub hit_uni_os: String,
    /// Organism taxonomy id
    #[serde(default)]
    pub hit_uni_ox: String,
    /// Gene name
    #[serde(default)]
    pub hit_uni_gn: String,
    /// Protein existence evidence level (`1` to `5`)
    #[serde(default)]
    pub hit_uni_pe: String,
    /// Sequence version
    #[serde(default)]
    pub hit_uni_sv: String,
    /// Subject sequence length
    pub hit_len: u64,
    /// Scored alignments between the query and this subject
    #[serde(default)]
    pub hit_hsps: Vec<Hsp>,
}

/// A high-scoring segment pair
///
/// Field names mirror the dispatcher's JSON keys.
#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hsp {
    /// Rank of the pair within its hit
    #[serde(default)]
    pub hsp_num: u32,
    /// Raw alignment score
    #[serde(default)]
    pub hsp_score: u64,
    /// Bit score
    #[serde(default)]
    pub hsp_bit_score: f64,
    /// Expectation value
    pub hsp_expect: f64,
    /// Percent identity over the alignment
    pub hsp_identity: f64,
    /// Percent positive substitutions over the alignment
    #[serde(default)]
    pub hsp_positive: f64,
    /// Number of gap positions
    #[serde(default)]
    pub hsp_gaps: u64,
    /// Alignment length
    #[serde(default)]
    pub hsp_align_len: u64,
    /// Aligned query sequence
    #[serde(default)]
    pub hsp_qseq: String,
    /// Match line between the aligned sequences
    #[serde(default)]
    pub hsp_mseq: String,
    /// Aligned subject sequence
    #[serde(default)]
    pub hsp_hseq: String,
}

/// Flattened view of a hit and its single scored alignment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleHit {
    /// Rank of the hit in the report
    pub num: u32,
    /// Human-readable source database name, if the section code is known
    pub database: Option<String>,
    /// Full database identifier
    pub identifier: String,
    /// Accession
    pub accession: String,
    /// Subject sequence length
    pub length: u64,
    /// Protein description
    pub description: String,
    /// Species
    pub species: String,
    /// Gene name
    pub gene_name: String,
    /// Sequence version
    pub sequence_version: String,
    /// Protein existence label, if the evidence level is known
    pub existence: Option<String>,
    /// Link to the database record
    pub url: String,
    /// Percent identity of the alignment
    pub identity: f64,
    /// Expectation value of the alignment
    pub e_value: f64,
}

impl SimpleHit {
    /// Flatten a hit onto its single scored alignment
    ///
    /// Returns `None` for hits without any alignment. When a hit carries
    /// more than one, the first is used and the rest are ignored.
    #[must_use]
    pub fn from_hit(hit: &Hit) -> Option<Self> {
        let hsp = match hit.hit_hsps.as_slice() {
            [] => {
                warn!(accession = %hit.hit_acc, "Hit has no scored alignment, skipping");
                return None;
            }
            [only] => only,
            [first, rest @ ..] => {
                warn!(
                    accession = %hit.hit_acc,
                    ignored = rest.len(),
                    "Hit has multiple scored alignments, using the first"
                );
                first
            }
        };
        Some(Self {
            num: hit.hit_num,
            database: database_label(&hit.hit_db).map(str::to_string),
            identifier: hit.hit_id.clone(),
            accession: hit.hit_acc.clone(),
            length: hit.hit_len,
            description: hit.hit_uni_de.clone(),
            species: hit.hit_uni_os.clone(),
            gene_name: hit.hit_uni_gn.clone(),
            sequence_version: hit.hit_uni_sv.clone(),
            existence: evidence_label(&hit.hit_uni_pe).map(str::to_string),
            url: hit.hit_url.clone(),
            identity: hsp.hsp_identity,
            e_value: hsp.hsp_expect,
        })
    }
}

/// Handle to a finished BLAST job with cached result access
#[derive(Debug, Clone)]
pub struct BlastJob {
    runner: JobRunner,
    handle: JobHandle,
    fetch: FetchOptions,
}

impl BlastJob {
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

    /// Fetch and parse the job's report
    pub async fn report(&self) -> Result<BlastReport> {
        let value = self
            .runner
            .fetch_output(SERVICE, &self.handle, "json", self.fetch)
            .await?;
        let text = value
            .as_text()
            .ok_or_else(|| Error::parse("json output is not text"))?;
        BlastReport::parse(text)
    }

    /// Fetch the rendered overview of the hit alignments
    pub async fn visual(&self, format: ImageFormat) -> Result<RenderedImage> {
        self.image("visual", format).await
    }

    /// Fetch the fast family and domain prediction rendering
    pub async fn domain_prediction(&self, format: ImageFormat) -> Result<RenderedImage> {
        self.image("ffdp-subject", format).await
    }

    async fn image(&self, kind: &str, format: ImageFormat) -> Result<RenderedImage> {
        let output = format!("{kind}-{}", format.file_extension());
        let value = self
            .runner
            .fetch_output(SERVICE, &self.handle, &output, self.fetch)
            .await?;
        Ok(RenderedImage::new(format, value.to_bytes()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebitools_client::ClientConfig;
    use ebitools_client::testing::MockTransport;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample_report() -> &'static str {
        r#"{
          "program": "blastp",
          "version": "BLASTP 2.14.1+",
          "query_def": "test query",
          "query_len": 10,
          "hits": [
            {
              "hit_num": 1,
              "hit_db": "SP",
              "hit_id": "SP:BRCA1_HUMAN",
              "hit_acc": "P38398",
              "hit_desc": "RecName: Full=Breast cancer type 1 susceptibility protein",
              "hit_url": "https://www.uniprot.org/uniprotkb/P38398",
              "hit_uni_de": "Breast cancer type 1 susceptibility protein",
              "hit_uni_os": "Homo sapiens",
              "hit_uni_ox": "9606",
              "hit_uni_gn": "BRCA1",
              "hit_uni_pe": "1",
              "hit_uni_sv": "2",
              "hit_len": 1863,
              "hit_hsps": [
                {
                  "hsp_num": 1,
                  "hsp_score": 58,
                  "hsp_bit_score": 27.3,
                  "hsp_expect": 1.2e-12,
                  "hsp_identity": 100.0,
                  "hsp_positive": 100.0,
                  "hsp_gaps": 0,
                  "hsp_align_len": 10,
                  "hsp_qseq": "MKTAYIAKQR",
                  "hsp_mseq": "||||||||||",
                  "hsp_hseq": "MKTAYIAKQR"
                }
              ]
            },
            {
              "hit_num": 2,
              "hit_db": "TR",
              "hit_id": "TR:A0A2J8KV45",
              "hit_acc": "A0A2J8KV45",
              "hit_uni_de": "BRCA1 isoform",
              "hit_uni_os": "Pan troglodytes",
              "hit_uni_gn": "BRCA1",
              "hit_uni_pe": "3",
              "hit_uni_sv": "1",
              "hit_len": 1798,
              "hit_hsps": [
                {"hsp_expect": 4.0e-9, "hsp_identity": 90.0},
                {"hsp_expect": 2.5e-2, "hsp_identity": 40.0}
              ]
            },
            {
              "hit_num": 3,
              "hit_db": "XX",
              "hit_id": "XX:UNKNOWN1",
              "hit_acc": "X99999",
              "hit_uni_pe": "9",
              "hit_len": 120,
              "hit_hsps": [
                {"hsp_expect": 1.0, "hsp_identity": 25.0}
              ]
            },
            {
              "hit_num": 4,
              "hit_db": "SP",
              "hit_id": "SP:EMPTY",
              "hit_acc": "E00000",
              "hit_len": 50,
              "hit_hsps": []
            }
          ]
        }"#
    }

    fn runner_with(transport: Arc<MockTransport>, dir: &TempDir) -> JobRunner {
        let config = ClientConfig::new("someone@example.org").with_cache_dir(dir.path());
        JobRunner::with_transport(config, transport).unwrap()
    }

    // ==========================================================================
    // Report parsing tests
    // ==========================================================================

    #[test]
    fn test_report_parses_dispatcher_output() {
        let report = BlastReport::parse(sample_report()).unwrap();

        assert_eq!(report.program, "blastp");
        assert_eq!(report.version, "BLASTP 2.14.1+");
        assert_eq!(report.query_len, 10);
        assert_eq!(report.hits.len(), 4);
        assert_eq!(report.hits[0].hit_acc, "P38398");
        assert_eq!(report.hits[0].hit_hsps[0].hsp_align_len, 10);
    }

    #[test]
    fn test_malformed_report_is_a_parse_error() {
        let err = BlastReport::parse("not json at all").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn test_report_display_names_version_and_hit_count() {
        let report = BlastReport::parse(sample_report()).unwrap();
        assert_eq!(report.to_string(), "<BLASTP 2.14.1+ with 4 hits>");
    }

    // ==========================================================================
    // Simplification tests
    // ==========================================================================

    #[test]
    fn test_simple_hits_flatten_onto_single_alignment() {
        let report = BlastReport::parse(sample_report()).unwrap();

        // The hit without any alignment is skipped
        let simple = report.simple_hits();
        assert_eq!(simple.len(), 3);

        let first = &simple[0];
        assert_eq!(first.num, 1);
        assert_eq!(first.accession, "P38398");
        assert_eq!(first.identifier, "SP:BRCA1_HUMAN");
        assert_eq!(first.database.as_deref(), Some("Swiss-Prot (Reviewed)"));
        assert_eq!(
            first.existence.as_deref(),
            Some("1. Experimental evidence at protein level")
        );
        assert_eq!(first.description, "Breast cancer type 1 susceptibility protein");
        assert_eq!(first.species, "Homo sapiens");
        assert_eq!(first.gene_name, "BRCA1");
        assert_eq!(first.sequence_version, "2");
        assert_eq!(first.length, 1863);
        assert_eq!(first.url, "https://www.uniprot.org/uniprotkb/P38398");
        assert!((first.identity - 100.0).abs() < f64::EPSILON);
        assert!((first.e_value - 1.2e-12).abs() < 1e-20);
    }

    #[test]
    fn test_multiple_alignments_use_the_first() {
        let report = BlastReport::parse(sample_report()).unwrap();
        let second = report.by_accession("A0A2J8KV45").unwrap();

        assert_eq!(second.database.as_deref(), Some("TrEMBL (Unreviewed)"));
        assert_eq!(
            second.existence.as_deref(),
            Some("3. Protein inferred from homology")
        );
        assert!((second.identity - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_codes_map_to_none() {
        let report = BlastReport::parse(sample_report()).unwrap();
        let odd = report.by_accession("X99999").unwrap();

        assert_eq!(odd.database, None);
        assert_eq!(odd.existence, None);
    }

    #[test]
    fn test_by_accession_misses_return_none() {
        let report = BlastReport::parse(sample_report()).unwrap();
        assert!(report.by_accession("Q00000").is_none());
        // Present in the report but has no alignment to flatten onto
        assert!(report.by_accession("E00000").is_none());
    }

    #[test]
    fn test_evidence_labels_cover_all_levels() {
        assert_eq!(
            evidence_label("1"),
            Some("1. Experimental evidence at protein level")
        );
        assert_eq!(
            evidence_label("2"),
            Some("2. Experimental evidence at transcript level")
        );
        assert_eq!(evidence_label("3"), Some("3. Protein inferred from homology"));
        assert_eq!(evidence_label("4"), Some("4. Protein predicted"));
        assert_eq!(evidence_label("5"), Some("5. Protein uncertain"));
        assert_eq!(evidence_label("6"), None);
        assert_eq!(evidence_label(""), None);
    }

    #[test]
    fn test_database_labels() {
        assert_eq!(database_label("SP"), Some("Swiss-Prot (Reviewed)"));
        assert_eq!(database_label("TR"), Some("TrEMBL (Unreviewed)"));
        assert_eq!(database_label("PDB"), None);
    }

    // ==========================================================================
    // Job accessor tests
    // ==========================================================================

    #[tokio::test]
    async fn test_report_is_fetched_once() {
        let dir = TempDir::new().unwrap();
        let transport =
            Arc::new(MockTransport::new("job-1").with_result("json", sample_report().as_bytes()));
        let job = BlastJob::new(runner_with(transport.clone(), &dir), JobHandle::new("job-1"));

        let report = job.report().await.unwrap();
        let again = job.report().await.unwrap();

        assert_eq!(report.hits.len(), 4);
        assert_eq!(again, report);
        assert_eq!(transport.result_calls(), 1);
    }

    #[tokio::test]
    async fn test_visual_fetches_the_format_specific_output() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(
            MockTransport::new("job-1").with_result("visual-svg", b"<svg/>".as_slice()),
        );
        let job = BlastJob::new(runner_with(transport.clone(), &dir), JobHandle::new("job-1"));

        let image = job.visual(ImageFormat::Svg).await.unwrap();

        assert_eq!(image.format(), ImageFormat::Svg);
        assert_eq!(image.data(), b"<svg/>");
        assert_eq!(transport.result_calls(), 1);
    }

    #[tokio::test]
    async fn test_domain_prediction_preserves_binary_payloads() {
        let dir = TempDir::new().unwrap();
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0xFF];
        let transport = Arc::new(
            MockTransport::new("job-1").with_result("ffdp-subject-png", png.as_slice()),
        );
        let job = BlastJob::new(runner_with(transport.clone(), &dir), JobHandle::new("job-1"));

        let image = job.domain_prediction(ImageFormat::Png).await.unwrap();

        assert_eq!(image.format(), ImageFormat::Png);
        assert_eq!(image.data(), png);
        assert_eq!(image.media_type(), "image/png");
    }

    #[tokio::test]
    async fn test_results_replay_for_a_new_job_handle() {
        let dir = TempDir::new().unwrap();
        let online =
            Arc::new(MockTransport::new("job-1").with_result("json", sample_report().as_bytes()));
        let runner = runner_with(online.clone(), &dir);
        BlastJob::new(runner, JobHandle::new("job-1"))
            .report()
            .await
            .unwrap();

        // A runner over the same cache dir never reaches its dead transport
        let offline = Arc::new(MockTransport::rejecting(500, "service unavailable"));
        let replay = BlastJob::new(runner_with(offline.clone(), &dir), JobHandle::new("job-1"))
            .with_fetch_options(FetchOptions {
                cached_only: true,
                force_refresh: false,
            });

        let report = replay.report().await.unwrap();
        assert_eq!(report.hits.len(), 4);
        assert_eq!(offline.result_calls(), 0);
    }
}
