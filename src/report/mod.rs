//! Report boundary — JSON records for downstream rendering
//!
//! Rendering and the viewer live outside this crate; what crosses the
//! boundary is one JSON record per retained comparison plus a run
//! overview. Match positions are reported as line numbers when the
//! front-end provides them and as token indices otherwise.

use crate::comparison::{Comparison, SimilarityMetric};
use crate::engine::{RunResult, TesseraConfig};
use crate::submission::{SubmissionSet, Submission};
use crate::TesseraResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ─── Records ───────────────────────────────────────────────────────

/// One matched region, positioned by line numbers when available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedRegion {
    pub file_first: String,
    pub file_second: String,
    pub start_first: i32,
    pub end_first: i32,
    pub start_second: i32,
    pub end_second: i32,
    /// Number of matched tokens in this region.
    pub tokens: usize,
}

/// The persisted form of one retained comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub first: String,
    pub second: String,
    /// Full metric-name → value dictionary.
    pub similarities: BTreeMap<String, f64>,
    pub regions: Vec<MatchedRegion>,
}

/// Summary of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOverview {
    pub generated_at: DateTime<Utc>,
    pub submissions: Vec<String>,
    pub failed_submissions: Vec<String>,
    pub base_code: Option<String>,
    pub options: TesseraConfig,
    pub total_comparisons: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
}

// ─── Record building ───────────────────────────────────────────────

/// Build the persisted record of a comparison, resolving match indices
/// against the submissions' token streams.
pub fn comparison_record(comparison: &Comparison, submission_set: &SubmissionSet) -> ComparisonRecord {
    let first = submission_set.submission_by_name(&comparison.first_name);
    let second = submission_set.submission_by_name(&comparison.second_name);

    let regions = comparison
        .matches
        .iter()
        .map(|matched| {
            let (file_first, start_first, end_first) = region_bounds(
                first,
                matched.start_in_first,
                matched.end_in_first(),
            );
            let (file_second, start_second, end_second) = region_bounds(
                second,
                matched.start_in_second,
                matched.end_in_second(),
            );
            MatchedRegion {
                file_first,
                file_second,
                start_first,
                end_first,
                start_second,
                end_second,
                tokens: matched.length,
            }
        })
        .collect();

    ComparisonRecord {
        first: comparison.first_name.clone(),
        second: comparison.second_name.clone(),
        similarities: SimilarityMetric::similarity_map(comparison),
        regions,
    }
}

/// Resolve a token range to (file, start, end). Line numbers when the
/// tokens carry positions, token indices otherwise.
fn region_bounds(submission: Option<&Submission>, start: usize, end: usize) -> (String, i32, i32) {
    let Some(submission) = submission else {
        return (String::new(), start as i32, end as i32 - 1);
    };
    let tokens = submission.tokens();
    let first_token = &tokens[start];
    let last_token = &tokens[end - 1];
    if first_token.has_position() && last_token.has_position() {
        (first_token.file.clone(), first_token.line, last_token.line)
    } else {
        (first_token.file.clone(), start as i32, end as i32 - 1)
    }
}

// ─── Writing ───────────────────────────────────────────────────────

/// Write the run overview plus one JSON file per retained comparison
/// into `directory` (created if needed).
pub fn write_reports(
    directory: &Path,
    result: &RunResult,
    submission_set: &SubmissionSet,
    options: &TesseraConfig,
) -> TesseraResult<()> {
    std::fs::create_dir_all(directory)?;

    let overview = RunOverview {
        generated_at: Utc::now(),
        submissions: submission_set
            .submissions()
            .iter()
            .chain(submission_set.old_submissions().iter())
            .map(|s| s.name().to_string())
            .collect(),
        failed_submissions: submission_set
            .invalid_submissions()
            .iter()
            .map(|invalid| invalid.name.clone())
            .collect(),
        base_code: submission_set.base_code().map(|b| b.name().to_string()),
        options: options.clone(),
        total_comparisons: result.comparisons.len(),
        cancelled: result.cancelled,
        duration_ms: result.duration_ms,
    };
    let overview_path = directory.join("overview.json");
    std::fs::write(&overview_path, serde_json::to_string_pretty(&overview)?)?;

    for comparison in &result.comparisons {
        let record = comparison_record(comparison, submission_set);
        let file_name = format!(
            "{}-{}.json",
            sanitize(&record.first),
            sanitize(&record.second),
        );
        std::fs::write(
            directory.join(file_name),
            serde_json::to_string_pretty(&record)?,
        )?;
    }

    tracing::info!(
        "Wrote {} comparison records to {}",
        result.comparisons.len(),
        directory.display(),
    );
    Ok(())
}

/// Submission names may contain path separators or other characters
/// unfit for file names.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────
