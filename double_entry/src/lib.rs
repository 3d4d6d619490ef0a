mod config;
mod index;
pub mod manual;
mod report;

use log::{debug, info, warn};

pub use crate::config::*;
pub use crate::index::RecordIndex;
pub use crate::report::{AnalysisResult, ExportBuilder};

// The role of an identifier with respect to the double-entry prefix.
#[derive(Eq, PartialEq, Debug, Clone)]
enum Entry<'a> {
    /// Not prefixed. Carries the identifier of its would-be double entry.
    Original { double_entry_id: Option<String> },
    /// Prefixed. Carries the identifier with the prefix stripped.
    DoubleEntry { original_id: &'a str },
}

fn classify<'a>(key: &'a ParticipantKey, prefix: &str) -> Entry<'a> {
    match key {
        ParticipantKey::Missing => Entry::Original {
            double_entry_id: None,
        },
        ParticipantKey::Id(id) => match id.strip_prefix(prefix) {
            Some(original_id) => Entry::DoubleEntry { original_id },
            None => Entry::Original {
                double_entry_id: Some(format!("{}{}", prefix, id)),
            },
        },
    }
}

/// What the analysis produced, before the export is assembled.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub builder: ExportBuilder,
    pub pairs: usize,
    pub mismatches: usize,
}

/// Runs the whole pipeline on rows that have already been loaded.
///
/// Arguments:
/// * `header` the header block of the survey export
/// * `rows` the data rows, in file order
/// * `config` the columns and prefix to use
///
/// Either the analysis completes and a self-contained result is returned,
/// or it fails before any record is compared.
pub fn run_analysis(
    header: HeaderBlock,
    rows: Vec<Vec<String>>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, ValidationError> {
    info!(
        "Processing {:?} rows, {:?} header rows, config: {:?}",
        rows.len(),
        header.rows.len(),
        config
    );
    config.validate(&header)?;
    let index = RecordIndex::index_rows(rows, config.id_column);
    let analysis = analyze_checked(&header, &index, config);
    info!(
        "Analysis done: {} pair(s), {} mismatch(es)",
        analysis.pairs, analysis.mismatches
    );
    Ok(analysis.builder.finish(header, config.export_mode))
}

/// Pairs every original with its double entry and compares them.
///
/// Identifiers are visited in sorted order. Records displaced by duplicate
/// identifiers are appended to the export after all the pairing output.
/// The configuration is checked against the header first.
pub fn analyze(
    header: &HeaderBlock,
    index: &RecordIndex,
    config: &AnalysisConfig,
) -> Result<Analysis, ValidationError> {
    config.validate(header)?;
    Ok(analyze_checked(header, index, config))
}

fn analyze_checked(header: &HeaderBlock, index: &RecordIndex, config: &AnalysisConfig) -> Analysis {
    let prefix = config.normalized_prefix();

    let mut builder = ExportBuilder::new();
    for notice in index.notices() {
        builder.status(notice.clone());
    }
    builder.status(StatusMessage::AnalysisStarted);

    let mut pairs: usize = 0;
    let mut mismatches: usize = 0;

    for key in index.identifiers() {
        // Present by construction.
        let record = match index.get(key) {
            Some(r) => r,
            None => continue,
        };
        match classify(key, &prefix) {
            Entry::Original { double_entry_id } => {
                let partner = double_entry_id
                    .as_deref()
                    .and_then(|de_id| index.get_id(de_id).map(|r| (de_id, r)));
                match partner {
                    Some((de_id, double_entry)) => {
                        debug!("analyze: pairing {} with {}", key, de_id);
                        let pair = compare_pair(header, config, key, record, de_id, double_entry, &mut builder);
                        pairs += 1;
                        mismatches += pair.mismatches.len();
                        builder.pair(pair);
                    }
                    None => builder.row(record.fields.clone()),
                }
            }
            Entry::DoubleEntry { original_id } => {
                // A stripped identifier that is itself prefixed is not an
                // original and would never come looking for this record.
                let paired = index.contains_id(original_id) && !original_id.starts_with(&prefix);
                if !paired {
                    // An identifier made of the prefix alone strips to nothing.
                    let original_key = ParticipantKey::from_cell(original_id);
                    warn!(
                        "There was no entry {} for double-entry {}",
                        original_key, key
                    );
                    builder.status(StatusMessage::AnalysisHeader(key.to_string()));
                    builder.status(StatusMessage::OrphanedDoubleEntry {
                        double_entry_id: key.to_string(),
                        original_id: original_key.to_string(),
                    });
                    builder.row(record.fields.clone());
                }
            }
        }
    }

    for record in index.displaced() {
        debug!("analyze: exporting displaced row {}", record.line);
        builder.row(record.fields.clone());
    }

    builder.status(StatusMessage::AnalysisComplete { pairs, mismatches });
    Analysis {
        builder,
        pairs,
        mismatches,
    }
}

// Compares the relevant columns of one pair, reports every mismatch and
// emits the export rows of the pair.
fn compare_pair(
    header: &HeaderBlock,
    config: &AnalysisConfig,
    key: &ParticipantKey,
    original: &ParticipantRecord,
    double_entry_id: &str,
    double_entry: &ParticipantRecord,
    builder: &mut ExportBuilder,
) -> PairComparison {
    let column_count = header.column_count();
    let original_id = key.to_string();
    builder.status(StatusMessage::AnalysisHeader(original_id.clone()));

    // The double entry, padded to the header width.
    let mut annotated: Vec<String> = double_entry.fields.clone();
    if annotated.len() < column_count {
        annotated.resize(column_count, String::new());
    }
    let mut comparison: Vec<String> = vec![String::new(); column_count];
    comparison[config.id_column] = format!("{}{}", COMPARISON_TAG, original.field(config.id_column));

    let mut findings: Vec<MismatchFinding> = Vec::new();
    for i in config.first_relevant_column..column_count {
        if i == config.id_column {
            continue;
        }
        let original_value = original.field(i);
        let double_entry_value = double_entry.field(i);
        if same_value(original_value, double_entry_value) {
            annotated[i] = OK_MARKER.to_string();
            comparison[i] = SAME_TAG.to_string();
        } else {
            let finding = MismatchFinding {
                original_id: original_id.clone(),
                double_entry_id: double_entry_id.to_string(),
                column: i,
                column_name: header.column_name(i).to_string(),
                original_value: original_value.to_string(),
                double_entry_value: double_entry_value.to_string(),
            };
            builder.status(StatusMessage::Mismatch(finding.clone()));
            findings.push(finding);
            annotated[i] = format!("{}{}", MISMATCH_PREFIX, original_value);
            comparison[i] = MISMATCH_TAG.to_string();
        }
    }

    builder.row(original.fields.clone());
    match config.export_mode {
        ExportMode::Annotated => builder.row(annotated),
        ExportMode::Comparison => {
            builder.row(double_entry.fields.clone());
            builder.row(comparison);
        }
        // The table is assembled from the findings.
        ExportMode::MismatchTable => builder.row(double_entry.fields.clone()),
    }

    PairComparison {
        original_id,
        double_entry_id: double_entry_id.to_string(),
        mismatches: findings,
    }
}

/// Two cells agree if they are equal once trimmed and case-folded.
pub fn same_value(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
