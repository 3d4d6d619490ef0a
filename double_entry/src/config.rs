// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The text shown for records whose identifier cell is blank.
pub const MISSING_ID_TEXT: &str = "MISSING ID";

/// Written in the annotated double entry when a compared cell agrees with the original.
pub const OK_MARKER: &str = "OK";
/// Prefix of the annotated cell when a compared cell disagrees with the original.
pub const MISMATCH_PREFIX: &str = "!= ";

pub const SAME_TAG: &str = "SAME";
pub const MISMATCH_TAG: &str = "MISMATCH";
pub const COMPARISON_TAG: &str = "COMPARISON_";

/// Column names of the compact mismatch table.
pub const MISMATCH_TABLE_HEADER: [&str; 6] = [
    "Original ID",
    "Double Entry ID",
    "Mismatched Column Name",
    "Mismatched Column Index",
    "Original Data",
    "Double Entry Data",
];

/// The rows at the top of a survey export.
///
/// The first row names the columns and fixes the number of columns that
/// take part in comparisons. The other rows (Qualtrics writes a question
/// text row and an import id row) are passed through untouched.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct HeaderBlock {
    pub rows: Vec<Vec<String>>,
}

impl HeaderBlock {
    pub fn new(rows: Vec<Vec<String>>) -> HeaderBlock {
        HeaderBlock { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The number of columns declared by the first header row.
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn column_name(&self, column: usize) -> &str {
        self.rows
            .first()
            .and_then(|r| r.get(column))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

/// The normalized identifier of a record.
///
/// A blank identifier cell becomes `Missing`, which can never be confused
/// with a real identifier. Ordering puts `Missing` first.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub enum ParticipantKey {
    Missing,
    Id(String),
}

impl ParticipantKey {
    /// Trims and lower-cases a raw identifier cell.
    pub fn from_cell(cell: &str) -> ParticipantKey {
        let id = cell.trim().to_lowercase();
        if id.is_empty() {
            ParticipantKey::Missing
        } else {
            ParticipantKey::Id(id)
        }
    }
}

impl Display for ParticipantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticipantKey::Missing => write!(f, "{}", MISSING_ID_TEXT),
            ParticipantKey::Id(s) => write!(f, "{}", s),
        }
    }
}

/// One data row of the survey, with its normalized identifier.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParticipantRecord {
    pub key: ParticipantKey,
    /// The fields as read, without any normalization.
    pub fields: Vec<String>,
    /// 1-based position among the data rows.
    pub line: usize,
}

impl ParticipantRecord {
    /// The field at `column`, or an empty string past the end of the row.
    pub fn field(&self, column: usize) -> &str {
        self.fields.get(column).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ******** Output data structures *********

/// A column where an original and its double entry disagree.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MismatchFinding {
    pub original_id: String,
    pub double_entry_id: String,
    pub column: usize,
    pub column_name: String,
    pub original_value: String,
    pub double_entry_value: String,
}

/// The outcome of comparing one original with its double entry.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairComparison {
    pub original_id: String,
    pub double_entry_id: String,
    pub mismatches: Vec<MismatchFinding>,
}

/// Everything the engine has to say to the person running it.
///
/// None of these stop an analysis.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum StatusMessage {
    DuplicateIdentifiers,
    MissingIdentifiers,
    /// A real identifier that reads like the missing-identifier marker.
    ReservedIdentifier(String),
    AnalysisStarted,
    /// Opens the block of messages about one identifier.
    AnalysisHeader(String),
    Mismatch(MismatchFinding),
    OrphanedDoubleEntry {
        double_entry_id: String,
        original_id: String,
    },
    AnalysisComplete {
        pairs: usize,
        mismatches: usize,
    },
}

const BOX_WIDTH: usize = 50;
const BANNER: &str = "------------------------------";

impl StatusMessage {
    /// The message as display text. Every line ends with a newline.
    pub fn render(&self) -> String {
        match self {
            StatusMessage::DuplicateIdentifiers => {
                "NOTICE: Duplicate IDs detected. The last record with a given ID is used for pairing; earlier ones are exported at the end.\n".to_string()
            }
            StatusMessage::MissingIdentifiers => {
                "NOTICE: Some records have missing IDs. They are exported but never paired.\n"
                    .to_string()
            }
            StatusMessage::ReservedIdentifier(id) => format!(
                "NOTICE: ID \"{}\" looks like the missing-ID marker; it is treated as a real ID.\n",
                id
            ),
            StatusMessage::AnalysisStarted => format!("{}\nStarting Analysis.\n{}\n", BANNER, BANNER),
            StatusMessage::AnalysisHeader(id) => analysis_header(id),
            StatusMessage::Mismatch(m) => format!(
                "[Mismatch] {} originally was \"{}\" but was \"{}\" in the double entry.\n",
                m.column_name,
                m.original_value.trim(),
                m.double_entry_value.trim()
            ),
            StatusMessage::OrphanedDoubleEntry {
                double_entry_id,
                original_id,
            } => format!(
                "[Warning] There was no entry {} for double-entry {}\n",
                original_id, double_entry_id
            ),
            StatusMessage::AnalysisComplete { pairs, mismatches } => format!(
                "{}\nAnalysis Complete. {} pair(s) compared, {} mismatch(es) found.\n{}\n",
                BANNER, pairs, mismatches, BANNER
            ),
        }
    }
}

impl Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

// The identifier is centered in a box of BOX_WIDTH columns. Longer
// identifiers widen the box instead of being cut.
fn analysis_header(id: &str) -> String {
    let inner = (BOX_WIDTH - 2).max(id.chars().count() + 2);
    let left = (inner - id.chars().count()) / 2;
    let right = inner - id.chars().count() - left;
    let rule = format!("+{}+\n", "-".repeat(inner));
    let blank = format!("|{}|\n", " ".repeat(inner));
    format!(
        "{rule}{blank}|{}{}{}|\n{blank}{rule}",
        " ".repeat(left),
        id,
        " ".repeat(right)
    )
}

/// Errors that prevent an analysis from producing a result.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ValidationError {
    /// The file has no header row at all.
    MissingHeader,
    InvalidIdColumn {
        column: usize,
        column_count: usize,
    },
    InvalidFirstRelevantColumn {
        column: usize,
        column_count: usize,
    },
    EmptyPrefix,
    /// Nothing was recorded: there is nothing to save.
    EmptyResult,
}

impl Error for ValidationError {}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingHeader => write!(f, "The file does not contain a header row"),
            ValidationError::InvalidIdColumn {
                column,
                column_count,
            } => write!(
                f,
                "The specified ID column {} is invalid: the header has {} column(s)",
                column, column_count
            ),
            ValidationError::InvalidFirstRelevantColumn {
                column,
                column_count,
            } => write!(
                f,
                "The first relevant column {} is invalid: the header has {} column(s)",
                column, column_count
            ),
            ValidationError::EmptyPrefix => write!(f, "The double-entry ID prefix may not be blank"),
            ValidationError::EmptyResult => write!(
                f,
                "Saved empty data: nothing was recorded. Run the analysis again before saving"
            ),
        }
    }
}

// ********* Configuration **********

/// The shape of the exported rows.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum ExportMode {
    /// Every record. Each double entry follows its original, with compared
    /// cells replaced by `OK` or by a marker quoting the original value.
    #[default]
    Annotated,
    /// Every record. Each pair is followed by a row tagging every compared
    /// column as `SAME` or `MISMATCH`.
    Comparison,
    /// One row per mismatched column, without the header block.
    MismatchTable,
}

/// The settings of one analysis run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnalysisConfig {
    /// Zero-based column holding the participant identifier.
    pub id_column: usize,
    /// Zero-based column where comparisons start.
    pub first_relevant_column: usize,
    /// Case-insensitive prefix marking double entries.
    pub id_prefix: String,
    pub export_mode: ExportMode,
}

impl AnalysisConfig {
    pub fn new(id_column: usize, first_relevant_column: usize, id_prefix: &str) -> AnalysisConfig {
        AnalysisConfig {
            id_column,
            first_relevant_column,
            id_prefix: id_prefix.to_string(),
            export_mode: ExportMode::Annotated,
        }
    }

    pub fn with_export_mode(self, export_mode: ExportMode) -> AnalysisConfig {
        AnalysisConfig {
            export_mode,
            ..self
        }
    }

    /// The prefix as it is matched against normalized identifiers.
    pub fn normalized_prefix(&self) -> String {
        self.id_prefix.trim().to_lowercase()
    }

    /// Checks the configuration against the header before any record is touched.
    pub fn validate(&self, header: &HeaderBlock) -> Result<(), ValidationError> {
        if header.is_empty() {
            return Err(ValidationError::MissingHeader);
        }
        let column_count = header.column_count();
        if self.id_column >= column_count {
            return Err(ValidationError::InvalidIdColumn {
                column: self.id_column,
                column_count,
            });
        }
        if self.first_relevant_column >= column_count {
            return Err(ValidationError::InvalidFirstRelevantColumn {
                column: self.first_relevant_column,
                column_count,
            });
        }
        if self.normalized_prefix().is_empty() {
            return Err(ValidationError::EmptyPrefix);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> HeaderBlock {
        HeaderBlock::new(vec![names.iter().map(|s| s.to_string()).collect()])
    }

    #[test]
    fn participant_key_normalizes() {
        assert_eq!(
            ParticipantKey::from_cell("  P01 "),
            ParticipantKey::Id("p01".to_string())
        );
        assert_eq!(ParticipantKey::from_cell(" \t"), ParticipantKey::Missing);
        assert_eq!(ParticipantKey::Missing.to_string(), "MISSING ID");
        assert!(ParticipantKey::Missing < ParticipantKey::Id("".to_string()));
    }

    #[test]
    fn record_field_past_the_end_is_empty() {
        let r = ParticipantRecord {
            key: ParticipantKey::Id("1".to_string()),
            fields: vec!["1".to_string(), "a".to_string()],
            line: 1,
        };
        assert_eq!(r.field(1), "a");
        assert_eq!(r.field(7), "");
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn validate_rejects_columns_outside_the_header() {
        let h = header(&["id", "name", "score"]);
        assert_eq!(AnalysisConfig::new(0, 1, "X_").validate(&h), Ok(()));
        assert_eq!(
            AnalysisConfig::new(3, 1, "X_").validate(&h),
            Err(ValidationError::InvalidIdColumn {
                column: 3,
                column_count: 3
            })
        );
        assert_eq!(
            AnalysisConfig::new(0, 5, "X_").validate(&h),
            Err(ValidationError::InvalidFirstRelevantColumn {
                column: 5,
                column_count: 3
            })
        );
        assert_eq!(
            AnalysisConfig::new(0, 1, "  ").validate(&h),
            Err(ValidationError::EmptyPrefix)
        );
        assert_eq!(
            AnalysisConfig::new(0, 1, "X_").validate(&HeaderBlock::default()),
            Err(ValidationError::MissingHeader)
        );
    }

    #[test]
    fn analysis_header_is_boxed_and_centered() {
        let text = StatusMessage::AnalysisHeader("p01".to_string()).render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|l| l.chars().count() == BOX_WIDTH));
        assert!(lines[2].contains(" p01 "));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn mismatch_message_format() {
        let m = MismatchFinding {
            original_id: "1".to_string(),
            double_entry_id: "x_1".to_string(),
            column: 2,
            column_name: "score".to_string(),
            original_value: "90 ".to_string(),
            double_entry_value: "91".to_string(),
        };
        assert_eq!(
            StatusMessage::Mismatch(m).render(),
            "[Mismatch] score originally was \"90\" but was \"91\" in the double entry.\n"
        );
    }
}
