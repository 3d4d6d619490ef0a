use log::{debug, info, warn};

use double_entry::*;
use snafu::{prelude::*, Snafu};

use std::path::{Path, PathBuf};

use text_diff::print_diff;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;

use crate::deval::config_reader::*;
use crate::deval::io_common::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DevError {
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(
        "The file {path} is of an unsupported type (expected a .tsv or .csv extension)"
    ))]
    UnsupportedFormat { path: String },
    #[snafu(display("The file {path} is not valid {encoding} text"))]
    Decoding { path: String, encoding: String },
    #[snafu(display("Error parsing record {lineno} of {path}: {source}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening configuration file {path}: {source}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Invalid column input {input:?}"))]
    InvalidColumn { input: String },
    #[snafu(display("Unknown value {value:?} for option {name}"))]
    UnknownOption { name: String, value: String },
    #[snafu(display("One or more of the required inputs were blank: {names}"))]
    MissingInput { names: String },
    #[snafu(display("{source}"))]
    Validation { source: ValidationError },
    #[snafu(display("Error writing file {path}: {source}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing record to {path}: {source}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error saving file {path}: {source}"))]
    PersistFile {
        source: tempfile::PersistError,
        path: String,
    },
    #[snafu(display("Difference detected between the output and the reference {path}"))]
    ReferenceMismatch { path: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
}

pub type DevResult<T> = Result<T, DevError>;

/// Where the checked data goes.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// The resolved settings of one run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RunSettings {
    pub input: PathBuf,
    pub encoding: InputEncoding,
    pub header_rows: usize,
    pub analysis: AnalysisConfig,
    pub output: Option<OutputTarget>,
}

/// Loads the survey export and runs the analysis on it.
pub fn analyze_file(settings: &RunSettings) -> DevResult<AnalysisResult> {
    info!(
        "Attempting to read survey file {:?}",
        settings.input.display()
    );
    let (header, rows) =
        io_csv::read_survey(&settings.input, settings.header_rows, settings.encoding)?;
    debug!(
        "analyze_file: {} header rows, {} data rows",
        header.rows.len(),
        rows.len()
    );
    run_analysis(header, rows, &settings.analysis).context(ValidationSnafu {})
}

/// Writes the export of a finished analysis.
///
/// Nothing is written when the analysis recorded nothing.
pub fn save_result(
    result: &AnalysisResult,
    target: &OutputTarget,
    input_path: &Path,
) -> DevResult<Vec<Vec<String>>> {
    let rows = result.export_rows().context(ValidationSnafu {})?;
    match target {
        OutputTarget::Stdout => {
            print!("{}", stdout_text(&rows, input_path)?);
        }
        OutputTarget::File(p) => {
            info!("Writing {} rows to {:?}", rows.len(), p.display());
            io_csv::write_export(p, &rows)?;
        }
    }
    Ok(rows)
}

/// The export as printed to the standard output, with the delimiter of the input.
pub fn stdout_text(rows: &[Vec<String>], input_path: &Path) -> DevResult<String> {
    let delimiter = delimiter_for_path(input_path)?;
    io_csv::export_to_string(rows, delimiter, "stdout")
}

/// Compares exported rows with a reference file, serialized with the
/// delimiter of the reference.
pub fn check_reference(rows: &[Vec<String>], reference: &Path) -> DevResult<()> {
    let path = reference.display().to_string();
    let delimiter = delimiter_for_path(reference)?;
    let produced = io_csv::export_to_string(rows, delimiter, &path)?;
    let expected = read_text(reference, InputEncoding::Auto)?.replace("\r\n", "\n");
    if expected != produced {
        warn!("Found differences with the reference file {}", path);
        print_diff(expected.as_str(), produced.as_str(), "\n");
        return ReferenceMismatchSnafu { path }.fail();
    }
    info!("Output matches the reference file {}", path);
    Ok(())
}

/// One complete run: analysis, status report, export and reference check.
pub fn run_validation(settings: &RunSettings, reference: Option<&Path>) -> DevResult<AnalysisResult> {
    println!("Selected file {}", simplify_file_name(&settings.input));
    let result = analyze_file(settings)?;
    print!("{}", result.render_status());

    if let Some(target) = &settings.output {
        let rows = save_result(&result, target, &settings.input)?;
        if let Some(r) = reference {
            check_reference(&rows, r)?;
        }
    } else if let Some(r) = reference {
        let rows = result.export_rows().context(ValidationSnafu {})?;
        check_reference(&rows, r)?;
    }
    Ok(result)
}

/// Reads an optional configuration file and applies the command line on top of it.
pub fn resolve_settings(config_path: Option<&str>, overrides: DeConfig) -> DevResult<RunSettings> {
    let base = match config_path {
        Some(p) => read_config(Path::new(p))?,
        None => DeConfig::default(),
    };
    let config = base.overridden_by(overrides);
    debug!("resolve_settings: {:?}", config);
    config.settings()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    const SURVEY: &str = "id,name,score\n\
                          ID,Name,Score\n\
                          {\"ImportId\":\"q0\"},{\"ImportId\":\"q1\"},{\"ImportId\":\"q2\"}\n\
                          1,Alice,90\n\
                          X_1,alice,91\n\
                          2,Bob,70\n";

    #[test]
    fn config_file_end_to_end() {
        init();
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("survey.csv"), SURVEY).unwrap();
        let config = r#"{
            "inputFile": "survey.csv",
            "participantIdColumn": "A",
            "firstRelevantColumn": "B",
            "doubleEntryIdPrefix": "X_",
            "outputFile": "checked.tsv"
        }"#;
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, config).unwrap();

        let settings =
            resolve_settings(Some(config_path.to_str().unwrap()), DeConfig::default()).unwrap();
        assert_eq!(settings.input, dir.path().join("survey.csv"));
        assert_eq!(settings.header_rows, 3);
        let result = run_validation(&settings, None).unwrap();
        assert_eq!(result.mismatch_count(), 1);

        let written = fs::read_to_string(dir.path().join("checked.tsv")).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "id\tname\tscore");
        assert_eq!(lines[3], "1\tAlice\t90");
        assert_eq!(lines[4], "X_1\tOK\t!= 90");
        assert_eq!(lines[5], "2\tBob\t70");
    }

    #[test]
    fn reference_check_detects_differences() {
        init();
        let dir = tempdir().unwrap();
        let input = dir.path().join("survey.csv");
        fs::write(&input, SURVEY).unwrap();
        let reference = dir.path().join("expected.csv");
        fs::write(
            &reference,
            "id,name,score\r\nID,Name,Score\r\n\"{\"\"ImportId\"\":\"\"q0\"\"}\",\"{\"\"ImportId\"\":\"\"q1\"\"}\",\"{\"\"ImportId\"\":\"\"q2\"\"}\"\r\n1,Alice,90\r\nX_1,OK,!= 90\r\n2,Bob,70\r\n",
        )
        .unwrap();

        let overrides = DeConfig {
            input_file: Some(input.display().to_string()),
            participant_id_column: Some(serde_json::json!(0)),
            first_relevant_column: Some(serde_json::json!("b")),
            double_entry_id_prefix: Some("x_".to_string()),
            ..DeConfig::default()
        };
        let settings = resolve_settings(None, overrides.clone()).unwrap();
        assert!(run_validation(&settings, Some(&reference)).is_ok());

        fs::write(&reference, "id,name,score\n").unwrap();
        let settings = resolve_settings(None, overrides).unwrap();
        let err = run_validation(&settings, Some(&reference)).unwrap_err();
        assert!(matches!(err, DevError::ReferenceMismatch { .. }));
    }

    #[test]
    fn invalid_id_column_is_reported() {
        init();
        let dir = tempdir().unwrap();
        let input = dir.path().join("survey.csv");
        fs::write(&input, SURVEY).unwrap();
        let overrides = DeConfig {
            input_file: Some(input.display().to_string()),
            participant_id_column: Some(serde_json::json!("Z")),
            first_relevant_column: Some(serde_json::json!("B")),
            double_entry_id_prefix: Some("X_".to_string()),
            output_file: Some(dir.path().join("out.csv").display().to_string()),
            ..DeConfig::default()
        };
        let settings = resolve_settings(None, overrides).unwrap();
        let err = run_validation(&settings, None).unwrap_err();
        assert!(matches!(
            err,
            DevError::Validation {
                source: ValidationError::InvalidIdColumn { column: 25, .. }
            }
        ));
        assert!(!dir.path().join("out.csv").exists());
    }

    #[test]
    fn empty_result_is_not_saved() {
        init();
        let dir = tempdir().unwrap();
        let input = dir.path().join("survey.tsv");
        fs::write(&input, "id\tq\n").unwrap();
        let out = dir.path().join("out.csv");
        let overrides = DeConfig {
            input_file: Some(input.display().to_string()),
            header_row_count: Some(1),
            participant_id_column: Some(serde_json::json!(0)),
            first_relevant_column: Some(serde_json::json!(1)),
            double_entry_id_prefix: Some("X_".to_string()),
            output_file: Some(out.display().to_string()),
            ..DeConfig::default()
        };
        let settings = resolve_settings(None, overrides).unwrap();
        let err = run_validation(&settings, None).unwrap_err();
        assert!(matches!(
            err,
            DevError::Validation {
                source: ValidationError::EmptyResult
            }
        ));
        assert!(!out.exists());
    }

    #[test]
    fn stdout_uses_the_input_delimiter() {
        init();
        let rows = vec![
            vec!["id".to_string(), "note".to_string()],
            vec!["X_1".to_string(), "!= a,b".to_string()],
        ];
        assert_eq!(
            stdout_text(&rows, Path::new("survey.tsv")).unwrap(),
            "id\tnote\nX_1\t!= a,b\n"
        );
        assert_eq!(
            stdout_text(&rows, Path::new("survey.csv")).unwrap(),
            "id,note\nX_1,\"!= a,b\"\n"
        );
        assert!(matches!(
            stdout_text(&rows, Path::new("survey.txt")),
            Err(DevError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn stdout_target_writes_no_file() {
        init();
        let dir = tempdir().unwrap();
        let input = dir.path().join("survey.tsv");
        fs::write(&input, SURVEY.replace(',', "\t")).unwrap();
        let overrides = DeConfig {
            input_file: Some(input.display().to_string()),
            participant_id_column: Some(serde_json::json!(0)),
            first_relevant_column: Some(serde_json::json!(1)),
            double_entry_id_prefix: Some("X_".to_string()),
            output_file: Some("stdout".to_string()),
            ..DeConfig::default()
        };
        let settings = resolve_settings(None, overrides).unwrap();
        assert_eq!(settings.output, Some(OutputTarget::Stdout));
        let result = run_validation(&settings, None).unwrap();
        let rows = save_result(&result, &OutputTarget::Stdout, &settings.input).unwrap();
        assert_eq!(rows[4], vec!["X_1", "OK", "!= 90"]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn unsupported_extension_fails_before_reading() {
        init();
        let settings = RunSettings {
            input: PathBuf::from("does-not-exist.xlsx"),
            encoding: InputEncoding::Auto,
            header_rows: 3,
            analysis: AnalysisConfig::new(0, 1, "X_"),
            output: None,
        };
        let err = analyze_file(&settings).unwrap_err();
        assert!(matches!(err, DevError::UnsupportedFormat { .. }));
    }
}
