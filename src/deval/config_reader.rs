use crate::deval::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::fs;

/// The default number of header rows, as written by Qualtrics.
pub const QUALTRICS_HEADER_ROWS: usize = 3;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeConfig {
    #[serde(rename = "inputFile")]
    pub input_file: Option<String>,
    #[serde(rename = "encoding")]
    pub encoding: Option<String>,
    #[serde(rename = "headerRowCount")]
    pub header_row_count: Option<usize>,
    #[serde(rename = "participantIdColumn")]
    pub participant_id_column: Option<JSValue>,
    #[serde(rename = "firstRelevantColumn")]
    pub first_relevant_column: Option<JSValue>,
    #[serde(rename = "doubleEntryIdPrefix")]
    pub double_entry_id_prefix: Option<String>,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
    #[serde(rename = "exportMode")]
    pub export_mode: Option<String>,
}

impl DeConfig {
    /// Every value set in `other` replaces the one in `self`.
    pub fn overridden_by(self, other: DeConfig) -> DeConfig {
        DeConfig {
            input_file: other.input_file.or(self.input_file),
            encoding: other.encoding.or(self.encoding),
            header_row_count: other.header_row_count.or(self.header_row_count),
            participant_id_column: other.participant_id_column.or(self.participant_id_column),
            first_relevant_column: other.first_relevant_column.or(self.first_relevant_column),
            double_entry_id_prefix: other.double_entry_id_prefix.or(self.double_entry_id_prefix),
            output_file: other.output_file.or(self.output_file),
            export_mode: other.export_mode.or(self.export_mode),
        }
    }

    /// Checks that all the required inputs are present and decodes them.
    pub fn settings(&self) -> DevResult<RunSettings> {
        let input = non_blank(&self.input_file);
        let prefix = non_blank(&self.double_entry_id_prefix);

        let mut missing: Vec<&str> = Vec::new();
        if input.is_none() {
            missing.push("input file");
        }
        if self.participant_id_column.is_none() {
            missing.push("participant ID column");
        }
        if self.first_relevant_column.is_none() {
            missing.push("first relevant column");
        }
        if prefix.is_none() {
            missing.push("double-entry ID prefix");
        }
        ensure!(
            missing.is_empty(),
            MissingInputSnafu {
                names: missing.join(", ")
            }
        );

        let id_column = read_column(&self.participant_id_column)?;
        let first_relevant_column = read_column(&self.first_relevant_column)?;
        let export_mode = match &self.export_mode {
            Some(s) => parse_export_mode(s)?,
            None => ExportMode::Annotated,
        };
        let encoding = match &self.encoding {
            Some(s) => InputEncoding::parse(s)?,
            None => InputEncoding::Auto,
        };
        let output = non_blank(&self.output_file).map(|s| {
            if s == "stdout" {
                OutputTarget::Stdout
            } else {
                OutputTarget::File(PathBuf::from(s))
            }
        });

        Ok(RunSettings {
            input: PathBuf::from(input.unwrap_or_default()),
            encoding,
            header_rows: self.header_row_count.unwrap_or(QUALTRICS_HEADER_ROWS),
            analysis: AnalysisConfig::new(id_column, first_relevant_column, &prefix.unwrap_or_default())
                .with_export_mode(export_mode),
            output,
        })
    }
}

fn non_blank(x: &Option<String>) -> Option<String> {
    x.as_ref().filter(|s| !s.trim().is_empty()).cloned()
}

/// Reads a configuration file. Relative file paths in it are resolved
/// against the directory of the configuration file.
pub fn read_config(path: &Path) -> DevResult<DeConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.display().to_string(),
    })?;
    let config: DeConfig = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    info!("config: {:?}", config);

    let root = path.parent().context(MissingParentDirSnafu {})?;
    let resolve = |p: Option<String>| -> Option<String> {
        p.map(|s| {
            if s == "stdout" || Path::new(&s).is_absolute() {
                s
            } else {
                root.join(&s).display().to_string()
            }
        })
    };
    Ok(DeConfig {
        input_file: resolve(config.input_file),
        output_file: resolve(config.output_file),
        ..config
    })
}

pub fn parse_export_mode(s: &str) -> DevResult<ExportMode> {
    match s.trim().to_lowercase().as_str() {
        "annotated" => Ok(ExportMode::Annotated),
        "comparison" => Ok(ExportMode::Comparison),
        "mismatch-table" | "mismatchtable" | "mismatch_table" => Ok(ExportMode::MismatchTable),
        _ => UnknownOptionSnafu {
            name: "export mode",
            value: s,
        }
        .fail(),
    }
}

/// Decodes a column given as letters.
///
/// Each letter adds its alphabet position plus 26 times its position in
/// the text: `A` is 0, `Z` is 25, `AA` is 26, `AB` and `BA` are both 27.
/// This is not the spreadsheet numbering past `Z`, but it is the one the
/// existing configurations were written for.
pub fn decipher_column(text: &str) -> DevResult<usize> {
    let s = text.trim().to_lowercase();
    ensure!(!s.is_empty(), InvalidColumnSnafu { input: text });
    let mut column: usize = 0;
    for (i, c) in s.chars().enumerate() {
        ensure!(c.is_ascii_lowercase(), InvalidColumnSnafu { input: text });
        column += (c as usize - 'a' as usize) + i * 26;
    }
    Ok(column)
}

/// Reads a zero-based column from a JSON number, a string of digits, or column letters.
pub fn read_column(x: &Option<JSValue>) -> DevResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize).context(InvalidColumnSnafu {
            input: n.to_string(),
        }),
        Some(JSValue::String(s)) if !s.trim().is_empty() && s.trim().chars().all(|c| c.is_ascii_digit()) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(InvalidColumnSnafu { input: s.clone() }),
        Some(JSValue::String(s)) => decipher_column(s),
        Some(other) => InvalidColumnSnafu {
            input: other.to_string(),
        }
        .fail(),
        None => InvalidColumnSnafu { input: "" }.fail(),
    }
}
