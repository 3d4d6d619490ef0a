// Reading survey exports and writing checked data as delimited text.

use std::io::Write;

use csv::{QuoteStyle, Terminator};
use tempfile::NamedTempFile;

use crate::deval::{
    io_common::{delimiter_for_path, read_text, simplify_file_name, InputEncoding},
    *,
};

/// Loads a survey export and splits it into the header block and the data rows.
///
/// The delimiter is checked before the file is opened.
pub fn read_survey(
    path: &Path,
    header_rows: usize,
    encoding: InputEncoding,
) -> DevResult<(HeaderBlock, Vec<Vec<String>>)> {
    let delimiter = delimiter_for_path(path)?;
    let content = read_text(path, encoding)?;
    parse_survey(&content, delimiter, header_rows, path)
}

/// Parses decoded text. A malformed record aborts the whole load.
pub fn parse_survey(
    content: &str,
    delimiter: u8,
    header_rows: usize,
    path: &Path,
) -> DevResult<(HeaderBlock, Vec<Vec<String>>)> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut header: Vec<Vec<String>> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu {
            path: path.display().to_string(),
            lineno,
        })?;
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        if idx < header_rows {
            header.push(cells);
        } else {
            rows.push(cells);
        }
    }
    info!(
        "parse_survey: {}: {} header rows, {} records",
        simplify_file_name(path),
        header.len(),
        rows.len()
    );
    Ok((HeaderBlock::new(header), rows))
}

fn export_writer<W: std::io::Write>(delimiter: u8, w: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(w)
}

/// Serializes rows with the given delimiter. `label` names the destination in errors.
pub fn export_to_string(rows: &[Vec<String>], delimiter: u8, label: &str) -> DevResult<String> {
    let mut wtr = export_writer(delimiter, Vec::new());
    for row in rows {
        wtr.write_record(row).context(CsvWriteSnafu { path: label })?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| e.into_error())
        .context(WritingFileSnafu { path: label })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes rows to a file, with the delimiter of its extension.
///
/// The rows go to a temporary file next to the destination first, so an
/// existing file is either fully replaced or left untouched.
pub fn write_export(path: &Path, rows: &[Vec<String>]) -> DevResult<()> {
    let label = path.display().to_string();
    let delimiter = delimiter_for_path(path)?;
    let text = export_to_string(rows, delimiter, &label)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).context(WritingFileSnafu {
        path: label.clone(),
    })?;
    tmp.write_all(text.as_bytes()).context(WritingFileSnafu {
        path: label.clone(),
    })?;
    tmp.persist(path).context(PersistFileSnafu { path: label })?;
    debug!("write_export: {} rows to {:?}", rows.len(), path.display());
    Ok(())
}
