use crate::deval::*;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::fs;

/// The text encoding of a survey export.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputEncoding {
    /// Follows the byte-order mark, or UTF-8 without one.
    Auto,
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl InputEncoding {
    pub fn parse(s: &str) -> DevResult<InputEncoding> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(InputEncoding::Auto),
            "utf-8" | "utf8" => Ok(InputEncoding::Utf8),
            // Qualtrics writes little endian.
            "utf-16" | "utf16" | "utf-16le" | "utf16le" => Ok(InputEncoding::Utf16Le),
            "utf-16be" | "utf16be" => Ok(InputEncoding::Utf16Be),
            _ => UnknownOptionSnafu {
                name: "encoding",
                value: s,
            }
            .fail(),
        }
    }

    fn fallback(&self) -> &'static Encoding {
        match self {
            InputEncoding::Auto | InputEncoding::Utf8 => UTF_8,
            InputEncoding::Utf16Le => UTF_16LE,
            InputEncoding::Utf16Be => UTF_16BE,
        }
    }
}

/// The field delimiter, decided by the extension of the file.
pub fn delimiter_for_path(path: &Path) -> DevResult<u8> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("tsv") => Ok(b'\t'),
        Some("csv") => Ok(b','),
        _ => UnsupportedFormatSnafu {
            path: path.display().to_string(),
        }
        .fail(),
    }
}

/// Reads a whole file as text.
///
/// A byte-order mark takes precedence over the requested encoding and is
/// not part of the returned text. Invalid sequences are an error.
pub fn read_text(path: &Path, encoding: InputEncoding) -> DevResult<String> {
    let bytes = fs::read(path).context(OpeningFileSnafu {
        path: path.display().to_string(),
    })?;
    let (enc, bom_length) = match Encoding::for_bom(&bytes) {
        Some((enc, len)) => (enc, len),
        None => (encoding.fallback(), 0),
    };
    debug!(
        "read_text: {:?} as {} ({} bytes, bom: {})",
        path.display(),
        enc.name(),
        bytes.len(),
        bom_length
    );
    let text = enc
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_length..])
        .context(DecodingSnafu {
            path: path.display().to_string(),
            encoding: enc.name(),
        })?;
    Ok(text.into_owned())
}

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
