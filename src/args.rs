use clap::Parser;

/// This is a double-entry validation program for survey exports.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the input file, the columns and the prefix.
    /// Paths in this file are relative to its directory. The other options override its values.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The survey export to check. Only .csv and .tsv files are supported.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (column letters like AA, or a zero-based number) The column holding the participant ID.
    #[clap(long, value_parser)]
    pub id_column: Option<String>,

    /// (column letters like F, or a zero-based number) The first column to compare. Earlier
    /// columns are ignored.
    #[clap(long, value_parser)]
    pub first_column: Option<String>,

    /// (text, e.g. X_) The prefix that marks the ID of a double entry. Not case sensitive.
    #[clap(long, value_parser)]
    pub prefix: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the checked data will be written to this location.
    /// The delimiter follows the extension (.csv or .tsv). 'stdout' uses the delimiter of the input.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (default 3) The number of header rows at the top of the input.
    #[clap(long, value_parser)]
    pub header_rows: Option<usize>,

    /// (default annotated) The shape of the output: annotated, comparison or mismatch-table.
    #[clap(long, value_parser)]
    pub mode: Option<String>,

    /// (default auto) The encoding of the input: auto, utf-8, utf-16 (little endian), utf-16le or utf-16be.
    #[clap(long, value_parser)]
    pub encoding: Option<String>,

    /// (file path) A reference file with the expected output. If provided, devalid will
    /// check that the output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
