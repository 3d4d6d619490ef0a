use log::debug;

use crate::config::*;

/// Accumulates the status messages and export rows of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct ExportBuilder {
    messages: Vec<StatusMessage>,
    rows: Vec<Vec<String>>,
    pairs: Vec<PairComparison>,
}

impl ExportBuilder {
    pub fn new() -> ExportBuilder {
        ExportBuilder::default()
    }

    pub fn status(&mut self, message: StatusMessage) {
        debug!("status: {:?}", message);
        self.messages.push(message);
    }

    pub fn row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn pair(&mut self, pair: PairComparison) {
        self.pairs.push(pair);
    }

    pub fn finish(self, header: HeaderBlock, mode: ExportMode) -> AnalysisResult {
        AnalysisResult {
            header,
            mode,
            messages: self.messages,
            rows: self.rows,
            pairs: self.pairs,
        }
    }
}

/// The self-contained outcome of one analysis run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnalysisResult {
    header: HeaderBlock,
    mode: ExportMode,
    messages: Vec<StatusMessage>,
    rows: Vec<Vec<String>>,
    pairs: Vec<PairComparison>,
}

impl AnalysisResult {
    pub fn messages(&self) -> &[StatusMessage] {
        &self.messages
    }

    /// All the status messages as one text, one message after the other.
    pub fn render_status(&self) -> String {
        self.messages.iter().map(|m| m.render()).collect()
    }

    /// The compared pairs, in analysis order.
    pub fn pairs(&self) -> &[PairComparison] {
        &self.pairs
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &MismatchFinding> {
        self.pairs.iter().flat_map(|p| p.mismatches.iter())
    }

    pub fn mismatch_count(&self) -> usize {
        self.mismatches().count()
    }

    /// The data rows, without the header block.
    pub fn data_rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The rows to write out.
    ///
    /// For the annotated and comparison modes, this is the header block
    /// followed by the data rows. For the mismatch table, this is the
    /// table header followed by one row per mismatch.
    /// Fails if nothing was recorded.
    pub fn export_rows(&self) -> Result<Vec<Vec<String>>, ValidationError> {
        match self.mode {
            ExportMode::Annotated | ExportMode::Comparison => {
                if self.rows.is_empty() {
                    return Err(ValidationError::EmptyResult);
                }
                let mut res: Vec<Vec<String>> = self.header.rows.clone();
                res.extend(self.rows.iter().cloned());
                Ok(res)
            }
            ExportMode::MismatchTable => {
                if self.mismatch_count() == 0 {
                    return Err(ValidationError::EmptyResult);
                }
                let mut res: Vec<Vec<String>> =
                    vec![MISMATCH_TABLE_HEADER.iter().map(|s| s.to_string()).collect()];
                for m in self.mismatches() {
                    res.push(vec![
                        m.original_id.clone(),
                        m.double_entry_id.clone(),
                        m.column_name.clone(),
                        m.column.to_string(),
                        m.original_value.clone(),
                        m.double_entry_value.clone(),
                    ]);
                }
                Ok(res)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn finding() -> MismatchFinding {
        MismatchFinding {
            original_id: "1".to_string(),
            double_entry_id: "x_1".to_string(),
            column: 2,
            column_name: "score".to_string(),
            original_value: "90".to_string(),
            double_entry_value: "91".to_string(),
        }
    }

    #[test]
    fn header_rows_come_first() {
        let header = HeaderBlock::new(vec![row(&["id", "v"]), row(&["Id", "Value"])]);
        let mut b = ExportBuilder::new();
        b.row(row(&["1", "a"]));
        b.row(row(&["2", "b"]));
        let res = b.finish(header, ExportMode::Annotated);
        assert_eq!(
            res.export_rows().unwrap(),
            vec![row(&["id", "v"]), row(&["Id", "Value"]), row(&["1", "a"]), row(&["2", "b"])]
        );
    }

    #[test]
    fn nothing_recorded_is_an_error() {
        let header = HeaderBlock::new(vec![row(&["id", "v"])]);
        let res = ExportBuilder::new().finish(header.clone(), ExportMode::Annotated);
        assert_eq!(res.export_rows(), Err(ValidationError::EmptyResult));

        let mut b = ExportBuilder::new();
        b.row(row(&["1", "a"]));
        let res = b.finish(header, ExportMode::MismatchTable);
        assert_eq!(res.export_rows(), Err(ValidationError::EmptyResult));
    }

    #[test]
    fn mismatch_table_has_one_row_per_finding() {
        let mut b = ExportBuilder::new();
        b.pair(PairComparison {
            original_id: "1".to_string(),
            double_entry_id: "x_1".to_string(),
            mismatches: vec![finding()],
        });
        let res = b.finish(HeaderBlock::new(vec![row(&["id"])]), ExportMode::MismatchTable);
        let rows = res.export_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][2], "Mismatched Column Name");
        assert_eq!(rows[1], row(&["1", "x_1", "score", "2", "90", "91"]));
    }

    #[test]
    fn status_text_is_the_concatenation() {
        let mut b = ExportBuilder::new();
        b.status(StatusMessage::MissingIdentifiers);
        b.status(StatusMessage::Mismatch(finding()));
        let res = b.finish(HeaderBlock::default(), ExportMode::Annotated);
        let text = res.render_status();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with("in the double entry.\n"));
    }
}
