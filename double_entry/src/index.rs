use log::{debug, warn};

use std::collections::{BTreeMap, HashSet};

use crate::config::*;

/// The records of one survey, keyed by normalized participant identifier.
///
/// When two rows share an identifier, the later one takes the slot and the
/// earlier one is kept in `displaced` so that it still reaches the export.
#[derive(Debug, Clone)]
pub struct RecordIndex {
    records: BTreeMap<ParticipantKey, ParticipantRecord>,
    displaced: Vec<ParticipantRecord>,
    notices: Vec<StatusMessage>,
}

impl RecordIndex {
    /// Indexes the data rows by the identifier found in `id_column`.
    ///
    /// Fails before reading any row if the header does not declare
    /// `id_column`. Rows too short to hold the identifier get the missing
    /// identifier. `run_analysis` checks the whole configuration once and
    /// goes through `index_rows` directly.
    pub fn build(
        header: &HeaderBlock,
        rows: Vec<Vec<String>>,
        id_column: usize,
    ) -> Result<RecordIndex, ValidationError> {
        if header.is_empty() {
            return Err(ValidationError::MissingHeader);
        }
        let column_count = header.column_count();
        if id_column >= column_count {
            return Err(ValidationError::InvalidIdColumn {
                column: id_column,
                column_count,
            });
        }
        Ok(RecordIndex::index_rows(rows, id_column))
    }

    // The caller has checked that the header declares `id_column`.
    pub(crate) fn index_rows(rows: Vec<Vec<String>>, id_column: usize) -> RecordIndex {
        let mut records: BTreeMap<ParticipantKey, ParticipantRecord> = BTreeMap::new();
        let mut displaced: Vec<ParticipantRecord> = Vec::new();
        let mut notices: Vec<StatusMessage> = Vec::new();
        let mut seen_duplicate = false;
        let mut seen_missing = false;
        let mut reserved: HashSet<String> = HashSet::new();

        for (idx, fields) in rows.into_iter().enumerate() {
            let line = idx + 1;
            let key = ParticipantKey::from_cell(fields.get(id_column).map(|s| s.as_str()).unwrap_or(""));
            match &key {
                ParticipantKey::Missing => {
                    if !seen_missing {
                        warn!("RecordIndex::build: row {} has a blank identifier", line);
                        seen_missing = true;
                    }
                }
                ParticipantKey::Id(id) => {
                    if id == &MISSING_ID_TEXT.to_lowercase() && reserved.insert(id.clone()) {
                        warn!("RecordIndex::build: identifier {:?} reads like the missing marker", id);
                        notices.push(StatusMessage::ReservedIdentifier(id.clone()));
                    }
                }
            }

            let record = ParticipantRecord { key, fields, line };
            if let Some(previous) = records.insert(record.key.clone(), record) {
                debug!(
                    "RecordIndex::build: row {} displaced by a later row with identifier {}",
                    previous.line, previous.key
                );
                if previous.key != ParticipantKey::Missing && !seen_duplicate {
                    warn!("RecordIndex::build: duplicate identifier {}", previous.key);
                    notices.push(StatusMessage::DuplicateIdentifiers);
                    seen_duplicate = true;
                }
                displaced.push(previous);
            }
        }

        if seen_missing {
            notices.push(StatusMessage::MissingIdentifiers);
        }

        debug!(
            "RecordIndex::build: {} identifiers, {} displaced records",
            records.len(),
            displaced.len()
        );
        RecordIndex {
            records,
            displaced,
            notices,
        }
    }

    /// All distinct identifiers, in sorted order.
    pub fn identifiers(&self) -> impl Iterator<Item = &ParticipantKey> {
        self.records.keys()
    }

    pub fn get(&self, key: &ParticipantKey) -> Option<&ParticipantRecord> {
        self.records.get(key)
    }

    /// Looks up a normalized (trimmed, lower-case) identifier.
    pub fn get_id(&self, id: &str) -> Option<&ParticipantRecord> {
        self.records.get(&ParticipantKey::Id(id.to_string()))
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.get_id(id).is_some()
    }

    /// The records that lost their slot to a later duplicate, in the order
    /// the displacements happened.
    pub fn displaced(&self) -> &[ParticipantRecord] {
        &self.displaced
    }

    /// Data-quality notices raised while indexing.
    pub fn notices(&self) -> &[StatusMessage] {
        &self.notices
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
