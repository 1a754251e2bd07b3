use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// A single named nucleotide sequence.
///
/// Symbols are stored as uppercase ASCII bytes exactly as they appeared in the
/// input; no alphabet validation is performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceRecord {
    /// Identifier taken from the `>` header line
    pub id: String,

    /// Sequence symbols
    #[serde(serialize_with = "serialize_symbols")]
    pub sequence: Vec<u8>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Sequence as text (lossy for non-UTF-8 bytes)
    #[must_use]
    pub fn sequence_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.sequence)
    }
}

pub(crate) fn serialize_symbols<S: Serializer>(symbols: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(symbols))
}

/// An ordered collection of records keyed by identifier.
///
/// Records keep the position at which their identifier was first inserted.
/// Inserting an identifier that is already present replaces the stored
/// sequence in place.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<SequenceRecord>,

    /// Index: identifier -> position in `records`
    id_to_index: HashMap<String, usize>,
}

impl RecordSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `(id, sequence)` pairs, later duplicates replacing earlier ones
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let mut set = Self::new();
        for (id, sequence) in pairs {
            set.insert(SequenceRecord::new(id, sequence));
        }
        set
    }

    /// Insert a record, returning its position in iteration order
    pub fn insert(&mut self, record: SequenceRecord) -> usize {
        if let Some(&idx) = self.id_to_index.get(&record.id) {
            self.records[idx] = record;
            idx
        } else {
            let idx = self.records.len();
            self.id_to_index.insert(record.id.clone(), idx);
            self.records.push(record);
            idx
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SequenceRecord> {
        self.id_to_index.get(id).map(|&idx| &self.records[idx])
    }

    pub(crate) fn get_index_mut(&mut self, idx: usize) -> Option<&mut SequenceRecord> {
        self.records.get_mut(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[SequenceRecord] {
        &self.records
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of symbols across all records
    #[must_use]
    pub fn total_length(&self) -> usize {
        self.records.iter().map(SequenceRecord::len).sum()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a SequenceRecord;
    type IntoIter = std::slice::Iter<'a, SequenceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
