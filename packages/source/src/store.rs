//! The in-memory record set shared by filtering, rendering, and backfill.
//!
//! A store is built wholesale from one loaded [`Dataset`] and replaced
//! wholesale on the next load. The only in-place mutation is
//! [`RecordStore::fill_coordinate`], used by geocoding backfill. The store
//! has a single owner; callers that need to share it across threads must
//! wrap it in a reader/writer lock.

use trash_bin_map_record_models::{CanonicalRecord, Coordinate, RawRecord};

use crate::dataset::{Dataset, DocumentLayout};
use crate::fields::FieldMapping;

/// One row: the raw record as loaded plus its normalized form.
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    raw: RawRecord,
    record: CanonicalRecord,
}

/// Normalized records in source order, with enough context to write the
/// original document back out.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    entries: Vec<Entry>,
    layout: DocumentLayout,
    fields: FieldMapping,
}

impl RecordStore {
    /// Normalizes every row of `dataset` with `fields`.
    #[must_use]
    pub fn new(dataset: Dataset, fields: FieldMapping) -> Self {
        let entries = dataset
            .records
            .into_iter()
            .map(|raw| {
                let record = fields.normalize(&raw);
                Entry { raw, record }
            })
            .collect();

        Self {
            entries,
            layout: dataset.layout,
            fields,
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records with both coordinates.
    #[must_use]
    pub fn locatable_count(&self) -> usize {
        self.records().filter(|r| r.is_locatable()).count()
    }

    /// Iterates the canonical records in source order.
    pub fn records(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Canonical record at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CanonicalRecord> {
        self.entries.get(index).map(|e| &e.record)
    }

    /// Raw record at `index`, as loaded (plus any backfilled coordinates).
    #[must_use]
    pub fn raw(&self, index: usize) -> Option<&RawRecord> {
        self.entries.get(index).map(|e| &e.raw)
    }

    /// The field-fallback table this store was normalized with.
    #[must_use]
    pub const fn fields(&self) -> &FieldMapping {
        &self.fields
    }

    /// Address resolved from the raw record, without the display default.
    #[must_use]
    pub fn address_of(&self, index: usize) -> Option<String> {
        self.raw(index).and_then(|raw| self.fields.resolve_address(raw))
    }

    /// Fills in a coordinate for the record at `index`, updating both the
    /// canonical record and the raw row. Returns `false` if `index` is out
    /// of range.
    pub fn fill_coordinate(&mut self, index: usize, coordinate: Coordinate) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        self.fields.write_coordinate(&mut entry.raw, coordinate);
        entry.record.latitude = Some(coordinate.latitude);
        entry.record.longitude = Some(coordinate.longitude);
        true
    }

    /// Snapshot of the raw rows in the layout they were loaded with.
    #[must_use]
    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            records: self.entries.iter().map(|e| e.raw.clone()).collect(),
            layout: self.layout.clone(),
        }
    }
}
