//! Raw memory captured during one poll tick.

use std::collections::HashMap;

use super::tables::MemoryField;

/// Raw byte ranges captured once per tick.
///
/// A field that failed to read is simply absent; every accessor returns
/// `None` for it and the decoder substitutes its zero default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySnapshot {
    fields: HashMap<MemoryField, Vec<u8>>,
}

impl MemorySnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one read. `None` leaves the field absent.
    pub fn insert(&mut self, field: MemoryField, bytes: Option<Vec<u8>>) {
        match bytes {
            Some(b) => {
                self.fields.insert(field, b);
            }
            None => {
                self.fields.remove(&field);
            }
        }
    }

    /// Builder-style [`insert`](Self::insert) of a little-endian word.
    #[must_use]
    pub fn with_word(mut self, field: MemoryField, value: u16) -> Self {
        self.fields.insert(field, value.to_le_bytes().to_vec());
        self
    }

    /// Builder-style [`insert`](Self::insert) of raw bytes.
    #[must_use]
    pub fn with_bytes(mut self, field: MemoryField, bytes: Vec<u8>) -> Self {
        self.fields.insert(field, bytes);
        self
    }

    /// Raw bytes of a field.
    #[must_use]
    pub fn get(&self, field: MemoryField) -> Option<&[u8]> {
        self.fields.get(&field).map(Vec::as_slice)
    }

    /// First byte of a field.
    #[must_use]
    pub fn byte(&self, field: MemoryField) -> Option<u8> {
        self.get(field)?.first().copied()
    }

    /// Little-endian word at the start of a field.
    #[must_use]
    pub fn word(&self, field: MemoryField) -> Option<u16> {
        self.word_at(field, 0)
    }

    /// Little-endian word at `offset` inside a field.
    ///
    /// A single trailing byte is widened with a zero high byte.
    #[must_use]
    pub fn word_at(&self, field: MemoryField, offset: usize) -> Option<u16> {
        let bytes = self.get(field)?;
        match bytes.get(offset..) {
            Some([lo, hi, ..]) => Some(u16::from_le_bytes([*lo, *hi])),
            Some([lo]) => Some(u16::from(*lo)),
            _ => None,
        }
    }

    /// Number of fields that were read successfully.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field was read successfully.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether any game data at all was captured.
    ///
    /// The stats block is the anchor: without it there is nothing to decode.
    #[must_use]
    pub fn has_game_data(&self) -> bool {
        self.fields.contains_key(&MemoryField::Stats)
    }
}
