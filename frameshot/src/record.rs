//! Batched measurement record with bounded lookback and block flushing.

use std::io;

use bitplane::{BitTable, BitVec, BitView, Bits, BitsMut};
use thiserror::Error;

use crate::writer::RecordWriter;

/// Rows per flushed block: 1024 bits is 128 bytes per shot, so the writer
/// always receives whole words of every shot's packed record.
pub const FLUSH_BLOCK_ROWS: usize = 1024;

/// A circuit referenced the record before its beginning.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("rec[-{lookback}] reaches before the beginning of the record ({stored} stored)")]
pub struct RecordError {
    pub lookback: usize,
    pub stored: usize,
}

/// Growable (measurement × shot) bit table of results.
///
/// Every appended row is either already flushed (`written`), still pending
/// (`unwritten` rows at the tail), or one of at most `max_lookback −
/// unwritten` older rows retained so detectors can reference them. Rows are
/// ANDed with `shot_mask` on insert, so inactive shots never carry data.
///
/// Appending may grow the storage by doubling; row views must not be held
/// across [`MeasureRecordBatch::record_result`].
#[must_use]
pub struct MeasureRecordBatch {
    storage: BitTable,
    shot_mask: BitVec,
    max_lookback: usize,
    stored: usize,
    unwritten: usize,
    written: usize,
}

impl MeasureRecordBatch {
    pub fn new(num_shots: usize, max_lookback: usize) -> Self {
        MeasureRecordBatch {
            storage: BitTable::zeros(1, num_shots),
            shot_mask: BitVec::ones(num_shots),
            max_lookback,
            stored: 0,
            unwritten: 0,
            written: 0,
        }
    }

    #[must_use]
    pub fn num_shots(&self) -> usize {
        self.shot_mask.len()
    }

    #[must_use]
    pub fn stored(&self) -> usize {
        self.stored
    }

    #[must_use]
    pub fn unwritten(&self) -> usize {
        self.unwritten
    }

    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    #[must_use]
    pub fn max_lookback(&self) -> usize {
        self.max_lookback
    }

    #[must_use]
    pub fn shot_mask(&self) -> &BitVec {
        &self.shot_mask
    }

    /// Stored row by position; row 0 is the oldest retained row.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a stored row.
    #[must_use]
    pub fn row(&self, index: usize) -> BitView<'_> {
        assert!(index < self.stored, "row {index} is not stored");
        self.storage.row(index)
    }

    /// Appends one result row, masking out inactive shots.
    pub fn record_result<Row: Bits + ?Sized>(&mut self, row: &Row) {
        if self.stored >= self.storage.major_count() {
            self.storage.resize_major(self.storage.major_count() * 2);
        }
        let mut target = self.storage.row_mut(self.stored);
        target.assign(row);
        target.and_assign(&self.shot_mask);
        self.stored += 1;
        self.unwritten += 1;
    }

    /// The row recorded `lookback` appends ago.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] when the reference reaches before the
    /// beginning of the record.
    ///
    /// # Panics
    ///
    /// Panics on `lookback == 0` or `lookback > max_lookback`; both are
    /// usage errors, not circuit data.
    pub fn lookback(&self, lookback: usize) -> Result<BitView<'_>, RecordError> {
        assert!(lookback != 0, "lookback must be non-zero");
        assert!(
            lookback <= self.max_lookback,
            "lookback {lookback} exceeds the retained window of {}",
            self.max_lookback
        );
        if lookback > self.stored {
            return Err(RecordError {
                lookback,
                stored: self.stored,
            });
        }
        Ok(self.storage.row(self.stored - lookback))
    }

    /// Declares every stored row flushed, compacting when over half the
    /// buffer is past the lookback window.
    pub fn mark_all_as_written(&mut self) {
        self.written += self.unwritten;
        self.unwritten = 0;
        let keep = self.max_lookback;
        if (self.stored >> 1) > keep {
            self.storage.shift_rows_to_front(self.stored - keep, keep);
            self.stored = keep;
        }
    }

    /// Flushes whole 1024-row blocks to `writer`.
    ///
    /// For each flushed row `j` (in absolute record order), a set bit `j` of
    /// `ref_sample` inverts the row across all active shots first, so the
    /// stream carries the deviation from the reference sample.
    ///
    /// # Errors
    ///
    /// Propagates writer I/O errors verbatim.
    pub fn intermediate_write_unwritten_results_to<Writer, Ref>(
        &mut self,
        writer: &mut Writer,
        ref_sample: &Ref,
    ) -> io::Result<()>
    where
        Writer: RecordWriter + ?Sized,
        Ref: Bits + ?Sized,
    {
        while self.unwritten >= FLUSH_BLOCK_ROWS {
            let begin = self.stored - self.unwritten;
            for offset in 0..FLUSH_BLOCK_ROWS {
                let absolute = self.written + offset;
                if absolute < ref_sample.bit_len() && ref_sample.index(absolute) {
                    let mut row = self.storage.row_mut(begin + offset);
                    row.xor_assign(&self.shot_mask);
                }
            }
            writer.batch_write_rows(&self.storage, begin..begin + FLUSH_BLOCK_ROWS)?;
            self.unwritten -= FLUSH_BLOCK_ROWS;
            self.written += FLUSH_BLOCK_ROWS;
        }

        let keep = self.max_lookback.max(self.unwritten);
        if (self.stored >> 1) > keep {
            self.storage.shift_rows_to_front(self.stored - keep, keep);
            self.stored = keep;
        }
        Ok(())
    }

    /// Flushes every remaining row through the bit path, applying the same
    /// reference inversion, then finalizes the stream.
    ///
    /// # Errors
    ///
    /// Propagates writer I/O errors verbatim.
    pub fn final_write_unwritten_results_to<Writer, Ref>(
        &mut self,
        writer: &mut Writer,
        ref_sample: &Ref,
    ) -> io::Result<()>
    where
        Writer: RecordWriter + ?Sized,
        Ref: Bits + ?Sized,
    {
        let end = self.stored;
        for row_index in end - self.unwritten..end {
            let invert = self.written < ref_sample.bit_len() && ref_sample.index(self.written);
            if invert {
                self.storage.row_mut(row_index).xor_assign(&self.shot_mask);
            }
            writer.batch_write_bit(self.storage.row(row_index))?;
            if invert {
                self.storage.row_mut(row_index).xor_assign(&self.shot_mask);
            }
            self.written += 1;
        }
        self.unwritten = 0;
        writer.write_end()
    }

    pub fn clear(&mut self) {
        self.stored = 0;
        self.unwritten = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_of(num_shots: usize, set: &[usize]) -> BitVec {
        let mut row = BitVec::zeros(num_shots);
        for &shot in set {
            row.assign_index(shot, true);
        }
        row
    }

    #[test]
    fn lookback_returns_kth_most_recent() {
        let mut record = MeasureRecordBatch::new(8, 4);
        for round in 0..5 {
            record.record_result(&row_of(8, &[round]));
        }
        assert_eq!(record.stored(), 5);
        assert!(record.lookback(1).unwrap().index(4));
        assert!(record.lookback(3).unwrap().index(2));
    }

    #[test]
    fn lookback_before_beginning_is_an_error() {
        let mut record = MeasureRecordBatch::new(4, 10);
        record.record_result(&row_of(4, &[]));
        assert_eq!(record.lookback(2), Err(RecordError { lookback: 2, stored: 1 }));
    }

    #[test]
    #[should_panic(expected = "lookback must be non-zero")]
    fn lookback_zero_panics() {
        let record = MeasureRecordBatch::new(4, 10);
        let _ = record.lookback(0);
    }

    #[test]
    #[should_panic(expected = "exceeds the retained window")]
    fn lookback_past_window_panics() {
        let record = MeasureRecordBatch::new(4, 2);
        let _ = record.lookback(3);
    }

    #[test]
    fn growth_preserves_rows() {
        let mut record = MeasureRecordBatch::new(16, 2000);
        for round in 0..2000 {
            record.record_result(&row_of(16, &[round % 16]));
        }
        assert_eq!(record.stored(), 2000);
        assert!(record.lookback(2000).unwrap().index(0));
        assert!(record.lookback(1).unwrap().index(1999 % 16));
    }

    #[test]
    fn shot_mask_clears_inactive_shots() {
        let mut record = MeasureRecordBatch::new(5, 4);
        let mut over_wide = BitVec::ones(5);
        over_wide.assign_index(4, true);
        record.record_result(&over_wide);
        let row = record.lookback(1).unwrap();
        assert_eq!(row.count_ones(), 5);
        for padding_bit in 5..row.words().len() * 64 {
            assert_eq!((row.words()[padding_bit / 64] >> (padding_bit % 64)) & 1, 0);
        }
    }

    #[test]
    fn mark_all_as_written_compacts() {
        let mut record = MeasureRecordBatch::new(4, 3);
        for round in 0..100 {
            record.record_result(&row_of(4, &[round % 4]));
        }
        record.mark_all_as_written();
        assert_eq!(record.unwritten(), 0);
        assert_eq!(record.stored(), 3);
        // The retained tail is still addressable through lookback.
        assert!(record.lookback(1).unwrap().index(99 % 4));
        assert!(record.lookback(3).unwrap().index(97 % 4));
    }
}
