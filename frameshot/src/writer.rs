//! The byte-oriented measurement output boundary.
//!
//! The record streams measurement-major (one row per measurement, one bit
//! per shot) while output formats are shot-major (one channel per shot), so
//! every writer transposes. The writers here buffer rows and emit on
//! [`RecordWriter::write_end`]; spilling oversized buffers to temporary
//! files is a concern of the callers that own the sinks.

use std::io::{self, Write};
use std::ops::Range;

use bitplane::{BitTable, BitVec, BitView, Bits, BitsMut};

/// Sink for sampled measurement records.
///
/// The core calls [`RecordWriter::batch_write_rows`] only with row counts
/// that are multiples of 1024, so each shot's packed bits always extend by
/// whole 64-bit words; every other row goes through the bit path. The bytes
/// produced are never reinterpreted by the core.
pub trait RecordWriter {
    /// Write the rows `rows` of `table`, one bit per shot each.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the underlying sink.
    fn batch_write_rows(&mut self, table: &BitTable, rows: Range<usize>) -> io::Result<()>;

    /// Write a single row, one bit per shot.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the underlying sink.
    fn batch_write_bit(&mut self, row: BitView<'_>) -> io::Result<()>;

    /// Finalize the stream: emit per-shot framing and flush.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the underlying sink.
    fn write_end(&mut self) -> io::Result<()>;
}

/// In-memory writer; the backing store for the convenience samplers and for
/// tests.
#[derive(Default)]
#[must_use]
pub struct CaptureWriter {
    rows: Vec<BitVec>,
    ended: bool,
}

impl CaptureWriter {
    pub fn new() -> Self {
        CaptureWriter::default()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    #[must_use]
    pub fn rows(&self) -> &[BitVec] {
        &self.rows
    }

    /// The captured record as a (measurement × shot) table.
    pub fn into_table(self, num_shots: usize) -> BitTable {
        let mut table = BitTable::zeros(self.rows.len(), num_shots);
        for (index, row) in self.rows.iter().enumerate() {
            table.row_mut(index).assign(row);
        }
        table
    }
}

impl RecordWriter for CaptureWriter {
    fn batch_write_rows(&mut self, table: &BitTable, rows: Range<usize>) -> io::Result<()> {
        debug_assert!(rows.len() % 1024 == 0, "block path requires 1024-row multiples");
        for index in rows {
            self.rows.push(BitVec::from_view(&table.row(index)));
        }
        Ok(())
    }

    fn batch_write_bit(&mut self, row: BitView<'_>) -> io::Result<()> {
        self.rows.push(BitVec::from_view(&row));
        Ok(())
    }

    fn write_end(&mut self) -> io::Result<()> {
        self.ended = true;
        Ok(())
    }
}

/// '0'/'1' character format: one line per shot, one character per
/// measurement.
#[must_use]
pub struct Char01Writer<Sink: Write> {
    sink: Sink,
    num_shots: usize,
    buffer: CaptureWriter,
}

impl<Sink: Write> Char01Writer<Sink> {
    pub fn new(sink: Sink, num_shots: usize) -> Self {
        Char01Writer {
            sink,
            num_shots,
            buffer: CaptureWriter::new(),
        }
    }

    /// Recover the sink after the stream has ended.
    pub fn into_inner(self) -> Sink {
        self.sink
    }
}

impl<Sink: Write> RecordWriter for Char01Writer<Sink> {
    fn batch_write_rows(&mut self, table: &BitTable, rows: Range<usize>) -> io::Result<()> {
        self.buffer.batch_write_rows(table, rows)
    }

    fn batch_write_bit(&mut self, row: BitView<'_>) -> io::Result<()> {
        self.buffer.batch_write_bit(row)
    }

    fn write_end(&mut self) -> io::Result<()> {
        let mut line = Vec::with_capacity(self.buffer.row_count() + 1);
        for shot in 0..self.num_shots {
            line.clear();
            for row in self.buffer.rows() {
                line.push(if row.index(shot) { b'1' } else { b'0' });
            }
            line.push(b'\n');
            self.sink.write_all(&line)?;
        }
        self.sink.flush()
    }
}

/// Bit-packed binary format: per shot, measurements packed little-endian
/// into bytes, padded up to a whole byte.
#[must_use]
pub struct BitPackedWriter<Sink: Write> {
    sink: Sink,
    num_shots: usize,
    buffer: CaptureWriter,
}

impl<Sink: Write> BitPackedWriter<Sink> {
    pub fn new(sink: Sink, num_shots: usize) -> Self {
        BitPackedWriter {
            sink,
            num_shots,
            buffer: CaptureWriter::new(),
        }
    }

    pub fn into_inner(self) -> Sink {
        self.sink
    }
}

impl<Sink: Write> RecordWriter for BitPackedWriter<Sink> {
    fn batch_write_rows(&mut self, table: &BitTable, rows: Range<usize>) -> io::Result<()> {
        self.buffer.batch_write_rows(table, rows)
    }

    fn batch_write_bit(&mut self, row: BitView<'_>) -> io::Result<()> {
        self.buffer.batch_write_bit(row)
    }

    fn write_end(&mut self) -> io::Result<()> {
        let row_count = self.buffer.row_count();
        let mut packed = vec![0u8; row_count.div_ceil(8)];
        for shot in 0..self.num_shots {
            packed.fill(0);
            for (index, row) in self.buffer.rows().iter().enumerate() {
                if row.index(shot) {
                    packed[index / 8] |= 1 << (index % 8);
                }
            }
            self.sink.write_all(&packed)?;
        }
        self.sink.flush()
    }
}
