//! Incremental ingestion of the append-only sensor log.
//!
//! The log is tailed from a [`LogCursor`] on every change notification. Only
//! complete, newline-terminated lines are consumed; a line that is still being
//! written stays in the file and is read on the next pass.

pub mod parser;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use crate::storage::SampleRingBuffer;

pub use parser::LineError;

/// Error types for log ingestion
#[derive(Debug, Error)]
pub enum IngestError {
    /// The log file could not be opened
    #[error("failed to open sensor log {path:?}: {source}")]
    Open {
        /// Path of the log
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Reading or seeking failed part way through a pass
    #[error("failed to read sensor log: {0}")]
    Read(#[from] io::Error),

    /// Decimation interval of zero minutes
    #[error("data interval must be at least one minute")]
    InvalidInterval,
}

/// Byte offset of the next unread line in the sensor log
///
/// The cursor only moves forward, one complete line at a time. It goes back to
/// the start of the file only when the file shrank below it (truncation or
/// rotation).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogCursor {
    offset: u64,
}

impl LogCursor {
    /// Cursor at the start of the log
    pub const fn new() -> Self {
        Self { offset: 0 }
    }

    /// Cursor at an explicit byte offset
    pub const fn at(offset: u64) -> Self {
        Self { offset }
    }

    pub const fn offset(&self) -> u64 {
        self.offset
    }

    pub const fn is_at_start(&self) -> bool {
        self.offset == 0
    }

    fn advance_to(&mut self, offset: u64) {
        debug_assert!(offset >= self.offset, "log cursor moved backwards");
        self.offset = offset;
    }

    fn reset(&mut self) {
        self.offset = 0;
    }
}

/// Summary of one tail pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TailReport {
    /// Samples pushed into the ring buffer
    pub accepted: usize,
    /// Well-formed lines dropped by decimation
    pub decimated: usize,
    /// Lines skipped because they failed to parse
    pub malformed: usize,
    /// Bytes consumed from the log
    pub bytes: u64,
    /// The cursor was reset because the log shrank
    pub restarted: bool,
}

impl TailReport {
    /// Whether any new sample arrived in this pass
    pub fn has_new_samples(&self) -> bool {
        self.accepted > 0
    }
}

/// Where reading starts after the cursor has been validated
enum ResumePoint {
    /// Read lines starting at this byte offset
    LineStart(u64),
    /// Nothing complete to read yet
    Incomplete,
}

/// Tails the sensor log into a [`SampleRingBuffer`]
#[derive(Debug, Clone)]
pub struct SensorLogIngester {
    path: PathBuf,
    interval_minutes: u32,
}

impl SensorLogIngester {
    /// Create an ingester for `path` that keeps one record every
    /// `interval_minutes` minutes
    pub fn new(path: impl Into<PathBuf>, interval_minutes: u32) -> Result<Self, IngestError> {
        if interval_minutes == 0 {
            return Err(IngestError::InvalidInterval);
        }
        Ok(Self {
            path: path.into(),
            interval_minutes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    /// Read every new complete line of the log file after `cursor`
    pub fn tail(
        &self,
        cursor: &mut LogCursor,
        samples: &mut SampleRingBuffer,
    ) -> Result<TailReport, IngestError> {
        let file = File::open(&self.path).map_err(|source| IngestError::Open {
            path: self.path.clone(),
            source,
        })?;
        self.tail_reader(BufReader::new(file), cursor, samples)
    }

    /// Read every new complete line of `reader` after `cursor`.
    ///
    /// The cursor is advanced after each consumed line, so an I/O error part
    /// way through leaves it pointing at the first unconsumed line and no
    /// sample is ingested twice.
    pub fn tail_reader<R: BufRead + Seek>(
        &self,
        mut reader: R,
        cursor: &mut LogCursor,
        samples: &mut SampleRingBuffer,
    ) -> Result<TailReport, IngestError> {
        let mut report = TailReport::default();

        let end = reader.seek(SeekFrom::End(0))?;
        if end < cursor.offset() {
            warn!(
                "Sensor log shrank from {} to {} bytes, re-reading from the start",
                cursor.offset(),
                end
            );
            cursor.reset();
            report.restarted = true;
        }

        // Echo new records only once the initial backlog has been read
        let resumed = !cursor.is_at_start();
        let mut position = match resume(&mut reader, cursor)? {
            ResumePoint::LineStart(position) => position,
            ResumePoint::Incomplete => return Ok(report),
        };
        let start = cursor.offset();

        let mut line = Vec::with_capacity(64);
        loop {
            line.clear();
            let read = reader.read_until(b'\n', &mut line)?;
            if read == 0 || line.last() != Some(&b'\n') {
                // EOF, possibly in the middle of a line still being written
                break;
            }

            let line_start = position;
            position += read as u64;
            cursor.advance_to(position);

            match parser::parse_line(&line, self.interval_minutes) {
                Ok(Some(sample)) => {
                    if resumed {
                        debug!("read: {}", sample);
                    }
                    samples.push(sample);
                    report.accepted += 1;
                }
                Ok(None) => report.decimated += 1,
                Err(e) => {
                    warn!("Skipping sensor log line at byte {}: {}", line_start, e);
                    report.malformed += 1;
                }
            }
        }

        report.bytes = cursor.offset() - start;
        if report.accepted > 0 {
            info!(
                "Ingested {} sample(s) ({} decimated, {} malformed), cursor at {}",
                report.accepted,
                report.decimated,
                report.malformed,
                cursor.offset()
            );
        }
        Ok(report)
    }
}

/// Position `reader` at the cursor, applying the one-byte rewind guard.
///
/// The byte just before a non-zero cursor must be the newline that ended the
/// previous pass. If it is not, the file changed underneath us and reading
/// resumes at the next line start instead of in the middle of a record.
fn resume<R: BufRead + Seek>(
    reader: &mut R,
    cursor: &mut LogCursor,
) -> Result<ResumePoint, IngestError> {
    if cursor.is_at_start() {
        reader.seek(SeekFrom::Start(0))?;
        return Ok(ResumePoint::LineStart(0));
    }

    let guard = cursor.offset() - 1;
    reader.seek(SeekFrom::Start(guard))?;
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    if byte[0] == b'\n' {
        return Ok(ResumePoint::LineStart(cursor.offset()));
    }

    warn!(
        "Sensor log cursor at byte {} is not on a line boundary, resynchronising",
        cursor.offset()
    );
    let mut fragment = Vec::new();
    let skipped = reader.read_until(b'\n', &mut fragment)?;
    if fragment.last() != Some(&b'\n') {
        return Ok(ResumePoint::Incomplete);
    }
    let line_start = cursor.offset() + skipped as u64;
    cursor.advance_to(line_start);
    Ok(ResumePoint::LineStart(line_start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Sample;
    use std::io::{Cursor, Write};

    fn ingester(interval: u32) -> SensorLogIngester {
        SensorLogIngester::new("unused.log", interval).unwrap()
    }

    fn minute_log(minutes: u32) -> String {
        let mut log = String::new();
        for m in 0..minutes {
            log.push_str(&format!(
                "{:02}:{:02}:05,{}.{:02},990.00,45.00\n",
                (m / 60) % 24,
                m % 60,
                20 + m / 100,
                m % 100
            ));
        }
        log
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(
            SensorLogIngester::new("x.log", 0),
            Err(IngestError::InvalidInterval)
        ));
    }

    #[test]
    fn test_accepts_matching_minute() {
        let mut cursor = LogCursor::new();
        let mut samples = SampleRingBuffer::new(10).unwrap();
        let log = b"12:15:07,21.34,990.12,45.67\n";

        let report = ingester(15)
            .tail_reader(Cursor::new(&log[..]), &mut cursor, &mut samples)
            .unwrap();

        assert_eq!(report.accepted, 1);
        assert_eq!(samples.latest(), Some(&Sample::new(2134, 99012, 4567)));
        assert_eq!(cursor.offset(), log.len() as u64);
    }

    #[test]
    fn test_rejects_other_minute() {
        let mut cursor = LogCursor::new();
        let mut samples = SampleRingBuffer::new(10).unwrap();
        let log = b"12:16:07,21.34,990.12,45.67\n";

        let report = ingester(15)
            .tail_reader(Cursor::new(&log[..]), &mut cursor, &mut samples)
            .unwrap();

        assert_eq!(report.accepted, 0);
        assert_eq!(report.decimated, 1);
        assert!(samples.is_empty(), "rejected line must not reach the buffer");
        assert_eq!(cursor.offset(), log.len() as u64);
    }

    #[test]
    fn test_decimation_count() {
        for (minutes, interval) in [(120, 15), (61, 5), (300, 10), (59, 60)] {
            let log = minute_log(minutes);
            let mut cursor = LogCursor::new();
            let mut samples = SampleRingBuffer::new(1000).unwrap();

            let report = ingester(interval)
                .tail_reader(Cursor::new(log.as_bytes()), &mut cursor, &mut samples)
                .unwrap();

            let expected = (minutes / interval) as usize;
            assert!(
                report.accepted.abs_diff(expected) <= 1,
                "{minutes} minutes at interval {interval}: got {}, expected {expected}",
                report.accepted
            );
            assert_eq!(report.malformed, 0);
        }
    }

    #[test]
    fn test_malformed_line_skipped_and_ingestion_continues() {
        let log = b"00:00:00,1.00,2.00,3.00\n00:15:00,1.0x,2.00,3.00\n00:30:00,4.00,5.00\n00:45:00,7.00,8.00,9.00\n";
        let mut cursor = LogCursor::new();
        let mut samples = SampleRingBuffer::new(10).unwrap();

        let report = ingester(15)
            .tail_reader(Cursor::new(&log[..]), &mut cursor, &mut samples)
            .unwrap();

        assert_eq!(report.accepted, 2);
        assert_eq!(report.malformed, 2);
        assert_eq!(samples.at(0), Some(&Sample::new(100, 200, 300)));
        assert_eq!(samples.at(1), Some(&Sample::new(700, 800, 900)));
    }

    #[test]
    fn test_partial_trailing_line_left_for_next_pass() {
        let mut log = b"00:00:00,1.00,2.00,3.00\n00:15:00,4.00,5".to_vec();
        let mut cursor = LogCursor::new();
        let mut samples = SampleRingBuffer::new(10).unwrap();
        let ingester = ingester(15);

        let first = ingester
            .tail_reader(Cursor::new(&log[..]), &mut cursor, &mut samples)
            .unwrap();
        assert_eq!(first.accepted, 1);
        assert_eq!(cursor.offset(), 24, "cursor must stop before the partial line");

        log.extend_from_slice(b".00,6.00\n");
        let second = ingester
            .tail_reader(Cursor::new(&log[..]), &mut cursor, &mut samples)
            .unwrap();
        assert_eq!(second.accepted, 1);
        assert_eq!(second.malformed, 0);
        assert_eq!(samples.latest(), Some(&Sample::new(400, 500, 600)));
        assert_eq!(cursor.offset(), log.len() as u64);
    }

    #[test]
    fn test_no_new_data_reports_zero() {
        let log = b"00:00:00,1.00,2.00,3.00\n";
        let mut cursor = LogCursor::new();
        let mut samples = SampleRingBuffer::new(10).unwrap();
        let ingester = ingester(15);

        ingester
            .tail_reader(Cursor::new(&log[..]), &mut cursor, &mut samples)
            .unwrap();
        let again = ingester
            .tail_reader(Cursor::new(&log[..]), &mut cursor, &mut samples)
            .unwrap();

        assert!(!again.has_new_samples());
        assert_eq!(again.bytes, 0);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_truncated_log_restarts_from_beginning() {
        let mut cursor = LogCursor::at(4096);
        let mut samples = SampleRingBuffer::new(10).unwrap();
        let log = b"01:00:00,1.00,2.00,3.00\n";

        let report = ingester(15)
            .tail_reader(Cursor::new(&log[..]), &mut cursor, &mut samples)
            .unwrap();

        assert!(report.restarted);
        assert_eq!(report.accepted, 1);
        assert_eq!(cursor.offset(), log.len() as u64);
    }

    #[test]
    fn test_misaligned_cursor_resynchronises() {
        let log = b"00:00:00,1.00,2.00,3.00\n00:15:00,4.00,5.00,6.00\n";
        // Points into the middle of the first record
        let mut cursor = LogCursor::at(10);
        let mut samples = SampleRingBuffer::new(10).unwrap();

        let report = ingester(15)
            .tail_reader(Cursor::new(&log[..]), &mut cursor, &mut samples)
            .unwrap();

        assert_eq!(report.accepted, 1);
        assert_eq!(report.malformed, 0, "fragment must not be parsed");
        assert_eq!(samples.latest(), Some(&Sample::new(400, 500, 600)));
    }

    #[test]
    fn test_tail_file_on_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "10:00:00,22.50,1001.25,40.00").unwrap();
        file.flush().unwrap();

        let ingester = SensorLogIngester::new(file.path(), 15).unwrap();
        let mut cursor = LogCursor::new();
        let mut samples = SampleRingBuffer::new(10).unwrap();

        assert_eq!(ingester.tail(&mut cursor, &mut samples).unwrap().accepted, 1);

        writeln!(file, "10:07:00,22.60,1001.30,40.10").unwrap();
        writeln!(file, "10:15:00,22.75,1001.50,41.00").unwrap();
        file.flush().unwrap();

        let report = ingester.tail(&mut cursor, &mut samples).unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.decimated, 1);
        assert_eq!(samples.latest(), Some(&Sample::new(2275, 100150, 4100)));
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let ingester = SensorLogIngester::new(dir.path().join("absent.log"), 15).unwrap();
        let mut cursor = LogCursor::new();
        let mut samples = SampleRingBuffer::new(10).unwrap();

        assert!(matches!(
            ingester.tail(&mut cursor, &mut samples),
            Err(IngestError::Open { .. })
        ));
    }
}
