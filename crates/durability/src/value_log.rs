//! Append-only value log
//!
//! Every value a local store holds lives in one log file as a framed
//! [`ValueRecord`]. The log is never rewritten in place; the only mutation
//! besides appending is truncating a torn tail during recovery.
//!
//! # Recovery
//!
//! Opening the log scans it front to back and returns one [`LogEntry`] per
//! intact record, from which the caller rebuilds its index:
//!
//! - A record that runs past end-of-file, or a final record whose CRC
//!   fails, is a torn write from a crash. The log is truncated to the last
//!   intact record.
//! - A CRC failure anywhere before the final record is corruption and
//!   fails the open.

use crate::format::value_record::{RecordHeader, ValueRecord, RECORD_HEADER_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use vault_core::{Reference, Value, VaultError, VaultResult};

/// Location of one record in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    /// Content reference of the stored value
    pub reference: Reference,
    /// Byte offset of the record header
    pub offset: u64,
    /// Payload length
    pub len: u32,
}

impl LogEntry {
    /// Total on-disk size of the record
    pub fn record_len(&self) -> u64 {
        RECORD_HEADER_SIZE as u64 + self.len as u64
    }
}

/// Result of opening a value log
pub struct RecoveredLog {
    /// Append handle
    pub writer: LogWriter,
    /// Read handle
    pub reader: LogReader,
    /// Every intact record, in log order
    pub entries: Vec<LogEntry>,
    /// Bytes removed from a torn tail (0 if the log was clean)
    pub truncated_bytes: u64,
}

/// Open (or create) a value log and scan it
pub fn open_log(path: &Path) -> VaultResult<RecoveredLog> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    let file_len = file.metadata()?.len();

    let (entries, valid_len) = scan(&file, file_len)?;
    let truncated_bytes = file_len - valid_len;
    if truncated_bytes > 0 {
        warn!(
            target: "vault::store",
            path = %path.display(),
            valid_len,
            truncated_bytes,
            "Truncating torn tail of value log"
        );
        file.set_len(valid_len)?;
        file.sync_all()?;
    }
    drop(file);

    let writer_file = OpenOptions::new().append(true).open(path)?;
    let reader_file = File::open(path)?;

    debug!(
        target: "vault::store",
        path = %path.display(),
        records = entries.len(),
        bytes = valid_len,
        "Value log opened"
    );

    Ok(RecoveredLog {
        writer: LogWriter {
            path: path.to_path_buf(),
            file: writer_file,
            end: valid_len,
        },
        reader: LogReader { file: reader_file },
        entries,
        truncated_bytes,
    })
}

fn scan(file: &File, file_len: u64) -> VaultResult<(Vec<LogEntry>, u64)> {
    let mut reader = BufReader::new(file);
    let mut entries = Vec::new();
    let mut offset = 0u64;
    let mut header_bytes = [0u8; RECORD_HEADER_SIZE];
    let mut payload = Vec::new();

    while offset < file_len {
        if file_len - offset < RECORD_HEADER_SIZE as u64 {
            break;
        }
        reader.read_exact(&mut header_bytes)?;
        let header = RecordHeader::from_bytes(&header_bytes);

        let end = offset + RECORD_HEADER_SIZE as u64 + header.len as u64;
        if end > file_len {
            break;
        }

        payload.resize(header.len as usize, 0);
        reader.read_exact(&mut payload)?;

        if !header.verify(&payload) {
            if end == file_len {
                break;
            }
            return Err(VaultError::corruption(format!(
                "value log record at offset {} failed its checksum",
                offset
            )));
        }

        entries.push(LogEntry {
            reference: header.reference,
            offset,
            len: header.len,
        });
        offset = end;
    }

    Ok((entries, offset))
}

/// Append side of the value log
pub struct LogWriter {
    path: PathBuf,
    file: File,
    end: u64,
}

impl LogWriter {
    /// Append a batch of records in one write
    ///
    /// On failure the log is rolled back to its previous length so no
    /// partial record is left ahead of later appends.
    pub fn append(&mut self, records: &[ValueRecord]) -> VaultResult<Vec<LogEntry>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let total: usize = records.iter().map(ValueRecord::encoded_len).sum();
        let mut buf = Vec::with_capacity(total);
        let mut entries = Vec::with_capacity(records.len());
        let mut offset = self.end;
        for record in records {
            entries.push(LogEntry {
                reference: record.reference,
                offset,
                len: record.payload.len() as u32,
            });
            offset += record.encoded_len() as u64;
            record.write_to(&mut buf);
        }

        if let Err(e) = self.file.write_all(&buf) {
            if let Err(rollback) = self.file.set_len(self.end) {
                warn!(
                    target: "vault::store",
                    path = %self.path.display(),
                    error = %rollback,
                    "Failed to roll back partial value log append"
                );
            }
            return Err(VaultError::storage(format!(
                "value log append failed: {}",
                e
            )));
        }

        self.end = offset;
        Ok(entries)
    }

    /// fsync the log
    pub fn sync(&self) -> VaultResult<()> {
        self.file.sync_data()?;
        Ok(())
    }

    /// Current log length in bytes
    pub fn len(&self) -> u64 {
        self.end
    }

    /// True if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.end == 0
    }
}

/// Read side of the value log
pub struct LogReader {
    file: File,
}

impl LogReader {
    /// Read and verify the value at `entry`
    pub fn read(&mut self, entry: &LogEntry) -> VaultResult<Value> {
        self.file.seek(SeekFrom::Start(entry.offset))?;
        let mut header_bytes = [0u8; RECORD_HEADER_SIZE];
        self.file.read_exact(&mut header_bytes)?;
        let header = RecordHeader::from_bytes(&header_bytes);
        if header.reference != entry.reference || header.len != entry.len {
            return Err(VaultError::corruption(format!(
                "value log record at offset {} does not match its index entry",
                entry.offset
            )));
        }

        let mut payload = vec![0u8; header.len as usize];
        self.file.read_exact(&mut payload)?;
        if !header.verify(&payload) {
            return Err(VaultError::corruption(format!(
                "value log record at offset {} failed its checksum",
                entry.offset
            )));
        }
        ValueRecord::decode_payload(&payload)
    }
}
