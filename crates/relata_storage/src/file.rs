//! File-based record store backed by an append-only batch log.

use crate::error::{StorageError, StorageResult};
use crate::memory::apply_to_map;
use crate::store::{RecordKey, RecordStore, RecordWrite};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Size of the little-endian length prefix in front of every batch frame.
const FRAME_HEADER_SIZE: usize = 4;

/// A file-based record store.
///
/// Every applied batch is appended to a log file as one frame
/// (`u32` length prefix followed by the CBOR-encoded writes) and synced
/// before it becomes visible. Opening the store replays the log into an
/// in-memory index. Data survives process restarts.
///
/// # Durability
///
/// - A batch is visible only after `sync_data` returned successfully
/// - A torn frame at the end of the log (crash during append) is cut off on open
/// - A failed append truncates the log back to its previous length
///
/// # Example
///
/// ```no_run
/// use relata_storage::{FileRecordStore, RecordKey, RecordStore, RecordWrite};
/// use std::path::Path;
///
/// let store = FileRecordStore::open(Path::new("objects.log")).unwrap();
/// store.apply(&[RecordWrite::put(RecordKey::new("Order", [1; 16]), vec![1])]).unwrap();
/// ```
#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    file: Mutex<LogFile>,
    records: RwLock<BTreeMap<RecordKey, Vec<u8>>>,
}

#[derive(Debug)]
struct LogFile {
    file: File,
    size: u64,
}

impl FileRecordStore {
    /// Opens or creates a store at the given path and replays its log.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, or if a complete frame
    /// cannot be decoded.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;

        let (records, valid_len) = replay(&contents)?;
        if valid_len < contents.len() as u64 {
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(LogFile {
                file,
                size: valid_len,
            }),
            records: RwLock::new(records),
        })
    }

    /// Opens or creates a store, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the log cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current length of the log in bytes.
    #[must_use]
    pub fn log_size(&self) -> u64 {
        self.file.lock().size
    }

    fn append_frame(log: &mut LogFile, frame: &[u8]) -> StorageResult<()> {
        log.file.seek(SeekFrom::Start(log.size))?;
        log.file.write_all(frame)?;
        log.file.flush()?;
        log.file.sync_data()?;
        log.size += frame.len() as u64;
        Ok(())
    }
}

impl RecordStore for FileRecordStore {
    fn get(&self, key: &RecordKey) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn scan(&self, class_id: &str) -> StorageResult<Vec<(RecordKey, Vec<u8>)>> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|(key, _)| key.class_id == class_id)
            .map(|(key, payload)| (key.clone(), payload.clone()))
            .collect())
    }

    fn apply(&self, batch: &[RecordWrite]) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let frame = encode_frame(batch)?;

        let mut log = self.file.lock();
        let previous_size = log.size;
        if let Err(err) = Self::append_frame(&mut log, &frame) {
            // Cut off whatever part of the frame reached the file.
            let _ = log.file.set_len(previous_size);
            log.size = previous_size;
            return Err(err);
        }

        let mut records = self.records.write();
        apply_to_map(&mut records, batch);
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.read().len()
    }
}

fn encode_frame(batch: &[RecordWrite]) -> StorageResult<Vec<u8>> {
    let mut body = Vec::new();
    ciborium::into_writer(&batch, &mut body)
        .map_err(|e| StorageError::Encoding(e.to_string()))?;

    let len = u32::try_from(body.len())
        .map_err(|_| StorageError::Encoding(format!("batch too large: {} bytes", body.len())))?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + body.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Replays a log, returning the records and the length of the valid prefix.
fn replay(contents: &[u8]) -> StorageResult<(BTreeMap<RecordKey, Vec<u8>>, u64)> {
    let mut records = BTreeMap::new();
    let mut offset = 0usize;

    while offset + FRAME_HEADER_SIZE <= contents.len() {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        header.copy_from_slice(&contents[offset..offset + FRAME_HEADER_SIZE]);
        let len = u32::from_le_bytes(header) as usize;

        let body_start = offset + FRAME_HEADER_SIZE;
        let body_end = body_start + len;
        if body_end > contents.len() {
            break;
        }

        let batch: Vec<RecordWrite> = ciborium::from_reader(&contents[body_start..body_end])
            .map_err(|e| {
                StorageError::Corrupted(format!("undecodable frame at offset {offset}: {e}"))
            })?;
        apply_to_map(&mut records, &batch);
        offset = body_end;
    }

    Ok((records, offset as u64))
}
