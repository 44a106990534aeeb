//! JSONL (JSON Lines) game store.
//!
//! One `DayAndGames` per line, as exported from the realtime backend.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError};
use crate::models::DayAndGames;

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append a single record to the file.
    pub fn append(&self, record: &T) -> Result<(), StorageError> {
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", serde_json::to_string(record)?)?;
        writer.flush()?;

        debug!("Appended record to {:?}", self.path);
        Ok(())
    }

    /// Replace the whole file with `records`.
    ///
    /// Each call writes its own uniquely named temp file in the same directory
    /// and renames it over the store, so readers never see a half-written file
    /// and concurrent writers never share a temp path.
    pub fn write_all(&self, records: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            for record in records {
                writeln!(writer, "{}", serde_json::to_string(record)?)?;
            }
            writer.flush()?;
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;

        info!("Wrote {} records to {:?}", records.len(), self.path);
        Ok(records.len())
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read every record; a missing file reads as empty, bad lines are skipped.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Failed to parse line {} in {:?}: {}", idx + 1, self.path, e),
            }
        }

        debug!("Read {} records from {:?}", records.len(), self.path);
        Ok(records)
    }
}

/// Read all stored days.
pub fn read_games(config: &StorageConfig) -> Result<Vec<DayAndGames>, StorageError> {
    JsonlReader::new(config.games_path()).read_all()
}

/// Rewrite the store with `days`, oldest first.
pub fn write_games(config: &StorageConfig, days: &mut [DayAndGames]) -> Result<usize, StorageError> {
    days.sort_by_key(|d| d.day_timestamp);
    JsonlWriter::new(config.games_path()).write_all(days)
}

/// Merge `incoming` into the store; a day already present is replaced.
///
/// Returns the number of days stored afterwards.
pub fn merge_games(config: &StorageConfig, incoming: Vec<DayAndGames>) -> Result<usize, StorageError> {
    let mut by_day: BTreeMap<i64, DayAndGames> = read_games(config)?
        .into_iter()
        .map(|d| (d.day_timestamp, d))
        .collect();
    for day in incoming {
        by_day.insert(day.day_timestamp, day);
    }

    let mut days: Vec<DayAndGames> = by_day.into_values().collect();
    write_games(config, &mut days)
}

/// Append one day to the store.
pub fn append_day(config: &StorageConfig, day: &DayAndGames) -> Result<(), StorageError> {
    JsonlWriter::new(config.games_path()).append(day)
}
