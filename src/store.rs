//! CSV store: known-name index on load, quoted rows on append

use anyhow::{Context, Result};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{CpuRecord, CSV_HEADERS};

pub const DEFAULT_OUTPUT_FILE: &str = "cpus_detailed.csv";

const NAME_COLUMN: &str = "Name";

/// Names already present in the store. Built once per run and only read after.
#[derive(Debug, Default, Clone)]
pub struct KnownNames {
    names: HashSet<String>,
}

impl KnownNames {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for KnownNames {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Serialize records as fully quoted CSV lines, embedded quotes doubled
pub fn to_csv_lines(records: &[CpuRecord]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV buffer: {}", e))
}

fn header_line() -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV buffer: {}", e))
}

/// Append-only CSV file holding every record collected so far
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_blank(&self) -> bool {
        fs::metadata(&self.path).map(|meta| meta.len() == 0).unwrap_or(true)
    }

    /// Collect known names, creating a header-only store when there is none.
    pub fn load_known_names(&self) -> Result<KnownNames> {
        if self.is_blank() {
            info!(
                "CSV file {} not found, creating new file with headers.",
                self.path.display()
            );
            fs::write(&self.path, header_line()?)
                .with_context(|| format!("Failed to create {}", self.path.display()))?;
            return Ok(KnownNames::default());
        }
        self.read_known_names()
    }

    /// Collect the `Name` column of every readable row without touching the file.
    ///
    /// A missing or zero-length store has no names. Rows the reader rejects are skipped.
    pub fn read_known_names(&self) -> Result<KnownNames> {
        if self.is_blank() {
            return Ok(KnownNames::default());
        }

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read header of {}", self.path.display()))?
            .clone();
        let name_idx = headers.iter().position(|h| h == NAME_COLUMN);

        let mut known = KnownNames::default();
        if let Some(idx) = name_idx {
            for (line, result) in reader.records().enumerate() {
                match result {
                    Ok(row) => {
                        if let Some(name) = row.get(idx).filter(|n| !n.is_empty()) {
                            known.names.insert(name.to_string());
                        }
                    }
                    Err(e) => debug!("Skipping unreadable row {}: {}", line + 2, e),
                }
            }
        } else {
            debug!("{} has no {} column", self.path.display(), NAME_COLUMN);
        }

        info!(
            "Existing CPU names loaded: {} from {}",
            known.len(),
            self.path.display()
        );
        Ok(known)
    }

    /// Append records in one write. Existing rows are never touched.
    pub fn append(&self, records: &[CpuRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {} for append", self.path.display()))?;

        // a hand-edited store may lack the final newline
        let mut lines = Vec::new();
        if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                lines.push(b'\n');
            }
        }
        lines.extend(to_csv_lines(records)?);

        file.write_all(&lines)
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        Ok(records.len())
    }

    /// Delete the store file; returns whether one existed
    pub fn remove(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        Ok(true)
    }
}
