//! JSON-lines journal for grazers, written from a background worker.
//!
//! Two append-only files live in the journal directory:
//! `genome.log` holds one line per epoch mapping each survivor's clan to its
//! flattened genome, `info.log` holds one line per epoch with its length in steps.

use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
};

use grazers_core::{Epoch, FeedForwardBrain, JournalSink, SinkError, SurvivorRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const GENOME_LOG: &str = "genome.log";
pub const INFO_LOG: &str = "info.log";

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("journal encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("journal line {line} of {} is malformed: {source}", .path.display())]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("journal worker error: {0}")]
    Worker(String),
}

/// One line of `genome.log`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenomeEntry {
    pub epoch: u64,
    /// Clan id to hidden-then-output weights.
    pub genomes: BTreeMap<u64, Vec<f32>>,
}

impl GenomeEntry {
    #[must_use]
    pub fn from_survivors(epoch: Epoch, survivors: &[SurvivorRecord]) -> Self {
        Self {
            epoch: epoch.0,
            genomes: survivors
                .iter()
                .map(|record| (record.clan.0, record.weights.clone()))
                .collect(),
        }
    }

    /// Rebuild the brains recorded on this line, skipping malformed genomes.
    pub fn brains(&self) -> impl Iterator<Item = (u64, FeedForwardBrain)> + '_ {
        self.genomes.iter().filter_map(|(clan, weights)| {
            FeedForwardBrain::from_flat(weights)
                .map(|brain| (*clan, brain))
                .map_err(|err| warn!(clan, error = %err, "skipping malformed genome"))
                .ok()
        })
    }
}

/// One line of `info.log`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpochEntry {
    pub epoch: u64,
    pub steps: u64,
}

/// Synchronous writer over the two journal files.
#[derive(Debug)]
pub struct JournalFiles {
    dir: PathBuf,
    genomes: BufWriter<File>,
    info: BufWriter<File>,
}

impl JournalFiles {
    /// Create `dir` if needed and open both logs for appending.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, JournalError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| JournalError::Io {
            path: dir.clone(),
            source,
        })?;
        let genomes = append(&dir.join(GENOME_LOG))?;
        let info = append(&dir.join(INFO_LOG))?;
        Ok(Self { dir, genomes, info })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_genomes(&mut self, entry: &GenomeEntry) -> Result<(), JournalError> {
        write_line(&mut self.genomes, &self.dir.join(GENOME_LOG), entry)
    }

    pub fn write_epoch(&mut self, entry: EpochEntry) -> Result<(), JournalError> {
        write_line(&mut self.info, &self.dir.join(INFO_LOG), &entry)
    }

    pub fn flush(&mut self) -> Result<(), JournalError> {
        self.genomes.flush().map_err(|source| JournalError::Io {
            path: self.dir.join(GENOME_LOG),
            source,
        })?;
        self.info.flush().map_err(|source| JournalError::Io {
            path: self.dir.join(INFO_LOG),
            source,
        })
    }
}

fn append(path: &Path) -> Result<BufWriter<File>, JournalError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(BufWriter::new)
        .map_err(|source| JournalError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn write_line<T: Serialize>(
    writer: &mut BufWriter<File>,
    path: &Path,
    value: &T,
) -> Result<(), JournalError> {
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n").map_err(|source| JournalError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_lines<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, JournalError> {
    let file = File::open(path).map_err(|source| JournalError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| JournalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line).map_err(|source| JournalError::Decode {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Parse every line of `dir/genome.log`.
pub fn read_genome_log(dir: impl AsRef<Path>) -> Result<Vec<GenomeEntry>, JournalError> {
    read_lines(&dir.as_ref().join(GENOME_LOG))
}

/// Parse every line of `dir/info.log`.
pub fn read_info_log(dir: impl AsRef<Path>) -> Result<Vec<EpochEntry>, JournalError> {
    read_lines(&dir.as_ref().join(INFO_LOG))
}

#[derive(Debug)]
enum JournalCommand {
    Genomes(GenomeEntry),
    Epoch(EpochEntry),
    Flush,
    Shutdown,
}

/// Journal sink that hands entries to a background writer thread.
pub struct JournalPipeline {
    tx: mpsc::Sender<JournalCommand>,
    handle: Option<thread::JoinHandle<()>>,
}

impl std::fmt::Debug for JournalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalPipeline")
            .field("running", &self.handle.is_some())
            .finish()
    }
}

impl JournalPipeline {
    /// Open the journal files in `dir` and start the writer thread.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, JournalError> {
        Self::from_files(JournalFiles::open(dir)?)
    }

    fn from_files(mut files: JournalFiles) -> Result<Self, JournalError> {
        let (tx, rx) = mpsc::channel::<JournalCommand>();
        let handle = thread::Builder::new()
            .name("grazers-journal-worker".into())
            .spawn(move || {
                while let Ok(command) = rx.recv() {
                    match command {
                        JournalCommand::Genomes(entry) => {
                            if let Err(err) = files.write_genomes(&entry) {
                                warn!(epoch = entry.epoch, error = %err, "failed to write genomes");
                            }
                        }
                        JournalCommand::Epoch(entry) => {
                            if let Err(err) = files.write_epoch(entry) {
                                warn!(epoch = entry.epoch, error = %err, "failed to write epoch");
                            }
                        }
                        JournalCommand::Flush => {
                            if let Err(err) = files.flush() {
                                warn!(error = %err, "failed to flush journal");
                            }
                        }
                        JournalCommand::Shutdown => break,
                    }
                }
                if let Err(err) = files.flush() {
                    warn!(error = %err, "failed to flush journal on shutdown");
                }
                debug!(dir = %files.dir().display(), "journal worker stopped");
            })
            .map_err(|err| {
                JournalError::Worker(format!("failed to spawn journal worker thread: {err}"))
            })?;

        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    fn send(&self, command: JournalCommand) -> Result<(), SinkError> {
        self.tx
            .send(command)
            .map_err(|_| SinkError::Journal("journal worker channel closed".into()))
    }
}

impl JournalSink for JournalPipeline {
    fn log_genomes(&mut self, epoch: Epoch, survivors: &[SurvivorRecord]) -> Result<(), SinkError> {
        self.send(JournalCommand::Genomes(GenomeEntry::from_survivors(
            epoch, survivors,
        )))?;
        self.send(JournalCommand::Flush)
    }

    fn log_epoch(&mut self, epoch: Epoch, steps: u64) -> Result<(), SinkError> {
        self.send(JournalCommand::Epoch(EpochEntry {
            epoch: epoch.0,
            steps,
        }))?;
        self.send(JournalCommand::Flush)
    }
}

impl Drop for JournalPipeline {
    fn drop(&mut self) {
        let _ = self.tx.send(JournalCommand::Shutdown);
        if let Some(handle) = self.handle.take()
            && let Err(err) = handle.join()
        {
            warn!("journal worker thread panicked: {err:?}");
        }
    }
}
