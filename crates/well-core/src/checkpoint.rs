//! Checkpoint diario del conjunto vivo de reportes.
//!
//! Es una foto completa `{date, records}` que se sobrescribe en cada
//! recálculo. Al arrancar sólo se usa si su fecha es la de hoy.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use well_domain::OilRecord;

use crate::errors::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointData {
    pub date: NaiveDate,
    pub records: Vec<OilRecord>,
}

pub trait Checkpoint: Send + Sync {
    fn save(&self, date: NaiveDate, records: &[OilRecord]) -> Result<(), CoreError>;
    /// Registros guardados para `today`; `None` si no hay foto o es de otro día.
    fn load(&self, today: NaiveDate) -> Result<Option<Vec<OilRecord>>, CoreError>;
}

/// Checkpoint en un archivo JSON, escrito vía archivo temporal + rename.
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Checkpoint for FileCheckpoint {
    fn save(&self, date: NaiveDate, records: &[OilRecord]) -> Result<(), CoreError> {
        let data = CheckpointData { date, records: records.to_vec() };
        let bytes = serde_json::to_vec(&data)?;
        let tmp = self.tmp_path();
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(&bytes)?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!("checkpoint.saved path={} date={} records={}", self.path.display(), date, records.len());
        Ok(())
    }

    fn load(&self, today: NaiveDate) -> Result<Option<Vec<OilRecord>>, CoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let data: CheckpointData = serde_json::from_slice(&bytes)?;
        if data.date != today {
            info!("checkpoint.stale path={} stored={} today={}", self.path.display(), data.date, today);
            return Ok(None);
        }
        Ok(Some(data.records))
    }
}

/// Checkpoint en memoria (tests y ejecuciones efímeras).
#[derive(Default)]
pub struct InMemoryCheckpoint {
    inner: Mutex<Option<CheckpointData>>,
}

impl InMemoryCheckpoint {
    pub fn last(&self) -> Option<CheckpointData> {
        self.inner.lock().clone()
    }
}

impl Checkpoint for InMemoryCheckpoint {
    fn save(&self, date: NaiveDate, records: &[OilRecord]) -> Result<(), CoreError> {
        *self.inner.lock() = Some(CheckpointData { date, records: records.to_vec() });
        Ok(())
    }

    fn load(&self, today: NaiveDate) -> Result<Option<Vec<OilRecord>>, CoreError> {
        Ok(self.inner.lock().as_ref().filter(|d| d.date == today).map(|d| d.records.clone()))
    }
}
