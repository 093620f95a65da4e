// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{BlogData, StoreError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Persistence backend for the whole data set.
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<BlogData, StoreError>;
    fn save(&self, data: &BlogData) -> Result<(), StoreError>;
}

pub struct FileSnapshotStore {
    data_file: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(data_file: PathBuf) -> Result<Self, StoreError> {
        if data_file.as_os_str().is_empty() {
            return Err(StoreError::ConfigurationError(
                "Data file path is empty".to_string(),
            ));
        }

        Ok(Self { data_file })
    }

    pub fn path(&self) -> &Path {
        &self.data_file
    }

    fn parse(content: &str) -> Result<BlogData, StoreError> {
        if content.trim().is_empty() {
            return Ok(BlogData::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| StoreError::ParseError(format!("Failed to parse data file: {}", e)))
    }

    fn write_data_file(&self, content: &str) -> Result<(), StoreError> {
        let parent = self.data_file.parent().ok_or_else(|| {
            StoreError::FileError("Data file path has no parent directory".to_string())
        })?;
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::FileError(format!("Failed to create data directory: {}", e))
            })?;
        }
        let file_name = self
            .data_file
            .file_name()
            .ok_or_else(|| StoreError::FileError("Data file path has no file name".to_string()))?;
        let (mut file, temp_path) = create_temp_file(parent, file_name)?;

        if let Err(err) = file.write_all(content.as_bytes()) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(StoreError::FileError(format!(
                "Failed to write data temp file: {}",
                err
            )));
        }
        if let Err(err) = file.sync_all() {
            let _ = std::fs::remove_file(&temp_path);
            return Err(StoreError::FileError(format!(
                "Failed to sync data temp file: {}",
                err
            )));
        }

        if let Err(err) = std::fs::rename(&temp_path, &self.data_file) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(StoreError::FileError(format!(
                "Failed to replace data file: {}",
                err
            )));
        }

        #[cfg(unix)]
        {
            if let Err(err) = sync_parent_dir(parent) {
                log::warn!("Data directory sync failed: {}", err);
            }
        }

        Ok(())
    }
}

fn create_temp_file(
    dir: &Path,
    file_name: &std::ffi::OsStr,
) -> Result<(std::fs::File, PathBuf), StoreError> {
    use std::fs::OpenOptions;
    const MAX_ATTEMPTS: u32 = 100;
    let base = file_name.to_string_lossy();
    for attempt in 0..MAX_ATTEMPTS {
        let candidate = dir.join(format!(".{}.tmp.{}.{}", base, std::process::id(), attempt));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((file, candidate)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(StoreError::FileError(format!(
                    "Failed to create temp data file: {}",
                    err
                )));
            }
        }
    }
    Err(StoreError::FileError(
        "Failed to create temp data file after repeated attempts".to_string(),
    ))
}

#[cfg(unix)]
fn sync_parent_dir(parent: &Path) -> Result<(), StoreError> {
    let dir = std::fs::File::open(parent).map_err(|err| {
        StoreError::FileError(format!("Failed to open data directory for sync: {}", err))
    })?;
    dir.sync_all()
        .map_err(|err| StoreError::FileError(format!("Failed to sync data directory: {}", err)))
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<BlogData, StoreError> {
        match std::fs::read_to_string(&self.data_file) {
            Ok(content) => Self::parse(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "Data file {} does not exist yet; starting empty",
                    self.data_file.display()
                );
                Ok(BlogData::default())
            }
            Err(err) => Err(StoreError::FileError(format!(
                "Failed to read data file: {}",
                err
            ))),
        }
    }

    fn save(&self, data: &BlogData) -> Result<(), StoreError> {
        let content = serde_yaml::to_string(data)
            .map_err(|e| StoreError::ParseError(format!("Failed to serialize data: {}", e)))?;
        self.write_data_file(&content)
    }
}

/// Keeps the snapshot in process memory only; contents are lost on restart.
pub struct MemorySnapshotStore {
    data: Arc<RwLock<BlogData>>,
}

impl MemorySnapshotStore {
    pub fn new(initial: BlogData) -> Self {
        Self {
            data: Arc::new(RwLock::new(initial)),
        }
    }
}

impl Default for MemorySnapshotStore {
    fn default() -> Self {
        Self::new(BlogData::default())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<BlogData, StoreError> {
        match self.data.read() {
            Ok(guard) => Ok(guard.clone()),
            Err(poisoned) => {
                log::error!("MemorySnapshotStore lock poisoned on read; recovering");
                Ok(poisoned.into_inner().clone())
            }
        }
    }

    fn save(&self, data: &BlogData) -> Result<(), StoreError> {
        match self.data.write() {
            Ok(mut guard) => {
                *guard = data.clone();
                Ok(())
            }
            Err(poisoned) => {
                log::error!("MemorySnapshotStore lock poisoned on write; recovering");
                let mut guard = poisoned.into_inner();
                *guard = data.clone();
                Ok(())
            }
        }
    }
}
