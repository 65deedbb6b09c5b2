// Staged upload files
//
// Files picked on one step (site files, keytabs, a driver) are submitted by a later step.
// They live on the wizard context, never in process-wide state, and every multipart
// submission drains them so nothing leaks into the next run.

use chrono::{DateTime, Utc};
use std::path::Path;

/// A file picked by the user, held in memory until submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Epoch millis; `None` when the platform could not report it.
    pub last_modified: Option<i64>,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, last_modified: Option<i64>) -> Self {
        Self {
            name: name.into(),
            bytes,
            last_modified,
        }
    }

    /// Read a file from disk, keeping only its base name.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let last_modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(|t| DateTime::<Utc>::from(t).timestamp_millis());
        Ok(Self::new(name, bytes, last_modified))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileSlot {
    SiteFiles,
    KeytabAuth,
    KeytabImp,
    Driver,
}

#[derive(Debug, Clone, Default)]
pub struct StagedFiles {
    site_files: Vec<StagedFile>,
    keytab_auth: Option<StagedFile>,
    keytab_imp: Option<StagedFile>,
    driver: Option<StagedFile>,
}

impl StagedFiles {
    pub fn set_files(&mut self, files: Vec<StagedFile>) {
        self.site_files = files;
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.site_files
    }

    pub fn set_keytab_auth(&mut self, file: Option<StagedFile>) {
        self.keytab_auth = file;
    }

    pub fn keytab_auth(&self) -> Option<&StagedFile> {
        self.keytab_auth.as_ref()
    }

    pub fn set_keytab_imp(&mut self, file: Option<StagedFile>) {
        self.keytab_imp = file;
    }

    pub fn keytab_imp(&self) -> Option<&StagedFile> {
        self.keytab_imp.as_ref()
    }

    pub fn set_driver(&mut self, file: Option<StagedFile>) {
        self.driver = file;
    }

    pub fn driver(&self) -> Option<&StagedFile> {
        self.driver.as_ref()
    }

    pub fn take_files(&mut self) -> Vec<StagedFile> {
        std::mem::take(&mut self.site_files)
    }

    pub fn take_keytab_auth(&mut self) -> Option<StagedFile> {
        self.keytab_auth.take()
    }

    pub fn take_keytab_imp(&mut self) -> Option<StagedFile> {
        self.keytab_imp.take()
    }

    pub fn take_driver(&mut self) -> Option<StagedFile> {
        self.driver.take()
    }

    pub fn clear(&mut self, slot: FileSlot) {
        match slot {
            FileSlot::SiteFiles => self.site_files.clear(),
            FileSlot::KeytabAuth => self.keytab_auth = None,
            FileSlot::KeytabImp => self.keytab_imp = None,
            FileSlot::Driver => self.driver = None,
        }
    }

    pub fn is_staged(&self, slot: FileSlot) -> bool {
        match slot {
            FileSlot::SiteFiles => !self.site_files.is_empty(),
            FileSlot::KeytabAuth => self.keytab_auth.is_some(),
            FileSlot::KeytabImp => self.keytab_imp.is_some(),
            FileSlot::Driver => self.driver.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.site_files.is_empty()
            && self.keytab_auth.is_none()
            && self.keytab_imp.is_none()
            && self.driver.is_none()
    }

    /// Drain everything a cluster submission carries.
    pub fn take_upload(&mut self) -> Upload {
        Upload {
            files: self.take_files(),
            keytab_auth: self.take_keytab_auth(),
            keytab_imp: self.take_keytab_imp(),
        }
    }
}

/// Files drained from the staging set for one multipart submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Upload {
    pub files: Vec<StagedFile>,
    pub keytab_auth: Option<StagedFile>,
    pub keytab_imp: Option<StagedFile>,
}

impl Upload {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.keytab_auth.is_none() && self.keytab_imp.is_none()
    }
}
