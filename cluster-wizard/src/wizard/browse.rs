// Path picking
//
// The wizard asks a `PathPicker` for directory listings; the terminal front end drives
// the actual selection. A picker that cannot list its starting point is "unavailable",
// and the step falls back to "/" instead of failing.

use super::form::FieldId;
use super::steps::WizardError;
use crate::models::files::StagedFile;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseKind {
    File,
    Folder,
}

pub fn browse_kind(field: FieldId) -> BrowseKind {
    match field {
        FieldId::ImportPath => BrowseKind::Folder,
        _ => BrowseKind::File,
    }
}

/// Path fields that take "/" when the picker is unavailable. Fields backed by a staged
/// file are left empty instead.
pub fn falls_back_to_root(field: FieldId) -> bool {
    matches!(
        field,
        FieldId::CredentialsFilePath | FieldId::ImportPath | FieldId::CcfgFilePath
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

pub trait PathPicker {
    /// Entries of `dir`, directories first, each group sorted by name.
    fn entries(&self, dir: &Path) -> Result<Vec<PathEntry>, WizardError>;
}

/// Lists the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPicker;

impl PathPicker for FsPicker {
    fn entries(&self, dir: &Path) -> Result<Vec<PathEntry>, WizardError> {
        let rd = std::fs::read_dir(dir)
            .map_err(|e| WizardError::PickerUnavailable(format!("{}: {}", dir.display(), e)))?;
        let mut out: Vec<PathEntry> = rd
            .filter_map(|e| e.ok())
            .map(|e| {
                let path = e.path();
                PathEntry {
                    name: e.file_name().to_string_lossy().to_string(),
                    is_dir: path.is_dir(),
                    path,
                }
            })
            .collect();
        out.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        Ok(out)
    }
}

/// Start folder for a browse: the field's current value (or its parent), else home.
pub fn start_dir(current: &str) -> PathBuf {
    let p = Path::new(current.trim());
    if !current.trim().is_empty() {
        if p.is_dir() {
            return p.to_path_buf();
        }
        if let Some(parent) = p.parent().filter(|d| d.is_dir()) {
            return parent.to_path_buf();
        }
    }
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

/// Hadoop `*.xml` site files directly inside `dir`.
pub fn site_files_in(dir: &Path) -> std::io::Result<Vec<StagedFile>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_xml = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("xml"))
            .unwrap_or(false);
        if path.is_file() && is_xml {
            files.push(StagedFile::read(&path)?);
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_picker_lists_directories_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("zeta")).expect("mkdir");
        std::fs::write(dir.path().join("alpha.xml"), b"<x/>").expect("write");

        let entries = FsPicker.entries(dir.path()).expect("entries");

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha.xml"]);
        assert!(entries[0].is_dir);
    }

    #[test]
    fn fs_picker_reports_unavailable_for_missing_dirs() {
        let err = FsPicker
            .entries(Path::new("/definitely/not/a/dir"))
            .err()
            .expect("should fail");
        assert!(matches!(err, WizardError::PickerUnavailable(_)), "Got {:?}", err);
    }

    #[test]
    fn site_files_only_picks_xml() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("core-site.xml"), b"<c/>").expect("write");
        std::fs::write(dir.path().join("hdfs-site.XML"), b"<h/>").expect("write");
        std::fs::write(dir.path().join("notes.txt"), b"n").expect("write");

        let files = site_files_in(dir.path()).expect("files");

        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["core-site.xml", "hdfs-site.XML"]);
    }

    #[test]
    fn start_dir_uses_parent_of_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("cluster.ccfg");
        std::fs::write(&file, b"x").expect("write");

        assert_eq!(start_dir(&file.to_string_lossy()), dir.path());
        assert_eq!(start_dir(&dir.path().to_string_lossy()), dir.path());
    }
}
