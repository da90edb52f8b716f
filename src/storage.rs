//! Storage layer for td: one YAML file per task under `.td/tasks/`.

use crate::id::{id_order, is_valid_slug};
use crate::store::StoreError;
use crate::types::Task;
use eyre::Result;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Project-local storage directory name.
pub const TD_DIR: &str = ".td";

/// Subdirectory holding the task files.
pub const TASKS_DIR: &str = "tasks";

/// Extension of a task file.
const TASK_EXT: &str = "yaml";

/// A task file that could not be loaded during a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of reading every task file.
#[derive(Debug, Default)]
pub struct Scan {
    /// Loaded tasks in creation order
    pub tasks: Vec<Task>,
    /// Files that were present but unreadable
    pub skipped: Vec<SkippedFile>,
}

/// Handle on a `.td/tasks/` directory.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Create the storage directories under `root` if missing.
    pub fn init(root: &Path) -> Result<Self> {
        let tasks_dir = root.join(TD_DIR).join(TASKS_DIR);
        fs::create_dir_all(&tasks_dir).map_err(|e| storage_error(&tasks_dir, e))?;
        log::debug!("Initialized task directory at {}", tasks_dir.display());
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Open storage under `root`, which must already contain `.td/`.
    pub fn open(root: &Path) -> Result<Self> {
        let td_dir = root.join(TD_DIR);
        if !td_dir.is_dir() {
            return Err(storage_error(
                &td_dir,
                "no .td directory found. Run 'td init' first.",
            ));
        }
        // A bare `.td/` (e.g. created by hand) gets its tasks directory on first open
        let tasks_dir = td_dir.join(TASKS_DIR);
        fs::create_dir_all(&tasks_dir).map_err(|e| storage_error(&tasks_dir, e))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Walk from `start` up through its ancestors to the first directory holding `.td/`.
    /// A relative `start` is resolved against the current directory first.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let start = std::path::absolute(start).ok()?;
        start
            .ancestors()
            .find(|dir| dir.join(TD_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Project root (the directory containing `.td/`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the task files.
    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join(TD_DIR).join(TASKS_DIR)
    }

    /// Path of the file for `id`.
    pub fn task_path(&self, id: &str) -> PathBuf {
        self.tasks_dir().join(format!("{}.{}", id, TASK_EXT))
    }

    /// True if a file for `id` exists. Ids that are not slugs never exist.
    pub fn exists(&self, id: &str) -> bool {
        is_valid_slug(id) && self.task_path(id).is_file()
    }

    /// Read one task. `Ok(None)` if there is no file for `id`.
    pub fn read_task(&self, id: &str) -> Result<Option<Task>> {
        if !is_valid_slug(id) {
            return Ok(None);
        }
        let path = self.task_path(id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(&path, e)),
        };
        let task = parse_task(&path, &content).map_err(|reason| storage_error(&path, reason))?;
        Ok(Some(task))
    }

    /// Write a task atomically: temp file in the same directory, then rename over the target.
    pub fn write_task(&self, task: &Task) -> Result<()> {
        let dir = self.tasks_dir();
        let path = self.task_path(&task.id);

        let yaml = serde_yaml::to_string(task).map_err(|e| storage_error(&path, e))?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| storage_error(&dir, e))?;
        tmp.write_all(yaml.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| storage_error(&path, e))?;
        tmp.persist(&path).map_err(|e| storage_error(&path, e.error))?;

        log::debug!("Wrote task {} to {}", task.id, path.display());
        Ok(())
    }

    /// Remove the file for `id`.
    pub fn remove_task(&self, id: &str) -> Result<()> {
        let path = self.task_path(id);
        fs::remove_file(&path).map_err(|e| storage_error(&path, e))?;
        log::debug!("Removed task {} ({})", id, path.display());
        Ok(())
    }

    /// Read every task file. Unreadable files are reported in `Scan::skipped`
    /// rather than failing the whole scan.
    pub fn scan(&self) -> Result<Scan> {
        let dir = self.tasks_dir();
        let entries = fs::read_dir(&dir).map_err(|e| storage_error(&dir, e))?;

        let mut scan = Scan::default();
        for entry in entries {
            let entry = entry.map_err(|e| storage_error(&dir, e))?;
            let path = entry.path();
            if !is_task_file(&path) {
                continue;
            }

            let loaded = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| parse_task(&path, &content));
            match loaded {
                Ok(task) => scan.tasks.push(task),
                Err(reason) => {
                    log::warn!("Skipping task file {}: {}", path.display(), reason);
                    scan.skipped.push(SkippedFile { path, reason });
                }
            }
        }

        scan.tasks
            .sort_by(|a, b| a.created.cmp(&b.created).then_with(|| id_order(&a.id, &b.id)));
        scan.skipped.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(scan)
    }
}

/// Task files are `<slug>.yaml`; temp files and anything else are ignored.
fn is_task_file(path: &Path) -> bool {
    path.is_file()
        && path.extension().and_then(|e| e.to_str()) == Some(TASK_EXT)
        && path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| !stem.starts_with('.'))
}

/// Parse a task file and check that it names itself correctly.
fn parse_task(path: &Path, content: &str) -> std::result::Result<Task, String> {
    let task: Task = serde_yaml::from_str(content).map_err(|e| format!("invalid task file: {}", e))?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if task.id != stem {
        return Err(format!("file name does not match id '{}'", task.id));
    }
    if !is_valid_slug(&task.id) {
        return Err(format!("invalid id '{}'", task.id));
    }
    Ok(task)
}

fn storage_error(path: &Path, reason: impl std::fmt::Display) -> eyre::Report {
    eyre::eyre!(StoreError::Storage {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    })
}
