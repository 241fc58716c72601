//! Temporary on-disk mirrors of the image host's `data/` tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory laid out as `{root}/data/{YYYYMM}/log.txt`.
///
/// The directory is removed when the fixture is dropped.
pub struct MirrorFixture {
    dir: TempDir,
}

impl MirrorFixture {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Root of the mirror, suitable for a mirror-backed index source.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `text` as the index file for `month` (`YYYYMM`).
    pub fn write_month(&self, month: &str, text: &str) -> io::Result<PathBuf> {
        let month_dir = self.dir.path().join("data").join(month);
        fs::create_dir_all(&month_dir)?;
        let path = month_dir.join("log.txt");
        fs::write(&path, text)?;
        Ok(path)
    }
}
