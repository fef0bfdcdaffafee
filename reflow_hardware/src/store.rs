//! One-byte profile selection persisted to a file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::{fs, io};

use reflow_traits::ProfileStore;

use crate::error::HwError;

#[derive(Debug, Clone)]
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileStore for FileProfileStore {
    /// A missing or empty file reads as "never written".
    fn load(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(bytes.first().copied()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Box::new(HwError::Io(e))),
        }
    }

    fn save(&mut self, value: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(HwError::from)?;
        }
        write_atomic(&self.path, &[value]).map_err(HwError::from)?;
        tracing::debug!(path = %self.path.display(), value, "profile saved");
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}
