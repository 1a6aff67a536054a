use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

/// Values the app keeps on the device between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey {
    Username,
    Profile,
    Illnesses,
    Allergies,
}

impl CacheKey {
    pub const ALL: [CacheKey; 4] = [
        CacheKey::Username,
        CacheKey::Profile,
        CacheKey::Illnesses,
        CacheKey::Allergies,
    ];

    fn file_name(self) -> &'static str {
        match self {
            CacheKey::Username => "username.json",
            CacheKey::Profile => "profile.json",
            CacheKey::Illnesses => "illnesses.json",
            CacheKey::Allergies => "allergies.json",
        }
    }
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct DeviceCache {
    dir: PathBuf,
}

impl DeviceCache {
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("create cache dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// `<local data dir>/nutriguard`.
    pub fn open_default() -> anyhow::Result<Self> {
        let base = dirs::data_local_dir().context("no local data directory on this platform")?;
        Self::open(base.join("nutriguard"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// A missing file is `None`; an unreadable one is dropped and also `None`.
    pub fn get<T: DeserializeOwned>(&self, key: CacheKey) -> anyhow::Result<Option<T>> {
        let path = self.path(key);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "discarding corrupt cache entry");
                self.remove(key)?;
                Ok(None)
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: CacheKey, value: &T) -> anyhow::Result<()> {
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(value).context("serialize cache entry")?;
        fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("replace {}", path.display()))?;
        Ok(())
    }

    /// Returns whether an entry existed.
    pub fn remove(&self, key: CacheKey) -> anyhow::Result<bool> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }

    /// Forget everything, e.g. on logout.
    pub fn clear(&self) -> anyhow::Result<()> {
        for key in CacheKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}
