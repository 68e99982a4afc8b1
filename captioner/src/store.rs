//! Persistent transcript cache.
//!
//! A flat mapping from [`VideoId`] to transcript text. The server opens one
//! store at startup, shares it between all request handlers and closes it
//! once on shutdown.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::video_id::VideoId;

/// Storage backend for cached transcripts.
///
/// `put` must not return before the entry is durable. `close` may be called
/// more than once; only the first call has an effect.
pub trait TranscriptStore: Send + Sync {
    fn get(&self, id: &VideoId) -> Result<Option<String>>;

    fn put(&self, id: &VideoId, text: &str) -> Result<()>;

    fn close(&self) -> Result<()>;

    /// Number of cached transcripts.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

struct State<M> {
    entries: M,
    closed: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::Store("store lock poisoned by a panicked writer".into()))
}

/// A store kept in a single JSON file on local disk.
///
/// Every `put` rewrites the whole file: the snapshot goes to `<path>.tmp`,
/// is synced, and is renamed over `<path>`, so a crash leaves either the
/// previous or the new snapshot on disk.
///
/// Snapshot writes are serialized by `writer`; `state` is only held to read
/// or swap in-memory entries, so lookups never wait for disk I/O. An entry
/// becomes visible to `get` only once its snapshot is durable.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<State<BTreeMap<String, String>>>,
    writer: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, loading existing entries.
    ///
    /// A missing file yields an empty store (parent directories are created).
    /// A file that is not a JSON object of strings is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let raw = fs::read(&path)?;
            serde_json::from_slice::<BTreeMap<String, String>>(&raw).map_err(|e| {
                Error::StoreCorrupt {
                    path: path.clone(),
                    reason: e.to_string(),
                }
            })?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::Store(format!(
                        "failed to create store dir {}: {e}",
                        parent.display()
                    ))
                })?;
            }
            BTreeMap::new()
        };

        info!(path = %path.display(), entries = entries.len(), "transcript store opened");

        Ok(Self {
            path,
            state: Mutex::new(State {
                entries,
                closed: false,
            }),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|f| f.to_os_string())
            .unwrap_or_else(|| "transcript_cache.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let tmp_path = self.tmp_path();
        let data = serde_json::to_vec(entries)?;

        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        sync_parent_dir(&self.path);

        debug!(path = %self.path.display(), bytes = data.len(), "store snapshot written");
        Ok(())
    }
}

/// Make the rename itself durable. Not every platform can open a directory,
/// so failures are only logged.
fn sync_parent_dir(path: &Path) {
    #[cfg(unix)]
    {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if let Err(e) = fs::File::open(parent).and_then(|d| d.sync_all()) {
            warn!(dir = %parent.display(), error = %e, "failed to sync store directory");
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

impl TranscriptStore for FileStore {
    fn get(&self, id: &VideoId) -> Result<Option<String>> {
        let state = lock(&self.state)?;
        Ok(state.entries.get(id.as_str()).cloned())
    }

    fn put(&self, id: &VideoId, text: &str) -> Result<()> {
        let _writer = lock(&self.writer)?;

        let mut snapshot = {
            let state = lock(&self.state)?;
            if state.closed {
                return Err(Error::StoreClosed);
            }
            state.entries.clone()
        };
        snapshot.insert(id.as_str().to_string(), text.to_string());

        self.persist(&snapshot).map_err(|e| {
            Error::Store(format!("failed to write {}: {e}", self.path.display()))
        })?;

        // Holding `writer` means no other put changed the entries meanwhile.
        lock(&self.state)?.entries = snapshot;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        // Wait for an in-flight snapshot write before marking the store closed.
        let _writer = lock(&self.writer)?;
        let mut state = lock(&self.state)?;
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        info!(path = %self.path.display(), entries = state.entries.len(), "transcript store closed");
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(lock(&self.state)?.entries.len())
    }
}

/// A non-persistent store, for tests and for running without a cache file.
pub struct MemoryStore {
    state: Mutex<State<HashMap<String, String>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                entries: HashMap::new(),
                closed: false,
            }),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TranscriptStore for MemoryStore {
    fn get(&self, id: &VideoId) -> Result<Option<String>> {
        Ok(lock(&self.state)?.entries.get(id.as_str()).cloned())
    }

    fn put(&self, id: &VideoId, text: &str) -> Result<()> {
        let mut state = lock(&self.state)?;
        if state.closed {
            return Err(Error::StoreClosed);
        }
        state
            .entries
            .insert(id.as_str().to_string(), text.to_string());
        Ok(())
    }

    fn close(&self) -> Result<()> {
        lock(&self.state)?.closed = true;
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(lock(&self.state)?.entries.len())
    }
}
