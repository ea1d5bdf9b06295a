use super::poll::PollId;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Which poll revisions the user has already looked at. A revision is the
/// poll's `updated_at` string, compared for equality only; marking a newer
/// revision replaces the older one.
pub trait SeenUpdateStore {
    fn is_seen(&self, poll: PollId, updated_at: &str) -> bool;
    fn mark_seen(&mut self, poll: PollId, updated_at: &str);
}

/// One store shared by every view, so reading a poll in one view clears its
/// badge in the others.
pub type SharedSeenStore = Arc<Mutex<dyn SeenUpdateStore + Send>>;

pub fn shared<S>(store: S) -> SharedSeenStore
where
    S: SeenUpdateStore + Send + 'static,
{
    Arc::new(Mutex::new(store))
}

/// A poisoned store degrades to "nothing seen"; badges reappear but nothing
/// breaks.
pub fn is_seen(store: &SharedSeenStore, poll: PollId, updated_at: &str) -> bool {
    store
        .lock()
        .map(|store| store.is_seen(poll, updated_at))
        .unwrap_or(false)
}

pub fn mark_seen(store: &SharedSeenStore, poll: PollId, updated_at: &str) {
    if let Ok(mut store) = store.lock() {
        store.mark_seen(poll, updated_at);
    }
}

#[derive(Default)]
pub struct InMemorySeenStore {
    seen: HashMap<PollId, String>,
}

impl InMemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeenUpdateStore for InMemorySeenStore {
    fn is_seen(&self, poll: PollId, updated_at: &str) -> bool {
        self.seen.get(&poll).map(String::as_str) == Some(updated_at)
    }

    fn mark_seen(&mut self, poll: PollId, updated_at: &str) {
        self.seen.insert(poll, updated_at.to_owned());
    }
}

/// Seen markers persisted as one JSON object in one file. The file is read
/// once when the store opens; every new marker is written straight through.
/// Persistence failures are swallowed: an unreadable or corrupt file means
/// nothing has been seen, and a failed write costs a reappearing badge.
pub struct FileSeenStore {
    path: PathBuf,
    seen: HashMap<PollId, String>,
}

impl FileSeenStore {
    pub fn open(path: PathBuf) -> Self {
        let seen = load_seen(&path);
        Self { path, seen }
    }

    /// `seen_updates.json` under the platform data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("pollhub").join("seen_updates.json"))
    }

    fn persist(&self) {
        let map: HashMap<i64, &String> = self.seen.iter().map(|(id, stamp)| (id.0, stamp)).collect();
        let json = match serde_json::to_string(&map) {
            Ok(json) => json,
            Err(err) => {
                debug!("Could not encode seen updates: {}", err);
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                debug!("Could not create data directory {:?}: {}", parent, err);
                return;
            }
        }
        if let Err(err) = fs::write(&self.path, json) {
            debug!("Could not persist seen updates to {:?}: {}", self.path, err);
        }
    }
}

fn load_seen(path: &Path) -> HashMap<PollId, String> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            debug!("No seen-update file at {:?}: {}", path, err);
            return HashMap::new();
        }
    };
    match serde_json::from_str::<HashMap<i64, String>>(&text) {
        Ok(map) => map
            .into_iter()
            .map(|(id, stamp)| (PollId(id), stamp))
            .collect(),
        Err(err) => {
            debug!("Ignoring unreadable seen-update file {:?}: {}", path, err);
            HashMap::new()
        }
    }
}

impl SeenUpdateStore for FileSeenStore {
    fn is_seen(&self, poll: PollId, updated_at: &str) -> bool {
        self.seen.get(&poll).map(String::as_str) == Some(updated_at)
    }

    fn mark_seen(&mut self, poll: PollId, updated_at: &str) {
        if self.is_seen(poll, updated_at) {
            return;
        }
        self.seen.insert(poll, updated_at.to_owned());
        self.persist();
    }
}
