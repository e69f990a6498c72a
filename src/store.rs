use crate::{
    error::{
        GachaError,
        Result,
    },
    state::PlayerState,
};
use std::{
    ffi::OsString,
    fs,
    io::{
        ErrorKind,
        Write,
    },
    path::{
        Path,
        PathBuf,
    },
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
    },
};
use tracing::{
    debug,
    warn,
};

pub const DEFAULT_SAVE_FILE: &str = "player_data.json";

pub trait StateStore {
    /// `Ok(None)` when no record has been saved yet.
    fn load(&self) -> Result<Option<PlayerState>>;

    /// Replaces the whole record.
    fn save(&mut self, state: &PlayerState) -> Result<()>;
}

impl<T: StateStore + ?Sized> StateStore for Box<T> {
    fn load(&self) -> Result<Option<PlayerState>> {
        (**self).load()
    }

    fn save(&mut self, state: &PlayerState) -> Result<()> {
        (**self).save(state)
    }
}

/// Pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<PlayerState>> {
        read_record(&self.path)
    }

    fn save(&mut self, state: &PlayerState) -> Result<()> {
        let json = encode(state)?;
        let tmp_path = self.temp_path();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| GachaError::io(parent, e))?;
        }
        if let Err(e) = replace_with(&tmp_path, &self.path, &json) {
            warn!(path = %self.path.display(), error = %e, "failed to save player record");
            if tmp_path.is_file() {
                let _ = fs::remove_file(&tmp_path);
            }
            return Err(e);
        }
        debug!(path = %self.path.display(), bytes = json.len(), "saved player record");
        Ok(())
    }
}

fn replace_with(tmp_path: &Path, path: &Path, json: &[u8]) -> Result<()> {
    let mut file = fs::File::create(tmp_path).map_err(|e| GachaError::io(tmp_path, e))?;
    file.write_all(json).map_err(|e| GachaError::io(tmp_path, e))?;
    file.sync_all().map_err(|e| GachaError::io(tmp_path, e))?;
    drop(file);
    fs::rename(tmp_path, path).map_err(|e| GachaError::io(path, e))
}

fn read_record(path: &Path) -> Result<Option<PlayerState>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no player record yet");
            return Ok(None);
        }
        Err(e) => return Err(GachaError::io(path, e)),
    };
    let state = decode(&data).map_err(|reason| {
        warn!(path = %path.display(), %reason, "player record is corrupt");
        GachaError::corrupt(path, reason)
    })?;
    debug!(path = %path.display(), "loaded player record");
    Ok(Some(state))
}

pub fn encode(state: &PlayerState) -> Result<Vec<u8>> {
    let mut json = serde_json::to_vec_pretty(state).map_err(GachaError::Serialize)?;
    json.push(b'\n');
    Ok(json)
}

fn decode(data: &[u8]) -> std::result::Result<PlayerState, String> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err("record is empty".to_string());
    }
    let state: PlayerState = serde_json::from_slice(data).map_err(|e| e.to_string())?;
    state.validate()?;
    Ok(state)
}

/// Keeps the record in memory. Clones share the same record, so a test can
/// hold one handle while a session owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    record: Arc<Mutex<Option<PlayerState>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PlayerState) -> Self {
        Self {
            record: Arc::new(Mutex::new(Some(state))),
            saves: Arc::new(Mutex::new(0)),
        }
    }

    pub fn current(&self) -> Option<PlayerState> {
        lock(&self.record).clone()
    }

    /// Number of completed saves.
    pub fn saves(&self) -> usize {
        *lock(&self.saves)
    }
}

// Every write replaces the whole value, so a panic elsewhere while the lock
// was held cannot leave it half-updated.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<PlayerState>> {
        Ok(self.current())
    }

    fn save(&mut self, state: &PlayerState) -> Result<()> {
        *lock(&self.record) = Some(state.clone());
        *lock(&self.saves) += 1;
        Ok(())
    }
}
