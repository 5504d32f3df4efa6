//! Persistent client-side state: session token and guest cart.
//!
//! The credential store is the only durable state the client owns: one
//! opaque token string and one guest-cart map. There is no logic here
//! beyond get/set/clear - token validation and cart semantics live in
//! the session coordinator and the guest cart store.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use autonorte_core::ProductId;

/// Guest cart contents: product id -> quantity, in insertion order.
///
/// Insertion order matters: migration into the server cart sends items
/// in the order they were added.
pub type GuestCartMap = IndexMap<ProductId, u32>;

/// Storage for the session token and the guest cart.
///
/// Implementations must tolerate concurrent access from one process;
/// each method is a single atomic read or write of the underlying
/// storage.
pub trait CredentialStore: Send + Sync {
    /// Read the stored token, if any. No validation is applied here.
    fn token(&self) -> io::Result<Option<String>>;

    /// Replace the stored token.
    fn set_token(&self, token: &str) -> io::Result<()>;

    /// Remove the stored token.
    fn clear_token(&self) -> io::Result<()>;

    /// Read the guest cart map.
    fn guest_cart(&self) -> io::Result<GuestCartMap>;

    /// Replace the guest cart map in one write.
    fn set_guest_cart(&self, cart: &GuestCartMap) -> io::Result<()>;

    /// Remove the guest cart.
    fn clear_guest_cart(&self) -> io::Result<()>;

    /// Remove everything (logout).
    fn clear_all(&self) -> io::Result<()>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Volatile store used by tests and by sessions with no state file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<PersistedState>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut PersistedState) -> T) -> T {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state)
    }
}

impl CredentialStore for MemoryStore {
    fn token(&self) -> io::Result<Option<String>> {
        Ok(self.with_state(|s| s.token.clone()))
    }

    fn set_token(&self, token: &str) -> io::Result<()> {
        self.with_state(|s| s.token = Some(token.to_string()));
        Ok(())
    }

    fn clear_token(&self) -> io::Result<()> {
        self.with_state(|s| s.token = None);
        Ok(())
    }

    fn guest_cart(&self) -> io::Result<GuestCartMap> {
        Ok(self.with_state(|s| s.guest_cart.clone()))
    }

    fn set_guest_cart(&self, cart: &GuestCartMap) -> io::Result<()> {
        self.with_state(|s| s.guest_cart = cart.clone());
        Ok(())
    }

    fn clear_guest_cart(&self) -> io::Result<()> {
        self.with_state(|s| s.guest_cart.clear());
        Ok(())
    }

    fn clear_all(&self) -> io::Result<()> {
        self.with_state(|s| *s = PersistedState::default());
        Ok(())
    }
}

// =============================================================================
// JSON file store
// =============================================================================

/// What gets written to disk.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    guest_cart: GuestCartMap,
}

/// File-backed store persisting state as one JSON document.
///
/// Every mutation rewrites the whole file through a sibling temp file
/// and rename, so readers never observe a half-written document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store backed by the given path. The file is created on
    /// first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> io::Result<PersistedState> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(PersistedState::default()),
            Err(e) => Err(e),
        }
    }

    fn save(&self, state: &PersistedState) -> io::Result<()> {
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let tmp = temp_sibling(&self.path);
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)
    }

    fn update(&self, f: impl FnOnce(&mut PersistedState)) -> io::Result<()> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut state = self.load()?;
        f(&mut state);
        self.save(&state)
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map_or_else(
        || std::ffi::OsString::from("state"),
        std::ffi::OsStr::to_os_string,
    );
    name.push(".tmp");
    path.with_file_name(name)
}

impl CredentialStore for JsonFileStore {
    fn token(&self) -> io::Result<Option<String>> {
        Ok(self.load()?.token)
    }

    fn set_token(&self, token: &str) -> io::Result<()> {
        self.update(|s| s.token = Some(token.to_string()))
    }

    fn clear_token(&self) -> io::Result<()> {
        self.update(|s| s.token = None)
    }

    fn guest_cart(&self) -> io::Result<GuestCartMap> {
        Ok(self.load()?.guest_cart)
    }

    fn set_guest_cart(&self, cart: &GuestCartMap) -> io::Result<()> {
        self.update(|s| s.guest_cart = cart.clone())
    }

    fn clear_guest_cart(&self) -> io::Result<()> {
        self.update(|s| s.guest_cart.clear())
    }

    fn clear_all(&self) -> io::Result<()> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
