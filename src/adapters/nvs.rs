//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] for the IR blaster.
//!
//! - The keymap document and the config blob share the `irblaster`
//!   namespace under different keys.
//! - Config validation: every field is range-checked before persistence.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//!
//! Every blob goes through [`NvsAdapter::put`] / [`NvsAdapter::get`], which
//! are the only platform-specific pieces.  Off-target they are backed by a
//! map keyed on `(namespace, key)`.

use crate::adapters::utils::is_valid_hostname;
use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::app::service::{DOCUMENT_KEY, DOCUMENT_NAMESPACE, MAX_DOCUMENT_LEN};
use crate::config::SystemConfig;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::{cell::RefCell, collections::HashMap};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = DOCUMENT_NAMESPACE;
const CONFIG_KEY: &str = "syscfg";
/// Postcard-encoded [`SystemConfig`] is well below this.
const CONFIG_BLOB_MAX: usize = 128;

/// NVS caps namespace and key names at 15 bytes.
const NVS_NAME_MAX: usize = 15;

/// NUL-terminated copy of an NVS name, truncated to [`NVS_NAME_MAX`].
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn c_name(name: &str) -> [u8; NVS_NAME_MAX + 1] {
    let mut buf = [0u8; NVS_NAME_MAX + 1];
    let len = name.len().min(NVS_NAME_MAX);
    buf[..len].copy_from_slice(&name.as_bytes()[..len]);
    buf
}

// ── ESP-IDF handle ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const OK: i32 = ESP_OK as i32;

/// An open namespace, closed on drop.
#[cfg(target_os = "espidf")]
struct Namespace(nvs_handle_t);

#[cfg(target_os = "espidf")]
impl Namespace {
    fn open(namespace: &str, writable: bool) -> Result<Self, i32> {
        let name = c_name(namespace);
        let mode = if writable {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: `name` is NUL-terminated and outlives the call.
        match unsafe { nvs_open(name.as_ptr().cast(), mode, &mut handle) } {
            OK => Ok(Self(handle)),
            rc => Err(rc),
        }
    }

    fn commit(&self) -> Result<(), i32> {
        // SAFETY: the handle is open for as long as `self` lives.
        match unsafe { nvs_commit(self.0) } {
            OK => Ok(()),
            rc => Err(rc),
        }
    }
}

#[cfg(target_os = "espidf")]
impl Drop for Namespace {
    fn drop(&mut self) {
        // SAFETY: opened in `open`, closed exactly once here.
        unsafe { nvs_close(self.0) }
    }
}

/// Map an ESP-IDF NVS return code onto the storage port's error.
#[cfg(target_os = "espidf")]
fn storage_error(rc: i32) -> StorageError {
    if rc == ESP_ERR_NVS_NOT_FOUND as i32 {
        StorageError::NotFound
    } else if rc == ESP_ERR_NVS_INVALID_LENGTH as i32 || rc == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
        StorageError::Full
    } else {
        StorageError::IoError
    }
}

// ── Adapter ───────────────────────────────────────────────────

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    blobs: RefCell<HashMap<(String, String), Vec<u8>>>,
}

impl NvsAdapter {
    /// Bring up the default NVS partition.  A full partition or one
    /// written by a newer IDF is erased first.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, StorageError> {
        // SAFETY: called once from the main task before any other NVS use.
        let mut rc = unsafe { nvs_flash_init() };
        if rc == ESP_ERR_NVS_NO_FREE_PAGES as i32 || rc == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
            warn!("nvs: partition unusable ({}), erasing", rc);
            if unsafe { nvs_flash_erase() } != OK {
                return Err(StorageError::IoError);
            }
            rc = unsafe { nvs_flash_init() };
        }
        if rc != OK {
            return Err(StorageError::IoError);
        }
        info!("nvs: partition ready");
        Ok(Self {})
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, StorageError> {
        info!("nvs: in-memory backend");
        Ok(Self {
            blobs: RefCell::new(HashMap::new()),
        })
    }

    #[cfg(target_os = "espidf")]
    fn get(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let ns = Namespace::open(namespace, false).map_err(storage_error)?;
        let key = c_name(key);
        let mut len = buf.len();
        // SAFETY: `len` bounds how much of `buf` NVS may fill.
        let rc = unsafe { nvs_get_blob(ns.0, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut len) };
        if rc != OK {
            return Err(storage_error(rc));
        }
        Ok(len)
    }

    #[cfg(not(target_os = "espidf"))]
    fn get(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let blobs = self.blobs.borrow();
        let blob = blobs
            .get(&(namespace.to_owned(), key.to_owned()))
            .ok_or(StorageError::NotFound)?;
        let dst = buf.get_mut(..blob.len()).ok_or(StorageError::Full)?;
        dst.copy_from_slice(blob);
        Ok(blob.len())
    }

    #[cfg(target_os = "espidf")]
    fn put(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let ns = Namespace::open(namespace, true).map_err(storage_error)?;
        let key = c_name(key);
        // SAFETY: `key` is NUL-terminated; `data` is valid for the call.
        let rc = unsafe { nvs_set_blob(ns.0, key.as_ptr().cast(), data.as_ptr().cast(), data.len()) };
        if rc != OK {
            return Err(storage_error(rc));
        }
        ns.commit().map_err(storage_error)
    }

    #[cfg(not(target_os = "espidf"))]
    fn put(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.blobs
            .borrow_mut()
            .insert((namespace.to_owned(), key.to_owned()), data.to_vec());
        Ok(())
    }
}

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    let checks: [(bool, &'static str); 7] = [
        (
            is_valid_hostname(&cfg.hostname),
            "hostname must be 1-32 chars of [A-Za-z0-9-]",
        ),
        (cfg.http_port != 0, "http_port must be non-zero"),
        (
            (1_000..=120_000).contains(&cfg.startup_timeout_ms),
            "startup_timeout_ms must be 1000-120000",
        ),
        (
            (50..=2_000).contains(&cfg.connect_poll_ms),
            "connect_poll_ms must be 50-2000",
        ),
        (
            cfg.connect_poll_ms < cfg.startup_timeout_ms,
            "connect_poll_ms must be < startup_timeout_ms",
        ),
        (cfg.debounce_ms <= 1_000, "debounce_ms must be 0-1000"),
        (
            (1..=1_000).contains(&cfg.idle_poll_ms),
            "idle_poll_ms must be 1-1000",
        ),
    ];
    match checks.iter().find(|(ok, _)| !ok) {
        Some(&(_, msg)) => Err(ConfigError::ValidationFailed(msg)),
        None => Ok(()),
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; CONFIG_BLOB_MAX];
        let len = match self.get(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => {
                info!("nvs: no stored config, using defaults");
                return Ok(SystemConfig::default());
            }
            Err(_) => return Err(ConfigError::IoError),
        };

        let cfg: SystemConfig = postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
        validate_config(&cfg)?;
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.put(CONFIG_NAMESPACE, CONFIG_KEY, &bytes).map_err(|e| {
            warn!("nvs: config not saved ({})", e);
            ConfigError::IoError
        })?;
        info!("nvs: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.get(namespace, key, buf).inspect_err(|e| {
            if *e != StorageError::NotFound {
                warn!("nvs: read {}/{} failed ({})", namespace, key, e);
            }
        })
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if (namespace, key) == (DOCUMENT_NAMESPACE, DOCUMENT_KEY) && data.len() > MAX_DOCUMENT_LEN {
            return Err(StorageError::Full);
        }
        self.put(namespace, key, data)
            .inspect_err(|e| warn!("nvs: write {}/{} failed ({})", namespace, key, e))
    }
}
