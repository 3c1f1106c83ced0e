//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] for the feeder.
//!
//! - Config validation: all fields are range-checked before persistence.
//! - Namespace isolation: schedules, the portion counter and the config
//!   each live in their own namespace.
//! - Writes are staged and become durable on [`StoragePort::commit`].
//!   On ESP-IDF the first write to a namespace opens a read-write handle
//!   that stays open; `commit` runs `nvs_commit` on that same handle and
//!   closes it.

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::FeederConfig;
use log::info;
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use log::{debug, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "petfeeder";
#[cfg(not(target_os = "espidf"))]
const CONFIG_KEY: &str = "feedcfg";

#[allow(dead_code)]
const MAX_BLOB_SIZE: usize = 512;

/// Baud rates accepted for the MCU link.
pub const STANDARD_BAUD_RATES: [u32; 8] = [
    1200, 2400, 4800, 9600, 19_200, 38_400, 57_600, 115_200,
];

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
    #[cfg(not(target_os = "espidf"))]
    commits: std::cell::Cell<usize>,
    /// Uncommitted write count per namespace.
    #[cfg(not(target_os = "espidf"))]
    staged: HashMap<String, usize>,
    /// Open read-write handle per namespace with uncommitted writes.
    #[cfg(target_os = "espidf")]
    staged: HashMap<String, nvs_handle_t>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably. On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
            #[cfg(not(target_os = "espidf"))]
            commits: std::cell::Cell::new(0),
            staged: HashMap::new(),
        })
    }

    /// Number of `commit` calls seen by the simulation backend.
    #[cfg(not(target_os = "espidf"))]
    pub fn commit_count(&self) -> usize {
        self.commits.get()
    }

    /// Writes to `namespace` not yet covered by a commit.
    #[cfg(not(target_os = "espidf"))]
    pub fn pending_writes(&self, namespace: &str) -> usize {
        self.staged.get(namespace).copied().unwrap_or(0)
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NVS names are NUL-terminated C strings of at most 15 characters.
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns_buf = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    /// The read-write handle holding staged writes for `namespace`,
    /// opened on first use and kept until [`StoragePort::commit`].
    #[cfg(target_os = "espidf")]
    fn staged_handle(&mut self, namespace: &str) -> Result<nvs_handle_t, i32> {
        if let Some(&handle) = self.staged.get(namespace) {
            return Ok(handle);
        }
        let ns_buf = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let ret = unsafe {
            nvs_open(
                ns_buf.as_ptr() as *const _,
                nvs_open_mode_t_NVS_READWRITE,
                &mut handle,
            )
        };
        if ret != ESP_OK {
            return Err(ret);
        }
        self.staged.insert(namespace.to_owned(), handle);
        Ok(handle)
    }

    /// Read through the staged handle when one is open so uncommitted
    /// writes stay visible, otherwise through a short-lived read-only one.
    #[cfg(target_os = "espidf")]
    fn with_read_handle<F, T>(&self, namespace: &str, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        match self.staged.get(namespace) {
            Some(&handle) => f(handle),
            None => Self::with_nvs_handle(namespace, false, f),
        }
    }
}

#[cfg(target_os = "espidf")]
impl Drop for NvsAdapter {
    fn drop(&mut self) {
        for (namespace, handle) in self.staged.drain() {
            warn!("NvsAdapter: closing '{}' with uncommitted writes", namespace);
            unsafe {
                nvs_close(handle);
            }
        }
    }
}

pub fn validate_config(cfg: &FeederConfig) -> Result<(), ConfigError> {
    if !STANDARD_BAUD_RATES.contains(&cfg.uart_baud_rate) {
        return Err(ConfigError::ValidationFailed(
            "uart_baud_rate must be a standard rate (1200–115200)",
        ));
    }
    if cfg.network_check_interval_us == 0 {
        return Err(ConfigError::ValidationFailed(
            "network_check_interval_us must be non-zero",
        ));
    }
    if cfg.schedule_check_interval_ms < 60_000 {
        return Err(ConfigError::ValidationFailed(
            "schedule_check_interval_ms must be >= 60000",
        ));
    }
    if !(1..=1000).contains(&cfg.loop_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "loop_interval_ms must be 1–1000",
        ));
    }
    if cfg.watchdog_timeout_ms <= cfg.loop_interval_ms {
        return Err(ConfigError::ValidationFailed(
            "watchdog_timeout_ms must exceed loop_interval_ms",
        ));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<FeederConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            if let Some(bytes) = self.store.borrow().get(&key) {
                let cfg: FeederConfig =
                    postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsAdapter: loaded config from store");
                Ok(cfg)
            } else {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(FeederConfig::default())
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, false, |handle| {
                let key_cstr = b"feedcfg\0";
                let mut size: usize = 0;

                // First call: get size
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret == ESP_ERR_NVS_NOT_FOUND {
                    return Err(ESP_ERR_NVS_NOT_FOUND);
                }
                if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ret);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    let cfg: FeederConfig =
                        postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("NvsAdapter: loaded config from NVS ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => {
                    info!("NvsAdapter: no stored config, using defaults");
                    Ok(FeederConfig::default())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS read error {}, using defaults", e);
                    Ok(FeederConfig::default())
                }
            }
        }
    }

    fn save(&self, config: &FeederConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            self.store.borrow_mut().insert(key, bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
                let key_cstr = b"feedcfg\0";
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.borrow().get(&composite) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = self.with_read_handle(namespace, |handle| {
                let key_buf = Self::c_name(key);
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_buf.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                // A namespace that was never written cannot be opened read-only.
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().insert(composite, data.to_vec());
            *self.staged.entry(namespace.to_owned()).or_default() += 1;
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = self.staged_handle(namespace).and_then(|handle| {
                let key_buf = Self::c_name(key);
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key_buf.as_ptr() as *const _,
                        data.as_ptr() as *const _,
                        data.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|e| {
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().remove(&composite);
            *self.staged.entry(namespace.to_owned()).or_default() += 1;
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = self.staged_handle(namespace).and_then(|handle| {
                let key_buf = Self::c_name(key);
                let ret = unsafe { nvs_erase_key(handle, key_buf.as_ptr() as *const _) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|_| StorageError::IoError)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow().contains_key(&composite)
        }

        #[cfg(target_os = "espidf")]
        {
            let result = self.with_read_handle(namespace, |handle| {
                let key_buf = Self::c_name(key);
                let ret = unsafe {
                    nvs_find_key(handle, key_buf.as_ptr() as *const _, core::ptr::null_mut())
                };
                Ok(ret == ESP_OK)
            });
            result.unwrap_or(false)
        }
    }

    fn commit(&mut self, namespace: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.staged.remove(namespace);
            self.commits.set(self.commits.get() + 1);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let Some(handle) = self.staged.remove(namespace) else {
                debug!("NvsAdapter: nothing staged in '{}'", namespace);
                return Ok(());
            };
            let ret = unsafe { nvs_commit(handle) };
            unsafe {
                nvs_close(handle);
            }
            if ret != ESP_OK {
                warn!("NvsAdapter: commit of '{}' failed ({})", namespace, ret);
                return Err(StorageError::IoError);
            }
            Ok(())
        }
    }
}
