//! File-backed flag store.
//!
//! Implements [`FlagStore`] on top of any mounted VFS (SPIFFS/LittleFS on
//! the ESP32, a plain directory on the host).  A flag is an empty file; its
//! existence is the whole payload.  Flag names are absolute (`/deepsleep`)
//! and resolve below the mount point.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{debug, warn};

use crate::app::ports::{FlagStore, StorageError};
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init::HwInitError;

/// Default SPIFFS mount point.
pub const SPIFFS_BASE: &str = "/spiffs";

pub struct FileFlagStore {
    base: PathBuf,
}

impl FileFlagStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.base.join(name.trim_start_matches('/'))
    }
}

fn map_io(e: &std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotMounted,
        ErrorKind::StorageFull => StorageError::Full,
        _ => StorageError::IoError,
    }
}

impl FlagStore for FileFlagStore {
    fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn create(&mut self, name: &str) -> Result<(), StorageError> {
        let path = self.path(name);
        if path.is_file() {
            return Ok(());
        }
        fs::File::create(&path).map_err(|e| {
            warn!("FlagStore: create {} failed: {}", path.display(), e);
            map_io(&e)
        })?;
        debug!("FlagStore: set {}", path.display());
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), StorageError> {
        let path = self.path(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("FlagStore: cleared {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("FlagStore: delete {} failed: {}", path.display(), e);
                Err(map_io(&e))
            }
        }
    }
}

/// Register the default SPIFFS partition at `base`, formatting it if the
/// mount fails (first boot).
#[cfg(target_os = "espidf")]
pub fn mount_spiffs(base: &'static core::ffi::CStr) -> Result<(), HwInitError> {
    use esp_idf_svc::sys::*;

    let conf = esp_vfs_spiffs_conf_t {
        base_path: base.as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: conf points at 'static strings; called once from main().
    let ret = unsafe { esp_vfs_spiffs_register(&conf) };
    if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
        return Err(HwInitError::SpiffsMountFailed(ret));
    }
    log::info!("FlagStore: SPIFFS mounted at {:?}", base);
    Ok(())
}
