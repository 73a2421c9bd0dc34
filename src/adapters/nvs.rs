//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`]: the [`SequencerConfig`] is one postcard blob
//! stored under namespace `powerloop`, key `seqcfg`.  Blobs that fail to
//! decode or validate are reported as [`ConfigError::Corrupted`]; a missing
//! blob loads as the defaults.  The host build keeps the blob in memory.

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SequencerConfig;
use log::{info, warn};

#[cfg(target_os = "espidf")]
use core::ffi::CStr;
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const NAMESPACE: &CStr = c"powerloop";
#[cfg(target_os = "espidf")]
const KEY: &CStr = c"seqcfg";

/// Upper bound on a stored blob; anything larger is not ours.
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    blob: std::cell::RefCell<Option<Vec<u8>>>,
}

impl NvsAdapter {
    /// Bring up the default NVS partition, erasing it when it is full or
    /// was written by a newer layout.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: runs once on the main task before any other NVS user.
            let mut ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32
            {
                warn!("NvsAdapter: partition unusable ({}), erasing", ret);
                // SAFETY: as above.
                ret = unsafe { nvs_flash_erase() };
                if ret == ESP_OK as i32 {
                    ret = unsafe { nvs_flash_init() };
                }
            }
            if ret != ESP_OK as i32 {
                warn!("NvsAdapter: init failed ({})", ret);
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: flash partition ready");
            Ok(Self {})
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("NvsAdapter: in-memory backend");
            Ok(Self {
                blob: std::cell::RefCell::new(None),
            })
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        Ok(self.blob.borrow().clone())
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        *self.blob.borrow_mut() = Some(bytes.to_vec());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let handle = match Handle::open(false) {
            Ok(h) => h,
            // The namespace only exists after the first save.
            Err(rc) if rc == ESP_ERR_NVS_NOT_FOUND as i32 => return Ok(None),
            Err(rc) => return Err(esp_to_config_error(rc)),
        };

        let mut size: usize = 0;
        // SAFETY: a null buffer asks NVS for the stored length only.
        let rc = unsafe { nvs_get_blob(handle.0, KEY.as_ptr(), core::ptr::null_mut(), &mut size) };
        if rc == ESP_ERR_NVS_NOT_FOUND as i32 {
            return Ok(None);
        }
        if rc != ESP_OK as i32 {
            return Err(esp_to_config_error(rc));
        }
        if size == 0 || size > MAX_BLOB_SIZE {
            return Err(ConfigError::Corrupted);
        }

        let mut buf = vec![0u8; size];
        // SAFETY: buf holds exactly `size` writable bytes.
        let rc = unsafe { nvs_get_blob(handle.0, KEY.as_ptr(), buf.as_mut_ptr().cast(), &mut size) };
        if rc != ESP_OK as i32 {
            return Err(esp_to_config_error(rc));
        }
        buf.truncate(size);
        Ok(Some(buf))
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        let handle = Handle::open(true).map_err(esp_to_config_error)?;
        // SAFETY: bytes outlives the call; NVS copies the data.
        let rc = unsafe { nvs_set_blob(handle.0, KEY.as_ptr(), bytes.as_ptr().cast(), bytes.len()) };
        if rc != ESP_OK as i32 {
            return Err(esp_to_config_error(rc));
        }
        // SAFETY: handle is open for writing.
        let rc = unsafe { nvs_commit(handle.0) };
        if rc != ESP_OK as i32 {
            return Err(esp_to_config_error(rc));
        }
        Ok(())
    }

    #[cfg(all(test, not(target_os = "espidf")))]
    fn put_raw(&self, bytes: Vec<u8>) {
        *self.blob.borrow_mut() = Some(bytes);
    }
}

/// Open namespace handle, closed on drop.
#[cfg(target_os = "espidf")]
struct Handle(nvs_handle_t);

#[cfg(target_os = "espidf")]
impl Handle {
    fn open(write: bool) -> Result<Self, i32> {
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut raw: nvs_handle_t = 0;
        // SAFETY: NAMESPACE is a NUL-terminated literal.
        let rc = unsafe { nvs_open(NAMESPACE.as_ptr(), mode, &mut raw) };
        if rc == ESP_OK as i32 { Ok(Self(raw)) } else { Err(rc) }
    }
}

#[cfg(target_os = "espidf")]
impl Drop for Handle {
    fn drop(&mut self) {
        // SAFETY: the handle came from a successful nvs_open.
        unsafe { nvs_close(self.0) };
    }
}

#[cfg(target_os = "espidf")]
fn esp_to_config_error(rc: i32) -> ConfigError {
    if rc == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
        ConfigError::StorageFull
    } else {
        warn!("NvsAdapter: esp error {}", rc);
        ConfigError::IoError
    }
}

fn decode(bytes: &[u8]) -> Result<SequencerConfig, ConfigError> {
    let cfg: SequencerConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
    // Out-of-range values from an older build count as corruption.
    cfg.validate().map_err(|_| ConfigError::Corrupted)?;
    Ok(cfg)
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SequencerConfig, ConfigError> {
        match self.read_blob()? {
            Some(bytes) => {
                let cfg = decode(&bytes)?;
                info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            None => {
                info!("NvsAdapter: nothing stored, using defaults");
                Ok(SequencerConfig::default())
            }
        }
    }

    fn save(&self, config: &SequencerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            warn!("NvsAdapter: encoded config too large ({} bytes)", bytes.len());
            return Err(ConfigError::StorageFull);
        }
        self.write_blob(&bytes)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
