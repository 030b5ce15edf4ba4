use std::ffi::OsString;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use parley::app_dirs::CONFIG_HOME_ENV;

// Tests in one binary share the process environment.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Holds an environment variable at a test value and restores it on drop.
pub struct ParleyEnvGuard {
    key: &'static str,
    saved: Option<OsString>,
    _serial: MutexGuard<'static, ()>,
}

impl ParleyEnvGuard {
    /// Redirect the `.parley` directory into `base`.
    pub fn set_config_home(base: impl AsRef<Path>) -> Self {
        Self::set(CONFIG_HOME_ENV, base.as_ref().as_os_str())
    }

    fn set(key: &'static str, value: &std::ffi::OsStr) -> Self {
        let serial = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let saved = std::env::var_os(key);
        // SAFETY: every mutation happens while ENV_LOCK is held.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            saved,
            _serial: serial,
        }
    }
}

impl Drop for ParleyEnvGuard {
    fn drop(&mut self) {
        // SAFETY: ENV_LOCK is still held by `_serial`.
        unsafe {
            match self.saved.take() {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }
}
