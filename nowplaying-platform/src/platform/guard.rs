use nowplaying_core::core::session::{Error, Result};

use log::{debug, trace};
use std::sync::atomic::{AtomicBool, Ordering};

static ACQUIRED: AtomicBool = AtomicBool::new(false);

/// The claim of this process on the OS media session.
///
/// The OS only exposes a single transport control surface per process, so only one guard can
/// exist at any time. The claim is given back when the guard is dropped.
#[derive(Debug)]
pub struct SessionGuard {
    _private: (),
}

impl SessionGuard {
    /// Claim the OS media session of this process.
    ///
    /// It returns [Error::Platform] when the session has already been claimed.
    pub fn acquire() -> Result<Self> {
        ACQUIRED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| {
                trace!("Media session of the process has been claimed");
                Self { _private: () }
            })
            .map_err(|_| {
                Error::Platform("the media session has already been acquired".to_string())
            })
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        ACQUIRED.store(false, Ordering::SeqCst);
        debug!("Media session of the process has been given back");
    }
}
