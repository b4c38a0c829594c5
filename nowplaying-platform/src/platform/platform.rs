use nowplaying_core::core::session::{MediaTransport, Result, SessionConfig, SessionHandle};

use log::{debug, trace};

#[cfg(not(target_os = "windows"))]
use crate::platform::SouvlakiTransport;
#[cfg(target_os = "windows")]
use crate::platform::SmtcTransport;

/// Acquire the OS media session through the default backend of the current platform.
///
/// Only one session can be acquired per process at a time, any other attempt returns
/// [nowplaying_core::core::session::Error::Platform] until the active session is released.
pub fn new_session(config: &SessionConfig) -> Result<SessionHandle> {
    trace!("Acquiring the OS media session with {:?}", config);
    let transport = new_transport(config)?;
    debug!("Created OS media transport {:?}", transport);
    SessionHandle::acquire(transport)
}

fn new_transport(config: &SessionConfig) -> Result<Box<dyn MediaTransport>> {
    #[cfg(target_os = "windows")]
    let transport = SmtcTransport::new(config)?;
    #[cfg(not(target_os = "windows"))]
    let transport = SouvlakiTransport::new(config)?;

    Ok(Box::new(transport))
}
