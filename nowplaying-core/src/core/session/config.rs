use std::ffi::c_void;

const DEFAULT_DBUS_NAME: &str = "nowplaying.media";
const DEFAULT_DISPLAY_NAME: &str = "Now Playing";

/// The configuration used to acquire the OS media session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// The D-Bus name under which the session is published (MPRIS only).
    pub dbus_name: String,
    /// The name of the application shown on the control surface.
    pub display_name: String,
    /// The handle of the window which owns the session (Windows only).
    pub window_handle: Option<*mut c_void>,
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    dbus_name: Option<String>,
    display_name: Option<String>,
    window_handle: Option<*mut c_void>,
}

impl SessionConfigBuilder {
    pub fn dbus_name<S: AsRef<str>>(mut self, dbus_name: S) -> Self {
        self.dbus_name = Some(dbus_name.as_ref().to_string());
        self
    }

    pub fn display_name<S: AsRef<str>>(mut self, display_name: S) -> Self {
        self.display_name = Some(display_name.as_ref().to_string());
        self
    }

    pub fn window_handle(mut self, window_handle: *mut c_void) -> Self {
        self.window_handle = Some(window_handle);
        self
    }

    pub fn build(self) -> SessionConfig {
        SessionConfig {
            dbus_name: self
                .dbus_name
                .unwrap_or_else(|| DEFAULT_DBUS_NAME.to_string()),
            display_name: self
                .display_name
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            window_handle: self.window_handle,
        }
    }
}
