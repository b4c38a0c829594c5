use crate::core::session::{
    ButtonEnablement, ButtonHandler, EventBridge, MediaProperties, MediaTransport,
    RegistrationToken, Result, Thumbnail, ThumbnailKind, Timeline,
};
use crate::core::session::Error;

use log::{debug, info, trace, warn};

/// The owner of the OS transport control session of the process.
///
/// The handle subscribes its [EventBridge] on the button-press notifications of the OS when it's
/// acquired and keeps the subscription until it's released. Releasing the handle aborts the
/// event delivery, removes the subscription and releases the OS session, in that order.
/// Dropping the handle without releasing it, performs the same teardown.
#[derive(Debug)]
pub struct SessionHandle {
    transport: Box<dyn MediaTransport>,
    token: Option<RegistrationToken>,
    bridge: EventBridge,
    buttons: ButtonEnablement,
    properties: MediaProperties,
    thumbnail: Option<Thumbnail>,
    timeline: Option<Timeline>,
    released: bool,
}

impl SessionHandle {
    /// Acquire the session of the given OS transport.
    ///
    /// This subscribes the event bridge of the session on the button-press notifications
    /// and enables all transport buttons.
    ///
    /// It returns [Error::Platform] when the OS refused the subscription or initial state.
    pub fn acquire(mut transport: Box<dyn MediaTransport>) -> Result<Self> {
        let bridge = EventBridge::new();

        trace!("Subscribing to the button notifications of {:?}", transport);
        let token = match transport.subscribe(bridge.sink()) {
            Ok(token) => token,
            Err(e) => {
                if let Err(release_err) = transport.release() {
                    warn!("Failed to release the media session, {}", release_err);
                }
                return Err(e);
            }
        };
        debug!("Subscribed to the button notifications with registration {}", token);

        let mut handle = Self {
            transport,
            token: Some(token),
            bridge,
            buttons: ButtonEnablement::default(),
            properties: MediaProperties::default(),
            thumbnail: None,
            timeline: None,
            released: false,
        };
        handle.set_button_enablement(ButtonEnablement::default())?;

        info!("Media session has been acquired");
        Ok(handle)
    }

    /// The button enablement which has last been applied to the OS surface.
    pub fn buttons(&self) -> &ButtonEnablement {
        &self.buttons
    }

    /// The media properties which have last been applied to the OS surface.
    pub fn properties(&self) -> &MediaProperties {
        &self.properties
    }

    /// The thumbnail which has last been applied to the OS surface, if any.
    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    /// The playback progress which has last been applied to the OS surface, if any.
    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    /// Enable or disable each transport button on the OS surface.
    pub fn set_button_enablement(&mut self, buttons: ButtonEnablement) -> Result<()> {
        trace!("Updating the media session buttons to {}", buttons);
        self.transport.set_button_enablement(&buttons)?;
        debug!("Media session buttons have been updated to {}", buttons);
        self.buttons = buttons;
        Ok(())
    }

    /// Apply the given media properties as a single batch to the OS surface.
    pub fn set_media_properties(&mut self, properties: MediaProperties) -> Result<()> {
        trace!("Updating the media session properties to {:?}", properties);
        self.transport.set_media_properties(&properties)?;
        debug!("Media session properties have been updated to {}", properties);
        self.properties = properties;
        Ok(())
    }

    /// Apply the given thumbnail reference to the OS surface.
    ///
    /// A [ThumbnailKind::None] thumbnail is ignored and leaves the current thumbnail untouched.
    /// A [ThumbnailKind::File] thumbnail is not supported.
    pub fn set_thumbnail(&mut self, kind: ThumbnailKind, reference: &str) -> Result<()> {
        match kind {
            ThumbnailKind::None => {
                trace!("Ignoring thumbnail update without a thumbnail kind");
                Ok(())
            }
            ThumbnailKind::Uri => {
                let thumbnail = Thumbnail::from_uri(reference)?;
                self.transport.set_thumbnail(&thumbnail)?;
                debug!("Media session thumbnail has been updated to {}", thumbnail);
                self.thumbnail = Some(thumbnail);
                Ok(())
            }
            ThumbnailKind::File => Err(Error::UnsupportedThumbnailKind(kind as i32)),
        }
    }

    /// Apply the playback progress of the media to the OS surface.
    pub fn set_timeline(&mut self, timeline: Timeline) -> Result<()> {
        trace!("Updating the media session timeline to {}", timeline);
        self.transport.set_timeline(&timeline)?;
        self.timeline = Some(timeline);
        Ok(())
    }

    /// Bind the application handler for pressed transport buttons.
    /// A handler can only be bound once during the lifetime of the session.
    ///
    /// It returns [Error::AlreadyBound] when a handler has already been bound.
    pub fn bind_button_handler(&self, handler: ButtonHandler) -> Result<()> {
        self.bridge.bind(handler)
    }

    /// Check if a button handler has been bound to the session.
    pub fn is_bound(&self) -> bool {
        self.bridge.is_bound()
    }

    /// Release the OS session.
    /// This blocks until any button handler invocation in progress has completed.
    pub fn release(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.released {
            return;
        }

        self.released = true;
        debug!("Releasing the media session");
        self.bridge.abort();

        if let Some(token) = self.token.take() {
            trace!("Removing button notification registration {}", token);
            if let Err(e) = self.transport.unsubscribe(token) {
                warn!("Failed to remove the button notification registration, {}", e);
            }
        }

        match self.transport.release() {
            Ok(_) => info!("Media session has been released"),
            Err(e) => warn!("Failed to release the media session, {}", e),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}
