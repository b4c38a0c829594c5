use crate::core::session::{
    ButtonEnablement, ButtonHandler, Error, MediaKind, MediaProperties, PlaybackStatus, Result,
    SessionHandle, Thumbnail, ThumbnailKind, Timeline,
};

use log::{debug, trace};

/// The loosely typed surface of a media session.
///
/// It converts the raw integer and string values received from a host runtime into the typed
/// [SessionHandle] operations.
#[derive(Debug)]
pub struct MediaService {
    session: SessionHandle,
}

impl MediaService {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }

    /// The underlying session of the service.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn buttons(&self) -> &ButtonEnablement {
        self.session.buttons()
    }

    pub fn properties(&self) -> &MediaProperties {
        self.session.properties()
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.session.thumbnail()
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.session.timeline()
    }

    pub fn update_button_enablement(
        &mut self,
        play: bool,
        pause: bool,
        previous: bool,
        next: bool,
    ) -> Result<()> {
        self.session
            .set_button_enablement(ButtonEnablement::new(play, pause, previous, next))
    }

    /// Update the media properties of the session.
    /// The `kind` and `status` should be the raw values of [MediaKind] and [PlaybackStatus].
    pub fn update_media_properties(
        &mut self,
        kind: i32,
        status: i32,
        title: &str,
        album_title: &str,
        artist: &str,
        album_artist: &str,
    ) -> Result<()> {
        let properties = MediaProperties::builder()
            .kind(MediaKind::try_from(kind)?)
            .status(PlaybackStatus::try_from(status)?)
            .title(title)
            .album_title(album_title)
            .artist(artist)
            .album_artist(album_artist)
            .build();

        self.session.set_media_properties(properties)
    }

    /// Update the thumbnail of the session.
    /// The `kind` should be the raw value of a [ThumbnailKind].
    pub fn update_media_thumbnail(&mut self, kind: i32, reference: &str) -> Result<()> {
        let kind = ThumbnailKind::try_from(kind)?;
        self.session.set_thumbnail(kind, reference)
    }

    /// Update the playback progress of the session, both values are in seconds.
    ///
    /// It returns [Error::InvalidTimeline] when a value is negative or the position lies beyond
    /// the duration.
    pub fn update_timeline(&mut self, duration: f64, position: f64) -> Result<()> {
        let timeline = Timeline::from_secs(duration, position)?;
        self.session.set_timeline(timeline)
    }

    /// Bind the button handler of the session.
    ///
    /// Passing `None` while no handler is bound is ignored, any call after a handler has been
    /// bound returns [Error::AlreadyBound] as the handler can't be replaced or removed.
    pub fn update_events(&mut self, handler: Option<ButtonHandler>) -> Result<()> {
        if self.session.is_bound() {
            return Err(Error::AlreadyBound);
        }

        match handler {
            Some(handler) => {
                self.session.bind_button_handler(handler)?;
                debug!("Button handler has been bound to the media session");
                Ok(())
            }
            None => {
                trace!("Ignoring empty button handler update");
                Ok(())
            }
        }
    }

    /// Release the media session of the service.
    pub fn release(self) {
        self.session.release();
    }
}

impl From<SessionHandle> for MediaService {
    fn from(value: SessionHandle) -> Self {
        Self::new(value)
    }
}
