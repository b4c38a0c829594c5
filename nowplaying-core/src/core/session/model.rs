use crate::core::session::{Error, Result};

use derive_more::Display;
use std::time::Duration;
use url::Url;

/// A transport control button which has been pressed on the OS media surface.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonEvent {
    #[display("play")]
    Play,
    #[display("pause")]
    Pause,
    #[display("previous")]
    Previous,
    #[display("next")]
    Next,
    /// A button which has no mapping within the bridge.
    #[display("unknown")]
    Unknown,
}

/// The enabled state of each transport button on the OS control surface.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[display(
    "play: {}, pause: {}, previous: {}, next: {}",
    play,
    pause,
    previous,
    next
)]
pub struct ButtonEnablement {
    pub play: bool,
    pub pause: bool,
    pub previous: bool,
    pub next: bool,
}

impl ButtonEnablement {
    /// Create a new button enablement state.
    pub fn new(play: bool, pause: bool, previous: bool, next: bool) -> Self {
        Self {
            play,
            pause,
            previous,
            next,
        }
    }

    /// Check if the given button is enabled.
    /// [ButtonEvent::Unknown] is always considered enabled as it can't be toggled.
    pub fn is_enabled(&self, button: &ButtonEvent) -> bool {
        match button {
            ButtonEvent::Play => self.play,
            ButtonEvent::Pause => self.pause,
            ButtonEvent::Previous => self.previous,
            ButtonEvent::Next => self.next,
            ButtonEvent::Unknown => true,
        }
    }
}

impl Default for ButtonEnablement {
    fn default() -> Self {
        Self::new(true, true, true, true)
    }
}

/// The kind of media which is being played.
#[repr(i32)]
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    #[default]
    Unknown = 0,
    Music = 1,
    Video = 2,
    Image = 3,
}

impl TryFrom<i32> for MediaKind {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(MediaKind::Unknown),
            1 => Ok(MediaKind::Music),
            2 => Ok(MediaKind::Video),
            3 => Ok(MediaKind::Image),
            _ => Err(Error::Platform(format!("media kind {} is out of range", value))),
        }
    }
}

/// The playback status shown on the OS control surface.
#[repr(i32)]
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Closed = 0,
    Changing = 1,
    Stopped = 2,
    Playing = 3,
    Paused = 4,
}

impl TryFrom<i32> for PlaybackStatus {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(PlaybackStatus::Closed),
            1 => Ok(PlaybackStatus::Changing),
            2 => Ok(PlaybackStatus::Stopped),
            3 => Ok(PlaybackStatus::Playing),
            4 => Ok(PlaybackStatus::Paused),
            _ => Err(Error::Platform(format!(
                "playback status {} is out of range",
                value
            ))),
        }
    }
}

/// The display properties of the media which is being played.
/// These are always applied as a single batch to the OS control surface.
#[derive(Debug, Display, Default, Clone, PartialEq)]
#[display("kind: {}, status: {}, title: {}", kind, status, title)]
pub struct MediaProperties {
    pub kind: MediaKind,
    pub status: PlaybackStatus,
    pub title: String,
    pub album_title: String,
    pub artist: String,
    pub album_artist: String,
}

impl MediaProperties {
    pub fn builder() -> MediaPropertiesBuilder {
        MediaPropertiesBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct MediaPropertiesBuilder {
    kind: Option<MediaKind>,
    status: Option<PlaybackStatus>,
    title: Option<String>,
    album_title: Option<String>,
    artist: Option<String>,
    album_artist: Option<String>,
}

impl MediaPropertiesBuilder {
    pub fn kind(mut self, kind: MediaKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn status(mut self, status: PlaybackStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn title<S: AsRef<str>>(mut self, title: S) -> Self {
        self.title = Some(title.as_ref().to_string());
        self
    }

    pub fn album_title<S: AsRef<str>>(mut self, album_title: S) -> Self {
        self.album_title = Some(album_title.as_ref().to_string());
        self
    }

    pub fn artist<S: AsRef<str>>(mut self, artist: S) -> Self {
        self.artist = Some(artist.as_ref().to_string());
        self
    }

    pub fn album_artist<S: AsRef<str>>(mut self, album_artist: S) -> Self {
        self.album_artist = Some(album_artist.as_ref().to_string());
        self
    }

    /// Build the media properties, missing fields fallback to their default.
    pub fn build(self) -> MediaProperties {
        MediaProperties {
            kind: self.kind.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            album_title: self.album_title.unwrap_or_default(),
            artist: self.artist.unwrap_or_default(),
            album_artist: self.album_artist.unwrap_or_default(),
        }
    }
}

/// The way a thumbnail reference should be interpreted.
#[repr(i32)]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailKind {
    /// No thumbnail, updates with this kind are ignored.
    None = 0,
    /// A local file path.
    File = 1,
    /// A uri which can be streamed by the OS.
    Uri = 2,
}

impl TryFrom<i32> for ThumbnailKind {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(ThumbnailKind::None),
            1 => Ok(ThumbnailKind::File),
            2 => Ok(ThumbnailKind::Uri),
            _ => Err(Error::UnsupportedThumbnailKind(value)),
        }
    }
}

/// A thumbnail reference which can be streamed by the OS.
#[derive(Debug, Display, Clone, PartialEq)]
#[display("{}", uri)]
pub struct Thumbnail {
    uri: Url,
}

impl Thumbnail {
    /// Parse the given reference as a thumbnail uri.
    pub fn from_uri(reference: &str) -> Result<Self> {
        Url::parse(reference)
            .map(|uri| Self { uri })
            .map_err(|e| Error::Platform(format!("invalid thumbnail uri {}, {}", reference, e)))
    }

    pub fn as_str(&self) -> &str {
        self.uri.as_str()
    }
}

/// The progress of the media which is being played.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display("{:?}/{:?}", position, duration)]
pub struct Timeline {
    duration: Duration,
    position: Duration,
}

impl Timeline {
    /// Create a new timeline for the given duration and playback position.
    ///
    /// It returns [Error::InvalidTimeline] when the position lies beyond the duration.
    pub fn new(duration: Duration, position: Duration) -> Result<Self> {
        if position > duration {
            return Err(Error::InvalidTimeline(format!(
                "position {:?} is beyond duration {:?}",
                position, duration
            )));
        }

        Ok(Self { duration, position })
    }

    /// Create a new timeline from the given duration and position in seconds.
    pub fn from_secs(duration: f64, position: f64) -> Result<Self> {
        Self::new(to_duration(duration, "duration")?, to_duration(position, "position")?)
    }

    /// The total duration of the media.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The current playback position within the media.
    pub fn position(&self) -> Duration {
        self.position
    }
}

fn to_duration(secs: f64, name: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| Error::InvalidTimeline(format!("{} {} is not a valid time", name, secs)))
}
