use crate::platform::SessionGuard;

use nowplaying_core::core::session::{
    ButtonEnablement, ButtonEvent, ButtonSink, Error, MediaProperties, MediaTransport,
    PlaybackStatus, RegistrationToken, Result, SessionConfig, Thumbnail, Timeline,
};

use log::{debug, error, info, trace, warn};
use souvlaki::{
    MediaControlEvent, MediaControls, MediaMetadata, MediaPlayback, MediaPosition, PlatformConfig,
};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

/// The handler which receives the control events of the system.
type ControlEventHandler = Box<dyn Fn(MediaControlEvent) + Send + 'static>;

/// The system media controls driven by the [SouvlakiTransport].
trait SystemControls: Send {
    fn attach(&mut self, handler: ControlEventHandler) -> Result<()>;

    fn detach(&mut self) -> Result<()>;

    fn set_metadata(&mut self, metadata: MediaMetadata<'_>) -> Result<()>;

    fn set_playback(&mut self, playback: MediaPlayback) -> Result<()>;
}

impl SystemControls for MediaControls {
    fn attach(&mut self, handler: ControlEventHandler) -> Result<()> {
        MediaControls::attach(self, move |event: MediaControlEvent| handler(event))
            .map_err(platform_error)
    }

    fn detach(&mut self) -> Result<()> {
        MediaControls::detach(self).map_err(platform_error)
    }

    fn set_metadata(&mut self, metadata: MediaMetadata<'_>) -> Result<()> {
        MediaControls::set_metadata(self, metadata).map_err(platform_error)
    }

    fn set_playback(&mut self, playback: MediaPlayback) -> Result<()> {
        MediaControls::set_playback(self, playback).map_err(platform_error)
    }
}

/// The state of the control surface which is needed to interpret incoming control events.
#[derive(Debug, Default, Clone, PartialEq)]
struct SurfaceState {
    buttons: ButtonEnablement,
    status: PlaybackStatus,
}

/// The media transport backed by the `souvlaki` media controls (MPRIS, MPNowPlayingInfoCenter).
///
/// The underlying controls have no notion of disabled buttons,
/// presses of disabled buttons are dropped by the transport instead.
pub struct SouvlakiTransport {
    controls: Box<dyn SystemControls>,
    state: Arc<RwLock<SurfaceState>>,
    properties: MediaProperties,
    thumbnail: Option<Thumbnail>,
    timeline: Option<Timeline>,
    registration: Option<i64>,
    next_registration: i64,
    /// The claim on the process session, held for as long as the controls exist.
    _guard: Option<SessionGuard>,
}

impl SouvlakiTransport {
    /// Create the system media controls for the given configuration.
    ///
    /// It returns [Error::Platform] when the session of the process has already been acquired,
    /// or the system refused to create the controls.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let guard = SessionGuard::acquire()?;
        let platform_config = PlatformConfig {
            dbus_name: config.dbus_name.as_str(),
            display_name: config.display_name.as_str(),
            hwnd: config.window_handle,
        };

        #[cfg(target_os = "windows")]
        if platform_config.hwnd.is_none() {
            return Err(Error::Platform(
                "no window handle present for the system media controls".to_string(),
            ));
        }

        // the controls only connect to the bus from their own thread once attached
        #[cfg(target_os = "linux")]
        verify_session_bus()?;

        trace!("Creating system media controls with {:?}", platform_config);
        let controls = MediaControls::new(platform_config).map_err(|e| {
            error!("Failed to create system media controls, {:?}", e);
            platform_error(e)
        })?;
        debug!("System media controls have been created");

        Ok(Self::with_controls(Box::new(controls), Some(guard)))
    }

    fn with_controls(controls: Box<dyn SystemControls>, guard: Option<SessionGuard>) -> Self {
        Self {
            controls,
            state: Default::default(),
            properties: Default::default(),
            thumbnail: None,
            timeline: None,
            registration: None,
            next_registration: 1,
            _guard: guard,
        }
    }

    fn update_metadata(&mut self) -> Result<()> {
        let metadata = media_metadata(
            &self.properties,
            self.thumbnail.as_ref(),
            self.timeline.as_ref(),
        );

        trace!("Notifying system of media metadata {:?}", metadata);
        self.controls.set_metadata(metadata)
    }

    fn update_playback(&mut self, status: PlaybackStatus) -> Result<()> {
        let playback = media_playback(status, self.timeline.as_ref());
        let playback_info = format!("{:?}", playback);

        trace!("Updating system media playback state to {}", playback_info);
        self.controls.set_playback(playback)?;
        debug!("System media state has changed to {}", playback_info);
        Ok(())
    }

    /// Publish the stopped state and detach the controls from the system.
    fn stop_and_detach(&mut self) -> Result<()> {
        if let Err(e) = self.update_playback(PlaybackStatus::Stopped) {
            warn!("Failed to publish the stopped media state, {}", e);
        }

        self.controls.detach()?;
        debug!("System media controls have been detached");
        Ok(())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SurfaceState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MediaTransport for SouvlakiTransport {
    fn subscribe(&mut self, sink: ButtonSink) -> Result<RegistrationToken> {
        if self.registration.is_some() {
            return Err(Error::Platform(
                "system media controls are already attached".to_string(),
            ));
        }

        let state = self.state.clone();
        self.controls
            .attach(Box::new(move |event: MediaControlEvent| {
                trace!("Received system media control event {:?}", event);
                let state = state.read().unwrap_or_else(PoisonError::into_inner);

                match forward(&state, &event) {
                    Some(button) => sink.press(button),
                    None => debug!("Ignoring system media control event {:?} of a disabled button", event),
                }
            }))
            .map_err(|e| {
                error!("Failed to attach system media controls, {}", e);
                e
            })?;

        let registration = self.next_registration;
        self.next_registration += 1;
        self.registration = Some(registration);
        debug!("System media controls have been attached");
        Ok(RegistrationToken::new(registration))
    }

    fn unsubscribe(&mut self, token: RegistrationToken) -> Result<()> {
        if self.registration != Some(token.value()) {
            return Err(Error::Platform(format!(
                "registration {} is not attached",
                token
            )));
        }

        self.registration = None;
        self.stop_and_detach()
    }

    fn set_button_enablement(&mut self, buttons: &ButtonEnablement) -> Result<()> {
        self.write_state().buttons = buttons.clone();
        Ok(())
    }

    fn set_media_properties(&mut self, properties: &MediaProperties) -> Result<()> {
        self.properties = properties.clone();
        self.update_metadata()?;
        self.update_playback(properties.status)?;
        self.write_state().status = properties.status;
        info!("System has been notified of the media properties {}", properties);
        Ok(())
    }

    fn set_thumbnail(&mut self, thumbnail: &Thumbnail) -> Result<()> {
        self.thumbnail = Some(thumbnail.clone());
        self.update_metadata()
    }

    fn set_timeline(&mut self, timeline: &Timeline) -> Result<()> {
        self.timeline = Some(*timeline);
        self.update_metadata()?;
        self.update_playback(self.properties.status)
    }

    fn release(&mut self) -> Result<()> {
        match self.registration.take() {
            Some(registration) => {
                warn!(
                    "System media controls are still attached with registration {} while being released",
                    registration
                );
                self.stop_and_detach()
            }
            None => {
                trace!("System media controls are already detached");
                Ok(())
            }
        }
    }
}

impl Debug for SouvlakiTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SouvlakiTransport")
            .field("state", &self.state)
            .field("properties", &self.properties)
            .field("thumbnail", &self.thumbnail)
            .field("timeline", &self.timeline)
            .field("registration", &self.registration)
            .finish()
    }
}

/// Verify that the session bus, on which the controls are published, can be reached.
#[cfg(target_os = "linux")]
fn verify_session_bus() -> Result<()> {
    zbus::blocking::Connection::session()
        .map(|_| trace!("Session bus is available for the system media controls"))
        .map_err(|e| Error::Platform(format!("session bus is unavailable, {}", e)))
}

/// Get the button which should be pressed for the given control event.
/// It returns `None` when the button has been disabled on the surface.
fn forward(state: &SurfaceState, event: &MediaControlEvent) -> Option<ButtonEvent> {
    Some(button_event(event, state)).filter(|button| state.buttons.is_enabled(button))
}

/// Map the given control event to the button it represents.
/// A toggle is interpreted against the current playback status of the surface.
fn button_event(event: &MediaControlEvent, state: &SurfaceState) -> ButtonEvent {
    match event {
        MediaControlEvent::Play => ButtonEvent::Play,
        MediaControlEvent::Pause => ButtonEvent::Pause,
        MediaControlEvent::Toggle => match state.status {
            PlaybackStatus::Playing => ButtonEvent::Pause,
            _ => ButtonEvent::Play,
        },
        MediaControlEvent::Previous => ButtonEvent::Previous,
        MediaControlEvent::Next => ButtonEvent::Next,
        _ => ButtonEvent::Unknown,
    }
}

fn media_playback(status: PlaybackStatus, timeline: Option<&Timeline>) -> MediaPlayback {
    let progress = timeline.map(|e| MediaPosition(e.position()));

    match status {
        PlaybackStatus::Closed | PlaybackStatus::Stopped => MediaPlayback::Stopped,
        PlaybackStatus::Changing | PlaybackStatus::Paused => MediaPlayback::Paused { progress },
        PlaybackStatus::Playing => MediaPlayback::Playing { progress },
    }
}

fn media_metadata<'a>(
    properties: &'a MediaProperties,
    thumbnail: Option<&'a Thumbnail>,
    timeline: Option<&Timeline>,
) -> MediaMetadata<'a> {
    MediaMetadata {
        title: non_empty(&properties.title),
        album: non_empty(&properties.album_title),
        artist: non_empty(&properties.artist).or_else(|| non_empty(&properties.album_artist)),
        cover_url: thumbnail.map(|e| e.as_str()),
        duration: timeline.map(|e| e.duration()),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value).filter(|e| !e.is_empty())
}

fn platform_error(e: souvlaki::Error) -> Error {
    Error::Platform(format!("{:?}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    use nowplaying_core::core::session::{EventBridge, MediaKind};
    use nowplaying_core::init_logger;
    use std::sync::mpsc::channel;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeControlsState {
        handler: Option<ControlEventHandler>,
        calls: Vec<String>,
    }

    /// Controls which behave like the D-Bus controls, rejecting updates while detached.
    #[derive(Clone, Default)]
    struct FakeControls {
        state: Arc<Mutex<FakeControlsState>>,
    }

    impl FakeControls {
        fn emit(&self, event: MediaControlEvent) {
            let state = self.state.lock().unwrap();
            if let Some(handler) = state.handler.as_ref() {
                handler(event);
            }
        }

        fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }

        fn record(&self, call: String) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.handler.is_none() {
                return Err(Error::Platform("ThreadNotRunning".to_string()));
            }

            state.calls.push(call);
            Ok(())
        }
    }

    impl SystemControls for FakeControls {
        fn attach(&mut self, handler: ControlEventHandler) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.handler = Some(handler);
            state.calls.push("attach".to_string());
            Ok(())
        }

        fn detach(&mut self) -> Result<()> {
            self.record("detach".to_string())?;
            self.state.lock().unwrap().handler = None;
            Ok(())
        }

        fn set_metadata(&mut self, metadata: MediaMetadata<'_>) -> Result<()> {
            self.record(format!(
                "metadata {:?} {:?}",
                metadata.title, metadata.duration
            ))
        }

        fn set_playback(&mut self, playback: MediaPlayback) -> Result<()> {
            self.record(format!("playback {:?}", playback))
        }
    }

    fn new_transport() -> (SouvlakiTransport, FakeControls) {
        let controls = FakeControls::default();
        let transport = SouvlakiTransport::with_controls(Box::new(controls.clone()), None);
        (transport, controls)
    }

    #[test]
    fn test_forward() {
        let state = SurfaceState {
            buttons: ButtonEnablement::new(true, false, true, false),
            status: PlaybackStatus::Paused,
        };

        assert_eq!(Some(ButtonEvent::Play), forward(&state, &MediaControlEvent::Play));
        assert_eq!(None, forward(&state, &MediaControlEvent::Pause));
        assert_eq!(
            Some(ButtonEvent::Previous),
            forward(&state, &MediaControlEvent::Previous)
        );
        assert_eq!(None, forward(&state, &MediaControlEvent::Next));
    }

    #[test]
    fn test_forward_unknown() {
        let state = SurfaceState {
            buttons: ButtonEnablement::new(false, false, false, false),
            status: PlaybackStatus::Playing,
        };

        assert_eq!(
            Some(ButtonEvent::Unknown),
            forward(&state, &MediaControlEvent::Stop)
        );
        assert_eq!(
            Some(ButtonEvent::Unknown),
            forward(&state, &MediaControlEvent::Raise)
        );
    }

    #[test]
    fn test_forward_toggle() {
        let mut state = SurfaceState {
            buttons: ButtonEnablement::new(true, false, true, true),
            status: PlaybackStatus::Playing,
        };
        assert_eq!(None, forward(&state, &MediaControlEvent::Toggle));

        state.status = PlaybackStatus::Paused;
        assert_eq!(
            Some(ButtonEvent::Play),
            forward(&state, &MediaControlEvent::Toggle)
        );
    }

    #[test]
    fn test_button_event() {
        let state = SurfaceState::default();

        assert_eq!(ButtonEvent::Play, button_event(&MediaControlEvent::Play, &state));
        assert_eq!(ButtonEvent::Pause, button_event(&MediaControlEvent::Pause, &state));
        assert_eq!(
            ButtonEvent::Previous,
            button_event(&MediaControlEvent::Previous, &state)
        );
        assert_eq!(ButtonEvent::Next, button_event(&MediaControlEvent::Next, &state));
        assert_eq!(ButtonEvent::Unknown, button_event(&MediaControlEvent::Stop, &state));
    }

    #[test]
    fn test_media_playback() {
        let timeline = Timeline::new(Duration::from_secs(60), Duration::from_secs(5)).unwrap();

        assert_eq!(
            format!("{:?}", MediaPlayback::Stopped),
            format!("{:?}", media_playback(PlaybackStatus::Closed, Some(&timeline)))
        );
        assert_eq!(
            format!("{:?}", MediaPlayback::Paused { progress: None }),
            format!("{:?}", media_playback(PlaybackStatus::Changing, None))
        );
        assert_eq!(
            format!(
                "{:?}",
                MediaPlayback::Playing {
                    progress: Some(MediaPosition(Duration::from_secs(5)))
                }
            ),
            format!("{:?}", media_playback(PlaybackStatus::Playing, Some(&timeline)))
        );
    }

    #[test]
    fn test_media_metadata() {
        let properties = MediaProperties::builder()
            .kind(MediaKind::Music)
            .title("Song")
            .album_title("Album")
            .album_artist("AlbumArtist")
            .build();
        let thumbnail = Thumbnail::from_uri("https://example.com/cover.png").unwrap();
        let timeline = Timeline::new(Duration::from_secs(200), Duration::ZERO).unwrap();

        let result = media_metadata(&properties, Some(&thumbnail), Some(&timeline));

        assert_eq!(Some("Song"), result.title);
        assert_eq!(Some("Album"), result.album);
        assert_eq!(Some("AlbumArtist"), result.artist);
        assert_eq!(Some("https://example.com/cover.png"), result.cover_url);
        assert_eq!(Some(Duration::from_secs(200)), result.duration);
    }

    #[test]
    fn test_media_metadata_empty() {
        let properties = MediaProperties::default();

        let result = media_metadata(&properties, None, None);

        assert_eq!(None, result.title);
        assert_eq!(None, result.album);
        assert_eq!(None, result.artist);
        assert_eq!(None, result.cover_url);
        assert_eq!(None, result.duration);
    }

    #[test]
    fn test_subscribe_drops_disabled_buttons() {
        init_logger!();
        let (tx, rx) = channel();
        let bridge = EventBridge::new();
        bridge
            .bind(Box::new(move |event| tx.send(event).unwrap()))
            .unwrap();
        let (mut transport, controls) = new_transport();

        transport.subscribe(bridge.sink()).unwrap();
        transport
            .set_button_enablement(&ButtonEnablement::new(true, true, false, true))
            .unwrap();
        controls.emit(MediaControlEvent::Previous);
        controls.emit(MediaControlEvent::Next);

        let result = rx.recv_timeout(Duration::from_millis(200)).unwrap();
        assert_eq!(ButtonEvent::Next, result);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        bridge.abort();
    }

    #[test]
    fn test_subscribe_already_attached() {
        init_logger!();
        let (mut transport, _controls) = new_transport();
        transport.subscribe(EventBridge::new().sink()).unwrap();

        let result = transport.subscribe(EventBridge::new().sink());

        assert!(
            matches!(result, Err(Error::Platform(_))),
            "expected Error::Platform, got {:?} instead",
            result
        );
    }

    #[test]
    fn test_unsubscribe_then_release() {
        init_logger!();
        let (mut transport, controls) = new_transport();
        let token = transport.subscribe(EventBridge::new().sink()).unwrap();

        let result = transport.unsubscribe(token);
        assert_eq!(Ok(()), result);

        let result = transport.release();
        assert_eq!(Ok(()), result);
        assert_eq!(
            vec![
                "attach".to_string(),
                "playback Stopped".to_string(),
                "detach".to_string(),
            ],
            controls.calls()
        );
    }

    #[test]
    fn test_unsubscribe_unknown_registration() {
        init_logger!();
        let (mut transport, _controls) = new_transport();
        transport.subscribe(EventBridge::new().sink()).unwrap();

        let result = transport.unsubscribe(RegistrationToken::new(99));

        assert!(
            matches!(result, Err(Error::Platform(_))),
            "expected Error::Platform, got {:?} instead",
            result
        );
    }

    #[test]
    fn test_release_while_attached() {
        init_logger!();
        let (mut transport, controls) = new_transport();
        transport.subscribe(EventBridge::new().sink()).unwrap();

        let result = transport.release();

        assert_eq!(Ok(()), result);
        assert_eq!(Some(&"detach".to_string()), controls.calls().last());
    }

    #[test]
    fn test_set_timeline() {
        init_logger!();
        let (mut transport, controls) = new_transport();
        transport.subscribe(EventBridge::new().sink()).unwrap();
        transport
            .set_media_properties(
                &MediaProperties::builder()
                    .title("Song")
                    .status(PlaybackStatus::Playing)
                    .build(),
            )
            .unwrap();

        transport
            .set_timeline(&Timeline::new(Duration::from_secs(90), Duration::from_secs(3)).unwrap())
            .unwrap();

        let calls = controls.calls();
        assert_eq!(
            Some(&format!("metadata {:?} {:?}", Some("Song"), Some(Duration::from_secs(90)))),
            calls.get(calls.len() - 2)
        );
        assert_eq!(
            Some(&format!(
                "playback {:?}",
                MediaPlayback::Playing {
                    progress: Some(MediaPosition(Duration::from_secs(3)))
                }
            )),
            calls.last()
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_verify_session_bus_unavailable() {
        init_logger!();
        std::env::set_var("DBUS_SESSION_BUS_ADDRESS", "unix:path=/nonexistent/bus");

        let result = verify_session_bus();

        assert!(
            matches!(result, Err(Error::Platform(_))),
            "expected Error::Platform, got {:?} instead",
            result
        );
    }
}
