use crate::platform::SessionGuard;

use nowplaying_core::core::session::{
    ButtonEnablement, ButtonEvent, ButtonSink, Error, MediaProperties, MediaTransport,
    RegistrationToken, Result, SessionConfig, Thumbnail, Timeline,
};

use log::{debug, info, trace};
use windows::core::{Ref, HSTRING};
use windows::Foundation::{TimeSpan, TypedEventHandler, Uri};
use windows::Media::Playback::MediaPlayer;
use windows::Media::{
    MediaPlaybackStatus, MediaPlaybackType, SystemMediaTransportControls,
    SystemMediaTransportControlsButton, SystemMediaTransportControlsButtonPressedEventArgs,
    SystemMediaTransportControlsTimelineProperties,
};
use windows::Storage::Streams::RandomAccessStreamReference;

/// The media transport backed by the Windows System Media Transport Controls.
///
/// The controls are obtained from a background [MediaPlayer] of which the command manager is
/// disabled, so every button press is surfaced through the `ButtonPressed` event.
#[derive(Debug)]
pub struct SmtcTransport {
    player: MediaPlayer,
    controls: SystemMediaTransportControls,
    _guard: SessionGuard,
}

impl SmtcTransport {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let guard = SessionGuard::acquire()?;

        trace!("Creating Windows media transport controls for {}", config.display_name);
        let player = MediaPlayer::new().map_err(platform_error)?;
        player
            .CommandManager()
            .and_then(|e| e.SetIsEnabled(false))
            .map_err(platform_error)?;
        let controls = player
            .SystemMediaTransportControls()
            .map_err(platform_error)?;
        controls.SetIsEnabled(true).map_err(platform_error)?;
        debug!("Windows media transport controls have been created");

        Ok(Self {
            player,
            controls,
            _guard: guard,
        })
    }
}

impl MediaTransport for SmtcTransport {
    fn subscribe(&mut self, sink: ButtonSink) -> Result<RegistrationToken> {
        let handler = TypedEventHandler::<
            SystemMediaTransportControls,
            SystemMediaTransportControlsButtonPressedEventArgs,
        >::new(
            move |_, args: Ref<SystemMediaTransportControlsButtonPressedEventArgs>| {
                let button = args.ok()?.Button()?;
                trace!("Received Windows media button {:?}", button);
                sink.press(button_event(button));
                Ok(())
            },
        );

        let token = self
            .controls
            .ButtonPressed(&handler)
            .map_err(platform_error)?;
        debug!("Windows media button handler has been registered");
        Ok(RegistrationToken::new(token))
    }

    fn unsubscribe(&mut self, token: RegistrationToken) -> Result<()> {
        self.controls
            .RemoveButtonPressed(token.value())
            .map_err(platform_error)?;
        debug!("Windows media button handler {} has been removed", token);
        Ok(())
    }

    fn set_button_enablement(&mut self, buttons: &ButtonEnablement) -> Result<()> {
        self.controls
            .SetIsPlayEnabled(buttons.play)
            .and_then(|_| self.controls.SetIsPauseEnabled(buttons.pause))
            .and_then(|_| self.controls.SetIsPreviousEnabled(buttons.previous))
            .and_then(|_| self.controls.SetIsNextEnabled(buttons.next))
            .map_err(platform_error)
    }

    fn set_media_properties(&mut self, properties: &MediaProperties) -> Result<()> {
        let apply = || -> windows::core::Result<()> {
            self.controls
                .SetPlaybackStatus(MediaPlaybackStatus(properties.status as i32))?;

            let updater = self.controls.DisplayUpdater()?;
            updater.SetType(MediaPlaybackType(properties.kind as i32))?;
            let music = updater.MusicProperties()?;
            music.SetTitle(&HSTRING::from(properties.title.as_str()))?;
            music.SetAlbumTitle(&HSTRING::from(properties.album_title.as_str()))?;
            music.SetArtist(&HSTRING::from(properties.artist.as_str()))?;
            music.SetAlbumArtist(&HSTRING::from(properties.album_artist.as_str()))?;
            updater.Update()
        };

        apply().map_err(platform_error)?;
        info!("Windows has been notified of the media properties {}", properties);
        Ok(())
    }

    fn set_thumbnail(&mut self, thumbnail: &Thumbnail) -> Result<()> {
        let apply = || -> windows::core::Result<()> {
            let uri = Uri::CreateUri(&HSTRING::from(thumbnail.as_str()))?;
            let stream = RandomAccessStreamReference::CreateFromUri(&uri)?;
            let updater = self.controls.DisplayUpdater()?;
            updater.SetThumbnail(&stream)?;
            updater.Update()
        };

        apply().map_err(platform_error)
    }

    fn set_timeline(&mut self, timeline: &Timeline) -> Result<()> {
        let apply = || -> windows::core::Result<()> {
            let properties = SystemMediaTransportControlsTimelineProperties::new()?;
            properties.SetStartTime(TimeSpan::default())?;
            properties.SetMinSeekTime(TimeSpan::default())?;
            properties.SetEndTime(TimeSpan::from(timeline.duration()))?;
            properties.SetMaxSeekTime(TimeSpan::from(timeline.duration()))?;
            properties.SetPosition(TimeSpan::from(timeline.position()))?;
            self.controls.UpdateTimelineProperties(&properties)
        };

        apply().map_err(platform_error)?;
        trace!("Windows media timeline has been updated to {}", timeline);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.controls.SetIsEnabled(false).map_err(platform_error)?;
        self.player.Close().map_err(platform_error)
    }
}

fn button_event(button: SystemMediaTransportControlsButton) -> ButtonEvent {
    match button {
        SystemMediaTransportControlsButton::Play => ButtonEvent::Play,
        SystemMediaTransportControlsButton::Pause => ButtonEvent::Pause,
        SystemMediaTransportControlsButton::Previous => ButtonEvent::Previous,
        SystemMediaTransportControlsButton::Next => ButtonEvent::Next,
        _ => ButtonEvent::Unknown,
    }
}

fn platform_error(e: windows::core::Error) -> Error {
    Error::Platform(e.to_string())
}
