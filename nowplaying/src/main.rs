use crate::args::NowPlayingArgs;

use clap::Parser;
use log::{debug, info, warn};
use nowplaying_core::core::session::{
    ButtonEvent, MediaService, PlaybackStatus, SessionConfig, ThumbnailKind,
};
use nowplaying_logging::SessionLogger;
use nowplaying_platform::new_session;
use std::io;
use tokio::select;
use tokio::sync::mpsc::unbounded_channel;

mod args;

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = NowPlayingArgs::parse();
    let logger = init_logger(&args).map_err(io::Error::other)?;
    if let Some(path) = logger.log_path() {
        info!("Writing logs to {}", path.display());
    }

    start(args).await
}

fn init_logger(args: &NowPlayingArgs) -> nowplaying_logging::Result<SessionLogger> {
    let mut builder = SessionLogger::builder();
    builder.root_level(args.log_level);

    if let Some(path) = args.log_config.as_ref() {
        builder.config_path(path);
    }
    if let Some(path) = args.log_file.as_ref() {
        builder.log_path(path);
    }

    builder.build()
}

/// Publish the media of the given arguments on the OS transport controls.
/// This future keeps running until the process is being terminated.
async fn start(args: NowPlayingArgs) -> io::Result<()> {
    debug!("Starting now playing with {}", args);
    let config = SessionConfig::builder()
        .display_name(&args.display_name)
        .dbus_name(&args.dbus_name)
        .build();
    let mut service = new_session(&config)
        .map(MediaService::from)
        .map_err(io::Error::other)?;

    service
        .update_media_properties(
            args.media_kind,
            args.status,
            &args.title,
            &args.album_title,
            &args.artist,
            &args.album_artist,
        )
        .map_err(io::Error::other)?;
    if let Some(thumbnail) = args.thumbnail.as_ref() {
        service
            .update_media_thumbnail(ThumbnailKind::Uri as i32, thumbnail)
            .map_err(io::Error::other)?;
    }
    if let Some(duration) = args.duration {
        service
            .update_timeline(duration, args.position)
            .map_err(io::Error::other)?;
    }

    let (tx, mut rx) = unbounded_channel();
    service
        .update_events(Some(Box::new(move |event| {
            if let Err(e) = tx.send(event) {
                warn!("Failed to forward media button {}, {}", e.0, e);
            }
        })))
        .map_err(io::Error::other)?;

    info!("Now playing {}, press Ctrl+C to stop", service.properties());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        select! {
            _ = &mut ctrl_c => break,
            Some(event) = rx.recv() => on_button_pressed(&mut service, event),
        }
    }

    service.release();
    Ok(())
}

/// Reflect the pressed button in the playback status of the session.
fn on_button_pressed(service: &mut MediaService, event: ButtonEvent) {
    info!("Media button {} has been pressed", event);
    let status = match event {
        ButtonEvent::Play => PlaybackStatus::Playing,
        ButtonEvent::Pause => PlaybackStatus::Paused,
        _ => return,
    };

    let properties = service.properties().clone();
    if let Err(e) = service.update_media_properties(
        properties.kind as i32,
        status as i32,
        &properties.title,
        &properties.album_title,
        &properties.artist,
        &properties.album_artist,
    ) {
        warn!("Failed to update the playback status to {}, {}", status, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use nowplaying_core::core::session::{
        ButtonEnablement, Error, MediaKind, RegistrationToken, SessionHandle,
    };
    use nowplaying_core::init_logger;
    use nowplaying_core::testing::MockTransport;

    fn new_service(configure: impl FnOnce(&mut MockTransport)) -> MediaService {
        let mut transport = MockTransport::new();
        transport
            .expect_subscribe()
            .times(1)
            .returning(|_| Ok(RegistrationToken::new(1)));
        transport
            .expect_set_button_enablement()
            .withf(|buttons| *buttons == ButtonEnablement::default())
            .times(1)
            .returning(|_| Ok(()));
        configure(&mut transport);
        transport
            .expect_unsubscribe()
            .times(1)
            .returning(|_| Ok(()));
        transport.expect_release().times(1).returning(|| Ok(()));

        MediaService::from(SessionHandle::acquire(Box::new(transport)).unwrap())
    }

    #[test]
    fn test_on_button_pressed_pause() {
        init_logger!();
        let mut service = new_service(|transport| {
            transport
                .expect_set_media_properties()
                .times(2)
                .returning(|_| Ok(()));
        });
        service
            .update_media_properties(1, 3, "Song", "Album", "Artist", "")
            .unwrap();

        on_button_pressed(&mut service, ButtonEvent::Pause);

        let result = service.properties();
        assert_eq!(PlaybackStatus::Paused, result.status);
        assert_eq!(MediaKind::Music, result.kind);
        assert_eq!("Song", result.title);
        service.release();
    }

    #[test]
    fn test_on_button_pressed_next() {
        init_logger!();
        let mut service = new_service(|transport| {
            transport.expect_set_media_properties().times(0);
        });

        on_button_pressed(&mut service, ButtonEvent::Next);

        assert_eq!(PlaybackStatus::Closed, service.properties().status);
    }

    #[test]
    fn test_on_button_pressed_rejected() {
        init_logger!();
        let mut service = new_service(|transport| {
            transport
                .expect_set_media_properties()
                .times(1)
                .returning(|_| Err(Error::Platform("rejected".to_string())));
        });

        on_button_pressed(&mut service, ButtonEvent::Play);

        assert_eq!(PlaybackStatus::Closed, service.properties().status);
    }
}
