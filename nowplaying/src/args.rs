use std::path::PathBuf;

use clap::Parser;
use derive_more::Display;
use log::LevelFilter;

/// The options of the now playing host.
#[derive(Debug, Clone, Display, Parser)]
#[command(name = "nowplaying", version)]
#[display("display_name: {}, title: {}, status: {}", display_name, title, status)]
pub struct NowPlayingArgs {
    /// The name of the application shown on the media controls.
    #[arg(long, default_value = "Now Playing")]
    pub display_name: String,
    /// The D-Bus name under which the media session is published (MPRIS only).
    #[arg(long, default_value = "nowplaying.media")]
    pub dbus_name: String,
    /// The root log level.
    #[arg(long, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,
    /// Write the logs also to the given file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// Load the logging setup from the given `log4rs` config file.
    #[arg(long)]
    pub log_config: Option<PathBuf>,
    #[arg(long, default_value = "")]
    pub title: String,
    #[arg(long, default_value = "")]
    pub album_title: String,
    #[arg(long, default_value = "")]
    pub artist: String,
    #[arg(long, default_value = "")]
    pub album_artist: String,
    /// The media kind, 0 (unknown), 1 (music), 2 (video) or 3 (image).
    #[arg(long, default_value_t = 1)]
    pub media_kind: i32,
    /// The playback status, 0 (closed), 1 (changing), 2 (stopped), 3 (playing) or 4 (paused).
    #[arg(long, default_value_t = 3)]
    pub status: i32,
    /// The uri of the thumbnail to show.
    #[arg(long)]
    pub thumbnail: Option<String>,
    /// The duration of the media in seconds.
    #[arg(long)]
    pub duration: Option<f64>,
    /// The playback position in seconds, only used together with a duration.
    #[arg(long, default_value_t = 0.0, requires = "duration")]
    pub position: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let result = NowPlayingArgs::try_parse_from(["nowplaying"]).unwrap();

        assert_eq!("Now Playing", result.display_name);
        assert_eq!("nowplaying.media", result.dbus_name);
        assert_eq!(LevelFilter::Info, result.log_level);
        assert_eq!(None, result.log_file);
        assert_eq!(1, result.media_kind);
        assert_eq!(3, result.status);
        assert_eq!(None, result.thumbnail);
        assert_eq!(None, result.duration);
    }

    #[test]
    fn test_parse() {
        let result = NowPlayingArgs::try_parse_from([
            "nowplaying",
            "--title",
            "Song",
            "--artist",
            "Artist",
            "--log-level",
            "trace",
            "--status",
            "4",
            "--thumbnail",
            "https://example.com/cover.png",
            "--duration",
            "215.5",
            "--position",
            "30",
        ])
        .unwrap();

        assert_eq!("Song", result.title);
        assert_eq!("Artist", result.artist);
        assert_eq!(LevelFilter::Trace, result.log_level);
        assert_eq!(4, result.status);
        assert_eq!(
            Some("https://example.com/cover.png".to_string()),
            result.thumbnail
        );
        assert_eq!(Some(215.5), result.duration);
        assert_eq!(30.0, result.position);
    }

    #[test]
    fn test_parse_position_without_duration() {
        let result = NowPlayingArgs::try_parse_from(["nowplaying", "--position", "30"]);

        assert!(result.is_err(), "expected the position to require a duration");
    }
}
