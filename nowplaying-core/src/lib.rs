/// The current version of the now playing bridge.
pub const VERSION: &str = "0.3.0";

pub mod core;

#[cfg(feature = "testing")]
pub mod testing {
    use crate::core::session::{
        ButtonEnablement, ButtonSink, MediaProperties, MediaTransport, RegistrationToken, Result,
        Thumbnail, Timeline,
    };

    use log::LevelFilter;
    use log4rs::append::console::ConsoleAppender;
    use log4rs::config::{Appender, Logger, Root};
    use log4rs::encode::pattern::PatternEncoder;
    use log4rs::Config;
    use mockall::mock;
    use std::sync::Once;

    static INIT: Once = Once::new();

    /// Initializes the logger with the specified log level.
    #[macro_export]
    macro_rules! init_logger {
        ($level:expr) => {
            nowplaying_core::testing::init_logger_level($level)
        };
        () => {
            nowplaying_core::testing::init_logger_level(log::LevelFilter::Trace)
        };
    }

    /// Initializes the logger with the specified log level.
    pub fn init_logger_level(level: LevelFilter) {
        INIT.call_once(|| {
            log4rs::init_config(Config::builder()
                .appender(Appender::builder().build("stdout", Box::new(ConsoleAppender::builder()
                    .encoder(Box::new(PatternEncoder::new("\x1B[37m{d(%Y-%m-%d %H:%M:%S%.3f)}\x1B[0m {h({l:>5.5})} \x1B[35m{I:>6.6}\x1B[0m \x1B[37m---\x1B[0m \x1B[37m[{T:>15.15}]\x1B[0m \x1B[36m{t:<60.60}\x1B[0m \x1B[37m:\x1B[0m {m}{n}")))
                    .build())))
                .logger(Logger::builder().build("mio", LevelFilter::Info))
                .logger(Logger::builder().build("zbus", LevelFilter::Info))
                .build(Root::builder().appender("stdout").build(level))
                .unwrap())
                .unwrap();
        })
    }

    mock! {
        #[derive(Debug)]
        pub Transport {}

        impl MediaTransport for Transport {
            fn subscribe(&mut self, sink: ButtonSink) -> Result<RegistrationToken>;
            fn unsubscribe(&mut self, token: RegistrationToken) -> Result<()>;
            fn set_button_enablement(&mut self, buttons: &ButtonEnablement) -> Result<()>;
            fn set_media_properties(&mut self, properties: &MediaProperties) -> Result<()>;
            fn set_thumbnail(&mut self, thumbnail: &Thumbnail) -> Result<()>;
            fn set_timeline(&mut self, timeline: &Timeline) -> Result<()>;
            fn release(&mut self) -> Result<()>;
        }
    }
}
