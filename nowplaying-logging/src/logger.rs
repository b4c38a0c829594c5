use crate::{Error, Result};
use log::{info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

const LOG_FORMAT_CONSOLE: &str = "\x1B[37m{d(%Y-%m-%d %H:%M:%S%.3f)}\x1B[0m {h({l:>5.5})} \x1B[35m{I:>6.6}\x1B[0m \x1B[37m---\x1B[0m \x1B[37m[{T:>15.15}]\x1B[0m \x1B[36m{t:<40.40}\x1B[0m \x1B[37m:\x1B[0m {m}{n}";
const LOG_FORMAT_FILE: &str =
    "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l:>5.5})} {I:>6.6} --- [{T:>15.15}] {t:<40.40} : {m}{n}";
const CONSOLE_APPENDER: &str = "stdout";
const FILE_APPENDER: &str = "file";
const LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;
const LOG_FILE_NAME: &str = "nowplaying";
const LOG_FILE_COUNT: u32 = 5;
/// The packages of the platform backends which are limited to [LevelFilter::Info] unless
/// configured otherwise, as they flood the logs with the chatter of the system bus.
const QUIET_PACKAGES: [&str; 4] = ["zbus", "tracing", "async_io", "polling"];

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// The process wide logger of the media session bridge.
#[derive(Debug)]
pub struct SessionLogger {
    log_path: Option<PathBuf>,
}

impl SessionLogger {
    /// Returns a builder instance for the logger.
    pub fn builder() -> SessionLoggerBuilder {
        SessionLoggerBuilder::default()
    }

    /// Create a new logging instance.
    ///
    /// When a `config_path` is given, the `log4rs` config file is loaded and all other options
    /// are ignored.
    /// The packages of the platform backends are logged at [LevelFilter::Info] at most, unless
    /// a level is given for them in `loggers`.
    pub fn new(
        root_level: LevelFilter,
        config_path: Option<impl AsRef<Path>>,
        log_path: Option<impl AsRef<Path>>,
        loggers: Vec<(String, LevelFilter)>,
    ) -> Result<Self> {
        let log_path = match config_path {
            Some(_) => None,
            None => log_path.map(|e| e.as_ref().to_path_buf()),
        };
        let config = match config_path {
            Some(path) => Self::load_from_config(path)?,
            None => Self::create_config(root_level, log_path.as_ref(), loggers)?,
        };

        if INITIALIZED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyInitialized);
        }

        log4rs::init_config(config).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        info!("Now playing logger has been initialized");
        Ok(Self { log_path })
    }

    /// The file to which the logs are written, if any.
    /// It's always `None` when the logger has been loaded from a config file.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    fn load_from_config(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_string_lossy().to_string()));
        }

        log4rs::config::load_config_file(path, Default::default())
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    fn create_config(
        root_level: LevelFilter,
        log_path: Option<impl AsRef<Path>>,
        loggers: Vec<(String, LevelFilter)>,
    ) -> Result<Config> {
        let mut root = Root::builder().appender(CONSOLE_APPENDER);
        let mut config_builder = Config::builder().appender(
            Appender::builder().build(
                CONSOLE_APPENDER,
                Box::new(
                    ConsoleAppender::builder()
                        .encoder(Box::new(PatternEncoder::new(LOG_FORMAT_CONSOLE)))
                        .build(),
                ),
            ),
        );

        if let Some(path) = log_path {
            config_builder = config_builder.appender(Self::create_file_appender(path)?);
            root = root.appender(FILE_APPENDER);
        }

        let quiet_packages = QUIET_PACKAGES
            .iter()
            .filter(|package| !loggers.iter().any(|(name, _)| name == *package))
            .map(|package| (package.to_string(), LevelFilter::Info))
            .collect::<Vec<_>>();
        for (logger, level) in loggers.into_iter().chain(quiet_packages) {
            config_builder = config_builder.logger(Logger::builder().build(logger, level));
        }

        config_builder
            .build(root.build(root_level))
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    fn create_file_appender(path: impl AsRef<Path>) -> Result<Appender> {
        let path = path.as_ref();
        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        if let Err(e) = std::fs::create_dir_all(directory) {
            if e.kind() != std::io::ErrorKind::AlreadyExists {
                return Err(Error::from(e));
            }
        }

        // rolled files are kept next to the active log file
        let roll_pattern = directory.join(format!("{}.{{}}.log", LOG_FILE_NAME));
        let policy = CompoundPolicy::new(
            Box::new(SizeTrigger::new(LOG_FILE_SIZE)),
            Box::new(
                FixedWindowRoller::builder()
                    .base(1)
                    .build(&roll_pattern.to_string_lossy(), LOG_FILE_COUNT)
                    .map_err(|e| Error::InvalidConfig(e.to_string()))?,
            ),
        );

        Ok(Appender::builder().build(
            FILE_APPENDER,
            Box::new(
                RollingFileAppender::builder()
                    .encoder(Box::new(PatternEncoder::new(LOG_FORMAT_FILE)))
                    .append(false)
                    .build(path, Box::new(policy))
                    .map_err(|e| Error::InvalidConfig(e.to_string()))?,
            ),
        ))
    }
}

#[derive(Debug, Default)]
pub struct SessionLoggerBuilder {
    root_level: Option<LevelFilter>,
    config_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    loggers: HashMap<String, LevelFilter>,
}

impl SessionLoggerBuilder {
    /// Set the root level of the logger.
    pub fn root_level(&mut self, level: LevelFilter) -> &mut Self {
        self.root_level = Some(level);
        self
    }

    /// Set the path of the `log4rs.yml` config to load.
    pub fn config_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the log file path of the logger.
    pub fn log_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.log_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Add a log level filter for the given package.
    pub fn logger<S: AsRef<str>>(&mut self, package: S, level: LevelFilter) -> &mut Self {
        self.loggers.insert(package.as_ref().to_string(), level);
        self
    }

    /// Consumes the builder options and creates a new logging instance.
    pub fn build(&mut self) -> Result<SessionLogger> {
        let root_level = self.root_level.take().unwrap_or(LevelFilter::Info);
        let config_path = self.config_path.take();
        let log_path = self.log_path.take();
        let loggers = self.loggers.drain().collect::<Vec<_>>();

        SessionLogger::new(root_level, config_path, log_path, loggers)
    }
}
