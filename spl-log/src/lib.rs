use std::{
    io::IsTerminal,
    str::FromStr,
    sync::{Arc, Mutex, OnceLock},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

fn log_default(level: Level, fmt: std::fmt::Arguments, source: &str) {
    let level_str = if std::io::stderr().is_terminal() {
        match level {
            Level::Trace => "\x1b[1;37mtrace\x1b[0m",
            Level::Debug => "\x1b[1;35mdebug\x1b[0m",
            Level::Info => "\x1b[1;34m info\x1b[0m",
            Level::Warn => "\x1b[1;33m warn\x1b[0m",
            Level::Error => "\x1b[1;31merror\x1b[0m",
        }
    } else {
        match level {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => " info",
            Level::Warn => " warn",
            Level::Error => "error",
        }
    };

    let module_space = if source.is_empty() { "" } else { " " };
    eprintln!("[spl {level_str}{module_space}{source}] {fmt}");
}

/// A host-installed sink for log messages, called as `(level, source, message)`.
///
/// Media players embedding the subsystem use this to route messages into
/// their own logging instead of stderr.
pub type HostLogCallback = Box<dyn Fn(Level, &str, &str) + Send>;

pub enum MessageCallback {
    Default,
    Host(HostLogCallback),
}

impl std::fmt::Debug for MessageCallback {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => fmt.write_str("Default"),
            Self::Host(_) => fmt.write_str("Host(..)"),
        }
    }
}

impl MessageCallback {
    fn log(&self, level: Level, fmt: std::fmt::Arguments, source: &str) {
        const CRATE_MODULE_PREFIX: &str = "subplate::";

        let module_rel = source.strip_prefix(CRATE_MODULE_PREFIX).unwrap_or(source);

        match self {
            Self::Default => {
                let filter = ENV_LOG_FILTER.get_or_init(|| parse_log_env_var().unwrap_or_default());
                if !filter.filter(level) {
                    return;
                }

                log_default(level, fmt, module_rel)
            }
            Self::Host(callback) => {
                if let Some(literal) = fmt.as_str() {
                    callback(level, module_rel, literal)
                } else {
                    callback(level, module_rel, &fmt.to_string())
                }
            }
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

pub trait Logger: sealed::Sealed {
    fn log(&self, level: Level, fmt: std::fmt::Arguments, source: &str);
}

#[derive(Debug)]
struct RootLoggerImpl {
    callback: MessageCallback,
}

#[derive(Debug)]
pub struct RootLogger {
    root: Arc<Mutex<RootLoggerImpl>>,
}

impl RootLogger {
    pub fn new() -> Self {
        Self {
            root: Arc::new(Mutex::new(RootLoggerImpl {
                callback: MessageCallback::Default,
            })),
        }
    }

    pub fn set_message_callback(&mut self, callback: MessageCallback) {
        self.root.lock().unwrap().callback = callback;
    }
}

impl Logger for RootLogger {
    fn log(&self, level: Level, fmt: std::fmt::Arguments, module_path: &str) {
        self.root
            .lock()
            .unwrap()
            .callback
            .log(level, fmt, module_path)
    }
}

impl sealed::Sealed for RootLogger {}

pub trait AsLogger {
    fn as_logger(&self) -> &impl Logger;
}

impl<T: AsLogger> AsLogger for &T {
    fn as_logger(&self) -> &impl Logger {
        <T as AsLogger>::as_logger(*self)
    }
}

impl<T: AsLogger> AsLogger for &mut T {
    fn as_logger(&self) -> &impl Logger {
        <T as AsLogger>::as_logger(*self)
    }
}

impl AsLogger for RootLogger {
    fn as_logger(&self) -> &impl Logger {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum LevelFilter {
    Level(Level),
    None,
}

impl LevelFilter {
    fn filter(self, level: Level) -> bool {
        match self {
            LevelFilter::Level(filter) => level >= filter,
            LevelFilter::None => false,
        }
    }
}

impl FromStr for LevelFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "trace" => Self::Level(Level::Trace),
            "debug" => Self::Level(Level::Debug),
            "info" => Self::Level(Level::Info),
            "warn" => Self::Level(Level::Warn),
            "error" => Self::Level(Level::Error),
            "none" => Self::None,
            _ => return Err(()),
        })
    }
}

struct LogFilter {
    top_level: LevelFilter,
}

impl LogFilter {
    fn filter(&self, level: Level) -> bool {
        self.top_level.filter(level)
    }
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            #[cfg(not(debug_assertions))]
            top_level: LevelFilter::Level(Level::Warn),
            #[cfg(debug_assertions)]
            top_level: LevelFilter::Level(Level::Debug),
        }
    }
}

fn parse_log_env_var() -> Option<LogFilter> {
    let text = std::env::var("SPL_LOG").ok()?;

    Some(LogFilter {
        top_level: text.parse().ok()?,
    })
}

static ENV_LOG_FILTER: OnceLock<LogFilter> = OnceLock::new();

#[macro_export]
macro_rules! log {
    ($logger: expr, $level: expr, $($fmt: tt)*) => {
        $crate::Logger::log(
            $crate::AsLogger::as_logger(&$logger),
            $level, format_args!($($fmt)*), module_path!()
        )
    };
    (@mkmacro $dollar: tt, $name: ident, $level: ident) => {
        #[macro_export]
        #[clippy::format_args]
        macro_rules! $name {
            ($dollar logger: expr, $dollar ($dollar rest: tt)*) => {
                $crate::log!($dollar logger, $crate::Level::$level, $dollar ($dollar rest)*)
            }
        }
    }
}

log!(@mkmacro $, trace, Trace);
log!(@mkmacro $, debug, Debug);
log!(@mkmacro $, warning, Warn);
log!(@mkmacro $, info, Info);
log!(@mkmacro $, error, Error);
