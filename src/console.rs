//! Console output bridged to the host.
//!
//! The host installs a sink with [`init`]; everything printed through
//! [`print!`](crate::print)/[`println!`](crate::println) or logged through
//! the `log` facade ends up there. Output is dropped until a sink exists.

use alloc::fmt;
use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

/// Receives one fully formatted chunk of console output.
pub type Sink = fn(&str);

static SINK: Mutex<Option<Sink>> = Mutex::new(None);

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Install the console sink and route the `log` facade to it.
///
/// Calling this again swaps the sink; the logger is registered once.
pub fn init(sink: Sink) {
    *SINK.lock() = Some(sink);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

/// Remove the sink. Later output is dropped.
pub fn detach() {
    *SINK.lock() = None;
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    // Copy the sink out so a sink that prints cannot deadlock on SINK.
    let sink = *SINK.lock();
    if let Some(sink) = sink {
        sink(&fmt::format(args));
    }
}

/// Print to the host console.
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::console::_print(format_args!($($arg)*)));
}

/// Print to the host console with newline.
#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}

/// `log` backend writing `[LEVEL] message` lines to the console.
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            crate::println!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Sink writing to the host's `console_log(ptr, len)` import.
#[cfg(target_arch = "wasm32")]
pub fn host_sink(text: &str) {
    #[link(wasm_import_module = "env")]
    extern "C" {
        fn console_log(ptr: *const u8, len: usize);
    }

    // SAFETY: the host only reads `len` bytes starting at `ptr`.
    unsafe { console_log(text.as_ptr(), text.len()) }
}
