//! Browser console plumbing: `log` records and panics.

use log::{Level, LevelFilter, Log, Metadata, Record};

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        #[cfg(target_arch = "wasm32")]
        {
            let line = format!("[{}] {}", record.target(), record.args()).into();
            match record.level() {
                Level::Error => web_sys::console::error_1(&line),
                Level::Warn => web_sys::console::warn_1(&line),
                Level::Info => web_sys::console::info_1(&line),
                Level::Debug => web_sys::console::log_1(&line),
                Level::Trace => web_sys::console::debug_1(&line),
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            if record.level() <= Level::Warn {
                eprintln!("[{}] {}", record.target(), record.args());
            }
        }
    }

    fn flush(&self) {}
}

/// Route `log` output to the console. Only the first call installs.
pub fn init_logger(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

pub fn panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Nodegram WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
