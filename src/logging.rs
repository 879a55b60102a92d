//! Browser-console logging.
//!
//! `tracing` events are formatted by `tracing-subscriber` (no timestamps, no
//! ANSI colours) and each finished line goes to `console.log` /
//! `console.warn` / `console.error` by level. Native builds install nothing;
//! tests run without a subscriber.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the panic hook and console subscriber. Safe to call repeatedly.
pub fn init() {
    INIT.call_once(|| {
        #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))]
        console_error_panic_hook::set_once();

        #[cfg(target_arch = "wasm32")]
        console::install();
    });
}

#[cfg(target_arch = "wasm32")]
mod console {
    use std::io;

    use tracing::{Level, Metadata};
    use tracing_subscriber::fmt::MakeWriter;
    use wasm_bindgen::JsValue;

    /// Buffers one formatted event and emits it on drop.
    pub struct ConsoleWriter {
        level: Level,
        buf: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let line = String::from_utf8_lossy(&self.buf);
            let line = JsValue::from_str(line.trim_end());
            match self.level {
                Level::ERROR => web_sys::console::error_1(&line),
                Level::WARN => web_sys::console::warn_1(&line),
                Level::DEBUG | Level::TRACE => web_sys::console::debug_1(&line),
                _ => web_sys::console::log_1(&line),
            }
        }
    }

    pub struct MakeConsoleWriter;

    impl<'a> MakeWriter<'a> for MakeConsoleWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter {
                level: Level::INFO,
                buf: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            ConsoleWriter {
                level: *meta.level(),
                buf: Vec::new(),
            }
        }
    }

    pub fn install() {
        let _ = tracing_subscriber::fmt()
            .with_writer(MakeConsoleWriter)
            .without_time()
            .with_ansi(false)
            .with_target(false)
            .with_max_level(Level::DEBUG)
            .try_init();
    }
}
