//! Progress relay between the native VPN library and the host application
//!
//! The native library reports status and log lines through a single
//! process-wide sink. The host registers the sink once (last writer wins),
//! the library emits whenever it has something to say, and every event is
//! rendered, bounded and forwarded synchronously on the calling thread.
//! Events emitted while no sink is registered are dropped.

use crate::config::RelayConfig;
use lazy_static::lazy_static;
use std::fmt;
use std::os::raw::{c_int, c_void};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Default capacity for a rendered progress message, in bytes
pub const MESSAGE_CAPACITY: usize = 512;

/// Severity levels used by the native library. Values outside this range are
/// legal and forwarded untouched; the relay only compares them against the
/// configured level floor.
pub const LEVEL_ERR: c_int = 0;
pub const LEVEL_INFO: c_int = 1;
pub const LEVEL_DEBUG: c_int = 2;
pub const LEVEL_TRACE: c_int = 3;

/// Sink registered by the host application
///
/// Called synchronously on whatever thread the native library emits from, so
/// it must be reentrant and thread-safe. The relay does not catch panics or
/// other misbehavior inside the sink.
pub type ProgressSink = Box<dyn Fn(*mut c_void, c_int, &str) + Send + Sync>;

// Relay state shared across FFI calls
lazy_static! {
    static ref PROGRESS_SINK: RwLock<Option<ProgressSink>> = RwLock::new(None);
    static ref RELAY_SETTINGS: RwLock<RelayConfig> = RwLock::new(RelayConfig::default());
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Register the process-wide progress sink
///
/// Replaces any previously registered sink completely; the old sink is not
/// notified and receives no further events. Events already in flight on other
/// threads still go to the sink they observed.
pub fn set_sink<F>(sink: F)
where
    F: Fn(*mut c_void, c_int, &str) + Send + Sync + 'static,
{
    *write_lock(&PROGRESS_SINK) = Some(Box::new(sink));
}

/// Remove the progress sink; subsequent events are dropped
pub fn clear_sink() {
    *write_lock(&PROGRESS_SINK) = None;
}

/// Apply relay settings process-wide
///
/// Affects subsequent [`emit`] calls only.
pub fn configure(settings: RelayConfig) {
    *write_lock(&RELAY_SETTINGS) = settings;
}

/// Render a progress message and forward it to the registered sink
///
/// The message is rendered into a bounded buffer (truncated silently at the
/// configured capacity, on a character boundary) and at most one trailing
/// newline is removed. Events below the configured level floor, and events
/// emitted while no sink is registered, are dropped. The sink runs
/// synchronously on the calling thread.
pub fn emit(context: *mut c_void, level: c_int, args: fmt::Arguments<'_>) {
    let (capacity, min_level, forward_empty) = {
        let settings = read_lock(&RELAY_SETTINGS);
        (
            settings.message_capacity,
            settings.min_level,
            settings.forward_empty,
        )
    };

    if level > min_level {
        return;
    }

    let mut writer = BoundedWriter::with_capacity(capacity);
    let _ = fmt::write(&mut writer, args);
    let mut message = writer.into_inner();

    // Strip at most one trailing newline. An empty rendering has nothing to
    // strip and stays empty.
    if message.ends_with('\n') {
        message.pop();
    }

    if message.is_empty() && !forward_empty {
        return;
    }

    let slot = read_lock(&PROGRESS_SINK);
    if let Some(sink) = slot.as_ref() {
        sink(context, level, &message);
    }
}

/// Register the built-in sink that forwards native messages to the `log`
/// facade, mapping the native severity to a log level
pub fn install_log_sink() {
    set_sink(|_context, level, message| match level {
        LEVEL_ERR => log::error!("{message}"),
        LEVEL_INFO => log::info!("{message}"),
        LEVEL_TRACE => log::trace!("{message}"),
        _ => log::debug!("{message}"),
    });
}

/// Write adapter that drops anything past its capacity instead of failing
struct BoundedWriter {
    buf: String,
    capacity: usize,
}

impl BoundedWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::new(),
            capacity,
        }
    }

    fn into_inner(self) -> String {
        self.buf
    }
}

impl fmt::Write for BoundedWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let remaining = self.capacity.saturating_sub(self.buf.len());
        if remaining == 0 {
            return Ok(());
        }

        if s.len() <= remaining {
            self.buf.push_str(s);
        } else {
            // Back up to a character boundary so the cut never splits a
            // multi-byte sequence.
            let mut end = remaining;
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            self.buf.push_str(&s[..end]);
        }

        Ok(())
    }
}

// The sink slot is process-wide, so tests touching it serialize on this lock.
#[cfg(test)]
pub(crate) fn sink_test_guard() -> std::sync::MutexGuard<'static, ()> {
    static SINK_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    SINK_TEST_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;
    use std::sync::{Arc, Mutex};
    use std::thread;

    type Received = Arc<Mutex<Vec<(c_int, String)>>>;

    fn collecting_sink() -> (Received, impl Fn(*mut c_void, c_int, &str) + Send + Sync + 'static) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink_received = received.clone();
        let sink = move |_context: *mut c_void, level: c_int, message: &str| {
            sink_received
                .lock()
                .unwrap()
                .push((level, message.to_string()));
        };
        (received, sink)
    }

    fn emit_text(level: c_int, text: &str) {
        emit(ptr::null_mut(), level, format_args!("{text}"));
    }

    #[test]
    fn test_last_registered_sink_wins() {
        let _guard = sink_test_guard();
        configure(RelayConfig::default());

        let (first, first_sink) = collecting_sink();
        let (second, second_sink) = collecting_sink();

        set_sink(first_sink);
        emit_text(LEVEL_INFO, "one");

        set_sink(second_sink);
        emit_text(LEVEL_INFO, "two");

        clear_sink();
        emit_text(LEVEL_INFO, "three");

        assert_eq!(
            first.lock().unwrap().as_slice(),
            &[(LEVEL_INFO, "one".to_string())]
        );
        assert_eq!(
            second.lock().unwrap().as_slice(),
            &[(LEVEL_INFO, "two".to_string())]
        );
    }

    #[test]
    fn test_strips_exactly_one_trailing_newline() {
        let _guard = sink_test_guard();
        configure(RelayConfig::default());

        let (received, sink) = collecting_sink();
        set_sink(sink);

        emit_text(LEVEL_INFO, "connected\n");
        emit_text(LEVEL_INFO, "a\n\n");
        emit_text(LEVEL_INFO, "no newline");
        clear_sink();

        let received = received.lock().unwrap();
        assert_eq!(received[0].1, "connected");
        assert_eq!(received[1].1, "a\n");
        assert_eq!(received[2].1, "no newline");
    }

    #[test]
    fn test_empty_message_is_safe() {
        let _guard = sink_test_guard();
        configure(RelayConfig::default());

        let (received, sink) = collecting_sink();
        set_sink(sink);

        emit_text(LEVEL_INFO, "");
        // A lone newline strips down to the empty message.
        emit_text(LEVEL_INFO, "\n");
        clear_sink();

        let received = received.lock().unwrap();
        assert_eq!(
            received.as_slice(),
            &[(LEVEL_INFO, String::new()), (LEVEL_INFO, String::new())]
        );
    }

    #[test]
    fn test_empty_message_droppable_via_config() {
        let _guard = sink_test_guard();
        configure(RelayConfig {
            forward_empty: false,
            ..RelayConfig::default()
        });

        let (received, sink) = collecting_sink();
        set_sink(sink);

        emit_text(LEVEL_INFO, "\n");
        emit_text(LEVEL_INFO, "kept");
        clear_sink();
        configure(RelayConfig::default());

        assert_eq!(
            received.lock().unwrap().as_slice(),
            &[(LEVEL_INFO, "kept".to_string())]
        );
    }

    #[test]
    fn test_truncates_to_capacity() {
        let _guard = sink_test_guard();
        configure(RelayConfig::default());

        let (received, sink) = collecting_sink();
        set_sink(sink);

        let long = "x".repeat(MESSAGE_CAPACITY + 100);
        emit_text(LEVEL_INFO, &long);
        clear_sink();

        let received = received.lock().unwrap();
        assert_eq!(received[0].1.len(), MESSAGE_CAPACITY);
        assert!(long.starts_with(&received[0].1));
    }

    #[test]
    fn test_truncation_respects_character_boundaries() {
        let _guard = sink_test_guard();
        configure(RelayConfig {
            message_capacity: 5,
            ..RelayConfig::default()
        });

        let (received, sink) = collecting_sink();
        set_sink(sink);

        // Two-byte characters: five bytes of capacity fit only two of them.
        emit_text(LEVEL_INFO, "ééé");
        clear_sink();
        configure(RelayConfig::default());

        assert_eq!(received.lock().unwrap()[0].1, "éé");
    }

    #[test]
    fn test_level_floor_filters_verbose_events() {
        let _guard = sink_test_guard();
        configure(RelayConfig {
            min_level: LEVEL_ERR,
            ..RelayConfig::default()
        });

        let (received, sink) = collecting_sink();
        set_sink(sink);

        emit_text(LEVEL_DEBUG, "too verbose");
        emit_text(LEVEL_ERR, "handshake failed");
        clear_sink();
        configure(RelayConfig::default());

        assert_eq!(
            received.lock().unwrap().as_slice(),
            &[(LEVEL_ERR, "handshake failed".to_string())]
        );
    }

    #[test]
    fn test_format_arguments_are_rendered() {
        let _guard = sink_test_guard();
        configure(RelayConfig::default());

        let (received, sink) = collecting_sink();
        set_sink(sink);

        emit(
            ptr::null_mut(),
            LEVEL_DEBUG,
            format_args!("reconnect attempt {} of {}\n", 2, 5),
        );
        clear_sink();

        assert_eq!(
            received.lock().unwrap().as_slice(),
            &[(LEVEL_DEBUG, "reconnect attempt 2 of 5".to_string())]
        );
    }

    #[test]
    fn test_concurrent_emit_keeps_messages_intact() {
        let _guard = sink_test_guard();
        configure(RelayConfig::default());

        let (received, sink) = collecting_sink();
        set_sink(sink);

        let threads: Vec<_> = (0..8)
            .map(|t| {
                thread::spawn(move || {
                    for i in 0..50 {
                        emit(
                            ptr::null_mut(),
                            LEVEL_TRACE,
                            format_args!("worker {t} event {i}\n"),
                        );
                    }
                })
            })
            .collect();
        for handle in threads {
            handle.join().unwrap();
        }
        clear_sink();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 8 * 50);
        for (_, message) in received.iter() {
            let mut words = message.split(' ');
            assert_eq!(words.next(), Some("worker"));
            let t: usize = words.next().unwrap().parse().unwrap();
            assert_eq!(words.next(), Some("event"));
            let i: usize = words.next().unwrap().parse().unwrap();
            assert!(words.next().is_none());
            assert!(t < 8 && i < 50);
        }
    }
}
