//! Failure interception.
//!
//! # Responsibilities
//! - Install the panic hook once per process
//! - Record panics raised while application code runs (message, location, backtrace)
//! - Convert unwinding into a `FailureEnvelope` at the guard boundary
//! - Keep the one-shot guard that lets translation fire at most once per cycle
//!
//! # Design Decisions
//! - The hook is process-wide but stores nothing process-wide: records go to a
//!   thread-local slot owned by whichever request cycle runs on that thread
//! - Outside a capture scope the previously installed hook runs unchanged
//! - The one-shot guard lives in the `Interceptor`, one per application

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Once;

use crate::failure::{FailureEnvelope, SourceLocation};

thread_local! {
    static LAST_PANIC: RefCell<Option<PanicRecord>> = const { RefCell::new(None) };
    static CAPTURE_DEPTH: Cell<usize> = const { Cell::new(0) };
}

static HOOK: Once = Once::new();

/// What the panic hook saw.
#[derive(Debug, Clone)]
pub struct PanicRecord {
    pub message: String,
    pub location: Option<SourceLocation>,
    pub backtrace: Option<String>,
}

impl PanicRecord {
    fn from_payload(payload: &(dyn Any + Send)) -> Self {
        Self {
            message: payload_message(payload),
            location: None,
            backtrace: None,
        }
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURE_DEPTH.with(Cell::get) == 0 {
                previous(info);
                return;
            }
            let record = PanicRecord {
                message: payload_message(info.payload()),
                location: info.location().map(|loc| SourceLocation {
                    file: loc.file().to_string(),
                    line: loc.line(),
                    column: loc.column(),
                }),
                backtrace: Some(Backtrace::force_capture().to_string()),
            };
            tracing::error!(
                message = %record.message,
                location = ?record.location,
                "Panic captured during request cycle"
            );
            LAST_PANIC.with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = Some(record);
                }
            });
        }));
    });
}

struct CaptureScope;

impl CaptureScope {
    fn enter() -> Self {
        CAPTURE_DEPTH.with(|d| d.set(d.get() + 1));
        CaptureScope
    }
}

impl Drop for CaptureScope {
    fn drop(&mut self) {
        CAPTURE_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Take the panic record left on this thread, if any.
pub fn take_pending() -> Option<PanicRecord> {
    LAST_PANIC.with(|slot| slot.try_borrow_mut().ok().and_then(|mut s| s.take()))
}

/// Run `f`, turning a panic into a runtime-failure envelope.
pub fn guard<R>(f: impl FnOnce() -> R) -> Result<R, FailureEnvelope> {
    install_hook();
    let outcome = {
        let _scope = CaptureScope::enter();
        panic::catch_unwind(AssertUnwindSafe(f))
    };
    outcome.map_err(|payload| {
        let record = take_pending().unwrap_or_else(|| PanicRecord::from_payload(payload.as_ref()));
        FailureEnvelope::from_panic(record)
    })
}

/// Run `f` inside a capture scope and discard any panic record it leaves.
///
/// Used by the translation path so a failing renderer neither prints through
/// the default hook nor leaves a record for the exit handler.
pub(crate) fn silenced<R>(f: impl FnOnce() -> R) -> R {
    install_hook();
    let result = {
        let _scope = CaptureScope::enter();
        f()
    };
    take_pending();
    result
}

/// Per-application interception state.
#[derive(Debug, Default)]
pub struct Interceptor {
    translated: AtomicBool,
    translations: AtomicUsize,
}

impl Interceptor {
    /// Install interception for a new request cycle on this thread.
    pub fn install() -> Self {
        install_hook();
        if let Some(stale) = take_pending() {
            tracing::debug!(message = %stale.message, "Discarding panic record from a previous cycle");
        }
        Self::default()
    }

    /// Claim the right to translate. Returns true exactly once.
    pub fn claim(&self) -> bool {
        let first = !self.translated.swap(true, Ordering::SeqCst);
        if first {
            self.translations.fetch_add(1, Ordering::SeqCst);
        }
        first
    }

    pub fn has_translated(&self) -> bool {
        self.translated.load(Ordering::SeqCst)
    }

    pub fn translation_count(&self) -> usize {
        self.translations.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureKind;

    #[test]
    fn test_guard_passes_values_through() {
        assert_eq!(guard(|| 7).unwrap(), 7);
    }

    #[test]
    fn test_guard_captures_panic_location() {
        let envelope = guard(|| -> u8 { panic!("undefined variable") }).unwrap_err();
        assert_eq!(envelope.kind, FailureKind::RuntimeFailure);
        assert!(envelope.message.starts_with("undefined variable in "));
        let location = envelope.location.expect("location recorded");
        assert!(location.file.ends_with("interception.rs"));
        assert!(envelope.backtrace.is_some());
        assert!(take_pending().is_none());
    }

    #[test]
    fn test_claim_is_one_shot() {
        let interceptor = Interceptor::install();
        assert!(!interceptor.has_translated());
        assert!(interceptor.claim());
        assert!(!interceptor.claim());
        assert!(!interceptor.claim());
        assert_eq!(interceptor.translation_count(), 1);
    }

    #[test]
    fn test_silenced_discards_record() {
        let result = silenced(|| panic::catch_unwind(|| panic!("renderer broke")));
        assert!(result.is_err());
        assert!(take_pending().is_none());
    }
}
