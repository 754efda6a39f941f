//! Signature resolution mode
//!
//! Nodes resolve their fields either immediately (`Eager`) or on first
//! access (`Deferred`, the default). The mode is per thread; the scoped
//! [`TypecheckEager`] guard restores the previous mode when dropped, also
//! during unwinding.

use std::cell::Cell;

/// When a node resolves its signature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Resolution {
    /// Resolve and validate at construction
    Eager,
    /// Resolve on first access and memoize the outcome
    #[default]
    Deferred,
}

thread_local! {
    static RESOLUTION: Cell<Resolution> = const { Cell::new(Resolution::Deferred) };
}

/// Mode currently active on this thread
pub fn resolution() -> Resolution {
    RESOLUTION.with(Cell::get)
}

pub fn set_resolution(mode: Resolution) {
    RESOLUTION.with(|cell| cell.set(mode));
}

pub fn set_typecheck_eager(eager: bool) {
    set_resolution(if eager {
        Resolution::Eager
    } else {
        Resolution::Deferred
    });
}

pub fn should_typecheck_eagerly() -> bool {
    resolution() == Resolution::Eager
}

/// Run `f` with `mode` active, restoring the previous mode afterwards
pub fn with_resolution<R>(mode: Resolution, f: impl FnOnce() -> R) -> R {
    let _guard = ModeGuard::enter(mode);
    f()
}

struct ModeGuard {
    previous: Resolution,
}

impl ModeGuard {
    fn enter(mode: Resolution) -> Self {
        let previous = resolution();
        set_resolution(mode);
        Self { previous }
    }
}

impl Drop for ModeGuard {
    fn drop(&mut self) {
        set_resolution(self.previous);
    }
}

/// Forces eager resolution while alive
///
/// ```
/// use lazyconf::lazy::{should_typecheck_eagerly, TypecheckEager};
///
/// {
///     let _eager = TypecheckEager::new();
///     assert!(should_typecheck_eagerly());
/// }
/// assert!(!should_typecheck_eagerly());
/// ```
#[must_use = "the previous mode is restored as soon as the guard is dropped"]
pub struct TypecheckEager {
    _guard: ModeGuard,
}

impl TypecheckEager {
    pub fn new() -> Self {
        Self {
            _guard: ModeGuard::enter(Resolution::Eager),
        }
    }
}

impl Default for TypecheckEager {
    fn default() -> Self {
        Self::new()
    }
}
