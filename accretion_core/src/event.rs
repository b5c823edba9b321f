// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-feature listener registry and synchronous event dispatch.
//!
//! Every feature owns a [`FeatureEvents`] instance. Listeners are plain
//! callables registered in order; dispatch is synchronous, on the calling
//! thread, inside the mutation call itself. For a single feature, events
//! fire strictly in write order — each write is one atomic unit from the
//! observers' perspective.
//!
//! # Failure isolation
//!
//! A listener that returns an error is reported to the feature's
//! [`DiagnosticSink`](crate::trace::DiagnosticSink) and never prevents the
//! remaining listeners from running, nor does it propagate to the mutation
//! call site.
//!
//! # Re-entrancy
//!
//! The handler list is snapshotted before dispatch, so listeners may
//! register or remove handlers while an event is in flight. Value setters
//! on non-buffer features additionally hold a [`MutationGuard`] so a
//! listener side effect cannot recursively re-enter the same setter —
//! the nested call is a silent no-op, and the guard releases on every exit
//! path, including early returns from errors.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::Rect;

use crate::color::Rgba;
use crate::colormap::Colormap;
use crate::graphic::{GraphicId, NodeId};
use crate::index::RowKey;
use crate::trace::DiagnosticSink;

/// Which feature of a graphic changed.
///
/// The string tags mirror the event names exposed to user callbacks
/// ("data", "colors", "cmap", …). Positions and image texels share the
/// "data" tag; they are distinguished by the originating feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Vertex positions.
    Positions,
    /// Per-vertex RGBA colors.
    Colors,
    /// The single uniform color of a graphic.
    UniformColor,
    /// Per-vertex point sizes.
    Sizes,
    /// The single uniform size/thickness of a graphic.
    UniformSize,
    /// Colormap association (vertex or image).
    Cmap,
    /// Alpha applied across the color buffer.
    Alpha,
    /// Image texel data.
    ImageData,
    /// Lower bound of the image value window.
    Vmin,
    /// Upper bound of the image value window.
    Vmax,
    /// Selector position or bounds.
    Selection,
}

impl FeatureKind {
    /// Returns the event-name tag for user-facing callbacks.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positions | Self::ImageData => "data",
            Self::Colors => "colors",
            Self::UniformColor => "color",
            Self::Sizes => "sizes",
            Self::UniformSize => "size",
            Self::Cmap => "cmap",
            Self::Alpha => "alpha",
            Self::Vmin => "vmin",
            Self::Vmax => "vmax",
            Self::Selection => "selection",
        }
    }
}

/// The new value carried by a [`ChangeEvent`].
#[derive(Clone, Debug, PartialEq)]
pub enum EventValue {
    /// No value payload (e.g. a cleared association).
    None,
    /// A scalar (alpha, size, vmin/vmax, linear selection).
    Scalar(f64),
    /// A single color.
    Rgba(Rgba),
    /// The written block, row-major, in selection order.
    Rows(Vec<f32>),
    /// A colormap association; `None` clears it.
    Cmap(Option<Colormap>),
    /// A rectangular region (region selection).
    Rect(Rect),
}

/// Back-reference to the graphic that originated an event.
///
/// Populated by the owning graphic, not by the feature itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventSource {
    /// The originating graphic.
    pub graphic: GraphicId,
    /// The graphic's underlying scene-graph node.
    pub node: NodeId,
}

/// Structured description of one change, delivered synchronously to every
/// registered listener in registration order.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    /// Which feature changed.
    pub kind: FeatureKind,
    /// The originating graphic, if the feature is attached to one.
    pub source: Option<EventSource>,
    /// The key used for indexing, when the change was an indexed write.
    pub key: Option<RowKey>,
    /// The new value.
    pub value: EventValue,
}

impl ChangeEvent {
    /// Returns the event-name tag ("data", "colors", …).
    #[must_use]
    pub const fn type_str(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// An error returned by a listener.
///
/// Listener errors are isolated at the dispatch boundary: reported to the
/// diagnostics sink, never propagated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    /// Creates a listener error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener failed: {}", self.message)
    }
}

impl core::error::Error for ListenerError {}

/// Errors from handler registry operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventError {
    /// The handler was never registered on this feature.
    MissingHandler {
        /// The feature the removal was attempted on.
        feature: FeatureKind,
    },
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHandler { feature } => write!(
                f,
                "handler is not registered on the \"{}\" feature",
                feature.as_str()
            ),
        }
    }
}

impl core::error::Error for EventError {}

/// A registered listener.
///
/// Identity (for duplicate detection and removal) is the `Rc` allocation:
/// clone the same `Rc` to refer to the same registration.
pub type EventHandler = Rc<dyn Fn(&ChangeEvent) -> Result<(), ListenerError>>;

/// Listener registry and dispatcher for one feature instance.
pub struct FeatureEvents {
    kind: FeatureKind,
    handlers: RefCell<Vec<EventHandler>>,
    blocked: Cell<bool>,
    source: Cell<Option<EventSource>>,
    diagnostics: RefCell<Option<Rc<dyn DiagnosticSink>>>,
}

impl fmt::Debug for FeatureEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureEvents")
            .field("kind", &self.kind)
            .field("handlers", &self.handlers.borrow().len())
            .field("blocked", &self.blocked.get())
            .field("source", &self.source.get())
            .finish_non_exhaustive()
    }
}

impl FeatureEvents {
    /// Creates an empty registry for a feature of the given kind.
    #[must_use]
    pub fn new(kind: FeatureKind) -> Self {
        Self {
            kind,
            handlers: RefCell::new(Vec::new()),
            blocked: Cell::new(false),
            source: Cell::new(None),
            diagnostics: RefCell::new(None),
        }
    }

    /// The feature kind events are tagged with.
    #[must_use]
    pub const fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// Sets the graphic back-reference stamped onto every event.
    pub fn set_source(&self, source: Option<EventSource>) {
        self.source.set(source);
    }

    /// The current graphic back-reference.
    #[must_use]
    pub fn source(&self) -> Option<EventSource> {
        self.source.get()
    }

    /// Installs the diagnostics sink for listener failures and warnings.
    pub fn set_diagnostics(&self, sink: Option<Rc<dyn DiagnosticSink>>) {
        *self.diagnostics.borrow_mut() = sink;
    }

    /// Registers a listener. Adding the same `Rc` twice is a diagnostic
    /// warning and a no-op.
    pub fn add_event_handler(&self, handler: EventHandler) {
        let mut handlers = self.handlers.borrow_mut();
        if handlers.iter().any(|h| Rc::ptr_eq(h, &handler)) {
            drop(handlers);
            let diag = self.diagnostics.borrow().clone();
            if let Some(diag) = diag {
                diag.on_duplicate_handler(self.kind);
            }
            return;
        }
        handlers.push(handler);
    }

    /// Removes a previously registered listener.
    ///
    /// Removing a handler that was never registered is a hard error.
    pub fn remove_event_handler(&self, handler: &EventHandler) -> Result<(), EventError> {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|h| !Rc::ptr_eq(h, handler));
        if handlers.len() == before {
            return Err(EventError::MissingHandler { feature: self.kind });
        }
        Ok(())
    }

    /// Removes every listener.
    pub fn clear_event_handlers(&self) {
        self.handlers.borrow_mut().clear();
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Suppresses (or restores) dispatch without un-registering listeners.
    pub fn block_events(&self, blocked: bool) {
        self.blocked.set(blocked);
    }

    /// Whether dispatch is currently suppressed.
    #[must_use]
    pub fn events_blocked(&self) -> bool {
        self.blocked.get()
    }

    /// Constructs a [`ChangeEvent`] and delivers it to every listener in
    /// registration order.
    ///
    /// The handler list is snapshotted first, so listeners may mutate the
    /// registry re-entrantly. Listener errors are reported to the
    /// diagnostics sink and do not stop dispatch.
    pub fn emit(&self, key: Option<RowKey>, value: EventValue) {
        if self.blocked.get() {
            return;
        }
        let snapshot: Vec<EventHandler> = self.handlers.borrow().clone();
        if snapshot.is_empty() {
            return;
        }
        let event = ChangeEvent {
            kind: self.kind,
            source: self.source.get(),
            key,
            value,
        };
        for handler in snapshot {
            if let Err(error) = handler(&event) {
                let diag = self.diagnostics.borrow().clone();
                if let Some(diag) = diag {
                    diag.on_listener_error(self.kind, &error);
                }
            }
        }
    }
}

/// RAII re-entrancy guard for `set_value`-style setters.
///
/// [`try_acquire`](Self::try_acquire) returns `None` while a mutation is
/// already in progress on the same flag; the caller treats that as a
/// silent no-op. The flag is released on drop, so every exit path —
/// including error returns — restores it.
#[derive(Debug)]
pub struct MutationGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> MutationGuard<'a> {
    /// Acquires the guard, or returns `None` if a mutation is in flight.
    #[must_use]
    pub fn try_acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.get() {
            return None;
        }
        flag.set(true);
        Some(Self { flag })
    }
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
