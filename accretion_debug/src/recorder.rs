// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording sinks for upload marks, diagnostics, and change events.
//!
//! Each recorder is a thin log intended to be shared behind
//! `Rc<RefCell<…>>` (upload/texel sinks) or `Rc` (diagnostics), then
//! drained or inspected by a test or debugging session.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use accretion_core::buffer::UploadSink;
use accretion_core::chunk::{TexelRect, TileSink};
use accretion_core::event::{ChangeEvent, EventHandler, FeatureKind, ListenerError};
use accretion_core::index::UploadRegion;
use accretion_core::trace::DiagnosticSink;

/// Records every upload region marked on a buffer.
#[derive(Debug, Default)]
pub struct UploadLog {
    regions: Vec<UploadRegion>,
}

impl UploadLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All regions marked so far, in mark order.
    #[must_use]
    pub fn regions(&self) -> &[UploadRegion] {
        &self.regions
    }

    /// Drains the log.
    pub fn take(&mut self) -> Vec<UploadRegion> {
        core::mem::take(&mut self.regions)
    }

    /// The union span of everything marked so far.
    #[must_use]
    pub fn union(&self) -> Option<UploadRegion> {
        let mut regions = self.regions.iter();
        let first = *regions.next()?;
        Some(regions.fold(first, |acc, r| acc.union(r)))
    }
}

impl UploadSink for UploadLog {
    fn update_range(&mut self, region: UploadRegion) {
        self.regions.push(region);
    }
}

/// Records every texel rect marked on one tile.
#[derive(Debug, Default)]
pub struct TexelLog {
    rects: Vec<TexelRect>,
}

impl TexelLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All rects marked so far, in mark order.
    #[must_use]
    pub fn rects(&self) -> &[TexelRect] {
        &self.rects
    }

    /// Drains the log.
    pub fn take(&mut self) -> Vec<TexelRect> {
        core::mem::take(&mut self.rects)
    }
}

impl TileSink for TexelLog {
    fn update_rect(&mut self, rect: TexelRect) {
        self.rects.push(rect);
    }
}

/// One recorded diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A listener failed during dispatch.
    ListenerFailed {
        /// The feature that dispatched the event.
        feature: FeatureKind,
        /// The listener's error message.
        message: String,
    },
    /// A handler was registered twice.
    DuplicateHandler {
        /// The feature the duplicate was added to.
        feature: FeatureKind,
    },
    /// Ingested data was converted to `f32`.
    DataConverted {
        /// The source element type.
        from: &'static str,
    },
}

/// Records diagnostics; share behind `Rc` and install with
/// `FeatureEvents::set_diagnostics`.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    /// Drains the log.
    pub fn take(&self) -> Vec<Diagnostic> {
        core::mem::take(&mut *self.entries.borrow_mut())
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn on_listener_error(&self, feature: FeatureKind, error: &ListenerError) {
        self.entries.borrow_mut().push(Diagnostic::ListenerFailed {
            feature,
            message: error.message().into(),
        });
    }

    fn on_duplicate_handler(&self, feature: FeatureKind) {
        self.entries
            .borrow_mut()
            .push(Diagnostic::DuplicateHandler { feature });
    }

    fn on_data_converted(&self, from: &'static str) {
        self.entries
            .borrow_mut()
            .push(Diagnostic::DataConverted { from });
    }
}

/// A ready-made listener that collects every dispatched event.
///
/// Register the handler from [`handler`](Self::handler) on any feature;
/// all registrations share this tap's event list.
pub struct EventTap {
    seen: Rc<RefCell<Vec<ChangeEvent>>>,
    handler: EventHandler,
}

impl fmt::Debug for EventTap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTap")
            .field("events", &self.seen.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Default for EventTap {
    fn default() -> Self {
        Self::new()
    }
}

impl EventTap {
    /// Creates an empty tap.
    #[must_use]
    pub fn new() -> Self {
        let seen: Rc<RefCell<Vec<ChangeEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let handler: EventHandler = Rc::new(move |event: &ChangeEvent| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });
        Self { seen, handler }
    }

    /// The listener to register. Cloning returns the same registration
    /// identity, so registering it twice on one feature is a duplicate.
    #[must_use]
    pub fn handler(&self) -> EventHandler {
        self.handler.clone()
    }

    /// All events seen so far, in dispatch order.
    #[must_use]
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.seen.borrow().clone()
    }

    /// Number of events seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.borrow().len()
    }

    /// Whether no events have been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.borrow().is_empty()
    }

    /// Drains the tap.
    pub fn take(&self) -> Vec<ChangeEvent> {
        core::mem::take(&mut *self.seen.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use accretion_core::color::Rgba;
    use accretion_core::feature::VertexColors;
    use accretion_core::index::RowKey;

    use super::*;

    #[test]
    fn upload_log_records_and_unions() {
        let colors = VertexColors::filled(10, Rgba::WHITE);
        let log = Rc::new(RefCell::new(UploadLog::new()));
        colors.share_buffer().bind_sink(log.clone());

        colors.set_color(&RowKey::Index(2), Rgba::RED).unwrap();
        colors.set_color(&RowKey::Index(7), Rgba::BLUE).unwrap();

        let log = log.borrow();
        assert_eq!(
            log.regions(),
            &[UploadRegion::new(2, 1), UploadRegion::new(7, 1)]
        );
        assert_eq!(log.union(), Some(UploadRegion::new(2, 6)));
    }

    #[test]
    fn event_tap_collects_in_order() {
        let colors = VertexColors::filled(4, Rgba::WHITE);
        let tap = EventTap::new();
        colors.events().add_event_handler(tap.handler());

        colors.set_color(&RowKey::Index(0), Rgba::RED).unwrap();
        colors.set_color(&RowKey::Index(1), Rgba::GREEN).unwrap();

        let events = tap.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].key, Some(RowKey::Index(0)));
        assert_eq!(events[1].key, Some(RowKey::Index(1)));
        assert_eq!(tap.take().len(), 2);
        assert!(tap.is_empty());
    }

    #[test]
    fn tap_handler_registers_as_one_identity() {
        let colors = VertexColors::filled(4, Rgba::WHITE);
        let diag = Rc::new(DiagnosticLog::new());
        colors.events().set_diagnostics(Some(diag.clone()));

        let tap = EventTap::new();
        colors.events().add_event_handler(tap.handler());
        colors.events().add_event_handler(tap.handler());

        assert_eq!(colors.events().handler_count(), 1);
        assert_eq!(
            diag.entries(),
            vec![Diagnostic::DuplicateHandler {
                feature: FeatureKind::Colors
            }]
        );
    }

    #[test]
    fn diagnostic_log_captures_listener_failures() {
        let colors = VertexColors::filled(4, Rgba::WHITE);
        let diag = Rc::new(DiagnosticLog::new());
        colors.events().set_diagnostics(Some(diag.clone()));
        colors
            .events()
            .add_event_handler(Rc::new(|_e| Err(ListenerError::new("observer broke"))));

        colors.set_color(&RowKey::Index(0), Rgba::RED).unwrap();

        assert_eq!(
            diag.take(),
            vec![Diagnostic::ListenerFailed {
                feature: FeatureKind::Colors,
                message: "observer broke".into()
            }]
        );
    }
}
