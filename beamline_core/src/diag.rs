// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Verbosity-gated diagnostics for hardware-facing operations.
//!
//! Diagnostics here are a side channel, not part of any functional
//! contract: operations succeed or degrade identically whether or not a
//! sink is attached. Events are typed ([`DiagEvent`]) and carry their own
//! minimum [`Verbosity`]; the [`Diag`] wrapper filters before dispatching
//! to an optional [`DiagSink`], so an absent sink or an insufficient
//! verbosity level costs one branch.
//!
//! Callers that would do extra work only to produce an event (e.g. read
//! additional hardware registers for a vblank-window dump) should gate
//! that work on [`Diag::enabled_at`] first.

use core::fmt;

use crate::beampos::BeamposCorrection;
use crate::screen::{CrtcId, ScreenId};

/// Diagnostic output level. `SILENT` suppresses everything; higher values
/// admit more detail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Verbosity(pub u8);

impl Verbosity {
    /// No diagnostic output at all.
    pub const SILENT: Self = Self(0);
    /// Warnings about degraded or unsupported operation.
    pub const WARNINGS: Self = Self(2);
    /// Informational notes (applied corrections and the like).
    pub const INFO: Self = Self(4);
    /// Hardware-level detail, including extra register reads.
    pub const DEBUG: Self = Self(6);
}

/// A diagnostic event emitted by this crate's operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagEvent {
    /// A non-neutral beamposition correction was stored for a screen.
    CorrectionApplied {
        /// Screen the correction applies to.
        screen: ScreenId,
        /// Primary scanout engine of the screen, if assigned.
        crtc: Option<CrtcId>,
        /// The stored correction.
        correction: BeamposCorrection,
    },
    /// Vertical-blank window decoded from hardware during auto-detection.
    VblankWindow {
        /// Screen being detected.
        screen: ScreenId,
        /// Scanout engine the registers were read from.
        crtc: CrtcId,
        /// First line of vertical blank.
        vbl_start: u32,
        /// Last line of vertical blank.
        vbl_end: u32,
        /// Active scanline count, where the hardware reports it.
        vactive: Option<u32>,
    },
    /// Refresh synchronization was requested but no platform strategy is
    /// installed; the caller falls back to unsynchronized presentation.
    SyncUnsupported {
        /// Number of screens the caller asked to synchronize.
        requested: usize,
    },
    /// Output dithering control was requested on hardware that does not
    /// support it.
    DitheringUnsupported {
        /// Screen the request targeted.
        screen: ScreenId,
    },
    /// Identity passthrough setup was requested on hardware that does not
    /// support it.
    PassthroughUnsupported {
        /// Screen the request targeted.
        screen: ScreenId,
    },
}

impl DiagEvent {
    /// The lowest verbosity at which this event is emitted.
    #[must_use]
    pub const fn min_verbosity(&self) -> Verbosity {
        match self {
            Self::SyncUnsupported { .. } | Self::DitheringUnsupported { .. } => {
                Verbosity::WARNINGS
            }
            Self::CorrectionApplied { .. } | Self::PassthroughUnsupported { .. } => {
                Verbosity::INFO
            }
            Self::VblankWindow { .. } => Verbosity::DEBUG,
        }
    }
}

/// Receives diagnostic events that pass the verbosity filter.
///
/// Implementations decide presentation (human-readable lines, structured
/// export, test capture). They must not influence control flow.
pub trait DiagSink {
    /// Handles one event.
    fn event(&mut self, event: &DiagEvent);
}

/// Verbosity filter over an optional [`DiagSink`].
///
/// Operations take `&mut Diag<'_>`; pass [`Diag::disabled`] to run
/// silently.
pub struct Diag<'a> {
    sink: Option<&'a mut dyn DiagSink>,
    verbosity: Verbosity,
}

impl fmt::Debug for Diag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diag")
            .field("verbosity", &self.verbosity)
            .field("attached", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> Diag<'a> {
    /// Creates a filter dispatching to `sink` at the given verbosity.
    #[must_use]
    pub fn new(verbosity: Verbosity, sink: &'a mut dyn DiagSink) -> Self {
        Self {
            sink: Some(sink),
            verbosity,
        }
    }

    /// A filter that drops every event.
    #[must_use]
    pub const fn disabled() -> Diag<'static> {
        Diag {
            sink: None,
            verbosity: Verbosity::SILENT,
        }
    }

    /// Returns whether events at `level` would currently be delivered.
    ///
    /// Use this to skip work whose only purpose is producing an event.
    #[must_use]
    pub fn enabled_at(&self, level: Verbosity) -> bool {
        self.sink.is_some() && self.verbosity >= level
    }

    /// Delivers `event` if the verbosity filter admits it.
    pub fn emit(&mut self, event: DiagEvent) {
        if self.verbosity >= event.min_verbosity()
            && let Some(sink) = self.sink.as_deref_mut()
        {
            sink.event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct CaptureSink {
        events: Vec<DiagEvent>,
    }

    impl DiagSink for CaptureSink {
        fn event(&mut self, event: &DiagEvent) {
            self.events.push(*event);
        }
    }

    #[test]
    fn events_below_threshold_are_dropped() {
        let mut sink = CaptureSink::default();
        let mut diag = Diag::new(Verbosity::WARNINGS, &mut sink);

        diag.emit(DiagEvent::SyncUnsupported { requested: 2 });
        diag.emit(DiagEvent::CorrectionApplied {
            screen: ScreenId(0),
            crtc: Some(CrtcId(0)),
            correction: BeamposCorrection::new(10, 1125),
        });
        drop(diag);

        assert_eq!(sink.events.len(), 1, "INFO event must not pass WARNINGS");
        assert!(matches!(sink.events[0], DiagEvent::SyncUnsupported { .. }));
    }

    #[test]
    fn disabled_filter_reports_nothing_enabled() {
        let diag = Diag::disabled();
        assert!(!diag.enabled_at(Verbosity::SILENT));
        assert!(!diag.enabled_at(Verbosity::DEBUG));
    }

    #[test]
    fn enabled_at_tracks_threshold() {
        let mut sink = CaptureSink::default();
        let diag = Diag::new(Verbosity::INFO, &mut sink);
        assert!(diag.enabled_at(Verbosity::WARNINGS));
        assert!(diag.enabled_at(Verbosity::INFO));
        assert!(!diag.enabled_at(Verbosity::DEBUG));
    }

    #[test]
    fn debug_events_pass_at_debug_verbosity() {
        let mut sink = CaptureSink::default();
        let mut diag = Diag::new(Verbosity::DEBUG, &mut sink);

        diag.emit(DiagEvent::VblankWindow {
            screen: ScreenId(1),
            crtc: CrtcId(1),
            vbl_start: 1084,
            vbl_end: 1124,
            vactive: Some(1080),
        });
        drop(diag);

        assert_eq!(sink.events.len(), 1);
    }
}
