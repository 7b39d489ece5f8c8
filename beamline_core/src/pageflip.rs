// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pageflip detection via scanout-surface-address comparison.
//!
//! Swap-completion timestamps are only trustworthy when the buffer swap
//! happened as a hardware pageflip: the scanout engine switched its
//! source buffer at a vblank boundary. A copy-based swap, or a desktop
//! compositor that has not yet picked up the new frame, completes from
//! the application's point of view without the scanout source changing
//! at the expected time, and any timestamp recorded for it measures the
//! wrong event.
//!
//! The detection protocol brackets a swap:
//!
//! 1. [`FlipTracker::store_preflip`] captures the engine's current
//!    surface addresses, immediately before the swap is requested.
//! 2. The swap is issued and completion is detected by whatever means
//!    the platform provides.
//! 3. [`FlipTracker::classify_postflip`] captures again and compares.
//!
//! Only [`FlipState::FlipFinished`] certifies the recorded timestamp;
//! every other state must make the caller treat timing precision as
//! degraded. Both captures must happen within the same swap cycle;
//! overlapping cycles for one window are out of contract.

/// Scanout buffer addresses of one engine, captured atomically from the
/// hardware's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct SurfaceAddresses {
    /// Address of the primary scanout surface (front buffer).
    pub primary: u64,
    /// Address of the secondary surface, e.g. for frame-sequential
    /// stereo; zero where the hardware has none.
    pub secondary: u64,
}

/// One hardware query result: where the engine is scanning out from and
/// whether a queued flip has not yet latched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScanoutSnapshot {
    /// Current surface addresses.
    pub addresses: SurfaceAddresses,
    /// `true` while a programmed flip is queued but not yet completed.
    pub update_pending: bool,
}

/// Whether a pending swap has been waited out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwapWait {
    /// The swap has already completed (or the platform cannot tell and
    /// must assume it has).
    Completed,
    /// The swap is certain to happen but has not yet.
    Imminent,
}

/// Queries scanout surface state from the GPU.
///
/// Implemented by platform glue for GPU/driver combinations that expose
/// the surface address registers, and by test doubles. One probe serves
/// one onscreen window's engine.
pub trait SurfaceProbe {
    /// Captures the current scanout state, or `None` when the GPU/driver
    /// combination does not support the query.
    ///
    /// Unsupported is sticky for a session in practice, but the tracker
    /// re-asks on every call rather than caching the failure, so a probe
    /// that becomes usable is picked up on the next cycle.
    fn capture(&mut self) -> Option<ScanoutSnapshot>;

    /// Blocks until a pending swap has either completed or is certain to
    /// happen.
    ///
    /// The default reports [`SwapWait::Completed`]: platforms without a
    /// pollable swap status must assume completion and live with the
    /// degraded precision.
    fn wait_for_swap(&mut self) -> SwapWait {
        SwapWait::Completed
    }
}

/// Classification of how the last buffer swap was carried out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlipState {
    /// The hardware cannot be queried; nothing is known.
    Unknown,
    /// Scanout addresses did not change: copy-based swap, or a
    /// compositor that has not yet engaged.
    NoFlip,
    /// A pageflip was queued but has not completed. Likely a compositor
    /// flip still in flight.
    FlipPendingNotFinished,
    /// A pageflip completed. The recorded completion timestamp
    /// corresponds to a true scanout change.
    FlipFinished,
}

impl FlipState {
    /// Whether this state certifies a recorded swap-completion timestamp.
    #[must_use]
    pub const fn timestamp_trusted(self) -> bool {
        matches!(self, Self::FlipFinished)
    }
}

/// Per-window pageflip detection state.
///
/// Owned by the presentation window record; one tracker brackets one
/// swap cycle at a time. The stored preflip addresses are overwritten on
/// every cycle.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlipTracker {
    preflip: Option<SurfaceAddresses>,
}

impl FlipTracker {
    /// Creates a tracker with no captured preflip state.
    #[must_use]
    pub const fn new() -> Self {
        Self { preflip: None }
    }

    /// Captures the current surface addresses as the preflip reference.
    ///
    /// Call exactly once per swap cycle, immediately before requesting
    /// the buffer swap and never after. When the probe is unsupported
    /// the reference is cleared, and the cycle will classify as
    /// [`FlipState::Unknown`].
    pub fn store_preflip(&mut self, probe: &mut dyn SurfaceProbe) {
        self.preflip = probe.capture().map(|snapshot| snapshot.addresses);
    }

    /// Returns the preflip reference captured for the current cycle.
    #[must_use]
    pub const fn preflip(&self) -> Option<SurfaceAddresses> {
        self.preflip
    }

    /// Classifies the swap that was issued after the last
    /// [`store_preflip`](Self::store_preflip).
    ///
    /// Call after swap completion has been detected by conventional
    /// means. Without a capture-capable probe, or without a stored
    /// preflip reference, the answer is [`FlipState::Unknown`].
    #[must_use]
    pub fn classify_postflip(&self, probe: &mut dyn SurfaceProbe) -> FlipState {
        let Some(snapshot) = probe.capture() else {
            return FlipState::Unknown;
        };
        let Some(preflip) = self.preflip else {
            return FlipState::Unknown;
        };
        if snapshot.addresses != preflip {
            // Addresses moved, so a flip was at least queued since the
            // preflip capture.
            if snapshot.update_pending {
                FlipState::FlipPendingNotFinished
            } else {
                FlipState::FlipFinished
            }
        } else {
            FlipState::NoFlip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Probe double with scripted snapshots.
    struct FakeProbe {
        snapshot: Option<ScanoutSnapshot>,
    }

    impl FakeProbe {
        fn showing(primary: u64, secondary: u64) -> Self {
            Self {
                snapshot: Some(ScanoutSnapshot {
                    addresses: SurfaceAddresses { primary, secondary },
                    update_pending: false,
                }),
            }
        }

        fn unsupported() -> Self {
            Self { snapshot: None }
        }

        fn flip_to(&mut self, primary: u64, secondary: u64, pending: bool) {
            self.snapshot = Some(ScanoutSnapshot {
                addresses: SurfaceAddresses { primary, secondary },
                update_pending: pending,
            });
        }
    }

    impl SurfaceProbe for FakeProbe {
        fn capture(&mut self) -> Option<ScanoutSnapshot> {
            self.snapshot
        }
    }

    #[test]
    fn unchanged_addresses_classify_as_no_flip() {
        let mut probe = FakeProbe::showing(0xa000, 0xb000);
        let mut tracker = FlipTracker::new();
        tracker.store_preflip(&mut probe);
        assert_eq!(tracker.classify_postflip(&mut probe), FlipState::NoFlip);
    }

    #[test]
    fn changed_addresses_with_pending_update_are_not_finished() {
        let mut probe = FakeProbe::showing(0xa000, 0xb000);
        let mut tracker = FlipTracker::new();
        tracker.store_preflip(&mut probe);

        probe.flip_to(0xc000, 0xb000, true);
        assert_eq!(
            tracker.classify_postflip(&mut probe),
            FlipState::FlipPendingNotFinished
        );
    }

    #[test]
    fn changed_addresses_without_pending_update_are_finished() {
        let mut probe = FakeProbe::showing(0xa000, 0xb000);
        let mut tracker = FlipTracker::new();
        tracker.store_preflip(&mut probe);

        probe.flip_to(0xc000, 0xb000, false);
        let state = tracker.classify_postflip(&mut probe);
        assert_eq!(state, FlipState::FlipFinished);
        assert!(state.timestamp_trusted());
    }

    #[test]
    fn secondary_surface_change_alone_counts_as_flip() {
        let mut probe = FakeProbe::showing(0xa000, 0xb000);
        let mut tracker = FlipTracker::new();
        tracker.store_preflip(&mut probe);

        probe.flip_to(0xa000, 0xd000, false);
        assert_eq!(tracker.classify_postflip(&mut probe), FlipState::FlipFinished);
    }

    #[test]
    fn unsupported_probe_is_unknown() {
        let mut probe = FakeProbe::unsupported();
        let mut tracker = FlipTracker::new();
        tracker.store_preflip(&mut probe);
        assert_eq!(tracker.classify_postflip(&mut probe), FlipState::Unknown);
        assert!(!FlipState::Unknown.timestamp_trusted());
    }

    #[test]
    fn classification_without_stored_preflip_is_unknown() {
        let mut probe = FakeProbe::showing(0xa000, 0xb000);
        let tracker = FlipTracker::new();
        assert_eq!(tracker.classify_postflip(&mut probe), FlipState::Unknown);
    }

    #[test]
    fn preflip_reference_is_overwritten_each_cycle() {
        let mut probe = FakeProbe::showing(0xa000, 0xb000);
        let mut tracker = FlipTracker::new();
        tracker.store_preflip(&mut probe);

        probe.flip_to(0xc000, 0xb000, false);
        assert_eq!(tracker.classify_postflip(&mut probe), FlipState::FlipFinished);

        // Next cycle: re-arm against the new front buffer.
        tracker.store_preflip(&mut probe);
        assert_eq!(tracker.classify_postflip(&mut probe), FlipState::NoFlip);
    }

    #[test]
    fn default_wait_reports_completed() {
        let mut probe = FakeProbe::showing(0xa000, 0);
        assert_eq!(probe.wait_for_swap(), SwapWait::Completed);

        let mut tracker = FlipTracker::new();
        tracker.store_preflip(&mut probe);
        probe.flip_to(0xe000, 0, false);
        assert_eq!(probe.wait_for_swap(), SwapWait::Completed);
        assert_eq!(tracker.classify_postflip(&mut probe), FlipState::FlipFinished);
    }
}
