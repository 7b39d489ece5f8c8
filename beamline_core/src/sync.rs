// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-display refresh-cycle synchronization.
//!
//! Multiple outputs presenting one stimulus must scan out in phase, or
//! tearing-free presentation across them is impossible. Whether refresh
//! cycles *can* be synchronized (by hardware reset of the scanout
//! engines, or by drift-syncing video modes) depends entirely on the
//! platform and GPU, so the capability lives behind the [`SyncStrategy`]
//! seam and the portable entry point only owns the argument contract.
//!
//! Errors distinguish two very different situations:
//!
//! - [`SyncError::InvalidArguments`] is a programming-contract violation
//!   by the caller. Not recoverable, not retried.
//! - [`SyncError::Unimplemented`] means no strategy can do the job on
//!   this platform/configuration. Callers fall back to unsynchronized
//!   presentation (with a warning); treating this like a caller bug is
//!   itself a bug.

use alloc::vec::Vec;
use core::fmt;

use crate::diag::{Diag, DiagEvent};
use crate::mapping::DisplayMap;
use crate::screen::ScreenId;

/// Requested synchronization mechanism.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SyncMethod {
    /// Whatever mechanism is appropriate for the platform.
    #[default]
    DontCare,
    /// Hard sync only: fast and reliable engine reset, where supported.
    HardSync,
    /// Soft sync by drift-syncing the video modes.
    DriftSync,
}

impl SyncMethod {
    /// Decodes a raw numeric method id from calling code.
    ///
    /// Anything outside `0..=2` is a contract violation.
    pub const fn from_raw(raw: u32) -> Result<Self, SyncError> {
        match raw {
            0 => Ok(Self::DontCare),
            1 => Ok(Self::HardSync),
            2 => Ok(Self::DriftSync),
            _ => Err(SyncError::InvalidArguments("unknown sync method id")),
        }
    }
}

/// Error returned by [`synchronize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncError {
    /// The caller violated the argument contract. Fatal for the
    /// operation; indicates a caller bug.
    InvalidArguments(&'static str),
    /// No synchronization mechanism exists for this platform/config.
    /// Recoverable: present unsynchronized instead.
    Unimplemented,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArguments(what) => write!(f, "invalid sync arguments: {what}"),
            Self::Unimplemented => write!(f, "display sync not implemented on this platform"),
        }
    }
}

impl core::error::Error for SyncError {}

/// Platform mechanism for synchronizing scanout cycles.
///
/// Implementations receive pre-validated arguments: a non-empty screen
/// list within table bounds, a finite non-negative timeout, and a
/// non-negative residual tolerance.
pub trait SyncStrategy {
    /// Brings the refresh cycles of `screens` in phase, retrying until
    /// the per-screen residual (in scanlines, relative to the first
    /// screen as reference) is within `allowed_residual` or
    /// `timeout_secs` elapses.
    ///
    /// Returns the achieved residuals, one per screen, in request order.
    fn synchronize(
        &mut self,
        screens: &[ScreenId],
        method: SyncMethod,
        timeout_secs: f64,
        allowed_residual: i32,
    ) -> Result<Vec<i32>, SyncError>;
}

/// Validates a synchronization request and runs it on `strategy`.
///
/// An empty `screens` list requests synchronization of all screens known
/// to `map`. Without a strategy the request degrades to
/// [`SyncError::Unimplemented`] after validation, with a
/// [`DiagEvent::SyncUnsupported`] warning.
#[expect(
    clippy::cast_possible_truncation,
    reason = "screen indices are bounded by the mapping table and fit in u32"
)]
pub fn synchronize(
    map: &DisplayMap,
    strategy: Option<&mut dyn SyncStrategy>,
    screens: &[ScreenId],
    method: SyncMethod,
    timeout_secs: f64,
    allowed_residual: i32,
    diag: &mut Diag<'_>,
) -> Result<Vec<i32>, SyncError> {
    if screens.len() > map.num_displays() {
        return Err(SyncError::InvalidArguments(
            "more screens requested than available",
        ));
    }
    if screens.iter().any(|s| s.index() >= map.num_displays()) {
        return Err(SyncError::InvalidArguments("screen id out of range"));
    }
    if timeout_secs.is_nan() || timeout_secs < 0.0 {
        return Err(SyncError::InvalidArguments("negative sync timeout"));
    }
    if allowed_residual < 0 {
        return Err(SyncError::InvalidArguments(
            "negative residual tolerance",
        ));
    }

    let resolved: Vec<ScreenId> = if screens.is_empty() {
        (0..map.num_displays()).map(|i| ScreenId(i as u32)).collect()
    } else {
        screens.to_vec()
    };

    match strategy {
        Some(strategy) => strategy.synchronize(&resolved, method, timeout_secs, allowed_residual),
        None => {
            diag.emit(DiagEvent::SyncUnsupported {
                requested: resolved.len(),
            });
            Err(SyncError::Unimplemented)
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::diag::{DiagSink, Verbosity};

    #[derive(Default)]
    struct CaptureSink {
        events: Vec<DiagEvent>,
    }

    impl DiagSink for CaptureSink {
        fn event(&mut self, event: &DiagEvent) {
            self.events.push(*event);
        }
    }

    /// Strategy double recording what it was asked to do.
    #[derive(Default)]
    struct RecordingStrategy {
        screens: Vec<ScreenId>,
    }

    impl SyncStrategy for RecordingStrategy {
        fn synchronize(
            &mut self,
            screens: &[ScreenId],
            _method: SyncMethod,
            _timeout_secs: f64,
            _allowed_residual: i32,
        ) -> Result<Vec<i32>, SyncError> {
            self.screens = screens.to_vec();
            Ok(vec![0; screens.len()])
        }
    }

    fn invalid(result: Result<Vec<i32>, SyncError>) -> bool {
        matches!(result, Err(SyncError::InvalidArguments(_)))
    }

    #[test]
    fn method_ids_decode_and_reject() {
        assert_eq!(SyncMethod::from_raw(0), Ok(SyncMethod::DontCare));
        assert_eq!(SyncMethod::from_raw(1), Ok(SyncMethod::HardSync));
        assert_eq!(SyncMethod::from_raw(2), Ok(SyncMethod::DriftSync));
        assert!(
            matches!(SyncMethod::from_raw(3), Err(SyncError::InvalidArguments(_))),
            "method 3 is a contract violation, not 'unimplemented'"
        );
    }

    #[test]
    fn too_many_screens_is_a_contract_violation() {
        let map = DisplayMap::new(2);
        let screens = vec![ScreenId(0), ScreenId(1), ScreenId(2)];
        let result = synchronize(
            &map,
            None,
            &screens,
            SyncMethod::DontCare,
            1.0,
            0,
            &mut Diag::disabled(),
        );
        assert!(invalid(result), "must not be reported as Unimplemented");
    }

    #[test]
    fn out_of_range_screen_is_a_contract_violation() {
        let map = DisplayMap::new(2);
        let result = synchronize(
            &map,
            None,
            &[ScreenId(5)],
            SyncMethod::DontCare,
            1.0,
            0,
            &mut Diag::disabled(),
        );
        assert!(invalid(result));
    }

    #[test]
    fn negative_and_nan_timeouts_are_contract_violations() {
        let map = DisplayMap::new(2);
        for timeout in [-1.0, f64::NAN] {
            let result = synchronize(
                &map,
                None,
                &[ScreenId(0)],
                SyncMethod::DontCare,
                timeout,
                0,
                &mut Diag::disabled(),
            );
            assert!(invalid(result), "timeout {timeout} must be rejected");
        }
    }

    #[test]
    fn negative_residual_is_a_contract_violation() {
        let map = DisplayMap::new(2);
        let result = synchronize(
            &map,
            None,
            &[ScreenId(0)],
            SyncMethod::DontCare,
            1.0,
            -1,
            &mut Diag::disabled(),
        );
        assert!(invalid(result));
    }

    #[test]
    fn valid_request_without_strategy_is_unimplemented() {
        let map = DisplayMap::new(2);
        let mut sink = CaptureSink::default();
        let mut diag = Diag::new(Verbosity::WARNINGS, &mut sink);
        let result = synchronize(
            &map,
            None,
            &[ScreenId(0), ScreenId(1)],
            SyncMethod::HardSync,
            2.5,
            2,
            &mut diag,
        );
        drop(diag);

        assert_eq!(result, Err(SyncError::Unimplemented));
        assert_eq!(
            sink.events,
            vec![DiagEvent::SyncUnsupported { requested: 2 }],
            "degradation must be visible as a warning"
        );
    }

    #[test]
    fn empty_screen_list_resolves_to_all_screens() {
        let map = DisplayMap::new(3);
        let mut strategy = RecordingStrategy::default();
        let result = synchronize(
            &map,
            Some(&mut strategy),
            &[],
            SyncMethod::DontCare,
            1.0,
            0,
            &mut Diag::disabled(),
        );

        assert_eq!(result, Ok(vec![0, 0, 0]));
        assert_eq!(
            strategy.screens,
            vec![ScreenId(0), ScreenId(1), ScreenId(2)]
        );
    }

    #[test]
    fn strategy_receives_the_request_verbatim() {
        let map = DisplayMap::new(3);
        let mut strategy = RecordingStrategy::default();
        let screens = vec![ScreenId(2), ScreenId(0)];
        let result = synchronize(
            &map,
            Some(&mut strategy),
            &screens,
            SyncMethod::DriftSync,
            0.5,
            1,
            &mut Diag::disabled(),
        );

        assert_eq!(result, Ok(vec![0, 0]));
        assert_eq!(strategy.screens, screens, "request order is preserved");
    }
}
