// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted GPU double.
//!
//! [`ScriptedGpu`] stands in for the platform collaborators (register
//! access, adapter identification, and scanout-surface capture) with
//! values scripted by the test or demo. It lets the whole auto-detect
//! and swap-classification path run without hardware, including the
//! degraded paths (driver missing, reads failing, capture unsupported).

use alloc::collections::BTreeMap;

use beamline_core::gpu::{GpuProbe, GpuSpecs};
use beamline_core::pageflip::{ScanoutSnapshot, SurfaceAddresses, SurfaceProbe};
use beamline_core::regs::{RegisterError, RegisterIo};
use beamline_core::screen::{CrtcId, ScreenId};

/// In-memory register file plus scripted scanout state.
#[derive(Clone, Debug)]
pub struct ScriptedGpu {
    specs: GpuSpecs,
    driver_available: bool,
    fail_reads: bool,
    registers: BTreeMap<(u32, u32), u32>,
    scanout: Option<ScanoutSnapshot>,
}

impl ScriptedGpu {
    /// Creates a double for an adapter with the given classification.
    ///
    /// The driver interface starts available; the register file starts
    /// empty (every read fails until values are scripted); scanout
    /// capture starts unsupported.
    #[must_use]
    pub fn new(specs: GpuSpecs) -> Self {
        Self {
            specs,
            driver_available: true,
            fail_reads: false,
            registers: BTreeMap::new(),
            scanout: None,
        }
    }

    /// Scripts one register value, builder style.
    #[must_use]
    pub fn with_register(mut self, crtc: CrtcId, offset: u32, value: u32) -> Self {
        self.set_register(crtc, offset, value);
        self
    }

    /// Scripts one register value.
    pub fn set_register(&mut self, crtc: CrtcId, offset: u32, value: u32) {
        self.registers.insert((crtc.index(), offset), value);
    }

    /// Makes the kernel driver interface (un)available.
    pub fn set_driver_available(&mut self, available: bool) {
        self.driver_available = available;
    }

    /// Makes every subsequent register read fail, simulating a transient
    /// driver fault.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Starts presenting from the given surfaces with no flip pending.
    /// This also makes scanout capture supported.
    pub fn show_surfaces(&mut self, primary: u64, secondary: u64) {
        self.scanout = Some(ScanoutSnapshot {
            addresses: SurfaceAddresses { primary, secondary },
            update_pending: false,
        });
    }

    /// Queues a pageflip to the given surfaces: addresses move, flip not
    /// yet completed.
    pub fn queue_flip(&mut self, primary: u64, secondary: u64) {
        self.scanout = Some(ScanoutSnapshot {
            addresses: SurfaceAddresses { primary, secondary },
            update_pending: true,
        });
    }

    /// Completes a previously queued flip.
    pub fn complete_flip(&mut self) {
        if let Some(snapshot) = self.scanout.as_mut() {
            snapshot.update_pending = false;
        }
    }

    /// Makes scanout capture unsupported again.
    pub fn disable_capture(&mut self) {
        self.scanout = None;
    }
}

impl RegisterIo for ScriptedGpu {
    fn is_available(&self, _screen: ScreenId) -> bool {
        self.driver_available
    }

    fn read(&mut self, crtc: CrtcId, offset: u32) -> Result<u32, RegisterError> {
        if !self.driver_available {
            return Err(RegisterError::Unavailable);
        }
        if self.fail_reads {
            return Err(RegisterError::ReadFailed { offset });
        }
        self.registers
            .get(&(crtc.index(), offset))
            .copied()
            .ok_or(RegisterError::ReadFailed { offset })
    }
}

impl SurfaceProbe for ScriptedGpu {
    fn capture(&mut self) -> Option<ScanoutSnapshot> {
        self.scanout
    }
}

impl GpuProbe for ScriptedGpu {
    fn specs(&self, _screen: ScreenId) -> GpuSpecs {
        self.specs
    }
}

#[cfg(test)]
mod tests {
    use beamline_core::beampos::{BeamposCorrection, CorrectionRequest};
    use beamline_core::diag::Diag;
    use beamline_core::gpu::{GpuVendor, nv_generation};
    use beamline_core::mapping::DisplayMap;
    use beamline_core::pageflip::{FlipState, FlipTracker};

    use crate::{SwapSample, SwapTracker, TimestampGrade};

    use super::*;

    #[test]
    fn volta_auto_detection_runs_end_to_end() {
        // vbl_end = 41, vtotal = 1125 for engine 0.
        let mut gpu = ScriptedGpu::new(GpuSpecs::new(
            GpuVendor::GeForce,
            nv_generation::VOLTA,
        ))
        .with_register(CrtcId(0), 0x68a06c, 41 << 16)
        .with_register(CrtcId(0), 0x68a064, (1125 << 16) | 2200);

        let mut map = DisplayMap::new(1);
        let specs = gpu.specs(ScreenId(0));
        let probe = ScriptedGpu::new(specs);
        map.set_correction(
            ScreenId(0),
            CorrectionRequest::AutoDetect,
            &probe,
            &mut gpu,
            &mut Diag::disabled(),
        );

        let correction = map.correction(ScreenId(0));
        assert_eq!(correction, BeamposCorrection::new(42, 1125));
        // A raw read landing inside vblank wraps to the end of the frame.
        assert_eq!(correction.apply(40), 1123);
    }

    #[test]
    fn unavailable_driver_keeps_neutral_correction() {
        let mut gpu = ScriptedGpu::new(GpuSpecs::new(
            GpuVendor::GeForce,
            nv_generation::KEPLER,
        ));
        gpu.set_driver_available(false);

        let mut map = DisplayMap::new(1);
        let probe = gpu.clone();
        map.set_correction(
            ScreenId(0),
            CorrectionRequest::AutoDetect,
            &probe,
            &mut gpu,
            &mut Diag::disabled(),
        );
        assert_eq!(map.correction(ScreenId(0)), BeamposCorrection::NONE);
    }

    #[test]
    fn transient_read_failure_keeps_neutral_correction() {
        let mut gpu = ScriptedGpu::new(GpuSpecs::new(
            GpuVendor::GeForce,
            nv_generation::KEPLER,
        ))
        .with_register(CrtcId(0), 0x64041c, 22 << 16)
        .with_register(CrtcId(0), 0x640414, 1125 << 16);
        gpu.set_fail_reads(true);

        let mut map = DisplayMap::new(1);
        let probe = gpu.clone();
        map.set_correction(
            ScreenId(0),
            CorrectionRequest::AutoDetect,
            &probe,
            &mut gpu,
            &mut Diag::disabled(),
        );
        assert_eq!(map.correction(ScreenId(0)), BeamposCorrection::NONE);

        // The fault clears; re-invoking on the next cycle succeeds.
        gpu.set_fail_reads(false);
        let probe = gpu.clone();
        map.set_correction(
            ScreenId(0),
            CorrectionRequest::AutoDetect,
            &probe,
            &mut gpu,
            &mut Diag::disabled(),
        );
        assert_eq!(map.correction(ScreenId(0)), BeamposCorrection::new(23, 1125));
    }

    #[test]
    fn scripted_swap_cycle_walks_the_state_machine() {
        let mut gpu = ScriptedGpu::new(GpuSpecs::UNKNOWN);
        gpu.show_surfaces(0xa000, 0xb000);

        let mut tracker = FlipTracker::new();
        tracker.store_preflip(&mut gpu);
        assert_eq!(tracker.classify_postflip(&mut gpu), FlipState::NoFlip);

        gpu.queue_flip(0xc000, 0xb000);
        assert_eq!(
            tracker.classify_postflip(&mut gpu),
            FlipState::FlipPendingNotFinished
        );

        gpu.complete_flip();
        assert_eq!(tracker.classify_postflip(&mut gpu), FlipState::FlipFinished);

        gpu.disable_capture();
        assert_eq!(tracker.classify_postflip(&mut gpu), FlipState::Unknown);
    }

    #[test]
    fn swap_cycle_feeds_the_grade_tracker() {
        let mut gpu = ScriptedGpu::new(GpuSpecs::UNKNOWN);
        gpu.show_surfaces(0x1000, 0);

        let correction = BeamposCorrection::new(42, 1125);
        let mut flips = FlipTracker::new();
        let mut grades = SwapTracker::new();

        // Cycle 1: compositor never picks the frame up.
        flips.store_preflip(&mut gpu);
        let state = flips.classify_postflip(&mut gpu);
        let report = grades.observe(SwapSample {
            flip_state: state,
            corrected_beampos: correction.apply(50),
        });
        assert_eq!(report.last, TimestampGrade::Degraded);

        // Cycle 2: a real pageflip completes.
        flips.store_preflip(&mut gpu);
        gpu.queue_flip(0x2000, 0);
        gpu.complete_flip();
        let state = flips.classify_postflip(&mut gpu);
        let report = grades.observe(SwapSample {
            flip_state: state,
            corrected_beampos: correction.apply(40),
        });
        assert_eq!(report.last, TimestampGrade::Trusted);
        assert_eq!(report.trusted_swaps, 1);
        assert_eq!(report.total_swaps, 2);
        assert_eq!(report.last_beampos, 1123);
    }
}
