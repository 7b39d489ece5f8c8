// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Beamposition bias correction.
//!
//! Some GPU/driver combinations report a scanline counter that is offset
//! by a constant for a given display mode: the hardware measures from the
//! vsync start line rather than from the first active scanline. A
//! [`BeamposCorrection`] removes that offset and renormalizes the
//! wraparound so that corrected position zero is the start of active
//! scanout:
//!
//! ```text
//! corrected = raw - bias;
//! if corrected < 0 { corrected += vtotal; }
//! ```
//!
//! Corrections are stored per screen in a
//! [`DisplayMap`](crate::mapping::DisplayMap) and are either supplied
//! explicitly by calibration code or auto-detected from scanout-timing
//! registers via [`detect_correction`].

use crate::diag::{Diag, DiagEvent, Verbosity};
use crate::gpu::GpuSpecs;
use crate::regs::{RegisterIo, TimingRegisterLayout, VblankDebugRegs, layout_for};
use crate::screen::{CrtcId, ScreenId};

/// Corrective values applied to raw beamposition reads.
///
/// The default `(0, 0)` pair is a no-op: corrected equals raw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct BeamposCorrection {
    /// Offset subtracted from the raw scanline counter.
    pub bias: i32,
    /// Total scanline count, added back when the subtraction wraps below
    /// zero.
    pub vtotal: i32,
}

impl BeamposCorrection {
    /// The neutral no-op correction.
    pub const NONE: Self = Self { bias: 0, vtotal: 0 };

    /// Creates a correction with the given bias and total scanline count.
    #[must_use]
    pub const fn new(bias: i32, vtotal: i32) -> Self {
        Self { bias, vtotal }
    }

    /// Returns whether applying this correction leaves raw values
    /// unchanged.
    #[must_use]
    pub const fn is_noop(self) -> bool {
        self.bias == 0 && self.vtotal == 0
    }

    /// Applies the correction to a raw scanline counter value.
    #[inline]
    #[must_use]
    pub const fn apply(self, raw: i32) -> i32 {
        let corrected = raw - self.bias;
        if corrected < 0 {
            corrected + self.vtotal
        } else {
            corrected
        }
    }
}

/// How a correction value is obtained by
/// [`DisplayMap::set_correction`](crate::mapping::DisplayMap::set_correction).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionRequest {
    /// Store the given correction as-is.
    Explicit(BeamposCorrection),
    /// Read the screen's scanout-timing registers and derive the
    /// correction from hardware.
    AutoDetect,
}

/// Derives a correction from the scanout-timing registers of `crtc`.
///
/// Degrades to [`BeamposCorrection::NONE`] whenever hardware cannot
/// answer: the kernel register interface is unavailable for `screen`, the
/// adapter's vendor/generation has no known layout, or a register read
/// fails. Failed calls are not retried; the caller may re-invoke on a
/// later cycle.
///
/// At [`Verbosity::DEBUG`] the vertical-blank window registers are also
/// read and emitted as a [`DiagEvent::VblankWindow`]; those extra reads
/// are skipped entirely at lower verbosity.
#[must_use]
pub fn detect_correction(
    screen: ScreenId,
    crtc: CrtcId,
    specs: GpuSpecs,
    io: &mut dyn RegisterIo,
    diag: &mut Diag<'_>,
) -> BeamposCorrection {
    if !io.is_available(screen) {
        return BeamposCorrection::NONE;
    }
    let Some(layout) = layout_for(specs.vendor, specs.generation) else {
        return BeamposCorrection::NONE;
    };

    let bias = match layout.vblank_bias {
        None => 0,
        Some(field) => {
            let offset = layout.stride.resolve(field.offset, crtc);
            match io.read(crtc, offset) {
                Ok(raw) => field.decode(raw) as i32,
                Err(_) => return BeamposCorrection::NONE,
            }
        }
    };

    let total_offset = layout.stride.resolve(layout.vertical_total.offset, crtc);
    let vtotal = match io.read(crtc, total_offset) {
        Ok(raw) => layout.vertical_total.decode(raw) as i32,
        Err(_) => return BeamposCorrection::NONE,
    };

    if diag.enabled_at(Verbosity::DEBUG) {
        emit_vblank_window(screen, crtc, layout, io, diag);
    }

    BeamposCorrection::new(bias, vtotal)
}

/// Reads and emits the vblank window for diagnostics. Read failures here
/// only suppress the event; the detected correction is unaffected.
fn emit_vblank_window(
    screen: ScreenId,
    crtc: CrtcId,
    layout: &TimingRegisterLayout,
    io: &mut dyn RegisterIo,
    diag: &mut Diag<'_>,
) {
    let Some(window) = layout.debug_window else {
        return;
    };
    match window {
        VblankDebugRegs::Split {
            vbl_start,
            vbl_end,
            vactive,
        } => {
            let start = io.read(crtc, layout.stride.resolve(vbl_start.offset, crtc));
            let end = io.read(crtc, layout.stride.resolve(vbl_end.offset, crtc));
            let (Ok(start_raw), Ok(end_raw)) = (start, end) else {
                return;
            };
            let vactive = vactive.and_then(|field| {
                io.read(crtc, layout.stride.resolve(field.offset, crtc))
                    .ok()
                    .map(|raw| field.decode(raw))
            });
            diag.emit(DiagEvent::VblankWindow {
                screen,
                crtc,
                vbl_start: vbl_start.decode(start_raw),
                vbl_end: vbl_end.decode(end_raw),
                vactive,
            });
        }
        VblankDebugRegs::Packed { offset, mask } => {
            let Ok(raw) = io.read(crtc, layout.stride.resolve(offset, crtc)) else {
                return;
            };
            diag.emit(DiagEvent::VblankWindow {
                screen,
                crtc,
                vbl_start: raw & mask,
                vbl_end: (raw >> 16) & mask,
                vactive: None,
            });
        }
    }
}
