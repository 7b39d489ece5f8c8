// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Low-level register access and per-generation scanout-timing layouts.
//!
//! [`RegisterIo`] is the collaborator trait over the kernel-level driver
//! interface that exposes GPU MMIO register reads. Everything else in this
//! module is data: [`TimingRegisterLayout`] describes where a given GPU
//! family keeps its vertical-blank and total-scanline fields and how to
//! decode them, so that adding a hardware generation is a table addition
//! rather than new control flow.
//!
//! The offsets and decode rules are measurement-derived per generation and
//! intentionally not unified: the bias normalization differs in form
//! across families (some need a `+1`, the oldest parts report positions
//! already anchored at scanline zero), and unifying the arithmetic would
//! silently change calibration behavior.

use core::fmt;

use crate::gpu::{GpuVendor, nv_generation};
use crate::screen::{CrtcId, ScreenId};

/// Error returned by [`RegisterIo::read`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegisterError {
    /// The kernel driver interface is not available for this screen.
    Unavailable,
    /// The driver is present but the read failed.
    ReadFailed {
        /// Absolute byte offset of the failed read.
        offset: u32,
    },
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "kernel register interface unavailable"),
            Self::ReadFailed { offset } => {
                write!(f, "register read failed at offset {offset:#x}")
            }
        }
    }
}

impl core::error::Error for RegisterError {}

/// Blocking access to GPU MMIO registers through a kernel-level driver.
///
/// Implemented by platform glue (and by test doubles). Reads are real
/// hardware I/O with non-trivial, variable latency; they are expected to
/// complete, so no cancellation mechanism exists.
pub trait RegisterIo {
    /// Returns whether the kernel driver interface is usable for `screen`.
    ///
    /// Callers must check this before issuing reads; a `false` here means
    /// all register-backed features degrade to their no-op defaults.
    fn is_available(&self, screen: ScreenId) -> bool;

    /// Reads the 32-bit register at `offset`, an absolute byte offset into
    /// the GPU aperture already resolved for the given scanout engine.
    fn read(&mut self, crtc: CrtcId, offset: u32) -> Result<u32, RegisterError>;
}

/// One 16-bit-or-narrower field within a 32-bit timing register.
///
/// `decode` extracts `(raw >> shift) & mask` and adds the per-field
/// normalization constant. The constant is part of the hardware contract
/// for that field (e.g. "+1" where the register holds an end-of-vblank
/// line and scanline zero must mean start of active scanout).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegField {
    /// Byte offset of the register for scanout engine zero.
    pub offset: u32,
    /// Bit shift applied before masking (16 selects the high word).
    pub shift: u8,
    /// Mask applied after shifting.
    pub mask: u32,
    /// Constant added to the masked value.
    pub add: u32,
}

impl RegField {
    /// A field occupying the high word of its register.
    #[must_use]
    pub const fn high(offset: u32) -> Self {
        Self {
            offset,
            shift: 16,
            mask: 0xffff,
            add: 0,
        }
    }

    /// Returns this field with a `+1` decode normalization.
    #[must_use]
    pub const fn plus_one(self) -> Self {
        Self { add: 1, ..self }
    }

    /// A field with explicit shift/mask/normalization.
    #[must_use]
    pub const fn new(offset: u32, shift: u8, mask: u32, add: u32) -> Self {
        Self {
            offset,
            shift,
            mask,
            add,
        }
    }

    /// Decodes the field from a raw register value.
    #[inline]
    #[must_use]
    pub const fn decode(self, raw: u32) -> u32 {
        ((raw >> self.shift) & self.mask) + self.add
    }
}

/// How a GPU family lays out per-scanout-engine register blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrtcStride {
    /// Engine `n` lives at `offset + n * stride`.
    Linear(u32),
    /// A single secondary block at a flat offset serves every engine
    /// other than engine zero. Only dual-engine parts use this layout.
    SecondaryBlock(u32),
}

impl CrtcStride {
    /// Resolves a field offset for the given scanout engine.
    #[must_use]
    pub const fn resolve(self, offset: u32, crtc: CrtcId) -> u32 {
        match self {
            Self::Linear(stride) => offset + crtc.index() * stride,
            Self::SecondaryBlock(block) => {
                if crtc.index() > 0 {
                    offset + block
                } else {
                    offset
                }
            }
        }
    }
}

/// Registers exposing the vertical-blank window, read only for
/// high-verbosity diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VblankDebugRegs {
    /// Start/end (and optionally active-line count) in separate
    /// high-word-encoded registers.
    Split {
        /// First line of vertical blank.
        vbl_start: RegField,
        /// Last line of vertical blank.
        vbl_end: RegField,
        /// Active scanline count, where the family reports it.
        vactive: Option<RegField>,
    },
    /// Start and end packed into one register: start in the low bits,
    /// end in the bits above 16, both under `mask`.
    Packed {
        /// Byte offset of the packed register for engine zero.
        offset: u32,
        /// Mask applied to each half.
        mask: u32,
    },
}

/// Scanout-timing register layout for one GPU vendor/generation.
///
/// Selected by [`layout_for`]; consumed by
/// [`detect_correction`](crate::beampos::detect_correction).
#[derive(Clone, Copy, Debug)]
pub struct TimingRegisterLayout {
    /// Vendor this layout applies to.
    pub vendor: GpuVendor,
    /// Lowest generation code this layout applies to. The highest
    /// matching entry wins.
    pub min_generation: u32,
    /// Per-engine register block layout.
    pub stride: CrtcStride,
    /// Field whose decoded value is the beamposition bias, or `None`
    /// where the family reports positions already anchored at scanline
    /// zero (bias is then zero by measurement).
    pub vblank_bias: Option<RegField>,
    /// Field whose decoded value is the total scanline count.
    pub vertical_total: RegField,
    /// Vertical-blank window registers for diagnostics, where known.
    pub debug_window: Option<VblankDebugRegs>,
}

/// NVIDIA layouts, newest generation first.
///
/// The display core moved twice in this family's history, so neither the
/// base offsets nor the per-engine strides are shared across entries.
pub static GEFORCE_LAYOUTS: [TimingRegisterLayout; 4] = [
    // Volta/Turing and later: VBLANKE end-of-vblank line in the high word,
    // +1 to normalize scanline zero to start of active scanout; VTOTAL in
    // the high word of DISPLAY_TOTAL.
    TimingRegisterLayout {
        vendor: GpuVendor::GeForce,
        min_generation: nv_generation::VOLTA,
        stride: CrtcStride::Linear(0x400),
        vblank_bias: Some(RegField::high(0x68206c + 0x8000).plus_one()),
        vertical_total: RegField::high(0x682064 + 0x8000),
        debug_window: Some(VblankDebugRegs::Split {
            vbl_start: RegField::high(0x682070 + 0x8000),
            vbl_end: RegField::high(0x68206c + 0x8000),
            vactive: None,
        }),
    },
    // Kepler class: same field semantics as Volta at the older display
    // core base with a 0x300 engine stride.
    TimingRegisterLayout {
        vendor: GpuVendor::GeForce,
        min_generation: nv_generation::KEPLER,
        stride: CrtcStride::Linear(0x300),
        vblank_bias: Some(RegField::high(0x64041c).plus_one()),
        vertical_total: RegField::high(0x640414),
        debug_window: Some(VblankDebugRegs::Split {
            vbl_start: RegField::high(0x640420),
            vbl_end: RegField::high(0x64041c),
            vactive: None,
        }),
    },
    // NV50 class: SYNC_START_TO_BLANK_END high word is the distance from
    // the vsync start line to the vblank end line. The hardware measures
    // scanline position from the vsync start line, so the distance is the
    // bias verbatim (no +1).
    TimingRegisterLayout {
        vendor: GpuVendor::GeForce,
        min_generation: nv_generation::NV50,
        stride: CrtcStride::Linear(0x540),
        vblank_bias: Some(RegField::high(0x610000 + 0xa00 + 0xe8)),
        vertical_total: RegField::high(0x610000 + 0xa00 + 0xf8),
        debug_window: Some(VblankDebugRegs::Split {
            vbl_start: RegField::high(0x610af4),
            vbl_end: RegField::high(0x610aec),
            vactive: Some(RegField::high(0x610afc)),
        }),
    },
    // Pre-NV50 parts: measured bias on NV-30/NV-40 hardware is zero.
    // FP_TOTAL relative to the RAMDAC block holds VTOTAL in the low word;
    // the second RAMDAC sits at a flat +0x2000.
    TimingRegisterLayout {
        vendor: GpuVendor::GeForce,
        min_generation: 0x01,
        stride: CrtcStride::SecondaryBlock(0x2000),
        vblank_bias: None,
        vertical_total: RegField::new(0x680000 + 0x804, 0, 0xffff, 1),
        debug_window: None,
    },
];

/// Intel integrated-graphics layout (one entry for all generations).
///
/// Pipe VTOTAL holds the total line count minus one in bits 28:16; the
/// pipe blocks repeat every 0x1000 bytes. Bias is zero by measurement.
pub static INTEL_LAYOUT: TimingRegisterLayout = TimingRegisterLayout {
    vendor: GpuVendor::IntelIgp,
    min_generation: 0,
    stride: CrtcStride::Linear(0x1000),
    vblank_bias: None,
    vertical_total: RegField::new(0x6000c, 16, 0x1fff, 1),
    debug_window: Some(VblankDebugRegs::Packed {
        offset: 0x60010,
        mask: 0x1fff,
    }),
};

/// Selects the timing register layout for a classified adapter.
///
/// Returns the highest entry whose `min_generation` does not exceed the
/// detected generation. An unknown NVIDIA generation (code 0) selects the
/// newest layout: identification only fails on hardware recent enough
/// that the identification tables have not caught up with it. Vendors
/// without a layout table return `None` and callers degrade to no-op
/// corrections.
#[must_use]
pub fn layout_for(vendor: GpuVendor, generation: u32) -> Option<&'static TimingRegisterLayout> {
    match vendor {
        GpuVendor::GeForce => {
            if generation == nv_generation::UNKNOWN {
                return GEFORCE_LAYOUTS.first();
            }
            GEFORCE_LAYOUTS
                .iter()
                .find(|layout| layout.min_generation <= generation)
        }
        GpuVendor::IntelIgp => Some(&INTEL_LAYOUT),
        GpuVendor::Radeon | GpuVendor::Unknown => None,
    }
}
