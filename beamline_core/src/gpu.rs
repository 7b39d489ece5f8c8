// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display adapter vendor and generation classification.
//!
//! Register offsets for scanout-timing queries differ per vendor and, for
//! NVIDIA hardware, per chip generation. [`GpuSpecs`] carries the minimum
//! classification needed to select a layout from [`crate::regs`], and
//! [`GpuProbe`] is the collaborator trait the platform glue implements to
//! provide it.

use crate::screen::ScreenId;

/// Display adapter vendor/family classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum GpuVendor {
    /// NVIDIA GeForce / Quadro class hardware.
    GeForce,
    /// AMD/ATI Radeon class hardware.
    Radeon,
    /// Intel integrated graphics.
    IntelIgp,
    /// Unrecognized or unclassified hardware.
    #[default]
    Unknown,
}

/// NVIDIA chip generation codes, as reported by hardware identification.
///
/// The code is the `NV_xx` core id of the chip family (e.g. `0x50` for
/// NV50/G80 class). A value of [`UNKNOWN`](nv_generation::UNKNOWN) means
/// identification failed; layout selection then assumes current-generation
/// hardware.
pub mod nv_generation {
    /// Identification failed or was not attempted.
    pub const UNKNOWN: u32 = 0x0;
    /// NV50/G80 "Tesla" class.
    pub const NV50: u32 = 0x50;
    /// NV-D0/E0 "Kepler" class.
    pub const KEPLER: u32 = 0x0d0;
    /// NV-140/160 "Volta"/"Turing" class.
    pub const VOLTA: u32 = 0x140;
}

/// Classification of the display adapter driving a screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct GpuSpecs {
    /// Vendor/family of the adapter.
    pub vendor: GpuVendor,
    /// Chip generation code within the vendor's numbering.
    ///
    /// Meaningful for [`GpuVendor::GeForce`] (see [`nv_generation`]);
    /// zero for other vendors or when unknown.
    pub generation: u32,
}

impl GpuSpecs {
    /// An unclassified adapter.
    pub const UNKNOWN: Self = Self {
        vendor: GpuVendor::Unknown,
        generation: nv_generation::UNKNOWN,
    };

    /// Creates specs for the given vendor and generation code.
    #[must_use]
    pub const fn new(vendor: GpuVendor, generation: u32) -> Self {
        Self { vendor, generation }
    }
}

/// Identifies the display adapter driving a screen.
///
/// Implemented by platform glue (and by test doubles). Identification is
/// best-effort: when the platform cannot classify the adapter, return
/// [`GpuSpecs::UNKNOWN`] and callers degrade to no-op corrections.
pub trait GpuProbe {
    /// Returns the classification of the adapter driving `screen`.
    fn specs(&self, screen: ScreenId) -> GpuSpecs;
}
