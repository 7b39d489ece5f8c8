// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display, output-head, and scanout-engine identification.
//!
//! Three identifier spaces meet here and must not be confused:
//!
//! - [`ScreenId`] — a logical display surface as exposed to calling code.
//! - [`HeadId`] — an OS-level output identifier (e.g. a display protocol
//!   XID, or simply an enumeration index). Assigned by the windowing
//!   layer.
//! - [`CrtcId`] — a GPU-register-address-space-relative index of the
//!   hardware scanout engine driving an output. Assigned per GPU and used
//!   to compute MMIO register offsets.
//!
//! Each screen carries a ranked list of heads and crtcs (rank 0 is the
//! primary output); see [`DisplayMap`](crate::mapping::DisplayMap).

use core::fmt;

/// Number of logical display slots tracked by a
/// [`DisplayMap`](crate::mapping::DisplayMap).
pub const MAX_SCREENS: usize = 10;

/// Number of output ranks (assigned heads/crtcs) tracked per screen.
pub const MAX_RANKS: usize = 10;

/// Identifies a logical display screen.
///
/// Valid values are `0..MAX_SCREENS`. Calling code owns the assignment;
/// this crate treats the value as a table index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ScreenId(pub u32);

impl ScreenId {
    /// Returns the table index for this screen.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScreenId({})", self.0)
    }
}

/// Identifies an OS-level display output head.
///
/// The value space is OS-defined and opaque to this crate.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HeadId(pub u32);

impl fmt::Debug for HeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HeadId({})", self.0)
    }
}

/// Identifies a GPU hardware scanout engine (CRTC).
///
/// Values are indices into the GPU's per-engine register blocks: engine
/// zero, one, two, ... The mapping from index to register addresses is
/// GPU-generation specific; see [`crate::regs`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CrtcId(pub u32);

impl CrtcId {
    /// Returns the per-engine block index used for register offset
    /// computation.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for CrtcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CrtcId({})", self.0)
    }
}
