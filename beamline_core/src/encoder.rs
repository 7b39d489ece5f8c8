// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display-output-encoder controls.
//!
//! Digital output encoders truncate or dither framebuffer values on the
//! way to the connector. For calibrated stimulus presentation both are
//! poison: an identity passthrough (dithering off, identity LUT, no
//! color transformation) is required for the framebuffer values to
//! reach the wire untampered.
//!
//! Programming the encoders requires vendor-specific register banks that
//! only some platform/GPU combinations expose, so the operations live on
//! the [`EncoderControl`] trait. The default method bodies are the
//! portable degraded behavior: report unsupported and leave the hardware
//! alone. Callers must treat [`PassthroughResult::Unsupported`]
//! differently from [`PassthroughResult::Failed`]: the former means
//! "this cannot be known or done here", the latter "tried and did not
//! achieve it".

use crate::diag::{Diag, DiagEvent};
use crate::screen::ScreenId;

/// Requested dithering state for an output encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DitherMode {
    /// Disable dithering entirely.
    Disabled,
    /// Enable dithering with a vendor-specific control mode word.
    Vendor(u32),
}

/// Outcome of a dithering control request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DitherOutcome {
    /// The encoder was programmed as requested.
    Applied,
    /// Dither control is not supported on this platform/GPU.
    Unsupported,
}

/// Graded outcome of identity passthrough setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassthroughResult {
    /// The feature cannot be controlled on this platform/GPU combination.
    Unsupported,
    /// Setup ran but passthrough could not be established.
    Failed,
    /// Dithering disabled and identity LUT loaded, but other color
    /// transformation stages may still be active.
    Partial,
    /// Full passthrough, as far as software can determine.
    Full,
}

impl PassthroughResult {
    /// Whether framebuffer values are at least plausibly reaching the
    /// wire unmodified.
    #[must_use]
    pub const fn at_least_partial(self) -> bool {
        matches!(self, Self::Partial | Self::Full)
    }
}

/// Vendor-specific output-encoder programming.
///
/// Platform glue with register-level access overrides the methods; the
/// defaults implement the portable degraded behavior.
pub trait EncoderControl {
    /// Sets the dithering state of the encoders feeding `screen`.
    fn set_dithering(
        &mut self,
        screen: ScreenId,
        mode: DitherMode,
        diag: &mut Diag<'_>,
    ) -> DitherOutcome {
        let _ = mode;
        diag.emit(DiagEvent::DitheringUnsupported { screen });
        DitherOutcome::Unsupported
    }

    /// Establishes (or tears down) identity passthrough of framebuffer
    /// values for `screen`, optionally touching dither control as part
    /// of the setup.
    fn set_identity_passthrough(
        &mut self,
        screen: ScreenId,
        enable: bool,
        change_dithering: bool,
        diag: &mut Diag<'_>,
    ) -> PassthroughResult {
        let _ = (enable, change_dithering);
        diag.emit(DiagEvent::PassthroughUnsupported { screen });
        PassthroughResult::Unsupported
    }
}

/// Encoder control for platforms without register access. Every request
/// reports unsupported.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEncoderControl;

impl EncoderControl for NoEncoderControl {}
