// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen-to-output mapping and per-screen correction state.
//!
//! [`DisplayMap`] is the owned context for the whole subsystem: the
//! per-screen ranked tables mapping logical screens to OS output heads
//! and to hardware scanout engines, plus the per-screen beamposition
//! corrections. One value is created at display-subsystem startup and
//! passed explicitly to every operation; there is no process-global
//! state, and a single thread owns the map.
//!
//! # Mapping model
//!
//! Operating systems provide no reliable way to learn which hardware
//! scanout engine drives which output, so the map starts as an identity
//! guess (screen `i` → head `i` → engine `i`) that works for common
//! single- and multi-display setups. Exotic configurations are handled
//! by explicit overrides: the [`PIPE_MAPPINGS_ENV`] environment variable
//! or [`set_crtc`](DisplayMap::set_crtc) calls from calling code. Any
//! explicit engine assignment marks the map user-controlled, and
//! auto-detection must not silently overwrite it afterwards.
//!
//! Rank 0 of each screen is the primary output; its scanout engine is
//! the one used for all beamposition-dependent timing.

use crate::beampos::{BeamposCorrection, CorrectionRequest, detect_correction};
use crate::diag::{Diag, DiagEvent};
use crate::gpu::GpuProbe;
use crate::regs::RegisterIo;
use crate::screen::{CrtcId, HeadId, MAX_RANKS, MAX_SCREENS, ScreenId};

/// Environment variable overriding the rank-0 screen→engine mapping.
///
/// The i-th character, when an ASCII digit, assigns that engine index to
/// screen `i`; any other character unassigns the slot. A string shorter
/// than the screen count leaves the remaining slots at their identity
/// default. Head mappings and higher ranks are never affected.
pub const PIPE_MAPPINGS_ENV: &str = "PSYCHTOOLBOX_PIPEMAPPINGS";

/// Per-screen output-head and scanout-engine tables with correction
/// state.
///
/// All accessors are trusted-internal-API style: indices out of table
/// bounds are caller bugs and panic rather than returning errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayMap {
    num_displays: usize,
    heads: [[Option<HeadId>; MAX_RANKS]; MAX_SCREENS],
    crtcs: [[Option<CrtcId>; MAX_RANKS]; MAX_SCREENS],
    corrections: [BeamposCorrection; MAX_SCREENS],
    user_override: bool,
    auto_detected: bool,
}

impl DisplayMap {
    /// Creates a map for `num_displays` screens with identity defaults.
    ///
    /// # Panics
    ///
    /// Panics if `num_displays` exceeds [`MAX_SCREENS`].
    #[must_use]
    pub fn new(num_displays: usize) -> Self {
        let mut map = Self {
            num_displays: 0,
            heads: [[None; MAX_RANKS]; MAX_SCREENS],
            crtcs: [[None; MAX_RANKS]; MAX_SCREENS],
            corrections: [BeamposCorrection::NONE; MAX_SCREENS],
            user_override: false,
            auto_detected: false,
        };
        map.init(num_displays);
        map
    }

    /// (Re)initializes the map: clears the override flags, resets every
    /// slot (not just the first `num_displays`) to the identity mapping
    /// with higher ranks unassigned, and neutralizes all corrections.
    ///
    /// # Panics
    ///
    /// Panics if `num_displays` exceeds [`MAX_SCREENS`].
    #[expect(
        clippy::cast_possible_truncation,
        reason = "slot indices are bounded by MAX_SCREENS and fit in u32"
    )]
    pub fn init(&mut self, num_displays: usize) {
        assert!(
            num_displays <= MAX_SCREENS,
            "display count exceeds mapping table bounds"
        );
        self.num_displays = num_displays;
        self.user_override = false;
        self.auto_detected = false;
        for i in 0..MAX_SCREENS {
            self.heads[i] = [None; MAX_RANKS];
            self.crtcs[i] = [None; MAX_RANKS];
            self.heads[i][0] = Some(HeadId(i as u32));
            self.crtcs[i][0] = Some(CrtcId(i as u32));
            self.corrections[i] = BeamposCorrection::NONE;
        }
    }

    /// Initializes the map and applies the [`PIPE_MAPPINGS_ENV`]
    /// override from the process environment, if set.
    ///
    /// # Panics
    ///
    /// Panics if `num_displays` exceeds [`MAX_SCREENS`].
    #[cfg(feature = "std")]
    pub fn init_from_env(&mut self, num_displays: usize) {
        self.init(num_displays);
        if let Ok(mapping) = std::env::var(PIPE_MAPPINGS_ENV) {
            self.apply_pipe_override(&mapping);
        }
    }

    /// Applies a [`PIPE_MAPPINGS_ENV`]-format override string.
    ///
    /// Each assignment routes through [`set_crtc`](Self::set_crtc), so a
    /// non-empty override marks the map user-controlled.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "slot indices are bounded by MAX_SCREENS and fit in u32"
    )]
    pub fn apply_pipe_override(&mut self, mapping: &str) {
        for (i, byte) in mapping.bytes().take(MAX_SCREENS).enumerate() {
            let crtc = byte
                .is_ascii_digit()
                .then(|| CrtcId(u32::from(byte - b'0')));
            self.set_crtc(ScreenId(i as u32), 0, crtc);
        }
    }

    /// Number of screens the display subsystem reported at init time.
    #[must_use]
    pub const fn num_displays(&self) -> usize {
        self.num_displays
    }

    /// Returns the output head assigned to `screen` at `rank`, or `None`
    /// when the rank is unassigned.
    ///
    /// # Panics
    ///
    /// Panics if `screen` or `rank` is outside the table bounds.
    #[must_use]
    pub fn head(&self, screen: ScreenId, rank: usize) -> Option<HeadId> {
        self.heads[screen.index()][rank]
    }

    /// Unconditionally overwrites the head assigned to `screen` at
    /// `rank`.
    ///
    /// # Panics
    ///
    /// Panics if `screen` or `rank` is outside the table bounds.
    pub fn set_head(&mut self, screen: ScreenId, rank: usize, head: Option<HeadId>) {
        self.heads[screen.index()][rank] = head;
    }

    /// Returns the scanout engine assigned to `screen` at `rank`, or
    /// `None` when the rank is unassigned.
    ///
    /// # Panics
    ///
    /// Panics if `screen` or `rank` is outside the table bounds.
    #[must_use]
    pub fn crtc(&self, screen: ScreenId, rank: usize) -> Option<CrtcId> {
        self.crtcs[screen.index()][rank]
    }

    /// The primary scanout engine of `screen`, used for all
    /// beamposition-dependent timing.
    ///
    /// # Panics
    ///
    /// Panics if `screen` is outside the table bounds.
    #[must_use]
    pub fn primary_crtc(&self, screen: ScreenId) -> Option<CrtcId> {
        self.crtc(screen, 0)
    }

    /// Unconditionally overwrites the scanout engine assigned to
    /// `screen` at `rank` and marks the map user-controlled.
    ///
    /// # Panics
    ///
    /// Panics if `screen` or `rank` is outside the table bounds.
    pub fn set_crtc(&mut self, screen: ScreenId, rank: usize, crtc: Option<CrtcId>) {
        self.crtcs[screen.index()][rank] = crtc;
        self.user_override = true;
    }

    /// Whether any explicit engine assignment has been made since init.
    #[must_use]
    pub const fn user_override(&self) -> bool {
        self.user_override
    }

    /// Clears the user-override flag. Stored mapping values are not
    /// reverted.
    pub fn reset_user_override(&mut self) {
        self.user_override = false;
    }

    /// Whether mappings were produced by auto-detection rather than the
    /// identity default or explicit assignment.
    #[must_use]
    pub const fn auto_detected(&self) -> bool {
        self.auto_detected
    }

    /// Best-effort mapping auto-detection hook.
    ///
    /// Respects user control: does nothing once an explicit assignment
    /// has been made. No portable heuristic exists for guessing the
    /// head→engine association, so the portable implementation leaves
    /// the identity default in place; platform glue with real knowledge
    /// installs mappings through the setters instead.
    pub fn auto_detect(&mut self, _max_heads: usize) {
        if self.user_override {
            return;
        }
        // No portable heuristic: the identity default stands until
        // platform glue installs real mappings through the setters.
    }

    /// Returns the beamposition correction stored for `screen`.
    ///
    /// Defaults to the neutral correction until
    /// [`set_correction`](Self::set_correction) stores one.
    ///
    /// # Panics
    ///
    /// Panics if `screen` is outside the table bounds.
    #[must_use]
    pub fn correction(&self, screen: ScreenId) -> BeamposCorrection {
        self.corrections[screen.index()]
    }

    /// Stores a beamposition correction for `screen`.
    ///
    /// With [`CorrectionRequest::Explicit`] the given values are stored
    /// as-is; `gpu` and `io` are not consulted. With
    /// [`CorrectionRequest::AutoDetect`] the screen's primary scanout
    /// engine is resolved and
    /// [`detect_correction`](crate::beampos::detect_correction) derives
    /// the values from hardware, degrading to the neutral correction
    /// when the screen has no assigned engine or hardware cannot answer.
    ///
    /// A non-neutral result is reported as
    /// [`DiagEvent::CorrectionApplied`].
    ///
    /// # Panics
    ///
    /// Panics if `screen` is outside the table bounds.
    pub fn set_correction(
        &mut self,
        screen: ScreenId,
        request: CorrectionRequest,
        gpu: &dyn GpuProbe,
        io: &mut dyn RegisterIo,
        diag: &mut Diag<'_>,
    ) {
        let crtc = self.primary_crtc(screen);
        let correction = match request {
            CorrectionRequest::Explicit(correction) => correction,
            CorrectionRequest::AutoDetect => match crtc {
                Some(crtc) => detect_correction(screen, crtc, gpu.specs(screen), io, diag),
                None => BeamposCorrection::NONE,
            },
        };
        if !correction.is_noop() {
            diag.emit(DiagEvent::CorrectionApplied {
                screen,
                crtc,
                correction,
            });
        }
        self.corrections[screen.index()] = correction;
    }
}
