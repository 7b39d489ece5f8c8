// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reusable swap-classification metrics and hardware doubles.

#![no_std]

extern crate alloc;

use beamline_core::pageflip::FlipState;

pub mod scripted;

pub use scripted::ScriptedGpu;

/// Per-swap metrics sample fed into [`SwapTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct SwapSample {
    /// How the swap was classified.
    pub flip_state: FlipState,
    /// Bias-corrected beamposition at swap-completion detection time.
    pub corrected_beampos: i32,
}

/// Trustworthiness grade of one swap-completion timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampGrade {
    /// A hardware pageflip completed; the timestamp marks a true scanout
    /// change.
    Trusted,
    /// The swap went through a copy or a still-pending compositor flip;
    /// the timestamp measures the wrong event.
    Degraded,
    /// The hardware cannot be queried; nothing is known either way.
    Unknown,
}

impl TimestampGrade {
    /// Grades a single swap classification.
    #[must_use]
    pub const fn from_flip_state(state: FlipState) -> Self {
        match state {
            FlipState::FlipFinished => Self::Trusted,
            FlipState::NoFlip | FlipState::FlipPendingNotFinished => Self::Degraded,
            FlipState::Unknown => Self::Unknown,
        }
    }

    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trusted => "trusted",
            Self::Degraded => "degraded",
            Self::Unknown => "unknown",
        }
    }
}

/// Aggregated report returned by [`SwapTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct SwapReport {
    /// Grade of the most recent swap.
    pub last: TimestampGrade,
    /// Corrected beamposition of the most recent swap.
    pub last_beampos: i32,
    /// Trusted swaps per 1000 observed swaps.
    pub trusted_per_1000: f64,
    /// Total swaps observed.
    pub total_swaps: u64,
    /// Swaps whose timestamps were certified by a finished pageflip.
    pub trusted_swaps: u64,
    /// Swaps where classification was impossible.
    pub unknown_swaps: u64,
}

/// Rolling swap-classification tracker.
#[derive(Debug, Default)]
pub struct SwapTracker {
    total_swaps: u64,
    trusted_swaps: u64,
    unknown_swaps: u64,
}

impl SwapTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total_swaps: 0,
            trusted_swaps: 0,
            unknown_swaps: 0,
        }
    }

    /// Observes one swap and returns an updated report.
    #[must_use]
    pub fn observe(&mut self, sample: SwapSample) -> SwapReport {
        self.total_swaps = self.total_swaps.saturating_add(1);
        let grade = TimestampGrade::from_flip_state(sample.flip_state);
        match grade {
            TimestampGrade::Trusted => {
                self.trusted_swaps = self.trusted_swaps.saturating_add(1);
            }
            TimestampGrade::Unknown => {
                self.unknown_swaps = self.unknown_swaps.saturating_add(1);
            }
            TimestampGrade::Degraded => {}
        }

        #[expect(
            clippy::cast_precision_loss,
            reason = "swap counts stay far below f64 precision limits"
        )]
        let trusted_per_1000 = self.trusted_swaps as f64 * 1000.0 / self.total_swaps as f64;

        SwapReport {
            last: grade,
            last_beampos: sample.corrected_beampos,
            trusted_per_1000,
            total_swaps: self.total_swaps,
            trusted_swaps: self.trusted_swaps,
            unknown_swaps: self.unknown_swaps,
        }
    }
}
