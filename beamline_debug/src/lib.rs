// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and JSON export for beamline diagnostics.
//!
//! This crate provides [`DiagSink`](beamline_core::diag::DiagSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event
//!   output.
//! - [`json::JsonLinesSink`] — one JSON object per event, for machine
//!   consumption and log scraping.

pub mod json;
pub mod pretty;
