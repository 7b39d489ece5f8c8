// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON-lines diagnostic export.
//!
//! [`JsonLinesSink`] implements [`DiagSink`] and writes one JSON object
//! per event, newline-delimited, suitable for log scraping and offline
//! analysis. [`to_value`] exposes the per-event encoding for callers
//! that want to embed events in their own documents.

use std::io::Write;

use serde_json::{Value, json};

use beamline_core::diag::{DiagEvent, DiagSink};

/// Encodes one event as a JSON object.
#[must_use]
pub fn to_value(event: &DiagEvent) -> Value {
    match *event {
        DiagEvent::CorrectionApplied {
            screen,
            crtc,
            correction,
        } => json!({
            "event": "correction_applied",
            "screen": screen.0,
            "crtc": crtc.map(|c| c.index()),
            "bias": correction.bias,
            "vtotal": correction.vtotal,
        }),
        DiagEvent::VblankWindow {
            screen,
            crtc,
            vbl_start,
            vbl_end,
            vactive,
        } => json!({
            "event": "vblank_window",
            "screen": screen.0,
            "crtc": crtc.index(),
            "vbl_start": vbl_start,
            "vbl_end": vbl_end,
            "vactive": vactive,
        }),
        DiagEvent::SyncUnsupported { requested } => json!({
            "event": "sync_unsupported",
            "requested": requested,
        }),
        DiagEvent::DitheringUnsupported { screen } => json!({
            "event": "dithering_unsupported",
            "screen": screen.0,
        }),
        DiagEvent::PassthroughUnsupported { screen } => json!({
            "event": "passthrough_unsupported",
            "screen": screen.0,
        }),
    }
}

/// Writes newline-delimited JSON event objects to a
/// [`Write`](std::io::Write) destination.
pub struct JsonLinesSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink").finish_non_exhaustive()
    }
}

impl JsonLinesSink {
    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> DiagSink for JsonLinesSink<W> {
    fn event(&mut self, event: &DiagEvent) {
        let value = to_value(event);
        let _ = writeln!(self.writer, "{value}");
    }
}

#[cfg(test)]
mod tests {
    use beamline_core::beampos::BeamposCorrection;
    use beamline_core::screen::{CrtcId, ScreenId};

    use super::*;

    #[test]
    fn correction_event_round_trips_through_json() {
        let mut buffer = Vec::new();
        let mut sink = JsonLinesSink::with_writer(&mut buffer);
        sink.event(&DiagEvent::CorrectionApplied {
            screen: ScreenId(0),
            crtc: Some(CrtcId(2)),
            correction: BeamposCorrection::new(23, 1125),
        });
        drop(sink);

        let value: Value = serde_json::from_slice(&buffer).expect("valid JSON line");
        assert_eq!(value["event"], "correction_applied");
        assert_eq!(value["screen"], 0);
        assert_eq!(value["crtc"], 2);
        assert_eq!(value["bias"], 23);
        assert_eq!(value["vtotal"], 1125);
    }

    #[test]
    fn unassigned_crtc_encodes_as_null() {
        let value = to_value(&DiagEvent::CorrectionApplied {
            screen: ScreenId(1),
            crtc: None,
            correction: BeamposCorrection::new(5, 100),
        });
        assert!(value["crtc"].is_null());
    }

    #[test]
    fn each_event_is_one_line() {
        let mut buffer = Vec::new();
        let mut sink = JsonLinesSink::with_writer(&mut buffer);
        sink.event(&DiagEvent::SyncUnsupported { requested: 2 });
        sink.event(&DiagEvent::DitheringUnsupported { screen: ScreenId(0) });
        drop(sink);

        let text = String::from_utf8(buffer).expect("output is UTF-8");
        assert_eq!(text.lines().count(), 2);
        for line in text.lines() {
            let _: Value = serde_json::from_str(line).expect("every line parses");
        }
    }
}
