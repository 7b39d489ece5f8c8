// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable diagnostic output.
//!
//! [`PrettyPrintSink`] implements [`DiagSink`] and writes one line per
//! event to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use beamline_core::diag::{DiagEvent, DiagSink};
use beamline_core::screen::CrtcId;

/// Writes human-readable diagnostic lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

fn crtc_label(crtc: Option<CrtcId>) -> String {
    crtc.map_or_else(|| "-".into(), |c| c.index().to_string())
}

impl<W: Write> DiagSink for PrettyPrintSink<W> {
    fn event(&mut self, event: &DiagEvent) {
        let _ = match *event {
            DiagEvent::CorrectionApplied {
                screen,
                crtc,
                correction,
            } => writeln!(
                self.writer,
                "[beampos] screen={} crtc={} bias={} vtotal={}",
                screen.0,
                crtc_label(crtc),
                correction.bias,
                correction.vtotal,
            ),
            DiagEvent::VblankWindow {
                screen,
                crtc,
                vbl_start,
                vbl_end,
                vactive,
            } => writeln!(
                self.writer,
                "[vblank] screen={} crtc={} start={} end={} vactive={}",
                screen.0,
                crtc.index(),
                vbl_start,
                vbl_end,
                vactive.map_or_else(|| "-".into(), |v| v.to_string()),
            ),
            DiagEvent::SyncUnsupported { requested } => writeln!(
                self.writer,
                "[sync] no sync mechanism for {requested} screen(s); presenting unsynchronized",
            ),
            DiagEvent::DitheringUnsupported { screen } => writeln!(
                self.writer,
                "[encoder] dither control unsupported on screen {}",
                screen.0,
            ),
            DiagEvent::PassthroughUnsupported { screen } => writeln!(
                self.writer,
                "[encoder] passthrough setup unsupported on screen {}",
                screen.0,
            ),
        };
    }
}

#[cfg(test)]
mod tests {
    use beamline_core::beampos::BeamposCorrection;
    use beamline_core::screen::ScreenId;

    use super::*;

    fn render(event: DiagEvent) -> String {
        let mut buffer = Vec::new();
        let mut sink = PrettyPrintSink::with_writer(&mut buffer);
        sink.event(&event);
        drop(sink);
        String::from_utf8(buffer).expect("output is UTF-8")
    }

    #[test]
    fn correction_line_includes_all_fields() {
        let line = render(DiagEvent::CorrectionApplied {
            screen: ScreenId(0),
            crtc: Some(CrtcId(2)),
            correction: BeamposCorrection::new(23, 1125),
        });
        assert_eq!(line, "[beampos] screen=0 crtc=2 bias=23 vtotal=1125\n");
    }

    #[test]
    fn unassigned_crtc_renders_as_dash() {
        let line = render(DiagEvent::CorrectionApplied {
            screen: ScreenId(1),
            crtc: None,
            correction: BeamposCorrection::new(5, 100),
        });
        assert_eq!(line, "[beampos] screen=1 crtc=- bias=5 vtotal=100\n");
    }

    #[test]
    fn vblank_line_renders_optional_vactive() {
        let line = render(DiagEvent::VblankWindow {
            screen: ScreenId(0),
            crtc: CrtcId(0),
            vbl_start: 1084,
            vbl_end: 1124,
            vactive: Some(1080),
        });
        assert_eq!(
            line,
            "[vblank] screen=0 crtc=0 start=1084 end=1124 vactive=1080\n"
        );
    }

    #[test]
    fn sync_warning_counts_screens() {
        let line = render(DiagEvent::SyncUnsupported { requested: 3 });
        assert!(line.contains("3 screen(s)"), "line was: {line}");
    }
}
