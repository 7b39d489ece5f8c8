// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types and state machines for presentation-timing support.
//!
//! `beamline_core` maps logical display screens to physical GPU output
//! heads and scanout engines, corrects raw beamposition (scanline counter)
//! reads for per-GPU-generation offsets, and classifies buffer swaps by
//! comparing scanout surface addresses across a swap cycle. It is `no_std`
//! compatible (with `alloc`); all hardware access goes through collaborator
//! traits implemented by platform backend crates.
//!
//! # Architecture
//!
//! State flows through the subsystem like this:
//!
//! ```text
//!   DisplayMap::init() ──► identity screen→head/crtc tables
//!        │                     (env override, explicit setters)
//!        ▼
//!   DisplayMap::set_correction(AutoDetect)
//!        │   screen ──► primary CrtcId ──► GpuProbe::specs()
//!        │                                     │
//!        │              layout_for(vendor, generation)
//!        │                                     │
//!        ▼                                     ▼
//!   RegisterIo::read(crtc, offset) ──► BeamposCorrection (bias, vtotal)
//!
//!   FlipTracker::store_preflip() ── swap issued ──► classify_postflip()
//!        │                                              │
//!        ▼                                              ▼
//!   SurfaceProbe::capture()                    FlipState (timestamp trust)
//! ```
//!
//! **[`screen`]** — `ScreenId`/`HeadId`/`CrtcId` newtypes and table bounds.
//!
//! **[`mapping`]** — The owned [`DisplayMap`](mapping::DisplayMap) context:
//! per-screen ranked output-head and scanout-engine tables, the user
//! override flag, and the beamposition correction table.
//!
//! **[`gpu`]** — Display adapter vendor/generation classification and the
//! [`GpuProbe`](gpu::GpuProbe) collaborator trait.
//!
//! **[`regs`]** — The [`RegisterIo`](regs::RegisterIo) collaborator trait
//! and the per-vendor, per-generation scanout-timing register layout
//! tables.
//!
//! **[`beampos`]** — Beamposition bias/wraparound arithmetic and
//! register-backed auto-detection.
//!
//! **[`pageflip`]** — Scanout-surface-address capture and the pageflip
//! classification state machine that grades swap-timestamp trust.
//!
//! **[`sync`]** — Multi-display refresh-sync contract: argument
//! validation, the [`SyncStrategy`](sync::SyncStrategy) platform seam, and
//! the unimplemented-vs-invalid error distinction.
//!
//! **[`encoder`]** — Display-output-encoder controls (dithering, identity
//! passthrough) with graded, degradable outcomes.
//!
//! **[`diag`]** — Verbosity-gated diagnostic events and the
//! [`DiagSink`](diag::DiagSink) trait.
//!
//! # Crate features
//!
//! - `std` (disabled by default): enables environment-variable convenience
//!   constructors such as
//!   [`DisplayMap::init_from_env`](mapping::DisplayMap::init_from_env).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod beampos;
pub mod diag;
pub mod encoder;
pub mod gpu;
pub mod mapping;
pub mod pageflip;
pub mod regs;
pub mod screen;
pub mod sync;
