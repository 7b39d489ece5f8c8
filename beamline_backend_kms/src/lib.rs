// Copyright 2026 the Beamline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linux DRM/KMS backend for beamline.
//!
//! This crate will provide integration with the Linux display stack:
//!
//! - `RegisterIo` over the kernel support driver's MMIO interface
//! - Connector/encoder enumeration to seed head→engine mappings
//! - Scanout-address capture and vblank event timestamps
