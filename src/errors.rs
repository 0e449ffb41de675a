// ABOUTME: Error handling re-exports from the core crate
// ABOUTME: Gives the server crate `crate::errors::{AppError, AppResult, ErrorCode}` paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Defined in `smartplates-core` so that every crate in the workspace shares
//! one error type and one JSON error body.

pub use smartplates_core::errors::*;
