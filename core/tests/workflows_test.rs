// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Entry point for workflow tests.
//!
//! Each workflow starts from calendar text, applies messages or queries
//! through [`almanac_core::Almanac`], and checks the calendar it ends with.

mod common;
mod workflows;
