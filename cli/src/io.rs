// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::Path};

use almanac_core::Almanac;
use tokio::fs;

/// Reads and parses a calendar file, logging what the parser recovered from.
pub async fn read_calendar(path: &Path) -> Result<Almanac, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read calendar file at {}: {e}", path.display()))?;

    let almanac = Almanac::parse(&text)
        .map_err(|e| format!("Failed to parse calendar file at {}: {e}", path.display()))?;
    for diagnostic in almanac.diagnostics() {
        tracing::warn!(path = %path.display(), %diagnostic, "calendar file");
    }
    Ok(almanac)
}

/// Writes the calendar back to `path`.
pub async fn write_calendar(path: &Path, almanac: &Almanac) -> Result<(), Box<dyn Error>> {
    let text = almanac.serialize()?;
    fs::write(path, text)
        .await
        .map_err(|e| format!("Failed to write calendar file at {}: {e}", path.display()))?;
    Ok(())
}
