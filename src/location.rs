//! Configuration file detection
//!
//! Live systems keep their configuration in one of a few well-known places.
//! This module finds the file to operate on when none is given explicitly.

use std::path::{Path, PathBuf};

/// Standard locations for the live configuration file (in search order)
pub const STANDARD_CONFIG_LOCATIONS: &[&str] = &[
    "/etc/live/config.conf", // Written by the installer
    "/etc/live/boot.conf",   // Boot-time settings
    "/lib/live/config.conf", // Read-only defaults shipped on the medium
];

/// Detect the configuration file path
///
/// Searches in order:
/// 1. User-specified path (`--file` or `LIVECONF_FILE`)
/// 2. /etc/live/config.conf
/// 3. /etc/live/boot.conf
/// 4. /lib/live/config.conf
///
/// An explicit path is returned as given, even if it does not exist, so
/// that the store can report it. Returns `None` when nothing was given and
/// no standard location holds a file.
pub fn detect_config_path(custom_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = custom_path {
        return Some(path.to_path_buf());
    }

    find_in(STANDARD_CONFIG_LOCATIONS.iter().map(PathBuf::from))
}

/// First candidate that is a regular file
fn find_in(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    let found = candidates.into_iter().find(|path| path.is_file());
    match &found {
        Some(path) => tracing::debug!("Found configuration at {}", path.display()),
        None => tracing::debug!("No configuration file in standard locations"),
    }
    found
}
