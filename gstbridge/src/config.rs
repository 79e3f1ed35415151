// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration and native library path resolution.

use std::path::PathBuf;

/// Environment variable overriding the native library path.
pub const LIBRARY_PATH_ENV: &str = "GSTBRIDGE_LIBRARY";

/// Platform file name of the GStreamer core library.
#[cfg(target_os = "macos")]
pub const DEFAULT_LIBRARY: &str = "libgstreamer-1.0.0.dylib";
#[cfg(target_os = "windows")]
pub const DEFAULT_LIBRARY: &str = "gstreamer-1.0-0.dll";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const DEFAULT_LIBRARY: &str = "libgstreamer-1.0.so.0";

/// Returns the path of the native library to pass to [`crate::load_api`].
///
/// The `GSTBRIDGE_LIBRARY` environment variable wins when set and non-empty.
/// Otherwise the platform file name is returned and resolution is left to the
/// dynamic loader's search path.
///
/// # Examples
///
/// ```no_run
/// use gstbridge::{config::get_library_path, load_api};
///
/// # fn main() -> Result<(), gstbridge::Error> {
/// let api = load_api(get_library_path())?;
/// # Ok(())
/// # }
/// ```
pub fn get_library_path() -> PathBuf {
    library_path_from(std::env::var_os(LIBRARY_PATH_ENV))
}

fn library_path_from(value: Option<std::ffi::OsString>) -> PathBuf {
    match value {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_LIBRARY),
    }
}
