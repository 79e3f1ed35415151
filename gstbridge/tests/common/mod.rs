// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Shared setup for the integration tests.
//!
//! All tests run against the in-process runtime of `gstbridge-testkit`. The
//! runtime is process-wide, so every test registers its own types under
//! unique names.

use gstbridge::TypeRegistry;

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

/// Initializes logging (respects `RUST_LOG`) and returns a registry bound to
/// the in-process runtime.
pub fn setup() -> TypeRegistry {
    LOG_ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .init();
    });

    TypeRegistry::new(gstbridge_testkit::native_api())
}
