//! # Tracing Setup
//!
//! The dispatch core logs with `tracing`: one span per dispatched request carrying the
//! resource and action, with nested spans for the interceptor pipeline, the
//! before-filter gate and the built-in handler.
//!
//! - `info` - successful mutations, registry and dispatcher startup, store lifecycle
//! - `warn` - rejected requests (unknown route, unauthorized, invalid changeset) and
//!   batch destroys
//! - `debug` - resolved handlers, queries and payloads
//!
//! **Usage:**
//! ```bash
//! RUST_LOG=info cargo run -p backoffice-sample
//! RUST_LOG=backoffice=debug cargo run -p backoffice-sample
//! ```

/// Installs a compact `tracing-subscriber` filtered by `RUST_LOG`.
///
/// Call once at process start; a second call panics because a global subscriber
/// is already set.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
