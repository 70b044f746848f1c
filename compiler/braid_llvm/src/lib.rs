//! Native LLVM backend for Braid.
//!
//! Lowers the typed, lifted IR ([`braid_ir::CompilerIr`]) to an LLVM module.
//! The structural commitments:
//!
//! - **One calling convention.** Every callable (ordinary function, staged
//!   quote, extern wrapper) takes `(args..., env)` with a trailing opaque
//!   environment pointer, and every callable *value* is the packed pair
//!   `{ fn_ptr, env_ptr }`. Closures and extern calls are indistinguishable
//!   at the call site.
//! - **One function per scope.** Procs become `main`/`proc<id>`, Progs
//!   become `prog<id>`; children are emitted before the parent's body.
//! - **Stack discipline for emitter state.** One live builder and one
//!   variable map, swapped on scope entry and restored on every exit path.
//!
//! # Module map
//!
//! | Concern | Module |
//! |---------|--------|
//! | Error taxonomy | `error` |
//! | Type lowering | `types` |
//! | Emitter state & scope-state swap | `context` |
//! | Runtime externs & wrappers | `runtime` |
//! | Scope compilation | `scopes` |
//! | Expression compilation | `expr` |
//! | Closure pack/unpack | `closure` |
//! | Specialization overlay | `variant` |
//! | Target setup | `target` |
//! | Driver | `module` |
//!
//! # Debugging
//!
//! Call [`init_tracing`] once at startup and set `RUST_LOG=braid_llvm=debug`
//! (or `=trace`) to watch scope emission.

pub mod context;
pub mod error;
pub mod module;
pub mod target;

mod closure;
mod expr;
mod runtime;
mod scopes;
mod types;
mod variant;

#[cfg(test)]
mod tests;

pub use context::Emitter;
pub use error::{CodegenError, Result};
pub use module::{compile, MODULE_NAME};
pub use target::TargetError;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times; only installs a subscriber when `RUST_LOG`
/// is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
