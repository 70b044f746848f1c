//! Target initialization and module configuration.
//!
//! The driver targets the host machine, x86 first among equals. Target
//! initialization is factored out of the driver so adding another
//! architecture touches this module only, never the emitter.

use std::fmt;
use std::sync::Once;

use inkwell::module::Module;
use inkwell::targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine};
use inkwell::OptimizationLevel;

/// Target setup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The default triple's architecture has no registered LLVM target.
    UnsupportedArch(String),
    /// LLVM could not produce a target or target machine.
    MachineCreationFailed(String),
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedArch(arch) => {
                write!(f, "unsupported target architecture '{arch}'")
            }
            Self::MachineCreationFailed(msg) => {
                write!(f, "failed to create target machine: {msg}")
            }
        }
    }
}

impl std::error::Error for TargetError {}

static X86_INIT: Once = Once::new();
static AARCH64_INIT: Once = Once::new();

/// Initialize the LLVM target backing the given triple.
///
/// Safe to call repeatedly; each architecture initializes once per process.
pub fn initialize_for_triple(triple: &str) -> Result<(), TargetError> {
    let arch = triple.split('-').next().unwrap_or("");
    match arch {
        "x86_64" | "i686" | "i386" => {
            X86_INIT.call_once(|| Target::initialize_x86(&InitializationConfig::default()));
        }
        "aarch64" | "arm64" => {
            AARCH64_INIT.call_once(|| Target::initialize_aarch64(&InitializationConfig::default()));
        }
        other => return Err(TargetError::UnsupportedArch(other.to_string())),
    }
    Ok(())
}

/// Create a target machine for the host: default triple, generic CPU, no
/// feature string, no optimization.
pub fn host_machine() -> Result<TargetMachine, TargetError> {
    let triple = TargetMachine::get_default_triple();
    let triple_str = triple.as_str().to_string_lossy().to_string();
    initialize_for_triple(&triple_str)?;

    let target = Target::from_triple(&triple)
        .map_err(|e| TargetError::MachineCreationFailed(e.to_string()))?;

    target
        .create_target_machine(
            &triple,
            "generic",
            "",
            OptimizationLevel::None,
            RelocMode::Default,
            CodeModel::Default,
        )
        .ok_or_else(|| {
            TargetError::MachineCreationFailed(format!("LLVM returned no machine for '{triple_str}'"))
        })
}

/// Stamp a module with the host triple and data layout.
pub fn configure_module(module: &Module<'_>) -> Result<(), TargetError> {
    let machine = host_machine()?;
    module.set_triple(&machine.get_triple());
    module.set_data_layout(&machine.get_target_data().get_data_layout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell::context::Context;

    #[test]
    fn unknown_arch_is_rejected() {
        let result = initialize_for_triple("m68k-unknown-linux-gnu");
        assert_eq!(
            result,
            Err(TargetError::UnsupportedArch("m68k".to_string()))
        );
    }

    #[test]
    fn configure_module_stamps_triple_and_layout() {
        let context = Context::create();
        let module = context.create_module("target_test");
        configure_module(&module).unwrap();

        assert!(!module.get_triple().as_str().to_string_lossy().is_empty());
        let layout = module.get_data_layout();
        assert!(!layout.as_str().to_string_lossy().is_empty());
    }
}
