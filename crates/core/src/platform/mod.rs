//! Architecture and OS selection from host-reported signals.
//!
//! These are enumerated lookups, not detection heuristics of our own: the
//! host tool reports its register set, bit width, ABI name, and file
//! format, and each recognized combination maps 1:1 to a variant. The
//! serialized variant names are the strings downstream specification
//! generators expect.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Detection signals matched none of the known variants. Fatal to any
/// operation needing an architecture or OS context.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("unrecognized architecture: {0}")]
    UnhandledArchitecture(String),
    #[error("unrecognized operating system: {0}")]
    UnhandledOs(String),
}

/// Supported instruction-set architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Amd64,
    X86,
    Aarch64,
}

impl Arch {
    pub fn name(self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::X86 => "x86",
            Arch::Aarch64 => "aarch64",
        }
    }

    /// Pointer size in bytes.
    pub fn pointer_size(self) -> u32 {
        match self {
            Arch::Amd64 | Arch::Aarch64 => 8,
            Arch::X86 => 4,
        }
    }
}

/// Supported operating systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl Os {
    pub fn name(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::MacOs => "macos",
            Os::Windows => "windows",
        }
    }
}

/// File format as enumerated by the host tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Elf,
    Aout,
    Coff,
    MachO,
    Pe,
    Exe,
    Com,
    Unknown,
}

/// Host-reported architecture signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchSignals {
    /// Register names the host's processor module exposes.
    pub register_names: Vec<String>,
    pub is_64bit: bool,
    /// Host processor module name (e.g. "metapc", "ARM").
    pub processor_name: String,
}

/// Host-reported OS/ABI signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsSignals {
    pub abi_name: String,
    pub file_format: FileFormat,
}

/// Pick the architecture variant for the loaded image.
///
/// An x86-family register set (`ax` plus `xmm0`) selects amd64 or x86 by
/// bit width; an ARM processor module selects aarch64 only in 64-bit mode,
/// since 32-bit ARM images are not supported.
pub fn detect_architecture(signals: &ArchSignals) -> Result<Arch, PlatformError> {
    let has_register = |name: &str| signals.register_names.iter().any(|r| r == name);

    if has_register("ax") && has_register("xmm0") {
        return Ok(if signals.is_64bit { Arch::Amd64 } else { Arch::X86 });
    }

    if signals.processor_name.contains("ARM") {
        if signals.is_64bit {
            return Ok(Arch::Aarch64);
        }
        return Err(PlatformError::UnhandledArchitecture(format!(
            "unrecognized 32-bit ARM processor: {}",
            signals.processor_name
        )));
    }

    Err(PlatformError::UnhandledArchitecture(signals.processor_name.clone()))
}

/// Pick the OS variant for the loaded image.
///
/// An explicit "OSX" ABI name wins outright; otherwise the file format
/// decides.
pub fn detect_os(signals: &OsSignals) -> Result<Os, PlatformError> {
    if signals.abi_name == "OSX" {
        return Ok(Os::MacOs);
    }

    match signals.file_format {
        FileFormat::Elf | FileFormat::Aout | FileFormat::Coff => Ok(Os::Linux),
        FileFormat::MachO => Ok(Os::MacOs),
        FileFormat::Pe | FileFormat::Exe | FileFormat::Com => Ok(Os::Windows),
        FileFormat::Unknown => Err(PlatformError::UnhandledOs(format!(
            "unrecognized file format for ABI `{}`",
            signals.abi_name
        ))),
    }
}

/// Architecture context shared by the session and every resolved function.
///
/// Downstream type-width and calling-convention decisions hang off this;
/// the core itself only needs the variant and pointer size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchContext {
    pub arch: Arch,
}

impl ArchContext {
    pub fn new(arch: Arch) -> Self {
        Self { arch }
    }

    pub fn name(&self) -> &'static str {
        self.arch.name()
    }

    /// Pointer size in bytes.
    pub fn pointer_size(&self) -> u32 {
        self.arch.pointer_size()
    }
}
