//! Session-scoped state for one loaded binary.
//!
//! All caches live here, owned by an explicit context object, never in
//! process globals. Addresses and type identities are only meaningful
//! within one loaded image; when the host loads a different binary, build
//! a new session or call [`Session::reset`].

use std::rc::Rc;

use anyhow::{Context, Result};

use crate::convert::{convert_type, TypeError};
use crate::foreign::{ForeignType, TypeDatabase};
use crate::functions::{Function, FunctionError, FunctionRegistry};
use crate::model::TypeRef;
use crate::platform::{
    detect_architecture, detect_os, ArchContext, ArchSignals, Os, OsSignals,
};

/// One analysis session: the host database view, the detected platform,
/// and the function registry.
pub struct Session<D: TypeDatabase> {
    db: D,
    arch: Rc<ArchContext>,
    os: Os,
    registry: FunctionRegistry,
}

impl<D: TypeDatabase> Session<D> {
    pub fn new(db: D, arch: ArchContext, os: Os) -> Self {
        Self { db, arch: Rc::new(arch), os, registry: FunctionRegistry::new() }
    }

    /// Build a session by running platform detection on host signals.
    pub fn from_signals(db: D, arch: &ArchSignals, os: &OsSignals) -> Result<Self> {
        let arch = detect_architecture(arch).context("architecture detection failed")?;
        let os = detect_os(os).context("OS detection failed")?;
        Ok(Self::new(db, ArchContext::new(arch), os))
    }

    pub fn arch(&self) -> &Rc<ArchContext> {
        &self.arch
    }

    pub fn os(&self) -> Os {
        self.os
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    /// Resolve the function at `address` through the registry.
    pub fn function_at(&mut self, address: u64) -> Result<Rc<Function>, FunctionError> {
        self.registry.resolve(&self.db, &self.arch, address)
    }

    /// Convert an arbitrary foreign type with a fresh per-call cache.
    pub fn type_of<T: ForeignType>(&self, ty: &T) -> Result<TypeRef, TypeError> {
        convert_type(ty)
    }

    /// Explicit session boundary: discard every cached function entry.
    ///
    /// Must be called when the host's loaded binary changes; previously
    /// resolved functions stay alive for their holders but will not be
    /// reused.
    pub fn reset(&mut self) {
        self.registry.clear();
    }
}
