//! Function entities and the address-keyed function registry.
//!
//! The registry memoizes resolution per address but holds entries weakly:
//! it never keeps a function alive by itself. The cache is an optimization
//! against rebuilding an identical entity, not a guarantee of object
//! identity across the whole session.

use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::convert::{convert_type, TypeError};
use crate::foreign::TypeDatabase;
use crate::model::{structurally_equal, TypeDisplay, TypeRef};
use crate::platform::ArchContext;

/// An address could not be resolved to a usable function entity.
///
/// A failure for one address never poisons the registry for others.
#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("no function defined at or containing address {address:#x}")]
    NoFunction { address: u64 },
    #[error("no type information for the function at {address:#x}")]
    MissingType { address: u64 },
    #[error("could not assign a type to the function at {address:#x}")]
    UntypedFunction {
        address: u64,
        #[source]
        source: TypeError,
    },
}

/// A resolved function: start address, shared architecture context, IR
/// function type, and host-assigned name (empty when the host has none).
pub struct Function {
    address: u64,
    arch: Rc<ArchContext>,
    ty: TypeRef,
    name: String,
}

impl Function {
    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn arch(&self) -> &Rc<ArchContext> {
        &self.arch
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Function {
    // Hand-written: the type graph may be cyclic, so a derived Debug could
    // recurse without bound.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("address", &format_args!("{:#x}", self.address))
            .field("arch", &self.arch.name())
            .field("name", &self.name)
            .field("ty", &format_args!("{}", TypeDisplay::new(&self.ty)))
            .finish()
    }
}

impl PartialEq for Function {
    /// Value equality: same address, context, name, and structurally equal
    /// type. Two registry-recreated instances for one address compare
    /// equal even though they are distinct allocations.
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
            && self.arch == other.arch
            && self.name == other.name
            && structurally_equal(&self.ty, &other.ty)
    }
}

/// Memoized, weakly-owned map from address to resolved function.
///
/// Eviction is reference-count driven: an entry whose last outside `Rc` is
/// dropped counts as absent, and dead entries are swept whenever a new one
/// is stored. Nothing depends on collector timing.
#[derive(Default)]
pub struct FunctionRegistry {
    entries: HashMap<u64, Weak<Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the function at `address`, reusing a live entry when one
    /// exists.
    ///
    /// The enclosing region is found by exact containment first, then by
    /// falling back to the nearest function starting at or before the
    /// address (verified to actually contain it). The address is
    /// normalized to the region start before anything else.
    pub fn resolve<D: TypeDatabase>(
        &mut self,
        db: &D,
        arch: &Rc<ArchContext>,
        address: u64,
    ) -> Result<Rc<Function>, FunctionError> {
        let region = db
            .function_containing(address)
            .or_else(|| db.function_before(address).filter(|r| r.contains(address)))
            .ok_or(FunctionError::NoFunction { address })?;
        let address = region.start;

        let foreign = db.type_at(address).ok_or(FunctionError::MissingType { address })?;
        let ty = convert_type(&foreign)
            .map_err(|source| FunctionError::UntypedFunction { address, source })?;

        if let Some(live) = self.entries.get(&address).and_then(Weak::upgrade) {
            return Ok(live);
        }

        self.sweep();
        let name = db.name_at(address).unwrap_or_default();
        let function = Rc::new(Function { address, arch: Rc::clone(arch), ty, name });
        self.entries.insert(address, Rc::downgrade(&function));
        Ok(function)
    }

    /// Number of entries that still have a live owner.
    pub fn live_count(&self) -> usize {
        self.entries.values().filter(|w| w.strong_count() > 0).count()
    }

    /// Drop all entries, live or dead. Called at the session boundary.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn sweep(&mut self) {
        self.entries.retain(|_, weak| weak.strong_count() > 0);
    }
}
