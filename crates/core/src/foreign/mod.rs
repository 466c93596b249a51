//! Interfaces onto the host tool's type database.
//!
//! The core never parses binaries itself; it consumes a capability-queried
//! view of the host disassembler's types and function table through the
//! traits here. Adapters for concrete tools (IDA, Ghidra, rizin exports)
//! live outside this crate and implement these traits.

/// Stable identity for one foreign type within a conversion call.
///
/// The host adapter must hand out the same id for the same underlying type
/// for as long as one top-level conversion runs; it is the identity-cache
/// key that de-duplicates shared subtrees and terminates cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForeignTypeId(pub u64);

/// Read-only, capability-queried view of one foreign type.
///
/// Handles are cheap views (typically a shared reference into the host's
/// database), hence `Clone`. Predicates may overlap; the conversion engine
/// applies them in a fixed precedence order, so implementations only need
/// each predicate to be individually truthful.
///
/// Child accessors return `Option` because the host may be unable to
/// produce a child even when the corresponding predicate held.
pub trait ForeignType: Clone {
    fn id(&self) -> ForeignTypeId;

    /// Human-readable name for diagnostics only.
    fn display_name(&self) -> String;

    /// Empty or explicitly `void`.
    fn is_void(&self) -> bool;

    fn is_pointer(&self) -> bool;
    fn pointee(&self) -> Option<Self>;

    fn is_array(&self) -> bool;
    fn array_element(&self) -> Option<Self>;
    /// Element count; zero means an unbounded/flexible array.
    fn array_len(&self) -> u64;

    fn is_function(&self) -> bool;
    fn return_type(&self) -> Option<Self>;
    fn parameter_count(&self) -> usize;
    fn parameter(&self, index: usize) -> Option<Self>;
    /// The calling convention accepts variadic arguments.
    fn is_variadic(&self) -> bool;
    /// The calling convention makes the callee pop its own arguments.
    fn purges_stack(&self) -> bool;
    fn purged_bytes(&self) -> u32;

    fn is_vector(&self) -> bool;
    /// Total size in bytes; consulted for vector types.
    fn byte_size(&self) -> u64;

    fn is_struct(&self) -> bool;
    fn is_union(&self) -> bool;
    fn is_struct_or_union(&self) -> bool {
        self.is_struct() || self.is_union()
    }
    fn member_count(&self) -> usize;
    fn member_type(&self, index: usize) -> Option<Self>;

    fn is_enum(&self) -> bool;
    fn enum_underlying(&self) -> Option<Self>;

    fn is_bool(&self) -> bool;

    fn is_integral(&self) -> bool;
    fn is_uint128(&self) -> bool;
    fn is_int128(&self) -> bool;
    fn is_uint64(&self) -> bool;
    fn is_int64(&self) -> bool;
    fn is_uint32(&self) -> bool;
    fn is_int32(&self) -> bool;
    fn is_uint16(&self) -> bool;
    fn is_int16(&self) -> bool;
    fn is_uchar(&self) -> bool;
    fn is_char(&self) -> bool;

    fn is_floating(&self) -> bool;
    fn is_long_double(&self) -> bool;
    fn is_double(&self) -> bool;
    fn is_float(&self) -> bool;
    /// Size excluding padding; how extended-precision long doubles report
    /// their real width.
    fn unpadded_byte_size(&self) -> u64;

    fn is_complex(&self) -> bool;

    fn is_typedef(&self) -> bool;
    /// The real type behind an alias.
    fn resolved_type(&self) -> Option<Self>;
}

/// Contiguous address range the host attributes to one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionRegion {
    pub start: u64,
    pub end: u64,
}

impl FunctionRegion {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.start && address < self.end
    }
}

/// Program-level view of the host's type database, consumed by the
/// function registry.
pub trait TypeDatabase {
    type Type: ForeignType;

    /// The function region containing `address`, if any.
    fn function_containing(&self, address: u64) -> Option<FunctionRegion>;

    /// The nearest function starting at or before `address`. The returned
    /// region is not guaranteed to contain the address; callers must check.
    fn function_before(&self, address: u64) -> Option<FunctionRegion>;

    /// Declared or inferred type at an address, if the host has one.
    fn type_at(&self, address: u64) -> Option<Self::Type>;

    /// Host-assigned symbol name at an address, if any.
    fn name_at(&self, address: u64) -> Option<String>;
}
