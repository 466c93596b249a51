//! In-memory mock of a host type database for integration tests.
//!
//! `MockType` implements the full `ForeignType` capability set over a small
//! description enum; `MockDatabase` implements `TypeDatabase` over a flat
//! function table. Pointer targets and struct members sit behind `RefCell`
//! so tests can tie self-referential knots after construction.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use lift_core::foreign::{ForeignType, ForeignTypeId, FunctionRegion, TypeDatabase};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

enum Kind {
    Void,
    Bool,
    Int { bytes: u8, signed: bool },
    Float,
    Double,
    LongDouble { unpadded: u64 },
    Pointer { pointee: RefCell<Option<MockType>> },
    Array { element: MockType, count: u64 },
    Function { ret: MockType, params: Vec<MockType>, variadic: bool, purged: Option<u32> },
    Vector { bytes: u64 },
    // `None` members model slots the host cannot enumerate.
    Struct { members: RefCell<Vec<Option<MockType>>> },
    Union { members: RefCell<Vec<Option<MockType>>> },
    Enum { underlying: MockType },
    Typedef { target: MockType },
    Complex,
}

struct Inner {
    id: u64,
    name: String,
    kind: Kind,
}

#[derive(Clone)]
pub struct MockType {
    inner: Rc<Inner>,
}

impl MockType {
    fn new(name: &str, kind: Kind) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self { inner: Rc::new(Inner { id, name: name.to_string(), kind }) }
    }

    pub fn void() -> Self {
        Self::new("void", Kind::Void)
    }

    pub fn boolean() -> Self {
        Self::new("bool", Kind::Bool)
    }

    pub fn int(bytes: u8, signed: bool) -> Self {
        Self::new(&format!("{}{}", if signed { "int" } else { "uint" }, bytes * 8), Kind::Int {
            bytes,
            signed,
        })
    }

    pub fn float() -> Self {
        Self::new("float", Kind::Float)
    }

    pub fn double() -> Self {
        Self::new("double", Kind::Double)
    }

    pub fn long_double(unpadded: u64) -> Self {
        Self::new("long double", Kind::LongDouble { unpadded })
    }

    pub fn pointer_to(pointee: MockType) -> Self {
        Self::new("ptr", Kind::Pointer { pointee: RefCell::new(Some(pointee)) })
    }

    /// A pointer whose target is wired up later via [`set_pointee`].
    pub fn pointer_unset() -> Self {
        Self::new("ptr", Kind::Pointer { pointee: RefCell::new(None) })
    }

    pub fn set_pointee(&self, target: MockType) {
        match &self.inner.kind {
            Kind::Pointer { pointee } => *pointee.borrow_mut() = Some(target),
            _ => panic!("set_pointee on a non-pointer mock"),
        }
    }

    pub fn array(element: MockType, count: u64) -> Self {
        Self::new("array", Kind::Array { element, count })
    }

    pub fn function(
        ret: MockType,
        params: Vec<MockType>,
        variadic: bool,
        purged: Option<u32>,
    ) -> Self {
        Self::new("func", Kind::Function { ret, params, variadic, purged })
    }

    pub fn vector(bytes: u64) -> Self {
        Self::new("simd", Kind::Vector { bytes })
    }

    pub fn struct_of(members: Vec<MockType>) -> Self {
        Self::new("struct", Kind::Struct {
            members: RefCell::new(members.into_iter().map(Some).collect()),
        })
    }

    /// Struct whose member list has enumeration holes.
    pub fn struct_with_holes(members: Vec<Option<MockType>>) -> Self {
        Self::new("struct", Kind::Struct { members: RefCell::new(members) })
    }

    pub fn union_of(members: Vec<MockType>) -> Self {
        Self::new("union", Kind::Union {
            members: RefCell::new(members.into_iter().map(Some).collect()),
        })
    }

    pub fn push_member(&self, member: MockType) {
        match &self.inner.kind {
            Kind::Struct { members } | Kind::Union { members } => {
                members.borrow_mut().push(Some(member));
            }
            _ => panic!("push_member on a non-aggregate mock"),
        }
    }

    pub fn enumeration(underlying: MockType) -> Self {
        Self::new("enum", Kind::Enum { underlying })
    }

    pub fn typedef(target: MockType) -> Self {
        Self::new("alias", Kind::Typedef { target })
    }

    pub fn complex() -> Self {
        Self::new("_Complex double", Kind::Complex)
    }
}

impl ForeignType for MockType {
    fn id(&self) -> ForeignTypeId {
        ForeignTypeId(self.inner.id)
    }

    fn display_name(&self) -> String {
        self.inner.name.clone()
    }

    fn is_void(&self) -> bool {
        matches!(self.inner.kind, Kind::Void)
    }

    fn is_pointer(&self) -> bool {
        matches!(self.inner.kind, Kind::Pointer { .. })
    }

    fn pointee(&self) -> Option<Self> {
        match &self.inner.kind {
            Kind::Pointer { pointee } => pointee.borrow().clone(),
            _ => None,
        }
    }

    fn is_array(&self) -> bool {
        matches!(self.inner.kind, Kind::Array { .. })
    }

    fn array_element(&self) -> Option<Self> {
        match &self.inner.kind {
            Kind::Array { element, .. } => Some(element.clone()),
            _ => None,
        }
    }

    fn array_len(&self) -> u64 {
        match &self.inner.kind {
            Kind::Array { count, .. } => *count,
            _ => 0,
        }
    }

    fn is_function(&self) -> bool {
        matches!(self.inner.kind, Kind::Function { .. })
    }

    fn return_type(&self) -> Option<Self> {
        match &self.inner.kind {
            Kind::Function { ret, .. } => Some(ret.clone()),
            _ => None,
        }
    }

    fn parameter_count(&self) -> usize {
        match &self.inner.kind {
            Kind::Function { params, .. } => params.len(),
            _ => 0,
        }
    }

    fn parameter(&self, index: usize) -> Option<Self> {
        match &self.inner.kind {
            Kind::Function { params, .. } => params.get(index).cloned(),
            _ => None,
        }
    }

    fn is_variadic(&self) -> bool {
        matches!(self.inner.kind, Kind::Function { variadic: true, .. })
    }

    fn purges_stack(&self) -> bool {
        matches!(self.inner.kind, Kind::Function { purged: Some(_), .. })
    }

    fn purged_bytes(&self) -> u32 {
        match &self.inner.kind {
            Kind::Function { purged, .. } => purged.unwrap_or(0),
            _ => 0,
        }
    }

    fn is_vector(&self) -> bool {
        matches!(self.inner.kind, Kind::Vector { .. })
    }

    fn byte_size(&self) -> u64 {
        match &self.inner.kind {
            Kind::Vector { bytes } => *bytes,
            _ => 0,
        }
    }

    fn is_struct(&self) -> bool {
        matches!(self.inner.kind, Kind::Struct { .. })
    }

    fn is_union(&self) -> bool {
        matches!(self.inner.kind, Kind::Union { .. })
    }

    fn member_count(&self) -> usize {
        match &self.inner.kind {
            Kind::Struct { members } | Kind::Union { members } => members.borrow().len(),
            _ => 0,
        }
    }

    fn member_type(&self, index: usize) -> Option<Self> {
        match &self.inner.kind {
            Kind::Struct { members } | Kind::Union { members } => {
                members.borrow().get(index).cloned().flatten()
            }
            _ => None,
        }
    }

    fn is_enum(&self) -> bool {
        matches!(self.inner.kind, Kind::Enum { .. })
    }

    fn enum_underlying(&self) -> Option<Self> {
        match &self.inner.kind {
            Kind::Enum { underlying } => Some(underlying.clone()),
            _ => None,
        }
    }

    fn is_bool(&self) -> bool {
        matches!(self.inner.kind, Kind::Bool)
    }

    fn is_integral(&self) -> bool {
        matches!(self.inner.kind, Kind::Int { .. })
    }

    fn is_uint128(&self) -> bool {
        matches!(self.inner.kind, Kind::Int { bytes: 16, signed: false })
    }

    fn is_int128(&self) -> bool {
        matches!(self.inner.kind, Kind::Int { bytes: 16, signed: true })
    }

    fn is_uint64(&self) -> bool {
        matches!(self.inner.kind, Kind::Int { bytes: 8, signed: false })
    }

    fn is_int64(&self) -> bool {
        matches!(self.inner.kind, Kind::Int { bytes: 8, signed: true })
    }

    fn is_uint32(&self) -> bool {
        matches!(self.inner.kind, Kind::Int { bytes: 4, signed: false })
    }

    fn is_int32(&self) -> bool {
        matches!(self.inner.kind, Kind::Int { bytes: 4, signed: true })
    }

    fn is_uint16(&self) -> bool {
        matches!(self.inner.kind, Kind::Int { bytes: 2, signed: false })
    }

    fn is_int16(&self) -> bool {
        matches!(self.inner.kind, Kind::Int { bytes: 2, signed: true })
    }

    fn is_uchar(&self) -> bool {
        matches!(self.inner.kind, Kind::Int { bytes: 1, signed: false })
    }

    fn is_char(&self) -> bool {
        matches!(self.inner.kind, Kind::Int { bytes: 1, signed: true })
    }

    fn is_floating(&self) -> bool {
        matches!(self.inner.kind, Kind::Float | Kind::Double | Kind::LongDouble { .. })
    }

    fn is_long_double(&self) -> bool {
        matches!(self.inner.kind, Kind::LongDouble { .. })
    }

    fn is_double(&self) -> bool {
        matches!(self.inner.kind, Kind::Double)
    }

    fn is_float(&self) -> bool {
        matches!(self.inner.kind, Kind::Float)
    }

    fn unpadded_byte_size(&self) -> u64 {
        match &self.inner.kind {
            Kind::LongDouble { unpadded } => *unpadded,
            _ => 0,
        }
    }

    fn is_complex(&self) -> bool {
        matches!(self.inner.kind, Kind::Complex)
    }

    fn is_typedef(&self) -> bool {
        matches!(self.inner.kind, Kind::Typedef { .. })
    }

    fn resolved_type(&self) -> Option<Self> {
        match &self.inner.kind {
            Kind::Typedef { target } => Some(target.clone()),
            _ => None,
        }
    }
}

pub struct MockFunction {
    pub region: FunctionRegion,
    pub ty: Option<MockType>,
    pub name: Option<String>,
}

#[derive(Default)]
pub struct MockDatabase {
    pub functions: Vec<MockFunction>,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(
        &mut self,
        start: u64,
        end: u64,
        ty: Option<MockType>,
        name: Option<&str>,
    ) -> &mut Self {
        self.functions.push(MockFunction {
            region: FunctionRegion::new(start, end),
            ty,
            name: name.map(str::to_string),
        });
        self
    }
}

impl TypeDatabase for MockDatabase {
    type Type = MockType;

    fn function_containing(&self, address: u64) -> Option<FunctionRegion> {
        self.functions.iter().map(|f| f.region).find(|r| r.contains(address))
    }

    fn function_before(&self, address: u64) -> Option<FunctionRegion> {
        self.functions
            .iter()
            .map(|f| f.region)
            .filter(|r| r.start <= address)
            .max_by_key(|r| r.start)
    }

    fn type_at(&self, address: u64) -> Option<MockType> {
        self.functions.iter().find(|f| f.region.start == address).and_then(|f| f.ty.clone())
    }

    fn name_at(&self, address: u64) -> Option<String> {
        self.functions.iter().find(|f| f.region.start == address).and_then(|f| f.name.clone())
    }
}
