//! Conversion engine: foreign type -> type IR, with a per-call identity
//! cache.
//!
//! The engine is a cache-first recursive descent. Interior nodes are
//! inserted into the cache *before* their children are converted, so a
//! struct that contains a pointer to itself resolves that pointer to its
//! own in-progress node and the IR closes into a real cycle instead of
//! recursing forever.

use std::collections::HashMap;

use thiserror::Error;

use crate::foreign::{ForeignType, ForeignTypeId};
use crate::model::{Type, TypeRef};

/// A foreign type fell outside the classification grammar, or a required
/// child could not be produced. Never retried; propagates to the top-level
/// caller.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("unhandled type `{name}`: {description}")]
    Unhandled { description: String, name: String, id: ForeignTypeId },
}

impl TypeError {
    fn unhandled<T: ForeignType>(ty: &T, description: impl Into<String>) -> Self {
        TypeError::Unhandled {
            description: description.into(),
            name: ty.display_name(),
            id: ty.id(),
        }
    }
}

/// Identity cache mapping a foreign type's id to the IR node already built
/// for it.
///
/// Scope is one top-level conversion call, not the whole session: repeated
/// independent calls start empty, which trades re-translation of shared
/// subgraphs for immunity to the host database mutating between calls.
#[derive(Debug, Default)]
pub struct TypeCache {
    entries: HashMap<ForeignTypeId, TypeRef>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, id: ForeignTypeId) -> Option<TypeRef> {
        self.entries.get(&id).cloned()
    }

    pub fn insert(&mut self, id: ForeignTypeId, node: TypeRef) {
        self.entries.insert(id, node);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Closed classification of a foreign type, derived once per handle.
///
/// Capability probing happens only in [`classify`]; the engine then matches
/// this enum exhaustively, so "every kind is handled" is checked by the
/// compiler rather than by the order of a predicate grab-bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Void,
    Pointer,
    Function,
    Array,
    Vector,
    Struct,
    Union,
    Enum,
    Bool,
    Integer { width: u8, signed: bool },
    Float { width: u32 },
    Typedef,
}

/// Classify a foreign type by capability, first match wins.
///
/// The precedence order is fixed: void, then the pointer/function/array
/// group, vector, the struct/union/enum group, bool, integral (widest and
/// unsigned predicates first, since host width predicates may overlap),
/// floating, complex (always unhandled), typedef.
pub fn classify<T: ForeignType>(ty: &T) -> Result<TypeClass, TypeError> {
    if ty.is_void() {
        return Ok(TypeClass::Void);
    }
    if ty.is_pointer() {
        return Ok(TypeClass::Pointer);
    }
    if ty.is_function() {
        return Ok(TypeClass::Function);
    }
    if ty.is_array() {
        return Ok(TypeClass::Array);
    }
    if ty.is_vector() {
        return Ok(TypeClass::Vector);
    }
    if ty.is_struct_or_union() {
        return Ok(if ty.is_struct() { TypeClass::Struct } else { TypeClass::Union });
    }
    if ty.is_enum() {
        return Ok(TypeClass::Enum);
    }
    if ty.is_bool() {
        return Ok(TypeClass::Bool);
    }
    if ty.is_integral() {
        let (width, signed) = if ty.is_uint128() {
            (16, false)
        } else if ty.is_int128() {
            (16, true)
        } else if ty.is_uint64() {
            (8, false)
        } else if ty.is_int64() {
            (8, true)
        } else if ty.is_uint32() {
            (4, false)
        } else if ty.is_int32() {
            (4, true)
        } else if ty.is_uint16() {
            (2, false)
        } else if ty.is_int16() {
            (2, true)
        } else if ty.is_uchar() {
            (1, false)
        } else if ty.is_char() {
            (1, true)
        } else {
            return Err(TypeError::unhandled(ty, "integral type with no recognized width"));
        };
        return Ok(TypeClass::Integer { width, signed });
    }
    if ty.is_floating() {
        let width = if ty.is_long_double() {
            // Extended precision: the native unpadded size is the only
            // reliable width source.
            ty.unpadded_byte_size() as u32
        } else if ty.is_double() {
            8
        } else if ty.is_float() {
            4
        } else {
            return Err(TypeError::unhandled(ty, "floating-point type with no recognized width"));
        };
        return Ok(TypeClass::Float { width });
    }
    if ty.is_complex() {
        return Err(TypeError::unhandled(ty, "complex numbers are not representable"));
    }
    if ty.is_typedef() {
        return Ok(TypeClass::Typedef);
    }
    Err(TypeError::unhandled(ty, "no classification rule matched"))
}

/// Convert a foreign type with a fresh per-call identity cache.
pub fn convert_type<T: ForeignType>(ty: &T) -> Result<TypeRef, TypeError> {
    let mut cache = TypeCache::new();
    convert_type_with(ty, &mut cache)
}

/// Convert a foreign type, consulting and extending `cache`.
///
/// Converting the same foreign identity twice against one cache returns the
/// pointer-identical node the second time. On failure the cache may hold
/// provisional entries for the failed subtree; callers discard the cache
/// with the failed call.
pub fn convert_type_with<T: ForeignType>(
    ty: &T,
    cache: &mut TypeCache,
) -> Result<TypeRef, TypeError> {
    if let Some(node) = cache.lookup(ty.id()) {
        return Ok(node);
    }

    match classify(ty)? {
        TypeClass::Void => Ok(finished(ty, Type::Void, cache)),
        TypeClass::Bool => Ok(finished(ty, Type::Bool, cache)),
        TypeClass::Integer { width, signed } => {
            Ok(finished(ty, Type::Integer { width, signed }, cache))
        }
        TypeClass::Float { width } => Ok(finished(ty, Type::Float { width }, cache)),
        TypeClass::Pointer => {
            let node = provisional(ty, cache);
            let pointee = ty
                .pointee()
                .ok_or_else(|| TypeError::unhandled(ty, "pointer with no pointee"))?;
            let element = convert_type_with(&pointee, cache)?;
            *node.borrow_mut() = Type::Pointer { element };
            Ok(node)
        }
        TypeClass::Function => {
            let node = provisional(ty, cache);
            let ret = ty
                .return_type()
                .ok_or_else(|| TypeError::unhandled(ty, "function with no return type"))?;
            let return_type = convert_type_with(&ret, cache)?;

            let count = ty.parameter_count();
            let mut parameters = Vec::with_capacity(count);
            for index in 0..count {
                let param = ty.parameter(index).ok_or_else(|| {
                    TypeError::unhandled(ty, format!("missing parameter {index}"))
                })?;
                parameters.push(convert_type_with(&param, cache)?);
            }

            let stack_cleanup_bytes = ty.purges_stack().then(|| ty.purged_bytes());
            *node.borrow_mut() = Type::Function {
                return_type,
                parameters,
                is_variadic: ty.is_variadic(),
                stack_cleanup_bytes,
            };
            Ok(node)
        }
        TypeClass::Array => {
            let node = provisional(ty, cache);
            let elem = ty
                .array_element()
                .ok_or_else(|| TypeError::unhandled(ty, "array with no element type"))?;
            let element = convert_type_with(&elem, cache)?;
            *node.borrow_mut() = Type::Array { element, count: ty.array_len() };
            Ok(node)
        }
        TypeClass::Vector => {
            // Approximate SIMD lanes as raw bytes. Downstream consumers must
            // not rely on lane shapes.
            let node = provisional(ty, cache);
            let count = ty.byte_size();
            let element = Type::Integer { width: 1, signed: false }.shared();
            *node.borrow_mut() = Type::Vector { element, count };
            Ok(node)
        }
        class @ (TypeClass::Struct | TypeClass::Union) => {
            let node = provisional(ty, cache);
            let count = ty.member_count();
            let mut members = Vec::with_capacity(count);
            for index in 0..count {
                // A member the host cannot enumerate ends the list; a
                // partial member list beats failing the whole conversion.
                let Some(member) = ty.member_type(index) else { break };
                members.push(convert_type_with(&member, cache)?);
            }
            *node.borrow_mut() = if class == TypeClass::Struct {
                Type::Struct { members }
            } else {
                Type::Union { members }
            };
            Ok(node)
        }
        TypeClass::Enum => {
            let node = provisional(ty, cache);
            let base = ty
                .enum_underlying()
                .ok_or_else(|| TypeError::unhandled(ty, "enum with no underlying type"))?;
            let underlying = convert_type_with(&base, cache)?;
            *node.borrow_mut() = Type::Enum { underlying };
            Ok(node)
        }
        TypeClass::Typedef => {
            // Keep the one level of indirection; alias identity matters for
            // downstream naming.
            let node = provisional(ty, cache);
            let real = ty
                .resolved_type()
                .ok_or_else(|| TypeError::unhandled(ty, "typedef with no resolved type"))?;
            let target = convert_type_with(&real, cache)?;
            *node.borrow_mut() = Type::Typedef { target };
            Ok(node)
        }
    }
}

/// Cache and return a completed leaf node.
///
/// Leaves are cached too, so converting the same foreign handle twice in
/// one call yields the identical node rather than a fresh value-equal one.
fn finished<T: ForeignType>(ty: &T, built: Type, cache: &mut TypeCache) -> TypeRef {
    let node = built.shared();
    cache.insert(ty.id(), node.clone());
    node
}

/// Insert a placeholder for an interior node before its children convert.
///
/// The contents are patched after recursion; the `Rc` identity handed to
/// the cache never changes, which is what lets a descendant close a cycle
/// back onto this node.
fn provisional<T: ForeignType>(ty: &T, cache: &mut TypeCache) -> TypeRef {
    let node = Type::Void.shared();
    cache.insert(ty.id(), node.clone());
    node
}
