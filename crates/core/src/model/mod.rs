//! Portable type IR shared by the conversion engine and function entities.
//!
//! Nodes are reference-counted and mutable in place so that self-referential
//! types (a struct holding a pointer to itself) form real cycles in the
//! graph. Any traversal that follows `Pointer` edges must therefore track
//! visited node identity; the helpers in this module do.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a type node. Multiple parents (including a node's own
/// descendants) may hold the same handle; identity is `Rc::ptr_eq`.
pub type TypeRef = Rc<RefCell<Type>>;

/// One node in the type IR.
///
/// The IR transliterates the host tool's types; it does not validate them.
/// Bitfields, padding, and calling-convention details beyond argument order,
/// variadics, and stack cleanup are not modeled.
#[derive(Debug, Clone)]
pub enum Type {
    Void,
    Bool,
    /// Fixed-width integer; `width` is in bytes (1, 2, 4, 8, or 16).
    Integer { width: u8, signed: bool },
    /// Floating-point value; `width` is in bytes and may be a platform
    /// extended-precision size (e.g. 10 or 12 for long double).
    Float { width: u32 },
    Pointer { element: TypeRef },
    /// `count` may be zero for flexible/unbounded arrays.
    Array { element: TypeRef, count: u64 },
    /// SIMD value approximated as `count` raw bytes; the element type is
    /// always a one-byte unsigned integer, never a real lane decomposition.
    Vector { element: TypeRef, count: u64 },
    Function {
        return_type: TypeRef,
        parameters: Vec<TypeRef>,
        is_variadic: bool,
        /// Bytes the callee pops off the stack; set only for purging
        /// calling conventions.
        stack_cleanup_bytes: Option<u32>,
    },
    Struct { members: Vec<TypeRef> },
    Union { members: Vec<TypeRef> },
    /// `underlying` is the enum's arithmetic base type.
    Enum { underlying: TypeRef },
    /// One level of alias; the target may itself be another `Typedef`.
    Typedef { target: TypeRef },
}

impl Type {
    /// Wrap this node in a shared, mutable handle.
    pub fn shared(self) -> TypeRef {
        Rc::new(RefCell::new(self))
    }
}

/// Structural equality over two type graphs, cycle-safe.
///
/// A pair of nodes already under comparison is treated as equal, so two
/// independently built but isomorphic cyclic graphs compare equal without
/// the walk diverging.
pub fn structurally_equal(a: &TypeRef, b: &TypeRef) -> bool {
    let mut in_progress = HashSet::new();
    eq_nodes(a, b, &mut in_progress)
}

fn eq_nodes(a: &TypeRef, b: &TypeRef, in_progress: &mut HashSet<(usize, usize)>) -> bool {
    if Rc::ptr_eq(a, b) {
        return true;
    }
    let key = (Rc::as_ptr(a) as usize, Rc::as_ptr(b) as usize);
    if !in_progress.insert(key) {
        // This pair is already being compared further up the walk.
        return true;
    }

    let a = a.borrow();
    let b = b.borrow();
    match (&*a, &*b) {
        (Type::Void, Type::Void) => true,
        (Type::Bool, Type::Bool) => true,
        (Type::Integer { width: wa, signed: sa }, Type::Integer { width: wb, signed: sb }) => {
            wa == wb && sa == sb
        }
        (Type::Float { width: wa }, Type::Float { width: wb }) => wa == wb,
        (Type::Pointer { element: ea }, Type::Pointer { element: eb }) => {
            eq_nodes(ea, eb, in_progress)
        }
        (Type::Array { element: ea, count: ca }, Type::Array { element: eb, count: cb }) => {
            ca == cb && eq_nodes(ea, eb, in_progress)
        }
        (Type::Vector { element: ea, count: ca }, Type::Vector { element: eb, count: cb }) => {
            ca == cb && eq_nodes(ea, eb, in_progress)
        }
        (
            Type::Function {
                return_type: ra,
                parameters: pa,
                is_variadic: va,
                stack_cleanup_bytes: ka,
            },
            Type::Function {
                return_type: rb,
                parameters: pb,
                is_variadic: vb,
                stack_cleanup_bytes: kb,
            },
        ) => {
            va == vb
                && ka == kb
                && pa.len() == pb.len()
                && eq_nodes(ra, rb, in_progress)
                && pa.iter().zip(pb.iter()).all(|(x, y)| eq_nodes(x, y, in_progress))
        }
        (Type::Struct { members: ma }, Type::Struct { members: mb })
        | (Type::Union { members: ma }, Type::Union { members: mb }) => {
            ma.len() == mb.len()
                && ma.iter().zip(mb.iter()).all(|(x, y)| eq_nodes(x, y, in_progress))
        }
        (Type::Enum { underlying: ua }, Type::Enum { underlying: ub }) => {
            eq_nodes(ua, ub, in_progress)
        }
        (Type::Typedef { target: ta }, Type::Typedef { target: tb }) => {
            eq_nodes(ta, tb, in_progress)
        }
        _ => false,
    }
}

/// Cycle-safe, one-line rendering of a type graph for diagnostics.
///
/// Re-entering a node that is already on the rendering path prints
/// `<cycle>` instead of recursing. This is a debugging aid, not the
/// downstream specification format.
pub struct TypeDisplay<'a> {
    root: &'a TypeRef,
}

impl<'a> TypeDisplay<'a> {
    pub fn new(root: &'a TypeRef) -> Self {
        Self { root }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = Vec::new();
        render(self.root, &mut path, f)
    }
}

fn render(node: &TypeRef, path: &mut Vec<usize>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let id = Rc::as_ptr(node) as usize;
    if path.contains(&id) {
        return write!(f, "<cycle>");
    }
    path.push(id);

    let result = match &*node.borrow() {
        Type::Void => write!(f, "void"),
        Type::Bool => write!(f, "bool"),
        Type::Integer { width, signed } => {
            write!(f, "{}{}", if *signed { 'i' } else { 'u' }, u32::from(*width) * 8)
        }
        Type::Float { width } => write!(f, "f{}", width * 8),
        Type::Pointer { element } => {
            write!(f, "*")?;
            render(element, path, f)
        }
        Type::Array { element, count } => {
            write!(f, "[{count} x ")?;
            render(element, path, f)?;
            write!(f, "]")
        }
        Type::Vector { element, count } => {
            write!(f, "<{count} x ")?;
            render(element, path, f)?;
            write!(f, ">")
        }
        Type::Function { return_type, parameters, is_variadic, stack_cleanup_bytes } => {
            write!(f, "fn(")?;
            for (i, param) in parameters.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                render(param, path, f)?;
            }
            if *is_variadic {
                if !parameters.is_empty() {
                    write!(f, ", ")?;
                }
                write!(f, "...")?;
            }
            write!(f, ") -> ")?;
            render(return_type, path, f)?;
            if let Some(bytes) = stack_cleanup_bytes {
                write!(f, " [purges {bytes}]")?;
            }
            Ok(())
        }
        Type::Struct { members } => {
            write!(f, "struct {{ ")?;
            for (i, member) in members.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                render(member, path, f)?;
            }
            write!(f, " }}")
        }
        Type::Union { members } => {
            write!(f, "union {{ ")?;
            for (i, member) in members.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                render(member, path, f)?;
            }
            write!(f, " }}")
        }
        Type::Enum { underlying } => {
            write!(f, "enum(")?;
            render(underlying, path, f)?;
            write!(f, ")")
        }
        Type::Typedef { target } => {
            write!(f, "alias(")?;
            render(target, path, f)?;
            write!(f, ")")
        }
    };

    path.pop();
    result
}
