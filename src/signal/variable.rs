//! Shared signal storage
//!
//! The application owns its process variables; the registry only holds
//! another handle to the same cell. Both sides read and write through the
//! handle, so the registry never needs raw pointers into application memory.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::kind::{SignalKind, WireValue};

/// A shared, typed process variable
///
/// Cloning yields another handle to the same storage.
pub struct Variable<T> {
    cell: Arc<Mutex<T>>,
}

impl<T: Scalar> Variable<T> {
    /// Create a variable holding `value`
    pub fn new(value: T) -> Self {
        Self {
            cell: Arc::new(Mutex::new(value)),
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        *self.cell.lock()
    }

    /// Overwrite the value
    pub fn set(&self, value: T) {
        *self.cell.lock() = value;
    }

    /// Apply `f` to the value in place
    pub fn modify(&self, f: impl FnOnce(&mut T)) {
        f(&mut *self.cell.lock());
    }

    /// Whether both handles refer to the same storage
    pub fn ptr_eq(&self, other: &Variable<T>) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T> Clone for Variable<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: Scalar + Default> Default for Variable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Scalar + fmt::Debug> fmt::Debug for Variable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Variable").field(&self.get()).finish()
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Scalar types that can back a signal
///
/// Sealed: the set of kinds is closed.
pub trait Scalar: Copy + Send + 'static + sealed::Sealed {
    /// Wire kind this type maps to
    const KIND: SignalKind;

    /// Tag the value with its kind
    fn into_wire(self) -> WireValue;

    /// Extract a value of this type, `None` on kind mismatch
    fn from_wire(value: WireValue) -> Option<Self>;

    /// Wrap a variable of this type into a type-erased binding
    fn bind(variable: &Variable<Self>) -> Binding;
}

/// A type-erased handle to a signal's storage
#[derive(Clone)]
pub enum Binding {
    Bool(Variable<bool>),
    Byte(Variable<u8>),
    Int16(Variable<i16>),
    UInt16(Variable<u16>),
    Int32(Variable<i32>),
    UInt32(Variable<u32>),
    Float32(Variable<f32>),
    Float64(Variable<f64>),
}

macro_rules! impl_scalar {
    ($ty:ty, $variant:ident) => {
        impl sealed::Sealed for $ty {}

        impl Scalar for $ty {
            const KIND: SignalKind = SignalKind::$variant;

            fn into_wire(self) -> WireValue {
                WireValue::$variant(self)
            }

            fn from_wire(value: WireValue) -> Option<Self> {
                match value {
                    WireValue::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn bind(variable: &Variable<Self>) -> Binding {
                Binding::$variant(variable.clone())
            }
        }
    };
}

impl_scalar!(bool, Bool);
impl_scalar!(u8, Byte);
impl_scalar!(i16, Int16);
impl_scalar!(u16, UInt16);
impl_scalar!(i32, Int32);
impl_scalar!(u32, UInt32);
impl_scalar!(f32, Float32);
impl_scalar!(f64, Float64);

impl Binding {
    /// Kind of the bound storage
    pub fn kind(&self) -> SignalKind {
        match self {
            Binding::Bool(_) => SignalKind::Bool,
            Binding::Byte(_) => SignalKind::Byte,
            Binding::Int16(_) => SignalKind::Int16,
            Binding::UInt16(_) => SignalKind::UInt16,
            Binding::Int32(_) => SignalKind::Int32,
            Binding::UInt32(_) => SignalKind::UInt32,
            Binding::Float32(_) => SignalKind::Float32,
            Binding::Float64(_) => SignalKind::Float64,
        }
    }

    /// Read the current value
    pub fn load(&self) -> WireValue {
        match self {
            Binding::Bool(v) => WireValue::Bool(v.get()),
            Binding::Byte(v) => WireValue::Byte(v.get()),
            Binding::Int16(v) => WireValue::Int16(v.get()),
            Binding::UInt16(v) => WireValue::UInt16(v.get()),
            Binding::Int32(v) => WireValue::Int32(v.get()),
            Binding::UInt32(v) => WireValue::UInt32(v.get()),
            Binding::Float32(v) => WireValue::Float32(v.get()),
            Binding::Float64(v) => WireValue::Float64(v.get()),
        }
    }

    /// Write `value` if its kind matches; returns whether the write happened
    pub fn store(&self, value: WireValue) -> bool {
        match (self, value) {
            (Binding::Bool(v), WireValue::Bool(x)) => v.set(x),
            (Binding::Byte(v), WireValue::Byte(x)) => v.set(x),
            (Binding::Int16(v), WireValue::Int16(x)) => v.set(x),
            (Binding::UInt16(v), WireValue::UInt16(x)) => v.set(x),
            (Binding::Int32(v), WireValue::Int32(x)) => v.set(x),
            (Binding::UInt32(v), WireValue::UInt32(x)) => v.set(x),
            (Binding::Float32(v), WireValue::Float32(x)) => v.set(x),
            (Binding::Float64(v), WireValue::Float64(x)) => v.set(x),
            _ => return false,
        }
        true
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Binding").field(&self.load()).finish()
    }
}
