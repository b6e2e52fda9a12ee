//! In-memory function and type registries.

use alloc::collections::BTreeMap;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::program::{Binding, OverloadId};
use crate::{String, Vec};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Overload '{overload_id}' is already registered for '{name}'")]
    DuplicateOverload {
        name: String,
        overload_id: OverloadId,
    },
    #[error("Type '{0}' is already registered")]
    DuplicateType(String),
    #[error("Enum '{0}' is already registered")]
    DuplicateEnum(String),
    #[error("Invalid name: '{0}'")]
    InvalidName(String),
}

/// Signature of one overload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub name: String,
    pub receiver_style: bool,
    /// Number of arguments, counting the receiver.
    pub arg_count: usize,
    pub overload_id: OverloadId,
}

impl FunctionDescriptor {
    pub fn new(
        name: impl Into<String>,
        receiver_style: bool,
        arg_count: usize,
        overload_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            receiver_style,
            arg_count,
            overload_id: OverloadId::new(overload_id),
        }
    }

    /// Global function.
    pub fn global(
        name: impl Into<String>,
        arg_count: usize,
        overload_id: impl Into<String>,
    ) -> Self {
        Self::new(name, false, arg_count, overload_id)
    }

    /// Receiver-style function; `arg_count` includes the receiver.
    pub fn receiver(
        name: impl Into<String>,
        arg_count: usize,
        overload_id: impl Into<String>,
    ) -> Self {
        Self::new(name, true, arg_count, overload_id)
    }

    fn matches(&self, receiver_style: bool, arg_count: usize) -> bool {
        self.receiver_style == receiver_style && self.arg_count == arg_count
    }
}

#[derive(Debug, Clone)]
struct RegisteredOverload {
    descriptor: FunctionDescriptor,
    binding: Binding,
}

/// Overloads by function name.
///
/// Overloads registered with [`register_lazy`](Self::register_lazy) have no
/// implementation at build time; the activation provides one when the
/// program runs.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Vec<RegisteredOverload>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: FunctionDescriptor) -> Result<(), RegistryError> {
        self.insert(descriptor, Binding::Eager)
    }

    pub fn register_lazy(&mut self, descriptor: FunctionDescriptor) -> Result<(), RegistryError> {
        self.insert(descriptor, Binding::Lazy)
    }

    fn insert(
        &mut self,
        descriptor: FunctionDescriptor,
        binding: Binding,
    ) -> Result<(), RegistryError> {
        if descriptor.name.is_empty() {
            return Err(RegistryError::InvalidName(descriptor.name));
        }
        let overloads = self.functions.entry(descriptor.name.clone()).or_default();
        if overloads
            .iter()
            .any(|existing| existing.descriptor.overload_id == descriptor.overload_id)
        {
            return Err(RegistryError::DuplicateOverload {
                name: descriptor.name,
                overload_id: descriptor.overload_id,
            });
        }
        overloads.push(RegisteredOverload {
            descriptor,
            binding,
        });
        Ok(())
    }

    /// Eagerly bound overloads matching the call shape, in registration order.
    pub fn find_overloads(
        &self,
        name: &str,
        receiver_style: bool,
        arg_count: usize,
    ) -> SmallVec<[OverloadId; 2]> {
        self.find(name, receiver_style, arg_count, Binding::Eager)
    }

    pub fn find_lazy_overloads(
        &self,
        name: &str,
        receiver_style: bool,
        arg_count: usize,
    ) -> SmallVec<[OverloadId; 2]> {
        self.find(name, receiver_style, arg_count, Binding::Lazy)
    }

    fn find(
        &self,
        name: &str,
        receiver_style: bool,
        arg_count: usize,
        binding: Binding,
    ) -> SmallVec<[OverloadId; 2]> {
        self.functions
            .get(name)
            .into_iter()
            .flatten()
            .filter(|overload| {
                overload.binding == binding
                    && overload.descriptor.matches(receiver_style, arg_count)
            })
            .map(|overload| overload.descriptor.overload_id.clone())
            .collect()
    }

    /// Whether any overload, eager or lazy, matches the call shape.
    pub fn has_overload(&self, name: &str, receiver_style: bool, arg_count: usize) -> bool {
        self.functions.get(name).is_some_and(|overloads| {
            overloads
                .iter()
                .any(|overload| {
                    overload.descriptor.matches(receiver_style, arg_count)
                })
        })
    }

    pub fn len(&self) -> usize {
        self.functions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    /// Whether messages of this type can be built with a struct literal.
    pub creatable: bool,
}

/// Known type names and enum definitions.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeInfo>,
    enums: BTreeMap<String, Vec<(String, i64)>>,
}

const BUILTIN_TYPES: &[&str] = &[
    "bool",
    "bytes",
    "double",
    "google.protobuf.Duration",
    "google.protobuf.Timestamp",
    "int",
    "list",
    "map",
    "null_type",
    "string",
    "type",
    "uint",
];

impl TypeRegistry {
    /// Registry with the builtin type names.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for name in BUILTIN_TYPES {
            let info = TypeInfo { creatable: false };
            registry.types.insert(String::from(*name), info);
        }
        registry
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers a message type that struct literals may construct.
    pub fn register_message(&mut self, name: impl Into<String>) -> Result<(), RegistryError> {
        self.insert_type(name.into(), TypeInfo { creatable: true })
    }

    /// Registers a type that can be named but not constructed.
    pub fn register_type(&mut self, name: impl Into<String>) -> Result<(), RegistryError> {
        self.insert_type(name.into(), TypeInfo { creatable: false })
    }

    fn insert_type(&mut self, name: String, info: TypeInfo) -> Result<(), RegistryError> {
        if name.is_empty() || name.starts_with('.') || name.ends_with('.') {
            return Err(RegistryError::InvalidName(name));
        }
        if self.types.contains_key(&name) {
            return Err(RegistryError::DuplicateType(name));
        }
        self.types.insert(name, info);
        Ok(())
    }

    /// Registers an enum and its enumerators. The enum name itself becomes a
    /// known type.
    pub fn register_enum<I, S>(
        &mut self,
        name: impl Into<String>,
        enumerators: I,
    ) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let name = name.into();
        if self.enums.contains_key(&name) {
            return Err(RegistryError::DuplicateEnum(name));
        }
        self.insert_type(name.clone(), TypeInfo { creatable: false })?;
        let enumerators = enumerators
            .into_iter()
            .map(|(e, n)| (e.into(), n))
            .collect();
        self.enums.insert(name, enumerators);
        Ok(())
    }

    pub fn find_type(&self, name: &str) -> Option<TypeInfo> {
        self.types.get(name).copied()
    }

    /// Enums in name order, with their enumerators in declaration order.
    pub fn enums(&self) -> impl Iterator<Item = (&str, &[(String, i64)])> {
        self.enums
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

static_assertions::assert_impl_all!(FunctionRegistry: Send, Sync);
static_assertions::assert_impl_all!(TypeRegistry: Send, Sync);
