//! Container-scoped name resolution.
//!
//! A [`Resolver`] answers lookups for a name as written in an expression by
//! trying it against each enclosing namespace of the expression container,
//! most qualified first. With container `a.b`, the name `f` is looked up as
//! `a.b.f`, then `a.f`, then `f`. A name starting with `.` is absolute and is
//! only looked up as written (without the dot).
//!
//! The first candidate with a match wins; later candidates are not checked.

mod qualify;
mod registry;

pub use qualify::resolve_references;
pub use registry::{FunctionDescriptor, FunctionRegistry, RegistryError, TypeInfo, TypeRegistry};

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::ast::Value;
use crate::program::{Binding, OverloadId, Overloads};
use crate::{String, ToString, Vec, format, vec};

pub struct Resolver<'r> {
    /// Container prefixes, most qualified first, always ending with "".
    namespace_prefixes: Vec<String>,
    /// Enumerator values keyed by fully qualified name.
    enum_values: HashMap<String, Value>,
    functions: &'r FunctionRegistry,
    types: &'r TypeRegistry,
    resolve_qualified_type_identifiers: bool,
}

impl<'r> Resolver<'r> {
    pub fn new(
        container: &str,
        functions: &'r FunctionRegistry,
        types: &'r TypeRegistry,
        resolve_qualified_type_identifiers: bool,
    ) -> Self {
        let mut namespace_prefixes = Vec::new();
        let mut prefix = String::new();
        for segment in container.split('.').filter(|segment| !segment.is_empty()) {
            prefix.push_str(segment);
            prefix.push('.');
            namespace_prefixes.push(prefix.clone());
        }
        namespace_prefixes.reverse();
        namespace_prefixes.push(String::new());

        let enum_values = types
            .enums()
            .flat_map(|(enum_name, enumerators)| {
                enumerators.iter().map(move |(enumerator, number)| {
                    (format!("{}.{}", enum_name, enumerator), Value::Int(*number))
                })
            })
            .collect();

        Self {
            namespace_prefixes,
            enum_values,
            functions,
            types,
            resolve_qualified_type_identifiers,
        }
    }

    pub fn namespace_prefixes(&self) -> &[String] {
        &self.namespace_prefixes
    }

    /// Candidate names for `name`, in lookup order.
    pub fn fully_qualified_names(&self, name: &str) -> Vec<String> {
        if let Some(absolute) = name.strip_prefix('.') {
            return vec![absolute.to_string()];
        }
        self.namespace_prefixes
            .iter()
            .map(|prefix| format!("{}{}", prefix, name))
            .collect()
    }

    /// Enum constant or type value named by `name`.
    ///
    /// Qualified type names (`pkg.Type`) are only resolved when qualified type
    /// identifiers are enabled; builtin names such as `int` always are.
    pub fn find_constant(&self, name: &str) -> Option<Value> {
        for candidate in self.fully_qualified_names(name) {
            if let Some(value) = self.enum_values.get(&candidate) {
                return Some(value.clone());
            }
            if (self.resolve_qualified_type_identifiers || !candidate.contains('.'))
                && self.types.find_type(&candidate).is_some()
            {
                return Some(Value::Type(candidate));
            }
        }
        None
    }

    pub fn find_overloads(&self, name: &str, receiver_style: bool, arg_count: usize) -> Overloads {
        self.find(name, Binding::Eager, |candidate| {
            self.functions
                .find_overloads(candidate, receiver_style, arg_count)
        })
    }

    pub fn find_lazy_overloads(
        &self,
        name: &str,
        receiver_style: bool,
        arg_count: usize,
    ) -> Overloads {
        self.find(name, Binding::Lazy, |candidate| {
            self.functions
                .find_lazy_overloads(candidate, receiver_style, arg_count)
        })
    }

    fn find<F>(&self, name: &str, binding: Binding, lookup: F) -> Overloads
    where
        F: Fn(&str) -> SmallVec<[OverloadId; 2]>,
    {
        self.fully_qualified_names(name)
            .iter()
            .map(|candidate| lookup(candidate))
            .find(|ids| !ids.is_empty())
            .map(|ids| Overloads { binding, ids })
            .unwrap_or_else(|| Overloads::new(binding))
    }

    /// Whether `name`, exactly as given, has an overload of the given shape.
    pub fn overload_exists(&self, name: &str, receiver_style: bool, arg_count: usize) -> bool {
        self.functions.has_overload(name, receiver_style, arg_count)
    }

    /// Fully qualified name of the constructible message type `name` refers to.
    pub fn find_type_adapter(&self, name: &str) -> Option<String> {
        self.fully_qualified_names(name)
            .into_iter()
            .find(|candidate| {
                self.types
                    .find_type(candidate)
                    .is_some_and(|info| info.creatable)
            })
    }
}
