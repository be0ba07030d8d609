//! Process-wide window contracts.
//!
//! Built once at startup through [`RegistryBuilder`], then frozen into a
//! [`HandlerRegistry`] that every window controller reads from.

pub mod builder;
pub mod handler;

pub use builder::RegistryBuilder;
pub use handler::{HandlerFn, MethodContract};

use common::{ContractManifest, MethodDeclaration};

use std::collections::BTreeMap;
use std::collections::btree_map::Iter;
use std::sync::Arc;

use once_cell::sync::Lazy;

static EMPTY_CONTRACT: Lazy<WindowContract> = Lazy::new(WindowContract::default);

/// Methods of one window type, keyed by method name.
#[derive(Debug, Clone, Default)]
pub struct WindowContract {
    methods: BTreeMap<String, MethodContract>,
}

impl WindowContract {
    pub(crate) fn insert(&mut self, method: String, contract: MethodContract) {
        self.methods.insert(method, contract);
    }

    pub fn get(&self, method: &str) -> Option<&MethodContract> {
        self.methods.get(method)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_, String, MethodContract> {
        self.methods.iter()
    }
}

impl<'a> IntoIterator for &'a WindowContract {
    type Item = (&'a String, &'a MethodContract);
    type IntoIter = Iter<'a, String, MethodContract>;

    fn into_iter(self) -> Self::IntoIter {
        self.methods.iter()
    }
}

/// Frozen registry; clones share the same contracts.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    windows: Arc<BTreeMap<String, WindowContract>>,
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub(crate) fn from_contracts(windows: Arc<BTreeMap<String, WindowContract>>) -> Self {
        Self { windows }
    }

    /// Contract of `window_type`; an unknown type has no methods.
    pub fn lookup(&self, window_type: &str) -> &WindowContract {
        self.windows.get(window_type).unwrap_or(&EMPTY_CONTRACT)
    }

    pub fn is_declared(&self, window_type: &str) -> bool {
        self.windows.contains_key(window_type)
    }

    pub fn window_types(&self) -> impl Iterator<Item = &str> {
        self.windows.keys().map(String::as_str)
    }

    /// Declarations-only view for the presentation side.
    pub fn manifest(&self) -> ContractManifest {
        let mut manifest = ContractManifest::new();
        for (window_type, contract) in self.windows.iter() {
            manifest.add_window(window_type.as_str());
            for (method, method_contract) in contract {
                manifest.insert(
                    window_type.as_str(),
                    method.as_str(),
                    MethodDeclaration::new(
                        method_contract.shape().clone(),
                        method_contract.needs_renderer_ack(),
                    ),
                );
            }
        }
        manifest
    }
}
