use crate::context::WindowContext;
use crate::error::handler::HandlerError;
use crate::error::registry::RegistryError;
use crate::registry::handler::MethodContract;
use crate::registry::{HandlerRegistry, WindowContract};

use common::channel::{is_reserved_method_name, is_valid_method_name};
use common::{ErrorLocation, WindowMethod, WindowType};

use std::collections::BTreeMap;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;

use log::debug;

/// Startup-time registration of window types and their methods.
///
/// Methods may be registered before their window type is declared; they are
/// held back and attached the moment the type is declared. Consumed by
/// [`RegistryBuilder::build`], after which the contract is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    declared: BTreeMap<String, WindowContract>,
    pending: BTreeMap<String, Vec<(String, MethodContract)>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a window type, attaching any methods registered for it so far.
    /// Declaring the same type again changes nothing.
    pub fn declare_window_type(mut self, window_type: impl Into<String>) -> Self {
        let window_type = window_type.into();
        if self.declared.contains_key(&window_type) {
            debug!("Window type '{window_type}' already declared");
            return self;
        }

        let mut contract = WindowContract::default();
        if let Some(pending) = self.pending.remove(&window_type) {
            debug!(
                "Attaching {} deferred method(s) to window type '{window_type}'",
                pending.len()
            );
            for (method, method_contract) in pending {
                contract.insert(method, method_contract);
            }
        }

        self.declared.insert(window_type, contract);
        self
    }

    pub fn declare<W: WindowType>(self) -> Self {
        self.declare_window_type(W::NAME)
    }

    /// Register one method for `window_type`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidMethodName`] when the name could not form a
    ///   unique scoped channel
    /// - [`RegistryError::ReservedMethodName`] for `close` and `ack`
    /// - [`RegistryError::DuplicateMethod`] when the type already has the
    ///   method, declared or still deferred
    #[track_caller]
    pub fn register_method(
        mut self,
        window_type: &str,
        method: &str,
        contract: MethodContract,
    ) -> Result<Self, RegistryError> {
        if !is_valid_method_name(method) {
            return Err(RegistryError::InvalidMethodName {
                window_type: window_type.to_string(),
                method: method.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if is_reserved_method_name(method) {
            return Err(RegistryError::ReservedMethodName {
                window_type: window_type.to_string(),
                method: method.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if self.is_registered(window_type, method) {
            return Err(RegistryError::DuplicateMethod {
                window_type: window_type.to_string(),
                method: method.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        match self.declared.get_mut(window_type) {
            Some(declared) => declared.insert(method.to_string(), contract),
            None => {
                debug!("Deferring '{method}' until window type '{window_type}' is declared");
                self.pending
                    .entry(window_type.to_string())
                    .or_default()
                    .push((method.to_string(), contract));
            }
        }

        Ok(self)
    }

    /// Register a typed handler for `M` on `M::Window`.
    #[track_caller]
    pub fn register<M, F, Fut, E>(self, handler: F) -> Result<Self, RegistryError>
    where
        M: WindowMethod,
        F: Fn(WindowContext, M::Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M::Returns, E>> + Send + 'static,
        E: Into<HandlerError> + 'static,
    {
        let contract = MethodContract::typed::<M, F, Fut, E>(handler);
        self.register_method(<M::Window as WindowType>::NAME, M::NAME, contract)
    }

    pub fn is_declared(&self, window_type: &str) -> bool {
        self.declared.contains_key(window_type)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    fn is_registered(&self, window_type: &str, method: &str) -> bool {
        let declared = self
            .declared
            .get(window_type)
            .is_some_and(|contract| contract.contains(method));
        let pending = self
            .pending
            .get(window_type)
            .is_some_and(|methods| methods.iter().any(|(name, _)| name == method));
        declared || pending
    }

    /// Freeze the registry.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UndeclaredWindowType`] when methods are still waiting
    /// for a window type that was never declared.
    #[track_caller]
    pub fn build(self) -> Result<HandlerRegistry, RegistryError> {
        if let Some((window_type, methods)) = self.pending.into_iter().next() {
            return Err(RegistryError::UndeclaredWindowType {
                window_type,
                methods: methods.into_iter().map(|(method, _)| method).collect(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(HandlerRegistry::from_contracts(Arc::new(self.declared)))
    }
}
