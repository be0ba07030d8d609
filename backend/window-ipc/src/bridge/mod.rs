//! Presentation-side bootstrap: the only way untrusted page code reaches the
//! IPC layer.
//!
//! Two globals are published. The fixed window manager (`isReady`,
//! `getData`, `onData`, `closeWindow`) exists before anything else. The
//! application API is an explicit allow-list: a method not listed has no
//! function on the page, whatever the contract declares.

pub mod allow_list;
pub mod global_scope;
pub mod window_manager;

pub use allow_list::{AllowListBridge, build_api, expose_methods};
pub use global_scope::GlobalScope;
pub use window_manager::{
    DEFAULT_SCOPE_NAME, WINDOW_MANAGER_GLOBAL, WindowData, WindowManager, expose_window_api,
};

use crate::error::client::ClientError;
use crate::transport::Payload;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

/// A function published to the page.
pub type ExposedFn =
    Arc<dyn Fn(Payload) -> BoxFuture<'static, Result<Payload, ClientError>> + Send + Sync>;

/// The object published under one global name.
#[derive(Clone, Default)]
pub struct ExposedApi {
    methods: BTreeMap<String, ExposedFn>,
}

impl ExposedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F, Fut>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Payload, ClientError>> + Send + 'static,
    {
        self.methods
            .insert(name.into(), Arc::new(move |payload| function(payload).boxed()));
    }

    pub fn with<F, Fut>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Payload, ClientError>> + Send + 'static,
    {
        self.insert(name, function);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ExposedFn> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for ExposedApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.methods.keys()).finish()
    }
}
