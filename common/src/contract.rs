//! Typed window contracts.
//!
//! A window type and each of its methods are declared as marker types
//! implementing [`WindowType`] and [`WindowMethod`]. This is the Rust form of
//! the generated typed registry: both sides compile against the same markers,
//! so a proxy call with the wrong window, params or return type does not
//! build. Nothing here validates payloads at runtime.
//!
//! [`ContractManifest`] is the declarations-only view of the same contract,
//! as emitted by the offline contract generation step.

use crate::ErrorLocation;
use crate::error::contract_error::ContractError;

use std::any::type_name;
use std::collections::BTreeMap;
use std::panic::Location;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A named category of presentation surface.
pub trait WindowType: Send + Sync + 'static {
    const NAME: &'static str;
}

/// One method a window type exposes to its presentation surface.
pub trait WindowMethod: Send + Sync + 'static {
    type Window: WindowType;

    const NAME: &'static str;

    type Params: Serialize + DeserializeOwned + Send + 'static;

    type Returns: Serialize + DeserializeOwned + Send + 'static;

    /// When set, the request completes with the payload the presentation
    /// side later sends on the companion `Response` channel instead of the
    /// handler's own return value.
    const NEEDS_RENDERER_ACK: bool = false;
}

/// Structural marker naming the params and return types of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeShape {
    pub params: String,
    pub returns: String,
}

impl TypeShape {
    pub fn of<M: WindowMethod>() -> Self {
        Self {
            params: short_type_name(type_name::<M::Params>()),
            returns: short_type_name(type_name::<M::Returns>()),
        }
    }

    /// Shape for handlers registered without type information.
    pub fn opaque() -> Self {
        Self {
            params: String::from("unknown"),
            returns: String::from("unknown"),
        }
    }
}

fn short_type_name(full: &str) -> String {
    // "alloc::string::String" -> "String", keeping generic arguments intact
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(index) => full[index + 2..].to_string(),
        None => full.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDeclaration {
    pub params: String,
    pub returns: String,
    #[serde(default)]
    pub needs_renderer_ack: bool,
}

impl MethodDeclaration {
    pub fn new(shape: TypeShape, needs_renderer_ack: bool) -> Self {
        Self {
            params: shape.params,
            returns: shape.returns,
            needs_renderer_ack,
        }
    }
}

/// Window type name -> method name -> declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractManifest {
    windows: BTreeMap<String, BTreeMap<String, MethodDeclaration>>,
}

impl ContractManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a window type with no methods (a no-op if it already exists).
    pub fn add_window(&mut self, window_type: impl Into<String>) {
        self.windows.entry(window_type.into()).or_default();
    }

    pub fn insert(
        &mut self,
        window_type: impl Into<String>,
        method: impl Into<String>,
        declaration: MethodDeclaration,
    ) {
        self.windows
            .entry(window_type.into())
            .or_default()
            .insert(method.into(), declaration);
    }

    pub fn window_types(&self) -> impl Iterator<Item = &str> {
        self.windows.keys().map(String::as_str)
    }

    pub fn methods(&self, window_type: &str) -> Option<&BTreeMap<String, MethodDeclaration>> {
        self.windows.get(window_type)
    }

    pub fn declaration(&self, window_type: &str, method: &str) -> Option<&MethodDeclaration> {
        self.windows.get(window_type)?.get(method)
    }

    pub fn contains(&self, window_type: &str, method: &str) -> bool {
        self.declaration(window_type, method).is_some()
    }

    #[track_caller]
    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        serde_json::from_str(json).map_err(|e| ContractError::Parse {
            message: format!("Invalid contract manifest: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    pub fn to_json_pretty(&self) -> Result<String, ContractError> {
        serde_json::to_string_pretty(self).map_err(|e| ContractError::Serialize {
            message: format!("Failed to serialize contract manifest: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
