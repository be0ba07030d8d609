//! Window types this host serves and the handlers behind their methods.

use window_ipc::error::{HandlerError, RegistryError};
use window_ipc::{HandlerRegistry, IpcConfig, RegistryBuilder, WindowContext};

use common::{WindowMethod, WindowType};

use log::info;
use serde::{Deserialize, Serialize};

// ============================================
// exampleWindow
// ============================================

pub struct ExampleWindow;

impl WindowType for ExampleWindow {
    const NAME: &'static str = "exampleWindow";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GreetParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

pub struct Greet;

impl WindowMethod for Greet {
    type Window = ExampleWindow;
    const NAME: &'static str = "greet";
    type Params = GreetParams;
    type Returns = String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorChoice {
    pub color: String,
}

/// The page shows a picker and answers on `pickColorResponse`.
pub struct PickColor;

impl WindowMethod for PickColor {
    type Window = ExampleWindow;
    const NAME: &'static str = "pickColor";
    type Params = ();
    type Returns = ColorChoice;
    const NEEDS_RENDERER_ACK: bool = true;
}

// ============================================
// settingsWindow
// ============================================

pub struct SettingsWindow;

impl WindowType for SettingsWindow {
    const NAME: &'static str = "settingsWindow";
}

/// The IPC settings the host is running with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    pub handshake_interval_ms: u64,
    pub response_timeout_ms: Option<u64>,
    pub window_id_length: usize,
    pub port: u16,
}

impl From<&IpcConfig> for SettingsSnapshot {
    fn from(config: &IpcConfig) -> Self {
        Self {
            handshake_interval_ms: config.handshake.interval_ms,
            response_timeout_ms: config.response_wait.timeout_ms,
            window_id_length: config.window_id_length,
            port: config.transport.port,
        }
    }
}

pub struct GetSettings;

impl WindowMethod for GetSettings {
    type Window = SettingsWindow;
    const NAME: &'static str = "getSettings";
    type Params = ();
    type Returns = SettingsSnapshot;
}

// ============================================
// HANDLERS
// ============================================

pub async fn greet(context: WindowContext, params: GreetParams) -> Result<String, HandlerError> {
    match params.name.as_deref().map(str::trim) {
        Some("") => Err(HandlerError::new("name must not be blank")),
        Some(name) => {
            info!("Window {} greeted {name}", context.window_id());
            Ok(format!("hello {name}"))
        }
        None => Ok(String::from("hello")),
    }
}

/// Only opens the picker; the answer is whatever the page sends back.
pub async fn pick_color(context: WindowContext, _: ()) -> Result<ColorChoice, HandlerError> {
    info!("Window {} opened the color picker", context.window_id());
    Ok(ColorChoice {
        color: String::new(),
    })
}

/// Build the frozen registry for every window type this host serves.
pub fn build_registry(config: &IpcConfig) -> Result<HandlerRegistry, RegistryError> {
    let settings = SettingsSnapshot::from(config);

    RegistryBuilder::new()
        .declare::<ExampleWindow>()
        .register::<Greet, _, _, _>(greet)?
        .register::<PickColor, _, _, _>(pick_color)?
        .declare::<SettingsWindow>()
        .register::<GetSettings, _, _, _>(move |_, _| {
            let settings = settings.clone();
            async move { Ok::<_, HandlerError>(settings) }
        })?
        .build()
}
