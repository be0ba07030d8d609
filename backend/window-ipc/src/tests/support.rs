// Shared fixtures for the unit tests

use crate::controller::{WindowController, WindowControllerBuilder};
use crate::error::handler::HandlerError;
use crate::registry::{HandlerRegistry, RegistryBuilder};
use crate::transport::{LocalRenderer, LocalTransport, LocalWindow, Payload, WindowHandle, WindowState};

use common::{WindowMethod, WindowType};

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub(crate) const EXAMPLE_WINDOW: &str = "exampleWindow";

pub(crate) struct ExampleWindow;

impl WindowType for ExampleWindow {
    const NAME: &'static str = EXAMPLE_WINDOW;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct GreetParams {
    #[serde(default)]
    pub name: Option<String>,
}

pub(crate) struct Greet;

impl WindowMethod for Greet {
    type Window = ExampleWindow;
    const NAME: &'static str = "greet";
    type Params = GreetParams;
    type Returns = String;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ColorChoice {
    pub color: String,
}

pub(crate) struct PickColor;

impl WindowMethod for PickColor {
    type Window = ExampleWindow;
    const NAME: &'static str = "pickColor";
    type Params = ();
    type Returns = ColorChoice;
    const NEEDS_RENDERER_ACK: bool = true;
}

/// Declared, but never put on an allow-list.
pub(crate) struct Secret;

impl WindowMethod for Secret {
    type Window = ExampleWindow;
    const NAME: &'static str = "secret";
    type Params = ();
    type Returns = String;
}

pub(crate) async fn greet(params: GreetParams) -> Result<String, HandlerError> {
    Ok(match params.name {
        Some(name) => format!("hello {name}"),
        None => String::from("hello"),
    })
}

pub(crate) fn example_registry() -> HandlerRegistry {
    RegistryBuilder::new()
        .declare::<ExampleWindow>()
        .register::<Greet, _, _, _>(|_, params| greet(params))
        .expect("greet registers")
        .register::<PickColor, _, _, _>(|_, _| async {
            Ok::<_, HandlerError>(ColorChoice {
                color: String::from("ignored"),
            })
        })
        .expect("pickColor registers")
        .register::<Secret, _, _, _>(|_, _| async { Ok::<_, HandlerError>(String::from("s3cret")) })
        .expect("secret registers")
        .build()
        .expect("registry builds")
}

/// Window handle that records every broadcast before delivering it.
pub(crate) struct RecordingWindow {
    inner: Arc<LocalWindow>,
    sent: Mutex<Vec<(String, Payload)>>,
}

impl RecordingWindow {
    pub(crate) fn new(inner: Arc<LocalWindow>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn sent_on(&self, channel: &str) -> Vec<Payload> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(sent_channel, _)| sent_channel == channel)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl WindowHandle for RecordingWindow {
    fn label(&self) -> &str {
        self.inner.label()
    }

    fn send(&self, channel: &str, payload: Payload) {
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.clone()));
        self.inner.send(channel, payload);
    }

    fn close(&self) {
        self.inner.close();
    }

    fn subscribe(&self) -> watch::Receiver<WindowState> {
        self.inner.subscribe()
    }
}

pub(crate) struct Harness {
    pub transport: Arc<LocalTransport>,
    pub window: Arc<LocalWindow>,
    pub recording: Arc<RecordingWindow>,
    pub renderer: Arc<LocalRenderer>,
    pub controller: WindowController,
}

pub(crate) fn open_window(registry: &HandlerRegistry, builder: WindowControllerBuilder) -> Harness {
    let transport = Arc::new(LocalTransport::new());
    let (window, renderer) = transport.open_window(EXAMPLE_WINDOW);
    let recording = RecordingWindow::new(Arc::clone(&window));
    let controller = builder.build(registry, recording.clone(), transport.clone());

    Harness {
        transport,
        window,
        recording,
        renderer,
        controller,
    }
}

pub(crate) fn open_example_window() -> Harness {
    open_window(
        &example_registry(),
        WindowControllerBuilder::new(EXAMPLE_WINDOW),
    )
}

/// Yield to spawned tasks until `condition` holds. Bounded by a yield
/// count rather than a timer so it also works with a paused clock.
pub(crate) async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..1000 {
        if condition() {
            return true;
        }
        tokio::task::yield_now().await;
    }
    condition()
}
