//! Shared contract and utilities for the integration tests.
//!
//! - A `demoWindow` contract with one plain and one renderer-ack method
//! - A registry wiring both
//! - A real-time polling helper for cross-task conditions

use window_ipc::error::HandlerError;
use window_ipc::{HandlerRegistry, RegistryBuilder};

use common::{WindowMethod, WindowType};

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEMO_WINDOW: &str = "demoWindow";

/// Test constant for authentication
pub const TEST_AUTH_TOKEN: &str = "test-token-12345";

pub struct DemoWindow;

impl WindowType for DemoWindow {
    const NAME: &'static str = DEMO_WINDOW;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GreetParams {
    #[serde(default)]
    pub name: Option<String>,
}

pub struct Greet;

impl WindowMethod for Greet {
    type Window = DemoWindow;
    const NAME: &'static str = "greet";
    type Params = GreetParams;
    type Returns = String;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    pub confirmed: bool,
}

pub struct Confirm;

impl WindowMethod for Confirm {
    type Window = DemoWindow;
    const NAME: &'static str = "confirm";
    type Params = ();
    type Returns = Confirmation;
    const NEEDS_RENDERER_ACK: bool = true;
}

pub fn demo_registry() -> HandlerRegistry {
    RegistryBuilder::new()
        .register::<Greet, _, _, _>(|_, params: GreetParams| async move {
            match params.name.as_deref() {
                Some("") => Err(HandlerError::new("name must not be empty")),
                Some(name) => Ok(format!("hello {name}")),
                None => Ok(String::from("hello")),
            }
        })
        .expect("greet registers")
        .register::<Confirm, _, _, _>(|_, _| async {
            Ok::<_, HandlerError>(Confirmation { confirmed: false })
        })
        .expect("confirm registers")
        // Declared last: the methods above were held until now
        .declare::<DemoWindow>()
        .build()
        .expect("registry builds")
}

/// Poll `condition` every 10ms for up to two seconds.
pub async fn eventually<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
