//! Contract consumed from the mock-server process hosting the CLI.
//!
//! The host owns every value reachable from here. The controller reads current
//! state on demand, requests writes through [`Settings::set`], and observes
//! changes through the `on_change_*` registrations.

mod memory;
mod types;

pub use memory::{HostChannel, InMemoryCore, InMemoryCoreBuilder};
pub use types::{
    Alert, AlertError, PlainMock, PlainRoute, PlainRouteVariant, SettingDescriptor, SettingKind,
};

use serde_json::{Map, Value};

/// Changed option names mapped to their new values.
pub type SettingsChange = Map<String, Value>;

/// Callback registered with one of the host change channels.
pub type Listener<T> = Box<dyn Fn(T) + Send + Sync + 'static>;

pub trait Settings: Send + Sync {
    fn get(&self, name: &str) -> Option<Value>;
    fn set(&self, name: &str, value: Value);

    fn get_bool(&self, name: &str) -> bool {
        self.get(name).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    fn get_str(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|v| v.as_str().map(str::to_string))
    }

    fn get_u64(&self, name: &str) -> u64 {
        self.get(name).and_then(|v| v.as_u64()).unwrap_or(0)
    }
}

/// Legacy-mode registry of behaviors.
pub trait Behaviors: Send + Sync {
    fn ids(&self) -> Vec<String>;
    fn current_id(&self) -> Option<String>;

    fn count(&self) -> usize {
        self.ids().len()
    }
}

pub trait Mocks: Send + Sync {
    fn ids(&self) -> Vec<String>;
    fn current(&self) -> Option<String>;
    fn plain_mocks(&self) -> Vec<PlainMock>;
    fn plain_routes(&self) -> Vec<PlainRoute>;
    fn plain_routes_variants(&self) -> Vec<PlainRouteVariant>;
    /// Route variants the operator selected on top of the current mock.
    fn custom_routes_variants(&self) -> Vec<String>;
    fn use_route_variant(&self, variant_id: &str);
    fn restore_routes_variants(&self);
}

pub trait Fixtures: Send + Sync {
    fn count(&self) -> usize;
}

/// Live state of the hosting mock server.
pub trait Core: Send + Sync {
    fn settings(&self) -> &dyn Settings;
    fn behaviors(&self) -> &dyn Behaviors;
    fn mocks(&self) -> &dyn Mocks;
    fn fixtures(&self) -> &dyn Fixtures;
    fn alerts(&self) -> Vec<Alert>;

    fn add_setting(&self, descriptor: SettingDescriptor);
    fn restart_server(&self);

    fn on_change_settings(&self, listener: Listener<SettingsChange>) -> Subscription;
    fn on_change_alerts(&self, listener: Listener<()>) -> Subscription;
    fn on_change_mocks(&self, listener: Listener<()>) -> Subscription;
}

/// Handle to a registered listener.
///
/// [`Subscription::release`] removes the listener. A handle dropped without
/// being released removes it as well.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(unsubscribe: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription with nothing to undo.
    pub fn detached() -> Self {
        Self { unsubscribe: None }
    }

    pub fn release(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
