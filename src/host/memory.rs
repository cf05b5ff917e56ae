use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::{Map, Value};

use super::types::{Alert, PlainMock, PlainRoute, PlainRouteVariant, SettingDescriptor};
use super::{Behaviors, Core, Fixtures, Listener, Mocks, Settings, SettingsChange, Subscription};

type SharedListener<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

struct Channel<T> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, SharedListener<T>)>>,
    removed: AtomicUsize,
}

impl<T: Clone + 'static> Channel<T> {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
            removed: AtomicUsize::new(0),
        })
    }

    fn subscribe(self: &Arc<Self>, listener: Listener<T>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.listeners.lock() {
            guard.push((id, Arc::from(listener)));
        }
        let channel: Weak<Self> = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(channel) = channel.upgrade() {
                channel.remove(id);
            }
        })
    }

    fn remove(&self, id: u64) {
        if let Ok(mut guard) = self.listeners.lock() {
            let before = guard.len();
            guard.retain(|(listener_id, _)| *listener_id != id);
            if guard.len() < before {
                self.removed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    // Listeners run outside the lock so they may subscribe or release freely.
    fn emit(&self, payload: T) {
        let listeners: Vec<SharedListener<T>> = match self.listeners.lock() {
            Ok(guard) => guard.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(payload.clone());
        }
    }

    fn len(&self) -> usize {
        self.listeners.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[derive(Default)]
struct State {
    settings: Map<String, Value>,
    behaviors: Vec<String>,
    mocks: Vec<PlainMock>,
    routes: Vec<PlainRoute>,
    variants: Vec<PlainRouteVariant>,
    custom_variants: Vec<String>,
    fixtures: usize,
    alerts: Vec<Alert>,
}

#[derive(Default)]
struct CallLog {
    writes: Vec<(String, Value)>,
    descriptors: Vec<SettingDescriptor>,
    used_variants: Vec<String>,
    restores: usize,
    restarts: usize,
}

struct Inner {
    state: Mutex<State>,
    calls: Mutex<CallLog>,
    settings_channel: Arc<Channel<SettingsChange>>,
    alerts_channel: Arc<Channel<()>>,
    mocks_channel: Arc<Channel<()>>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn calls(&self) -> MutexGuard<'_, CallLog> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct SettingsView(Arc<Inner>);
struct BehaviorsView(Arc<Inner>);
struct MocksView(Arc<Inner>);
struct FixturesView(Arc<Inner>);

impl Settings for SettingsView {
    fn get(&self, name: &str) -> Option<Value> {
        self.0.state().settings.get(name).cloned()
    }

    fn set(&self, name: &str, value: Value) {
        let previous = self
            .0
            .state()
            .settings
            .insert(name.to_string(), value.clone());
        self.0.calls().writes.push((name.to_string(), value.clone()));
        if previous.as_ref() != Some(&value) {
            let mut change = SettingsChange::new();
            change.insert(name.to_string(), value);
            self.0.settings_channel.emit(change);
        }
    }
}

impl Behaviors for BehaviorsView {
    fn ids(&self) -> Vec<String> {
        self.0.state().behaviors.clone()
    }

    fn current_id(&self) -> Option<String> {
        let state = self.0.state();
        selected_or_first(&state.settings, "behavior", state.behaviors.iter())
    }
}

impl Mocks for MocksView {
    fn ids(&self) -> Vec<String> {
        self.0.state().mocks.iter().map(|mock| mock.id.clone()).collect()
    }

    fn current(&self) -> Option<String> {
        let state = self.0.state();
        selected_or_first(&state.settings, "mock", state.mocks.iter().map(|m| &m.id))
    }

    fn plain_mocks(&self) -> Vec<PlainMock> {
        self.0.state().mocks.clone()
    }

    fn plain_routes(&self) -> Vec<PlainRoute> {
        self.0.state().routes.clone()
    }

    fn plain_routes_variants(&self) -> Vec<PlainRouteVariant> {
        self.0.state().variants.clone()
    }

    fn custom_routes_variants(&self) -> Vec<String> {
        self.0.state().custom_variants.clone()
    }

    fn use_route_variant(&self, variant_id: &str) {
        self.0.calls().used_variants.push(variant_id.to_string());
        let changed = {
            let mut state = self.0.state();
            let route_id = state
                .variants
                .iter()
                .find(|variant| variant.id == variant_id)
                .map(|variant| variant.route_id.clone());
            match route_id {
                Some(route_id) => {
                    let routes_of: Vec<String> = state
                        .variants
                        .iter()
                        .filter(|variant| variant.route_id == route_id)
                        .map(|variant| variant.id.clone())
                        .collect();
                    state.custom_variants.retain(|id| !routes_of.contains(id));
                    state.custom_variants.push(variant_id.to_string());
                    true
                }
                None => false,
            }
        };
        if changed {
            self.0.mocks_channel.emit(());
        }
    }

    fn restore_routes_variants(&self) {
        self.0.calls().restores += 1;
        self.0.state().custom_variants.clear();
        self.0.mocks_channel.emit(());
    }
}

impl Fixtures for FixturesView {
    fn count(&self) -> usize {
        self.0.state().fixtures
    }
}

fn selected_or_first<'a>(
    settings: &Map<String, Value>,
    key: &str,
    ids: impl Iterator<Item = &'a String>,
) -> Option<String> {
    let wanted = settings.get(key).and_then(|value| value.as_str());
    let mut first = None;
    for id in ids {
        if Some(id.as_str()) == wanted {
            return Some(id.clone());
        }
        if first.is_none() {
            first = Some(id.clone());
        }
    }
    first
}

/// Which host change channel a query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostChannel {
    Settings,
    Alerts,
    Mocks,
}

/// Self-contained host used by demos and tests.
///
/// Writes through [`Settings::set`] notify settings listeners when the value
/// actually changes; selecting or restoring route variants notifies mocks
/// listeners. Every write and action is recorded for later inspection.
pub struct InMemoryCore {
    inner: Arc<Inner>,
    settings: SettingsView,
    behaviors: BehaviorsView,
    mocks: MocksView,
    fixtures: FixturesView,
}

impl InMemoryCore {
    pub fn builder() -> InMemoryCoreBuilder {
        InMemoryCoreBuilder::default()
    }

    fn from_state(state: State) -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(state),
            calls: Mutex::new(CallLog::default()),
            settings_channel: Channel::new(),
            alerts_channel: Channel::new(),
            mocks_channel: Channel::new(),
        });
        Self {
            settings: SettingsView(Arc::clone(&inner)),
            behaviors: BehaviorsView(Arc::clone(&inner)),
            mocks: MocksView(Arc::clone(&inner)),
            fixtures: FixturesView(Arc::clone(&inner)),
            inner,
        }
    }

    /// Overwrite a setting without notifying anyone.
    pub fn set_quietly(&self, name: &str, value: Value) {
        self.inner.state().settings.insert(name.to_string(), value);
    }

    /// Deliver a settings change to listeners as if another host component
    /// had applied it. The values are stored first.
    pub fn emit_settings(&self, change: SettingsChange) {
        {
            let mut state = self.inner.state();
            for (key, value) in change.iter() {
                state.settings.insert(key.clone(), value.clone());
            }
        }
        self.inner.settings_channel.emit(change);
    }

    pub fn push_alert(&self, alert: Alert) {
        self.inner.state().alerts.push(alert);
        self.inner.alerts_channel.emit(());
    }

    pub fn clear_alerts(&self) {
        self.inner.state().alerts.clear();
        self.inner.alerts_channel.emit(());
    }

    /// Replace the mocks registry, as a file-watch reload would.
    pub fn reload_mocks(&self, mocks: Vec<PlainMock>, variants: Vec<PlainRouteVariant>) {
        {
            let mut state = self.inner.state();
            state.mocks = mocks;
            state.variants = variants;
            state.custom_variants.clear();
        }
        self.inner.mocks_channel.emit(());
    }

    pub fn set_behaviors(&self, ids: Vec<String>) {
        self.inner.state().behaviors = ids;
    }

    pub fn writes(&self) -> Vec<(String, Value)> {
        self.inner.calls().writes.clone()
    }

    /// Values written to one setting, in order.
    pub fn writes_to(&self, name: &str) -> Vec<Value> {
        self.inner
            .calls()
            .writes
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .collect()
    }

    pub fn registered_settings(&self) -> Vec<SettingDescriptor> {
        self.inner.calls().descriptors.clone()
    }

    pub fn used_variants(&self) -> Vec<String> {
        self.inner.calls().used_variants.clone()
    }

    pub fn restore_count(&self) -> usize {
        self.inner.calls().restores
    }

    pub fn restart_count(&self) -> usize {
        self.inner.calls().restarts
    }

    pub fn listener_count(&self, channel: HostChannel) -> usize {
        match channel {
            HostChannel::Settings => self.inner.settings_channel.len(),
            HostChannel::Alerts => self.inner.alerts_channel.len(),
            HostChannel::Mocks => self.inner.mocks_channel.len(),
        }
    }

    pub fn removed_listeners(&self, channel: HostChannel) -> usize {
        let removed = match channel {
            HostChannel::Settings => &self.inner.settings_channel.removed,
            HostChannel::Alerts => &self.inner.alerts_channel.removed,
            HostChannel::Mocks => &self.inner.mocks_channel.removed,
        };
        removed.load(Ordering::SeqCst)
    }
}

impl Core for InMemoryCore {
    fn settings(&self) -> &dyn Settings {
        &self.settings
    }

    fn behaviors(&self) -> &dyn Behaviors {
        &self.behaviors
    }

    fn mocks(&self) -> &dyn Mocks {
        &self.mocks
    }

    fn fixtures(&self) -> &dyn Fixtures {
        &self.fixtures
    }

    fn alerts(&self) -> Vec<Alert> {
        self.inner.state().alerts.clone()
    }

    fn add_setting(&self, descriptor: SettingDescriptor) {
        {
            let mut state = self.inner.state();
            if !state.settings.contains_key(&descriptor.name) {
                state
                    .settings
                    .insert(descriptor.name.clone(), descriptor.default.clone());
            }
        }
        self.inner.calls().descriptors.push(descriptor);
    }

    fn restart_server(&self) {
        self.inner.calls().restarts += 1;
    }

    fn on_change_settings(&self, listener: Listener<SettingsChange>) -> Subscription {
        self.inner.settings_channel.subscribe(listener)
    }

    fn on_change_alerts(&self, listener: Listener<()>) -> Subscription {
        self.inner.alerts_channel.subscribe(listener)
    }

    fn on_change_mocks(&self, listener: Listener<()>) -> Subscription {
        self.inner.mocks_channel.subscribe(listener)
    }
}

/// Builder seeding an [`InMemoryCore`].
#[derive(Default)]
pub struct InMemoryCoreBuilder {
    state: State,
}

impl InMemoryCoreBuilder {
    pub fn setting(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.state.settings.insert(name.to_string(), value.into());
        self
    }

    pub fn behaviors<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.behaviors = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn mock(mut self, id: &str, routes_variants: &[&str]) -> Self {
        self.state.mocks.push(PlainMock {
            id: id.to_string(),
            from: None,
            routes_variants: routes_variants.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Register a route together with its variants, identified as
    /// `{route}:{variant}`.
    pub fn route(mut self, route_id: &str, url: &str, variants: &[&str]) -> Self {
        let variant_ids: Vec<String> = variants
            .iter()
            .map(|variant| format!("{route_id}:{variant}"))
            .collect();
        for id in &variant_ids {
            self.state.variants.push(PlainRouteVariant {
                id: id.clone(),
                route_id: route_id.to_string(),
                handler: Some("default".to_string()),
                delay: None,
            });
        }
        self.state.routes.push(PlainRoute {
            id: route_id.to_string(),
            url: url.to_string(),
            method: "GET".to_string(),
            delay: None,
            variants: variant_ids,
        });
        self
    }

    pub fn custom_variant(mut self, id: &str) -> Self {
        self.state.custom_variants.push(id.to_string());
        self
    }

    pub fn fixtures(mut self, count: usize) -> Self {
        self.state.fixtures = count;
        self
    }

    pub fn alert(mut self, alert: Alert) -> Self {
        self.state.alerts.push(alert);
        self
    }

    pub fn build(self) -> InMemoryCore {
        InMemoryCore::from_state(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SettingKind;
    use serde_json::json;
    use std::sync::mpsc;

    fn core() -> InMemoryCore {
        InMemoryCore::builder()
            .setting("log", "info")
            .mock("base", &["users:success"])
            .mock("user-2", &["users:error"])
            .route("users", "/api/users", &["success", "error"])
            .build()
    }

    #[test]
    fn set_notifies_only_on_change() {
        let core = core();
        let (tx, rx) = mpsc::channel();
        let _sub = core.on_change_settings(Box::new(move |change| {
            let _ = tx.send(change);
        }));
        core.settings().set("log", json!("info"));
        core.settings().set("log", json!("silent"));
        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["log"], json!("silent"));
        assert_eq!(core.writes().len(), 2);
    }

    #[test]
    fn released_subscription_stops_notifications() {
        let core = core();
        let (tx, rx) = mpsc::channel();
        let sub = core.on_change_alerts(Box::new(move |_| {
            let _ = tx.send(());
        }));
        sub.release();
        core.push_alert(Alert::warning("foo"));
        assert!(rx.try_recv().is_err());
        assert_eq!(core.removed_listeners(HostChannel::Alerts), 1);
        assert_eq!(core.listener_count(HostChannel::Alerts), 0);
    }

    #[test]
    fn current_mock_follows_setting() {
        let core = core();
        assert_eq!(core.mocks().current().as_deref(), Some("base"));
        core.set_quietly("mock", json!("user-2"));
        assert_eq!(core.mocks().current().as_deref(), Some("user-2"));
        core.set_quietly("mock", json!("missing"));
        assert_eq!(core.mocks().current().as_deref(), Some("base"));
    }

    #[test]
    fn using_variant_replaces_same_route_override() {
        let core = core();
        core.mocks().use_route_variant("users:error");
        core.mocks().use_route_variant("users:success");
        assert_eq!(core.mocks().custom_routes_variants(), vec!["users:success"]);
        core.mocks().restore_routes_variants();
        assert!(core.mocks().custom_routes_variants().is_empty());
        assert_eq!(core.restore_count(), 1);
    }

    #[test]
    fn add_setting_seeds_default_once() {
        let core = InMemoryCore::builder().setting("cli", false).build();
        core.add_setting(SettingDescriptor {
            name: "cli".into(),
            kind: SettingKind::Boolean,
            description: String::new(),
            default: json!(true),
        });
        assert_eq!(core.settings().get("cli"), Some(json!(false)));
        assert_eq!(core.registered_settings().len(), 1);
    }
}
