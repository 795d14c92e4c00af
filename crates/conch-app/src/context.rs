//! Application context
//!
//! [`AppContext`] owns every piece of session state: the API client, one
//! store per entity type, the router, the selected translator, the current
//! route and transient interaction state. It is built once at startup and
//! shared by `Arc`.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use conch_api::{ApiClient, ReqwestTransport};
use conch_core::prelude::*;
use conch_core::{EntityKind, Rack};
use conch_i18n::{CatalogSet, EnvLocaleDetector, FixedLocale, LocaleDetector, Translator};
use futures_util::future::join_all;
use tokio::task::JoinHandle;

use crate::config::Settings;
use crate::router::{rack_device_path, RouteState, Router};
use crate::store::Stores;
use crate::view::{FeedbackStatus, Interaction, ViewComposer, ViewDescription};

/// Number of visited paths kept in [`AppContext::history`]
pub const HISTORY_LIMIT: usize = 50;

/// Where the user is and the most recent paths they visited.
#[derive(Debug, Clone)]
struct NavState {
    current: RouteState,
    history: VecDeque<String>,
}

impl NavState {
    fn record(&mut self, path: &str) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(path.to_string());
    }
}

pub struct AppContext {
    api: Arc<ApiClient>,
    stores: Stores,
    router: Router,
    translator: Translator,
    nav: Mutex<NavState>,
    interaction: Mutex<Interaction>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("base_url", &self.api.base_url().as_str())
            .field("locale", &self.translator.locale())
            .field("route", &self.current_route().route)
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl AppContext {
    /// Create a context on the root route. No loads are issued until the
    /// first navigation.
    pub fn new(api: Arc<ApiClient>, translator: Translator) -> Self {
        let router = Router::new();
        let current = router.resolve("/");
        Self {
            stores: Stores::over_api(&api),
            api,
            router,
            translator,
            nav: Mutex::new(NavState {
                current,
                history: VecDeque::with_capacity(HISTORY_LIMIT),
            }),
            interaction: Mutex::new(Interaction::default()),
        }
    }

    /// Build a context talking to the configured API over HTTP.
    pub fn connect(settings: &Settings) -> Result<Self> {
        let base_url = settings.api.base_url()?;
        let transport = ReqwestTransport::new(settings.api.timeout())
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;
        let api = ApiClient::new(Arc::new(transport), base_url)
            .with_credentials(settings.api.with_credentials);

        let catalogs = CatalogSet::builtin()?;
        let detector: Box<dyn LocaleDetector> = match settings.ui.locale_override() {
            Some(locale) => Box::new(FixedLocale::new(locale)),
            None => Box::new(EnvLocaleDetector),
        };
        let translator = Translator::detect(&catalogs, detector.as_ref())?;

        Ok(Self::new(Arc::new(api), translator))
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn current_route(&self) -> RouteState {
        lock(&self.nav).current.clone()
    }

    /// The last [`HISTORY_LIMIT`] paths navigated to, oldest first.
    pub fn history(&self) -> Vec<String> {
        lock(&self.nav).history.iter().cloned().collect()
    }

    pub fn interaction(&self) -> Interaction {
        lock(&self.interaction).clone()
    }

    /// Resolve `path`, make it the current route and run the loads it needs.
    ///
    /// Loads already satisfied by cached data are skipped. Load failures are
    /// recorded by the stores and surface in the composed view; navigation
    /// itself never fails.
    pub async fn navigate(&self, path: &str) -> RouteState {
        let state = self.router.resolve(path);
        info!("Navigate {} -> {}", path, state.route.name().as_str());

        {
            let mut nav = lock(&self.nav);
            nav.current = state.clone();
            nav.record(path);
        }
        {
            let mut interaction = lock(&self.interaction);
            interaction.notice = None;
            if interaction.feedback == FeedbackStatus::Submitted {
                interaction.feedback = FeedbackStatus::Idle;
            }
        }

        let mut pending = Vec::new();
        for load in &state.loads {
            // May set `current` through `select`
            if !self.stores.satisfy_from_cache(load) {
                pending.push(load);
            }
        }
        let results = join_all(pending.iter().map(|load| self.stores.load(load))).await;
        for (load, result) in pending.iter().zip(results) {
            if let Err(e) = result {
                debug!("Load {:?} for {} failed: {}", load, path, e);
            }
        }

        state
    }

    /// Follow a link produced by a view. In-app links (absolute paths) are
    /// navigated on a spawned task; anything else is left to the caller.
    pub fn activate_link(self: &Arc<Self>, href: &str) -> Option<JoinHandle<RouteState>> {
        if !is_in_app_link(href) {
            debug!("Not an in-app link: {}", href);
            return None;
        }
        let ctx = Arc::clone(self);
        let href = href.to_string();
        Some(tokio::spawn(async move { ctx.navigate(&href).await }))
    }

    /// Look up a device's rack and navigate to it with the slot highlighted.
    ///
    /// Runs on a spawned task. While it runs the device's "find in rack"
    /// action is disabled; a second request for the same device returns
    /// `None`. On failure the action re-enables and a banner is set.
    pub fn find_device_in_rack(
        self: &Arc<Self>,
        device_id: &str,
    ) -> Option<JoinHandle<Result<RouteState>>> {
        if !lock(&self.interaction)
            .pending_lookups
            .insert(device_id.to_string())
        {
            debug!("Rack lookup for {} already running", device_id);
            return None;
        }

        let ctx = Arc::clone(self);
        let device_id = device_id.to_string();
        Some(tokio::spawn(async move {
            let result = ctx.api.device_location(&device_id).await;
            lock(&ctx.interaction).pending_lookups.remove(&device_id);

            match result {
                Ok(location) => {
                    let path = rack_device_path(&location.rack.id, &device_id);
                    Ok(ctx.navigate(&path).await)
                }
                Err(e) => {
                    warn!("Rack lookup for {} failed: {}", device_id, e);
                    let notice = ctx
                        .translator
                        .t_args("Location Lookup Failed", &[("device", &device_id)]);
                    lock(&ctx.interaction).notice = Some(notice);
                    Err(e.into_error(EntityKind::Device, Some(&device_id)))
                }
            }
        }))
    }

    /// Assign devices to rack slots, then reload the rack.
    ///
    /// Devices moved away from other racks are not reloaded here; their
    /// cached copies refresh on their next load.
    pub async fn assign_devices(
        &self,
        rack_id: &str,
        assignments: &BTreeMap<String, u32>,
    ) -> Result<Rack> {
        if let Err(e) = self.api.assign_devices(rack_id, assignments).await {
            warn!("Assigning devices to rack {} failed: {}", rack_id, e);
            let notice = self
                .translator
                .t_args("Assign Failed", &[("rack", rack_id)]);
            lock(&self.interaction).notice = Some(notice);
            return Err(e.into_error(EntityKind::Rack, Some(rack_id)));
        }

        info!("Assigned {} devices to rack {}", assignments.len(), rack_id);
        self.stores.racks.load_one(rack_id).await
    }

    /// Send free-text feedback.
    ///
    /// Blank text is not sent. While the request runs the submit action is
    /// disabled; on success the form shows its confirmation until the next
    /// navigation, on failure a banner is set and the form re-enables.
    pub async fn send_feedback(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring empty feedback");
            return Ok(());
        }
        {
            let mut interaction = lock(&self.interaction);
            if interaction.feedback == FeedbackStatus::Sending {
                debug!("Feedback already being sent");
                return Ok(());
            }
            interaction.feedback = FeedbackStatus::Sending;
        }

        let result = self.api.send_feedback(text).await;
        let mut interaction = lock(&self.interaction);
        match result {
            Ok(()) => {
                info!("Feedback submitted");
                interaction.feedback = FeedbackStatus::Submitted;
                Ok(())
            }
            Err(e) => {
                warn!("Sending feedback failed: {}", e);
                interaction.feedback = FeedbackStatus::Idle;
                interaction.notice = Some(
                    self.translator
                        .t_args("Feedback Failed", &[("message", &e.to_string())]),
                );
                Err(Error::load_failed("feedback", e.to_string()))
            }
        }
    }

    /// Compose the view for the current route.
    pub fn compose(&self) -> ViewDescription {
        self.compose_at(Utc::now())
    }

    /// Compose with an explicit clock, for reproducible relative times.
    pub fn compose_at(&self, now: DateTime<Utc>) -> ViewDescription {
        let state = self.current_route();
        let interaction = self.interaction();
        ViewComposer::new(&self.translator, now).compose(&state, &self.stores, &interaction)
    }
}

fn is_in_app_link(href: &str) -> bool {
    href.starts_with('/') && !href.starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Route;
    use crate::view::ActionKind;
    use conch_api::test_utils::FakeTransport;
    use conch_api::FetchError;
    use serde_json::json;
    use url::Url;

    fn context(fake: &Arc<FakeTransport>) -> Arc<AppContext> {
        let api = Arc::new(ApiClient::new(
            fake.clone(),
            Url::parse("http://inventory.test/").unwrap(),
        ));
        let translator =
            Translator::new(&CatalogSet::builtin().unwrap(), &["en".to_string()]).unwrap();
        Arc::new(AppContext::new(api, translator))
    }

    fn racks() -> serde_json::Value {
        json!({ "data": { "racks": [
            { "id": "r1", "name": "A01", "slots": { "1": { "id": "HX-1" } } },
            { "id": "r2", "name": "A02" }
        ] } })
    }

    #[test]
    fn test_initial_route_is_root() {
        let ctx = context(&FakeTransport::new());
        assert_eq!(ctx.current_route().route, Route::RackList);
        assert!(ctx.history().is_empty());
    }

    #[tokio::test]
    async fn test_navigate_loads_list_and_selects_from_cache() {
        let fake = FakeTransport::new();
        fake.respond("/rack", racks());
        let ctx = context(&fake);

        ctx.navigate("/rack").await;
        assert_eq!(fake.request_count("/rack"), 1);

        let state = ctx.navigate("/rack/r2").await;
        assert_eq!(state.route.id(), Some("r2"));
        // Cached list: no list reload and no detail fetch
        assert_eq!(fake.request_count("/rack"), 1);
        assert_eq!(fake.request_count("/rack/r2"), 0);
        assert_eq!(ctx.stores().racks.current_id().as_deref(), Some("r2"));
        assert_eq!(ctx.history(), vec!["/rack", "/rack/r2"]);
    }

    #[tokio::test]
    async fn test_navigate_direct_to_detail_fetches_both() {
        let fake = FakeTransport::new();
        fake.respond("/device", json!({ "data": { "devices": [] } }));
        fake.respond("/device/HX-9", json!({ "id": "HX-9" }));
        let ctx = context(&fake);

        ctx.navigate("/device/HX-9").await;
        assert_eq!(fake.request_count("/device"), 1);
        assert_eq!(fake.request_count("/device/HX-9"), 1);
        assert_eq!(ctx.stores().devices.current_id().as_deref(), Some("HX-9"));
    }

    #[tokio::test]
    async fn test_navigate_unknown_path_is_not_found() {
        let fake = FakeTransport::new();
        let ctx = context(&fake);

        let state = ctx.navigate("/unknown").await;
        assert!(matches!(state.route, Route::NotFound { .. }));
        assert!(fake.requests().is_empty());
        assert_eq!(ctx.compose().title, "Page not found");
    }

    #[tokio::test]
    async fn test_activate_link_only_follows_in_app_links() {
        let fake = FakeTransport::new();
        fake.respond("/relay", json!({ "data": { "relays": [] } }));
        let ctx = context(&fake);

        assert!(ctx.activate_link("https://example.com/").is_none());
        assert!(ctx.activate_link("//example.com/relay").is_none());

        let state = ctx.activate_link("/relay").unwrap().await.unwrap();
        assert_eq!(state.route, Route::RelayList);
        assert_eq!(ctx.current_route().route, Route::RelayList);
    }

    #[tokio::test]
    async fn test_find_device_in_rack_navigates_with_highlight() {
        let fake = FakeTransport::new();
        fake.respond("/rack", racks());
        fake.respond(
            "/device/HX-1/location",
            json!({ "rack": { "id": "r1", "name": "A01" }, "slot": 1 }),
        );
        let ctx = context(&fake);

        let state = ctx
            .find_device_in_rack("HX-1")
            .unwrap()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            state.route,
            Route::RackDetail {
                id: "r1".into(),
                device: Some("HX-1".into())
            }
        );
        assert!(ctx.interaction().pending_lookups.is_empty());
        assert_eq!(ctx.history(), vec!["/rack/r1?device=HX-1"]);
    }

    #[tokio::test]
    async fn test_failed_lookup_reenables_action_and_sets_banner() {
        let fake = FakeTransport::new();
        fake.respond("/device/HX-1", json!({ "id": "HX-1", "health": "FAIL" }));
        fake.respond("/device", json!({ "data": { "devices": [] } }));
        fake.fail("/device/HX-1/location", FetchError::Timeout);
        let gate = fake.hold("/device/HX-1/location");
        let ctx = context(&fake);
        ctx.navigate("/device/HX-1").await;

        let handle = ctx.find_device_in_rack("HX-1").unwrap();
        tokio::task::yield_now().await;

        // Disabled while the lookup runs; a second click is ignored
        assert!(ctx.find_device_in_rack("HX-1").is_none());
        let find_enabled = |view: &ViewDescription| {
            view.actions()
                .into_iter()
                .find(|a| matches!(a.kind, ActionKind::FindDeviceInRack { .. }))
                .map(|a| a.enabled)
        };
        assert_eq!(find_enabled(&ctx.compose()), Some(false));

        gate.open();
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(Error::LoadFailed { .. })));

        let view = ctx.compose();
        assert_eq!(find_enabled(&view), Some(true));
        assert_eq!(
            view.banner.as_deref(),
            Some("Could not find a rack for device HX-1")
        );
        assert!(matches!(ctx.current_route().route, Route::DeviceDetail { .. }));
    }

    #[tokio::test]
    async fn test_navigation_clears_banner() {
        let fake = FakeTransport::new();
        fake.respond("/rack", racks());
        let ctx = context(&fake);
        lock(&ctx.interaction).notice = Some("old".into());

        ctx.navigate("/rack").await;
        assert!(ctx.compose().banner.is_none());
    }

    #[tokio::test]
    async fn test_assign_devices_reloads_rack() {
        let fake = FakeTransport::new();
        fake.respond("/rack/r2/layout", serde_json::Value::Null);
        fake.respond(
            "/rack/r2",
            json!({ "id": "r2", "name": "A02", "slots": { "4": { "id": "HX-1" } } }),
        );
        let ctx = context(&fake);

        let mut layout = BTreeMap::new();
        layout.insert("HX-1".to_string(), 4);
        let rack = ctx.assign_devices("r2", &layout).await.unwrap();

        assert_eq!(rack.slot_of("HX-1"), Some(4));
        assert_eq!(fake.request_count("/rack/r2"), 1);
        assert_eq!(ctx.stores().racks.current_id().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_failed_assignment_sets_banner() {
        let fake = FakeTransport::new();
        fake.fail(
            "/rack/r2/layout",
            FetchError::Status {
                status: 409,
                message: "slot taken".into(),
            },
        );
        let ctx = context(&fake);

        let result = ctx.assign_devices("r2", &BTreeMap::new()).await;
        assert!(matches!(result, Err(Error::LoadFailed { .. })));
        assert_eq!(
            ctx.interaction().notice.as_deref(),
            Some("Could not assign devices to rack r2")
        );
        assert_eq!(fake.request_count("/rack/r2"), 0);
    }

    #[tokio::test]
    async fn test_send_feedback_shows_confirmation_until_navigation() {
        let fake = FakeTransport::new();
        fake.respond("/feedback", serde_json::Value::Null);
        fake.respond("/rack", racks());
        let ctx = context(&fake);

        ctx.send_feedback("  rack A02 is mislabeled \n").await.unwrap();
        let requests = fake.requests();
        assert_eq!(
            requests[0].body,
            Some(json!({ "message": "rack A02 is mislabeled" }))
        );
        assert_eq!(ctx.interaction().feedback, FeedbackStatus::Submitted);
        assert!(ctx.compose().feedback.confirmation.is_some());

        ctx.navigate("/rack").await;
        assert_eq!(ctx.interaction().feedback, FeedbackStatus::Idle);
    }

    #[tokio::test]
    async fn test_failed_feedback_sets_banner_and_reenables_form() {
        let fake = FakeTransport::new();
        fake.fail("/feedback", FetchError::Network("connection refused".into()));
        let ctx = context(&fake);

        let result = ctx.send_feedback("slot 3 is empty").await;
        assert!(matches!(result, Err(Error::LoadFailed { .. })));

        let view = ctx.compose();
        assert!(view.feedback.submit.enabled);
        assert!(view.feedback.confirmation.is_none());
        assert!(view
            .banner
            .as_deref()
            .unwrap()
            .starts_with("Could not send feedback"));
    }

    #[tokio::test]
    async fn test_blank_feedback_is_not_sent() {
        let fake = FakeTransport::new();
        let ctx = context(&fake);

        ctx.send_feedback("   ").await.unwrap();
        assert!(fake.requests().is_empty());
        assert_eq!(ctx.interaction().feedback, FeedbackStatus::Idle);
    }

    #[tokio::test]
    async fn test_history_keeps_most_recent_paths() {
        let ctx = context(&FakeTransport::new());
        for n in 0..HISTORY_LIMIT + 5 {
            ctx.navigate(&format!("/login?n={}", n)).await;
        }

        let history = ctx.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0], "/login?n=5");
        assert_eq!(
            history.last().map(String::as_str),
            Some(format!("/login?n={}", HISTORY_LIMIT + 4).as_str())
        );
    }

    #[test]
    fn test_in_app_links() {
        assert!(is_in_app_link("/rack/1"));
        assert!(!is_in_app_link("//cdn.example.com/x"));
        assert!(!is_in_app_link("mailto:ops@example.com"));
    }
}
