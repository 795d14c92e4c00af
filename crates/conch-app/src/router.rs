//! Path routing
//!
//! A declarative table of path patterns plus a segment matcher. Resolving a
//! path yields a [`RouteState`]: the matched [`Route`], the store loads it
//! needs, its navigation index and its title key. The router never fetches
//! or renders.

use std::collections::BTreeMap;

use conch_core::prelude::*;
use conch_core::EntityKind;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;

/// Path the console starts on and the target of the `/` redirect.
pub const ROOT_PATH: &str = "/rack";

/// Characters escaped when an id is written into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Names of the routes in the table, in their kebab-case form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteName {
    RackList,
    RackDetail,
    ProblemList,
    ProblemDetail,
    DeviceList,
    DeviceDetail,
    RelayList,
    RelayDetail,
    Login,
    NotFound,
}

impl RouteName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteName::RackList => "rack-list",
            RouteName::RackDetail => "rack-detail",
            RouteName::ProblemList => "problem-list",
            RouteName::ProblemDetail => "problem-detail",
            RouteName::DeviceList => "device-list",
            RouteName::DeviceDetail => "device-detail",
            RouteName::RelayList => "relay-list",
            RouteName::RelayDetail => "relay-detail",
            RouteName::Login => "login",
            RouteName::NotFound => "not-found",
        }
    }
}

/// Entry of the top navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavEntry {
    pub index: usize,
    pub label_key: &'static str,
    pub href: &'static str,
}

pub const NAV_ENTRIES: [NavEntry; 4] = [
    NavEntry {
        index: 0,
        label_key: "Racks",
        href: "/rack",
    },
    NavEntry {
        index: 1,
        label_key: "Problems",
        href: "/problem",
    },
    NavEntry {
        index: 2,
        label_key: "Devices",
        href: "/device",
    },
    NavEntry {
        index: 3,
        label_key: "Relays",
        href: "/relay",
    },
];

/// One row of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDef {
    pub name: RouteName,
    pub pattern: &'static str,
    pub nav_index: Option<usize>,
    pub title_key: &'static str,
}

static ROUTES: [RouteDef; 9] = [
    RouteDef {
        name: RouteName::RackList,
        pattern: "/rack",
        nav_index: Some(0),
        title_key: "Racks",
    },
    RouteDef {
        name: RouteName::RackDetail,
        pattern: "/rack/:id",
        nav_index: Some(0),
        title_key: "Racks",
    },
    RouteDef {
        name: RouteName::ProblemList,
        pattern: "/problem",
        nav_index: Some(1),
        title_key: "Problems",
    },
    RouteDef {
        name: RouteName::ProblemDetail,
        pattern: "/problem/:id",
        nav_index: Some(1),
        title_key: "Problems",
    },
    RouteDef {
        name: RouteName::DeviceList,
        pattern: "/device",
        nav_index: Some(2),
        title_key: "Devices",
    },
    RouteDef {
        name: RouteName::DeviceDetail,
        pattern: "/device/:id",
        nav_index: Some(2),
        title_key: "Devices",
    },
    RouteDef {
        name: RouteName::RelayList,
        pattern: "/relay",
        nav_index: Some(3),
        title_key: "Relays",
    },
    RouteDef {
        name: RouteName::RelayDetail,
        pattern: "/relay/:id",
        nav_index: Some(3),
        title_key: "Relays",
    },
    RouteDef {
        name: RouteName::Login,
        pattern: "/login",
        nav_index: None,
        title_key: "Login",
    },
];

static NOT_FOUND: RouteDef = RouteDef {
    name: RouteName::NotFound,
    pattern: "",
    nav_index: None,
    title_key: "Page Not Found",
};

/// Path and query parameters captured while matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Params {
    pub path: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
}

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.path.get(name).map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// A resolved navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "kebab-case")]
pub enum Route {
    RackList,
    RackDetail {
        id: String,
        /// Device whose slot is highlighted (`?device=`)
        #[serde(skip_serializing_if = "Option::is_none")]
        device: Option<String>,
    },
    ProblemList,
    /// Problems of one device
    ProblemDetail { id: String },
    DeviceList,
    DeviceDetail { id: String },
    RelayList,
    RelayDetail { id: String },
    Login,
    NotFound { path: String },
}

impl Route {
    fn from_match(name: RouteName, params: &Params) -> Option<Self> {
        let id = || params.get("id").map(str::to_string);
        Some(match name {
            RouteName::RackList => Route::RackList,
            RouteName::RackDetail => Route::RackDetail {
                id: id()?,
                device: params.query("device").map(str::to_string),
            },
            RouteName::ProblemList => Route::ProblemList,
            RouteName::ProblemDetail => Route::ProblemDetail { id: id()? },
            RouteName::DeviceList => Route::DeviceList,
            RouteName::DeviceDetail => Route::DeviceDetail { id: id()? },
            RouteName::RelayList => Route::RelayList,
            RouteName::RelayDetail => Route::RelayDetail { id: id()? },
            RouteName::Login => Route::Login,
            RouteName::NotFound => return None,
        })
    }

    pub fn name(&self) -> RouteName {
        match self {
            Route::RackList => RouteName::RackList,
            Route::RackDetail { .. } => RouteName::RackDetail,
            Route::ProblemList => RouteName::ProblemList,
            Route::ProblemDetail { .. } => RouteName::ProblemDetail,
            Route::DeviceList => RouteName::DeviceList,
            Route::DeviceDetail { .. } => RouteName::DeviceDetail,
            Route::RelayList => RouteName::RelayList,
            Route::RelayDetail { .. } => RouteName::RelayDetail,
            Route::Login => RouteName::Login,
            Route::NotFound { .. } => RouteName::NotFound,
        }
    }

    fn def(&self) -> &'static RouteDef {
        let name = self.name();
        ROUTES
            .iter()
            .find(|def| def.name == name)
            .unwrap_or(&NOT_FOUND)
    }

    pub fn nav_index(&self) -> Option<usize> {
        self.def().nav_index
    }

    pub fn title_key(&self) -> &'static str {
        self.def().title_key
    }

    /// Detail id carried by the route.
    pub fn id(&self) -> Option<&str> {
        match self {
            Route::RackDetail { id, .. }
            | Route::ProblemDetail { id }
            | Route::DeviceDetail { id }
            | Route::RelayDetail { id } => Some(id),
            _ => None,
        }
    }

    /// Store whose list backs the list panel.
    pub fn list_kind(&self) -> Option<EntityKind> {
        match self {
            Route::RackList | Route::RackDetail { .. } => Some(EntityKind::Rack),
            Route::ProblemList | Route::ProblemDetail { .. } => Some(EntityKind::Problem),
            Route::DeviceList | Route::DeviceDetail { .. } => Some(EntityKind::Device),
            Route::RelayList | Route::RelayDetail { .. } => Some(EntityKind::Relay),
            Route::Login | Route::NotFound { .. } => None,
        }
    }

    /// Store whose `current` backs the detail panel.
    ///
    /// Problem detail shows a device, so it reads the device store.
    pub fn detail_kind(&self) -> Option<EntityKind> {
        match self {
            Route::RackDetail { .. } => Some(EntityKind::Rack),
            Route::ProblemDetail { .. } | Route::DeviceDetail { .. } => Some(EntityKind::Device),
            Route::RelayDetail { .. } => Some(EntityKind::Relay),
            _ => None,
        }
    }

    /// Store loads the route needs, list first.
    pub fn loads(&self) -> Vec<LoadRequest> {
        let mut loads = Vec::new();
        if let Some(kind) = self.list_kind() {
            loads.push(LoadRequest::All(kind));
        }
        if let (Some(kind), Some(id)) = (self.detail_kind(), self.id()) {
            loads.push(LoadRequest::One(kind, id.to_string()));
        }
        loads
    }
}

/// A store load triggered by a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadRequest {
    All(EntityKind),
    One(EntityKind, String),
}

/// Everything the composer needs from a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteState {
    pub route: Route,
    /// Path after redirects, without query
    pub path: String,
    pub params: Params,
    pub loads: Vec<LoadRequest>,
    pub nav_index: Option<usize>,
    pub title_key: &'static str,
}

impl RouteState {
    fn new(route: Route, path: String, params: Params) -> Self {
        Self {
            loads: route.loads(),
            nav_index: route.nav_index(),
            title_key: route.title_key(),
            route,
            path,
            params,
        }
    }
}

/// The route table and its matcher.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<RouteDef>,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            routes: ROUTES.to_vec(),
        }
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match a path (with optional query) against the table.
    pub fn match_path(&self, target: &str) -> Result<(Route, Params)> {
        let (path, query) = split_target(target);
        let segments = segments(path);

        for def in &self.routes {
            let Some(path_params) = match_pattern(def.pattern, &segments) else {
                continue;
            };
            let params = Params {
                path: path_params,
                query: parse_query(query),
            };
            if let Some(route) = Route::from_match(def.name, &params) {
                return Ok((route, params));
            }
        }

        Err(Error::route_unmatched(path))
    }

    /// Resolve a path to its route state, falling back to `not-found`.
    ///
    /// `/` redirects to [`ROOT_PATH`].
    pub fn resolve(&self, target: &str) -> RouteState {
        let (path, query) = split_target(target);
        let target = if segments(path).is_empty() {
            debug!("Redirecting {} to {}", target, ROOT_PATH);
            match query {
                Some(query) => format!("{}?{}", ROOT_PATH, query),
                None => ROOT_PATH.to_string(),
            }
        } else {
            target.to_string()
        };

        match self.match_path(&target) {
            Ok((route, params)) => {
                let path = normalize_path(split_target(&target).0);
                RouteState::new(route, path, params)
            }
            Err(e) => {
                warn!("{}", e);
                let path = split_target(&target).0.to_string();
                RouteState::new(Route::NotFound { path: path.clone() }, path, Params::default())
            }
        }
    }
}

fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Non-empty path segments; repeated and trailing slashes are ignored.
fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn normalize_path(path: &str) -> String {
    format!("/{}", segments(path).join("/"))
}

/// Match path segments against a pattern of literal and `:name` segments.
///
/// Bound parameters are percent-decoded. Returns `None` on mismatch.
pub fn match_pattern(pattern: &str, segments: &[&str]) -> Option<BTreeMap<String, String>> {
    let pattern = self::segments(pattern);
    if pattern.len() != segments.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (expected, actual) in pattern.iter().zip(segments) {
        match expected.strip_prefix(':') {
            Some(name) => {
                let value = percent_decode_str(actual).decode_utf8_lossy().into_owned();
                params.insert(name.to_string(), value);
            }
            None if expected == actual => {}
            None => return None,
        }
    }
    Some(params)
}

fn parse_query(query: Option<&str>) -> BTreeMap<String, String> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Link builders
// ─────────────────────────────────────────────────────────────────────────────

pub fn rack_path(id: &str) -> String {
    format!("/rack/{}", encode(id))
}

/// Rack detail with a device slot highlighted.
pub fn rack_device_path(rack_id: &str, device_id: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("device", device_id)
        .finish();
    format!("{}?{}", rack_path(rack_id), query)
}

pub fn device_path(id: &str) -> String {
    format!("/device/{}", encode(id))
}

pub fn problem_path(device_id: &str) -> String {
    format!("/problem/{}", encode(device_id))
}

pub fn relay_path(id: &str) -> String {
    format!("/relay/{}", encode(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rack_detail_route() {
        let state = Router::new().resolve("/rack/42");
        assert_eq!(state.route.name(), RouteName::RackDetail);
        assert_eq!(state.route.id(), Some("42"));
        assert_eq!(state.params.get("id"), Some("42"));
        assert_eq!(state.nav_index, Some(NAV_ENTRIES[0].index));
        assert_eq!(NAV_ENTRIES[0].label_key, "Racks");
        assert_eq!(state.title_key, "Racks");
        assert_eq!(
            state.loads,
            vec![
                LoadRequest::All(EntityKind::Rack),
                LoadRequest::One(EntityKind::Rack, "42".into())
            ]
        );
    }

    #[test]
    fn test_unknown_path_falls_back_to_not_found() {
        let router = Router::new();
        assert!(matches!(
            router.match_path("/unknown"),
            Err(Error::RouteUnmatched { .. })
        ));

        let state = router.resolve("/unknown");
        assert_eq!(
            state.route,
            Route::NotFound {
                path: "/unknown".into()
            }
        );
        assert_eq!(state.nav_index, None);
        assert!(state.loads.is_empty());
        assert_eq!(state.title_key, "Page Not Found");
    }

    #[test]
    fn test_too_many_segments_is_unmatched() {
        let state = Router::new().resolve("/rack/42/extra");
        assert_eq!(state.route.name(), RouteName::NotFound);
    }

    #[test]
    fn test_root_redirects_to_rack_list() {
        let router = Router::new();
        for path in ["/", "", "//"] {
            let state = router.resolve(path);
            assert_eq!(state.route, Route::RackList);
            assert_eq!(state.path, "/rack");
        }
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let state = Router::new().resolve("/device/");
        assert_eq!(state.route, Route::DeviceList);
        assert_eq!(state.path, "/device");
    }

    #[test]
    fn test_query_device_highlight() {
        let state = Router::new().resolve("/rack/r1?device=HX-7");
        assert_eq!(
            state.route,
            Route::RackDetail {
                id: "r1".into(),
                device: Some("HX-7".into())
            }
        );
        assert_eq!(state.params.query("device"), Some("HX-7"));
        assert_eq!(state.path, "/rack/r1");
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let state = Router::new().resolve("/device/HX%2F1%20a");
        assert_eq!(state.route.id(), Some("HX/1 a"));
    }

    #[test]
    fn test_problem_detail_loads_device() {
        let state = Router::new().resolve("/problem/HX-1");
        assert_eq!(state.route.name(), RouteName::ProblemDetail);
        assert_eq!(state.nav_index, Some(1));
        assert_eq!(
            state.loads,
            vec![
                LoadRequest::All(EntityKind::Problem),
                LoadRequest::One(EntityKind::Device, "HX-1".into())
            ]
        );
    }

    #[test]
    fn test_login_has_no_nav_entry() {
        let state = Router::new().resolve("/login");
        assert_eq!(state.route, Route::Login);
        assert_eq!(state.nav_index, None);
        assert!(state.loads.is_empty());
    }

    #[test]
    fn test_every_nav_entry_resolves_to_its_index() {
        let router = Router::new();
        for entry in NAV_ENTRIES {
            assert_eq!(router.resolve(entry.href).nav_index, Some(entry.index));
        }
    }

    #[test]
    fn test_match_pattern() {
        assert!(match_pattern("/rack", &["rack"]).unwrap().is_empty());
        assert_eq!(
            match_pattern("/rack/:id", &["rack", "7"]).unwrap()["id"],
            "7"
        );
        assert!(match_pattern("/rack/:id", &["device", "7"]).is_none());
        assert!(match_pattern("/rack/:id", &["rack"]).is_none());
    }

    #[test]
    fn test_link_builders_round_trip() {
        let router = Router::new();
        let state = router.resolve(&device_path("HX/1?x"));
        assert_eq!(state.route.id(), Some("HX/1?x"));

        let href = rack_device_path("r 1", "HX&2");
        assert_eq!(href, "/rack/r%201?device=HX%262");
        let state = router.resolve(&href);
        assert_eq!(
            state.route,
            Route::RackDetail {
                id: "r 1".into(),
                device: Some("HX&2".into())
            }
        );
    }

    #[test]
    fn test_route_serializes_with_kebab_tag() {
        let value = serde_json::to_value(Route::DeviceDetail { id: "d".into() }).unwrap();
        assert_eq!(value["route"], "device-detail");
        assert_eq!(value["id"], "d");
    }
}
