//! conch-app - Session state and presentation for the Conch console
//!
//! Holds the per-type entity stores, the path router, the view composer and
//! the [`AppContext`] that ties them to the API client and the selected
//! translator. Everything a view layer renders comes out of
//! [`AppContext::compose`] as a serializable [`ViewDescription`].

pub mod config;
pub mod context;
pub mod format;
pub mod router;
pub mod store;
pub mod view;

pub use context::AppContext;
pub use router::{LoadRequest, NavEntry, Params, Route, RouteName, RouteState, Router, NAV_ENTRIES};
pub use store::{EntityStore, LoadFailure, StoreSnapshot, Stores};
pub use view::{
    Action, ActionKind, DetailBody, FeedbackForm, FeedbackStatus, Interaction, ListBody, Panel,
    ViewComposer, ViewDescription,
};
