//! View descriptions
//!
//! The composer turns a resolved route plus store snapshots into a
//! [`ViewDescription`]: everything a view layer needs to render a page, with
//! all user-facing text already translated. Descriptions are plain data and
//! serialize to JSON for the headless renderer.

mod compose;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::router::RouteName;

pub use compose::ViewComposer;

/// A fully composed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewDescription {
    pub route: RouteName,
    pub path: String,
    pub title: String,
    pub nav: Vec<NavItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    pub panels: Vec<Panel>,
    pub feedback: FeedbackForm,
}

impl ViewDescription {
    pub fn list_panel(&self) -> Option<&ListPanel> {
        self.panels.iter().find_map(|panel| match panel {
            Panel::List(list) => Some(list),
            _ => None,
        })
    }

    pub fn detail_panel(&self) -> Option<&DetailPanel> {
        self.panels.iter().find_map(|panel| match panel {
            Panel::Detail(detail) => Some(detail),
            _ => None,
        })
    }

    pub fn action_panel(&self) -> Option<&ActionPanel> {
        self.panels.iter().find_map(|panel| match panel {
            Panel::Actions(actions) => Some(actions),
            _ => None,
        })
    }

    /// Every action on the page, panel actions first, then row actions.
    pub fn actions(&self) -> Vec<&Action> {
        let mut actions: Vec<&Action> = self
            .action_panel()
            .map(|panel| panel.actions.iter().collect())
            .unwrap_or_default();
        if let Some(DetailBody::Content { sections }) = self.detail_panel().map(|d| &d.body) {
            for section in sections {
                for row in &section.rows {
                    actions.extend(row.actions.iter());
                }
            }
        }
        actions
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: String,
    pub href: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum Panel {
    List(ListPanel),
    Detail(DetailPanel),
    Actions(ActionPanel),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListPanel {
    pub title: String,
    /// Summary line above the items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    pub body: ListBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ListBody {
    /// A list load is outstanding; stale rows are not shown
    Loading { label: String },
    Empty { label: String },
    Items { items: Vec<ListItem> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub href: String,
    /// The item is the one shown in the detail panel
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailPanel {
    pub title: String,
    pub body: DetailBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailBody {
    /// Nothing to show for the requested id yet
    Placeholder { message: String },
    Loading { label: String },
    Content { sections: Vec<Section> },
}

/// A titled table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Shown instead of rows when there are none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub cells: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub highlighted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self {
            cells,
            highlighted: false,
            link: None,
            actions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionPanel {
    pub title: String,
    pub actions: Vec<Action>,
}

/// A user-triggerable action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    #[serde(flatten)]
    pub kind: ActionKind,
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionKind {
    /// In-app link, handled by link activation
    Navigate { href: String },
    /// Look up the device's rack, then navigate there
    FindDeviceInRack { device_id: String },
    AssignDevices { rack_id: String },
    /// Submit the feedback form's text
    SendFeedback,
}

/// The feedback form offered on every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackForm {
    pub title: String,
    pub placeholder: String,
    /// Replaces the form once feedback was accepted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<String>,
    pub submit: Action,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedbackStatus {
    #[default]
    Idle,
    Sending,
    Submitted,
}

/// Transient interaction state the composer reflects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interaction {
    /// Devices with an outstanding rack lookup
    pub pending_lookups: BTreeSet<String>,
    /// Message from the last failed user action
    pub notice: Option<String>,
    pub feedback: FeedbackStatus,
}
