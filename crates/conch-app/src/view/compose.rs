//! Route to view composition

use chrono::{DateTime, Utc};
use conch_core::{Device, Entity, Health, Problem, Rack, RackLocation, Relay};
use conch_i18n::Translator;

use super::{
    Action, ActionKind, ActionPanel, DetailBody, DetailPanel, FeedbackForm, FeedbackStatus,
    Interaction, ListBody, ListItem, ListPanel, NavItem, Panel, Row, Section, ViewDescription,
};
use crate::format::{device_label, relative_time};
use crate::router::{
    device_path, problem_path, rack_device_path, rack_path, relay_path, Route, RouteState,
    NAV_ENTRIES,
};
use crate::store::{StoreSnapshot, Stores};

/// Builds view descriptions. Synchronous and side-effect free: it only reads
/// the snapshots it is given.
#[derive(Debug, Clone, Copy)]
pub struct ViewComposer<'a> {
    tr: &'a Translator,
    now: DateTime<Utc>,
}

impl<'a> ViewComposer<'a> {
    /// `now` anchors relative timestamps.
    pub fn new(tr: &'a Translator, now: DateTime<Utc>) -> Self {
        Self { tr, now }
    }

    pub fn compose(
        &self,
        state: &RouteState,
        stores: &Stores,
        interaction: &Interaction,
    ) -> ViewDescription {
        let mut banner = interaction.notice.clone();
        let panels = match &state.route {
            Route::RackList | Route::RackDetail { .. } => {
                let racks = stores.racks.snapshot();
                banner = banner.or_else(|| self.failure_banner(&racks, state.route.id()));
                self.rack_panels(&state.route, &racks)
            }
            Route::DeviceList | Route::DeviceDetail { .. } => {
                let devices = stores.devices.snapshot();
                banner = banner.or_else(|| self.failure_banner(&devices, state.route.id()));
                self.device_panels(&state.route, &devices, interaction)
            }
            Route::ProblemList | Route::ProblemDetail { .. } => {
                let problems = stores.problems.snapshot();
                let devices = stores.devices.snapshot();
                banner = banner
                    .or_else(|| self.failure_banner(&problems, None))
                    .or_else(|| self.failure_banner(&devices, state.route.id()));
                self.problem_panels(&state.route, &problems, &devices, interaction)
            }
            Route::RelayList | Route::RelayDetail { .. } => {
                let relays = stores.relays.snapshot();
                banner = banner.or_else(|| self.failure_banner(&relays, state.route.id()));
                self.relay_panels(&state.route, &relays, interaction)
            }
            Route::Login => vec![Panel::Detail(DetailPanel {
                title: self.tr.t("Login"),
                body: DetailBody::Placeholder {
                    message: self.tr.t("Login to Conch"),
                },
            })],
            Route::NotFound { .. } => vec![Panel::Detail(DetailPanel {
                title: self.tr.t("Page Not Found"),
                body: DetailBody::Placeholder {
                    message: self.tr.t("Page Not Found"),
                },
            })],
        };

        ViewDescription {
            route: state.route.name(),
            path: state.path.clone(),
            title: self.tr.t(state.title_key),
            nav: self.nav(state.nav_index),
            banner,
            panels,
            feedback: self.feedback_form(interaction.feedback),
        }
    }

    fn feedback_form(&self, status: FeedbackStatus) -> FeedbackForm {
        FeedbackForm {
            title: self.tr.t("Send Feedback"),
            placeholder: self.tr.t("Feedback placeholder"),
            confirmation: (status == FeedbackStatus::Submitted)
                .then(|| self.tr.t("Feedback submitted")),
            submit: Action {
                kind: ActionKind::SendFeedback,
                label: self.tr.t("Submit Feedback"),
                enabled: status == FeedbackStatus::Idle,
            },
        }
    }

    fn nav(&self, active: Option<usize>) -> Vec<NavItem> {
        NAV_ENTRIES
            .iter()
            .map(|entry| NavItem {
                label: self.tr.t(entry.label_key),
                href: entry.href.to_string(),
                active: active == Some(entry.index),
            })
            .collect()
    }

    /// Banner for a failed load relevant to this page.
    ///
    /// A detail `NotFound` renders as a placeholder, not a banner.
    fn failure_banner<T: Entity>(
        &self,
        snapshot: &StoreSnapshot<T>,
        route_id: Option<&str>,
    ) -> Option<String> {
        let failure = snapshot.last_error.as_ref()?;
        let relevant = match failure.id.as_deref() {
            None => true,
            Some(id) => route_id == Some(id) && !failure.error.is_not_found(),
        };
        relevant.then(|| {
            self.tr.t_args(
                "Load Failed",
                &[
                    ("resource", T::KIND.resource()),
                    ("message", &failure.error.to_string()),
                ],
            )
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shared panel pieces
    // ─────────────────────────────────────────────────────────────────────────

    fn list_panel<T: Entity>(
        &self,
        title_key: &str,
        snapshot: &StoreSnapshot<T>,
        header: Option<String>,
        items: impl FnOnce(&[T]) -> Vec<ListItem>,
    ) -> Panel {
        let body = if snapshot.list_loading {
            ListBody::Loading {
                label: self.tr.t("Loading"),
            }
        } else if snapshot.list.is_empty() {
            ListBody::Empty {
                label: self.tr.t("Nothing to show"),
            }
        } else {
            ListBody::Items {
                items: items(&snapshot.list),
            }
        };
        Panel::List(ListPanel {
            title: self.tr.t(title_key),
            // Kept for an empty result so a zero count is still reported
            header: header.filter(|_| snapshot.cached && !snapshot.list_loading),
            body,
        })
    }

    /// Detail body for `id` read from a store's `current`.
    fn detail_body<T: Entity>(
        &self,
        snapshot: &StoreSnapshot<T>,
        id: &str,
        select_key: &str,
        content: impl FnOnce(&T) -> Vec<Section>,
    ) -> DetailBody {
        if let Some(entity) = snapshot.current_for(id) {
            return DetailBody::Content {
                sections: content(entity),
            };
        }
        if snapshot.is_loading_one(id) {
            return DetailBody::Loading {
                label: self.tr.t("Loading"),
            };
        }
        let not_found = snapshot
            .last_error
            .as_ref()
            .is_some_and(|failure| failure.is_not_found_for(id));
        let message = if not_found {
            self.tr.t_args(
                "Not Found",
                &[("resource", T::KIND.resource()), ("id", id)],
            )
        } else {
            self.tr.t(select_key)
        };
        DetailBody::Placeholder { message }
    }

    fn navigate(&self, label_key: &str, href: String) -> Action {
        Action {
            kind: ActionKind::Navigate { href },
            label: self.tr.t(label_key),
            enabled: true,
        }
    }

    fn find_in_rack(&self, device_id: &str, interaction: &Interaction) -> Action {
        Action {
            kind: ActionKind::FindDeviceInRack {
                device_id: device_id.to_string(),
            },
            label: self.tr.t("Find Device in Rack"),
            enabled: !interaction.pending_lookups.contains(device_id),
        }
    }

    /// Actions on a device; "show problems" only for devices that did not pass.
    fn device_actions(
        &self,
        device_id: &str,
        health: Health,
        interaction: &Interaction,
        with_problems: bool,
        with_report: bool,
    ) -> Vec<Action> {
        let mut actions = vec![self.find_in_rack(device_id, interaction)];
        if with_problems && health.may_have_problems() {
            actions.push(self.navigate("Show Device Problems", problem_path(device_id)));
        }
        if with_report {
            actions.push(self.navigate("Latest Device Report", device_path(device_id)));
        }
        actions
    }

    fn location_section(&self, title_key: &str, location: &RackLocation, link: String) -> Section {
        let mut row = Row::new(vec![
            location.room_name.clone(),
            location.rack_name.clone(),
            location.role_name.clone(),
            location.slot.map(|s| s.to_string()).unwrap_or_default(),
        ]);
        row.actions.push(self.navigate("Show Rack", link.clone()));
        row.link = Some(link);
        Section {
            title: self.tr.t(title_key),
            columns: self.columns(&["Datacenter Room", "Rack Name", "Role Name", "Slot Number"]),
            rows: vec![row],
            note: None,
        }
    }

    fn columns(&self, keys: &[&str]) -> Vec<String> {
        keys.iter().map(|key| self.tr.t(key)).collect()
    }

    fn health(&self, health: Health) -> String {
        health.as_str().to_string()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Racks
    // ─────────────────────────────────────────────────────────────────────────

    fn rack_panels(&self, route: &Route, racks: &StoreSnapshot<Rack>) -> Vec<Panel> {
        let active = route.id();
        let mut panels = vec![self.list_panel("Racks", racks, None, |list| {
            list.iter()
                .map(|rack| ListItem {
                    id: rack.id.clone(),
                    label: rack.name.clone(),
                    detail: Some(rack.role.clone()).filter(|role| !role.is_empty()),
                    href: rack_path(&rack.id),
                    active: active == Some(rack.id.as_str()),
                })
                .collect()
        })];

        let Route::RackDetail { id, device } = route else {
            return panels;
        };

        let body = self.detail_body(racks, id, "Select Rack", |rack| {
            self.rack_sections(rack, device.as_deref())
        });
        let loaded = matches!(body, DetailBody::Content { .. });
        panels.push(Panel::Detail(DetailPanel {
            title: racks
                .current_for(id)
                .map(|rack| rack.name.clone())
                .unwrap_or_else(|| self.tr.t("Racks")),
            body,
        }));
        if loaded {
            panels.push(Panel::Actions(ActionPanel {
                title: self.tr.t("Actions"),
                actions: vec![Action {
                    kind: ActionKind::AssignDevices {
                        rack_id: id.clone(),
                    },
                    label: self.tr.t("Assign Devices"),
                    enabled: true,
                }],
            }));
        }
        panels
    }

    fn rack_sections(&self, rack: &Rack, highlight: Option<&str>) -> Vec<Section> {
        let info = Section {
            title: rack.name.clone(),
            columns: self.columns(&["Rack Name", "Rack Role", "Datacenter"]),
            rows: vec![Row::new(vec![
                rack.name.clone(),
                rack.role.clone(),
                rack.datacenter.clone(),
            ])],
            note: None,
        };

        let rows: Vec<Row> = rack
            .slots
            .iter()
            .map(|(slot, assignment)| match assignment.device() {
                Some(device) => {
                    let mut row = Row::new(vec![
                        slot.to_string(),
                        device_label(&device.id, device.alias.as_deref()),
                        device.health.map(|h| self.health(h)).unwrap_or_default(),
                    ]);
                    row.highlighted = highlight == Some(device.id.as_str());
                    row.link = Some(device_path(&device.id));
                    row
                }
                None => Row::new(vec![
                    slot.to_string(),
                    self.tr.t("Unassigned"),
                    String::new(),
                ]),
            })
            .collect();

        let slots = Section {
            title: self.tr.t("Device"),
            columns: self.columns(&["Slot Number", "Device", "Health"]),
            note: rows.is_empty().then(|| self.tr.t("Nothing to show")),
            rows,
        };
        vec![info, slots]
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Devices
    // ─────────────────────────────────────────────────────────────────────────

    fn device_panels(
        &self,
        route: &Route,
        devices: &StoreSnapshot<Device>,
        interaction: &Interaction,
    ) -> Vec<Panel> {
        let active = route.id();
        let mut panels = vec![self.list_panel("Devices", devices, None, |list| {
            list.iter()
                .map(|device| ListItem {
                    id: device.id.clone(),
                    label: device_label(&device.id, device.alias.as_deref()),
                    detail: Some(self.health(device.health)),
                    href: device_path(&device.id),
                    active: active == Some(device.id.as_str()),
                })
                .collect()
        })];

        let Route::DeviceDetail { id } = route else {
            return panels;
        };
        panels.extend(self.device_detail(id, devices, interaction));
        panels
    }

    /// Detail and action panels for one device.
    fn device_detail(
        &self,
        id: &str,
        devices: &StoreSnapshot<Device>,
        interaction: &Interaction,
    ) -> Vec<Panel> {
        let body = self.detail_body(devices, id, "Select Device", |device| {
            self.device_sections(device)
        });
        let mut panels = vec![Panel::Detail(DetailPanel {
            title: devices
                .current_for(id)
                .map(|device| device.display_name().to_string())
                .unwrap_or_else(|| self.tr.t("Devices")),
            body,
        })];

        if let Some(device) = devices.current_for(id) {
            panels.push(Panel::Actions(ActionPanel {
                title: self.tr.t("Actions"),
                actions: self.device_actions(&device.id, device.health, interaction, true, false),
            }));
        }
        panels
    }

    fn device_sections(&self, device: &Device) -> Vec<Section> {
        let report = Section {
            title: self.tr.t("Latest Device Report"),
            columns: self.columns(&["Alias", "Health", "Last Seen"]),
            rows: vec![Row::new(vec![
                device.alias.clone().unwrap_or_default(),
                self.health(device.health),
                relative_time(self.tr, device.last_seen, self.now),
            ])],
            note: device
                .last_seen
                .is_none()
                .then(|| self.tr.t("No report for device")),
        };

        let mut sections = vec![report];
        if let Some(location) = &device.location {
            sections.push(self.location_section(
                "Device Location",
                location,
                rack_device_path(&location.rack_id, &device.id),
            ));
        }
        sections
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Problems
    // ─────────────────────────────────────────────────────────────────────────

    fn problem_panels(
        &self,
        route: &Route,
        problems: &StoreSnapshot<Problem>,
        devices: &StoreSnapshot<Device>,
        interaction: &Interaction,
    ) -> Vec<Panel> {
        let active = route.id();
        let total: i64 = problems.list.iter().map(|p| i64::from(p.count)).sum();
        let header = Some(self.tr.tn("%n problems found", total));

        let mut panels = vec![self.list_panel("Problems", problems, header, |list| {
            group_by_device(list)
                .into_iter()
                .map(|(device_id, rows)| {
                    let count: i64 = rows.iter().map(|p| i64::from(p.count)).sum();
                    ListItem {
                        href: problem_path(device_id),
                        active: active == Some(device_id),
                        label: device_id.to_string(),
                        detail: Some(self.tr.tn("%n problems found", count)),
                        id: device_id.to_string(),
                    }
                })
                .collect()
        })];

        let Route::ProblemDetail { id } = route else {
            return panels;
        };

        let body = self.detail_body(devices, id, "Select Device", |device| {
            let mut sections = self.device_sections(device);
            sections.insert(0, self.problem_section(id, &problems.list));
            sections
        });
        panels.push(Panel::Detail(DetailPanel {
            title: devices
                .current_for(id)
                .map(|device| device.display_name().to_string())
                .unwrap_or_else(|| self.tr.t("Problems")),
            body,
        }));
        if let Some(device) = devices.current_for(id) {
            panels.push(Panel::Actions(ActionPanel {
                title: self.tr.t("Actions"),
                actions: self.device_actions(&device.id, device.health, interaction, false, true),
            }));
        }
        panels
    }

    fn problem_section(&self, device_id: &str, problems: &[Problem]) -> Section {
        let rows: Vec<Row> = problems
            .iter()
            .filter(|problem| problem.device_id == device_id)
            .map(|problem| {
                Row::new(vec![
                    problem.component_type.clone(),
                    problem.component_name.clone(),
                    problem.condition.clone(),
                    problem.count.to_string(),
                ])
            })
            .collect();
        Section {
            title: self.tr.t("Problems"),
            columns: self.columns(&["Component Type", "Component Name", "Condition", "Count"]),
            note: rows.is_empty().then(|| self.tr.t("No Problems")),
            rows,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Relays
    // ─────────────────────────────────────────────────────────────────────────

    fn relay_panels(
        &self,
        route: &Route,
        relays: &StoreSnapshot<Relay>,
        interaction: &Interaction,
    ) -> Vec<Panel> {
        let active = route.id();
        let mut panels = vec![self.list_panel("Relays", relays, None, |list| {
            list.iter()
                .map(|relay| ListItem {
                    id: relay.id.clone(),
                    label: relay.display_name().to_string(),
                    detail: relay.ip_address.clone(),
                    href: relay_path(&relay.id),
                    active: active == Some(relay.id.as_str()),
                })
                .collect()
        })];

        let Route::RelayDetail { id } = route else {
            return panels;
        };

        let body = self.detail_body(relays, id, "Select Relay", |relay| {
            self.relay_sections(relay, interaction)
        });
        panels.push(Panel::Detail(DetailPanel {
            title: relays
                .current_for(id)
                .map(|relay| relay.display_name().to_string())
                .unwrap_or_else(|| self.tr.t("Relays")),
            body,
        }));
        panels
    }

    fn relay_sections(&self, relay: &Relay, interaction: &Interaction) -> Vec<Section> {
        let info = Section {
            title: relay.display_name().to_string(),
            columns: self.columns(&["IP Address", "SSH Port Tunnel", "Version", "Last Seen"]),
            rows: vec![Row::new(vec![
                relay
                    .ip_address
                    .clone()
                    .unwrap_or_else(|| self.tr.t("No IP Address")),
                relay.ssh_port.map(|p| p.to_string()).unwrap_or_default(),
                relay.version.clone().unwrap_or_default(),
                relative_time(self.tr, relay.updated, self.now),
            ])],
            note: None,
        };

        let mut sections = vec![info];
        if let Some(location) = &relay.location {
            sections.push(self.location_section(
                "Relay Location",
                location,
                rack_path(&location.rack_id),
            ));
        }

        let rows: Vec<Row> = relay
            .devices
            .iter()
            .map(|device| {
                let mut row = Row::new(vec![
                    device_label(&device.id, device.alias.as_deref()),
                    self.health(device.health),
                    relative_time(self.tr, device.last_seen, self.now),
                ]);
                row.link = Some(device_path(&device.id));
                row.actions = self.device_actions(&device.id, device.health, interaction, true, true);
                row
            })
            .collect();
        sections.push(Section {
            title: self.tr.t("Connected Devices"),
            columns: self.columns(&["Device", "Health", "Last Seen"]),
            note: rows.is_empty().then(|| self.tr.t("Nothing to show")),
            rows,
        });
        sections
    }
}

/// Group problem rows by device, in order of first appearance.
fn group_by_device(problems: &[Problem]) -> Vec<(&str, Vec<&Problem>)> {
    let mut groups: Vec<(&str, Vec<&Problem>)> = Vec::new();
    for problem in problems {
        match groups.iter_mut().find(|(id, _)| *id == problem.device_id) {
            Some((_, rows)) => rows.push(problem),
            None => groups.push((&problem.device_id, vec![problem])),
        }
    }
    groups
}
