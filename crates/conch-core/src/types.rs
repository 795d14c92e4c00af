//! Inventory domain types as returned by the inventory API

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityKind};

/// Result of the most recent validation run on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Health {
    Pass,
    Fail,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Health {
    /// Devices that did not pass are eligible for the problem views.
    pub fn may_have_problems(&self) -> bool {
        !matches!(self, Health::Pass)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Pass => "PASS",
            Health::Fail => "FAIL",
            Health::Unknown => "UNKNOWN",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Racks
// ─────────────────────────────────────────────────────────────────────────────

/// Device summary embedded in a rack slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceRef {
    pub id: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub health: Option<Health>,
}

/// What occupies a rack slot. On the wire an unassigned slot is `null`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "Option<DeviceRef>", into = "Option<DeviceRef>")]
pub enum SlotAssignment {
    Assigned(DeviceRef),
    Unassigned,
}

impl From<Option<DeviceRef>> for SlotAssignment {
    fn from(value: Option<DeviceRef>) -> Self {
        match value {
            Some(device) => SlotAssignment::Assigned(device),
            None => SlotAssignment::Unassigned,
        }
    }
}

impl From<SlotAssignment> for Option<DeviceRef> {
    fn from(value: SlotAssignment) -> Self {
        match value {
            SlotAssignment::Assigned(device) => Some(device),
            SlotAssignment::Unassigned => None,
        }
    }
}

impl SlotAssignment {
    pub fn device(&self) -> Option<&DeviceRef> {
        match self {
            SlotAssignment::Assigned(device) => Some(device),
            SlotAssignment::Unassigned => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub datacenter: String,
    /// Slot number to occupant, ordered by slot number.
    #[serde(default)]
    pub slots: BTreeMap<u32, SlotAssignment>,
}

impl Rack {
    /// Slot holding the given device, if it is racked here.
    pub fn slot_of(&self, device_id: &str) -> Option<u32> {
        self.slots.iter().find_map(|(slot, assignment)| {
            assignment
                .device()
                .filter(|device| device.id == device_id)
                .map(|_| *slot)
        })
    }
}

impl Entity for Rack {
    const KIND: EntityKind = EntityKind::Rack;

    fn id(&self) -> &str {
        &self.id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Devices
// ─────────────────────────────────────────────────────────────────────────────

/// Denormalized rack placement copied into devices and relays.
///
/// A snapshot taken when the owner was fetched; it does not follow later
/// rack changes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RackLocation {
    pub rack_id: String,
    pub rack_name: String,
    pub role_name: String,
    pub room_name: String,
    pub slot: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub health: Health,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<RackLocation>,
}

impl Device {
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.id)
    }
}

impl Entity for Device {
    const KIND: EntityKind = EntityKind::Device;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Rack summary returned by the device location lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocatedRack {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub datacenter: String,
}

/// Response of `GET /device/:id/location`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceLocation {
    pub rack: LocatedRack,
    #[serde(default)]
    pub slot: Option<u32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Relays
// ─────────────────────────────────────────────────────────────────────────────

/// A device seen through a relay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RelayDevice {
    pub id: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub health: Health,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Relay {
    pub id: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default, rename = "ipaddr")]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub ssh_port: Option<u16>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<RackLocation>,
    #[serde(default)]
    pub devices: Vec<RelayDevice>,
}

impl Relay {
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.id)
    }
}

impl Entity for Relay {
    const KIND: EntityKind = EntityKind::Relay;

    fn id(&self) -> &str {
        &self.id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Problems
// ─────────────────────────────────────────────────────────────────────────────

/// A hardware problem reported for one component of a device.
///
/// Keyed by device id: a device with several failing components appears
/// once per component.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Problem {
    pub device_id: String,
    pub component_type: String,
    pub component_name: String,
    pub condition: String,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

impl Entity for Problem {
    const KIND: EntityKind = EntityKind::Problem;

    fn id(&self) -> &str {
        &self.device_id
    }
}
