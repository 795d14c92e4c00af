//! The cached-resource contract shared by every inventory type

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Inventory resource kinds the console caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Rack,
    Device,
    Relay,
    Problem,
}

impl EntityKind {
    /// Singular resource name, also the first path segment of its endpoints.
    pub fn resource(&self) -> &'static str {
        match self {
            EntityKind::Rack => "rack",
            EntityKind::Device => "device",
            EntityKind::Relay => "relay",
            EntityKind::Problem => "problem",
        }
    }

    /// Key of the collection inside a list response's `data` object.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Rack => "racks",
            EntityKind::Device => "devices",
            EntityKind::Relay => "relays",
            EntityKind::Problem => "problems",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource())
    }
}

/// A typed record cached client-side.
pub trait Entity:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    /// Key used by `load_one`, `select` and route `:id` params.
    fn id(&self) -> &str;
}
