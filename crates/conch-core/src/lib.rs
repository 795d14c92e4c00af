//! # conch-core - Core Domain Types
//!
//! Foundation crate for the Conch console. Provides the inventory domain
//! types, the cached-entity contract, error handling and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`Rack`], [`SlotAssignment`], [`DeviceRef`] - Racks and their slot layout
//! - [`Device`], [`Health`], [`RackLocation`], [`DeviceLocation`] - Devices and placement
//! - [`Relay`], [`RelayDevice`] - Relays and the devices seen through them
//! - [`Problem`] - Reported component problems
//!
//! ### Entities (`entity`)
//! - [`Entity`] - Trait implemented by every cached resource type
//! - [`EntityKind`] - Resource discriminant with endpoint naming
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use conch_core::prelude::*;
//! ```

pub mod entity;
pub mod error;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all Conch crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use entity::{Entity, EntityKind};
pub use error::{Error, Result, ResultExt};
pub use types::{
    Device, DeviceLocation, DeviceRef, Health, LocatedRack, Problem, Rack, RackLocation, Relay,
    RelayDevice, SlotAssignment,
};
