//! Identifier and location types for the dyntopo topology stack.
//!
//! Kept in their own crate so event producers (discovery, host tracking, the switch
//! transport) can build events without depending on the engine.

mod connection;
mod dpid;
mod entity;
mod location;
mod mac;

pub use connection::ConnectionHandle;
pub use dpid::{Dpid, ParseDpidError};
pub use entity::{EntityId, ParseEntityIdError, PortNo};
pub use location::HostLocation;
pub use mac::{MacAddr, ParseMacError};
