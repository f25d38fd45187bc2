//! Ports layer for the attendance session engine.
//!
//! - Inbound (driving): the API the gateway calls
//! - Outbound (driven): ledger, course directory and clock

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
