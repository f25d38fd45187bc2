//! Adapters: in-process implementations of the outbound ports.

pub mod bus;
pub mod clock;
pub mod memory_directory;
pub mod memory_ledger;

pub use bus::{session_bus, SessionBus};
pub use clock::MonotonicClock;
pub use memory_directory::InMemoryCourseDirectory;
pub use memory_ledger::InMemoryLedger;
