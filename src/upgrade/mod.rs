//! Upgrade orchestration framework
//!
//! Discovers the registered data upgraders, orders them, executes each at
//! most once per installation, and records completion in the upgrade
//! ledger. Runs once during process bootstrap, before anything serves
//! traffic.

mod bridge;
mod orchestrator;
mod registry;
mod upgrader;

pub use bridge::{InstallationFlagBridge, LegacyFlagMapping, BRIDGE_ORDER};
pub use orchestrator::{Orchestrator, UpgradeOutcome, UpgradeReport, UpgradeStatus};
pub use registry::{RegisteredUpgrader, UpgraderRegistry};
pub use upgrader::Upgrader;
