//! Bakery idle-progression engine.
//!
//! Currency from manual bakes and passive auto-bakers, recipe and upgrade
//! economy, fixed one-second ticks, offline catch-up, and a single-slot
//! JSON save. Rendering and input belong to the host; it drives a
//! [`Bakery`] session through the operations below.

pub mod bakery;
pub mod config;
pub mod format;
pub mod logging;
pub mod storage;
pub mod time;

pub use bakery::logic::TickReport;
pub use bakery::offline::{OfflineReport, MAX_OFFLINE_SECONDS};
pub use bakery::save::{restore_state, SaveData, SaveGateway, SavedState};
pub use bakery::state::{Milestone, ProgressionModel, Recipe, Stats, Upgrade, UpgradeKind};
pub use bakery::{AdvanceReport, Bakery, SharedBakery};
pub use config::{ConfigError, EngineConfig};
pub use format::{format_duration, format_number, format_with_commas, parse_number};
pub use storage::{KeyValueStore, MemoryStore, NullStore, StoreError};
pub use time::{Clock, ManualClock, SystemClock};
