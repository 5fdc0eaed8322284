pub mod api;
pub mod config;
pub mod couple;
pub mod date;
pub mod media;
pub mod memories;
pub mod search;
pub mod store;
pub mod timeline;

// Re-export the aggregator surface for convenience
pub use api::{ApiClient, ApiError};
pub use config::ClientConfig;
pub use couple::{Couple, CoupleRequest, PairingAction, PairingError, PairingEvent, PairingState};
pub use media::{MediaRecord, MediaType};
pub use memories::{compute_days_together, filter_on_this_day, group_memories_by_year};
pub use search::{filter_by_search, filter_by_type, MediaFilter, SearchQuery};
pub use store::{SettingsStore, StoreError};
pub use timeline::{group_by_year_month, Timeline, YearMonth, YearSection};
