mod freshness;

pub use freshness::{FreshnessPolicy, DEFAULT_TTL_HOURS};
