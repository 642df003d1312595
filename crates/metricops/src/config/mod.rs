pub mod error;
pub mod loader;
pub mod normalize;
pub mod raw;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use normalize::{normalize, CanonicalConfig, OutdatedConfig, METRIC_TEMPLATE_FIELDS};
pub use raw::{RawConfig, RawSections};
