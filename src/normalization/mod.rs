//! Field mapping and defaulting for records headed to the content tables.

pub mod content;
pub mod fields;
pub mod hook;
pub mod platform;
pub mod record;

pub use content::ContentEntry;
pub use hook::{HookCategory, HookPattern};
pub use platform::Platform;
pub use record::{CanonicalRecord, DefaultPolicy, Normalized, Normalizer, Profile, RawRecord};
