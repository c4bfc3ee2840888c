//! Feature record and input ranges
//!
//! The classifier was trained on a fixed, ordered set of columns; everything
//! that builds model input goes through [`FeatureRecord`].

pub mod ranges;
pub mod record;

pub use ranges::FieldRange;
pub use record::{Answer, FeatureRecord, Sex, FEATURE_NAMES};
