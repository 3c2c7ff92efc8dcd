//! Deterministic voice allocation (§4.3): gender-based initial assignment, then a
//! frequency-based remap once real dialogue line counts are known.

pub mod frequency;
pub mod initial;
pub mod sequential;

pub use frequency::{allocate_by_frequency, remap_assignments};
pub use initial::allocate_by_gender;
pub use sequential::{GenderBucket, SequentialPicker};
