//! Strongly-typed seed name.

use crate::newtype_string::define_newtype_string;

define_newtype_string! {
    /// A non-empty seed name, derived from the seed document's file stem.
    pub struct SeedName;
}
