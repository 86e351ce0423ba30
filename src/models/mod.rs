//! Request/response models, taxonomy references and pagination helpers.

pub mod bookmark;
pub mod comment;
pub mod image;
pub mod master_data;
pub mod pagination;
pub mod profile;
pub mod recruiting;
pub mod taxonomy;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent PATCH field (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default, deserialize_with = "nullable")]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
