// src/models/mod.rs

pub mod attempt;
pub mod course;
pub mod pagination;
pub mod question;
pub mod quiz;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserializes a nullable field of a patch body so that an absent key
/// (`None`) can be told apart from an explicit `null` (`Some(None)`).
/// Use together with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
