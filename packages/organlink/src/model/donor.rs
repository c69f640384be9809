use super::{de, EntityId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Donor {
    pub donor_id: EntityId,

    #[serde(default)]
    pub full_name: String,

    #[serde(default)]
    pub blood_type: Option<String>,

    #[serde(default, deserialize_with = "de::string_set")]
    pub organs_to_donate: BTreeSet<String>,

    /// Donor consent signature verified by the OCR service
    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub signature_verified: bool,

    /// Hash of the donor registration transaction
    #[serde(default)]
    pub blockchain_hash: Option<String>,
}

impl Donor {
    pub fn donates(&self, organ: &str) -> bool {
        self.organs_to_donate
            .iter()
            .any(|o| o.eq_ignore_ascii_case(organ))
    }

    pub fn is_registered_on_chain(&self) -> bool {
        self.blockchain_hash
            .as_deref()
            .is_some_and(|hash| !hash.trim().is_empty())
    }
}
