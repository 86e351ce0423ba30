//! `/common` response: every reference table in display order.

use serde::Serialize;

use super::taxonomy::NamedRef;

#[derive(Debug, Serialize)]
pub struct MasterDataResponse {
    pub regions: Vec<NamedRef>,
    pub positions: Vec<NamedRef>,
    pub genres: Vec<NamedRef>,
    pub experience_levels: Vec<NamedRef>,
    pub orientations: Vec<NamedRef>,
    pub recruitment_types: Vec<NamedRef>,
}
