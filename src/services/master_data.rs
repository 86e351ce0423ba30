//! Reference data for form pickers.

use crate::db::{self, DbPool, MasterTable};
use crate::error::AppResult;
use crate::models::master_data::MasterDataResponse;

#[derive(Clone)]
pub struct MasterDataService {
    db: DbPool,
}

impl MasterDataService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn all(&self) -> AppResult<MasterDataResponse> {
        Ok(MasterDataResponse {
            regions: db::master_list(&self.db, MasterTable::Regions).await?,
            positions: db::master_list(&self.db, MasterTable::Positions).await?,
            genres: db::master_list(&self.db, MasterTable::Genres).await?,
            experience_levels: db::master_list(&self.db, MasterTable::ExperienceLevels).await?,
            orientations: db::master_list(&self.db, MasterTable::Orientations).await?,
            recruitment_types: db::master_list(&self.db, MasterTable::RecruitmentTypes).await?,
        })
    }
}
