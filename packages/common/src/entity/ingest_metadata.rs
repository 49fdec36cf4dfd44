use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingest_metadata")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub fieldid: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub filter: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ccdid: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub qid: i32,

    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_length: Option<i64>,
    pub ingested_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
