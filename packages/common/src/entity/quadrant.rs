use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quadrant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub fieldid: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub filter: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ccdid: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub qid: i32,

    pub magzp: Option<f64>,
    pub magzp_rms: Option<f64>,
    pub magzp_unc: Option<f64>,
    pub infobits: i64,
}

impl ActiveModelBehavior for ActiveModel {}
