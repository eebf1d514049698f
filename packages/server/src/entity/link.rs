use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub entry_id: i64,
    #[sea_orm(belongs_to, from = "entry_id", to = "id", on_delete = "Cascade")]
    pub entry: HasOne<super::entry::Entity>,

    #[sea_orm(column_type = "Text")]
    pub target_url: String,
}

impl ActiveModelBehavior for ActiveModel {}
