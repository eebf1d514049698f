use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub entry_id: i64,
    #[sea_orm(belongs_to, from = "entry_id", to = "id", on_delete = "Cascade")]
    pub entry: HasOne<super::entry::Entity>,

    /// Object key suffix; never changes.
    #[sea_orm(unique)]
    pub file_uuid: Uuid,
    #[sea_orm(column_type = "Text")]
    pub filename: String,
    pub mime_type: String,
    pub size: i64,

    /// Cleared once, when the upload is confirmed.
    #[sea_orm(default_value = true, indexed)]
    pub pending: bool,
}

impl ActiveModelBehavior for ActiveModel {}
