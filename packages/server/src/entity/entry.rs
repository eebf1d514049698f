use common::ResourceType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Canonical (path-escaped) slug.
    #[sea_orm(unique, column_type = "Text")]
    pub slug: String,
    /// Fixed at creation.
    #[sea_orm(column_name = "type")]
    pub kind: ResourceType,
    #[sea_orm(column_type = "Text", nullable)]
    pub password_hash: Option<String>,

    pub created_at: DateTimeUtc,
    pub expires_at: Option<DateTimeUtc>,

    #[sea_orm(has_one)]
    pub link: HasOne<super::link::Entity>,
    #[sea_orm(has_one)]
    pub file: HasOne<super::file::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
