//! Review entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of resource a review targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[sea_orm(string_value = "restaurant")]
    Restaurant,
    #[sea_orm(string_value = "dish")]
    Dish,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Whether this review targets a restaurant or a dish
    pub resource_type: ResourceKind,

    /// The reviewed restaurant or dish
    #[sea_orm(indexed)]
    pub resource_id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub author_id: String,

    /// Star rating in [1, 5]
    pub rating: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,

    /// Like count (denormalized, kept equal to the live like reactions)
    #[sea_orm(default_value = 0)]
    pub likes: i32,

    /// Dislike count (denormalized, kept equal to the live dislike reactions)
    #[sea_orm(default_value = 0)]
    pub dislikes: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reaction::Entity")]
    Reaction,
}

impl Related<super::reaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
