//! Restaurant entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "restaurant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Category reference (category CRUD lives outside this engine)
    #[sea_orm(nullable)]
    pub category_id: Option<String>,

    #[sea_orm(nullable)]
    pub location: Option<String>,

    /// User who proposed this restaurant
    pub proposed_by: String,

    /// Restaurants enter as proposals; only approved ones accept reviews
    #[sea_orm(default_value = false)]
    pub approved: bool,

    /// Number of live reviews (denormalized)
    #[sea_orm(default_value = 0)]
    pub rating_count: i32,

    /// Sum of live review ratings (denormalized)
    #[sea_orm(default_value = 0)]
    pub rating_sum: i32,

    /// Derived ranking score, recomputed whenever the aggregate changes.
    /// Never written directly by clients.
    #[sea_orm(column_type = "Double")]
    pub ranking_score: f64,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::dish::Entity")]
    Dish,
}

impl Related<super::dish::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dish.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
