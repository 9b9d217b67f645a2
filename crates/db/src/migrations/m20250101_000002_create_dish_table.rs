//! Create dish table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Dish::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Dish::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Dish::RestaurantId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Dish::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Dish::Description).text().not_null())
                    .col(
                        ColumnDef::new(Dish::Price)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Dish::CreatedBy).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Dish::RatingCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Dish::RatingSum)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Dish::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Dish::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dish_restaurant")
                            .from(Dish::Table, Dish::RestaurantId)
                            .to(Restaurant::Table, Restaurant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: restaurant_id (for listing a restaurant's dishes)
        manager
            .create_index(
                Index::create()
                    .name("idx_dish_restaurant_id")
                    .table(Dish::Table)
                    .col(Dish::RestaurantId)
                    .to_owned(),
            )
            .await?;

        // Unique index: (restaurant_id, name) - no duplicate dish names per restaurant
        manager
            .create_index(
                Index::create()
                    .name("idx_dish_restaurant_name")
                    .table(Dish::Table)
                    .col(Dish::RestaurantId)
                    .col(Dish::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Dish::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Dish {
    Table,
    Id,
    RestaurantId,
    Name,
    Description,
    Price,
    CreatedBy,
    RatingCount,
    RatingSum,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Restaurant {
    Table,
    Id,
}
