//! Create restaurant table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Restaurant::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Restaurant::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Restaurant::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Restaurant::Description).text().not_null())
                    .col(ColumnDef::new(Restaurant::CategoryId).string_len(32))
                    .col(ColumnDef::new(Restaurant::Location).string_len(256))
                    .col(
                        ColumnDef::new(Restaurant::ProposedBy)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Restaurant::Approved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Restaurant::RatingCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Restaurant::RatingSum)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Restaurant::RankingScore)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Restaurant::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Restaurant::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: approved (public listings only show approved restaurants)
        manager
            .create_index(
                Index::create()
                    .name("idx_restaurant_approved")
                    .table(Restaurant::Table)
                    .col(Restaurant::Approved)
                    .to_owned(),
            )
            .await?;

        // Index: ranking_score (for ranked listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_restaurant_ranking_score")
                    .table(Restaurant::Table)
                    .col(Restaurant::RankingScore)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Restaurant::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Restaurant {
    Table,
    Id,
    Name,
    Description,
    CategoryId,
    Location,
    ProposedBy,
    Approved,
    RatingCount,
    RatingSum,
    RankingScore,
    CreatedAt,
    UpdatedAt,
}
