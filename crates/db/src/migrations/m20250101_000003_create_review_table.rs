//! Create review table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Review::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Review::ResourceType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Review::ResourceId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Review::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Review::Rating).integer().not_null())
                    .col(ColumnDef::new(Review::Comment).text())
                    .col(
                        ColumnDef::new(Review::Likes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Review::Dislikes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Review::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Review::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (author_id, resource_type, resource_id) -
        // one review per author per resource
        manager
            .create_index(
                Index::create()
                    .name("idx_review_author_resource")
                    .table(Review::Table)
                    .col(Review::AuthorId)
                    .col(Review::ResourceType)
                    .col(Review::ResourceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (resource_type, resource_id) (for listing a resource's reviews)
        manager
            .create_index(
                Index::create()
                    .name("idx_review_resource")
                    .table(Review::Table)
                    .col(Review::ResourceType)
                    .col(Review::ResourceId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_review_created_at")
                    .table(Review::Table)
                    .col(Review::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Review::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Review {
    Table,
    Id,
    ResourceType,
    ResourceId,
    AuthorId,
    Rating,
    Comment,
    Likes,
    Dislikes,
    CreatedAt,
    UpdatedAt,
}
