//! Create reaction table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reaction::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Reaction::ReviewId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reaction::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Reaction::Kind).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Reaction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Reaction::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reaction_review")
                            .from(Reaction::Table, Reaction::ReviewId)
                            .to(Review::Table, Review::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, review_id) - one reaction per user per review
        manager
            .create_index(
                Index::create()
                    .name("idx_reaction_user_review")
                    .table(Reaction::Table)
                    .col(Reaction::UserId)
                    .col(Reaction::ReviewId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: review_id (for listing reactions on a review)
        manager
            .create_index(
                Index::create()
                    .name("idx_reaction_review_id")
                    .table(Reaction::Table)
                    .col(Reaction::ReviewId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reaction::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Reaction {
    Table,
    Id,
    ReviewId,
    UserId,
    Kind,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Review {
    Table,
    Id,
}
