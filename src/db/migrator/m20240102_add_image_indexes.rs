use crate::entities::{images, prelude::*};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const ASSIGNEE_INDEX: &str = "idx_images_assigned_to";
const RESULT_INDEX: &str = "idx_images_result";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Dashboard queue lookups
        manager
            .create_index(
                Index::create()
                    .name(ASSIGNEE_INDEX)
                    .table(Images)
                    .col(images::Column::AssignedTo)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Export selection
        manager
            .create_index(
                Index::create()
                    .name(RESULT_INDEX)
                    .table(Images)
                    .col(images::Column::Result)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name(RESULT_INDEX).table(Images).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name(ASSIGNEE_INDEX).table(Images).to_owned())
            .await?;

        Ok(())
    }
}
