use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 presence_entries 表
        manager
            .create_table(
                Table::create()
                    .table(PresenceEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PresenceEntry::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PresenceEntry::Day).date().not_null())
                    .col(
                        ColumnDef::new(PresenceEntry::Hour)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PresenceEntry::PresentPercentage)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PresenceEntry::Notes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(PresenceEntry::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PresenceEntry::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // (day, hour) 唯一索引，upsert 依赖它做冲突检测
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_presence_day_hour")
                    .table(PresenceEntry::Table)
                    .col(PresenceEntry::Day)
                    .col(PresenceEntry::Hour)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_presence_day_hour").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PresenceEntry::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PresenceEntry {
    #[sea_orm(iden = "presence_entries")]
    Table,
    Id,
    Day,
    Hour,
    PresentPercentage,
    Notes,
    CreatedAt,
    UpdatedAt,
}
