use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite only auto-increments an `INTEGER PRIMARY KEY`, which is 64-bit anyway
        let mut id = ColumnDef::new(Urls::Id);
        if manager.get_database_backend() == DatabaseBackend::Sqlite {
            id.integer();
        } else {
            id.big_integer();
        }

        manager
            .create_table(
                Table::create()
                    .table(Urls::Table)
                    .if_not_exists()
                    .col(id.not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Urls::OriginalUrl).text().not_null())
                    .col(ColumnDef::new(Urls::ShortKey).string_len(crate::SHORT_KEY_MAX_LEN).null())
                    .col(
                        ColumnDef::new(Urls::Clicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Urls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一索引同时承担按 key 查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_urls_short_key")
                    .table(Urls::Table)
                    .col(Urls::ShortKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_urls_short_key").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Urls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Urls {
    Table,
    Id,
    OriginalUrl,
    ShortKey,
    Clicks,
    CreatedAt,
}
