use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Torrents::Table)
                    .if_not_exists()
                    .col(string(Torrents::InfoHash).primary_key())
                    .col(string(Torrents::Provider))
                    .col(string(Torrents::Title))
                    .col(big_integer(Torrents::Size))
                    .col(string(Torrents::Type))
                    .col(string(Torrents::UploadDate))
                    .col(integer_null(Torrents::Seeders))
                    .col(text(Torrents::Trackers))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Files::Table)
                    .if_not_exists()
                    .col(pk_auto(Files::Id))
                    .col(string(Files::InfoHash))
                    .col(integer(Files::FileIndex))
                    .col(string(Files::Title))
                    .col(big_integer(Files::Size))
                    .col(string(Files::ImdbId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_files_torrents_info_hash")
                            .from(Files::Table, Files::InfoHash)
                            .to(Torrents::Table, Torrents::InfoHash)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_files_info_hash_file_index")
                    .table(Files::Table)
                    .col(Files::InfoHash)
                    .col(Files::FileIndex)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_files_imdb_id")
                    .table(Files::Table)
                    .col(Files::ImdbId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Files::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Torrents::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Torrents {
    Table,
    #[sea_orm(iden = "infoHash")]
    InfoHash,
    Provider,
    Title,
    Size,
    Type,
    #[sea_orm(iden = "uploadDate")]
    UploadDate,
    Seeders,
    Trackers,
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
    #[sea_orm(iden = "infoHash")]
    InfoHash,
    #[sea_orm(iden = "fileIndex")]
    FileIndex,
    Title,
    Size,
    #[sea_orm(iden = "imdbId")]
    ImdbId,
}
