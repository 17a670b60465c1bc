use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "infoHash")]
    pub info_hash: String,
    #[sea_orm(column_name = "fileIndex")]
    pub file_index: i32,
    pub title: String,
    pub size: i64,
    #[sea_orm(column_name = "imdbId")]
    pub movie_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::torrent::Entity",
        from = "Column::InfoHash",
        to = "super::torrent::Column::InfoHash",
        on_delete = "Cascade"
    )]
    Torrent,
}

impl Related<super::torrent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Torrent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
