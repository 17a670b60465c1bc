use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "torrents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "infoHash")]
    pub info_hash: String,
    pub provider: String,
    pub title: String,
    pub size: i64,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    #[sea_orm(column_name = "uploadDate")]
    pub upload_date: String,
    pub seeders: Option<i32>,
    pub trackers: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::file::Entity")]
    File,
}

impl Related<super::file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::File.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
