//! Join table between wishlists and the wishes they collect.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "wishlist_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub wishlist_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub wish_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wishlists::Entity",
        from = "Column::WishlistId",
        to = "super::wishlists::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Wishlist,
    #[sea_orm(
        belongs_to = "super::wishes::Entity",
        from = "Column::WishId",
        to = "super::wishes::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Wish,
}

impl Related<super::wishlists::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wishlist.def()
    }
}

impl Related<super::wishes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wish.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
