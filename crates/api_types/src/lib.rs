use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub username: String,
        pub email: String,
        pub about: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod offer {
    use super::*;

    use crate::{user::UserView, wish::WishView};

    /// Request body for pledging money toward a wish.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct OfferNew {
        pub item_id: Uuid,
        /// Must be > 0.
        pub amount_minor: i64,
        /// Hide the payer's name from the wish's audience. Defaults to `false`.
        #[serde(default)]
        pub hidden: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OfferView {
        pub id: Uuid,
        pub user_id: Uuid,
        pub item_id: Uuid,
        pub amount_minor: i64,
        pub hidden: bool,
        pub created_at: DateTime<Utc>,
    }

    /// An offer with its payer and the wish it funds.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct OfferDetailView {
        #[serde(flatten)]
        pub offer: OfferView,
        pub user: UserView,
        pub item: WishView,
    }
}

pub mod wish {
    use super::*;

    use crate::{offer::OfferView, user::UserView};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WishNew {
        pub name: String,
        /// Must be >= 0.
        pub price_minor: i64,
        pub link: Option<String>,
        pub image: Option<String>,
        pub description: Option<String>,
    }

    /// Partial update of a wish. Absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WishUpdate {
        pub name: Option<String>,
        pub price_minor: Option<i64>,
        pub link: Option<String>,
        pub image: Option<String>,
        pub description: Option<String>,
        /// Never accepted: the raised amount only moves through offers. The
        /// field exists so the server can reject requests that carry it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub raised_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WishView {
        pub id: Uuid,
        pub owner: UserView,
        pub name: String,
        pub link: Option<String>,
        pub image: Option<String>,
        pub price_minor: i64,
        pub raised_minor: i64,
        pub copied: i32,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        /// Only filled when a single wish is requested.
        #[serde(default)]
        pub offers: Vec<OfferView>,
    }
}

pub mod wishlist {
    use super::*;

    use crate::{user::UserView, wish::WishView};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WishlistNew {
        pub name: String,
        pub description: Option<String>,
        pub image: Option<String>,
        /// Wishes to collect. Every id must exist.
        #[serde(default)]
        pub items_id: Vec<Uuid>,
    }

    /// Partial update of a wishlist. `items_id`, when present, replaces the
    /// whole collection.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WishlistUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
        pub image: Option<String>,
        pub items_id: Option<Vec<Uuid>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WishlistView {
        pub id: Uuid,
        pub owner: UserView,
        pub name: String,
        pub description: Option<String>,
        pub image: Option<String>,
        pub items: Vec<WishView>,
        pub created_at: DateTime<Utc>,
    }
}
