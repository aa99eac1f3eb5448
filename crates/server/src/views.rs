//! Conversions from engine types to the JSON bodies of `api_types`.

use api_types::{
    offer::{OfferDetailView, OfferView},
    user::UserView,
    wish::WishView,
    wishlist::WishlistView,
};
use engine::{Offer, OfferDetail, User, Wish, Wishlist};

pub fn user(user: User) -> UserView {
    UserView {
        id: user.id,
        username: user.username,
        email: user.email,
        about: user.about,
        created_at: user.created_at,
    }
}

pub fn offer(offer: Offer) -> OfferView {
    OfferView {
        id: offer.id,
        user_id: offer.user_id,
        item_id: offer.item_id,
        amount_minor: offer.amount.cents(),
        hidden: offer.hidden,
        created_at: offer.created_at,
    }
}

pub fn offer_detail(detail: OfferDetail) -> OfferDetailView {
    OfferDetailView {
        offer: offer(detail.offer),
        user: user(detail.user),
        item: wish(detail.item),
    }
}

pub fn wish(wish: Wish) -> WishView {
    WishView {
        id: wish.id,
        owner: user(wish.owner),
        name: wish.name,
        link: wish.link,
        image: wish.image,
        price_minor: wish.price.cents(),
        raised_minor: wish.raised.cents(),
        copied: wish.copied,
        description: wish.description,
        created_at: wish.created_at,
        updated_at: wish.updated_at,
        offers: wish.offers.into_iter().map(offer).collect(),
    }
}

pub fn wishes(wishes: Vec<Wish>) -> Vec<WishView> {
    wishes.into_iter().map(wish).collect()
}

pub fn wishlist(wishlist: Wishlist) -> WishlistView {
    WishlistView {
        id: wishlist.id,
        owner: user(wishlist.owner),
        name: wishlist.name,
        description: wishlist.description,
        image: wishlist.image,
        items: wishes(wishlist.items),
        created_at: wishlist.created_at,
    }
}
