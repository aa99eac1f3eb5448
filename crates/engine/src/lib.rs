//! Business core of the wishlist service.
//!
//! The [`Engine`] owns the database handle and exposes every operation on
//! users, wishes, offers and wishlists. Write paths run inside a single
//! database transaction: either every mutation of the operation commits, or
//! none does.

pub use commands::{OfferCmd, UserCmd, WishCmd, WishPatch, WishlistCmd, WishlistPatch};
pub use error::EngineError;
pub use money::MoneyCents;
pub use offers::{Offer, OfferDetail};
pub use ops::{Engine, EngineBuilder, LAST_WISHES_LIMIT, TOP_WISHES_LIMIT};
pub use users::User;
pub use wishes::Wish;
pub use wishlists::Wishlist;

mod commands;
mod error;
mod money;
mod ops;
mod util;

// Table entities are public for callers that need direct row access
// (authentication, administration).
pub mod offers;
pub mod users;
pub mod wishes;
pub mod wishlist_items;
pub mod wishlists;

pub type ResultEngine<T> = Result<T, EngineError>;
