//! Wishlist API endpoints

use api_types::wishlist::{WishlistNew, WishlistUpdate, WishlistView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{User, WishlistCmd, WishlistPatch};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    Extension(_user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<WishlistView>>, ServerError> {
    let wishlists = state.engine.wishlists().await?;
    Ok(Json(wishlists.into_iter().map(views::wishlist).collect()))
}

/// Handle requests for creating a wishlist owned by the caller.
pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<WishlistNew>,
) -> Result<(StatusCode, Json<WishlistView>), ServerError> {
    let cmd = WishlistCmd {
        name: payload.name,
        description: payload.description,
        image: payload.image,
        items: payload.items_id,
    };
    let wishlist = state.engine.new_wishlist(cmd, user.id).await?;

    Ok((StatusCode::CREATED, Json(views::wishlist(wishlist))))
}

pub async fn get(
    Extension(_user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WishlistView>, ServerError> {
    Ok(Json(views::wishlist(state.engine.wishlist(id).await?)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WishlistUpdate>,
) -> Result<Json<WishlistView>, ServerError> {
    let patch = WishlistPatch {
        name: payload.name,
        description: payload.description,
        image: payload.image,
        items: payload.items_id,
    };
    let wishlist = state.engine.update_wishlist(id, patch, user.id).await?;

    Ok(Json(views::wishlist(wishlist)))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WishlistView>, ServerError> {
    let wishlist = state.engine.remove_wishlist(id, user.id).await?;
    Ok(Json(views::wishlist(wishlist)))
}
