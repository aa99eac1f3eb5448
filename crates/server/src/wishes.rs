//! Wish API endpoints

use api_types::wish::{WishNew, WishUpdate, WishView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{EngineError, MoneyCents, User, WishCmd, WishPatch};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

/// Handle requests for creating a new wish owned by the caller.
pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<WishNew>,
) -> Result<(StatusCode, Json<WishView>), ServerError> {
    let cmd = WishCmd {
        name: payload.name,
        price: MoneyCents::new(payload.price_minor),
        link: payload.link,
        image: payload.image,
        description: payload.description,
    };
    let wish = state.engine.new_wish(cmd, user.id).await?;

    Ok((StatusCode::CREATED, Json(views::wish(wish))))
}

pub async fn last(
    Extension(_user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<WishView>>, ServerError> {
    Ok(Json(views::wishes(state.engine.last_wishes().await?)))
}

pub async fn top(
    Extension(_user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<WishView>>, ServerError> {
    Ok(Json(views::wishes(state.engine.top_wishes().await?)))
}

pub async fn get(
    Extension(_user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WishView>, ServerError> {
    Ok(Json(views::wish(state.engine.wish(id).await?)))
}

/// Handle partial updates of a wish. The raised amount cannot be edited.
pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WishUpdate>,
) -> Result<Json<WishView>, ServerError> {
    if payload.raised_minor.is_some() {
        return Err(EngineError::Forbidden("raised amount cannot be edited".to_string()).into());
    }

    let patch = WishPatch {
        name: payload.name,
        price: payload.price_minor.map(MoneyCents::new),
        link: payload.link,
        image: payload.image,
        description: payload.description,
    };
    let wish = state.engine.update_wish(id, patch, user.id).await?;

    Ok(Json(views::wish(wish)))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WishView>, ServerError> {
    let wish = state.engine.remove_wish(id, user.id).await?;
    Ok(Json(views::wish(wish)))
}

/// Copy a wish into the caller's own wishes.
pub async fn copy(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<WishView>), ServerError> {
    let wish = state.engine.copy_wish(id, user.id).await?;
    Ok((StatusCode::CREATED, Json(views::wish(wish))))
}
