//! Offer API endpoints

use api_types::offer::{OfferDetailView, OfferNew, OfferView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{MoneyCents, OfferCmd, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

/// Pledge money toward a wish on behalf of the authenticated user.
pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<OfferNew>,
) -> Result<(StatusCode, Json<OfferView>), ServerError> {
    let cmd = OfferCmd::new(
        payload.item_id,
        user.id,
        MoneyCents::new(payload.amount_minor),
    )
    .hidden(payload.hidden);
    let offer = state.engine.create_offer(cmd).await?;

    Ok((StatusCode::CREATED, Json(views::offer(offer))))
}

/// List the offers made by the authenticated user.
pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<OfferDetailView>>, ServerError> {
    let offers = state.engine.offers(user.id).await?;
    Ok(Json(offers.into_iter().map(views::offer_detail).collect()))
}

pub async fn get(
    Extension(_user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferDetailView>, ServerError> {
    let offer = state.engine.offer(id).await?;
    Ok(Json(views::offer_detail(offer)))
}
