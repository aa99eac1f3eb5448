//! Endpoints about the authenticated user.

use api_types::{user::UserView, wish::WishView};
use axum::{Extension, Json, extract::State};
use engine::User;

use crate::{ServerError, server::ServerState, views};

/// Return the authenticated user.
pub async fn me(Extension(user): Extension<User>) -> Json<UserView> {
    Json(views::user(user))
}

/// List the wishes of the authenticated user.
pub async fn my_wishes(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<WishView>>, ServerError> {
    let wishes = state.engine.wishes_by_owner(user.id).await?;
    Ok(Json(views::wishes(wishes)))
}
