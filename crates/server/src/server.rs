use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{offers, user, wishes, wishlists};
use engine::{Engine, User, users};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Basic authentication against the `users` table.
///
/// On success the authenticated [`User`] is stored in the request extensions
/// for the handlers.
async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let model = users::Entity::find()
        .filter(users::Column::Username.eq(auth_header.username()))
        .filter(users::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to look up user: {err}");
            StatusCode::UNAUTHORIZED
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user = User::try_from(model).map_err(|err| {
        tracing::error!("failed to load user: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Build the application router. Every route requires Basic auth.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/users/me", get(user::me))
        .route("/users/me/wishes", get(user::my_wishes))
        .route("/offers", post(offers::create).get(offers::list))
        .route("/offers/{id}", get(offers::get))
        .route("/wishes", post(wishes::create))
        .route("/wishes/last", get(wishes::last))
        .route("/wishes/top", get(wishes::top))
        .route(
            "/wishes/{id}",
            get(wishes::get).patch(wishes::update).delete(wishes::remove),
        )
        .route("/wishes/{id}/copy", post(wishes::copy))
        .route("/wishlists", get(wishlists::list).post(wishlists::create))
        .route(
            "/wishlists/{id}",
            get(wishlists::get)
                .patch(wishlists::update)
                .delete(wishlists::remove),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}
