use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};

use std::sync::Arc;

use crate::{auth, expenses, goals, me, users};
use engine::{AccessContext, Engine};

static USER_ID_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-user-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// `TypedHeader` for the caller identity.
///
/// Authenticated requests carry the user id returned by login in the
/// "X-User-Id" header.
#[derive(Debug)]
struct XUserId(String);

impl Header for XUserId {
    fn name() -> &'static axum::http::HeaderName {
        &USER_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };

        Ok(XUserId(value.trim().to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-user-id header"),
        }
    }
}

/// Build the per-request `AccessContext`.
///
/// A missing header yields an anonymous context; each operation decides
/// whether it needs an identity. The context lives in the request extensions
/// and is dropped with the request.
async fn identity(
    user_header: Option<TypedHeader<XUserId>>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut ctx = AccessContext::anonymous();
    if let Some(TypedHeader(XUserId(user_id))) = user_header {
        ctx.set_current_user(user_id);
    }

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/user", get(me::user))
        .route("/api/expenses", get(me::expenses).post(me::expense_new))
        .route("/api/goals", get(me::goals).post(me::goal_new))
        .route("/users", get(users::list).post(users::user_new))
        .route(
            "/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route("/expenses", get(expenses::list).post(expenses::expense_new))
        .route(
            "/expenses/{id}",
            get(expenses::get)
                .put(expenses::update)
                .delete(expenses::delete),
        )
        .route(
            "/expenses/user/{user_id}",
            get(expenses::list_for_user).delete(expenses::delete_for_user),
        )
        .route("/expenses/user/{user_id}/total", get(expenses::total_for_user))
        .route("/expenses/goal/{goal_id}", get(expenses::list_for_goal))
        .route("/expenses/goal/{goal_id}/total", get(expenses::total_for_goal))
        .route("/goals", get(goals::list).post(goals::goal_new))
        .route(
            "/goals/{id}",
            get(goals::get).put(goals::update).delete(goals::delete),
        )
        .route("/goals/{id}/progress", put(goals::progress))
        .route("/goals/{id}/sync", put(goals::sync))
        .route(
            "/goals/user/{user_id}",
            get(goals::list_for_user).delete(goals::delete_for_user),
        )
        .route("/goals/user/{user_id}/active", get(goals::active))
        .route("/goals/user/{user_id}/analytics", get(goals::analytics))
        .route("/goals/user/{user_id}/progress", put(goals::progress_for_user))
        .route_layer(middleware::from_fn(identity))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
