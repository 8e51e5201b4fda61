use std::{convert::Infallible, sync::Arc};

use warp::{
    hyper::{body::Bytes, StatusCode},
    path, Filter, Rejection, Reply,
};

use crate::{
    auth::{Auth, AuthInternal},
    error::AuthError,
    types::Credential,
};

/// Build the full set of service routes: the health check on `/` plus the
/// register and login endpoints under `/auth`. Every route accepts any method.
///
/// Errors are turned into responses by [`handle_auth_errors`].
pub fn build_api_route_filter(
    auth: &Auth,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let health = warp::path::end().map(warp::reply);

    let register = path!("auth" / "register")
        .and(credential_body())
        .and(with_auth_state(auth.internal.clone()))
        .and_then(user_register);

    let login = path!("auth" / "login")
        .and(credential_body())
        .and(with_auth_state(auth.internal.clone()))
        .and_then(user_login);

    health.or(register).or(login)
}

pub async fn handle_auth_errors(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(auth_error) = err.find::<AuthError>() {
        let (status, message) = match &auth_error {
            AuthError::MalformedBody { .. } => (StatusCode::BAD_REQUEST, auth_error.to_string()),
            AuthError::LoginFailed => (StatusCode::BAD_REQUEST, String::new()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, String::new()),
        };
        return Ok(warp::reply::with_status(message, status));
    }

    Err(err)
}

async fn user_register(
    input: Credential,
    auth: Arc<AuthInternal>,
) -> Result<impl Reply, Rejection> {
    let (username, password) = input.into_parts();

    auth.register(&username, &password).await?;

    Ok(warp::reply())
}

async fn user_login(input: Credential, auth: Arc<AuthInternal>) -> Result<impl Reply, Rejection> {
    let (username, password) = input.into_parts();

    let token = auth.login(&username, &password).await?;

    Ok(token)
}

// Read the whole body and decode it ourselves, so decoding errors carry the
// decoder's message and no content-type is required.
fn credential_body() -> impl Filter<Extract = (Credential,), Error = Rejection> + Clone {
    warp::body::bytes().and_then(|body: Bytes| async move {
        serde_json::from_slice::<Credential>(&body)
            .map_err(|source| warp::reject::custom(AuthError::MalformedBody { source }))
    })
}

// functor that adds a reference to the internal auth state into the filter chain
fn with_auth_state(
    auth: Arc<AuthInternal>,
) -> impl Filter<Extract = (Arc<AuthInternal>,), Error = Infallible> + Clone {
    warp::any().map(move || auth.clone())
}
