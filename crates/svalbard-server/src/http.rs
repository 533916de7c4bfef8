//! HTTP surface
//!
//! Six form-encoded POST endpoints, one per coordinator call, plus a health
//! probe. Response bodies are plain text: the confirmation, the share value
//! for a retrieval, or the sanitized rejection message.

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Form, Router,
};
use serde::Deserialize;
use std::time::Duration;
use svalbard_core::{
    public_message, Confirmation, CustodyCoordinator, CustodyEffects, Operation, Rejection,
    ResponseClass, ShareRequest, ShareValue, SvalbardError, TokenRequest,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Body returned for malformed or mistyped form bodies.
pub const MALFORMED_FORM_MESSAGE: &str = "malformed form body";

/// Fields of a token request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenForm {
    request_id: String,
    owner_id_type: String,
    owner_id: String,
    secret_name: String,
}

impl From<TokenForm> for TokenRequest {
    fn from(form: TokenForm) -> Self {
        TokenRequest::new(
            form.request_id,
            form.owner_id_type,
            form.owner_id,
            form.secret_name,
        )
    }
}

/// Fields of a share request. Not `Debug`: carries the token and the value.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ShareForm {
    token: String,
    owner_id_type: String,
    owner_id: String,
    secret_name: String,
    share_value: Option<String>,
}

impl From<ShareForm> for ShareRequest {
    fn from(form: ShareForm) -> Self {
        let request = ShareRequest::new(
            form.token,
            form.owner_id_type,
            form.owner_id,
            form.secret_name,
        );
        match form.share_value {
            Some(value) => request.with_value(value),
            None => request,
        }
    }
}

/// HTTP status for a response class.
pub fn status_for(class: ResponseClass) -> StatusCode {
    match class {
        ResponseClass::BadRequest => StatusCode::BAD_REQUEST,
        ResponseClass::Forbidden => StatusCode::FORBIDDEN,
        ResponseClass::NotFound => StatusCode::NOT_FOUND,
        ResponseClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Routes without middleware.
pub fn router<E>(coordinator: CustodyCoordinator<E>) -> Router
where
    E: CustodyEffects + 'static,
{
    Router::new()
        .route("/get_storage_token", post_only(get_storage_token::<E>))
        .route("/store_share", post_only(store_share::<E>))
        .route("/get_retrieval_token", post_only(get_retrieval_token::<E>))
        .route("/retrieve_share", post_only(retrieve_share::<E>))
        .route("/get_deletion_token", post_only(get_deletion_token::<E>))
        .route("/delete_share", post_only(delete_share::<E>))
        .route("/health", get(health))
        .with_state(coordinator)
}

/// Routes wrapped with request tracing and a per-request deadline.
pub fn app<E>(coordinator: CustodyCoordinator<E>, request_timeout: Duration) -> Router
where
    E: CustodyEffects + 'static,
{
    router(coordinator)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

fn post_only<H, T, S>(handler: H) -> MethodRouter<S>
where
    H: axum::handler::Handler<T, S>,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    post(handler).fallback(expected_post)
}

async fn expected_post() -> Response {
    let err = SvalbardError::ExpectedPostRequest;
    (status_for(err.class()), public_message(&err).into_owned()).into_response()
}

async fn health() -> &'static str {
    "ok"
}

fn malformed(rejection: FormRejection) -> Response {
    tracing::debug!(error = %rejection, "malformed form body");
    (StatusCode::BAD_REQUEST, MALFORMED_FORM_MESSAGE).into_response()
}

fn rejected(rejection: Rejection) -> Response {
    (status_for(rejection.class), rejection.message).into_response()
}

fn confirmed(result: Result<Confirmation, Rejection>) -> Response {
    match result {
        Ok(confirmation) => (StatusCode::OK, confirmation.message).into_response(),
        Err(rejection) => rejected(rejection),
    }
}

async fn token_endpoint<E: CustodyEffects>(
    coordinator: CustodyCoordinator<E>,
    op: Operation,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Response {
    match form {
        Ok(Form(form)) => confirmed(coordinator.request_token(op, form.into()).await),
        Err(rejection) => malformed(rejection),
    }
}

async fn get_storage_token<E: CustodyEffects>(
    State(coordinator): State<CustodyCoordinator<E>>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Response {
    token_endpoint(coordinator, Operation::Store, form).await
}

async fn get_retrieval_token<E: CustodyEffects>(
    State(coordinator): State<CustodyCoordinator<E>>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Response {
    token_endpoint(coordinator, Operation::Retrieve, form).await
}

async fn get_deletion_token<E: CustodyEffects>(
    State(coordinator): State<CustodyCoordinator<E>>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Response {
    token_endpoint(coordinator, Operation::Delete, form).await
}

async fn store_share<E: CustodyEffects>(
    State(coordinator): State<CustodyCoordinator<E>>,
    form: Result<Form<ShareForm>, FormRejection>,
) -> Response {
    match form {
        Ok(Form(form)) => confirmed(coordinator.store_share(form.into()).await),
        Err(rejection) => malformed(rejection),
    }
}

async fn retrieve_share<E: CustodyEffects>(
    State(coordinator): State<CustodyCoordinator<E>>,
    form: Result<Form<ShareForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => return malformed(rejection),
    };
    match coordinator.retrieve_share(form.into()).await {
        Ok(value) => share_body(&value),
        Err(rejection) => rejected(rejection),
    }
}

async fn delete_share<E: CustodyEffects>(
    State(coordinator): State<CustodyCoordinator<E>>,
    form: Result<Form<ShareForm>, FormRejection>,
) -> Response {
    match form {
        Ok(Form(form)) => confirmed(coordinator.delete_share(form.into()).await),
        Err(rejection) => malformed(rejection),
    }
}

fn share_body(value: &ShareValue) -> Response {
    (StatusCode::OK, value.expose().to_owned()).into_response()
}
