//! Navigation middleware.
//!
//! Runs in front of every page route: bootstraps the caller's `Session`,
//! asks the guard whether the navigation may proceed, and either issues a
//! `303 See Other` to the guard's target or continues with the `Session`
//! stored in request extensions.
//!
//! The session lives only in the request. Nothing is shared between
//! concurrent navigations.

use crate::guard::{NavigationDecision, RouteGuard};
use crate::observability::metrics::record_navigation_decision;
use crate::services::SessionBootstrapLoader;
use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use common::secret::SecretString;
use std::sync::Arc;
use tracing::instrument;

/// State for the navigation middleware.
#[derive(Clone)]
pub struct NavigationState {
    pub bootstrap_loader: SessionBootstrapLoader,
    pub guard: Arc<RouteGuard>,
    /// Cookie carrying the access token.
    pub cookie_name: String,
}

/// Extract the access token from the request.
///
/// The access-token cookie wins; an `Authorization: Bearer` header is
/// accepted as a fallback. Empty values count as absent.
pub fn extract_access_token(req: &Request, cookie_name: &str) -> Option<SecretString> {
    let from_cookie = req
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value);

    let token = from_cookie.or_else(|| {
        req.headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })?;

    Some(SecretString::from(token.to_string()))
}

/// Navigation guard middleware.
///
/// # Response
///
/// - `303 See Other` with `Location` set to the guard's target if the
///   navigation is not allowed
/// - Otherwise continues to the next handler with the `Session` in extensions
#[instrument(skip_all, name = "gate.middleware.navigation", fields(path = %req.uri().path()))]
pub async fn navigation_guard(
    State(state): State<Arc<NavigationState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = extract_access_token(&req, &state.cookie_name);
    let session = state.bootstrap_loader.bootstrap(token.as_ref()).await;

    let class = state.guard.classify(req.uri().path());
    let decision = state.guard.decide_classified(class, &session);

    match decision {
        NavigationDecision::Allow => {
            record_navigation_decision(class.as_str(), false);
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        NavigationDecision::RedirectTo(target) => {
            record_navigation_decision(class.as_str(), true);
            tracing::debug!(
                target: "gate.middleware.navigation",
                class = class.as_str(),
                signed_in = session.is_signed_in(),
                redirect_to = %target,
                "Navigation redirected"
            );
            Redirect::to(&target).into_response()
        }
    }
}
