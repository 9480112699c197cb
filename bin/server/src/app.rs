//! HTTP routes of the osecure server.
//!
//! Every application route sits behind the session guard. The callback and
//! logout routes are left open.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use axum_extra::extract::PrivateCookieJar;
use osecure_permissions::{HasPermissionResponse, PermissionsResponse};

use crate::auth::{OAuthSession, auth_routes, secured};
use crate::error::PermissionQueryError;

/// Builds the application router.
pub fn router(session: OAuthSession) -> Router {
    let protected = Router::new()
        .route("/", get(home))
        .route("/permissions", get(list_permissions))
        .route("/permissions/{permission}", get(check_permission))
        .route(
            "/permissions/{permission}/remote",
            get(check_permission_remote),
        );

    secured(protected, session.clone())
        .merge(auth_routes(session.clone()))
        .with_state(session)
}

async fn home() -> &'static str {
    "authorized"
}

async fn list_permissions(
    State(session): State<OAuthSession>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<PermissionsResponse>), PermissionQueryError> {
    let (jar, permissions) = session.get_permissions(jar).await?;
    Ok((jar, Json(PermissionsResponse { permissions })))
}

async fn check_permission(
    State(session): State<OAuthSession>,
    Path(permission): Path<String>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<HasPermissionResponse>), PermissionQueryError> {
    let (jar, has_permission) = session.has_permission(jar, &permission).await?;
    Ok((jar, Json(HasPermissionResponse { has_permission })))
}

async fn check_permission_remote(
    State(session): State<OAuthSession>,
    Path(permission): Path<String>,
    jar: PrivateCookieJar,
) -> Result<Json<HasPermissionResponse>, PermissionQueryError> {
    let has_permission = session.check_permission_remote(&jar, &permission).await?;
    Ok(Json(HasPermissionResponse { has_permission }))
}
