//! Authorization guard middleware for Axum.

use axum::{
    Router,
    extract::{OriginalUri, Request, State},
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::OAuthSession;

/// Lets the request through if it carries an unexpired session, otherwise
/// redirects to the provider's authorization page.
///
/// The full original path and query are sent along so the callback can
/// return the user to where they started.
pub async fn require_session(
    State(session): State<OAuthSession>,
    request: Request,
    next: Next,
) -> Response {
    let jar = session.store().jar(request.headers());
    if session.is_authorized(&jar) {
        return next.run(request).await;
    }

    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().clone(), |original| original.0.clone());
    let return_to = uri.path_and_query().map_or("/", |pq| pq.as_str());

    debug!(return_to, "no valid session, starting authorization");
    session.start_oauth(return_to).into_response()
}

/// Puts every route in `router` behind [`require_session`].
///
/// Routes added to the router afterwards are not guarded.
pub fn secured<S>(router: Router<S>, session: OAuthSession) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(from_fn_with_state(session, require_session))
}
