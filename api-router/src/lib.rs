use api_state::ApiState;
use axum::{
    extract::FromRef,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use middleware_api_auth::api_auth;
use routes::{
    ask::ask,
    histories::{create_history, delete_history, get_history, list_histories},
    liveness::live,
    readiness::ready,
};

pub mod api_state;
pub mod error;
mod middleware_api_auth;
mod routes;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Public, unauthenticated endpoints (for k8s/systemd probes)
    let public = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live));

    // Protected API endpoints (require auth)
    let protected = Router::new()
        .route("/chat/ask", post(ask))
        .route("/chat/histories", get(list_histories).post(create_history))
        .route(
            "/chat/histories/{id}",
            get(get_history).delete(delete_history),
        )
        .route_layer(from_fn_with_state(app_state.clone(), api_auth));

    public.merge(protected)
}
