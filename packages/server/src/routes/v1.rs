use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::health::health))
        .routes(routes!(handlers::catalog::get_source))
        .routes(routes!(handlers::catalog::get_object))
        .routes(routes!(handlers::catalog::cone_search))
        .routes(routes!(handlers::catalog::get_stats))
}
