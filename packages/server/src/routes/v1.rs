use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/resources", public_routes())
        .nest("/admin", admin_routes())
}

fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::public::get_resource))
        .routes(routes!(handlers::public::unlock_resource))
}

// No authentication layer; deploy behind something that restricts /admin.
fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::list_resources))
        .routes(routes!(handlers::admin::delete_resource))
        .routes(routes!(handlers::admin::update_entry))
        .routes(routes!(handlers::link::create_link))
        .routes(routes!(handlers::link::update_link))
        .routes(routes!(handlers::file::create_file))
        .routes(routes!(handlers::file::complete_upload))
}
