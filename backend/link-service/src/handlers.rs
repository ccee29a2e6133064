//! HTTP endpoints

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};

use crate::config::GraphQLConfig;
use crate::context::RequestContext;
use crate::db::Store;
use crate::middleware::Viewer;
use crate::schema::{prepare_request, AppSchema};

/// Execute one GraphQL operation for the viewer resolved by `BearerAuth`
pub async fn graphql_handler(
    schema: web::Data<AppSchema>,
    store: web::Data<dyn Store>,
    http_req: HttpRequest,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let viewer = http_req
        .extensions()
        .get::<Viewer>()
        .copied()
        .unwrap_or_default();

    let context = RequestContext::new(store.into_inner(), viewer.user_id);
    schema
        .execute(prepare_request(req.into_inner(), context))
        .await
        .into()
}

/// SDL endpoint for client code generation
pub async fn schema_handler(schema: web::Data<AppSchema>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(schema.sdl())
}

pub async fn playground_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}

pub async fn health_handler() -> &'static str {
    "ok"
}

/// Register routes
///
/// The SDL export follows the introspection switch and the playground is
/// only mounted when enabled.
pub fn configure(cfg: &mut web::ServiceConfig, graphql: &GraphQLConfig) {
    cfg.route("/graphql", web::post().to(graphql_handler))
        .route("/health", web::get().to(health_handler));

    if graphql.introspection {
        cfg.route("/graphql/schema", web::get().to(schema_handler));
    }
    if graphql.playground {
        cfg.route("/playground", web::get().to(playground_handler));
    }
}
