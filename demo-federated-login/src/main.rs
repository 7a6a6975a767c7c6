use axum::{Router, middleware::from_fn_with_state, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use federated_login_axum::{
    FL_ROUTE_PREFIX, FederatedLogin, federated_login_callback, federated_login_router,
    native_login_guard,
};

mod handlers;
mod server;

use crate::{
    handlers::{index, native_login, protected},
    server::spawn_http_server,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=debug,federated_login=debug,federated_login_axum=debug",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let federated = FederatedLogin::from_env().await?;

    let app = Router::new()
        .route("/", get(index))
        .route("/protected", get(protected))
        .route(
            "/wp-login",
            get(native_login).route_layer(from_fn_with_state(federated.clone(), native_login_guard)),
        )
        .with_state(federated.clone())
        .nest(
            FL_ROUTE_PREFIX.as_str(),
            federated_login_router(federated.clone()),
        )
        .layer(from_fn_with_state(federated, federated_login_callback));

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    spawn_http_server(port, app).await?;
    Ok(())
}
