use askama::Template;
use axum::{http::StatusCode, response::Html};

use federated_login_axum::{AuthUser, FL_ROUTE_PREFIX};

#[derive(Template)]
#[template(path = "index_user.html")]
struct IndexTemplateUser<'a> {
    label: &'a str,
    auth_route_prefix: &'a str,
}

#[derive(Template)]
#[template(path = "index_anon.html")]
struct IndexTemplateAnon<'a> {
    auth_route_prefix: &'a str,
}

#[derive(Template)]
#[template(path = "protected.html")]
struct ProtectedTemplate<'a> {
    user: AuthUser,
    auth_route_prefix: &'a str,
}

#[derive(Template)]
#[template(path = "native_login.html")]
struct NativeLoginTemplate<'a> {
    auth_route_prefix: &'a str,
}

fn render(template: &impl Template) -> Result<Html<String>, (StatusCode, String)> {
    template
        .render()
        .map(Html)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

pub(crate) async fn index(user: Option<AuthUser>) -> Result<Html<String>, (StatusCode, String)> {
    let auth_route_prefix = FL_ROUTE_PREFIX.as_str();
    match user {
        Some(user) => render(&IndexTemplateUser {
            label: &user.label,
            auth_route_prefix,
        }),
        None => render(&IndexTemplateAnon { auth_route_prefix }),
    }
}

pub(crate) async fn protected(user: AuthUser) -> Result<Html<String>, (StatusCode, String)> {
    tracing::trace!("Rendering protected page for {}", user.username);
    render(&ProtectedTemplate {
        user,
        auth_route_prefix: FL_ROUTE_PREFIX.as_str(),
    })
}

pub(crate) async fn native_login() -> Result<Html<String>, (StatusCode, String)> {
    render(&NativeLoginTemplate {
        auth_route_prefix: FL_ROUTE_PREFIX.as_str(),
    })
}
