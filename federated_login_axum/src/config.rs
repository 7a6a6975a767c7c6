use std::sync::LazyLock;

/// Where the browser goes after `{FL_ROUTE_PREFIX}/logout`
///
/// Default: "/"
pub static FL_REDIRECT_AFTER_LOGOUT: LazyLock<String> = LazyLock::new(|| {
    std::env::var("FL_REDIRECT_AFTER_LOGOUT").unwrap_or_else(|_| "/".to_string())
});

/// Where unauthenticated GET requests for protected pages are sent
///
/// Default: "{FL_ROUTE_PREFIX}/login"
pub(crate) static FL_REDIRECT_ANON: LazyLock<String> = LazyLock::new(|| {
    std::env::var("FL_REDIRECT_ANON")
        .unwrap_or_else(|_| format!("{}/login", federated_login::FL_ROUTE_PREFIX.as_str()))
});
