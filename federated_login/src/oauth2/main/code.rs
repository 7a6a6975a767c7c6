use std::collections::HashMap;

/// Query parameter carrying the authorization code on the provider's redirect
pub const CODE_PARAM: &str = "code";

/// Pull the authorization code out of a request's query parameters
///
/// `None` means the request has nothing to do with a login callback. An empty
/// `code=` is treated the same way.
pub fn extract_authorization_code(params: &HashMap<String, String>) -> Option<&str> {
    params
        .get(CODE_PARAM)
        .map(String::as_str)
        .filter(|code| !code.is_empty())
}

/// Parse a raw query string into parameters; the first occurrence of a key wins
pub fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
    }
    params
}
