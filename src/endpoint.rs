use url::form_urlencoded;

use crate::{NetworkError, Result};

/// Combines a base URL, an endpoint and query parameters into a final URL.
///
/// Absolute endpoints (`http://` or `https://`) ignore `base`. Relative
/// endpoints are joined to `base` with exactly one `/` between them, however
/// many trailing slashes `base` or leading slashes `endpoint` carry.
///
/// Example: `("https://api.test/", "users", [("page", "2")])` →
/// `"https://api.test/users?page=2"`
pub fn build_url(base: &str, endpoint: &str, params: Option<&[(String, String)]>) -> Result<String> {
    if base.is_empty() && endpoint.is_empty() {
        return Err(NetworkError::configuration(
            "URL is required. Set a base URL or provide an absolute endpoint.",
        ));
    }

    let query = params
        .filter(|params| !params.is_empty())
        .map(encode_query);

    if is_absolute(endpoint) {
        return Ok(match query {
            Some(query) => {
                let separator = if endpoint.contains('?') { '&' } else { '?' };
                format!("{endpoint}{separator}{query}")
            }
            None => endpoint.to_owned(),
        });
    }

    let base = base.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    let mut url = format!("{base}/{endpoint}");

    if let Some(query) = query {
        url.push('?');
        url.push_str(&query);
    }
    Ok(url)
}

fn is_absolute(endpoint: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        endpoint
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

fn encode_query(params: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
