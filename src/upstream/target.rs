//! Target URL construction.

use url::Url;

use crate::upstream::TransportError;

/// Join a service base address with a request path.
///
/// The base path acts as a prefix: `http://h/api` + `/users?id=1` becomes
/// `http://h/api/users?id=1`. A query string in `path` is carried over.
/// Paths whose dot segments climb out of the base path are rejected.
pub fn join(base: &Url, path: &str) -> Result<Url, TransportError> {
    let (path, query) = match path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path, None),
    };

    let prefix = base.path().trim_end_matches('/');
    let suffix = path.trim_start_matches('/');

    let mut url = base.clone();
    url.set_path(&format!("{prefix}/{suffix}"));
    url.set_query(query.filter(|q| !q.is_empty()));
    url.set_fragment(None);

    if url.cannot_be_a_base() {
        return Err(TransportError::InvalidTarget(url.to_string()));
    }
    // Dot segments (plain or percent-encoded) are resolved by `set_path`;
    // the result must still sit under the base path.
    if !url.path().starts_with(&format!("{prefix}/")) {
        return Err(TransportError::InvalidTarget(format!(
            "{path} escapes base path {}",
            base.path()
        )));
    }
    Ok(url)
}
