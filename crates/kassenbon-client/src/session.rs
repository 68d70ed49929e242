//! Portal session from an exported browser cookie file.
//!
//! The portal's login flow (captcha, app-link redirects) is not automated
//! here. Instead the user logs in once in a browser and exports the cookies
//! as JSON; this module turns that export into the `Cookie` header value the
//! API accepts. Both common export shapes are supported: a bare array of
//! cookie objects and a `{"cookies": [...]}` wrapper.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ClientError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CookieExport {
    List(Vec<BrowserCookie>),
    Wrapper { cookies: Vec<BrowserCookie> },
}

/// One exported browser cookie. Extra fields (path, expiry, flags) are
/// ignored.
#[derive(Debug, Deserialize)]
struct BrowserCookie {
    name: String,
    value: String,
    #[serde(default)]
    domain: String,
}

/// Reads a browser cookie export and builds the `Cookie` header value from
/// the cookies whose domain contains `domain_filter`.
///
/// # Errors
///
/// - [`ClientError::CookieFileRead`] if the file cannot be read.
/// - [`ClientError::CookieFileFormat`] if it is not a recognized export.
/// - [`ClientError::NoCookiesForDomain`] if no cookie matches the filter —
///   usually a stale export or the wrong file.
pub fn load_cookie_header(path: &Path, domain_filter: &str) -> Result<String, ClientError> {
    let raw = fs::read_to_string(path).map_err(|source| ClientError::CookieFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let export: CookieExport =
        serde_json::from_str(&raw).map_err(|source| ClientError::CookieFileFormat {
            path: path.to_path_buf(),
            source,
        })?;
    let cookies = match export {
        CookieExport::List(cookies) | CookieExport::Wrapper { cookies } => cookies,
    };

    let header = cookies
        .iter()
        .filter(|c| c.domain.contains(domain_filter))
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ");

    if header.is_empty() {
        return Err(ClientError::NoCookiesForDomain {
            path: path.to_path_buf(),
            domain: domain_filter.to_string(),
        });
    }
    tracing::debug!(
        path = %path.display(),
        count = cookies.iter().filter(|c| c.domain.contains(domain_filter)).count(),
        "loaded portal session cookies"
    );
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cookie_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn builds_header_from_bare_array_export() {
        let file = cookie_file(
            r#"[
                {"name":"SESSION","value":"abc","domain":".lidl.de"},
                {"name":"tracking","value":"x","domain":".doubleclick.net"},
                {"name":"token","value":"123","domain":"www.lidl.de"}
            ]"#,
        );
        let header = load_cookie_header(file.path(), "lidl").unwrap();
        assert_eq!(header, "SESSION=abc; token=123");
    }

    #[test]
    fn builds_header_from_wrapped_export() {
        let file =
            cookie_file(r#"{"cookies":[{"name":"SESSION","value":"abc","domain":".lidl.de"}]}"#);
        let header = load_cookie_header(file.path(), "lidl").unwrap();
        assert_eq!(header, "SESSION=abc");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_cookie_header(Path::new("/nonexistent/cookies.json"), "lidl").unwrap_err();
        assert!(matches!(err, ClientError::CookieFileRead { .. }));
    }

    #[test]
    fn malformed_json_is_a_format_error() {
        let file = cookie_file("not json");
        let err = load_cookie_header(file.path(), "lidl").unwrap_err();
        assert!(matches!(err, ClientError::CookieFileFormat { .. }));
    }

    #[test]
    fn no_matching_domain_is_an_error() {
        let file = cookie_file(r#"[{"name":"x","value":"y","domain":".example.com"}]"#);
        let err = load_cookie_header(file.path(), "lidl").unwrap_err();
        assert!(matches!(err, ClientError::NoCookiesForDomain { .. }));
    }
}
