//! Maps a parsed [`RequestDescriptor`] onto concrete HTTP types.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Method;
use url::Url;

use crate::relay::command::RequestDescriptor;
use crate::relay::error::RelayError;

/// A fully validated outbound request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// Build the outbound request. `fallback_user_agent` is only used when the
/// command did not set a User-Agent of its own.
pub fn build_request(
    descriptor: &RequestDescriptor,
    fallback_user_agent: &str,
) -> Result<OutboundRequest, RelayError> {
    let method = Method::from_bytes(descriptor.method.as_bytes())
        .map_err(|_| RelayError::InvalidRequest(format!("invalid method '{}'", descriptor.method)))?;

    let url = Url::parse(&descriptor.url)
        .map_err(|e| RelayError::InvalidRequest(format!("invalid URL '{}': {}", descriptor.url, e)))?;

    let mut headers = HeaderMap::new();
    for (name, value) in descriptor.headers.iter() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| RelayError::InvalidRequest(format!("invalid header name '{}'", name)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| RelayError::InvalidRequest(format!("invalid value for header '{}'", name)))?;
        headers.insert(header_name, header_value);
    }

    if !headers.contains_key(USER_AGENT) {
        let agent = HeaderValue::from_str(fallback_user_agent)
            .map_err(|_| RelayError::InvalidRequest("invalid fallback User-Agent".to_string()))?;
        headers.insert(USER_AGENT, agent);
    }

    let body = descriptor.body.clone().filter(|body| !body.is_empty());

    Ok(OutboundRequest {
        method,
        url,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::command::parse_command;

    fn build(raw: &str) -> Result<OutboundRequest, RelayError> {
        build_request(&parse_command(raw, 30).unwrap(), "fallback/1.0")
    }

    #[test]
    fn test_headers_and_fallback_agent() {
        let request = build("curl https://x.io/path -H 'X-Test: 1'").unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url.as_str(), "https://x.io/path");
        assert_eq!(request.headers["x-test"], "1");
        assert_eq!(request.headers[USER_AGENT], "fallback/1.0");
        assert!(request.body.is_none());
    }

    #[test]
    fn test_explicit_agent_is_kept() {
        let request = build("curl https://x.io -A 'mine/2.0'").unwrap();
        assert_eq!(request.headers[USER_AGENT], "mine/2.0");
        assert_eq!(request.headers.get_all(USER_AGENT).iter().count(), 1);
    }

    #[test]
    fn test_body_and_extension_method() {
        let request = build("curl -X PROPFIND https://x.io -d 'a=1'").unwrap();
        assert_eq!(request.method.as_str(), "PROPFIND");
        assert_eq!(request.body.as_deref(), Some("a=1"));
    }

    #[test]
    fn test_invalid_tokens_are_rejected() {
        let err = build("curl -X 'G(ET' https://x.io").unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
        let err = build("curl https://x.io -H 'Bad Header: x'").unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
        let err = build("curl https://x.io -H 'X-Line: a\u{7f}b'").unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
    }
}
