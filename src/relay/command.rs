//! Curl command parsing.
//!
//! A raw command string goes through a fixed pipeline of extractors, each of
//! which reads the normalized command and fills in part of a
//! [`RequestDescriptor`]:
//!
//! ```text
//! method → url → headers → body → body defaults → flags
//! ```
//!
//! Earlier extractors win: later steps never overwrite what a more specific
//! match already set, except where curl itself lets a later flag override
//! (`--json`, `-A`, `-u` set their headers unconditionally).

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD as Base64;
use base64::Engine as _;
use regex::Regex;

use crate::relay::error::RelayError;

pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Case-preserving header list with case-insensitive, last-write-wins keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList(Vec<(String, String)>);

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header. Replacing keeps the newest spelling.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(entry) => *entry = (name, value),
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Structured form of a curl invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: String,
    pub headers: HeaderList,
    pub body: Option<String>,
    pub insecure_tls: bool,
    pub timeout_secs: u64,
    pub follow_redirects: bool,
    pub basic_auth: Option<String>,
}

impl RequestDescriptor {
    fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            url: String::new(),
            headers: HeaderList::new(),
            body: None,
            insecure_tls: false,
            timeout_secs,
            follow_redirects: false,
            basic_auth: None,
        }
    }
}

type Extractor = fn(&str, &mut RequestDescriptor) -> Result<(), RelayError>;

/// Extraction pipeline, in precedence order.
const EXTRACTORS: &[Extractor] = &[
    extract_method,
    extract_url,
    extract_headers,
    extract_body,
    apply_body_defaults,
    extract_flags,
];

/// Parse a raw curl command. `default_timeout_secs` applies when the
/// command carries no usable `--connect-timeout`.
pub fn parse_command(raw: &str, default_timeout_secs: u64) -> Result<RequestDescriptor, RelayError> {
    let command = normalize(raw);
    if !command.starts_with("curl ") {
        return Err(RelayError::InvalidCommand);
    }

    let mut descriptor = RequestDescriptor::with_timeout(default_timeout_secs);
    for extract in EXTRACTORS {
        extract(&command, &mut descriptor)?;
    }
    Ok(descriptor)
}

/// Fold shell line continuations into plain spaces.
pub fn normalize(raw: &str) -> String {
    raw.replace("\\\r\n", " ").replace("\\\n", " ")
}

/// Split a command into POSIX shell words. A command the shell grammar
/// rejects (an unterminated quote, say) falls back to whitespace splitting.
pub fn tokenize(command: &str) -> Vec<String> {
    shlex::split(command)
        .unwrap_or_else(|| command.split_whitespace().map(str::to_string).collect())
}

fn regex(pattern: &str) -> Regex {
    // Patterns are compile-time literals covered by the tests below.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| regex(r#"(?:^|\s)(?:-X|--request)\s+(\S+)"#));
static HTTP_URL_RE: LazyLock<Regex> = LazyLock::new(|| regex(r#"https?://[^\s'"]+"#));
static QUOTED_URL_RE: LazyLock<Regex> = LazyLock::new(|| regex(r#"curl\s+['"]([^'"]+)['"]"#));
static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| regex(r"^[A-Za-z][A-Za-z0-9+.\-]*://"));
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r#"(?:^|\s)(?:-H|--header)\s+(?:'([^']+)'|"([^"]+)")"#));

/// Body flags in precedence order. The bool marks `--json`.
static BODY_RES: LazyLock<Vec<(Regex, bool)>> = LazyLock::new(|| {
    // Single quotes are literal up to the next quote, trailing backslash included.
    let single = r#"'([^']*)'"#;
    let double = r#""((?:[^"\\]|\\.)*)""#;
    let mut patterns = Vec::new();
    for (flags, is_json) in [
        ("--data-raw", false),
        ("--data-binary|--data|-d", false),
        ("--json", true),
    ] {
        for quoted in [single, double] {
            let pattern = format!(r"(?:^|\s)(?:{})\s+{}", flags, quoted);
            patterns.push((regex(&pattern), is_json));
        }
    }
    patterns
});

/// Flags whose following word is an argument, never the URL.
const FLAGS_WITH_ARGUMENT: &[&str] = &[
    "-X", "--request", "-H", "--header", "-d", "--data", "--data-raw", "--data-binary",
    "--json", "-A", "--user-agent", "-u", "--user", "--connect-timeout",
];

/// Short boolean flags that may be clustered, as in `-sSkL`.
const CLUSTERABLE_FLAGS: &str = "sSkLvfiIg";

fn method_token(command: &str) -> Option<String> {
    METHOD_RE.captures(command).map(|caps| {
        caps[1].trim_matches(|c: char| c == '\'' || c == '"').to_string()
    })
}

fn extract_method(command: &str, descriptor: &mut RequestDescriptor) -> Result<(), RelayError> {
    if let Some(method) = method_token(command).filter(|m| !m.is_empty()) {
        descriptor.method = method;
    }
    Ok(())
}

fn extract_url(command: &str, descriptor: &mut RequestDescriptor) -> Result<(), RelayError> {
    let url = if let Some(found) = HTTP_URL_RE.find(command) {
        found.as_str().to_string()
    } else if let Some(caps) = QUOTED_URL_RE.captures(command) {
        caps[1].to_string()
    } else {
        let tokens = tokenize(command);
        tokens
            .iter()
            .enumerate()
            .skip(1)
            .find(|(i, token)| {
                !token.is_empty()
                    && token.as_str() != "curl"
                    && !token.starts_with('-')
                    && !FLAGS_WITH_ARGUMENT.contains(&tokens[i - 1].as_str())
            })
            .map(|(_, token)| token.clone())
            .unwrap_or_default()
    };

    let url = url.trim().to_string();
    if url.is_empty() {
        return Err(RelayError::UrlNotFound);
    }
    if !SCHEME_RE.is_match(&url) {
        return Err(RelayError::MissingScheme(url));
    }
    descriptor.url = url;
    Ok(())
}

fn extract_headers(command: &str, descriptor: &mut RequestDescriptor) -> Result<(), RelayError> {
    for caps in HEADER_RE.captures_iter(command) {
        let Some(text) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        if let Some((name, value)) = text.as_str().split_once(':') {
            let name = name.trim();
            if !name.is_empty() {
                descriptor.headers.set(name, value.trim());
            }
        }
    }
    Ok(())
}

fn extract_body(command: &str, descriptor: &mut RequestDescriptor) -> Result<(), RelayError> {
    for (pattern, is_json) in BODY_RES.iter() {
        let Some(caps) = pattern.captures(command) else {
            continue;
        };
        let captured = &caps[1];
        if captured.is_empty() {
            continue;
        }
        let body = if caps[0].ends_with('"') {
            captured.replace("\\\"", "\"")
        } else {
            captured.to_string()
        };
        descriptor.body = Some(body);
        if *is_json {
            descriptor.headers.set("Content-Type", "application/json");
        }
        break;
    }
    Ok(())
}

fn apply_body_defaults(_command: &str, descriptor: &mut RequestDescriptor) -> Result<(), RelayError> {
    let Some(body) = descriptor.body.as_deref() else {
        return Ok(());
    };

    if !descriptor.headers.contains("Content-Type") {
        let trimmed = body.trim();
        let content_type = if trimmed.starts_with('{') && trimmed.ends_with('}') {
            "application/json"
        } else {
            "application/x-www-form-urlencoded"
        };
        descriptor.headers.set("Content-Type", content_type);
    }

    // A body turns any GET into POST, explicit `-X GET` included.
    if descriptor.method.eq_ignore_ascii_case(DEFAULT_METHOD) {
        descriptor.method = "POST".to_string();
    }
    Ok(())
}

fn has_flag(tokens: &[String], long: &str, short: char) -> bool {
    tokens.iter().any(|token| {
        if token == long {
            return true;
        }
        match token.strip_prefix('-') {
            Some(cluster) if !cluster.starts_with('-') && !cluster.is_empty() => {
                cluster.contains(short) && cluster.chars().all(|c| CLUSTERABLE_FLAGS.contains(c))
            }
            _ => false,
        }
    })
}

fn flag_argument<'a>(tokens: &'a [String], names: &[&str]) -> Option<&'a str> {
    tokens
        .windows(2)
        .find(|pair| names.contains(&pair[0].as_str()))
        .map(|pair| pair[1].as_str())
}

fn parse_timeout(value: &str) -> Option<u64> {
    let seconds: f64 = value.trim().parse().ok()?;
    if seconds.is_finite() && seconds > 0.0 {
        Some(seconds.ceil() as u64)
    } else {
        None
    }
}

fn extract_flags(command: &str, descriptor: &mut RequestDescriptor) -> Result<(), RelayError> {
    let tokens = tokenize(command);

    if has_flag(&tokens, "--insecure", 'k') {
        descriptor.insecure_tls = true;
    }
    if has_flag(&tokens, "--location", 'L') {
        descriptor.follow_redirects = true;
    }
    if let Some(timeout) = flag_argument(&tokens, &["--connect-timeout"]).and_then(parse_timeout) {
        descriptor.timeout_secs = timeout;
    }
    if let Some(agent) = flag_argument(&tokens, &["-A", "--user-agent"]).filter(|a| !a.is_empty()) {
        descriptor.headers.set("User-Agent", agent);
    }
    if let Some(auth) = flag_argument(&tokens, &["-u", "--user"]).filter(|a| !a.is_empty()) {
        descriptor.basic_auth = Some(auth.to_string());
        if auth.contains(':') {
            let encoded = Base64.encode(auth.as_bytes());
            descriptor.headers.set("Authorization", format!("Basic {}", encoded));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> RequestDescriptor {
        parse_command(raw, DEFAULT_TIMEOUT_SECS).unwrap()
    }

    #[test]
    fn test_requires_curl_prefix() {
        assert!(matches!(parse_command("wget http://a.b", 30), Err(RelayError::InvalidCommand)));
        assert!(matches!(parse_command("curl", 30), Err(RelayError::InvalidCommand)));
    }

    #[test]
    fn test_line_continuations() {
        let d = parse("curl \\\n  -X PUT \\\r\n  'https://api.example.com/v1'");
        assert_eq!(d.method, "PUT");
        assert_eq!(d.url, "https://api.example.com/v1");
    }

    #[test]
    fn test_method_and_url_any_order() {
        for raw in [
            "curl -X DELETE 'https://example.com/items/1'",
            "curl 'https://example.com/items/1' -X DELETE",
            "curl -H 'Accept: */*' https://example.com/items/1 -X DELETE",
        ] {
            let d = parse(raw);
            assert_eq!(d.method, "DELETE", "{raw}");
            assert_eq!(d.url, "https://example.com/items/1", "{raw}");
        }
    }

    #[test]
    fn test_defaults() {
        let d = parse("curl https://example.com");
        assert_eq!(d.method, "GET");
        assert_eq!(d.timeout_secs, 30);
        assert!(!d.insecure_tls);
        assert!(!d.follow_redirects);
        assert!(d.body.is_none());
        assert!(d.headers.is_empty());
    }

    #[test]
    fn test_url_fallbacks() {
        let d = parse("curl 'ftp://files.example.com/a.txt'");
        assert_eq!(d.url, "ftp://files.example.com/a.txt");

        let d = parse("curl -X GET -H 'A: b' ws://socket.example.com/feed");
        assert_eq!(d.url, "ws://socket.example.com/feed");

        assert!(matches!(parse_command("curl -X GET", 30), Err(RelayError::UrlNotFound)));
        assert!(matches!(
            parse_command("curl example.com", 30),
            Err(RelayError::MissingScheme(url)) if url == "example.com"
        ));
    }

    #[test]
    fn test_headers_split_and_overwrite() {
        let d = parse(
            r#"curl https://x.io -H 'X-Test: 1' -H "Authorization: Bearer a:b" -H 'x-test:  2 '"#,
        );
        assert_eq!(d.headers.len(), 2);
        assert_eq!(d.headers.get("X-Test"), Some("2"));
        assert_eq!(d.headers.get("Authorization"), Some("Bearer a:b"));
    }

    #[test]
    fn test_data_raw_json_upgrades_to_post() {
        let d = parse(r#"curl 'https://api.example.com' --data-raw '{"a":1}'"#);
        assert_eq!(d.method, "POST");
        assert_eq!(d.body.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(d.headers.get("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_form_body_and_explicit_content_type() {
        let d = parse("curl https://x.io -d 'a=1&b=2'");
        assert_eq!(d.headers.get("Content-Type"), Some("application/x-www-form-urlencoded"));

        let d = parse("curl https://x.io -H 'content-type: text/plain' --data '{}'");
        assert_eq!(d.headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(d.headers.len(), 1);
    }

    #[test]
    fn test_body_upgrades_only_get() {
        let d = parse("curl -X PATCH https://x.io -d 'a=1'");
        assert_eq!(d.method, "PATCH");
        let d = parse("curl -X GET https://x.io -d 'a=1'");
        assert_eq!(d.method, "POST");
        let d = parse("curl -X GET https://x.io");
        assert_eq!(d.method, "GET");
    }

    #[test]
    fn test_body_precedence_and_escapes() {
        let d = parse(r#"curl https://x.io -d 'second' --data-raw 'first'"#);
        assert_eq!(d.body.as_deref(), Some("first"));

        let d = parse(r#"curl https://x.io --data-raw "say \"hi\"""#);
        assert_eq!(d.body.as_deref(), Some(r#"say "hi""#));

        let d = parse(r#"curl https://x.io --data 'a\"b'"#);
        assert_eq!(d.body.as_deref(), Some(r#"a\"b"#));
    }

    #[test]
    fn test_single_quoted_body_keeps_trailing_backslash() {
        let d = parse(r"curl https://x.io -d 'C:\temp\'");
        assert_eq!(d.body.as_deref(), Some(r"C:\temp\"));
        assert_eq!(d.method, "POST");
        assert_eq!(d.headers.get("Content-Type"), Some("application/x-www-form-urlencoded"));

        let d = parse(r"curl https://x.io --data-raw 'dir\' -H 'X-A: 1'");
        assert_eq!(d.body.as_deref(), Some(r"dir\"));
        assert_eq!(d.headers.get("X-A"), Some("1"));
    }

    #[test]
    fn test_json_flag_forces_content_type() {
        let d = parse(r#"curl https://x.io -H 'Content-Type: text/plain' --json '[1,2]'"#);
        assert_eq!(d.headers.get("Content-Type"), Some("application/json"));
        assert_eq!(d.method, "POST");
    }

    #[test]
    fn test_flags() {
        let d = parse("curl -k -L --connect-timeout 5 https://x.io");
        assert!(d.insecure_tls);
        assert!(d.follow_redirects);
        assert_eq!(d.timeout_secs, 5);

        let d = parse("curl -sSkL https://x.io");
        assert!(d.insecure_tls && d.follow_redirects);

        let d = parse("curl --insecure --location https://x.io --connect-timeout abc");
        assert!(d.insecure_tls && d.follow_redirects);
        assert_eq!(d.timeout_secs, 30);

        let d = parse("curl https://x.io --connect-timeout 0");
        assert_eq!(d.timeout_secs, 30);
    }

    #[test]
    fn test_flags_inside_quotes_are_ignored() {
        let d = parse("curl https://x.io -H 'X-Args: -k -L'");
        assert!(!d.insecure_tls);
        assert!(!d.follow_redirects);
    }

    #[test]
    fn test_user_agent_overrides_header() {
        let d = parse(r#"curl https://x.io -H 'User-Agent: first' -A "custom/1.0""#);
        assert_eq!(d.headers.get("User-Agent"), Some("custom/1.0"));
    }

    #[test]
    fn test_basic_auth() {
        let d = parse("curl -u 'alice:secret' https://x.io");
        assert_eq!(d.basic_auth.as_deref(), Some("alice:secret"));
        assert_eq!(d.headers.get("Authorization"), Some("Basic YWxpY2U6c2VjcmV0"));

        let d = parse("curl -u alice https://x.io");
        assert_eq!(d.basic_auth.as_deref(), Some("alice"));
        assert!(!d.headers.contains("Authorization"));
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize(r#"curl -H 'A: b c' "x \"y\"" plain\ word"#),
            vec!["curl", "-H", "A: b c", r#"x "y""#, "plain word"]
        );
        assert_eq!(tokenize("  "), Vec::<String>::new());
        assert_eq!(tokenize("a ''"), vec!["a", ""]);
    }

    #[test]
    fn test_tokenize_posix_double_quote_escapes() {
        assert_eq!(tokenize(r#"curl "a\$b" "c\`d""#), vec!["curl", "a$b", "c`d"]);
    }

    #[test]
    fn test_tokenize_unterminated_quote_falls_back_to_whitespace() {
        assert_eq!(tokenize("curl -k 'https://x.io"), vec!["curl", "-k", "'https://x.io"]);
    }
}
