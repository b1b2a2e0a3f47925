//! URL validation for outbound requests
//!
//! Safe mode restricts `web_get` to public http(s) targets: localhost and
//! private address ranges are refused so a model cannot probe the local
//! network through the tool.

/// Result of validating a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlValidation {
    Valid,
    InvalidScheme(String),
    LocalTarget(String),
    PrivateTarget(String),
}

impl UrlValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, UrlValidation::Valid)
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            UrlValidation::Valid => None,
            UrlValidation::InvalidScheme(url) => Some(format!(
                "URL must start with http:// or https://: {}",
                url
            )),
            UrlValidation::LocalTarget(host) => {
                Some(format!("Access to localhost is restricted: {}", host))
            }
            UrlValidation::PrivateTarget(host) => {
                Some(format!("Access to private addresses is restricted: {}", host))
            }
        }
    }
}

const PRIVATE_PREFIXES: &[&str] = &[
    "10.",
    "192.168.",
    "172.16.",
    "172.17.",
    "172.18.",
    "172.19.",
    "172.20.",
    "172.21.",
    "172.22.",
    "172.23.",
    "172.24.",
    "172.25.",
    "172.26.",
    "172.27.",
    "172.28.",
    "172.29.",
    "172.30.",
    "172.31.",
    "169.254.",
];

/// Validate an outbound URL under safe mode
pub fn validate_url(url: &str) -> UrlValidation {
    let rest = if let Some(rest) = url.strip_prefix("https://") {
        rest
    } else if let Some(rest) = url.strip_prefix("http://") {
        rest
    } else {
        return UrlValidation::InvalidScheme(url.to_string());
    };

    // host is everything up to the first /, ?, or #, minus any port
    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .to_lowercase();
    let host = authority.rsplit_once(':').map_or(authority.as_str(), |(h, port)| {
        // ipv6 literals keep their brackets; only strip a numeric port
        if port.chars().all(|c| c.is_ascii_digit()) {
            h
        } else {
            authority.as_str()
        }
    });

    if host == "localhost" || host == "127.0.0.1" || host == "[::1]" || host == "0.0.0.0" {
        return UrlValidation::LocalTarget(host.to_string());
    }

    if PRIVATE_PREFIXES.iter().any(|p| host.starts_with(p)) {
        return UrlValidation::PrivateTarget(host.to_string());
    }

    UrlValidation::Valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(validate_url("https://example.com/page").is_valid());
        assert!(validate_url("http://example.com:8080/api?q=1").is_valid());
    }

    #[test]
    fn test_scheme_required() {
        assert_eq!(
            validate_url("ftp://example.com"),
            UrlValidation::InvalidScheme("ftp://example.com".to_string())
        );
        assert!(!validate_url("example.com").is_valid());
    }

    #[test]
    fn test_localhost_blocked() {
        assert!(matches!(
            validate_url("http://localhost:8000/admin"),
            UrlValidation::LocalTarget(_)
        ));
        assert!(matches!(
            validate_url("http://127.0.0.1/"),
            UrlValidation::LocalTarget(_)
        ));
    }

    #[test]
    fn test_private_ranges_blocked() {
        assert!(matches!(
            validate_url("http://192.168.1.1/router"),
            UrlValidation::PrivateTarget(_)
        ));
        assert!(matches!(
            validate_url("http://10.0.0.5:9000"),
            UrlValidation::PrivateTarget(_)
        ));
        assert!(matches!(
            validate_url("http://172.20.0.1"),
            UrlValidation::PrivateTarget(_)
        ));
    }
}
