use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_OCTETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\d+$").expect("valid ip tail pattern"));

/// Hide the last two octets of an IPv4 address for log output.
pub fn mask_ip(ip: &str) -> String {
    TRAILING_OCTETS.replace(ip, "XX.XX").into_owned()
}

/// First entry of an `X-Forwarded-For` header value.
pub fn first_forwarded(value: &str) -> Option<&str> {
    value
        .split(',')
        .map(str::trim)
        .find(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_ipv4_tail() {
        assert_eq!(mask_ip("192.168.10.42"), "192.168.XX.XX");
    }

    #[test]
    fn leaves_other_values_alone() {
        assert_eq!(mask_ip("unknown"), "unknown");
    }

    #[test]
    fn forwarded_picks_client_address() {
        assert_eq!(first_forwarded("203.0.113.9, 10.0.0.1"), Some("203.0.113.9"));
        assert_eq!(first_forwarded(" , "), None);
    }
}
