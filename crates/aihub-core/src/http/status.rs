//! Reason phrases for HTTP status codes
//!
//! Used when the transport does not hand back a reason phrase. Standard
//! codes come from `reqwest`; the codes proxies and gateways invent are
//! kept locally.

use reqwest::StatusCode;

/// Look up the reason phrase for a status code
pub fn reason_phrase(status: u16) -> Option<&'static str> {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .or_else(|| non_standard_phrase(status))
}

fn non_standard_phrase(status: u16) -> Option<&'static str> {
    let phrase = match status {
        499 => "Client Closed Request",
        520 => "Unknown Error",
        521 => "Web Server Is Down",
        522 => "Connection Timed Out",
        523 => "Origin Is Unreachable",
        524 => "A Timeout Occurred",
        525 => "SSL Handshake Failed",
        526 => "Invalid SSL Certificate",
        527 => "Railgun Error",
        529 => "Site Overloaded",
        _ => return None,
    };
    Some(phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_phrases() {
        assert_eq!(reason_phrase(404), Some("Not Found"));
        assert_eq!(reason_phrase(429), Some("Too Many Requests"));
        assert_eq!(reason_phrase(503), Some("Service Unavailable"));
    }

    #[test]
    fn test_gateway_phrases() {
        assert_eq!(reason_phrase(499), Some("Client Closed Request"));
        assert_eq!(reason_phrase(522), Some("Connection Timed Out"));
        assert_eq!(reason_phrase(529), Some("Site Overloaded"));
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(reason_phrase(299), None);
        assert_eq!(reason_phrase(599), None);
        assert_eq!(reason_phrase(1000), None);
    }
}
