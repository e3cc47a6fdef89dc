use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::utils::hex::decode_hex;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Requests older (or newer) than this are treated as replays.
pub const MAX_SKEW_SECONDS: i64 = 5 * 60;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("malformed signature: {0}")]
    Malformed(&'static str),

    #[error("request timestamp {0} outside the allowed window")]
    Stale(String),

    #[error("signature mismatch")]
    Mismatch,
}

/// Checks a Slack `v0=<hex>` request signature over `v0:<timestamp>:<body>`.
pub fn verify_slack_v0(
    body: &[u8],
    signature: Option<&str>,
    timestamp: Option<&str>,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let signature = signature.ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?;
    let timestamp = timestamp
        .map(str::trim)
        .ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?;

    let seconds = timestamp
        .parse::<i64>()
        .map_err(|_| SignatureError::Malformed("timestamp is not a number"))?;
    if (now.timestamp() - seconds).abs() > MAX_SKEW_SECONDS {
        return Err(SignatureError::Stale(timestamp.to_string()));
    }

    let digest = signature
        .trim()
        .strip_prefix("v0=")
        .ok_or(SignatureError::Malformed("expected v0=<hex>"))?;
    let expected = decode_hex(digest).ok_or(SignatureError::Malformed("digest is not hex"))?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Malformed("unusable signing secret"))?;
    mac.update(format!("v0:{timestamp}:").as_bytes());
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
pub(crate) fn sign_slack_v0(body: &[u8], timestamp: &str, secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("mac");
    mac.update(format!("v0:{timestamp}:").as_bytes());
    mac.update(body);
    format!(
        "v0={}",
        crate::utils::hex::encode_hex(&mac.finalize().into_bytes())
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const BODY: &[u8] = br#"{"type":"event_callback","event":{"type":"message"}}"#;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp")
    }

    #[test]
    fn accepts_valid_signature() {
        let timestamp = now().timestamp().to_string();
        let signature = sign_slack_v0(BODY, &timestamp, SECRET);
        assert_eq!(
            verify_slack_v0(BODY, Some(&signature), Some(&timestamp), SECRET, now()),
            Ok(())
        );
    }

    #[test]
    fn rejects_tampered_body() {
        let timestamp = now().timestamp().to_string();
        let signature = sign_slack_v0(BODY, &timestamp, SECRET);
        assert_eq!(
            verify_slack_v0(b"{}", Some(&signature), Some(&timestamp), SECRET, now()),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_old_timestamp() {
        let sent_at = now() - TimeDelta::minutes(6);
        let timestamp = sent_at.timestamp().to_string();
        let signature = sign_slack_v0(BODY, &timestamp, SECRET);
        assert_eq!(
            verify_slack_v0(BODY, Some(&signature), Some(&timestamp), SECRET, now()),
            Err(SignatureError::Stale(timestamp))
        );
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        let timestamp = now().timestamp().to_string();
        assert_eq!(
            verify_slack_v0(BODY, None, Some(&timestamp), SECRET, now()),
            Err(SignatureError::MissingHeader(SIGNATURE_HEADER))
        );
        assert_eq!(
            verify_slack_v0(BODY, Some("v0=abc"), None, SECRET, now()),
            Err(SignatureError::MissingHeader(TIMESTAMP_HEADER))
        );
        assert!(matches!(
            verify_slack_v0(BODY, Some("sha256=00"), Some(&timestamp), SECRET, now()),
            Err(SignatureError::Malformed(_))
        ));
    }
}
