//! Signed requests to the validator backend.
//!
//! Every backend call carries three headers produced by a
//! [`RequestSigner`]: the validator hotkey, a hex signature over
//! `<Bytes>{timestamp}</Bytes>`, and the timestamp itself.

use reqwest::RequestBuilder;

use crate::core::clock;

pub const HOTKEY_HEADER: &str = "X-Validator-Hotkey";
pub const SIGNATURE_HEADER: &str = "X-Validator-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Validator-Timestamp";

/// Signs backend requests with the validator's identity.
pub trait RequestSigner: Send + Sync {
    /// Public identity sent alongside the signature.
    fn hotkey(&self) -> &str;

    /// Raw signature bytes over `message`.
    fn sign(&self, message: &[u8]) -> Vec<u8>;
}

/// Header name/value pairs for one request.
#[must_use]
pub fn signed_headers(signer: &dyn RequestSigner) -> [(&'static str, String); 3] {
    let timestamp = clock::now();
    let message = format!("<Bytes>{timestamp}</Bytes>");
    let signature = hex::encode(signer.sign(message.as_bytes()));
    [
        (HOTKEY_HEADER, signer.hotkey().to_string()),
        (SIGNATURE_HEADER, signature),
        (TIMESTAMP_HEADER, timestamp.to_string()),
    ]
}

/// Attach signed headers when a signer is configured.
pub(crate) fn sign_request(
    builder: RequestBuilder,
    signer: Option<&dyn RequestSigner>,
) -> RequestBuilder {
    match signer {
        Some(signer) => signed_headers(signer)
            .into_iter()
            .fold(builder, |b, (name, value)| b.header(name, value)),
        None => builder,
    }
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl RequestSigner for Fixed {
        fn hotkey(&self) -> &str {
            "5Validator"
        }

        fn sign(&self, message: &[u8]) -> Vec<u8> {
            message.iter().take(2).copied().collect()
        }
    }

    #[test]
    fn test_signed_headers() {
        let headers = signed_headers(&Fixed);
        assert_eq!(headers[0], (HOTKEY_HEADER, "5Validator".to_string()));
        // "<B" as hex
        assert_eq!(headers[1].1, "3c42");
        assert!(headers[2].1.parse::<i64>().unwrap() > 0);
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://h/api/", "/scores/x"), "http://h/api/scores/x");
        assert_eq!(join_url("http://h", "scores"), "http://h/scores");
    }
}
