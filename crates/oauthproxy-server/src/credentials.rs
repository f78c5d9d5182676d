//! Basic-Auth credential translation.
//!
//! Callers authenticate to the proxy with the shared incoming identity. When
//! that identity checks out, the header is replaced with one carrying the
//! real outgoing identity. Nothing else about the request is inspected here.

use base64::{Engine, engine::general_purpose::STANDARD};
use subtle::ConstantTimeEq;

/// Authorization scheme prefix, including the separating space.
pub const BASIC_PREFIX: &str = "Basic ";

/// Why a Basic-Auth header could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("not Basic auth")]
    InvalidScheme,
    #[error("base64 decoding failed")]
    InvalidBase64,
    #[error("credentials are not valid UTF-8")]
    InvalidUtf8,
    #[error("not user:pass")]
    MissingSeparator,
}

/// Why a credential could not be translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// The header was malformed.
    #[error("invalid Basic-Auth header: {0}")]
    Decoding(#[from] DecodeError),
    /// The header decoded but named the wrong identity.
    #[error("bad username or password")]
    Mismatch,
}

/// Split a `Basic` Authorization header value into user and password.
///
/// Only the first `:` separates the two, so passwords may contain colons.
pub fn decode_basic_auth(header_value: &str) -> Result<(String, String), DecodeError> {
    let encoded = header_value
        .strip_prefix(BASIC_PREFIX)
        .ok_or(DecodeError::InvalidScheme)?;
    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| DecodeError::InvalidBase64)?;
    let decoded = String::from_utf8(decoded).map_err(|_| DecodeError::InvalidUtf8)?;

    let (user, password) = decoded
        .split_once(':')
        .ok_or(DecodeError::MissingSeparator)?;
    Ok((user.to_string(), password.to_string()))
}

/// Build a `Basic` Authorization header value.
pub fn encode_basic_auth(user: &str, password: &str) -> String {
    format!("{}{}", BASIC_PREFIX, STANDARD.encode(format!("{}:{}", user, password)))
}

/// Validate `header_value` against the expected identity and, on success,
/// return a header value carrying the outgoing identity instead.
pub fn translate_credential(
    header_value: &str,
    expected_user: &str,
    expected_password: &str,
    outgoing_user: &str,
    outgoing_password: &str,
) -> Result<String, CredentialError> {
    let (user, password) = decode_basic_auth(header_value)?;

    // Both comparisons always run.
    let user_ok = constant_time_eq(&user, expected_user);
    let password_ok = constant_time_eq(&password, expected_password);
    if !(user_ok && password_ok) {
        return Err(CredentialError::Mismatch);
    }

    Ok(encode_basic_auth(outgoing_user, outgoing_password))
}

/// Exact string equality in constant time for equal-length inputs.
///
/// Inputs of different length compare unequal without inspecting content.
fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// The incoming and outgoing identities bound together.
#[derive(Clone)]
pub struct CredentialTranslator {
    incoming_user: String,
    incoming_password: String,
    outgoing_user: String,
    outgoing_password: String,
}

impl CredentialTranslator {
    /// Create a translator accepting `incoming` and substituting `outgoing`.
    pub fn new(
        incoming_user: impl Into<String>,
        incoming_password: impl Into<String>,
        outgoing_user: impl Into<String>,
        outgoing_password: impl Into<String>,
    ) -> Self {
        Self {
            incoming_user: incoming_user.into(),
            incoming_password: incoming_password.into(),
            outgoing_user: outgoing_user.into(),
            outgoing_password: outgoing_password.into(),
        }
    }

    /// Build from the proxy config's client identities.
    pub fn from_config(config: &oauthproxy_config::ProxyConfig) -> Self {
        Self::new(
            &config.incoming_client_id,
            &config.incoming_client_secret,
            &config.client_id,
            &config.client_secret,
        )
    }

    /// Translate an inbound Authorization header value.
    pub fn translate(&self, header_value: &str) -> Result<String, CredentialError> {
        translate_credential(
            header_value,
            &self.incoming_user,
            &self.incoming_password,
            &self.outgoing_user,
            &self.outgoing_password,
        )
    }
}

impl std::fmt::Debug for CredentialTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialTranslator")
            .field("incoming_user", &self.incoming_user)
            .field("outgoing_user", &self.outgoing_user)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(payload: &str) -> String {
        format!("Basic {}", STANDARD.encode(payload))
    }

    #[test]
    fn test_decode_valid() {
        let (user, pass) = decode_basic_auth(&header("alice:s3cret")).unwrap();
        assert_eq!(user, "alice");
        assert_eq!(pass, "s3cret");
    }

    #[test]
    fn test_decode_password_with_colons() {
        let (user, pass) = decode_basic_auth(&header("alice:a:b:c")).unwrap();
        assert_eq!(user, "alice");
        assert_eq!(pass, "a:b:c");
    }

    #[test]
    fn test_decode_empty_parts() {
        let (user, pass) = decode_basic_auth(&header(":")).unwrap();
        assert!(user.is_empty());
        assert!(pass.is_empty());
    }

    #[test]
    fn test_decode_wrong_scheme() {
        assert_eq!(
            decode_basic_auth("Bearer abc"),
            Err(DecodeError::InvalidScheme)
        );
        assert_eq!(
            decode_basic_auth(&header("a:b").to_lowercase()),
            Err(DecodeError::InvalidScheme)
        );
        assert_eq!(decode_basic_auth("Basic"), Err(DecodeError::InvalidScheme));
    }

    #[test]
    fn test_decode_invalid_base64() {
        assert_eq!(
            decode_basic_auth("Basic !!!not-base64!!!"),
            Err(DecodeError::InvalidBase64)
        );
        // Unpadded input is rejected by the standard engine.
        assert_eq!(
            decode_basic_auth("Basic YTo"),
            Err(DecodeError::InvalidBase64)
        );
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let value = format!("Basic {}", STANDARD.encode([0xff, b':', 0xfe]));
        assert_eq!(decode_basic_auth(&value), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_decode_missing_separator() {
        assert_eq!(
            decode_basic_auth(&header("no-colon-here")),
            Err(DecodeError::MissingSeparator)
        );
    }

    #[test]
    fn test_encode_basic_auth() {
        assert_eq!(encode_basic_auth("a", "b"), "Basic YTpi");
    }

    #[test]
    fn test_translate_success() {
        let result =
            translate_credential(&header("shared:pw"), "shared", "pw", "real", "hidden").unwrap();
        assert_eq!(result, format!("Basic {}", STANDARD.encode("real:hidden")));
    }

    #[test]
    fn test_translate_is_idempotent() {
        let translator = CredentialTranslator::new("shared", "pw", "real", "hidden");
        let first = translator.translate(&header("shared:pw")).unwrap();
        let second = translator.translate(&header("shared:pw")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_translate_wrong_user() {
        assert_eq!(
            translate_credential(&header("other:pw"), "shared", "pw", "real", "hidden"),
            Err(CredentialError::Mismatch)
        );
    }

    #[test]
    fn test_translate_wrong_password() {
        assert_eq!(
            translate_credential(&header("shared:nope"), "shared", "pw", "real", "hidden"),
            Err(CredentialError::Mismatch)
        );
        // Prefix of the real password is still a mismatch.
        assert_eq!(
            translate_credential(&header("shared:p"), "shared", "pw", "real", "hidden"),
            Err(CredentialError::Mismatch)
        );
    }

    #[test]
    fn test_translate_decoding_failure() {
        assert_eq!(
            translate_credential("Digest xyz", "shared", "pw", "real", "hidden"),
            Err(CredentialError::Decoding(DecodeError::InvalidScheme))
        );
        assert_eq!(
            translate_credential(&header("sharedpw"), "shared", "pw", "real", "hidden"),
            Err(CredentialError::Decoding(DecodeError::MissingSeparator))
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("shared", "shared"));
        assert!(constant_time_eq("", ""));
        assert!(!constant_time_eq("shared", "sharee"));
        assert!(!constant_time_eq("shared", "shared-longer"));
        assert!(!constant_time_eq("", "x"));
    }

    #[test]
    fn test_translator_from_config() {
        let config = oauthproxy_config::ProxyConfig {
            client_id: "real".to_string(),
            client_secret: "hidden".to_string(),
            incoming_client_id: "shared".to_string(),
            incoming_client_secret: "pw".to_string(),
            ..Default::default()
        };
        let translator = CredentialTranslator::from_config(&config);
        assert_eq!(
            translator.translate(&header("shared:pw")).unwrap(),
            encode_basic_auth("real", "hidden")
        );
        assert!(!format!("{:?}", translator).contains("hidden"));
    }
}
