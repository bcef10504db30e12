//! External identity-token email extraction.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use daybook_core::Email;

use crate::error::AuthError;

/// Extract the `email` claim from an externally issued identity token
/// (opaque, dot-delimited, base64url-encoded three-part structure).
///
/// The token is decoded, not verified: this layer treats it as a carrier of
/// the email claim, not as a trust boundary. Signature verification against
/// the issuer belongs to the identity-provider integration, which is outside
/// this core.
pub fn email_claim(token: &str) -> Result<Email, AuthError> {
    let mut parts = token.split('.');
    let (Some(_), Some(payload), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::malformed_token(
            "expected three dot-delimited segments",
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AuthError::malformed_token("payload is not base64url"))?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|_| AuthError::malformed_token("payload is not JSON"))?;

    let email = claims
        .get("email")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AuthError::malformed_token("missing email claim"))?;

    Ok(Email::new(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forge_token(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.sig")
    }

    #[test]
    fn extracts_and_normalizes_the_email_claim() {
        let token = forge_token(&serde_json::json!({ "email": " User@X.COM ", "sub": "123" }));
        assert_eq!(email_claim(&token).unwrap(), Email::new("user@x.com"));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(matches!(
            email_claim("only-one-segment"),
            Err(AuthError::MalformedIdentityToken(_))
        ));
        assert!(matches!(
            email_claim("a.b.c.d"),
            Err(AuthError::MalformedIdentityToken(_))
        ));
    }

    #[test]
    fn rejects_undecodable_payload() {
        assert!(matches!(
            email_claim("head.!!!not-base64!!!.sig"),
            Err(AuthError::MalformedIdentityToken(_))
        ));
    }

    #[test]
    fn rejects_payload_without_email() {
        let token = forge_token(&serde_json::json!({ "sub": "123" }));
        assert!(matches!(
            email_claim(&token),
            Err(AuthError::MalformedIdentityToken(_))
        ));
    }

    #[test]
    fn rejects_blank_email_claim() {
        let token = forge_token(&serde_json::json!({ "email": "   " }));
        assert!(matches!(
            email_claim(&token),
            Err(AuthError::MalformedIdentityToken(_))
        ));
    }
}
