//! crates/agentstream_core/src/identity.rs
//!
//! Reads the claims of a third-party identity token (a JWT).
//!
//! Only the payload segment is decoded. The signature is not verified: the
//! token's claims are trusted as presented.

use crate::domain::IdentityClaims;
use crate::ports::{PortError, PortResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

pub fn decode_identity_token(token: &str) -> PortResult<IdentityClaims> {
    let payload = token
        .trim()
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| PortError::Auth("identity token has no payload segment".to_string()))?;

    // Some issuers pad the segment; the URL-safe engine here does not accept it.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| PortError::Auth(format!("identity token payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| PortError::Auth(format!("identity token payload is not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn decodes_profile_claims() {
        let token = token_with_payload(
            r#"{"sub":"1234","email":"ada@example.com","name":"Ada Lovelace","picture":"https://example.com/a.png","email_verified":true}"#,
        );

        let claims = decode_identity_token(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("1234"));
        assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
        assert_eq!(claims.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(claims.picture.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(claims.email_verified, Some(true));
    }

    #[test]
    fn decodes_non_ascii_names() {
        let token = token_with_payload(r#"{"name":"Zoë Ñuñez"}"#);
        let claims = decode_identity_token(&token).unwrap();
        assert_eq!(claims.name.as_deref(), Some("Zoë Ñuñez"));
        assert_eq!(claims.email, None);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(matches!(
            decode_identity_token("no-dots-here"),
            Err(PortError::Auth(_))
        ));
        assert!(matches!(
            decode_identity_token("a.!!!.c"),
            Err(PortError::Auth(_))
        ));

        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("plain text"));
        assert!(matches!(
            decode_identity_token(&not_json),
            Err(PortError::Auth(_))
        ));
    }
}
