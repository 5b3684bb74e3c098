use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::Deserialize;

/// The only claim inspected locally.
#[derive(Debug, Deserialize)]
struct Expiry {
    #[allow(dead_code)]
    exp: u64,
}

/// Reads `exp` from a JWT without verifying its signature; the token is the
/// auth service's to verify. `None` means the token is not a readable JWT.
pub(crate) fn token_expired(token: &str) -> Option<bool> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;

    match decode::<Expiry>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(_) => Some(false),
        Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Some(true),
        Err(_) => None,
    }
}
