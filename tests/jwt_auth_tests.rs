// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication tests.
//!
//! These tests verify that JWT tokens created by the auth routes can be
//! decoded with the claims format the middleware expects.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use vita_tracker::middleware::auth::{create_jwt, SESSION_TTL_SECS};

/// Claims structure that must match what the middleware expects.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

const KEY: &[u8] = b"test_jwt_key_32_bytes_minimum!!!";

#[test]
fn test_jwt_claims_format() {
    let token = create_jwt(12345, KEY).unwrap();

    let data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(KEY),
        &Validation::new(Algorithm::HS256),
    )
    .expect("token should decode");

    assert_eq!(data.claims.sub, "12345");
    assert_eq!(data.claims.exp - data.claims.iat, SESSION_TTL_SECS as usize);
}

#[test]
fn test_expired_token_rejected() {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: "1".to_string(),
        iat: 1_000,
        exp: 2_000,
    };
    let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(KEY))
        .unwrap();

    assert!(vita_tracker::middleware::auth::verify_jwt(&token, KEY).is_err());
}
