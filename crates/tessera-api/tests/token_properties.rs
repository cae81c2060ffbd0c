//! Property tests for token issuance and decoding

use proptest::prelude::*;
use serde_json::Value;
use std::time::Duration;
use tessera_api::auth::{JwtConfig, TokenKind, TokenPayload, TokenService};

fn payload_strategy() -> impl Strategy<Value = TokenPayload> {
    prop::collection::btree_map("[a-z]{1,8}", ".{0,24}", 1..6)
        .prop_filter("reserved claims are managed by the service", |claims| {
            claims.keys().any(|k| !matches!(k.as_str(), "iat" | "exp" | "kind"))
        })
        .prop_map(|claims| {
            claims
                .into_iter()
                .filter(|(k, _)| !matches!(k.as_str(), "iat" | "exp" | "kind"))
                .map(|(k, v)| (k, Value::String(v)))
                .collect()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decode_never_fails_for_issued_tokens(
        payload in payload_strategy(),
        issuer_secret in "[a-zA-Z0-9]{1,32}",
        reader_secret in "[a-zA-Z0-9]{0,32}",
        refresh in any::<bool>(),
        lifetime in 60u64..100_000,
    ) {
        let issuer = TokenService::new(JwtConfig::with_secret(issuer_secret));
        let reader = TokenService::new(JwtConfig::with_secret(reader_secret));
        let kind = if refresh { TokenKind::Refresh } else { TokenKind::Access };

        let token = issuer
            .issue(&payload, kind, Some(Duration::from_secs(lifetime)))
            .unwrap();

        prop_assert_eq!(reader.decode(&token).unwrap(), payload.clone());
        prop_assert_eq!(issuer.verify(&token).unwrap(), payload);
    }
}
