//! Canonical credential payload encoding.
//!
//! A versioned JSON envelope wraps the credential config. Optional
//! fields serialize as explicit `null`s so absence is always
//! distinguishable in the payload, and round-trip identity holds for
//! every valid model.

use serde::{Deserialize, Serialize};

use crate::credential::CredentialConfig;
use crate::error::{FormatError, Result};

/// Current payload envelope version.
const PAYLOAD_VERSION: u32 = 1;

#[derive(Serialize)]
struct Envelope<'a> {
    version: u32,
    #[serde(flatten)]
    config: &'a CredentialConfig,
}

#[derive(Deserialize)]
struct OwnedEnvelope {
    version: u32,
    #[serde(flatten)]
    config: CredentialConfig,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Encodes a credential config into its canonical byte payload.
///
/// # Errors
///
/// Returns a [`FormatError`] if the model cannot be encoded.
pub fn serialize(config: &CredentialConfig) -> Result<Vec<u8>> {
    let envelope = Envelope {
        version: PAYLOAD_VERSION,
        config,
    };
    serde_json::to_vec(&envelope).map_err(|e| FormatError::Payload(e).into())
}

/// Decodes a canonical byte payload back into a credential config.
///
/// # Errors
///
/// Returns a [`FormatError`] on an unknown envelope version, truncated
/// data, or a field-type mismatch.
pub fn deserialize(bytes: &[u8]) -> Result<CredentialConfig> {
    let probe: VersionProbe =
        serde_json::from_slice(bytes).map_err(FormatError::Payload)?;
    if probe.version != PAYLOAD_VERSION {
        return Err(FormatError::UnsupportedPayloadVersion(probe.version).into());
    }
    let envelope: OwnedEnvelope =
        serde_json::from_slice(bytes).map_err(FormatError::Payload)?;
    Ok(envelope.config)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::credential::{
        Authority, GoogleApiConfig, MsGraphConfig, TokenRecord,
    };
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    #[test]
    fn round_trip_minimal_ms_graph() {
        let config: CredentialConfig = MsGraphConfig::new("a@example.com").into();
        let bytes = serialize(&config).unwrap();
        assert_eq!(deserialize(&bytes).unwrap(), config);
    }

    #[test]
    fn round_trip_full_google() {
        let mut google = GoogleApiConfig::new("b@example.com")
            .with_client_id("client-123")
            .with_scopes(vec!["https://www.googleapis.com/auth/gmail.send".into()]);
        google.apply_token(
            &TokenRecord::new("tok", None),
            Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap(),
        );
        let config: CredentialConfig = google.into();
        let bytes = serialize(&config).unwrap();
        assert_eq!(deserialize(&bytes).unwrap(), config);
    }

    #[test]
    fn absent_optionals_are_explicit_nulls() {
        let config: CredentialConfig = MsGraphConfig::new("a@example.com").into();
        let bytes = serialize(&config).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let inner = &value["config"];
        assert!(inner["client_id"].is_null());
        assert!(inner["token_value"].is_null());
        assert!(inner["token_timestamp"].is_null());
    }

    #[test]
    fn envelope_carries_version_and_provider() {
        let config: CredentialConfig = GoogleApiConfig::new("b@example.com").into();
        let bytes = serialize(&config).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["provider"], "google_api");
    }

    #[test]
    fn unknown_version_rejected() {
        let payload = br#"{"version":99,"provider":"ms_graph","config":{}}"#;
        assert!(matches!(
            deserialize(payload),
            Err(crate::Error::Format(
                FormatError::UnsupportedPayloadVersion(99)
            ))
        ));
    }

    #[test]
    fn truncated_payload_rejected() {
        let config: CredentialConfig = MsGraphConfig::new("a@example.com").into();
        let bytes = serialize(&config).unwrap();
        assert!(matches!(
            deserialize(&bytes[..bytes.len() / 2]),
            Err(crate::Error::Format(FormatError::Payload(_)))
        ));
    }

    #[test]
    fn field_type_mismatch_rejected() {
        let payload = br#"{"version":1,"provider":"google_api","config":{"host":"h","port":"not-a-port","email_address":"a@example.com","client_id":null,"scopes":null,"token_value":null,"token_timestamp":null}}"#;
        assert!(matches!(
            deserialize(payload),
            Err(crate::Error::Format(FormatError::Payload(_)))
        ));
    }

    fn arb_opt_string() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-zA-Z0-9._-]{0,24}")
    }

    prop_compose! {
        fn arb_ms_graph()(
            email in "[a-z0-9.]{1,16}@[a-z0-9]{1,12}\\.[a-z]{2,4}",
            client_id in arb_opt_string(),
            consumer in any::<bool>(),
            smtp_host in arb_opt_string(),
            smtp_port in proptest::option::of(1u16..),
            smtp_starttls in proptest::option::of(any::<bool>()),
            token_value in arb_opt_string(),
            token_secs in proptest::option::of(0i64..4_102_444_800),
        ) -> MsGraphConfig {
            MsGraphConfig {
                email_address: email,
                client_id,
                authority: if consumer { Authority::Consumer } else { Authority::Organization },
                smtp_host,
                smtp_port,
                smtp_starttls,
                token_value,
                token_timestamp: token_secs
                    .map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap()),
            }
        }
    }

    proptest! {
        #[test]
        fn round_trip_identity_holds(config in arb_ms_graph()) {
            let config: CredentialConfig = config.into();
            let bytes = serialize(&config).unwrap();
            prop_assert_eq!(deserialize(&bytes).unwrap(), config);
        }
    }
}
