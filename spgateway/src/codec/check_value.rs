//! Keyed SHA-256 check values.
//!
//! The gateway authenticates requests with a SHA-256 digest over a signing
//! string wrapped in a template that embeds the hash key and hash IV as
//! literal text. The digest travels as 64 uppercase hex characters.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, instrument, warn};

use crate::{
    Credential,
    codec::{
        CheckValue, ParamMap,
        canonical::{render_for_signing, render_payload, render_selected},
        profile::{CALLBACK_CHECK_CODE, ProfileId, ProfileRegistry, SigningRule, WireProfile},
    },
    error::{GatewayError, Result},
};

/// Field carrying the check code on inbound notifications.
pub const CHECK_CODE_FIELD: &str = "CheckCode";

/// Computes and verifies check values against a profile registry.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use spgateway::{
///     Credential,
///     codec::{CheckValueEngine, ParamMap},
/// };
///
/// let credential = Arc::new(
///     Credential::new("MS12345", "0123456789abcdef0123456789abcdef", "0123456789abcdef").unwrap(),
/// );
/// let engine = CheckValueEngine::new(credential);
///
/// let params = ParamMap::new()
///     .with("MerchantOrderNo", "ORDER1")
///     .with("MerchantID", "MS12345")
///     .with("Amt", "1000");
/// let check_value = engine.compute_check_value("transaction-query", &params).unwrap();
/// assert_eq!(check_value.as_str().len(), 64);
/// ```
#[derive(Debug, Clone)]
pub struct CheckValueEngine {
    credential: Arc<Credential>,
    registry: ProfileRegistry,
}

impl CheckValueEngine {
    /// Creates an engine over the built-in profile table.
    #[must_use]
    pub fn new(credential: Arc<Credential>) -> Self {
        Self::with_registry(credential, ProfileRegistry::builtin())
    }

    /// Creates an engine over a custom profile table.
    #[must_use]
    pub fn with_registry(credential: Arc<Credential>, registry: ProfileRegistry) -> Self {
        Self { credential, registry }
    }

    /// Returns the profile registry.
    #[must_use]
    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Computes the check value of `map` under the named profile.
    ///
    /// Field profiles sign their field subset sorted case-insensitively; raw
    /// payload profiles sign the insertion-ordered payload rendering of `map`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnsupportedProfile`] for an unknown name and
    /// [`GatewayError::MissingField`] if a required field is absent.
    pub fn compute_check_value(&self, profile_name: &str, map: &ParamMap) -> Result<CheckValue> {
        let profile = self.registry.get(profile_name)?;
        self.compute_for(profile, map)
    }

    /// Computes the check value of `map` under a resolved profile.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingField`] if a required field is absent.
    #[instrument(skip(self, map), fields(profile = profile.name))]
    pub fn compute_for(&self, profile: &WireProfile, map: &ParamMap) -> Result<CheckValue> {
        let signing = match profile.signing {
            SigningRule::RequiredFields(fields) => render_for_signing(map, fields)?,
            SigningRule::OptionalFields(fields) => render_selected(map, fields),
            SigningRule::RawPayload => render_payload(map, &[])?,
        };
        Ok(self.digest(profile, &signing))
    }

    /// Computes the check value of an already-serialized payload, typically
    /// a hex `TradeInfo` blob.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnsupportedProfile`] for an unknown name or a
    /// profile that signs fields rather than a payload.
    pub fn compute_payload_check_value(
        &self,
        profile_name: &str,
        payload: &str,
    ) -> Result<CheckValue> {
        let profile = self.registry.get(profile_name)?;
        self.payload_check_value_for(profile, payload)
    }

    /// Payload variant of [`Self::compute_for`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnsupportedProfile`] if `profile` signs fields.
    pub fn payload_check_value_for(
        &self,
        profile: &WireProfile,
        payload: &str,
    ) -> Result<CheckValue> {
        if !profile.is_raw_payload() {
            return Err(GatewayError::UnsupportedProfile(format!(
                "{} does not sign a raw payload",
                profile.name
            )));
        }
        Ok(self.digest(profile, payload))
    }

    /// Recomputes the check value of `map` and compares it with `candidate`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::compute_check_value`]. A mismatch is `Ok(false)`.
    pub fn verify_check_value(
        &self,
        profile_name: &str,
        map: &ParamMap,
        candidate: &str,
    ) -> Result<bool> {
        let expected = self.compute_check_value(profile_name, map)?;
        Ok(constant_time_eq(&expected, candidate, profile_name))
    }

    /// Recomputes the check value of `payload` and compares it with `candidate`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::compute_payload_check_value`]. A mismatch is `Ok(false)`.
    pub fn verify_payload_check_value(
        &self,
        profile_name: &str,
        payload: &str,
        candidate: &str,
    ) -> Result<bool> {
        let expected = self.compute_payload_check_value(profile_name, payload)?;
        Ok(constant_time_eq(&expected, candidate, profile_name))
    }

    /// Verifies a payload signature under the profile identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnsupportedProfile`] if the registry lacks
    /// `id` or the profile signs fields.
    pub fn verify_payload_for(&self, id: ProfileId, payload: &str, candidate: &str) -> Result<bool> {
        let profile = self.registry.by_id(id)?;
        let expected = self.payload_check_value_for(profile, payload)?;
        Ok(constant_time_eq(&expected, candidate, profile.name))
    }

    /// Computes the notification check code over the present subset of
    /// `Amt`, `MerchantID`, `MerchantOrderNo` and `TradeNo`.
    #[must_use]
    pub fn compute_legacy_check_code(&self, map: &ParamMap) -> CheckValue {
        let profile = self.callback_profile();
        let fields = match profile.signing {
            SigningRule::RequiredFields(fields) | SigningRule::OptionalFields(fields) => fields,
            SigningRule::RawPayload => &[],
        };
        self.digest(profile, &render_selected(map, fields))
    }

    /// Verifies an inbound notification carrying a `CheckCode` field.
    ///
    /// `CheckCode` is stripped from a copy of `map` before recomputation.
    /// A notification without `CheckCode` never verifies.
    #[must_use]
    pub fn verify_check_code(&self, map: &ParamMap) -> bool {
        let mut params = map.clone();
        let Some(candidate) = params.remove(CHECK_CODE_FIELD) else {
            warn!("notification carries no {CHECK_CODE_FIELD}");
            return false;
        };
        let expected = self.compute_legacy_check_code(&params);
        constant_time_eq(&expected, &candidate.to_string(), "callback-check-code")
    }

    fn callback_profile(&self) -> &'static WireProfile {
        self.registry
            .by_id(ProfileId::CallbackCheckCode)
            .unwrap_or(&CALLBACK_CHECK_CODE)
    }

    fn digest(&self, profile: &WireProfile, signing: &str) -> CheckValue {
        let material = profile.template.render(&self.credential, signing);
        CheckValue::from_digest(&Sha256::digest(material.as_bytes()))
    }
}

fn constant_time_eq(expected: &CheckValue, candidate: &str, profile_name: &str) -> bool {
    let equal: bool = expected.as_str().as_bytes().ct_eq(candidate.as_bytes()).into();
    if equal {
        debug!(profile = profile_name, "check value verified");
    } else {
        warn!(profile = profile_name, "check value mismatch");
    }
    equal
}
