//! Wire profile table.
//!
//! A wire profile describes how one gateway message type is authenticated:
//! which fields are signed, how the signing string is wrapped around the
//! merchant secrets, and which digest is used (always SHA-256). New message
//! types are added as rows of [`PROFILES`], never as new branches in the
//! check-value engine.

use std::fmt;

use crate::{
    Credential,
    error::{GatewayError, Result},
};

/// Identifier of a built-in wire profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileId {
    /// Legacy MPG checkout (`CheckValue`).
    CardPayment,
    /// Transaction status query (`CheckValue`).
    TransactionQuery,
    /// Legacy recurring-billing checkout (`CheckValue`).
    RecurringBilling,
    /// MPG 2.0 `TradeSha` over the encrypted `TradeInfo` blob.
    TradeSha,
    /// Wallet refund hash over the encrypted payload.
    WalletRefund,
    /// `CheckCode` on inbound notifications.
    CallbackCheckCode,
}

/// Protocol generation a profile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    /// Plain field maps with an appended check value; form-encoded replies.
    Legacy,
    /// Encrypted `TradeInfo`-style envelopes; JSON replies.
    V2,
}

/// Which merchant secret fills a template slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Secret {
    /// The 32-byte hash key.
    HashKey,
    /// The 16-byte hash IV.
    HashIv,
}

/// One `label=secret` slot of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateSlot {
    /// Literal label, e.g. `HashKey` or `IV`.
    pub label: &'static str,
    /// Secret rendered after the label.
    pub secret: Secret,
}

/// `"{leading}&{signing}&{trailing}"` with exactly one substitution slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    /// Slot before the signing string.
    pub leading: TemplateSlot,
    /// Slot after the signing string.
    pub trailing: TemplateSlot,
}

impl Template {
    const fn new(leading: (&'static str, Secret), trailing: (&'static str, Secret)) -> Self {
        Self {
            leading: TemplateSlot { label: leading.0, secret: leading.1 },
            trailing: TemplateSlot { label: trailing.0, secret: trailing.1 },
        }
    }

    /// Wraps `signing` between the two secret slots.
    #[must_use]
    pub fn render(&self, credential: &Credential, signing: &str) -> String {
        let secret = |slot: &TemplateSlot| match slot.secret {
            Secret::HashKey => credential.key_text(),
            Secret::HashIv => credential.iv_text(),
        };
        format!(
            "{}={}&{signing}&{}={}",
            self.leading.label,
            secret(&self.leading),
            self.trailing.label,
            secret(&self.trailing)
        )
    }
}

/// How the signing string is obtained from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningRule {
    /// All listed fields must be present; sorted case-insensitively.
    RequiredFields(&'static [&'static str]),
    /// Listed fields that are present; sorted case-insensitively.
    OptionalFields(&'static [&'static str]),
    /// An already-serialized payload is wrapped as-is.
    RawPayload,
}

/// Immutable descriptor of one gateway message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireProfile {
    /// Stable identifier.
    pub id: ProfileId,
    /// Canonical name.
    pub name: &'static str,
    /// Alternative names accepted by [`ProfileRegistry::get`].
    pub aliases: &'static [&'static str],
    /// Protocol generation.
    pub generation: Generation,
    /// Signing-string rule.
    pub signing: SigningRule,
    /// Secret template.
    pub template: Template,
}

impl WireProfile {
    /// Fields that must be present in the input map.
    #[must_use]
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self.signing {
            SigningRule::RequiredFields(fields) => fields,
            SigningRule::OptionalFields(_) | SigningRule::RawPayload => &[],
        }
    }

    /// Returns true if the profile wraps an already-serialized payload.
    #[must_use]
    pub fn is_raw_payload(&self) -> bool {
        matches!(self.signing, SigningRule::RawPayload)
    }

    fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}

impl fmt::Display for WireProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

const HASH_KEY_FIRST: Template =
    Template::new(("HashKey", Secret::HashKey), ("HashIV", Secret::HashIv));
const IV_FIRST: Template = Template::new(("IV", Secret::HashIv), ("Key", Secret::HashKey));
const HASH_IV_FIRST: Template =
    Template::new(("HashIV", Secret::HashIv), ("HashKey", Secret::HashKey));

/// `CheckCode` profile of inbound notifications.
pub const CALLBACK_CHECK_CODE: WireProfile = WireProfile {
    id: ProfileId::CallbackCheckCode,
    name: "callback-check-code",
    aliases: &["check_code"],
    generation: Generation::Legacy,
    signing: SigningRule::OptionalFields(&["Amt", "MerchantID", "MerchantOrderNo", "TradeNo"]),
    template: HASH_IV_FIRST,
};

/// Built-in profile table.
pub static PROFILES: [WireProfile; 6] = [
    WireProfile {
        id: ProfileId::CardPayment,
        name: "card-payment",
        aliases: &["mpg"],
        generation: Generation::Legacy,
        signing: SigningRule::RequiredFields(&[
            "Amt",
            "MerchantID",
            "MerchantOrderNo",
            "TimeStamp",
            "Version",
        ]),
        template: HASH_KEY_FIRST,
    },
    WireProfile {
        id: ProfileId::TransactionQuery,
        name: "transaction-query",
        aliases: &["query_trade_info"],
        generation: Generation::Legacy,
        signing: SigningRule::RequiredFields(&["Amt", "MerchantID", "MerchantOrderNo"]),
        template: IV_FIRST,
    },
    WireProfile {
        id: ProfileId::RecurringBilling,
        name: "recurring-billing",
        aliases: &["credit_card_period"],
        generation: Generation::Legacy,
        signing: SigningRule::RequiredFields(&[
            "MerchantID",
            "MerchantOrderNo",
            "PeriodAmt",
            "PeriodType",
            "TimeStamp",
        ]),
        template: HASH_KEY_FIRST,
    },
    WireProfile {
        id: ProfileId::TradeSha,
        name: "trade-sha",
        aliases: &["mpg20"],
        generation: Generation::V2,
        signing: SigningRule::RawPayload,
        template: HASH_KEY_FIRST,
    },
    WireProfile {
        id: ProfileId::WalletRefund,
        name: "wallet-refund",
        aliases: &["line_pay_refund"],
        generation: Generation::V2,
        signing: SigningRule::RawPayload,
        template: HASH_KEY_FIRST,
    },
    CALLBACK_CHECK_CODE,
];

/// Lookup over a profile table.
///
/// # Examples
///
/// ```
/// use spgateway::codec::profile::{ProfileId, ProfileRegistry};
///
/// let registry = ProfileRegistry::builtin();
/// assert_eq!(registry.get("mpg").unwrap().id, ProfileId::CardPayment);
/// assert!(registry.get("refund-v9").is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProfileRegistry {
    profiles: &'static [WireProfile],
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileRegistry {
    /// Registry over the built-in [`PROFILES`] table.
    #[must_use]
    pub const fn builtin() -> Self {
        Self { profiles: &PROFILES }
    }

    /// Registry over a caller-supplied table.
    #[must_use]
    pub const fn from_table(profiles: &'static [WireProfile]) -> Self {
        Self { profiles }
    }

    /// Looks a profile up by name or alias.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnsupportedProfile`] for an unknown name.
    pub fn get(&self, name: &str) -> Result<&'static WireProfile> {
        self.profiles
            .iter()
            .find(|profile| profile.answers_to(name))
            .ok_or_else(|| GatewayError::UnsupportedProfile(name.to_owned()))
    }

    /// Looks a profile up by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnsupportedProfile`] if the table lacks `id`.
    pub fn by_id(&self, id: ProfileId) -> Result<&'static WireProfile> {
        self.profiles
            .iter()
            .find(|profile| profile.id == id)
            .ok_or_else(|| GatewayError::UnsupportedProfile(format!("{id:?}")))
    }

    /// Iterates the profiles of one generation.
    pub fn generation(&self, generation: Generation) -> impl Iterator<Item = &'static WireProfile> {
        self.profiles.iter().filter(move |profile| profile.generation == generation)
    }

    /// Iterates every profile.
    pub fn iter(&self) -> impl Iterator<Item = &'static WireProfile> {
        self.profiles.iter()
    }
}
