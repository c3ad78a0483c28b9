//! Command-line arguments and command execution.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use spgateway::{
    GatewayConfig, Mode, Result,
    codec::{CHECK_CODE_FIELD, ParamMap, ProfileId, SignatureStatus, TransactionCodec, response},
};
use tracing::{debug, instrument};

/// Spgateway / NewebPay codec tool.
#[derive(Debug, Parser)]
#[command(name = "spgateway", version, about)]
pub struct Cli {
    #[command(flatten)]
    merchant: MerchantArgs,

    /// Log more (`debug` instead of `warn`) unless `RUST_LOG` is set.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct MerchantArgs {
    /// TOML file with `mode`, `merchant_id`, `hash_key` and `hash_iv`.
    #[arg(long, global = true, env = "SPGATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Gateway environment: `test` or `production`.
    #[arg(long, global = true, env = "SPGATEWAY_MODE")]
    mode: Option<Mode>,

    /// Merchant id issued by the gateway.
    #[arg(long, global = true, env = "SPGATEWAY_MERCHANT_ID")]
    merchant_id: Option<String>,

    /// 32-byte hash key.
    #[arg(long, global = true, env = "SPGATEWAY_HASH_KEY", hide_env_values = true)]
    hash_key: Option<String>,

    /// 16-byte hash IV.
    #[arg(long, global = true, env = "SPGATEWAY_HASH_IV", hide_env_values = true)]
    hash_iv: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the check value of a field map or of an encrypted payload.
    CheckValue {
        /// Profile name or alias, e.g. `card-payment`, `mpg`, `trade-sha`.
        #[arg(long)]
        profile: String,

        /// Field as `Key=Value`; repeat for each field.
        #[arg(long = "field", short = 'f', value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Hex payload, for raw-payload profiles.
        #[arg(long, conflicts_with = "fields")]
        payload: Option<String>,
    },

    /// Encrypt fields (rendered `Key=Value&...`) or a raw text.
    Encrypt {
        /// Field as `Key=Value`; repeat for each field.
        #[arg(long = "field", short = 'f', value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Plaintext to encrypt as is.
        #[arg(long, conflicts_with = "fields")]
        text: Option<String>,
    },

    /// Decrypt a hex payload.
    Decrypt {
        /// Lowercase or uppercase hex ciphertext.
        payload: String,
    },

    /// Verify the `CheckCode` of a payment notification.
    VerifyCallback {
        /// Notification field as `Key=Value`, `CheckCode` included.
        #[arg(long = "field", short = 'f', value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },

    /// Decrypt a notification `TradeInfo` and check its `TradeSha`.
    DecodeTradeInfo {
        /// Hex `TradeInfo`, or inline JSON.
        trade_info: String,

        /// `TradeSha` sent alongside.
        #[arg(long)]
        trade_sha: Option<String>,
    },
}

impl Cli {
    /// Default level filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }

    /// Runs the selected command and returns its JSON output.
    ///
    /// # Errors
    ///
    /// Returns configuration, codec and decode errors.
    pub fn run(&self) -> Result<Value> {
        let codec = TransactionCodec::from_config(&self.merchant.to_config()?)?;
        execute(&self.command, &codec)
    }
}

impl MerchantArgs {
    /// Loads the config file, if any, then applies flag and environment
    /// overrides. Validation runs last so overrides can fill missing options.
    fn to_config(&self) -> Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => {
                debug!(path = %path.display(), "loading config file");
                let content = std::fs::read_to_string(path).map_err(|e| {
                    spgateway::GatewayError::ConfigError(format!(
                        "cannot read {}: {e}",
                        path.display()
                    ))
                })?;
                GatewayConfig::parse_toml(&content)?
            }
            None => GatewayConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(v) = &self.merchant_id {
            config.merchant_id = Some(v.clone());
        }
        if let Some(v) = &self.hash_key {
            config.hash_key = Some(v.clone());
        }
        if let Some(v) = &self.hash_iv {
            config.hash_iv = Some(v.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[instrument(skip_all)]
fn execute(command: &Command, codec: &TransactionCodec) -> Result<Value> {
    match command {
        Command::CheckValue { profile, fields, payload } => {
            let check_value = match payload {
                Some(payload) => codec.engine().compute_payload_check_value(profile, payload)?,
                None => codec.engine().compute_check_value(profile, &to_params(fields))?,
            };
            Ok(json!({ "profile": profile, "check_value": check_value.as_str() }))
        }
        Command::Encrypt { fields, text } => {
            let payload = match text {
                Some(text) => codec.cipher().encode(text),
                None => codec.encode_params(&to_params(fields), &[])?,
            };
            Ok(json!({ "payload": payload }))
        }
        Command::Decrypt { payload } => {
            Ok(json!({ "plaintext": codec.cipher().decode_str(payload)? }))
        }
        Command::VerifyCallback { fields } => {
            let params = to_params(fields);
            let present = params.contains_key(CHECK_CODE_FIELD);
            let valid = codec.engine().verify_check_code(&params);
            Ok(json!({ "check_code_present": present, "valid": valid }))
        }
        Command::DecodeTradeInfo { trade_info, trade_sha } => {
            let mut fields = serde_json::Map::new();
            fields.insert("TradeInfo".to_owned(), trade_info.as_str().into());
            if let Some(sha) = trade_sha {
                fields.insert("TradeSha".to_owned(), sha.as_str().into());
            }
            let decoded = response::decode_encrypted_fields(
                fields,
                "TradeInfo",
                "TradeSha",
                ProfileId::TradeSha,
                codec,
            )?;
            let signature = signature_name(decoded.signature);
            Ok(json!({ "signature": signature, "fields": decoded.into_value() }))
        }
    }
}

fn to_params(fields: &[(String, String)]) -> ParamMap {
    fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

fn signature_name(status: SignatureStatus) -> &'static str {
    match status {
        SignatureStatus::NotPresent => "not_present",
        SignatureStatus::Valid => "valid",
        SignatureStatus::Invalid => "invalid",
    }
}

fn parse_field(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected Key=Value, got {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef";
    const IV: &str = "0123456789abcdef";

    fn cli(args: &[&str]) -> Cli {
        let base = [
            "spgateway",
            "--mode",
            "test",
            "--merchant-id",
            "MS12345",
            "--hash-key",
            KEY,
            "--hash-iv",
            IV,
        ];
        Cli::try_parse_from(base.iter().chain(args).copied()).unwrap()
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(parse_field("Amt=100").unwrap(), ("Amt".to_owned(), "100".to_owned()));
        assert_eq!(parse_field("Desc=a=b").unwrap(), ("Desc".to_owned(), "a=b".to_owned()));
        assert!(parse_field("Amt").is_err());
        assert!(parse_field("=1").is_err());
    }

    #[test]
    fn test_check_value_command() {
        let output = cli(&[
            "check-value",
            "--profile",
            "mpg",
            "-f",
            "Amt=1000",
            "-f",
            "MerchantID=MS12345",
            "-f",
            "MerchantOrderNo=ORDER1",
            "-f",
            "TimeStamp=1700000000",
            "-f",
            "Version=2.0",
        ])
        .run()
        .unwrap();
        assert_eq!(
            output["check_value"],
            "98CA6CB56297D659ED5FC194DD4576E0BDBEC568211CFF4AE30231DF024F80D0"
        );
    }

    #[test]
    fn test_encrypt_then_decrypt() {
        let encrypted = cli(&["encrypt", "-f", "MerchantID=MS12345", "-f", "Amt=1000"]).run().unwrap();
        let payload = encrypted["payload"].as_str().unwrap();
        assert_eq!(payload, "c3ee3e7ee77151ca517475567c37e33cfec0b37c8cb339d8ba835436dcde1615");

        let decrypted = cli(&["decrypt", payload]).run().unwrap();
        assert_eq!(decrypted["plaintext"], "MerchantID=MS12345&Amt=1000");
    }

    #[test]
    fn test_verify_callback() {
        let output = cli(&[
            "verify-callback",
            "-f",
            "Amt=1000",
            "-f",
            "MerchantID=MS12345",
            "-f",
            "MerchantOrderNo=ORDER1",
            "-f",
            "TradeNo=T123",
            "-f",
            "CheckCode=1EF208EFBF5B8E438C097A76FC79251C9E8BC9C9FAD1E85DBEB9DEB4CEF036B5",
        ])
        .run()
        .unwrap();
        assert_eq!(output["valid"], true);
        assert_eq!(output["check_code_present"], true);
    }

    #[test]
    fn test_decode_trade_info() {
        let output = cli(&[
            "decode-trade-info",
            "a6a33edeab69cbb6cf7153eb75d3c8fca5993bcb8ef63163fcc306d723e8030d",
            "--trade-sha",
            "259D697CED40D2D0703E688A27616F952B0BC4B077263AD5008FEA8444EB4F2B",
        ])
        .run()
        .unwrap();
        assert_eq!(output["signature"], "valid");
        assert_eq!(output["fields"]["Amt"], 100);
    }

    #[test]
    fn test_missing_hash_key_fails() {
        let parsed = Cli::try_parse_from([
            "spgateway",
            "--merchant-id",
            "MS12345",
            "--hash-iv",
            IV,
            "decrypt",
            "00",
        ])
        .unwrap();
        let err = parsed.merchant.to_config().unwrap_err();
        assert!(matches!(err, spgateway::GatewayError::MissingOption(_)));
    }
}
