//! Canonical renderings of parameter maps.
//!
//! Two deterministic forms exist:
//! - the *payload* form (insertion order, values form-urlencoded) that gets
//!   encrypted into `PostData_` / `TradeInfo`
//! - the *signing* form (selected fields, sorted by lowercase name, raw
//!   values) that gets wrapped into a check-value template

use url::form_urlencoded;

use crate::{
    codec::ParamMap,
    error::{GatewayError, Result},
};

/// Renders `key=value&...` in insertion order with form-urlencoded values.
///
/// Keys are emitted verbatim. Values keep alphanumerics and `*-._`, turn
/// spaces into `+` and percent-encode everything else.
///
/// # Errors
///
/// Returns [`GatewayError::MissingField`] if any `required` field is absent.
///
/// # Examples
///
/// ```
/// use spgateway::codec::{ParamMap, canonical::render_payload};
///
/// let params = ParamMap::new().with("ItemDesc", "Tea & cake").with("Amt", 120);
/// assert_eq!(render_payload(&params, &["Amt"]).unwrap(), "ItemDesc=Tea+%26+cake&Amt=120");
/// ```
pub fn render_payload(map: &ParamMap, required: &[&str]) -> Result<String> {
    ensure_present(map, required)?;

    let mut out = String::new();
    for (key, value) in map.iter() {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(key);
        out.push('=');
        out.extend(form_urlencoded::byte_serialize(value.to_string().as_bytes()));
    }
    Ok(out)
}

/// Renders the signing string for exactly `fields`.
///
/// Selected pairs are sorted by field name compared case-insensitively; ties
/// keep the order in which they appear in `fields`. Values are not encoded.
///
/// # Errors
///
/// Returns [`GatewayError::MissingField`] naming the first field of `fields`
/// that is absent from `map`.
///
/// # Examples
///
/// ```
/// use spgateway::codec::{ParamMap, canonical::render_for_signing};
///
/// let params = ParamMap::new().with("MerchantID", "5000").with("Amt", "100");
/// let signing = render_for_signing(&params, &["MerchantID", "Amt"]).unwrap();
/// assert_eq!(signing, "Amt=100&MerchantID=5000");
/// ```
pub fn render_for_signing(map: &ParamMap, fields: &[&str]) -> Result<String> {
    ensure_present(map, fields)?;
    Ok(render_selected(map, fields))
}

/// Like [`render_for_signing`] but silently skips absent fields.
#[must_use]
pub fn render_selected(map: &ParamMap, fields: &[&str]) -> String {
    let mut selected: Vec<(&str, String)> = fields
        .iter()
        .filter_map(|field| map.get(field).map(|value| (*field, value.to_string())))
        .collect();

    // sort_by_cached_key is stable
    selected.sort_by_cached_key(|(key, _)| key.to_lowercase());

    selected.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&")
}

fn ensure_present(map: &ParamMap, fields: &[&str]) -> Result<()> {
    match fields.iter().find(|field| !map.contains_key(field)) {
        Some(missing) => Err(GatewayError::MissingField((*missing).to_owned())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_payload_preserves_insertion_order() {
        let params = ParamMap::new().with("Version", "1.5").with("Amt", 100).with("Email", "a@b.tw");
        assert_eq!(render_payload(&params, &[]).unwrap(), "Version=1.5&Amt=100&Email=a%40b.tw");
    }

    #[test]
    fn test_render_payload_encodes_values_only() {
        let params = ParamMap::new().with("ItemDesc", "綠茶=1");
        assert_eq!(
            render_payload(&params, &[]).unwrap(),
            "ItemDesc=%E7%B6%A0%E8%8C%B6%3D1"
        );
    }

    #[test]
    fn test_render_payload_empty_map() {
        assert_eq!(render_payload(&ParamMap::new(), &[]).unwrap(), "");
    }

    #[test]
    fn test_render_payload_missing_required() {
        let params = ParamMap::new().with("Amt", 100);
        let err = render_payload(&params, &["Amt", "MerchantOrderNo"]).unwrap_err();
        assert!(matches!(err, GatewayError::MissingField(ref f) if f == "MerchantOrderNo"));
    }

    #[test]
    fn test_signing_sorts_case_insensitively() {
        let params = ParamMap::new()
            .with("version", "2.0")
            .with("MerchantOrderNo", "O1")
            .with("amt", "10")
            .with("TimeStamp", "1");
        let signing =
            render_for_signing(&params, &["version", "MerchantOrderNo", "amt", "TimeStamp"])
                .unwrap();
        assert_eq!(signing, "amt=10&MerchantOrderNo=O1&TimeStamp=1&version=2.0");
    }

    #[test]
    fn test_signing_ignores_unrelated_fields() {
        let base = ParamMap::new().with("MerchantID", "5000").with("Amt", "100");
        let extended = base.clone().with("ItemDesc", "ignored").with("Email", "x@y.z");
        assert_eq!(
            render_for_signing(&base, &["Amt", "MerchantID"]).unwrap(),
            render_for_signing(&extended, &["Amt", "MerchantID"]).unwrap()
        );
    }

    #[test]
    fn test_signing_does_not_encode() {
        let params = ParamMap::new().with("MerchantOrderNo", "A B&C");
        assert_eq!(
            render_for_signing(&params, &["MerchantOrderNo"]).unwrap(),
            "MerchantOrderNo=A B&C"
        );
    }

    #[test]
    fn test_signing_case_ties_keep_field_order() {
        let params = ParamMap::new().with("amt", "1").with("Amt", "2");
        assert_eq!(render_for_signing(&params, &["Amt", "amt"]).unwrap(), "Amt=2&amt=1");
    }

    #[test]
    fn test_signing_missing_field() {
        let params = ParamMap::new().with("Amt", "100");
        let err = render_for_signing(&params, &["Amt", "MerchantID"]).unwrap_err();
        assert!(matches!(err, GatewayError::MissingField(ref f) if f == "MerchantID"));
    }

    #[test]
    fn test_render_selected_skips_absent() {
        let params = ParamMap::new().with("TradeNo", "T1").with("Amt", "5");
        assert_eq!(render_selected(&params, &["Amt", "MerchantID", "TradeNo"]), "Amt=5&TradeNo=T1");
    }
}
