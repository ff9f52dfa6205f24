//! VNPay-class gateway protocol: the callback contract a checkout
//! redirect and server-to-server IPN must satisfy.
//!
//! We depend on real HMAC/hex crates and implement the wire protocol;
//! we do not reimplement VNPay's servers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

#[derive(Debug, Clone)]
pub struct VnpayConfig {
    pub tmn_code: String,
    pub hash_secret: String,
    pub payment_url: String,
    pub return_url: String,
}

#[derive(Debug, Clone)]
pub struct CreateUrlRequest {
    pub order_id: String,
    /// Amount in the gateway's minor unit (spec: VND × 100) is computed
    /// internally from the major-unit `amount_major`.
    pub amount_major: rust_decimal::Decimal,
    pub order_desc: String,
    pub locale: String,
    pub client_ip: String,
    pub create_date: DateTime<Utc>,
}

/// ASCII-normalises a description: VNPay's `vnp_OrderInfo` field rejects
/// non-ASCII and must be URL-safe once percent-encoded.
pub fn normalize_description(input: &str) -> String {
    let ascii: String = input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == ' ' { c } else { ' ' })
        .collect();
    let trimmed = ascii.split_whitespace().collect::<Vec<_>>().join(" ");
    trimmed.chars().take(50).collect()
}

/// Builds the signed payment URL. Params are sorted
/// by key and percent-encoded before signing so the signature is
/// reproducible regardless of insertion order.
pub fn build_payment_url(config: &VnpayConfig, req: &CreateUrlRequest) -> String {
    let amount_minor = (req.amount_major * rust_decimal::Decimal::from(100))
        .round()
        .to_string();

    let mut params: BTreeMap<&'static str, String> = BTreeMap::new();
    params.insert("vnp_Version", "2.1.0".into());
    params.insert("vnp_Command", "pay".into());
    params.insert("vnp_TmnCode", config.tmn_code.clone());
    params.insert("vnp_Amount", amount_minor);
    params.insert("vnp_CurrCode", "VND".into());
    params.insert("vnp_TxnRef", req.order_id.clone());
    params.insert("vnp_OrderInfo", normalize_description(&req.order_desc));
    params.insert("vnp_OrderType", "other".into());
    params.insert("vnp_Locale", req.locale.clone());
    params.insert("vnp_CreateDate", req.create_date.format("%Y%m%d%H%M%S").to_string());
    params.insert("vnp_IpAddr", req.client_ip.clone());
    params.insert("vnp_ReturnUrl", config.return_url.clone());

    let query = canonical_query(&params);
    let signature = sign(&config.hash_secret, &query);

    format!("{}?{}&vnp_SecureHash={}", config.payment_url, query, signature)
}

fn canonical_query(params: &BTreeMap<&'static str, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn urlencode(value: &str) -> String {
    serde_urlencoded::to_string([("v", value)])
        .ok()
        .and_then(|s| s.strip_prefix("v=").map(str::to_string))
        .unwrap_or_else(|| value.to_string())
}

fn sign(hash_secret: &str, data: &str) -> String {
    let mut mac =
        HmacSha512::new_from_slice(hash_secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Fields extracted from a gateway return-URL/IPN callback.
#[derive(Debug, Clone)]
pub struct CallbackParams {
    pub order_id: String,
    pub amount_minor: i64,
    pub response_code: String,
    pub transaction_no: String,
    pub bank_code: Option<String>,
    pub card_type: Option<String>,
    pub pay_date: Option<String>,
    pub secure_hash: String,
    /// Every other `vnp_*` query parameter, needed to reconstruct the
    /// exact string that was signed.
    pub raw: BTreeMap<String, String>,
}

impl CallbackParams {
    /// Builds a `CallbackParams` from the raw query parameters of a
    /// gateway return-URL/IPN request. Missing required fields map to
    /// `AppError::BadRequest`
    /// rather than panicking — a malformed callback is client error, not
    /// an internal one.
    pub fn from_query(params: &std::collections::HashMap<String, String>) -> Result<Self, String> {
        let get = |key: &str| -> Result<String, String> {
            params.get(key).cloned().ok_or_else(|| format!("missing {key}"))
        };

        let amount_minor: i64 = get("vnp_Amount")?
            .parse()
            .map_err(|_| "vnp_Amount is not a valid integer".to_string())?;

        let raw = params
            .iter()
            .filter(|(k, _)| k.starts_with("vnp_"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            order_id: get("vnp_TxnRef")?,
            amount_minor,
            response_code: get("vnp_ResponseCode")?,
            transaction_no: get("vnp_TransactionNo").unwrap_or_default(),
            bank_code: params.get("vnp_BankCode").cloned(),
            card_type: params.get("vnp_CardType").cloned(),
            pay_date: params.get("vnp_PayDate").cloned(),
            secure_hash: get("vnp_SecureHash")?,
            raw,
        })
    }
}

/// Verifies `vnp_SecureHash` over the canonical parameter string (spec
/// §6, §7 `GatewaySignature`). The hash field itself is excluded from
/// the string that gets re-signed.
pub fn verify_signature(hash_secret: &str, params: &CallbackParams) -> bool {
    let mut signable: BTreeMap<&str, &str> = BTreeMap::new();
    for (k, v) in &params.raw {
        if k == "vnp_SecureHash" || k == "vnp_SecureHashType" {
            continue;
        }
        signable.insert(k.as_str(), v.as_str());
    }

    let query = signable
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let expected = sign(hash_secret, &query);
    constant_time_eq(&expected, &params.secure_hash.to_lowercase())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Gateway-specific success predicate: VNPay signals success with
/// response code `"00"`.
pub fn is_success(params: &CallbackParams) -> bool {
    params.response_code == "00"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_and_verifies_round_trip() {
        let secret = "test-secret";
        let mut raw = BTreeMap::new();
        raw.insert("vnp_TxnRef".to_string(), "order-1".to_string());
        raw.insert("vnp_Amount".to_string(), "10000".to_string());
        raw.insert("vnp_ResponseCode".to_string(), "00".to_string());

        let query: String = {
            let mut m = BTreeMap::new();
            for (k, v) in &raw {
                m.insert(k.as_str(), v.clone());
            }
            m.iter().map(|(k, v)| format!("{k}={}", urlencode(v))).collect::<Vec<_>>().join("&")
        };
        let hash = sign(secret, &query);

        let params = CallbackParams {
            order_id: "order-1".into(),
            amount_minor: 10000,
            response_code: "00".into(),
            transaction_no: "txn-1".into(),
            bank_code: None,
            card_type: None,
            pay_date: None,
            secure_hash: hash,
            raw,
        };

        assert!(verify_signature(secret, &params));
        assert!(is_success(&params));
    }

    #[test]
    fn tampered_params_fail_verification() {
        let secret = "test-secret";
        let mut raw = BTreeMap::new();
        raw.insert("vnp_TxnRef".to_string(), "order-1".to_string());
        raw.insert("vnp_Amount".to_string(), "10000".to_string());
        raw.insert("vnp_ResponseCode".to_string(), "00".to_string());

        let params = CallbackParams {
            order_id: "order-1".into(),
            amount_minor: 10000,
            response_code: "00".into(),
            transaction_no: "txn-1".into(),
            bank_code: None,
            card_type: None,
            pay_date: None,
            secure_hash: "deadbeef".into(),
            raw,
        };

        assert!(!verify_signature(secret, &params));
    }

    #[test]
    fn description_strips_diacritics_and_truncates() {
        let normalized = normalize_description("Vé xem phim: Chúa tể những chiếc nhẫn!!!");
        assert!(normalized.is_ascii());
        assert!(normalized.len() <= 50);
    }
}
