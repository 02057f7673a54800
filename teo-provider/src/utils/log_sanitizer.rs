//! 日志脱敏
//!
//! Request/response bodies go to the debug log; secrets and oversized
//! payloads must not.

use serde_json::Value;

/// 单条日志中 body 的最大字节数
const BODY_LOG_LIMIT: usize = 512;

/// Payload keys whose values are never logged verbatim.
const SENSITIVE_KEYS: &[&str] = &["SecretId", "SecretKey", "Token", "Password", "PrivateKey"];

/// Largest char boundary not above `index`.
fn char_boundary_at_or_before(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0)
}

/// Cut `s` down to the body log limit, noting the original size.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= BODY_LOG_LIMIT {
        return s.to_string();
    }
    let end = char_boundary_at_or_before(s, BODY_LOG_LIMIT);
    format!("{}...({} bytes)", &s[..end], s.len())
}

/// Keep the first four characters of a credential, e.g. `AKID****`.
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if visible.len() == secret.len() {
        return "****".to_string();
    }
    format!("{visible}****")
}

/// JSON body prepared for logging: sensitive keys masked, then truncated.
pub fn body_for_log(body: &Value) -> String {
    let mut body = body.clone();
    redact(&mut body);
    truncate_for_log(&body.to_string())
}

fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if SENSITIVE_KEYS.iter().any(|k| key.ends_with(k)) {
                    if let Some(s) = v.as_str() {
                        *v = Value::String(mask_secret(s));
                        continue;
                    }
                }
                redact(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_body_kept() {
        assert_eq!(truncate_for_log(r#"{"ZoneId":"zone-1"}"#), r#"{"ZoneId":"zone-1"}"#);
    }

    #[test]
    fn long_body_cut_with_size() {
        let s = "x".repeat(BODY_LOG_LIMIT * 2);
        let out = truncate_for_log(&s);
        assert!(out.starts_with(&"x".repeat(BODY_LOG_LIMIT)));
        assert!(out.ends_with(&format!("...({} bytes)", BODY_LOG_LIMIT * 2)));
    }

    #[test]
    fn cut_respects_utf8() {
        // "站" 占 3 字节，限制落在字符中间
        let s = format!("a{}", "站".repeat(BODY_LOG_LIMIT));
        let out = truncate_for_log(&s);
        assert!(out.contains("..."));
    }

    #[test]
    fn secrets_are_masked() {
        assert_eq!(mask_secret("AKIDabcdefgh"), "AKID****");
        assert_eq!(mask_secret("abc"), "****");
    }

    #[test]
    fn nested_sensitive_keys_redacted() {
        let body = json!({
            "ZoneId": "zone-1",
            "OriginInfo": {
                "PrivateParameters": [{"Name": "SecretKey", "Value": "plain"}],
                "AccessSecretKey": "supersecret"
            }
        });
        let out = body_for_log(&body);
        assert!(out.contains("zone-1"));
        assert!(out.contains("supe****"));
        assert!(!out.contains("supersecret"));
    }
}
