//! Set-membership hashing.
//!
//! Set-typed attributes are compared by element hash rather than by position,
//! so the hash of an element must only depend on its content.

use serde_json::Value;

/// CRC32 (IEEE) of `s`, as a non-negative integer.
pub fn hash_string(s: &str) -> i64 {
    i64::from(crc32fast::hash(s.as_bytes()))
}

/// Render a scalar the way it appears in a hash key.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Hash of one element of an origin group's `records` set.
///
/// Covers `record`, `type`, `weight`, `private` and the `private_parameters`
/// list. Pairs are sorted before joining and the parameters are sorted among
/// themselves, so neither field order nor parameter order affects the result.
/// `record_id` is assigned remotely and deliberately left out.
pub fn origin_record_hash(record: &Value) -> i64 {
    let Some(fields) = record.as_object() else {
        return hash_string(&record.to_string());
    };

    let mut pairs: Vec<String> = ["record", "type", "weight", "private"]
        .iter()
        .filter_map(|key| {
            fields
                .get(*key)
                .and_then(scalar_to_string)
                .map(|v| format!("{key}={v}"))
        })
        .collect();

    if let Some(params) = fields.get("private_parameters").and_then(Value::as_array) {
        let mut items: Vec<String> = params
            .iter()
            .filter_map(Value::as_object)
            .map(|p| {
                let name = p.get("name").and_then(scalar_to_string).unwrap_or_default();
                let value = p.get("value").and_then(scalar_to_string).unwrap_or_default();
                format!("{name}:{value}")
            })
            .collect();
        if !items.is_empty() {
            items.sort();
            pairs.push(format!("private_parameters=[{}]", items.join(",")));
        }
    }

    pairs.sort();
    hash_string(&pairs.join(";"))
}

/// ID of a data source result, derived from the IDs it returned.
pub fn ids_hash(ids: &[String]) -> String {
    hash_string(&ids.join("-")).to_string()
}

/// Default element hash for sets of scalars.
pub fn scalar_hash(value: &Value) -> i64 {
    hash_string(&scalar_to_string(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_hash_depends_on_order_and_content() {
        let a = ids_hash(&["zone-1".to_string(), "zone-2".to_string()]);
        let b = ids_hash(&["zone-2".to_string(), "zone-1".to_string()]);
        assert_ne!(a, b);
        assert_eq!(ids_hash(&[]), "0");
    }

    #[test]
    fn hash_string_matches_crc32_ieee() {
        // crc32("hello") = 0x3610a686
        assert_eq!(hash_string("hello"), 0x3610_a686);
        assert_eq!(hash_string(""), 0);
    }

    #[test]
    fn hash_string_is_non_negative() {
        for s in ["a", "zone-2o0i", "\u{ffff}\u{ffff}", "AKIDxxxxxxxx"] {
            assert!(hash_string(s) >= 0);
        }
    }

    #[test]
    fn private_parameter_order_does_not_matter() {
        let a = json!({
            "record": "bucket.cos.ap-guangzhou.myqcloud.com",
            "type": "COS",
            "private": true,
            "private_parameters": [
                {"name": "SecretAccessKey", "value": "sk"},
                {"name": "AccessKeyId", "value": "ak"}
            ]
        });
        let b = json!({
            "private": true,
            "private_parameters": [
                {"name": "AccessKeyId", "value": "ak"},
                {"name": "SecretAccessKey", "value": "sk"}
            ],
            "type": "COS",
            "record": "bucket.cos.ap-guangzhou.myqcloud.com"
        });
        assert_eq!(origin_record_hash(&a), origin_record_hash(&b));
    }

    #[test]
    fn record_id_is_ignored() {
        let planned = json!({"record": "1.1.1.1", "type": "IP_DOMAIN", "weight": 100});
        let stored = json!({"record": "1.1.1.1", "type": "IP_DOMAIN", "weight": 100, "record_id": "record-123"});
        assert_eq!(origin_record_hash(&planned), origin_record_hash(&stored));
    }

    #[test]
    fn null_fields_hash_like_absent_ones() {
        let a = json!({"record": "1.1.1.1", "weight": null});
        let b = json!({"record": "1.1.1.1"});
        assert_eq!(origin_record_hash(&a), origin_record_hash(&b));
    }

    #[test]
    fn differing_fields_change_the_hash() {
        let base = json!({"record": "1.1.1.1", "type": "IP_DOMAIN", "weight": 50});
        let other_weight = json!({"record": "1.1.1.1", "type": "IP_DOMAIN", "weight": 60});
        let other_record = json!({"record": "1.1.1.2", "type": "IP_DOMAIN", "weight": 50});
        let other_param = json!({
            "record": "1.1.1.1", "type": "IP_DOMAIN", "weight": 50,
            "private_parameters": [{"name": "AccessKeyId", "value": "x"}]
        });
        let h = origin_record_hash(&base);
        assert_ne!(h, origin_record_hash(&other_weight));
        assert_ne!(h, origin_record_hash(&other_record));
        assert_ne!(h, origin_record_hash(&other_param));
    }

    #[test]
    fn scalar_hash_uses_plain_text() {
        assert_eq!(scalar_hash(&json!("1.2.3.4")), hash_string("1.2.3.4"));
        assert_eq!(scalar_hash(&json!(80)), hash_string("80"));
    }
}
