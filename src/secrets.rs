use k8s_openapi::api::core::v1::Secret;

pub const MASK: &str = "••••••";

/// One key of a secret, masked unless revealed.
#[derive(Clone, Debug, PartialEq)]
pub struct SecretEntry {
    pub key: String,
    pub size: usize,
    pub value: String,
}

pub fn entries(secret: &Secret, revealed: bool) -> Vec<SecretEntry> {
    let mut out: Vec<SecretEntry> = secret
        .data
        .iter()
        .flatten()
        .map(|(key, bytes)| SecretEntry {
            key: key.clone(),
            size: bytes.0.len(),
            value: if revealed { String::from_utf8_lossy(&bytes.0).into_owned() } else { MASK.to_string() },
        })
        .collect();
    // stringData is write-only upstream but some backends echo it back.
    out.extend(secret.string_data.iter().flatten().map(|(key, value)| SecretEntry {
        key: key.clone(),
        size: value.len(),
        value: if revealed { value.clone() } else { MASK.to_string() },
    }));
    out
}

pub fn key_summary(secret: &Secret) -> String {
    let keys: Vec<String> = entries(secret, false).into_iter().map(|e| format!("{} ({}B)", e.key, e.size)).collect();
    if keys.is_empty() { "(no data)".to_string() } else { keys.join(", ") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;

    fn secret() -> Secret {
        Secret {
            data: Some(BTreeMap::from([("password".to_string(), ByteString(b"hunter2".to_vec()))])),
            ..Secret::default()
        }
    }

    #[test]
    fn values_are_masked_by_default() {
        let e = entries(&secret(), false);
        assert_eq!(e, vec![SecretEntry { key: "password".into(), size: 7, value: MASK.into() }]);
    }

    #[test]
    fn revealing_shows_decoded_value() {
        assert_eq!(entries(&secret(), true)[0].value, "hunter2");
    }

    #[test]
    fn base64_from_the_wire_is_decoded() {
        let s: Secret = serde_json::from_value(serde_json::json!({
            "metadata": {"name": "db"},
            "data": {"user": "YWRtaW4="}
        }))
        .unwrap();
        assert_eq!(entries(&s, true)[0].value, "admin");
        assert_eq!(key_summary(&s), "user (5B)");
    }

    #[test]
    fn empty_secret_summary() {
        assert_eq!(key_summary(&Secret::default()), "(no data)");
    }
}
