use crate::debug::{DebugError, DebugStore};
use crate::models::{ApiCallRecord, Body};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportTarget {
    Response,
    Request,
}

#[derive(Serialize)]
struct RequestExport<'a> {
    method: &'a str,
    url: &'a str,
    body: serde_json::Value,
}

/// Text placed on the clipboard. JSON bodies come out as pretty JSON.
pub fn export_text(record: &ApiCallRecord, target: ExportTarget) -> Result<String, DebugError> {
    match target {
        ExportTarget::Response => match &record.response_body {
            Some(Body::Json(value)) => Ok(serde_json::to_string_pretty(value)?),
            Some(Body::Text(text)) => Ok(text.clone()),
            None => Ok(record.error.clone().unwrap_or_default()),
        },
        ExportTarget::Request => {
            let body = match &record.request_body {
                Some(Body::Json(v)) => v.clone(),
                Some(Body::Text(t)) => serde_json::Value::String(t.clone()),
                None => serde_json::Value::Null,
            };
            let export = RequestExport { method: &record.method, url: &record.url, body };
            Ok(serde_json::to_string_pretty(&export)?)
        }
    }
}

pub fn export_record(store: &DebugStore, id: u64, target: ExportTarget) -> Result<String, DebugError> {
    let record = store.find(id).ok_or(DebugError::NoSuchRecord(id))?;
    export_text(&record, target)
}

pub fn copy_to_clipboard(text: &str) -> anyhow::Result<()> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn record() -> ApiCallRecord {
        ApiCallRecord {
            id: 7,
            method: "POST".into(),
            url: "/api/deployments/shop/web/restart".into(),
            request_body: Some(Body::Json(json!({"reason": "rollout"}))),
            status_code: Some(200),
            error: None,
            response_body: Some(Body::Json(json!({"message": "restarted"}))),
            content_type: Some("application/json".into()),
            response_size: Some(25),
            timestamp: Utc::now(),
            duration_ms: 31,
        }
    }

    #[test]
    fn response_export_is_valid_json() {
        let text = export_text(&record(), ExportTarget::Response).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({"message": "restarted"}));
    }

    #[test]
    fn request_export_includes_method_url_and_body() {
        let text = export_text(&record(), ExportTarget::Request).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            parsed,
            json!({"method": "POST", "url": "/api/deployments/shop/web/restart", "body": {"reason": "rollout"}})
        );
    }

    #[test]
    fn failed_call_exports_its_error() {
        let mut r = record();
        r.response_body = None;
        r.status_code = None;
        r.error = Some("network error: refused".into());
        assert_eq!(export_text(&r, ExportTarget::Response).unwrap(), "network error: refused");
    }

    #[test]
    fn exporting_an_unknown_id_is_an_error() {
        let store = DebugStore::new();
        let r = record();
        let id = r.id;
        assert!(matches!(export_record(&store, id, ExportTarget::Response), Err(DebugError::NoSuchRecord(i)) if i == id));
        store.record(r);
        assert!(export_record(&store, id, ExportTarget::Request).is_ok());
        store.clear_log();
        assert!(export_record(&store, id, ExportTarget::Request).is_err());
    }

    #[test]
    fn text_response_is_exported_verbatim() {
        let mut r = record();
        r.response_body = Some(Body::Text("upstream timeout".into()));
        assert_eq!(export_text(&r, ExportTarget::Response).unwrap(), "upstream timeout");
    }
}
