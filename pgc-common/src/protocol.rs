//! Cross-context request/response messages
//!
//! Requests are tagged by an `action` field:
//!
//! ```json
//! {"action": "analyzeImage", "imageUrl": "https://..."}
//! {"action": "setApiToken", "token": "hf_..."}
//! {"action": "forceCheck"}
//! ```

use crate::verdict::Gender;
use serde::{Deserialize, Serialize};

/// Request sent to the analyzer over the cross-context channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Run picture inference for one image and answer with its gender
    AnalyzeImage {
        #[serde(rename = "imageUrl")]
        image_url: String,
    },

    /// Store (or clear, when empty/absent) the classification API token
    SetApiToken {
        #[serde(default)]
        token: Option<String>,
    },

    /// Start a manual analysis run on the current page
    ForceCheck,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::AnalyzeImage { .. } => "analyzeImage",
            Request::SetApiToken { .. } => "setApiToken",
            Request::ForceCheck => "forceCheck",
        }
    }
}

/// Response to `analyzeImage`; `gender` is null when inference produced nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeImageResponse {
    pub gender: Option<Gender>,
}

/// Response to `setApiToken`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetApiTokenResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response to `forceCheck`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceCheckResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Any response the analyzer can send back
///
/// Serialize-only: the bodies carry no tag, so callers decode the concrete
/// response type for the request they sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    AnalyzeImage(AnalyzeImageResponse),
    SetApiToken(SetApiTokenResponse),
    ForceCheck(ForceCheckResponse),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_tags() {
        let request: Request = serde_json::from_value(json!({
            "action": "analyzeImage",
            "imageUrl": "https://cdn.example/p.jpg"
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::AnalyzeImage {
                image_url: "https://cdn.example/p.jpg".to_string()
            }
        );

        let request: Request = serde_json::from_value(json!({"action": "forceCheck"})).unwrap();
        assert_eq!(request, Request::ForceCheck);
        assert_eq!(request.action(), "forceCheck");
    }

    #[test]
    fn test_set_token_without_token_field() {
        let request: Request = serde_json::from_value(json!({"action": "setApiToken"})).unwrap();
        assert_eq!(request, Request::SetApiToken { token: None });
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result = serde_json::from_value::<Request>(json!({"action": "reboot"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_null_gender_serializes_as_null() {
        let response = Response::AnalyzeImage(AnalyzeImageResponse { gender: None });
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({"gender": null}));

        let response = Response::AnalyzeImage(AnalyzeImageResponse {
            gender: Some(Gender::Female),
        });
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({"gender": "female"}));
    }

    #[test]
    fn test_untagged_responses_serialize_flat() {
        let response = Response::ForceCheck(ForceCheckResponse {
            success: true,
            message: Some("Check initiated".to_string()),
        });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": true, "message": "Check initiated"})
        );

        let response = Response::SetApiToken(SetApiTokenResponse {
            success: true,
            error: None,
        });
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({"success": true}));

        // Decoding goes through the concrete type for the request sent
        let decoded: SetApiTokenResponse =
            serde_json::from_value(json!({"success": false, "error": "disk full"})).unwrap();
        assert!(!decoded.success);
        assert_eq!(decoded.error.as_deref(), Some("disk full"));
    }
}
