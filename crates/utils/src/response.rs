use serde::{Deserialize, Serialize};

/// JSON envelope shared by the admin, analytics and note endpoints.
///
/// The payload is flattened next to `success`, so `ApiResponse::success(x)`
/// renders as `{"success": true, ...fields of x}` which is what the web
/// front-end reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            data: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Created {
        invite_code: String,
    }

    #[test]
    fn payload_is_flattened_next_to_success() {
        let body = ApiResponse::success_with_message(
            Created {
                invite_code: "SNABC".into(),
            },
            "ok",
        );
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"success": true, "message": "ok", "inviteCode": "SNABC"})
        );
    }

    #[test]
    fn error_has_no_payload() {
        let value = serde_json::to_value(ApiResponse::error("nope")).unwrap();
        assert_eq!(value, json!({"success": false, "message": "nope"}));
    }
}
