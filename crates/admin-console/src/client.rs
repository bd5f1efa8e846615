//! Thin HTTP client for `/api/admin`.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("请求错误: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    #[serde(default)]
    pub total_verifications: u64,
    #[serde(default)]
    pub total_unique_users: u64,
    #[serde(default)]
    pub total_generated_notes: u64,
    #[serde(default)]
    pub last_updated: String,
}

#[derive(Debug, Deserialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub event_type: String,
    pub count: i64,
    /// Only present in the analytics view.
    #[serde(default)]
    pub percentage: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    #[serde(default)]
    pub today_events: i64,
    #[serde(default)]
    pub yesterday_events: i64,
    #[serde(default)]
    pub event_type_distribution: Vec<TypeCount>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeStat {
    pub code: String,
    pub used_count: i64,
    pub max_uses: i64,
    #[serde(rename = "uniqueIPs")]
    pub unique_ips: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    pub last_used: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub system_stats: SystemStats,
    #[serde(default)]
    pub event_stats: Option<EventStats>,
    #[serde(default)]
    pub invite_code_stats: Vec<CodeStat>,
}

#[derive(Debug, Deserialize)]
pub struct SeriesPoint {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAnalytics {
    pub total_events: i64,
    pub unique_user_count: i64,
    #[serde(default)]
    pub event_type_distribution: Vec<TypeCount>,
    #[serde(default)]
    pub time_series_data: Vec<SeriesPoint>,
}

#[derive(Debug, Deserialize)]
struct AnalyticsEnvelope {
    analytics: EventAnalytics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Created {
    invite_code: String,
}

pub struct AdminClient {
    http: Client,
    base_url: String,
    admin_key: String,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>, admin_key: impl Into<String>) -> Result<Self, AdminError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            admin_key: admin_key.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .query(&[("key", self.admin_key.as_str())])
    }

    /// Decode a `{success, message?, ...payload}` envelope.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AdminError> {
        let body: Value = builder.send().await?.json().await?;
        if body.get("success").and_then(Value::as_bool) != Some(true) {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("未知错误");
            return Err(AdminError::Rejected(message.to_string()));
        }
        serde_json::from_value(body).map_err(|e| AdminError::Rejected(e.to_string()))
    }

    pub async fn dashboard(&self) -> Result<Dashboard, AdminError> {
        self.send(self.request(Method::GET, "/dashboard")).await
    }

    pub async fn generate_code(&self, prefix: Option<&str>, max_uses: i64) -> Result<String, AdminError> {
        let body = json!({
            "prefix": prefix,
            "maxUses": max_uses,
            "adminKey": self.admin_key,
        });
        let created: Created = self
            .send(self.request(Method::POST, "/invite-code").json(&body))
            .await?;
        Ok(created.invite_code)
    }

    pub async fn delete_code(&self, code: &str) -> Result<(), AdminError> {
        let _: Value = self
            .send(self.request(Method::DELETE, &format!("/invite-code/{code}")))
            .await?;
        Ok(())
    }

    pub async fn event_analytics(&self) -> Result<EventAnalytics, AdminError> {
        let envelope: AnalyticsEnvelope = self
            .send(self.request(Method::GET, "/event-analytics").query(&[("groupBy", "day")]))
            .await?;
        Ok(envelope.analytics)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Json, Router,
        extract::Query,
        http::StatusCode,
        routing::{delete, get, post},
    };
    use std::collections::HashMap;

    use super::*;

    async fn stub() -> String {
        let app = Router::new()
            .route(
                "/api/admin/dashboard",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    if q.get("key").map(String::as_str) != Some("secret") {
                        return (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"success": false, "message": "未授权访问，需要管理员权限"})),
                        );
                    }
                    (
                        StatusCode::OK,
                        Json(json!({
                            "success": true,
                            "systemStats": {"totalVerifications": 3, "totalUniqueUsers": 2,
                                            "totalGeneratedNotes": 9, "lastUpdated": "2024-05-01T00:00:00.000Z"},
                            "inviteCodeStats": [{"code": "SOULNOTE2023", "usedCount": 3, "maxUses": 100,
                                                 "uniqueIPs": 2, "lastUsed": "Never", "createdAt": null}],
                            "userCount": 2,
                            "userTrends": [],
                            "eventStats": {"todayEvents": 4, "yesterdayEvents": 1,
                                           "eventTypeDistribution": [{"type": "page_view", "count": 5}]}
                        })),
                    )
                }),
            )
            .route(
                "/api/admin/invite-code",
                post(|Json(body): Json<Value>| async move {
                    let prefix = body["prefix"].as_str().unwrap_or("SN").to_string();
                    (
                        StatusCode::CREATED,
                        Json(json!({"success": true, "inviteCode": format!("{prefix}ABCDEFGH"),
                                    "message": "邀请码生成成功"})),
                    )
                }),
            )
            .route(
                "/api/admin/invite-code/{code}",
                delete(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"success": false, "message": "邀请码不存在"})),
                    )
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/api/admin")
    }

    #[tokio::test]
    async fn reads_dashboard_and_creates_codes() {
        let client = AdminClient::new(stub().await, "secret").unwrap();
        let dashboard = client.dashboard().await.unwrap();
        assert_eq!(dashboard.system_stats.total_generated_notes, 9);
        assert_eq!(dashboard.invite_code_stats[0].code, "SOULNOTE2023");
        assert_eq!(dashboard.event_stats.unwrap().today_events, 4);

        assert_eq!(
            client.generate_code(Some("SOUL"), 10).await.unwrap(),
            "SOULABCDEFGH"
        );
    }

    #[tokio::test]
    async fn surfaces_server_messages() {
        let base = stub().await;
        let wrong = AdminClient::new(base.clone(), "nope").unwrap();
        match wrong.dashboard().await {
            Err(AdminError::Rejected(message)) => assert_eq!(message, "未授权访问，需要管理员权限"),
            other => panic!("unexpected: {other:?}"),
        }

        let client = AdminClient::new(base, "secret").unwrap();
        match client.delete_code("MISSING").await {
            Err(AdminError::Rejected(message)) => assert_eq!(message, "邀请码不存在"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
