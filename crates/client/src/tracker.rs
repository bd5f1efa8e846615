use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::task::JoinHandle;
use tracing::debug;

/// Screen and locale details attached to every event.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub user_agent: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub language: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackPayload<'a> {
    event_type: &'a str,
    user_id: &'a str,
    #[serde(flatten)]
    device: &'a DeviceInfo,
    timestamp: String,
    data: Value,
}

#[derive(Clone)]
pub struct EventTracker {
    http: reqwest::Client,
    endpoint: String,
    user_id: String,
    device: DeviceInfo,
}

impl EventTracker {
    pub fn new(base_url: &str, user_id: impl Into<String>, device: DeviceInfo) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: format!("{}/api/track", base_url.trim_end_matches('/')),
            user_id: user_id.into(),
            device,
        }
    }

    /// Send in the background. Failures are logged and dropped.
    pub fn track(&self, event_type: &str, data: Value) -> JoinHandle<()> {
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let payload = TrackPayload {
            event_type,
            user_id: &self.user_id,
            device: &self.device,
            timestamp: chrono::Utc::now().to_rfc3339(),
            data,
        };
        let body = serde_json::to_value(&payload);
        let event_type = event_type.to_string();

        tokio::spawn(async move {
            let body = match body {
                Ok(body) => body,
                Err(e) => {
                    debug!(event_type, error = %e, "Failed to encode event");
                    return;
                }
            };
            match http.post(&endpoint).json(&body).send().await {
                Ok(resp) if !resp.status().is_success() => {
                    debug!(event_type, status = %resp.status(), "Event rejected");
                }
                Ok(_) => {}
                Err(e) => debug!(event_type, error = %e, "Failed to send event"),
            }
        })
    }

    /// `pageName` and `path`, with any extra page parameters merged on top.
    pub fn page_view(&self, page_name: &str, path: &str, extra: Map<String, Value>) -> JoinHandle<()> {
        let data = merged(json!({ "pageName": page_name, "path": path }), extra);
        self.track("page_view", data)
    }

    /// The note parameters are sent as the event data unchanged.
    pub fn note_generate(&self, params: Value) -> JoinHandle<()> {
        self.track("note_generate", params)
    }

    pub fn note_save(&self, note_id: &str, content: &str) -> JoinHandle<()> {
        let data = json!({ "noteId": note_id, "contentLength": content.encode_utf16().count() });
        self.track("note_save", data)
    }

    pub fn note_export(&self, note_id: &str, format: &str) -> JoinHandle<()> {
        self.track("note_export", json!({ "noteId": note_id, "exportFormat": format }))
    }

    pub fn note_share(&self, note_id: &str, method: &str) -> JoinHandle<()> {
        self.track("note_share", json!({ "noteId": note_id, "shareMethod": method }))
    }

    pub fn param_select(&self, param_type: &str, value: Value, is_random: bool) -> JoinHandle<()> {
        let data = json!({ "paramType": param_type, "paramValue": value, "isRandom": is_random });
        self.track("param_select", data)
    }

    pub fn button_click(&self, button_id: &str, text: &str, context: &str) -> JoinHandle<()> {
        let data = json!({ "buttonId": button_id, "buttonText": text, "pageContext": context });
        self.track("button_click", data)
    }

    pub fn feature_use(&self, feature: &str, extra: Map<String, Value>) -> JoinHandle<()> {
        self.track("feature_use", merged(json!({ "featureName": feature }), extra))
    }
}

fn merged(base: Value, extra: Map<String, Value>) -> Value {
    let mut base = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    base.extend(extra);
    Value::Object(base)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, Router, extract::State, routing::post};

    use super::*;

    async fn spawn_stub() -> (String, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/api/track",
                post(|State(seen): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>| async move {
                    seen.lock().unwrap().push(body);
                    Json(json!({"success": true}))
                }),
            )
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), seen)
    }

    #[tokio::test]
    async fn posts_event_with_device_info() {
        let (base, seen) = spawn_stub().await;
        let device = DeviceInfo {
            user_agent: "test-agent".into(),
            screen_width: 390,
            screen_height: 844,
            language: "zh-CN".into(),
        };
        let tracker = EventTracker::new(&format!("{base}/"), "u1", device);
        tracker
            .param_select("zodiac", json!("aries"), true)
            .await
            .unwrap();

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event["eventType"], "param_select");
        assert_eq!(event["userId"], "u1");
        assert_eq!(event["screenWidth"], 390);
        assert_eq!(event["data"], json!({"paramType": "zodiac", "paramValue": "aries", "isRandom": true}));
        assert!(event["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unreachable_server_is_swallowed() {
        let tracker = EventTracker::new("http://127.0.0.1:9", "u1", DeviceInfo::default());
        tracker.page_view("home", "/", Map::new()).await.unwrap();
    }

    #[tokio::test]
    async fn helper_payloads_use_front_end_keys() {
        let (base, seen) = spawn_stub().await;
        let tracker = EventTracker::new(&base, "u2", DeviceInfo::default());

        let mut extra = Map::new();
        extra.insert("from".into(), json!("onboarding"));
        tracker.page_view("home", "/home", extra).await.unwrap();
        tracker
            .note_generate(json!({"zodiac": "leo", "mood": "开心"}))
            .await
            .unwrap();
        tracker.note_save("n1", "你好ab").await.unwrap();
        tracker.note_export("n1", "png").await.unwrap();
        tracker.note_share("n1", "wechat").await.unwrap();
        tracker.button_click("generate", "生成", "home").await.unwrap();
        tracker.feature_use("savage_mode", Map::new()).await.unwrap();

        let events = seen.lock().unwrap();
        let data: Vec<(String, Value)> = events
            .iter()
            .map(|e| (e["eventType"].as_str().unwrap().to_string(), e["data"].clone()))
            .collect();
        assert_eq!(
            data,
            vec![
                ("page_view".to_string(), json!({"pageName": "home", "path": "/home", "from": "onboarding"})),
                ("note_generate".to_string(), json!({"zodiac": "leo", "mood": "开心"})),
                ("note_save".to_string(), json!({"noteId": "n1", "contentLength": 4})),
                ("note_export".to_string(), json!({"noteId": "n1", "exportFormat": "png"})),
                ("note_share".to_string(), json!({"noteId": "n1", "shareMethod": "wechat"})),
                (
                    "button_click".to_string(),
                    json!({"buttonId": "generate", "buttonText": "生成", "pageContext": "home"})
                ),
                ("feature_use".to_string(), json!({"featureName": "savage_mode"})),
            ]
        );
    }
}
