use axum::Router;
use db::models::event::EventFilter;
use serde::Deserialize;
use utils::time::parse_date_param;

use crate::state::AppState;

pub mod admin;
pub mod date_info;
pub mod events;
pub mod invite;
pub mod note;

/// Everything mounted under `/api`.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(invite::router(state))
        .merge(events::router(state))
        .merge(date_info::router())
        .nest("/note", note::router(state))
        .nest("/admin", admin::router(state))
}

/// `startDate`/`endDate`/`groupBy` query parameters shared by the analytics
/// endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub group_by: Option<String>,
}

impl RangeQuery {
    pub fn start(&self) -> Option<i64> {
        self.start_date.as_deref().and_then(parse_date_param)
    }

    pub fn end(&self) -> Option<i64> {
        self.end_date.as_deref().and_then(parse_date_param)
    }

    pub fn filter(&self) -> EventFilter {
        EventFilter {
            start: self.start(),
            end: self.end(),
            ..Default::default()
        }
    }
}
