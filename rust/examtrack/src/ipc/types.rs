use crate::config::AnalyticsConfig;
use crate::model::Model;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub model: Option<Model>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub config: AnalyticsConfig,
}

impl AppState {
    /// Queries before any load see an empty model.
    pub fn model(&self) -> &Model {
        static EMPTY: Model = Model {
            students: std::collections::BTreeMap::new(),
            exam_order: Vec::new(),
        };
        self.model.as_ref().unwrap_or(&EMPTY)
    }
}
