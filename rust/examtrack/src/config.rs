use serde::{Deserialize, Serialize};

pub const HIGH_PERFORMER_PERCENT: f64 = 70.0;
pub const AT_RISK_PERCENT: f64 = 35.0;
pub const AT_RISK_DECLINE: f64 = -15.0;
pub const IMPROVING_RATE: f64 = 5.0;
pub const DECLINING_RATE: f64 = -5.0;
pub const LOW_PERFORMANCE_PERCENT: f64 = 35.0;
pub const LOW_PERFORMANCE_HIGH_SEVERITY_PERCENT: f64 = 25.0;
pub const SUDDEN_DROP_PERCENT: f64 = 10.0;
pub const IMPROVEMENT_RECOGNITION_RATE: f64 = 15.0;
pub const PASS_PERCENT: f64 = 60.0;
pub const FAIL_PERCENT: f64 = 35.0;
pub const WINDOW_SIZE: usize = 3;
pub const REPORT_LIST_SIZE: usize = 5;

/// Every threshold the engine compares against. Missing keys in a JSON
/// override keep their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsConfig {
    pub high_performer_percent: f64,
    pub at_risk_percent: f64,
    pub at_risk_decline: f64,
    pub improving_rate: f64,
    pub declining_rate: f64,
    pub low_performance_percent: f64,
    pub low_performance_high_severity_percent: f64,
    pub sudden_drop_percent: f64,
    pub improvement_recognition_rate: f64,
    pub pass_percent: f64,
    pub fail_percent: f64,
    pub window_size: usize,
    pub report_list_size: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            high_performer_percent: HIGH_PERFORMER_PERCENT,
            at_risk_percent: AT_RISK_PERCENT,
            at_risk_decline: AT_RISK_DECLINE,
            improving_rate: IMPROVING_RATE,
            declining_rate: DECLINING_RATE,
            low_performance_percent: LOW_PERFORMANCE_PERCENT,
            low_performance_high_severity_percent: LOW_PERFORMANCE_HIGH_SEVERITY_PERCENT,
            sudden_drop_percent: SUDDEN_DROP_PERCENT,
            improvement_recognition_rate: IMPROVEMENT_RECOGNITION_RATE,
            pass_percent: PASS_PERCENT,
            fail_percent: FAIL_PERCENT,
            window_size: WINDOW_SIZE,
            report_list_size: REPORT_LIST_SIZE,
        }
    }
}

impl AnalyticsConfig {
    /// Applies the keys present in `patch` on top of `self`.
    pub fn merged(&self, patch: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut base = serde_json::to_value(self)?;
        if let (Some(dst), Some(src)) = (base.as_object_mut(), patch.as_object()) {
            for (k, v) in src {
                if dst.contains_key(k) {
                    dst.insert(k.clone(), v.clone());
                }
            }
        }
        serde_json::from_value(base)
    }
}
