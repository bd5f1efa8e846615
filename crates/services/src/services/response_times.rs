//! Rolling record of LLM latency used for the client's progress estimate.

use std::{collections::VecDeque, sync::Arc};

use dashmap::DashMap;

const HISTORY_LEN: usize = 10;
pub const DEFAULT_ESTIMATE_MS: u64 = 2000;

/// Typical latency per model before any sample has been recorded.
pub fn model_default_ms(model: &str) -> u64 {
    match model {
        "gpt-4" => 5000,
        "gpt-4-turbo" => 4000,
        "gpt-3.5-turbo" => 2000,
        "qwen-turbo" => 2000,
        "qwen-plus" => 3000,
        "qwen-max" => 4000,
        "chatglm-turbo" => 2000,
        "chatglm-pro" => 3000,
        "spark-desk" => 3000,
        "deepseek-r1" => 20000,
        _ => DEFAULT_ESTIMATE_MS,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseTimes {
    history: Arc<DashMap<String, VecDeque<u64>>>,
}

impl ResponseTimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, model: &str, elapsed_ms: u64) {
        let mut samples = self.history.entry(model.to_string()).or_default();
        if samples.len() >= HISTORY_LEN {
            samples.pop_front();
        }
        samples.push_back(elapsed_ms);
        tracing::debug!(model, elapsed_ms, "Recorded model response time");
    }

    /// Rounded mean of the recent samples, else the model's table value.
    pub fn estimate(&self, model: &str) -> u64 {
        match self.history.get(model) {
            Some(samples) if !samples.is_empty() => {
                let sum: u64 = samples.iter().sum();
                (sum as f64 / samples.len() as f64).round() as u64
            }
            _ => model_default_ms(model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_table() {
        let times = ResponseTimes::new();
        assert_eq!(times.estimate("qwen-max"), 4000);
        assert_eq!(times.estimate("deepseek-r1"), 20000);
        assert_eq!(times.estimate("something-else"), DEFAULT_ESTIMATE_MS);
    }

    #[test]
    fn averages_last_ten_samples() {
        let times = ResponseTimes::new();
        times.record("qwen-max", 1);
        times.record("qwen-max", 2);
        assert_eq!(times.estimate("qwen-max"), 2);

        for _ in 0..10 {
            times.record("qwen-max", 1000);
        }
        assert_eq!(times.estimate("qwen-max"), 1000);
    }
}
