use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.apify.com/v2";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    /// Whole-request deadline. Streaming responses can run for minutes, so
    /// this is off unless configured.
    pub request_timeout: Option<Duration>,
    /// Base of the crawling API, used to build the results URL from a run id.
    pub api_base: String,
    /// Sent as the `token` query parameter on crawling API calls.
    pub api_token: Option<String>,
    /// Fixed wait between starting a run and fetching its results.
    pub poll_wait: Duration,
    pub progress_tick: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            api_base: DEFAULT_API_BASE.to_string(),
            api_token: None,
            poll_wait: Duration::from_secs(29),
            progress_tick: Duration::from_millis(100),
        }
    }
}
