use serde::Deserialize;

const DEFAULT_FETCH_SIZE: usize = 500;
const DEFAULT_MAX_CONNECTIONS: usize = 4;

/// Connection settings for the Bolt driver.
#[derive(Deserialize, Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_fetch_size() -> usize {
    DEFAULT_FETCH_SIZE
}

fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

impl GraphConfig {
    pub fn new(
        uri: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            username: username.into(),
            password: password.into(),
            fetch_size: DEFAULT_FETCH_SIZE,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Batch and page sizes used by one pipeline run.
///
/// `None` means "send the whole table as a single batch".
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub page_size: usize,
    pub player_batch: Option<usize>,
    pub team_batch: Option<usize>,
    pub manager_batch: Option<usize>,
    pub national_team_batch: Option<usize>,
    pub played_for_batch: Option<usize>,
    pub represents_batch: Option<usize>,
    pub managed_by_batch: Option<usize>,
    pub managed_batch: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            player_batch: Some(500),
            team_batch: None,
            manager_batch: None,
            national_team_batch: None,
            played_for_batch: Some(1000),
            represents_batch: Some(1000),
            managed_by_batch: None,
            managed_batch: None,
        }
    }
}

/// Pair of players used for the post-load reachability probe.
#[derive(Deserialize, Debug, Clone)]
pub struct ProbeConfig {
    pub from: String,
    pub to: String,
    pub max_hops: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            from: "Harry Kane".to_string(),
            to: "Bukayo Saka".to_string(),
            max_hops: 6,
        }
    }
}
