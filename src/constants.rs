use rand::seq::SliceRandom;

pub const DEFAULT_API_BASE_URL: &str = "https://api.blockmesh.xyz";
pub const DEFAULT_APP_BASE_URL: &str = "https://app.blockmesh.xyz";
pub const DEFAULT_TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 900_000;
pub const DEFAULT_FAILURE_COOLDOWN_MS: u64 = 30_000;
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_NOTIFY_QUEUE_CAPACITY: usize = 16;

const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/122.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
];

/// Picks a desktop browser User-Agent for a single request.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_user_agent_comes_from_known_list() {
        for _ in 0..20 {
            let ua = random_user_agent();
            assert!(USER_AGENTS.contains(&ua));
        }
    }

    #[test]
    fn default_cadence_matches_reporting_contract() {
        assert_eq!(DEFAULT_POLLING_INTERVAL_MS, 15 * 60 * 1000);
        assert_eq!(DEFAULT_FAILURE_COOLDOWN_MS, 30 * 1000);
        assert_eq!(DEFAULT_MAX_CONSECUTIVE_FAILURES, 5);
    }
}
