use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use scoring_core::{DataError, DataResult};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const MAX_ATTEMPTS: u32 = 3;

pub(crate) fn build_client() -> DataResult<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()?)
}

/// GET with automatic 429 retry. Waits `backoff × attempt` between tries.
pub(crate) async fn get_with_retry(
    client: &Client,
    url: &str,
    provider: &str,
    backoff: Duration,
) -> DataResult<Response> {
    for attempt in 1..=MAX_ATTEMPTS {
        let response = client.get(url).send().await?;

        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        if attempt < MAX_ATTEMPTS {
            let wait = backoff * attempt;
            tracing::warn!(
                "{} 429 rate limited, waiting {:.1}s before retry {}/{}",
                provider,
                wait.as_secs_f64(),
                attempt,
                MAX_ATTEMPTS - 1
            );
            tokio::time::sleep(wait).await;
        }
    }

    Err(DataError::RateLimited(format!(
        "{} still rate limited after {} attempts",
        provider, MAX_ATTEMPTS
    )))
}
