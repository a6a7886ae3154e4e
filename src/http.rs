use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::warn;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

fn retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Send a request, retrying on 429/5xx with exponential backoff. The last
/// attempt consumes the original builder, so bodies must be cloneable
/// (json bodies are).
pub async fn send_with_retry(builder: RequestBuilder) -> Result<Response, reqwest::Error> {
    let mut backoff = INITIAL_BACKOFF;

    for attempt in 1..MAX_ATTEMPTS {
        let Some(clone) = builder.try_clone() else {
            break;
        };

        match clone.send().await {
            Ok(response) if retryable(response.status()) => {
                warn!(
                    "Request to {} returned {}, retrying (attempt {}/{})",
                    response.url(),
                    response.status(),
                    attempt,
                    MAX_ATTEMPTS
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            other => return other,
        }
    }

    builder.send().await
}
