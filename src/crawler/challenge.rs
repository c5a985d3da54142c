//! Anti-bot challenge detection and retrying navigation

use crate::config::ChallengeConfig;
use crate::engine::{EngineError, Navigation, Page};
use crate::HarvestError;
use url::Url;

/// Lower-case fragments that mark a document as a challenge or error page
pub const CHALLENGE_SIGNATURES: &[&str] = &[
    "ddos-guard",
    "checking your browser",
    "/cdn-cgi/challenge",
    "captcha",
    "just a moment",
    "server error",
    "too many requests",
];

/// Classification of a fetched document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Usable content
    Clean,

    /// A challenge, throttling or error page
    Challenge {
        /// What gave it away
        reason: String,
    },
}

impl Verdict {
    pub fn is_clean(&self) -> bool {
        matches!(self, Verdict::Clean)
    }
}

/// Classifies a document by status and content
///
/// | Condition | Verdict |
/// |-----------|---------|
/// | HTTP 429 or 5xx | Challenge |
/// | Empty document | Challenge |
/// | Body contains a signature | Challenge |
/// | Anything else | Clean |
pub fn classify(status: u16, html: &str) -> Verdict {
    if status == 429 || status >= 500 {
        return Verdict::Challenge {
            reason: format!("HTTP {}", status),
        };
    }

    if html.trim().is_empty() {
        return Verdict::Challenge {
            reason: "empty document".to_string(),
        };
    }

    let lower = html.to_lowercase();
    match CHALLENGE_SIGNATURES.iter().find(|sig| lower.contains(*sig)) {
        Some(signature) => Verdict::Challenge {
            reason: format!("matched '{}'", signature),
        },
        None => Verdict::Clean,
    }
}

/// Returns true if the page's current document still looks like a challenge
pub fn is_blocked(html: &str) -> bool {
    !html.trim().is_empty() && !classify(200, html).is_clean()
}

/// Navigates to `url`, reloading with backoff while the result is a challenge
///
/// The first attempt navigates; later attempts reload the document once one has
/// been loaded. Between attempts the page waits `backoff × attempt`.
///
/// # Errors
///
/// * `ChallengeExhausted` - every attempt produced a challenge page
/// * `Engine` - the last attempt failed to navigate at all
pub async fn navigate_with_retries(
    page: &mut dyn Page,
    url: &Url,
    challenge: &ChallengeConfig,
) -> Result<Navigation, HarvestError> {
    let attempts = challenge.attempts.max(1);
    let mut loaded = false;
    let mut last_failure: Option<Failure> = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let backoff = challenge.backoff_for(attempt - 1);
            tracing::debug!(
                "Retrying {} in {:?} (attempt {}/{})",
                url,
                backoff,
                attempt + 1,
                attempts
            );
            page.wait(backoff).await;
        }

        let result = if loaded {
            page.reload().await
        } else {
            page.goto(url).await
        };

        match result {
            Ok(nav) => {
                loaded = true;
                match classify(nav.status, page.content()) {
                    Verdict::Clean => {
                        if attempt > 0 {
                            tracing::info!("Challenge cleared for {} after {} attempts", url, attempt + 1);
                        }
                        return Ok(nav);
                    }
                    Verdict::Challenge { reason } => {
                        tracing::warn!("Challenge at {} ({}), attempt {}/{}", url, reason, attempt + 1, attempts);
                        last_failure = Some(Failure::Challenge(reason));
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Navigation to {} failed: {}", url, e);
                last_failure = Some(Failure::Engine(e));
            }
        }
    }

    match last_failure {
        Some(Failure::Engine(e)) => Err(HarvestError::Engine(e)),
        Some(Failure::Challenge(reason)) => Err(HarvestError::ChallengeExhausted {
            url: url.to_string(),
            attempts,
            reason,
        }),
        None => Err(HarvestError::ChallengeExhausted {
            url: url.to_string(),
            attempts,
            reason: "no attempt made".to_string(),
        }),
    }
}

enum Failure {
    Challenge(String),
    Engine(EngineError),
}
