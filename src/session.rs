//! Anonymous visitor session management.
//!
//! The host hands out chapter text only when the request carries the cookies
//! it sets on its landing page. This module owns that credential: a single
//! string of `name=value` pairs with an Absent → Acquiring → Valid lifecycle.
//! The fetcher invalidates it whenever the host answers with its denial
//! sentinel, and the next acquisition performs a fresh handshake.

use reqwest::header::SET_COOKIE;
use tokio::sync::Mutex;
use url::Url;

/// Credential lifecycle. Acquiring is represented by the state lock being
/// held across the handshake: callers arriving mid-handshake queue on the
/// lock and then observe Valid, so exactly one handshake happens.
#[derive(Debug, Clone)]
enum SessionState {
    Absent,
    Valid(String),
}

/// Owns the visitor-session credential and its lifecycle.
///
/// The manager is reusable indefinitely: invalidation returns it to Absent,
/// and the next `acquire` re-runs the handshake lazily.
pub struct SessionManager {
    client: reqwest::Client,
    landing_url: Url,
    state: Mutex<SessionState>,
}

impl SessionManager {
    /// Creates a manager that handshakes against the given landing URL.
    pub fn new(client: reqwest::Client, landing_url: Url) -> Self {
        Self {
            client,
            landing_url,
            state: Mutex::new(SessionState::Absent),
        }
    }

    /// Returns the current credential, acquiring one if absent.
    ///
    /// A Valid credential is returned without any network traffic.
    /// Handshake failure is non-fatal: the state stays Absent and an empty
    /// credential is returned, letting callers attempt an ungated fetch.
    pub async fn acquire(&self) -> String {
        let mut state = self.state.lock().await;
        if let SessionState::Valid(credential) = &*state {
            return credential.clone();
        }

        match self.handshake().await {
            Ok(credential) if !credential.is_empty() => {
                tracing::debug!(cookies = credential.matches('=').count(), "session acquired");
                *state = SessionState::Valid(credential.clone());
                credential
            }
            Ok(_) => {
                tracing::warn!("session handshake returned no cookies");
                String::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "session handshake failed");
                String::new()
            }
        }
    }

    /// Discards the current credential. Idempotent.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if matches!(*state, SessionState::Valid(_)) {
            tracing::debug!("session invalidated");
        }
        *state = SessionState::Absent;
    }

    /// Performs the handshake request and joins every response cookie into
    /// one credential string.
    async fn handshake(&self) -> Result<String, reqwest::Error> {
        let response = self
            .client
            .get(self.landing_url.clone())
            .send()
            .await?
            .error_for_status()?;

        let pairs: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|cookie| cookie.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('='))
            .map(str::to_string)
            .collect();

        Ok(pairs.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager_for(server: &MockServer) -> SessionManager {
        let url = Url::parse(&server.uri()).unwrap();
        SessionManager::new(reqwest::Client::new(), url)
    }

    fn landing_response() -> ResponseTemplate {
        ResponseTemplate::new(200)
            .append_header("set-cookie", "wp_id=abc123; Path=/; HttpOnly")
            .append_header("set-cookie", "fs__gvid=xyz; Path=/")
    }

    #[tokio::test]
    async fn test_acquire_collects_all_cookies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(landing_response())
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        let credential = manager.acquire().await;
        assert_eq!(credential, "wp_id=abc123; fs__gvid=xyz");
    }

    #[tokio::test]
    async fn test_valid_session_issues_no_network_calls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(landing_response())
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        let first = manager.acquire().await;
        let second = manager.acquire().await;
        assert_eq!(first, second);
        // expect(1) verified on MockServer drop.
    }

    #[tokio::test]
    async fn test_concurrent_acquires_coalesce_into_one_handshake() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(landing_response())
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        let (a, b) = tokio::join!(manager.acquire(), manager.acquire());
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_handshake() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(landing_response())
            .expect(2)
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        manager.acquire().await;
        manager.invalidate().await;
        manager.invalidate().await; // idempotent
        let credential = manager.acquire().await;
        assert!(!credential.is_empty());
    }

    #[tokio::test]
    async fn test_handshake_failure_yields_empty_and_stays_usable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        assert_eq!(manager.acquire().await, "");

        // A later handshake against a recovered host succeeds.
        server.reset().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(landing_response())
            .mount(&server)
            .await;
        assert!(!manager.acquire().await.is_empty());
    }

    #[tokio::test]
    async fn test_handshake_without_cookies_stays_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        assert_eq!(manager.acquire().await, "");
        // Still Absent, so the next acquire tries again.
        assert_eq!(manager.acquire().await, "");
    }
}
