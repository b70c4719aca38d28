use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::languages::LanguageBytes;
use crate::pipeline::RepoSource;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const PER_PAGE: u32 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("GitHub rejected the credentials for {url} (HTTP {status})")]
    Unauthorized { status: u16, url: String },
    #[error("GitHub API rate limit exhausted for {url} (HTTP {status})")]
    RateLimited { status: u16, url: String },
    #[error("GitHub API returned HTTP {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("network error talking to GitHub: {0}")]
    Network(#[from] reqwest::Error),
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Authentication failures abort the run regardless of skip policy.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

/// A repository as returned by the list endpoint. Only the fields needed to
/// filter forks and address the languages call are kept.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub fork: bool,
    pub owner: Owner,
    #[serde(default)]
    pub languages_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Owner {
    pub login: String,
}

#[derive(Clone)]
pub struct GithubClient {
    token: Option<Arc<String>>,
    api_url: Arc<String>,
    http: Arc<Client>,
}

impl GithubClient {
    /// Create a REST client rooted at `api_url`. Requests carry a bearer
    /// token when one is given.
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            token: token.map(Arc::new),
            api_url: Arc::new(api_url.trim_end_matches('/').to_string()),
            http: Arc::new(http),
        })
    }

    fn repos_url(&self, owner: &str) -> String {
        format!("{}/users/{owner}/repos", self.api_url)
    }

    fn languages_url(&self, repo: &Repository) -> String {
        repo.languages_url.clone().unwrap_or_else(|| {
            format!(
                "{}/repos/{}/{}/languages",
                self.api_url, repo.owner.login, repo.name
            )
        })
    }

    /// Low-level GET returning decoded JSON, mapping non-2xx statuses to
    /// [`ApiError`].
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut req = self
            .http
            .get(url)
            .query(query)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, "top-langs");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token.as_str());
        }

        let resp = req.send().await?;
        let status = resp.status();
        let exhausted = resp
            .headers()
            .get(RATE_LIMIT_REMAINING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0");
        let body = resp.text().await?;

        // GitHub answers 403 (sometimes 429) once the quota is spent.
        if exhausted
            && (status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS)
        {
            return Err(ApiError::RateLimited {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RepoSource for GithubClient {
    async fn list_page(&self, owner: &str, page: u32) -> Result<Vec<Repository>, ApiError> {
        let url = self.repos_url(owner);
        debug!(%url, page, "listing repositories");
        self.get_json(
            &url,
            &[
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
                ("type", "owner".to_string()),
                ("sort", "full_name".to_string()),
            ],
        )
        .await
    }

    async fn languages(&self, repo: &Repository) -> Result<LanguageBytes, ApiError> {
        let url = self.languages_url(repo);
        debug!(%url, "fetching languages");
        // An empty repository answers with `{}`.
        self.get_json(&url, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response on a local socket and hand back the raw
    /// request the client sent.
    async fn serve_once(
        status_line: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n",
            body.len()
        );
        for (name, value) in headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        response.push_str("\r\n");
        response.push_str(body);

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8(request).unwrap()
        });

        (format!("http://{addr}"), handle)
    }

    /// Client that talks straight to the local socket, ignoring any proxy
    /// settings in the environment.
    fn local_client(api: &str, token: Option<&str>) -> GithubClient {
        GithubClient {
            token: token.map(|t| Arc::new(t.to_string())),
            api_url: Arc::new(api.to_string()),
            http: Arc::new(Client::builder().no_proxy().build().unwrap()),
        }
    }

    fn local_repo(api: &str) -> Repository {
        Repository {
            name: "tool".to_string(),
            fork: false,
            owner: Owner {
                login: "octocat".to_string(),
            },
            languages_url: Some(format!("{api}/repos/octocat/tool/languages")),
        }
    }

    #[tokio::test]
    async fn list_page_sends_query_and_bearer_token() {
        let body = r#"[{ "name": "tool", "fork": false, "owner": { "login": "octocat" } }]"#;
        let (api, server) = serve_once("200 OK", &[], body).await;
        let client = local_client(&api, Some("s3cret"));

        let repos = client.list_page("octocat", 2).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "tool");
        assert_eq!(
            request.lines().next().unwrap(),
            "GET /users/octocat/repos?per_page=100&page=2&type=owner&sort=full_name HTTP/1.1"
        );
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("authorization: bearer s3cret\r\n"));
        assert!(lower.contains("accept: application/vnd.github+json\r\n"));
        assert!(lower.contains("user-agent: top-langs\r\n"));
    }

    #[tokio::test]
    async fn no_token_sends_no_authorization_header() {
        let (api, server) = serve_once("200 OK", &[], "{}").await;
        let client = local_client(&api, None);

        let langs = client.languages(&local_repo(&api)).await.unwrap();
        let request = server.await.unwrap();

        assert!(langs.is_empty());
        assert!(request.starts_with("GET /repos/octocat/tool/languages HTTP/1.1"));
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        for status_line in ["401 Unauthorized", "403 Forbidden"] {
            let (api, server) =
                serve_once(status_line, &[], r#"{"message":"Bad credentials"}"#).await;
            let client = local_client(&api, Some("bad"));

            let err = client.list_page("octocat", 1).await.unwrap_err();
            server.await.unwrap();

            assert!(matches!(err, ApiError::Unauthorized { .. }), "{status_line}: {err:?}");
            assert!(err.is_auth());
        }
    }

    #[tokio::test]
    async fn exhausted_rate_limit_is_not_an_auth_error() {
        let (api, server) = serve_once(
            "403 Forbidden",
            &[("x-ratelimit-remaining", "0")],
            r#"{"message":"API rate limit exceeded"}"#,
        )
        .await;
        let client = local_client(&api, None);

        let err = client.list_page("octocat", 1).await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, ApiError::RateLimited { status: 403, .. }), "{err:?}");
        assert!(!err.is_auth());
        assert!(err.to_string().contains("rate limit"));
    }

    #[tokio::test]
    async fn other_statuses_keep_the_body() {
        let (api, server) =
            serve_once("500 Internal Server Error", &[], r#"{"message":"boom"}"#).await;
        let client = local_client(&api, None);

        let err = client.languages(&local_repo(&api)).await.unwrap_err();
        server.await.unwrap();

        match err {
            ApiError::Status { status, body, .. } => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let (api, server) = serve_once("200 OK", &[], "not json").await;
        let client = local_client(&api, None);

        let err = client.list_page("octocat", 1).await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, ApiError::Decode { .. }), "{err:?}");
    }

    fn client() -> GithubClient {
        GithubClient::new("https://api.example.test/", None).unwrap()
    }

    #[test]
    fn deserializes_repository_listing() {
        let json = r#"[
            {
                "name": "dotfiles",
                "fork": false,
                "owner": { "login": "octocat", "id": 1 },
                "languages_url": "https://api.github.com/repos/octocat/dotfiles/languages",
                "stargazers_count": 3
            },
            { "name": "linux", "fork": true, "owner": { "login": "octocat" } }
        ]"#;

        let repos: Vec<Repository> = serde_json::from_str(json).unwrap();
        assert_eq!(repos.len(), 2);
        assert!(!repos[0].fork);
        assert!(repos[1].fork);
        assert_eq!(repos[1].languages_url, None);
        assert_eq!(repos[0].owner.login, "octocat");
    }

    #[test]
    fn languages_url_prefers_the_api_value() {
        let c = client();
        let mut repo = Repository {
            name: "tool".to_string(),
            fork: false,
            owner: Owner {
                login: "octocat".to_string(),
            },
            languages_url: Some("https://elsewhere.test/langs".to_string()),
        };
        assert_eq!(c.languages_url(&repo), "https://elsewhere.test/langs");

        repo.languages_url = None;
        assert_eq!(
            c.languages_url(&repo),
            "https://api.example.test/repos/octocat/tool/languages"
        );
    }

    #[test]
    fn repos_url_trims_trailing_slash() {
        assert_eq!(
            client().repos_url("octocat"),
            "https://api.example.test/users/octocat/repos"
        );
    }

    #[test]
    fn deserializes_language_map() {
        let langs: LanguageBytes =
            serde_json::from_str(r#"{ "Rust": 12345, "Shell": 67 }"#).unwrap();
        assert_eq!(langs.get("Rust"), Some(&12345));
        assert_eq!(langs.len(), 2);
    }

    #[test]
    fn only_unauthorized_counts_as_auth() {
        let auth = ApiError::Unauthorized {
            status: 401,
            url: "u".to_string(),
        };
        let other = ApiError::Status {
            status: 404,
            url: "u".to_string(),
            body: String::new(),
        };
        assert!(auth.is_auth());
        assert!(!other.is_auth());
    }
}
