// API gateway module: a small blocking HTTP client for the gist service.
// Every operation is exactly one request/response cycle against the remote
// API; the status code alone decides whether the call succeeded.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

/// Host used when `GIST_API_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Sent with every request.
pub const USER_AGENT_STRING: &str = concat!("gist-cli/", env!("CARGO_PKG_VERSION"));

const TIMEOUT: Duration = Duration::from_secs(10);
const AUTHORIZATION_NOTE: &str = "Authorization for the gist command line tool";

/// Failure of a single gateway call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The service answered with a status outside the operation's success
    /// set. Status and body are kept verbatim so they can be shown as-is.
    #[error("{status} {body}")]
    Status { status: u16, body: String },

    /// Timeout, DNS or connection failure.
    #[error("request failed")]
    Transport(#[from] reqwest::Error),

    /// The response body did not have the expected JSON shape.
    #[error("unexpected response body")]
    Decode(#[from] serde_json::Error),

    #[error("credentials cannot be sent as an HTTP header")]
    InvalidHeader,
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Visibility of a gist. On the wire this is the `public` boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl From<bool> for Visibility {
    fn from(public: bool) -> Self {
        if public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

impl Serialize for Visibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.is_public())
    }
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        bool::deserialize(deserializer).map(Visibility::from)
    }
}

/// A gist as returned by the service. Only the fields the CLI shows are
/// decoded; everything else in the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Gist {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "public")]
    pub visibility: Visibility,
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
    pub html_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// What create and edit answer with. Only the link is needed, so nothing
/// else in the body is required to be present.
#[derive(Debug, Clone, Deserialize)]
pub struct GistLink {
    pub html_url: String,
}

/// One file of a gist. Listings omit `content`.
#[derive(Debug, Clone, Deserialize)]
pub struct GistFile {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub raw_url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileContent {
    pub content: String,
}

/// Payload for `POST /gists`.
#[derive(Debug, Clone, Serialize)]
pub struct NewGist {
    pub public: Visibility,
    pub description: String,
    pub files: BTreeMap<String, FileContent>,
}

impl NewGist {
    pub fn single_file(
        filename: impl Into<String>,
        content: impl Into<String>,
        description: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        let mut files = BTreeMap::new();
        files.insert(
            filename.into(),
            FileContent {
                content: content.into(),
            },
        );
        NewGist {
            public: visibility,
            description: description.into(),
            files,
        }
    }
}

/// Payload for `PATCH /gists/{id}`. The description is left untouched when
/// `None`.
#[derive(Debug, Clone, Serialize)]
pub struct GistEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub files: BTreeMap<String, FileContent>,
}

impl GistEdit {
    pub fn single_file(
        filename: impl Into<String>,
        content: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let mut files = BTreeMap::new();
        files.insert(
            filename.into(),
            FileContent {
                content: content.into(),
            },
        );
        GistEdit { description, files }
    }
}

#[derive(Debug, Serialize)]
struct AuthorizationRequest<'a> {
    scopes: [&'a str; 2],
    note: &'a str,
}

/// Which gist collection to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GistListing {
    /// Gists of the authenticated user.
    Own,
    /// All public gists on the service.
    AllPublic,
    Starred,
    User(String),
}

impl GistListing {
    pub fn path(&self) -> String {
        match self {
            GistListing::Own => "/gists".to_string(),
            GistListing::AllPublic => "/gists/public".to_string(),
            GistListing::Starred => "/gists/starred".to_string(),
            GistListing::User(user) => format!("/users/{}/gists", user),
        }
    }
}

/// Whose repositories to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOwner {
    Authenticated,
    User(String),
    Org(String),
}

impl RepoOwner {
    pub fn path(&self) -> String {
        match self {
            RepoOwner::Authenticated => "/user/repos".to_string(),
            RepoOwner::User(user) => format!("/users/{}/repos", user),
            RepoOwner::Org(org) => format!("/orgs/{}/repos", org),
        }
    }
}

/// Statuses an operation treats as success.
#[derive(Debug, Clone, Copy)]
enum Expect {
    AnySuccess,
    Exactly(StatusCode),
}

impl Expect {
    fn accepts(self, status: StatusCode) -> bool {
        match self {
            Expect::AnySuccess => status.is_success(),
            Expect::Exactly(code) => status == code,
        }
    }
}

/// Blocking client bound to one API host and, once authorized, one bearer
/// token. Idle connections are never kept, so every call opens and closes
/// its own connection.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create an ApiClient for `GIST_API_URL`, or the public GitHub API when
    /// the variable is unset.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("GIST_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .pool_max_idle_per_host(0)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(ApiClient {
            client,
            base_url,
            token: None,
        })
    }

    /// Store the bearer token used by every subsequent call.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
        if let Some(t) = &self.token {
            let val = HeaderValue::from_str(&format!("bearer {}", t))
                .map_err(|_| ApiError::InvalidHeader)?;
            headers.insert(AUTHORIZATION, val);
        }
        Ok(headers)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        Ok(self.client.request(method, url).headers(self.auth_headers()?))
    }

    fn send(req: RequestBuilder, expect: Expect) -> Result<Response> {
        let res = req.send()?;
        let status = res.status();
        debug!("response status {}", status);
        if !expect.accepts(status) {
            let body = res.text().unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res)
    }

    fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
        let text = res.text()?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Exchange a login and password for a token with `gist` and `repo`
    /// scopes. Returns the response body verbatim.
    pub fn authorize(&self, login: &str, password: &str) -> Result<String> {
        let url = format!("{}/authorizations", self.base_url);
        debug!("POST {} as {}", url, login);
        let basic = STANDARD.encode(format!("{}:{}", login, password));
        let basic = HeaderValue::from_str(&format!("Basic {}", basic))
            .map_err(|_| ApiError::InvalidHeader)?;
        let body = AuthorizationRequest {
            scopes: ["gist", "repo"],
            note: AUTHORIZATION_NOTE,
        };
        let req = self
            .client
            .post(url)
            .header(USER_AGENT, USER_AGENT_STRING)
            .header(AUTHORIZATION, basic)
            .json(&body);
        let res = Self::send(req, Expect::AnySuccess)?;
        Ok(res.text()?)
    }

    pub fn create_gist(&self, gist: &NewGist) -> Result<GistLink> {
        let req = self.request(Method::POST, "/gists")?.json(gist);
        Self::decode(Self::send(req, Expect::AnySuccess)?)
    }

    pub fn edit_gist(&self, id: &str, edit: &GistEdit) -> Result<GistLink> {
        let req = self
            .request(Method::PATCH, &format!("/gists/{}", id))?
            .json(edit);
        Self::decode(Self::send(req, Expect::AnySuccess)?)
    }

    pub fn delete_gist(&self, id: &str) -> Result<()> {
        let req = self.request(Method::DELETE, &format!("/gists/{}", id))?;
        Self::send(req, Expect::Exactly(StatusCode::NO_CONTENT))?;
        Ok(())
    }

    pub fn star_gist(&self, id: &str) -> Result<()> {
        let req = self
            .request(Method::PUT, &format!("/gists/{}/star", id))?
            .header(CONTENT_LENGTH, "0");
        Self::send(req, Expect::Exactly(StatusCode::NO_CONTENT))?;
        Ok(())
    }

    pub fn unstar_gist(&self, id: &str) -> Result<()> {
        let req = self.request(Method::DELETE, &format!("/gists/{}/star", id))?;
        Self::send(req, Expect::Exactly(StatusCode::NO_CONTENT))?;
        Ok(())
    }

    pub fn get_gist(&self, id: &str) -> Result<Gist> {
        let req = self.request(Method::GET, &format!("/gists/{}", id))?;
        Self::decode(Self::send(req, Expect::Exactly(StatusCode::OK))?)
    }

    pub fn list_gists(&self, listing: &GistListing) -> Result<Vec<Gist>> {
        let req = self.request(Method::GET, &listing.path())?;
        Self::decode(Self::send(req, Expect::Exactly(StatusCode::OK))?)
    }

    pub fn list_repos(&self, owner: &RepoOwner) -> Result<Vec<Repository>> {
        let req = self.request(Method::GET, &owner.path())?;
        Self::decode(Self::send(req, Expect::Exactly(StatusCode::OK))?)
    }
}
