// Console HTTP client
//
// Wraps `reqwest::Client` (with its cookie jar) and the console's
// login flow. Every page fetch is checked for the login form; when the
// session has lapsed the client logs in and re-reads the page, so
// endpoint methods never see the login screen.

use std::fmt;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{debug, trace};
use url::Url;

use crate::console::extract::{CSRF_FIELD, is_login_page, parse_csrf_token};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Console administrator credentials.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One request against the console: method, path, query, optional form
/// body, and the status codes that count as success.
#[derive(Debug, Clone)]
pub struct ConsoleRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub form: Option<Vec<(String, String)>>,
    pub accepted: Vec<StatusCode>,
}

impl ConsoleRequest {
    /// A page read. Only `200 OK` is accepted.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            form: None,
            accepted: vec![StatusCode::OK],
        }
    }

    /// A form submission. Submissions usually answer with a redirect,
    /// so `302 Found` is accepted alongside `200 OK`.
    pub fn post(path: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            form: Some(form),
            accepted: vec![StatusCode::OK, StatusCode::FOUND],
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    fn describe(&self) -> String {
        let verb = match self.method {
            Method::Get => "fetching",
            Method::Post => "submitting",
        };
        format!("{verb} {}", self.path)
    }
}

/// A console page body. Parse it with the functions in
/// [`extract`](crate::console::extract).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: StatusCode,
    pub body: String,
}

/// Client for one console, holding one authenticated session.
///
/// The session lives in the cookie jar of the wrapped `reqwest::Client`.
/// It is safe to share between tasks at the HTTP level, and logins are
/// serialized internally, but the console has no transactions: callers
/// that run multi-request sequences must serialize them themselves.
pub struct ConsoleClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    /// Count of completed logins. Locked for the whole sign-in so only
    /// one task replaces the session cookie at a time.
    session: Mutex<u64>,
}

impl ConsoleClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically (the console session is cookie-based).
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            session: Mutex::new(0),
        }
    }

    /// The console base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a full URL for a console path, e.g. `/firewall_rules.php`.
    pub(crate) fn url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_query(None);
        url
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send one request without any login handling.
    async fn send(&self, request: &ConsoleRequest) -> Result<Page, Error> {
        let url = self.url(&request.path);
        debug!(method = ?request.method, %url, "console request");

        let mut builder = match request.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref form) = request.form {
            builder = builder.form(form);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if !request.accepted.contains(&status) {
            return Err(Error::UnexpectedStatus {
                operation: request.describe(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        trace!(%status, bytes = body.len(), "console response");
        Ok(Page { status, body })
    }

    /// Perform a request, logging in first if the console answers with
    /// its login screen.
    ///
    /// Page reads are re-sent once after logging in. Form submissions are
    /// not: their CSRF token belonged to the lapsed session, so replaying
    /// them would only bounce again.
    ///
    /// Concurrent callers that hit the same lapsed session log in once:
    /// whoever gets the session lock first signs in, the others see the
    /// login count move and go straight to their retry.
    pub async fn fetch(&self, request: &ConsoleRequest) -> Result<Page, Error> {
        let seen = *self.session.lock().await;
        let page = self.send(request).await?;
        if !is_login_page(&page.body) {
            return Ok(page);
        }

        {
            let mut logins = self.session.lock().await;
            if *logins == seen {
                debug!(path = %request.path, "session lapsed, logging in");
                self.login(&page).await?;
                *logins += 1;
            } else {
                debug!(path = %request.path, "session renewed by another request");
            }
        }

        if request.method == Method::Post {
            return Err(Error::authentication(format!(
                "session expired while {}",
                request.describe()
            )));
        }

        let page = self.send(request).await?;
        if is_login_page(&page.body) {
            return Err(Error::authentication(
                "console still shows the login form after signing in",
            ));
        }
        Ok(page)
    }

    /// Sign in using the CSRF token from a login page. Callers hold the
    /// session lock.
    async fn login(&self, login_page: &Page) -> Result<(), Error> {
        let csrf = parse_csrf_token(&login_page.body, None)
            .map_err(|_| Error::authentication("login form has no CSRF token"))?;

        let form = vec![
            (CSRF_FIELD.to_owned(), csrf),
            ("usernamefld".to_owned(), self.credentials.username.clone()),
            (
                "passwordfld".to_owned(),
                self.credentials.password.expose_secret().to_owned(),
            ),
            ("login".to_owned(), "Sign In".to_owned()),
        ];

        let url = self.url("/");
        debug!(%url, username = %self.credentials.username, "logging in");

        let resp = self.http.post(url).form(&form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::authentication(format!(
                "unexpected status code {status} when logging in"
            )));
        }

        let body = resp.text().await?;
        if is_login_page(&body) {
            return Err(Error::authentication("credentials rejected"));
        }

        debug!("login successful");
        Ok(())
    }
}
