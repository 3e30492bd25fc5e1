//! Google OAuth2 installed-app flow for Gmail API access
//!
//! Opens the consent page in a browser and receives the authorization code
//! on a loopback redirect. The refresh token can be cached so later runs
//! skip the browser entirely.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::TcpListener;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Url;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::constants::{HTTP_TIMEOUT_SECS, OAUTH_CALLBACK_TIMEOUT_SECS};
use crate::credentials::{ClientCredentials, TokenCache};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

// Full mailbox scope: read threads and send mail
const GMAIL_SCOPE: &str = "https://mail.google.com/";

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Random URL-safe string of `len` bytes of entropy.
fn random_token(len: usize) -> Result<String> {
    let mut bytes = vec![0u8; len];
    getrandom::fill(&mut bytes).map_err(|e| anyhow::anyhow!("Failed to generate random bytes: {}", e))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// S256 PKCE challenge for `verifier`.
fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// An authorization request waiting for the browser to come back.
pub struct PendingAuthorization {
    pub auth_url: String,
    redirect_uri: String,
    verifier: String,
    state: String,
    listener: TcpListener,
}

pub struct GoogleAuth {
    credentials: ClientCredentials,
    http: reqwest::Client,
}

impl GoogleAuth {
    pub fn new(credentials: ClientCredentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { credentials, http })
    }

    /// Bind the loopback listener and build the consent URL.
    pub fn begin(&self) -> Result<PendingAuthorization> {
        let listener = TcpListener::bind("127.0.0.1:0").context("Failed to bind to local port")?;
        let redirect_uri = format!("http://127.0.0.1:{}", listener.local_addr()?.port());

        let verifier = random_token(32)?;
        let state = random_token(16)?;

        let auth_url = Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", GMAIL_SCOPE),
                ("code_challenge", pkce_challenge(&verifier).as_str()),
                ("code_challenge_method", "S256"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state.as_str()),
            ],
        )
        .context("Failed to build authorization URL")?
        .to_string();
        tracing::debug!("OAuth2 redirect URI: {}", redirect_uri);

        Ok(PendingAuthorization {
            auth_url,
            redirect_uri,
            verifier,
            state,
            listener,
        })
    }

    /// Block until the browser hits the redirect URI and return the code.
    pub fn receive_code(pending: &PendingAuthorization) -> Result<String> {
        pending.listener.set_nonblocking(true)?;
        let deadline = Instant::now() + Duration::from_secs(OAUTH_CALLBACK_TIMEOUT_SECS);

        let mut stream = loop {
            match pending.listener.accept() {
                Ok((stream, _)) => break stream,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() > deadline {
                        bail!("Timed out waiting for OAuth authorization in the browser");
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => return Err(e).context("Failed to accept OAuth callback connection"),
            }
        };
        stream.set_nonblocking(false)?;

        let mut request_line = String::new();
        BufReader::new(&stream).read_line(&mut request_line)?;
        let target = request_line.split_whitespace().nth(1).unwrap_or("/");

        let outcome = parse_callback(target, &pending.state);
        let page = match &outcome {
            Ok(_) => "<h1>Authorization successful</h1><p>You can close this window.</p>".to_string(),
            Err(e) => format!(
                "<h1>Authorization failed</h1><p>{}</p>",
                escape_html(&e.to_string())
            ),
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body>{}</body></html>",
            page
        );
        stream.write_all(response.as_bytes()).ok();

        outcome
    }

    pub async fn exchange_code(&self, code: &str, pending: &PendingAuthorization) -> Result<TokenResponse> {
        let mut params = vec![
            ("client_id", self.credentials.client_id.as_str()),
            ("code", code),
            ("redirect_uri", pending.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
            ("code_verifier", pending.verifier.as_str()),
        ];
        if let Some(secret) = &self.credentials.client_secret {
            params.push(("client_secret", secret.as_str()));
        }
        self.token_request(&params, "exchange authorization code").await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let mut params = vec![
            ("client_id", self.credentials.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = &self.credentials.client_secret {
            params.push(("client_secret", secret.as_str()));
        }
        self.token_request(&params, "refresh access token").await
    }

    async fn token_request(&self, params: &[(&str, &str)], action: &str) -> Result<TokenResponse> {
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(params)
            .send()
            .await
            .with_context(|| format!("Failed to {}", action))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = match response.json::<TokenError>().await {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{} ({})", err.error, desc),
                    None => err.error,
                },
                Err(_) => status.to_string(),
            };
            bail!("Failed to {}: {}", action, detail);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse token response ({})", action))
    }

    /// Run the browser flow end to end.
    pub async fn authorize_interactively(&self) -> Result<TokenResponse> {
        let pending = self.begin()?;

        eprintln!("Authorize this app by visiting:\n\n  {}\n", pending.auth_url);
        if let Err(e) = open::that(&pending.auth_url) {
            tracing::warn!("Could not open browser: {}", e);
        }

        let (code, pending) = tokio::task::spawn_blocking(move || {
            let code = Self::receive_code(&pending);
            (code, pending)
        })
        .await
        .context("OAuth callback task failed")?;

        let tokens = self.exchange_code(&code?, &pending).await?;
        tracing::info!("OAuth2 authorization successful");
        Ok(tokens)
    }
}

/// Obtain an access token, reusing a cached refresh token when allowed.
pub async fn access_token(credentials: ClientCredentials, cache_token: bool) -> Result<String> {
    let cache = TokenCache::new(&credentials.client_id);
    let auth = GoogleAuth::new(credentials)?;

    if cache_token && let Some(refresh_token) = cache.get() {
        match auth.refresh(&refresh_token).await {
            Ok(tokens) => {
                tracing::debug!("Refreshed access token (expires in {:?}s)", tokens.expires_in);
                return Ok(tokens.access_token);
            }
            Err(e) => {
                tracing::warn!("Cached token rejected, authorizing again: {:#}", e);
                cache.clear();
            }
        }
    }

    let tokens = auth.authorize_interactively().await?;
    if cache_token {
        match &tokens.refresh_token {
            Some(refresh_token) => cache.set(refresh_token)?,
            None => tracing::warn!("No refresh token granted; the next run will authorize again"),
        }
    }
    Ok(tokens.access_token)
}

/// Pull the authorization code out of the callback request target.
fn parse_callback(target: &str, expected_state: &str) -> Result<String> {
    let url = Url::parse("http://127.0.0.1/")
        .and_then(|base| base.join(target))
        .context("Malformed OAuth callback request")?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(error) = param("error") {
        let description = param("error_description").unwrap_or_default();
        bail!("Authorization denied: {} {}", error, description);
    }

    match param("state") {
        Some(state) if state == expected_state => {}
        Some(_) => bail!("State parameter mismatch in OAuth callback"),
        None => bail!("No state parameter in OAuth callback"),
    }

    param("code").context("No authorization code in OAuth callback")
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
