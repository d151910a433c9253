//! Login and logout against the auth service.

use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::api_types::ApiLoginResponse;
use super::client::{authorize, base_url, send};
use super::error::ApiError;
use super::types::User;
use crate::session::Session;

#[derive(Serialize)]
struct Credentials<'a> {
  email: &'a str,
  password: &'a str,
}

#[derive(Clone)]
pub struct AuthClient {
  http: reqwest::Client,
  base: Url,
  session: Session,
}

impl AuthClient {
  pub fn new(http: reqwest::Client, url: &str, session: Session) -> Result<Self> {
    let base = base_url(url).map_err(|e| eyre!("Invalid auth URL: {}", e))?;
    Ok(Self {
      http,
      base,
      session,
    })
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  fn endpoint(&self, name: &str) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.pop_if_empty().push(name);
    }
    url
  }

  /// Exchange credentials for a token. Any previously stored token is
  /// cleared before the attempt, so a failed login leaves no session.
  pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
    self.session.sign_out();

    let url = self.endpoint("login");
    debug!(%url, "login");
    let builder = self
      .http
      .post(url)
      .json(&Credentials { email, password });
    let body = send(builder).await?;

    let response: ApiLoginResponse =
      serde_json::from_slice(&body).map_err(|e| ApiError::Decode(format!("login response: {}", e)))?;

    let user = response.data.user;
    info!(email = %user.email, role = %user.role, "Signed in");
    self.session.sign_in(response.data.token, user.clone());
    Ok(user)
  }

  /// Tell the server we are leaving, then forget the credential either way.
  pub async fn logout(&self) {
    let url = self.endpoint("logout");
    debug!(%url, "logout");
    let builder = authorize(self.http.get(url), &self.session);
    if let Err(e) = send(builder).await {
      warn!("Logout request failed: {}", e);
    }
    self.session.sign_out();
    info!("Signed out");
  }
}
