use std::time::Duration;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::dto::{LoginBody, RegisterBody, User};
use crate::error::AuthError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Client for the external auth service that issues bearer tokens.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build auth http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = email.trim().to_string();
        check_credentials(&email, password)?;

        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&LoginBody {
                email: &email,
                password,
            })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "login request failed");
                AuthError::Network("Network error".into())
            })?;

        let ok = response.status().is_success();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        match token_of(&body) {
            Some(token) if ok => {
                info!(email = %email, "signed in");
                let user = User {
                    id: None,
                    first_name: "User".into(),
                    last_name: String::new(),
                    email,
                };
                Ok((user, token))
            }
            _ => {
                warn!(email = %email, "login rejected");
                Err(AuthError::Rejected(
                    message_of(&body, &["error"]).unwrap_or_else(|| "Login failed".into()),
                ))
            }
        }
    }

    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AuthError> {
        let email = email.trim().to_string();
        check_credentials(&email, password)?;

        let response = self
            .client
            .post(format!("{}/auth/register", self.base_url))
            .json(&RegisterBody {
                first_name,
                last_name,
                email: &email,
                password,
            })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "register request failed");
                AuthError::Network("Network error. Please try again.".into())
            })?;

        let ok = response.status().is_success();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        match token_of(&body) {
            Some(token) if ok => {
                info!(email = %email, "registered");
                let user = User {
                    id: None,
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    email,
                };
                Ok((user, token))
            }
            _ => {
                warn!(email = %email, "registration rejected");
                Err(AuthError::Rejected(
                    message_of(&body, &["message", "error", "detail"])
                        .unwrap_or_else(|| "Registration failed".into()),
                ))
            }
        }
    }
}

fn check_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if !is_valid_email(email) {
        return Err(AuthError::InvalidInput(
            "Please enter a valid email address".into(),
        ));
    }
    if password.is_empty() {
        return Err(AuthError::InvalidInput("Password is required".into()));
    }
    Ok(())
}

fn token_of(body: &Value) -> Option<String> {
    body.get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn message_of(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| {
            body.get(*k)
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
        })
        .map(str::to_string)
}
