use super::{ProviderAccount, Session};
use crate::error::RegistryError;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

const SIGNUP_PATH: &str = "auth/v1/signup";
const TOKEN_PATH: &str = "auth/v1/token";
const USER_PATH: &str = "auth/v1/user";
const ADMIN_USERS_PATH: &str = "auth/v1/admin/users";

/// Stateless Supabase auth endpoints. `base` must end with `/`.
pub(super) struct SupabaseEndpoints;

impl SupabaseEndpoints {
    pub(super) async fn sign_up(
        http: &reqwest::Client,
        base: &Url,
        api_key: &str,
        email: &str,
        password: &str,
    ) -> Result<ProviderAccount, RegistryError> {
        let resp = http
            .post(base.join(SIGNUP_PATH)?)
            .header("apikey", api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let payload = read_json(resp).await?;
        debug!(email, "provider sign-up accepted");
        account_from_signup(&payload)
    }

    pub(super) async fn sign_in(
        http: &reqwest::Client,
        base: &Url,
        api_key: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, RegistryError> {
        let mut url = base.join(TOKEN_PATH)?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let resp = http
            .post(url)
            .header("apikey", api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = resp.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST
                | StatusCode::UNAUTHORIZED
                | StatusCode::FORBIDDEN
                | StatusCode::UNPROCESSABLE_ENTITY
        ) {
            debug!(email, status = status.as_u16(), "provider rejected credentials");
            return Err(RegistryError::InvalidCredentials);
        }
        let payload = read_json(resp).await?;
        Ok(serde_json::from_value(payload)?)
    }

    pub(super) async fn fetch_user(
        http: &reqwest::Client,
        base: &Url,
        api_key: &str,
        token: &str,
    ) -> Result<Option<ProviderAccount>, RegistryError> {
        let resp = http
            .get(base.join(USER_PATH)?)
            .header("apikey", api_key)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;

        if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            debug!(status = resp.status().as_u16(), "provider rejected token");
            return Ok(None);
        }
        let payload = read_json(resp).await?;
        Ok(account_from_user(&payload))
    }

    pub(super) async fn delete_user(
        http: &reqwest::Client,
        base: &Url,
        api_key: &str,
        service_key: &str,
        account_id: &str,
    ) -> Result<(), RegistryError> {
        let resp = http
            .delete(admin_user_url(base, account_id)?)
            .header("apikey", api_key)
            .bearer_auth(service_key)
            .send()
            .await?;

        // Already gone counts as deleted.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        read_json(resp).await?;
        debug!(account_id, "provider account deleted");
        Ok(())
    }
}

/// `auth/v1/admin/users/{id}` with the id percent-encoded as one segment.
fn admin_user_url(base: &Url, account_id: &str) -> Result<Url, RegistryError> {
    let mut url = base.join(ADMIN_USERS_PATH)?;
    url.path_segments_mut()
        .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .push(account_id);
    Ok(url)
}

/// Read a JSON body, turning non-2xx replies into `RegistryError::Provider`.
async fn read_json(resp: reqwest::Response) -> Result<Value, RegistryError> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(RegistryError::Provider {
            status: status.as_u16(),
            message: provider_message(&text),
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

/// Pull the human-readable message out of a provider error body. GoTrue has
/// used `msg`, `error_description`, `message` and `error` over its versions.
fn provider_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|k| v.get(k).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Sign-up answers with either the bare user or a session wrapping it,
/// depending on whether email confirmation is enabled.
fn account_from_signup(payload: &Value) -> Result<ProviderAccount, RegistryError> {
    account_from_user(payload)
        .or_else(|| payload.get("user").and_then(account_from_user))
        .ok_or_else(|| RegistryError::Provider {
            status: 200,
            message: "sign-up response did not contain a user id".to_string(),
        })
}

fn account_from_user(payload: &Value) -> Option<ProviderAccount> {
    let id = payload.get("id")?.as_str()?.to_string();
    let email = payload
        .get("email")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(ProviderAccount { id, email })
}
