use super::endpoints::SupabaseEndpoints;
use super::{AuthGateway, ProviderAccount, Session};
use crate::config::Config;
use crate::error::RegistryError;

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Supabase-backed [`AuthGateway`] with a preconfigured HTTP client.
#[derive(Clone)]
pub struct SupabaseAuth {
    http: reqwest::Client,
    base: Url,
    api_key: String,
    service_key: Option<String>,
}

impl SupabaseAuth {
    pub fn new(cfg: &Config) -> Result<Self, RegistryError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("startup-registry/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(cfg.auth_timeout());
        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        let http = builder.build()?;

        Self::with_client(
            http,
            &cfg.auth_url,
            cfg.auth_api_key.clone(),
            cfg.auth_service_key.clone(),
        )
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        api_key: String,
        service_key: Option<String>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            http,
            base: normalize_base(base_url)?,
            api_key,
            service_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

#[async_trait]
impl AuthGateway for SupabaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderAccount, RegistryError> {
        SupabaseEndpoints::sign_up(&self.http, &self.base, &self.api_key, email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RegistryError> {
        SupabaseEndpoints::sign_in(&self.http, &self.base, &self.api_key, email, password).await
    }

    async fn introspect(&self, token: &str) -> Result<Option<ProviderAccount>, RegistryError> {
        SupabaseEndpoints::fetch_user(&self.http, &self.base, &self.api_key, token).await
    }

    async fn delete_account(&self, account_id: &str) -> Result<(), RegistryError> {
        let Some(service_key) = self.service_key.as_deref() else {
            warn!(account_id, "no service key configured; provider account left in place");
            return Ok(());
        };
        SupabaseEndpoints::delete_user(
            &self.http,
            &self.base,
            &self.api_key,
            service_key,
            account_id,
        )
        .await
    }
}

/// `Url::join` drops the last path segment unless the base ends with `/`.
fn normalize_base(raw: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(raw)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = normalize_base("https://project.supabase.co").unwrap();
        assert_eq!(url.as_str(), "https://project.supabase.co/");
        assert_eq!(
            url.join("auth/v1/user").unwrap().as_str(),
            "https://project.supabase.co/auth/v1/user"
        );

        let prefixed = normalize_base("http://gateway.local/supabase").unwrap();
        assert_eq!(
            prefixed.join("auth/v1/signup").unwrap().as_str(),
            "http://gateway.local/supabase/auth/v1/signup"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = SupabaseAuth::with_client(reqwest::Client::new(), "not a url", String::new(), None);
        assert!(matches!(err, Err(RegistryError::UrlParse(_))));
    }
}
