#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::Value;
use startup_registry::auth_gateway::{AuthGateway, ProviderAccount, Session};
use startup_registry::{AppState, RecordStore, RegistryError, registry_router};
use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

/// Token that makes the stub provider fail with a transport-style error.
pub const FAILING_TOKEN: &str = "provider-down";

/// In-memory identity provider: accounts by email, sessions by token.
#[derive(Default)]
pub struct StubGateway {
    reuse_ids: bool,
    next_id: AtomicU64,
    accounts: Mutex<HashMap<String, (String, ProviderAccount)>>,
    tokens: Mutex<HashMap<String, ProviderAccount>>,
    deleted: Mutex<Vec<String>>,
}

impl StubGateway {
    /// Answer a repeated sign-up with the id already held by that email,
    /// as the provider does for accounts still awaiting confirmation.
    pub fn reusing_ids() -> Self {
        Self {
            reuse_ids: true,
            ..Self::default()
        }
    }

    /// Register a token that resolves to `account_id` without a sign-up.
    pub fn issue_token(&self, token: &str, account_id: &str) {
        self.tokens.lock().unwrap().insert(
            token.to_string(),
            ProviderAccount {
                id: account_id.to_string(),
                email: None,
            },
        );
    }

    pub fn deleted_accounts(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthGateway for StubGateway {
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderAccount, RegistryError> {
        let mut accounts = self.accounts.lock().unwrap();
        if self.reuse_ids {
            if let Some((_, existing)) = accounts.get(email) {
                return Ok(existing.clone());
            }
        }
        // Otherwise every sign-up gets a fresh id and duplicate emails are
        // only caught by the local store.
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let account = ProviderAccount {
            id: format!("acct-{n}"),
            email: Some(email.to_string()),
        };
        accounts.insert(email.to_string(), (password.to_string(), account.clone()));
        Ok(account)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RegistryError> {
        let accounts = self.accounts.lock().unwrap();
        let Some((stored, account)) = accounts.get(email) else {
            return Err(RegistryError::InvalidCredentials);
        };
        if stored != password {
            return Err(RegistryError::InvalidCredentials);
        }
        let token = format!("token-{}", account.id);
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), account.clone());
        Ok(Session {
            access_token: token,
            token_type: Some("bearer".to_string()),
            expires_in: Some(3600),
            refresh_token: None,
            user: Some(account.clone()),
        })
    }

    async fn introspect(&self, token: &str) -> Result<Option<ProviderAccount>, RegistryError> {
        if token == FAILING_TOKEN {
            return Err(RegistryError::Provider {
                status: 503,
                message: "identity provider unavailable".to_string(),
            });
        }
        Ok(self.tokens.lock().unwrap().get(token).cloned())
    }

    async fn delete_account(&self, account_id: &str) -> Result<(), RegistryError> {
        self.deleted.lock().unwrap().push(account_id.to_string());
        Ok(())
    }
}

/// Router over a throwaway SQLite file and a [`StubGateway`].
pub struct TestApp {
    pub app: Router,
    pub store: RecordStore,
    pub gateway: Arc<StubGateway>,
    db_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.db_path);
        for suffix in ["-wal", "-shm"] {
            let mut side = self.db_path.clone().into_os_string();
            side.push(suffix);
            let _ = fs::remove_file(side);
        }
    }
}

static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn temp_db_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "startup-registry-{tag}-{}-{}-{}.sqlite",
        std::process::id(),
        nanos,
        DB_COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    path
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(StubGateway::default()).await
}

pub async fn spawn_app_with(gateway: StubGateway) -> TestApp {
    let db_path = temp_db_path("routes");
    let database_url = format!("sqlite:{}", db_path.display());
    let store = RecordStore::connect(&database_url, 2)
        .await
        .expect("failed to open sqlite store");
    store.init_schema().await.expect("failed to init schema");

    let gateway = Arc::new(gateway);
    let state = AppState::new(store.clone(), gateway.clone());
    TestApp {
        app: registry_router(state),
        store,
        gateway,
        db_path,
    }
}

impl TestApp {
    /// Give `account_id` a local user row with `role` and a token.
    pub async fn user(&self, token: &str, account_id: &str, role: &str) {
        let mut uow = self.store.begin().await.expect("begin failed");
        uow.insert_user(&format!("{account_id}@example.com"), account_id, role)
            .await
            .expect("insert user failed");
        uow.commit().await.expect("commit failed");
        self.gateway.issue_token(token, account_id);
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        let resp = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }
}
