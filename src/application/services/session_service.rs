use std::sync::Arc;

use crate::application::errors::BotError;
use crate::domain::entities::Credential;
use crate::domain::traits::{Authenticator, CredentialStore};

/// Where the session credential came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing obtained yet
    Absent,
    /// Read back from the credential store, not re-validated
    Loaded(Credential),
    /// Freshly issued by the network and written to the store
    Refreshed(Credential),
}

impl SessionState {
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            SessionState::Absent => None,
            SessionState::Loaded(c) | SessionState::Refreshed(c) => Some(c),
        }
    }
}

/// Obtains a reusable credential, authenticating only when none is stored
pub struct SessionManager {
    auth: Arc<dyn Authenticator>,
    store: Arc<dyn CredentialStore>,
    state: SessionState,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn Authenticator>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            auth,
            store,
            state: SessionState::Absent,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Produce a credential, moving out of `Absent`.
    ///
    /// A stored credential is used unconditionally. Otherwise the account is
    /// logged into, or registered if it does not exist, and the result is
    /// persisted. Every other failure is fatal.
    pub async fn establish(&mut self, username: &str, password: &str) -> Result<Credential, BotError> {
        if let Some(credential) = self.state.credential() {
            return Ok(credential.clone());
        }

        if let Some(credential) = self.store.load().await? {
            tracing::info!("Using stored session credential");
            self.state = SessionState::Loaded(credential.clone());
            return Ok(credential);
        }

        let credential = match self.auth.authenticate(username, password).await {
            Ok(credential) => {
                tracing::info!("Logged in as {}", username);
                credential
            }
            Err(BotError::AccountNotFound(reason)) => {
                tracing::info!("Login for {} refused ({}), registering", username, reason);
                self.auth.register_account(username, password).await?
            }
            Err(e) => return Err(e),
        };

        self.store.save(&credential).await?;
        tracing::info!("Session credential saved");
        self.state = SessionState::Refreshed(credential.clone());
        Ok(credential)
    }

    /// Drop a credential the network no longer accepts
    pub async fn invalidate(&mut self) -> Result<(), BotError> {
        self.store.clear().await?;
        self.state = SessionState::Absent;
        tracing::warn!("Stored session credential cleared; next start will log in again");
        Ok(())
    }

    /// Pass through the outcome of a run, invalidating the credential first
    /// if the network rejected it. A failure to clear the store is only
    /// logged so the run's own error is what gets reported.
    pub async fn settle<T>(&mut self, result: Result<T, BotError>) -> Result<T, BotError> {
        if let Err(e) = &result {
            if e.is_credential_rejected() {
                if let Err(clear_err) = self.invalidate().await {
                    tracing::warn!("Could not clear stored session credential: {}", clear_err);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::application::errors::StorageError;

    #[derive(Default)]
    struct MemoryStore {
        token: Mutex<Option<Credential>>,
        read_only: bool,
    }

    #[async_trait]
    impl CredentialStore for MemoryStore {
        async fn load(&self) -> Result<Option<Credential>, StorageError> {
            Ok(self.token.lock().unwrap().clone())
        }

        async fn save(&self, credential: &Credential) -> Result<(), StorageError> {
            *self.token.lock().unwrap() = Some(credential.clone());
            Ok(())
        }

        async fn clear(&self) -> Result<(), StorageError> {
            if self.read_only {
                let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
                return Err(StorageError::Io(denied));
            }
            *self.token.lock().unwrap() = None;
            Ok(())
        }
    }

    /// Scripted login result plus a call log
    struct ScriptedAuth {
        login: fn() -> Result<Credential, BotError>,
        register: fn() -> Result<Credential, BotError>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl ScriptedAuth {
        fn new(
            login: fn() -> Result<Credential, BotError>,
            register: fn() -> Result<Credential, BotError>,
        ) -> Arc<Self> {
            Arc::new(Self {
                login,
                register,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Authenticator for ScriptedAuth {
        async fn authenticate(&self, _username: &str, _password: &str) -> Result<Credential, BotError> {
            self.calls.lock().unwrap().push("login");
            (self.login)()
        }

        async fn register_account(&self, _username: &str, _password: &str) -> Result<Credential, BotError> {
            self.calls.lock().unwrap().push("register");
            (self.register)()
        }
    }

    fn unreachable_call() -> Result<Credential, BotError> {
        Err(BotError::Internal("should not be called".into()))
    }

    #[tokio::test]
    async fn test_stored_credential_skips_login() {
        let store = Arc::new(MemoryStore::default());
        store.save(&Credential::new("stored")).await.unwrap();
        let auth = ScriptedAuth::new(unreachable_call, unreachable_call);

        let mut manager = SessionManager::new(auth.clone(), store);
        let credential = manager.establish("bot", "pw").await.unwrap();

        assert_eq!(credential.token(), "stored");
        assert_eq!(manager.state(), &SessionState::Loaded(Credential::new("stored")));
        assert!(auth.calls().is_empty());
    }

    #[tokio::test]
    async fn test_login_persists_credential() {
        let store = Arc::new(MemoryStore::default());
        let auth = ScriptedAuth::new(|| Ok(Credential::new("fresh")), unreachable_call);

        let mut manager = SessionManager::new(auth.clone(), store.clone());
        manager.establish("bot", "pw").await.unwrap();

        assert_eq!(manager.state(), &SessionState::Refreshed(Credential::new("fresh")));
        assert_eq!(store.load().await.unwrap(), Some(Credential::new("fresh")));
        assert_eq!(auth.calls(), vec!["login"]);
    }

    #[tokio::test]
    async fn test_unknown_account_registers() {
        let store = Arc::new(MemoryStore::default());
        let auth = ScriptedAuth::new(
            || Err(BotError::AccountNotFound("M_FORBIDDEN".into())),
            || Ok(Credential::new("registered")),
        );

        let mut manager = SessionManager::new(auth.clone(), store.clone());
        let credential = manager.establish("bot", "pw").await.unwrap();

        assert_eq!(credential.token(), "registered");
        assert_eq!(auth.calls(), vec!["login", "register"]);
        assert_eq!(store.load().await.unwrap(), Some(credential));
    }

    #[tokio::test]
    async fn test_other_login_failure_is_fatal() {
        let store = Arc::new(MemoryStore::default());
        let auth = ScriptedAuth::new(|| Err(BotError::Network("refused".into())), unreachable_call);

        let mut manager = SessionManager::new(auth.clone(), store.clone());
        let err = manager.establish("bot", "pw").await.unwrap_err();

        assert!(matches!(err, BotError::Network(_)));
        assert_eq!(auth.calls(), vec!["login"]);
        assert_eq!(manager.state(), &SessionState::Absent);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_registration_failure_is_fatal() {
        let store = Arc::new(MemoryStore::default());
        let auth = ScriptedAuth::new(
            || Err(BotError::AccountNotFound("M_FORBIDDEN".into())),
            || Err(BotError::Auth("M_USER_IN_USE".into())),
        );

        let mut manager = SessionManager::new(auth, store.clone());
        assert!(manager.establish("bot", "pw").await.is_err());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalidate_clears_store() {
        let store = Arc::new(MemoryStore::default());
        store.save(&Credential::new("stale")).await.unwrap();
        let auth = ScriptedAuth::new(|| Ok(Credential::new("fresh")), unreachable_call);

        let mut manager = SessionManager::new(auth, store.clone());
        manager.establish("bot", "pw").await.unwrap();
        manager.invalidate().await.unwrap();

        assert_eq!(manager.state(), &SessionState::Absent);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_settle_clears_rejected_credential() {
        let store = Arc::new(MemoryStore::default());
        store.save(&Credential::new("stale")).await.unwrap();
        let auth = ScriptedAuth::new(unreachable_call, unreachable_call);

        let mut manager = SessionManager::new(auth, store.clone());
        manager.establish("bot", "pw").await.unwrap();
        let result: Result<(), BotError> = manager
            .settle(Err(BotError::Unauthorized("M_UNKNOWN_TOKEN".into())))
            .await;

        assert!(result.unwrap_err().is_credential_rejected());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_settle_keeps_run_error_when_clear_fails() {
        let store = Arc::new(MemoryStore {
            token: Mutex::new(Some(Credential::new("stale"))),
            read_only: true,
        });
        let auth = ScriptedAuth::new(unreachable_call, unreachable_call);

        let mut manager = SessionManager::new(auth, store.clone());
        manager.establish("bot", "pw").await.unwrap();
        let err = manager
            .settle::<()>(Err(BotError::Unauthorized("M_UNKNOWN_TOKEN".into())))
            .await
            .unwrap_err();

        assert!(matches!(err, BotError::Unauthorized(_)));
        assert_eq!(store.load().await.unwrap(), Some(Credential::new("stale")));
    }

    #[tokio::test]
    async fn test_settle_leaves_other_errors_alone() {
        let store = Arc::new(MemoryStore::default());
        store.save(&Credential::new("kept")).await.unwrap();
        let auth = ScriptedAuth::new(unreachable_call, unreachable_call);

        let mut manager = SessionManager::new(auth, store.clone());
        manager.establish("bot", "pw").await.unwrap();
        let result = manager.settle::<()>(Err(BotError::Closed)).await;

        assert!(matches!(result, Err(BotError::Closed)));
        assert_eq!(store.load().await.unwrap(), Some(Credential::new("kept")));
    }
}
