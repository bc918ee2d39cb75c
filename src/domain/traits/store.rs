use async_trait::async_trait;
use crate::application::errors::StorageError;
use crate::domain::entities::Credential;

/// Store trait - durable home of the session credential
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the stored credential, `None` if nothing usable is stored
    async fn load(&self) -> Result<Option<Credential>, StorageError>;

    async fn save(&self, credential: &Credential) -> Result<(), StorageError>;

    /// Forget the stored credential so the next start re-authenticates
    async fn clear(&self) -> Result<(), StorageError>;
}
