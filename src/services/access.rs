use std::sync::Arc;

use crate::core::AppError;
use crate::models::access::Access;
use crate::models::users::User;

use super::{parse_id, AccessRepository, UserRepository};

/// Request/grant transitions on the per-(owner, subscriber) access record.
///
/// Each capability moves through `None → Pending → Granted`: a request puts
/// it into `Pending` (the provisional grant is withheld until the owner
/// acts), granting clears the pending state. Records are created lazily on
/// the first request and kept forever as the permanent permission record.
pub struct AccessService {
    users: Arc<dyn UserRepository>,
    accesses: Arc<dyn AccessRepository>,
}

impl AccessService {
    pub fn new(users: Arc<dyn UserRepository>, accesses: Arc<dyn AccessRepository>) -> Self {
        Self { users, accesses }
    }

    /// Subscriber asks the owner for read access. Rejected when an
    /// unconditional download grant already covers it, or when read is
    /// already granted.
    #[tracing::instrument(name = "Request read access", skip(self))]
    pub async fn save_request_to_read(
        &self,
        owner_id: &str,
        subscriber_id: i32,
    ) -> Result<(), AppError> {
        let subscriber = self.require_user(subscriber_id).await?;
        let owner = self.find_user_by_id(owner_id).await?;

        let mut access = self
            .accesses
            .find(owner.id, subscriber.id)
            .await?
            .unwrap_or_else(|| Access::new(owner.id, subscriber.id));

        if access.download.is_granted() {
            return Err(AppError::already_exists(
                "You already have the permission to access!",
            ));
        }
        if access.read.is_granted() {
            return Err(AppError::already_exists(
                "You already have the permission to read!",
            ));
        }

        access.read = access.read.request();
        self.accesses.upsert(&access).await
    }

    /// Subscriber asks the owner for download access.
    #[tracing::instrument(name = "Request download access", skip(self))]
    pub async fn save_request_to_download(
        &self,
        owner_id: &str,
        subscriber_id: i32,
    ) -> Result<(), AppError> {
        let subscriber = self.require_user(subscriber_id).await?;
        let owner = self.find_user_by_id(owner_id).await?;

        let mut access = self
            .accesses
            .find(owner.id, subscriber.id)
            .await?
            .unwrap_or_else(|| Access::new(owner.id, subscriber.id));

        if access.download.is_granted() {
            return Err(AppError::already_exists(
                "You already have the permission to download!",
            ));
        }

        access.download = access.download.request();
        self.accesses.upsert(&access).await
    }

    /// Pending inbound requests the owner still has to act on.
    #[tracing::instrument(name = "List pending access requests", skip(self))]
    pub async fn get_requesting_accesses(
        &self,
        current_user_id: i32,
    ) -> Result<Vec<Access>, AppError> {
        let current_user = self.require_user(current_user_id).await?;
        let accesses = self.accesses.find_by_owner(current_user.id).await?;

        Ok(accesses
            .into_iter()
            .filter(Access::has_pending_request)
            .collect())
    }

    /// Owner approves a pending read request.
    #[tracing::instrument(name = "Allow read access", skip(self))]
    pub async fn allow_read(&self, current_user_id: i32, subscriber_id: &str) -> Result<(), AppError> {
        let current_user = self.require_user(current_user_id).await?;
        let subscriber = self.find_user_by_id(subscriber_id).await?;

        let mut access = self
            .accesses
            .find(current_user.id, subscriber.id)
            .await?
            .ok_or_else(|| AppError::not_found("There is no requesting access"))?;

        access.read = access.read.grant();
        self.accesses.upsert(&access).await
    }

    /// Owner approves a pending download request.
    #[tracing::instrument(name = "Allow download access", skip(self))]
    pub async fn allow_download(
        &self,
        current_user_id: i32,
        subscriber_id: &str,
    ) -> Result<(), AppError> {
        let current_user = self.require_user(current_user_id).await?;
        let subscriber = self.find_user_by_id(subscriber_id).await?;

        let mut access = self
            .accesses
            .find(current_user.id, subscriber.id)
            .await?
            .ok_or_else(|| AppError::not_found("There is no requesting access"))?;

        access.download = access.download.grant();
        self.accesses.upsert(&access).await
    }

    /// Pure lookup; absence of a relationship is a valid state, not an
    /// error.
    pub async fn find_access(
        &self,
        owner_id: &str,
        subscriber_id: i32,
    ) -> Result<Option<Access>, AppError> {
        let subscriber = self.require_user(subscriber_id).await?;
        let owner = self.find_user_by_id(owner_id).await?;

        self.accesses.find(owner.id, subscriber.id).await
    }

    /// Resolves a user from an external string id.
    pub async fn find_user_by_id(&self, raw_id: &str) -> Result<User, AppError> {
        let id = parse_id(raw_id, "user")?;
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("No user or subscriber"))
    }

    async fn require_user(&self, id: i32) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("No user or subscriber"))
    }
}
