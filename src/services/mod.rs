use async_trait::async_trait;

use crate::core::AppError;
use crate::models::access::Access;
use crate::models::files::{NewUserFile, UserFile};
use crate::models::users::{NewUser, User};

pub mod access;
pub mod files;
pub mod storage;
pub mod users;

pub use access::AccessService;
pub use files::FileService;
pub use storage::DiskStorage;
pub use users::UserService;

/// User directory collaborator: lookup by id, username or activation code.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_by_activation_code(&self, code: &str) -> Result<Option<User>, AppError>;
    async fn find_all(&self) -> Result<Vec<User>, AppError>;
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;
    async fn update(&self, user: &User) -> Result<(), AppError>;
}

/// Durable access store keyed by the ordered (owner, subscriber) pair.
#[async_trait]
pub trait AccessRepository: Send + Sync {
    async fn find(&self, owner_id: i32, subscriber_id: i32) -> Result<Option<Access>, AppError>;
    async fn find_by_owner(&self, owner_id: i32) -> Result<Vec<Access>, AppError>;
    async fn upsert(&self, access: &Access) -> Result<(), AppError>;
}

/// Durable store of uploaded file metadata.
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<UserFile>, AppError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<UserFile>, AppError>;
    async fn insert(&self, file: NewUserFile) -> Result<UserFile, AppError>;
    async fn save_download_count(&self, file: &UserFile) -> Result<(), AppError>;
    async fn delete(&self, id: i32) -> Result<(), AppError>;
}

/// Outbound mail collaborator used by the registration flow.
#[async_trait]
pub trait ActivationMailer: Send + Sync {
    async fn send_activation(
        &self,
        to_email: &str,
        username: &str,
        activation_code: &str,
    ) -> Result<(), AppError>;
}

/// Parses an id arriving as an external string (path parameter). Anything
/// but a plain positive decimal number is reported as not found.
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<i32, AppError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::not_found(format!(
            "The {} id must not be null or character!",
            entity
        )));
    }
    raw.parse::<i32>().map_err(|_| {
        AppError::not_found(format!("The {} id must not be null or character!", entity))
    })
}

#[cfg(test)]
pub(crate) mod support {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub fn user(id: i32, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            password: String::new(),
            email: format!("{}@example.com", username),
            activation_code: None,
            registration_date: Utc::now(),
            is_confirmed: true,
        }
    }

    #[derive(Default)]
    pub struct InMemoryUsers {
        rows: Mutex<HashMap<i32, User>>,
    }

    impl InMemoryUsers {
        pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
            Self {
                rows: Mutex::new(users.into_iter().map(|u| (u.id, u)).collect()),
            }
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryUsers {
        async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|u| u.username == username)
                .cloned())
        }

        async fn find_by_activation_code(&self, code: &str) -> Result<Option<User>, AppError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|u| u.activation_code.as_deref() == Some(code))
                .cloned())
        }

        async fn find_all(&self) -> Result<Vec<User>, AppError> {
            let mut users: Vec<User> = self.rows.lock().unwrap().values().cloned().collect();
            users.sort_by_key(|u| u.id);
            Ok(users)
        }

        async fn insert(&self, user: NewUser) -> Result<User, AppError> {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.keys().max().copied().unwrap_or(0) + 1;
            let user = User {
                id,
                username: user.username,
                password: user.password,
                email: user.email,
                activation_code: user.activation_code,
                registration_date: user.registration_date,
                is_confirmed: user.is_confirmed,
            };
            rows.insert(id, user.clone());
            Ok(user)
        }

        async fn update(&self, user: &User) -> Result<(), AppError> {
            self.rows.lock().unwrap().insert(user.id, user.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct InMemoryAccesses {
        rows: Mutex<HashMap<(i32, i32), Access>>,
    }

    #[async_trait]
    impl AccessRepository for InMemoryAccesses {
        async fn find(&self, owner_id: i32, subscriber_id: i32) -> Result<Option<Access>, AppError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .get(&(owner_id, subscriber_id))
                .cloned())
        }

        async fn find_by_owner(&self, owner_id: i32) -> Result<Vec<Access>, AppError> {
            let mut accesses: Vec<Access> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|a| a.owner_id == owner_id)
                .cloned()
                .collect();
            accesses.sort_by_key(|a| a.subscriber_id);
            Ok(accesses)
        }

        async fn upsert(&self, access: &Access) -> Result<(), AppError> {
            let mut rows = self.rows.lock().unwrap();
            let key = (access.owner_id, access.subscriber_id);
            let mut stored = access.clone();
            if let Some(existing) = rows.get(&key) {
                stored.version = existing.version + 1;
            }
            rows.insert(key, stored);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct InMemoryFiles {
        rows: Mutex<HashMap<i32, UserFile>>,
    }

    #[async_trait]
    impl FileRepository for InMemoryFiles {
        async fn find_all(&self) -> Result<Vec<UserFile>, AppError> {
            let mut files: Vec<UserFile> = self.rows.lock().unwrap().values().cloned().collect();
            files.sort_by_key(|f| f.id);
            Ok(files)
        }

        async fn find_by_id(&self, id: i32) -> Result<Option<UserFile>, AppError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn insert(&self, file: NewUserFile) -> Result<UserFile, AppError> {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.keys().max().copied().unwrap_or(0) + 1;
            let file = UserFile {
                id,
                file_name: file.file_name,
                original_name: file.original_name,
                download_count: 0,
                user_id: file.user_id,
            };
            rows.insert(id, file.clone());
            Ok(file)
        }

        async fn save_download_count(&self, file: &UserFile) -> Result<(), AppError> {
            self.rows.lock().unwrap().insert(file.id, file.clone());
            Ok(())
        }

        async fn delete(&self, id: i32) -> Result<(), AppError> {
            self.rows.lock().unwrap().remove(&id);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ActivationMailer for RecordingMailer {
        async fn send_activation(
            &self,
            to_email: &str,
            _username: &str,
            activation_code: &str,
        ) -> Result<(), AppError> {
            self.sent
                .lock()
                .unwrap()
                .push((to_email.to_string(), activation_code.to_string()));
            Ok(())
        }
    }
}
