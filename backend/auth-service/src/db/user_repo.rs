use crate::error::{AuthError, AuthResult};
use crate::models::{UpdateProfileRequest, User};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use session_auth::{DirectoryError, Identity, IdentityDirectory, IdentityStatus};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `PhoneAlreadyExists` when the phone number is taken
    async fn create_user(&self, user: User) -> AuthResult<User>;

    async fn find_by_phone(&self, phone_number: &str) -> AuthResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;

    /// `None` when the user does not exist
    async fn update_status(&self, id: Uuid, status: IdentityStatus) -> AuthResult<Option<User>>;

    /// Apply the present fields. A new phone number must be free.
    async fn update_profile(
        &self,
        id: Uuid,
        update: UpdateProfileRequest,
    ) -> AuthResult<Option<User>>;

    async fn update_password(&self, id: Uuid, password_hash: String) -> AuthResult<Option<User>>;
}

/// User store kept in process memory, indexed by id and phone number
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: DashMap<Uuid, User>,
    phones: DashMap<String, Uuid>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, user: User) -> AuthResult<User> {
        // The phone entry stays locked until both maps are written
        match self.phones.entry(user.phone_number.clone()) {
            Entry::Occupied(_) => Err(AuthError::PhoneAlreadyExists),
            Entry::Vacant(slot) => {
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn find_by_phone(&self, phone_number: &str) -> AuthResult<Option<User>> {
        let id = match self.phones.get(phone_number) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn update_status(&self, id: Uuid, status: IdentityStatus) -> AuthResult<Option<User>> {
        Ok(self.users.get_mut(&id).map(|mut user| {
            user.status = status;
            user.updated_at = Utc::now();
            user.value().clone()
        }))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: UpdateProfileRequest,
    ) -> AuthResult<Option<User>> {
        let current_phone = match self.users.get(&id) {
            Some(user) => user.phone_number.clone(),
            None => return Ok(None),
        };

        if let Some(phone) = update.phone_number.as_ref().filter(|p| **p != current_phone) {
            match self.phones.entry(phone.clone()) {
                Entry::Occupied(_) => return Err(AuthError::PhoneAlreadyExists),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.phones.remove(&current_phone);
        }

        Ok(self.users.get_mut(&id).map(|mut user| {
            if let Some(phone) = update.phone_number {
                user.phone_number = phone;
            }
            if let Some(first_name) = update.first_name {
                user.first_name = Some(first_name);
            }
            if let Some(last_name) = update.last_name {
                user.last_name = Some(last_name);
            }
            if let Some(email) = update.email {
                user.email = Some(email);
            }
            user.updated_at = Utc::now();
            user.value().clone()
        }))
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> AuthResult<Option<User>> {
        Ok(self.users.get_mut(&id).map(|mut user| {
            user.password_hash = password_hash;
            user.updated_at = Utc::now();
            user.value().clone()
        }))
    }
}

#[async_trait]
impl IdentityDirectory for MemoryUserRepository {
    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, DirectoryError> {
        Ok(self.users.get(&id).map(|u| u.identity()))
    }
}
