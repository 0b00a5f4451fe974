/// In-memory store
///
/// Keeps users and contacts in ordered maps behind a `tokio` read/write lock
/// and enforces the same constraints as the SQL schema (unique email and
/// verification token, column lengths, existing owner), reporting them with
/// the same [`StoreError`] variants.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{ContactStore, Store, StoreError, StoreResult, UserStore};
use crate::models::contact::{Contact, ContactFilter, ContactPatch, CreateContact};
use crate::models::user::{CreateUser, Subscription, User};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    contacts: BTreeMap<i64, Contact>,
    next_user_id: i64,
    next_contact_id: i64,
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> StoreResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(StoreError::Validation(format!(
            "{} length must be between {} and {}, got {}",
            field, min, max, len
        )));
    }
    Ok(())
}

fn check_contact_fields(name: &str, email: &str, phone: &str) -> StoreResult<()> {
    check_len("name", name, 1, 100)?;
    check_len("email", email, 6, 254)?;
    check_len("phone", phone, 1, 40)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        check_len("email", &data.email, 6, 254)?;
        check_len("password", &data.password_hash, 1, 254)?;

        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::UniqueViolation {
                field: "email".to_string(),
            });
        }
        if tables
            .users
            .values()
            .any(|u| u.verification_token.as_deref() == Some(data.verification_token.as_str()))
        {
            return Err(StoreError::UniqueViolation {
                field: "verification_token".to_string(),
            });
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.next_user_id,
            email: data.email,
            password: data.password_hash,
            subscription: Subscription::default().as_str().to_string(),
            token: None,
            avatar_url: data.avatar_url,
            verify: false,
            verification_token: Some(data.verification_token),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_verification_token(&self, token: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.verification_token.as_deref() == Some(token))
            .cloned())
    }

    async fn set_user_token(&self, id: i64, token: Option<&str>) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.users.get_mut(&id) {
            Some(user) => {
                user.token = token.map(str::to_string);
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn set_user_avatar(&self, id: i64, avatar_url: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.users.get_mut(&id) {
            Some(user) => {
                user.avatar_url = avatar_url.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn set_user_subscription(
        &self,
        id: i64,
        subscription: Subscription,
    ) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.subscription = subscription.as_str().to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn verify_user_email(&self, token: &str) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .users
            .values_mut()
            .find(|u| u.verification_token.as_deref() == Some(token))
            .map(|user| {
                user.verify = true;
                user.verification_token = None;
                user.updated_at = Utc::now();
                user.clone()
            }))
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn list_contacts(&self, filter: ContactFilter) -> StoreResult<Vec<Contact>> {
        let tables = self.tables.read().await;
        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(0);

        Ok(tables
            .contacts
            .values()
            .filter(|c| c.owner == filter.owner)
            .filter(|c| filter.favorite.map_or(true, |f| c.favorite == f))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_contact(&self, owner: i64, id: i64) -> StoreResult<Option<Contact>> {
        let tables = self.tables.read().await;
        Ok(tables
            .contacts
            .get(&id)
            .filter(|c| c.owner == owner)
            .cloned())
    }

    async fn create_contact(&self, data: CreateContact) -> StoreResult<Contact> {
        check_contact_fields(&data.name, &data.email, &data.phone)?;

        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&data.owner) {
            return Err(StoreError::Validation(format!(
                "owner {} does not exist",
                data.owner
            )));
        }

        tables.next_contact_id += 1;
        let now = Utc::now();
        let contact = Contact {
            id: tables.next_contact_id,
            name: data.name,
            email: data.email,
            phone: data.phone,
            favorite: false,
            owner: data.owner,
            created_at: now,
            updated_at: now,
        };
        tables.contacts.insert(contact.id, contact.clone());

        Ok(contact)
    }

    async fn update_contact(&self, owner: i64, id: i64, patch: ContactPatch) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let Some(contact) = tables.contacts.get_mut(&id).filter(|c| c.owner == owner) else {
            return Ok(0);
        };

        let mut updated = contact.clone();
        patch.apply(&mut updated);
        check_contact_fields(&updated.name, &updated.email, &updated.phone)?;
        updated.updated_at = Utc::now();
        *contact = updated;

        Ok(1)
    }

    async fn delete_contact(&self, owner: i64, id: i64) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let owned = tables.contacts.get(&id).is_some_and(|c| c.owner == owner);
        if owned {
            tables.contacts.remove(&id);
            return Ok(1);
        }
        Ok(0)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, token: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            avatar_url: "/avatars/avatar_default_abstract.png".to_string(),
            verification_token: token.to_string(),
        }
    }

    fn new_contact(owner: i64, name: &str) -> CreateContact {
        CreateContact {
            owner,
            name: name.to_string(),
            email: "someone@example.com".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@example.com", "t1")).await.unwrap();

        let err = store
            .create_user(new_user("a@example.com", "t2"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { ref field } if field == "email"));
    }

    #[tokio::test]
    async fn test_short_email_is_validation_error() {
        let store = MemoryStore::new();
        let err = store.create_user(new_user("a@b", "t")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_verify_consumes_token_once() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@example.com", "tok")).await.unwrap();

        let verified = store.verify_user_email("tok").await.unwrap().unwrap();
        assert!(verified.verify);
        assert!(verified.verification_token.is_none());

        assert!(store.verify_user_email("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_contacts_are_owner_scoped() {
        let store = MemoryStore::new();
        let a = store.create_user(new_user("a@example.com", "ta")).await.unwrap();
        let b = store.create_user(new_user("b@example.com", "tb")).await.unwrap();
        let contact = store.create_contact(new_contact(a.id, "Alice")).await.unwrap();

        assert!(store.find_contact(b.id, contact.id).await.unwrap().is_none());
        assert_eq!(
            store
                .update_contact(b.id, contact.id, ContactPatch::default())
                .await
                .unwrap(),
            0
        );
        assert_eq!(store.delete_contact(b.id, contact.id).await.unwrap(), 0);
        assert!(store.find_contact(a.id, contact.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_paginates_in_id_order() {
        let store = MemoryStore::new();
        let a = store.create_user(new_user("a@example.com", "ta")).await.unwrap();
        for name in ["First", "Second", "Third"] {
            store.create_contact(new_contact(a.id, name)).await.unwrap();
        }

        let page = store
            .list_contacts(ContactFilter {
                owner: a.id,
                favorite: None,
                limit: 1,
                offset: 1,
            })
            .await
            .unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Second");
    }

    #[tokio::test]
    async fn test_contact_for_missing_owner_is_rejected() {
        let store = MemoryStore::new();
        let err = store.create_contact(new_contact(99, "Ghost")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
