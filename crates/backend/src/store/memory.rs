use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{IdentityStore, MessageStore, StoreError, StoreResult};
use crate::models::{Identity, Message};

/// In-process store with the same uniqueness rules as the database schema.
#[derive(Default)]
pub struct MemoryStore {
    identities: RwLock<HashMap<Uuid, Identity>>,
    messages: RwLock<HashMap<Uuid, Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(identities: &HashMap<Uuid, Identity>, email: &str, except: Option<Uuid>) -> bool {
    identities
        .values()
        .any(|i| Some(i.id) != except && i.email.eq_ignore_ascii_case(email))
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let identities = self.identities.read().await;
        Ok(identities
            .values()
            .find(|i| i.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Identity>> {
        Ok(self.identities.read().await.get(&id).cloned())
    }

    async fn create(&self, identity: Identity) -> StoreResult<Identity> {
        let mut identities = self.identities.write().await;
        if identities.contains_key(&identity.id) || email_taken(&identities, &identity.email, None) {
            return Err(StoreError::Duplicate);
        }
        identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn update(&self, identity: Identity) -> StoreResult<Identity> {
        let mut identities = self.identities.write().await;
        if !identities.contains_key(&identity.id) {
            return Err(StoreError::NotFound);
        }
        if email_taken(&identities, &identity.email, Some(identity.id)) {
            return Err(StoreError::Duplicate);
        }
        identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let removed = self.identities.write().await.remove(&id);
        if removed.is_none() {
            return Err(StoreError::NotFound);
        }
        // Mirrors ON DELETE CASCADE on messages.owner_id
        self.messages.write().await.retain(|_, m| m.owner_id != id);
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Identity>> {
        let mut all: Vec<Identity> = self.identities.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn find_message(&self, id: Uuid) -> StoreResult<Option<Message>> {
        Ok(self.messages.read().await.get(&id).cloned())
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Message>> {
        let mut owned: Vec<Message> = self
            .messages
            .read()
            .await
            .values()
            .filter(|m| m.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(owned)
    }

    async fn create_message(&self, message: Message) -> StoreResult<Message> {
        let mut messages = self.messages.write().await;
        if messages.contains_key(&message.id) {
            return Err(StoreError::Duplicate);
        }
        messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn update_message(&self, message: Message) -> StoreResult<Message> {
        let mut messages = self.messages.write().await;
        match messages.get_mut(&message.id) {
            Some(existing) => {
                *existing = message.clone();
                Ok(message)
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_message(&self, id: Uuid) -> StoreResult<()> {
        match self.messages.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_identity;
    use chrono::Utc;
    use gatehouse_types::Sender;

    #[tokio::test]
    async fn test_create_and_find_identity() {
        let store = MemoryStore::new();
        let identity = sample_identity();

        store.create(identity.clone()).await.unwrap();

        let by_id = store.find_by_id(identity.id).await.unwrap();
        assert_eq!(by_id, Some(identity.clone()));

        let by_email = store.find_by_email("GRACE@example.com").await.unwrap();
        assert_eq!(by_email.map(|i| i.id), Some(identity.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected_case_insensitively() {
        let store = MemoryStore::new();
        store.create(sample_identity()).await.unwrap();

        let mut other = sample_identity();
        other.email = "Grace@Example.com".to_string();

        let result = store.create(other).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_identity() {
        let store = MemoryStore::new();
        let identity = sample_identity();

        assert!(matches!(
            store.update(identity.clone()).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.delete(identity.id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_cannot_steal_email() {
        let store = MemoryStore::new();
        let first = store.create(sample_identity()).await.unwrap();

        let mut second = sample_identity();
        second.email = "second@example.com".to_string();
        let mut second = store.create(second).await.unwrap();

        second.email = first.email.clone();
        assert!(matches!(store.update(second).await, Err(StoreError::Duplicate)));
    }

    #[tokio::test]
    async fn test_deleting_identity_removes_its_messages() {
        let store = MemoryStore::new();
        let identity = store.create(sample_identity()).await.unwrap();

        let message = Message {
            id: Uuid::new_v4(),
            owner_id: identity.id,
            sender: Sender::User,
            content: "hello".to_string(),
            date: Utc::now(),
        };
        store.create_message(message.clone()).await.unwrap();

        store.delete(identity.id).await.unwrap();
        assert_eq!(store.find_message(message.id).await.unwrap(), None);
    }
}
