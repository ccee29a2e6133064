/// In-process store
///
/// Mirrors `PgStore` semantics: serial ids starting at 1, unique emails,
/// `ON DELETE CASCADE` for votes, case-sensitive substring filtering.
use crate::db::Store;
use crate::error::{ApiError, Result};
use crate::models::{FeedQuery, Link, LinkChanges, NewLink, NewUser, User, Vote};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<i32, User>,
    links: BTreeMap<i32, Link>,
    votes: BTreeSet<Vote>,
    next_user_id: i32,
    next_link_id: i32,
}

impl State {
    fn next_user_id(&mut self) -> i32 {
        self.next_user_id += 1;
        self.next_user_id
    }

    fn next_link_id(&mut self) -> i32 {
        self.next_link_id += 1;
        self.next_link_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|existing| existing.email == user.email) {
            return Err(ApiError::DuplicateEmail);
        }

        let id = state.next_user_id();
        let created = User {
            id,
            name: user.name,
            email: user.email,
            password: user.password_hash,
        };
        state.users.insert(id, created.clone());

        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|user| user.email == email).cloned())
    }

    async fn find_users_by_ids(&self, user_ids: &[i32]) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let wanted: BTreeSet<i32> = user_ids.iter().copied().collect();

        Ok(wanted
            .into_iter()
            .filter_map(|id| state.users.get(&id).cloned())
            .collect())
    }

    async fn create_link(&self, link: NewLink) -> Result<Link> {
        let mut state = self.state.write().await;

        if let Some(owner) = link.posted_by_id {
            if !state.users.contains_key(&owner) {
                return Err(ApiError::Store(format!(
                    "links.posted_by_id references missing user {owner}"
                )));
            }
        }

        let id = state.next_link_id();
        let created = Link {
            id,
            description: link.description,
            url: link.url,
            created_at: Utc::now(),
            posted_by_id: link.posted_by_id,
        };
        state.links.insert(id, created.clone());

        Ok(created)
    }

    async fn find_link(&self, link_id: i32) -> Result<Option<Link>> {
        let state = self.state.read().await;
        Ok(state.links.get(&link_id).cloned())
    }

    async fn find_links(&self, query: &FeedQuery) -> Result<Vec<Link>> {
        let state = self.state.read().await;

        let mut links: Vec<Link> = state
            .links
            .values()
            .filter(|link| query.matches(link))
            .cloned()
            .collect();
        links.sort_by(|a, b| query.compare(a, b));

        Ok(links
            .into_iter()
            .skip(query.offset())
            .take(query.limit())
            .collect())
    }

    async fn count_links(&self, query: &FeedQuery) -> Result<i64> {
        let state = self.state.read().await;
        let count = state.links.values().filter(|link| query.matches(link)).count();

        i64::try_from(count).map_err(|e| ApiError::Internal(e.to_string()))
    }

    async fn update_link(&self, link_id: i32, changes: LinkChanges) -> Result<Option<Link>> {
        let mut state = self.state.write().await;

        Ok(state.links.get_mut(&link_id).map(|link| {
            link.description = changes.description;
            link.url = changes.url;
            link.clone()
        }))
    }

    async fn delete_link(&self, link_id: i32) -> Result<bool> {
        let mut state = self.state.write().await;

        let removed = state.links.remove(&link_id).is_some();
        if removed {
            state.votes.retain(|vote| vote.link_id != link_id);
        }

        Ok(removed)
    }

    async fn find_links_by_posters(&self, user_ids: &[i32]) -> Result<Vec<Link>> {
        let state = self.state.read().await;

        Ok(state
            .links
            .values()
            .filter(|link| {
                link.posted_by_id
                    .is_some_and(|owner| user_ids.contains(&owner))
            })
            .cloned()
            .collect())
    }

    async fn find_voters(&self, link_ids: &[i32]) -> Result<Vec<(i32, User)>> {
        let state = self.state.read().await;

        Ok(state
            .votes
            .iter()
            .filter(|vote| link_ids.contains(&vote.link_id))
            .filter_map(|vote| {
                state
                    .users
                    .get(&vote.user_id)
                    .map(|user| (vote.link_id, user.clone()))
            })
            .collect())
    }

    async fn add_vote(&self, link_id: i32, user_id: i32) -> Result<bool> {
        let mut state = self.state.write().await;

        if !state.links.contains_key(&link_id) {
            return Ok(false);
        }
        if !state.users.contains_key(&user_id) {
            return Err(ApiError::Store(format!(
                "votes.user_id references missing user {user_id}"
            )));
        }

        state.votes.insert(Vote { link_id, user_id });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Alice".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    fn new_link(description: &str, url: &str, owner: Option<i32>) -> NewLink {
        NewLink {
            description: description.to_string(),
            url: url.to_string(),
            posted_by_id: owner,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@example.com")).await.unwrap();

        let result = store.create_user(new_user("a@example.com")).await;
        assert!(matches!(result, Err(ApiError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryStore::new();
        let first = store.create_link(new_link("a", "a.com", None)).await.unwrap();
        let second = store.create_link(new_link("b", "b.com", None)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_count_ignores_pagination() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .create_link(new_link(&format!("link {i}"), "example.com", None))
                .await
                .unwrap();
        }

        let query = FeedQuery::new(None, Some(1), Some(2), vec![]).unwrap();
        let page = store.find_links(&query).await.unwrap();

        assert_eq!(page.iter().map(|l| l.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(store.count_links(&query).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_delete_cascades_votes() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("v@example.com")).await.unwrap();
        let link = store.create_link(new_link("a", "a.com", None)).await.unwrap();

        assert!(store.add_vote(link.id, user.id).await.unwrap());
        assert!(store.delete_link(link.id).await.unwrap());
        assert!(store.find_voters(&[link.id]).await.unwrap().is_empty());
        assert!(!store.delete_link(link.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_vote_is_idempotent() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("v@example.com")).await.unwrap();
        let link = store.create_link(new_link("a", "a.com", None)).await.unwrap();

        assert!(store.add_vote(link.id, user.id).await.unwrap());
        assert!(store.add_vote(link.id, user.id).await.unwrap());
        assert_eq!(store.find_voters(&[link.id]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_vote_on_missing_link() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("v@example.com")).await.unwrap();

        assert!(!store.add_vote(99, user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_link_owner_must_exist() {
        let store = MemoryStore::new();
        let result = store.create_link(new_link("a", "a.com", Some(42))).await;

        assert!(matches!(result, Err(ApiError::Store(_))));
    }
}
