use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::{SequenceStore, TicketStore, UserStore};
use crate::models::{HasRoles, Role, Ticket, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    tickets: BTreeMap<i64, Ticket>,
    sequences: HashMap<String, i64>,
}

/// Process-local store backing the integration tests. Enforces the same
/// uniqueness rules as the Postgres schema.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique(tables: &Tables, user: &User) -> Result<(), DatabaseError> {
    for other in tables.users.values().filter(|u| u.id != user.id) {
        if other.username == user.username {
            return Err(DatabaseError::Conflict("users_username_key".to_string()));
        }
        if other.email == user.email {
            return Err(DatabaseError::Conflict("users_email_key".to_string()));
        }
    }
    Ok(())
}

/// Relevance of `ticket` for the lower-cased `terms`: subject hits weigh
/// most, then details, then update text. Every term has to hit somewhere.
fn score(ticket: &Ticket, terms: &[String]) -> Option<u32> {
    let subject = ticket.subject.to_lowercase();
    let details = ticket.details.as_deref().unwrap_or_default().to_lowercase();
    let updates = ticket
        .updates
        .iter()
        .map(|u| u.details.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let mut total = 0;
    for term in terms {
        let mut hit = 0;
        if subject.contains(term.as_str()) {
            hit += 4;
        }
        if details.contains(term.as_str()) {
            hit += 2;
        }
        if updates.contains(term.as_str()) {
            hit += 1;
        }
        if hit == 0 {
            return None;
        }
        total += hit;
    }
    Some(total)
}

#[async_trait]
impl SequenceStore for MemoryStore {
    async fn next_value(&self, name: &str) -> Result<i64, DatabaseError> {
        let mut tables = self.tables.write().await;
        let value = tables
            .sequences
            .get_mut(name)
            .ok_or_else(|| DatabaseError::SequenceMissing(name.to_string()))?;
        *value += 1;
        Ok(*value)
    }

    async fn exists(&self, name: &str) -> Result<bool, DatabaseError> {
        Ok(self.tables.read().await.sequences.contains_key(name))
    }

    async fn seed(&self, name: &str, value: i64) -> Result<(), DatabaseError> {
        self.tables
            .write()
            .await
            .sequences
            .insert(name.to_string(), value);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn list_at_least(&self, tier: Role) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| u.satisfies(tier))
            .cloned()
            .collect())
    }

    async fn find(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn insert(&self, user: &User) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Err(DatabaseError::Conflict("users_pkey".to_string()));
        }
        check_unique(&tables, user)?;
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(DatabaseError::NotFound(format!("User {}", user.id)));
        }
        check_unique(&tables, user)?;
        tables.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Ticket>, DatabaseError> {
        Ok(self.tables.read().await.tickets.values().cloned().collect())
    }

    async fn list_submitted_by(&self, user_id: i64) -> Result<Vec<Ticket>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tickets
            .values()
            .filter(|t| t.created_by == user_id)
            .cloned()
            .collect())
    }

    async fn list_assigned_to(&self, user_id: i64) -> Result<Vec<Ticket>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tickets
            .values()
            .filter(|t| t.is_assigned_to(user_id))
            .cloned()
            .collect())
    }

    async fn search(
        &self,
        query: &str,
        submitted_by: Option<i64>,
    ) -> Result<Vec<Ticket>, DatabaseError> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(vec![]);
        }

        let tables = self.tables.read().await;
        let mut hits: Vec<(u32, &Ticket)> = tables
            .tickets
            .values()
            .filter(|t| submitted_by.map_or(true, |id| t.created_by == id))
            .filter_map(|t| score(t, &terms).map(|s| (s, t)))
            .collect();
        hits.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.id.cmp(&b.1.id)));
        Ok(hits.into_iter().map(|(_, t)| t.clone()).collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Ticket>, DatabaseError> {
        Ok(self.tables.read().await.tickets.get(&id).cloned())
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.tickets.contains_key(&ticket.id) {
            return Err(DatabaseError::Conflict("tickets_pkey".to_string()));
        }
        tables.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn save(&self, ticket: &Ticket) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        match tables.tickets.get_mut(&ticket.id) {
            Some(stored) => {
                *stored = ticket.clone();
                Ok(())
            }
            None => Err(DatabaseError::NotFound(format!("Ticket {}", ticket.id))),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.tables.write().await.tickets.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fixture;
    use crate::database::TICKET_ID_SEQUENCE;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        fixture::load(&store, &store, &store, "hash").await.unwrap();
        store
    }

    #[tokio::test]
    async fn concurrent_next_value_never_repeats() {
        let store = MemoryStore::new();
        store.seed(TICKET_ID_SEQUENCE, 1000).await.unwrap();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.next_value(TICKET_ID_SEQUENCE).await })
            })
            .collect();

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap().unwrap());
        }
        values.sort();
        values.dedup();
        assert_eq!(values.len(), 50);
        assert_eq!(values.first(), Some(&1001));
        assert_eq!(values.last(), Some(&1050));
    }

    #[tokio::test]
    async fn missing_sequence_is_an_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.next_value("nope").await,
            Err(DatabaseError::SequenceMissing(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = seeded().await;
        let mut copy = UserStore::find(&store, 6).await.unwrap().unwrap();
        copy.id = 7;
        copy.email = "other@localhost.localdomain".into();
        assert!(matches!(
            UserStore::insert(&store, &copy).await,
            Err(DatabaseError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn tier_listing_includes_higher_roles() {
        let store = seeded().await;
        let ids: Vec<i64> = store
            .list_at_least(Role::Technician)
            .await
            .unwrap()
            .iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        let supervisors = store.list_at_least(Role::Supervisor).await.unwrap();
        assert_eq!(supervisors.len(), 3);
    }

    #[tokio::test]
    async fn search_ranks_subject_hits_first() {
        let store = seeded().await;
        let hits = store.search("equipment", None).await.unwrap();
        let ids: Vec<i64> = hits.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3]);

        let none = store.search("equipment", Some(1)).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn save_and_delete_report_missing_tickets() {
        let store = seeded().await;
        let mut ticket = TicketStore::find(&store, 1).await.unwrap().unwrap();
        ticket.id = 42;
        assert!(matches!(
            TicketStore::save(&store, &ticket).await,
            Err(DatabaseError::NotFound(_))
        ));
        assert!(store.delete(1).await.unwrap());
        assert!(!store.delete(1).await.unwrap());
    }
}
