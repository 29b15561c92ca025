//! Storage behind the demo REST surface.
//!
//! Everything lives for the lifetime of the process and is reset on
//! restart. Handlers only see the [`DemoStore`] trait.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Draft not found.")]
    DraftNotFound(String),
    #[error("Request not found.")]
    RequestNotFound(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRequest {
    pub id: u32,
    pub sender: String,
    pub date: String,
    pub status: RequestStatus,
    pub text: String,
}

pub trait DemoStore: Send {
    fn user(&self, username: &str) -> Option<&UserRecord>;

    fn timetable(&self) -> &Value;
    fn replace_timetable(&mut self, timetable: Value);

    /// Stores a draft and returns its id.
    fn save_draft(&mut self, draft: Value) -> String;
    fn drafts(&self) -> &BTreeMap<String, Value>;
    /// Promotes the draft to the current timetable and removes it.
    fn approve_draft(&mut self, id: &str) -> Result<(), StoreError>;
    fn discard_draft(&mut self, id: &str) -> Result<Value, StoreError>;

    /// Newest first.
    fn requests(&self) -> &[ChangeRequest];
    fn submit_request(&mut self, sender: String, text: String) -> ChangeRequest;
    fn update_request_status(&mut self, id: u32, status: RequestStatus) -> Result<(), StoreError>;

    fn authenticate(&self, username: &str, password: &str) -> Option<Role> {
        self.user(username)
            .filter(|user| user.password == password)
            .map(|user| user.role)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: HashMap<String, UserRecord>,
    timetable: Value,
    drafts: BTreeMap<String, Value>,
    requests: Vec<ChangeRequest>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            timetable: json!({}),
            ..Default::default()
        }
    }

    /// A store pre-filled with the demo accounts, timetable and one request.
    pub fn seeded() -> Self {
        let mut store = Self::new();
        for (name, password, role) in [
            ("student1", "studentpass", Role::Student),
            ("teacher1", "teacherpass", Role::Teacher),
            ("admin1", "adminpass", Role::Admin),
        ] {
            store.add_user(name, password, role);
        }
        store.timetable = json!({
            "Monday": "Maths, Physics, Chemistry",
            "Tuesday": "History, Geography, Biology",
            "Wednesday": "English, Computer Science, Economics",
        });
        store.requests.push(ChangeRequest {
            id: 1,
            sender: "teacher1".to_string(),
            date: "2025-09-20".to_string(),
            status: RequestStatus::Pending,
            text: "Request to swap Monday Physics class with Friday English class.".to_string(),
        });
        store
    }

    pub fn add_user(&mut self, username: &str, password: &str, role: Role) {
        self.users.insert(
            username.to_string(),
            UserRecord {
                password: password.to_string(),
                role,
            },
        );
    }
}

impl DemoStore for MemoryStore {
    fn user(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(username)
    }

    fn timetable(&self) -> &Value {
        &self.timetable
    }

    fn replace_timetable(&mut self, timetable: Value) {
        self.timetable = timetable;
    }

    fn save_draft(&mut self, draft: Value) -> String {
        let mut stamp = Utc::now().timestamp_millis();
        let mut id = format!("draft-{stamp}");
        while self.drafts.contains_key(&id) {
            stamp += 1;
            id = format!("draft-{stamp}");
        }
        self.drafts.insert(id.clone(), draft);
        id
    }

    fn drafts(&self) -> &BTreeMap<String, Value> {
        &self.drafts
    }

    fn approve_draft(&mut self, id: &str) -> Result<(), StoreError> {
        let draft = self.discard_draft(id)?;
        self.timetable = draft;
        Ok(())
    }

    fn discard_draft(&mut self, id: &str) -> Result<Value, StoreError> {
        self.drafts
            .remove(id)
            .ok_or_else(|| StoreError::DraftNotFound(id.to_string()))
    }

    fn requests(&self) -> &[ChangeRequest] {
        &self.requests
    }

    fn submit_request(&mut self, sender: String, text: String) -> ChangeRequest {
        let request = ChangeRequest {
            id: self.requests.len() as u32 + 1,
            sender,
            date: Utc::now().format("%Y-%m-%d").to_string(),
            status: RequestStatus::Pending,
            text,
        };
        self.requests.insert(0, request.clone());
        request
    }

    fn update_request_status(&mut self, id: u32, status: RequestStatus) -> Result<(), StoreError> {
        let request = self
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::RequestNotFound(id))?;
        request.status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticate_checks_password() {
        let store = MemoryStore::seeded();
        assert_eq!(store.authenticate("admin1", "adminpass"), Some(Role::Admin));
        assert_eq!(store.authenticate("admin1", "wrong"), None);
        assert_eq!(store.authenticate("nobody", "adminpass"), None);
    }

    #[test]
    fn approving_a_draft_replaces_the_timetable() {
        let mut store = MemoryStore::seeded();
        let id = store.save_draft(json!({ "Friday": "Art" }));
        assert!(id.starts_with("draft-"));
        assert_eq!(store.drafts().len(), 1);

        store.approve_draft(&id).unwrap();
        assert_eq!(store.timetable(), &json!({ "Friday": "Art" }));
        assert!(store.drafts().is_empty());
        assert_eq!(
            store.approve_draft(&id),
            Err(StoreError::DraftNotFound(id.clone()))
        );
    }

    #[test]
    fn draft_ids_are_unique() {
        let mut store = MemoryStore::new();
        let a = store.save_draft(json!(1));
        let b = store.save_draft(json!(2));
        assert_ne!(a, b);
        assert_eq!(store.discard_draft(&a), Ok(json!(1)));
        assert_eq!(store.drafts().keys().collect::<Vec<_>>(), vec![&b]);
    }

    #[test]
    fn requests_are_listed_newest_first() {
        let mut store = MemoryStore::seeded();
        let created = store.submit_request("teacher1".to_string(), "Move lab".to_string());

        assert_eq!(created.id, 2);
        assert_eq!(created.status, RequestStatus::Pending);
        assert_eq!(created.date.len(), 10);
        assert_eq!(store.requests()[0].id, 2);
        assert_eq!(store.requests()[1].id, 1);
    }

    #[test]
    fn status_updates_require_a_known_request() {
        let mut store = MemoryStore::seeded();
        store.update_request_status(1, RequestStatus::Approved).unwrap();
        assert_eq!(store.requests()[0].status, RequestStatus::Approved);
        assert_eq!(
            store.update_request_status(42, RequestStatus::Rejected),
            Err(StoreError::RequestNotFound(42))
        );
    }
}
