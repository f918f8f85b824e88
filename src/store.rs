use std::collections::BTreeMap;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::profiler::{record_query, Binding};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// A `users` table held in memory.
///
/// Every lookup is reported to the current request's profiler as the SQL
/// statement it stands for, timed around the actual map access.
pub struct UserStore {
    rows: RwLock<BTreeMap<u64, User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn find(&self, id: u64) -> Option<User> {
        let t0 = Instant::now();
        let user = self.rows.read().get(&id).cloned();
        report(
            "SELECT * FROM users WHERE id = ? LIMIT 1",
            &[id.into()],
            t0,
        );
        user
    }

    /// Users in id order, at most `limit`, starting after `after`.
    pub fn list(&self, after: u64, limit: usize) -> Vec<User> {
        let t0 = Instant::now();
        let users = self
            .rows
            .read()
            .range(after.saturating_add(1)..)
            .take(limit)
            .map(|(_, u)| u.clone())
            .collect();
        report(
            "SELECT * FROM users WHERE id > ? ORDER BY id LIMIT ?",
            &[after.into(), (limit as u64).into()],
            t0,
        );
        users
    }

    pub fn count(&self) -> usize {
        let t0 = Instant::now();
        let n = self.rows.read().len();
        report("SELECT COUNT(*) FROM users", &[], t0);
        n
    }

    /// Insert a new user and return it with its assigned id.
    pub fn insert(&self, name: String, email: String, role: String) -> User {
        let t0 = Instant::now();
        let user = {
            let mut rows = self.rows.write();
            let id = rows.keys().next_back().map_or(1, |last| last + 1);
            let user = User {
                id,
                name,
                email,
                role,
            };
            rows.insert(id, user.clone());
            user
        };
        report(
            "INSERT INTO users (name, email, role) VALUES (?, ?, ?)",
            &[
                Binding::from(&user.name),
                Binding::from(&user.email),
                Binding::from(&user.role),
            ],
            t0,
        );
        user
    }

    /// Bulk load used by seeding; not reported.
    pub fn load(&self, users: impl IntoIterator<Item = User>) {
        let mut rows = self.rows.write();
        for user in users {
            rows.insert(user.id, user);
        }
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn report(sql: &str, bindings: &[Binding], t0: Instant) {
    record_query(sql, bindings, t0.elapsed().as_secs_f64() * 1000.0);
}
