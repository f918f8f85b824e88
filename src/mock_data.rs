use std::time::Instant;

use crate::store::{User, UserStore};

// ─── Constants ───────────────────────────────────────────────────

const NUM_USERS: u64 = 250;

// ─── Name pools ──────────────────────────────────────────────────

static FIRST: &[&str] = &[
    "Emma", "Liam", "Olivia", "Noah", "Ava", "Ethan", "Sophia", "Mason", "Isabella", "William",
    "Mia", "James", "Charlotte", "Benjamin", "Amelia", "Lucas", "Harper", "Henry", "Evelyn",
    "Alexander",
];

static LAST: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "O'Brien", "Taylor",
];

static ROLES: &[&str] = &["admin", "editor", "viewer", "viewer", "viewer"];

/// Deterministic user `id` (1-based) built from the name pools.
pub fn user(id: u64) -> User {
    let i = id as usize;
    let first = FIRST[i % FIRST.len()];
    let last = LAST[(i / FIRST.len() + i) % LAST.len()];
    User {
        id,
        name: format!("{first} {last}"),
        email: format!(
            "{}.{}{id}@example.com",
            first.to_lowercase(),
            last.to_lowercase().replace('\'', "")
        ),
        role: ROLES[i % ROLES.len()].to_owned(),
    }
}

/// Fill `store` with the demo users.
pub fn seed(store: &UserStore) {
    let t0 = Instant::now();
    store.load((1..=NUM_USERS).map(user));
    tracing::info!(
        users = NUM_USERS,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "seeded user directory"
    );
}
