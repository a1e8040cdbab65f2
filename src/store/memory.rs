// store/memory.rs - In-process stand-in for the hosted backend
//
// Behaves like the provider for everything the API relies on: email/password
// accounts, opaque session tokens, primary and foreign key constraints,
// equality filters, ordering, nested selects and single-row reads. Error
// texts match the provider's so clients see the same messages locally.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::query::{Direction, Embed, Relation, Select};
use super::schema::{self, foreign_key_constraint, Table};
use super::{AuthUser, Credentials, Session, StoreBackend, StoreError};

const SESSION_TTL_SECS: i64 = 3600;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    id: String,
    email: String,
    salt: String,
    password_digest: String,
    created_at: String,
}

impl Account {
    fn to_user(&self) -> AuthUser {
        let mut extra = Map::new();
        extra.insert("aud".into(), json!("authenticated"));
        extra.insert("role".into(), json!("authenticated"));
        extra.insert("created_at".into(), json!(self.created_at));
        AuthUser {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            extra,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredRow {
    seq: u64,
    data: Map<String, Value>,
}

#[derive(Debug, Clone)]
struct StoredSession {
    user_id: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, StoredSession>,
    tables: HashMap<&'static str, Vec<StoredRow>>,
    next_seq: u64,
}

impl State {
    fn rows(&self, table: &str) -> &[StoredRow] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    fn has_id(&self, table: &str, id: &str) -> bool {
        self.rows(table)
            .iter()
            .any(|row| row.data.get("id").and_then(key_of).as_deref() == Some(id))
    }

    fn account_by_id(&self, id: &str) -> Option<&Account> {
        self.accounts.values().find(|account| account.id == id)
    }

    fn prune_sessions(&mut self, now: DateTime<Utc>) {
        self.sessions.retain(|_, session| session.expires_at > now);
    }
}

/// Backend that keeps everything in process memory. Contents are lost on restart.
pub struct MemoryBackend {
    state: RwLock<State>,
    session_ttl: Duration,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::with_session_ttl(Duration::seconds(SESSION_TTL_SECS))
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions stop resolving once `ttl` has passed since sign-in.
    pub fn with_session_ttl(ttl: Duration) -> Self {
        Self {
            state: RwLock::default(),
            session_ttl: ttl,
        }
    }

    /// Number of sessions that have not expired or been signed out.
    pub async fn session_count(&self) -> usize {
        let mut state = self.state.write().await;
        state.prune_sessions(Utc::now());
        state.sessions.len()
    }

    /// Number of rows currently stored in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.state.read().await.rows(table).len()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, StoreError> {
        let email = credentials.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(StoreError::rejected("Unable to validate email address: invalid format"));
        }
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(StoreError::rejected(format!(
                "Password should be at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }

        let mut state = self.state.write().await;
        if state.accounts.contains_key(&email) {
            return Err(StoreError::rejected("User already registered"));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let account = Account {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            password_digest: digest_password(&salt, &credentials.password),
            salt,
            created_at: crate::types::now(),
        };
        let user = account.to_user();
        state.accounts.insert(email, account);

        tracing::debug!("memory store: registered {}", user.id);
        Ok(user)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<(AuthUser, Session), StoreError> {
        let email = credentials.email.trim().to_lowercase();
        let mut state = self.state.write().await;

        let account = state
            .accounts
            .get(&email)
            .filter(|account| account.password_digest == digest_password(&account.salt, &credentials.password))
            .cloned()
            .ok_or_else(|| StoreError::rejected("Invalid login credentials"))?;

        let now = Utc::now();
        let expires_at = now + self.session_ttl;
        state.prune_sessions(now);

        let access_token = Uuid::new_v4().simple().to_string();
        state.sessions.insert(
            access_token.clone(),
            StoredSession {
                user_id: account.id.clone(),
                expires_at,
            },
        );

        let session = Session {
            access_token,
            token_type: Some("bearer".to_string()),
            expires_in: Some(self.session_ttl.num_seconds()),
            expires_at: Some(expires_at.timestamp()),
            refresh_token: Some(Uuid::new_v4().simple().to_string()),
        };
        Ok((account.to_user(), session))
    }

    async fn sign_out(&self, token: &str) -> Result<(), StoreError> {
        self.state.write().await.sessions.remove(token);
        Ok(())
    }

    async fn get_user(&self, token: &str) -> Result<Option<AuthUser>, StoreError> {
        let mut state = self.state.write().await;
        state.prune_sessions(Utc::now());
        let user = state
            .sessions
            .get(token)
            .and_then(|session| state.account_by_id(&session.user_id))
            .map(Account::to_user);
        Ok(user)
    }

    async fn select(&self, _token: Option<&str>, query: &Select) -> Result<Vec<Value>, StoreError> {
        let state = self.state.read().await;
        known_table(query.table)?;

        let mut rows: Vec<&StoredRow> = state
            .rows(query.table)
            .iter()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|(column, value)| matches_value(row.data.get(*column), value))
            })
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.data.get(order.column), b.data.get(order.column))
                    .then(a.seq.cmp(&b.seq));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        if query.single && rows.len() != 1 {
            return Err(StoreError::rejected_with_code(
                "JSON object requested, multiple (or no) rows returned",
                "PGRST116",
            ));
        }

        let result = rows
            .into_iter()
            .map(|row| {
                let mut shaped = project(&row.data, &query.columns);
                for embed in &query.embeds {
                    shaped.insert(embed.table.to_string(), resolve_embed(&state, &row.data, embed));
                }
                Value::Object(shaped)
            })
            .collect();
        Ok(result)
    }

    async fn insert(&self, _token: Option<&str>, table: &str, row: Value) -> Result<Value, StoreError> {
        let table = known_table(table)?;
        let Value::Object(mut data) = row else {
            return Err(StoreError::rejected_with_code("Expected a JSON object to insert", "PGRST102"));
        };

        let mut state = self.state.write().await;

        let id = match data.get("id").and_then(key_of) {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                data.insert("id".into(), json!(id));
                id
            }
        };
        if state.has_id(table.name, &id) {
            return Err(StoreError::rejected_with_code(
                format!(
                    "duplicate key value violates unique constraint \"{}\"",
                    table.primary_key_constraint()
                ),
                "23505",
            ));
        }

        for fk in table.foreign_keys {
            let Some(target) = data.get(fk.column).and_then(key_of) else {
                continue;
            };
            if !state.has_id(fk.references, &target) {
                return Err(StoreError::rejected_with_code(
                    format!(
                        "insert or update on table \"{}\" violates foreign key constraint \"{}\"",
                        table.name,
                        foreign_key_constraint(table.name, fk.column)
                    ),
                    "23503",
                ));
            }
        }

        data.entry("created_at").or_insert_with(|| json!(crate::types::now()));

        state.next_seq += 1;
        let seq = state.next_seq;
        state.tables.entry(table.name).or_default().push(StoredRow {
            seq,
            data: data.clone(),
        });

        Ok(Value::Object(data))
    }
}

fn known_table(name: &str) -> Result<&'static Table, StoreError> {
    schema::table(name).ok_or_else(|| {
        StoreError::rejected_with_code(format!("relation \"public.{}\" does not exist", name), "42P01")
    })
}

fn resolve_embed(state: &State, base: &Map<String, Value>, embed: &Embed) -> Value {
    match embed.relation {
        Relation::Parent { via } => {
            let Some(target) = base.get(via).and_then(key_of) else {
                return Value::Null;
            };
            state
                .rows(embed.table)
                .iter()
                .find(|row| row.data.get("id").and_then(key_of).as_deref() == Some(target.as_str()))
                .map(|row| Value::Object(project(&row.data, &embed.columns)))
                .unwrap_or(Value::Null)
        }
        Relation::Children { via } => {
            let Some(id) = base.get("id").and_then(key_of) else {
                return Value::Array(Vec::new());
            };
            let children = state
                .rows(embed.table)
                .iter()
                .filter(|row| row.data.get(via).and_then(key_of).as_deref() == Some(id.as_str()))
                .map(|row| Value::Object(project(&row.data, &embed.columns)))
                .collect();
            Value::Array(children)
        }
    }
}

fn project(row: &Map<String, Value>, columns: &[&str]) -> Map<String, Value> {
    if columns.contains(&"*") {
        return row.clone();
    }
    columns
        .iter()
        .filter_map(|column| row.get(*column).map(|value| (column.to_string(), value.clone())))
        .collect()
}

/// Comparable key for id-like values.
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches_value(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual.and_then(key_of), key_of(expected)) {
        (Some(a), Some(b)) => a == b,
        (None, None) => true,
        _ => false,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => {
            match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

fn digest_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
