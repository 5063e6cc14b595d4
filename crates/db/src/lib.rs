//! SurrealDB client handle for bookshelf.
//!
//! [`Database`] is the connection handed to modules at startup. The engine is
//! chosen by the endpoint scheme: `ws://` or `wss://` for a running server,
//! `surrealkv://<path>` for an embedded on-disk store, and `mem://` for an
//! ephemeral one. The handle also tracks connection state for health
//! reporting and applies the indexes modules declare.

mod error;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

pub use error::{DbError, DbResult};

/// Live state of the store connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// Secondary index declared by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub collection: &'static str,
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub unique: bool,
}

impl IndexDef {
    fn define_statement(&self) -> String {
        format!(
            "DEFINE INDEX IF NOT EXISTS {} ON TABLE {} FIELDS {}{}",
            self.name,
            self.collection,
            self.fields.join(", "),
            if self.unique { " UNIQUE" } else { "" }
        )
    }
}

/// Root credentials for servers that require a sign-in.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TableInfo {
    #[serde(default)]
    indexes: BTreeMap<String, String>,
}

struct Inner {
    client: Surreal<Any>,
    endpoint: String,
    namespace: String,
    name: String,
    connected: AtomicBool,
}

/// Cloneable handle to a connected database.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    /// Connect to `endpoint` and select `namespace`/`name`.
    pub async fn connect(
        endpoint: &str,
        namespace: &str,
        name: &str,
        credentials: Option<Credentials<'_>>,
    ) -> DbResult<Self> {
        let client = any::connect(endpoint)
            .await
            .map_err(|source| DbError::Connect {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if let Some(credentials) = credentials {
            client
                .signin(Root {
                    username: credentials.username,
                    password: credentials.password,
                })
                .await?;
        }

        client.use_ns(namespace).use_db(name).await?;

        tracing::info!(
            target: "bookshelf-db",
            endpoint = %endpoint,
            namespace = %namespace,
            database = %name,
            "database connected"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                endpoint: endpoint.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
                connected: AtomicBool::new(true),
            }),
        })
    }

    /// Ephemeral embedded database, one per call.
    pub async fn in_memory() -> DbResult<Self> {
        Self::connect("mem://", "bookshelf", "test", None).await
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        if self.inner.connected.load(Ordering::Acquire) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// The underlying client, or `Disconnected` once [`close`](Self::close) ran.
    pub fn client(&self) -> DbResult<&Surreal<Any>> {
        if self.inner.connected.load(Ordering::Acquire) {
            Ok(&self.inner.client)
        } else {
            Err(DbError::Disconnected {
                database: self.inner.name.clone(),
            })
        }
    }

    /// Define an index. Re-declaring an existing index is a no-op.
    pub async fn ensure_index(&self, index: &IndexDef) -> DbResult<()> {
        self.client()?
            .query(index.define_statement())
            .await?
            .check()?;

        tracing::info!(
            target: "bookshelf-db",
            collection = index.collection,
            index = index.name,
            fields = ?index.fields,
            unique = index.unique,
            "index ensured"
        );
        Ok(())
    }

    /// Names of the indexes defined on `collection`.
    pub async fn indexes(&self, collection: &str) -> DbResult<Vec<String>> {
        let mut response = self
            .client()?
            .query(format!("INFO FOR TABLE {collection}"))
            .await?
            .check()?;
        let info: Option<TableInfo> = response.take(0)?;
        Ok(info
            .map(|info| info.indexes.into_keys().collect())
            .unwrap_or_default())
    }

    /// Mark the connection closed. Later operations fail with `Disconnected`.
    pub fn close(&self) {
        if self.inner.connected.swap(false, Ordering::AcqRel) {
            tracing::info!(target: "bookshelf-db", database = %self.inner.name, "database connection closed");
        }
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("endpoint", &self.inner.endpoint)
            .field("namespace", &self.inner.namespace)
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title_index() -> IndexDef {
        IndexDef {
            collection: "notes",
            name: "notes_title",
            fields: &["title"],
            unique: false,
        }
    }

    #[test]
    fn index_definition_names_every_field() {
        let index = IndexDef {
            collection: "books",
            name: "books_title_author",
            fields: &["title", "author"],
            unique: true,
        };
        assert_eq!(
            index.define_statement(),
            "DEFINE INDEX IF NOT EXISTS books_title_author ON TABLE books FIELDS title, author UNIQUE"
        );
    }

    #[tokio::test]
    async fn connect_rejects_unknown_scheme() {
        let err = Database::connect("gopher://localhost", "bookshelf", "bookapp", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Connect { .. }));
    }

    #[tokio::test]
    async fn close_flips_state_and_blocks_queries() {
        let db = Database::in_memory().await.unwrap();
        assert_eq!(db.state(), ConnectionState::Connected);
        assert_eq!(db.endpoint(), "mem://");

        db.close();
        assert_eq!(db.state(), ConnectionState::Disconnected);
        assert_eq!(db.state().to_string(), "Disconnected");
        assert!(matches!(db.client(), Err(DbError::Disconnected { .. })));
        assert!(db.ensure_index(&title_index()).await.is_err());
    }

    #[tokio::test]
    async fn ensure_index_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        db.ensure_index(&title_index()).await.unwrap();
        db.ensure_index(&title_index()).await.unwrap();
        assert_eq!(db.indexes("notes").await.unwrap(), vec!["notes_title"]);
    }

    #[tokio::test]
    async fn in_memory_databases_are_isolated() {
        let first = Database::in_memory().await.unwrap();
        let second = Database::in_memory().await.unwrap();
        first.ensure_index(&title_index()).await.unwrap();

        second
            .client()
            .unwrap()
            .query("DEFINE TABLE notes")
            .await
            .unwrap()
            .check()
            .unwrap();
        assert!(second.indexes("notes").await.unwrap().is_empty());
    }
}
