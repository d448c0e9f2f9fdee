//! Models and types related to the database.

use std::fmt::Debug;
use std::path::Path;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::{Sqlite, SqliteConnection};
use diesel::Connection as DieselConnection;

use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::{Error, Result};

pub mod attachment;
pub mod audit;
pub mod comment;
pub mod like;
pub mod report;
pub mod tag;
pub mod thread;
pub mod user;

pub use attachment::*;
pub use audit::*;
pub use comment::*;
pub use like::*;
pub use report::*;
pub use tag::*;
pub use thread::*;
pub use user::*;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// A page location.
#[derive(Clone, Copy, Debug)]
pub struct Page {
    /// The page number. Pages start at 1.
    pub num: u32,
    /// How many items can fit in a page.
    pub width: u32,
}

impl Page {
    /// The offset in items to the start of the page.
    ///
    /// The offset to page 1 is 0.
    pub fn offset(&self) -> u32 {
        self.num.saturating_sub(1) * self.width
    }
}

const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;";

/// Turns on the foreign-key and busy-timeout pragmas for every connection;
/// cascade deletes depend on the former.
#[derive(Clone, Copy, Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(CONNECTION_PRAGMAS)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(Error::DatabaseMigrationError)?;

    Ok(())
}

/// A handle on the database. Used for checking out connections.
pub struct Database {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Debug for Database {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        let state = self.pool.state();

        write!(
            fmt,
            "<#Database connections={} idle_connections={}>",
            state.connections, state.idle_connections,
        )?;

        Ok(())
    }
}

impl Database {
    /// Open the database at the given path, creating it and running any
    /// pending migrations if necessary.
    pub fn open<P>(path: P) -> Result<Database>
    where
        P: AsRef<Path>,
    {
        Database::open_sized(&path.as_ref().to_string_lossy(), 8)
    }

    /// Open a fresh in-memory database.
    ///
    /// The pool is restricted to a single connection because every sqlite
    /// `:memory:` connection is its own database.
    pub fn open_in_memory() -> Result<Database> {
        Database::open_sized(":memory:", 1)
    }

    fn open_sized(url: &str, max_size: u32) -> Result<Database> {
        let pool = Pool::builder()
            .max_size(max_size)
            .connection_customizer(Box::new(ConnectionOptions))
            .build(ConnectionManager::new(url))?;

        run_migrations(&mut *pool.get()?)?;

        Ok(Database { pool })
    }

    /// Check a connection out of the pool.
    pub fn connection(&self) -> Result<PooledDbConnection> {
        Ok(Connection {
            inner: self.pool.get()?,
        })
    }
}

/// Marker for the connection types our model operations accept.
pub trait InnerConnection:
    DieselConnection<Backend = Sqlite> + diesel::connection::LoadConnection
{
}

impl<C> InnerConnection for C where
    C: DieselConnection<Backend = Sqlite> + diesel::connection::LoadConnection
{
}

/// A connection to the database. All model operations are defined on this
/// type, in the module of the model they belong to.
pub struct Connection<C: InnerConnection = SqliteConnection> {
    pub(crate) inner: C,
}

/// A connection checked out of a `Database` pool.
pub type PooledDbConnection = Connection<PooledConnection<ConnectionManager<SqliteConnection>>>;

/// A standalone, unpooled connection.
pub type SingleConnection = Connection<SqliteConnection>;

impl SingleConnection {
    /// Connect to the database at the given path without a pool and run any
    /// pending migrations.
    pub fn establish<P>(path: P) -> Result<SingleConnection>
    where
        P: AsRef<Path>,
    {
        let mut inner = SqliteConnection::establish(&path.as_ref().to_string_lossy())?;
        inner.batch_execute(CONNECTION_PRAGMAS)?;
        run_migrations(&mut inner)?;

        Ok(Connection { inner })
    }
}

impl<C: InnerConnection> Connection<C> {
    /// Run `f` inside a database transaction, committing on `Ok` and rolling
    /// back on `Err`.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        use diesel::connection::TransactionManager;

        <C::TransactionManager as TransactionManager<C>>::begin_transaction(&mut self.inner)?;

        match f(self) {
            Ok(value) => {
                <C::TransactionManager as TransactionManager<C>>::commit_transaction(
                    &mut self.inner,
                )?;
                Ok(value)
            }
            Err(err) => {
                match <C::TransactionManager as TransactionManager<C>>::rollback_transaction(
                    &mut self.inner,
                ) {
                    Ok(()) => Err(err),
                    Err(rollback_err) => Err(rollback_err.into()),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;

    use super::{Connection, Database, InnerConnection};
    use crate::models::{NewThread, NewUser, Role, ThreadId, UserId};

    /// A fresh in-memory database.
    pub fn database() -> Database {
        Database::open_in_memory().expect("couldn't open in-memory database")
    }

    /// Insert a user. The password hash is a throwaway.
    pub fn user<C: InnerConnection>(conn: &mut Connection<C>, email: &str) -> UserId {
        let new_user = NewUser {
            name: "Test User".into(),
            email: email.into(),
            dept: "eng".into(),
            role: Role::User,
            password_hash: String::new(),
            created_at: Utc::now().naive_utc(),
        };

        conn.insert_user(&new_user).expect("couldn't insert user")
    }

    /// Insert a thread by `author`.
    pub fn thread<C: InnerConnection>(
        conn: &mut Connection<C>,
        author: UserId,
        title: &str,
    ) -> ThreadId {
        conn.insert_thread(NewThread::new(title.into(), "test thread body".into(), author))
            .expect("couldn't insert thread")
    }
}

#[cfg(test)]
mod tests {
    use super::Page;

    #[test]
    fn page_offsets() {
        assert_eq!(Page { num: 1, width: 10 }.offset(), 0);
        assert_eq!(Page { num: 3, width: 10 }.offset(), 20);
        assert_eq!(Page { num: 0, width: 10 }.offset(), 0);
    }
}
