//! Types related to discussion threads.

use std::str::FromStr;

use chrono::{NaiveDateTime, Utc};

use derive_more::Display;

use diesel::backend::Backend;
use diesel::define_sql_function;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::{Integer, Text};
use diesel::sqlite::Sqlite;
use diesel::{delete, insert_into, prelude::*, update};

use serde::Serialize;

use crate::models::{Connection, InnerConnection, Page, UserId};
use crate::schema::thread;
use crate::{Error, Result};

/// A thread ID.
pub type ThreadId = i32;

/// The triage status of a thread.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, AsExpression, FromSqlRow, Serialize)]
#[diesel(sql_type = Text)]
pub enum ThreadStatus {
    #[display(fmt = "unconfirmed")]
    Unconfirmed,
    #[display(fmt = "under_review")]
    UnderReview,
    #[display(fmt = "in_progress")]
    InProgress,
    #[display(fmt = "done")]
    Done,
}

impl FromStr for ThreadStatus {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "unconfirmed" => Ok(ThreadStatus::Unconfirmed),
            "under_review" => Ok(ThreadStatus::UnderReview),
            "in_progress" => Ok(ThreadStatus::InProgress),
            "done" => Ok(ThreadStatus::Done),
            _ => Err(Error::UnknownStatus {
                status: s.to_string(),
            }),
        }
    }
}

impl ToSql<Text, Sqlite> for ThreadStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.to_string());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for ThreadStatus {
    fn from_sql(value: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        text.parse::<ThreadStatus>()
            .map_err(|err| err.to_string().into())
    }
}

/// A top-level discussion post with a lifecycle status.
#[derive(Debug, Queryable, Serialize)]
pub struct Thread {
    /// The ID of the thread.
    pub id: ThreadId,
    /// The title of the thread.
    pub title: String,
    /// The contents of the opening post.
    pub body: String,
    /// The user that opened the thread.
    pub author: UserId,
    /// Where the thread is in its triage lifecycle.
    pub status: ThreadStatus,
    /// How many users have liked the thread. Always equal to the number of
    /// like rows pointing at it.
    pub like_count: i32,
    /// When the thread was created.
    pub created_at: NaiveDateTime,
    /// When the thread was last edited.
    pub updated_at: NaiveDateTime,
}

/// A new thread to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = thread)]
pub struct NewThread {
    pub title: String,
    pub body: String,
    pub author: UserId,
    pub status: ThreadStatus,
    pub like_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewThread {
    /// A new unconfirmed thread by `author`, timestamped now.
    pub fn new(title: String, body: String, author: UserId) -> NewThread {
        let now = Utc::now().naive_utc();

        NewThread {
            title,
            body,
            author,
            status: ThreadStatus::Unconfirmed,
            like_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// How a thread listing is ordered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Most recently created first.
    #[default]
    Newest,
    /// Most liked first, most recently created breaking ties.
    Popular,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "new" | "newest" => Ok(SortKey::Newest),
            "popular" => Ok(SortKey::Popular),
            _ => Err(Error::UnknownSortKey { key: s.to_string() }),
        }
    }
}

/// Filters and ordering for a thread listing.
#[derive(Clone, Debug, Default)]
pub struct ThreadQuery {
    /// Keep only threads whose title or body contains this text.
    pub search: Option<String>,
    /// Keep only threads with this status.
    pub status: Option<ThreadStatus>,
    pub sort: SortKey,
}

define_sql_function! {
    /// The sqlite `instr` function. `LIKE` is case-insensitive for ASCII, so
    /// substring search goes through this instead.
    fn instr(haystack: Text, needle: Text) -> Integer;
}

/// Apply `query`'s search and status filters.
fn filtered_threads(query: &ThreadQuery) -> thread::BoxedQuery<'_, Sqlite> {
    use crate::schema::thread::columns::{body, status, title};
    use crate::schema::thread::dsl::thread;

    let mut threads = thread.into_boxed();

    if let Some(text) = query.search.as_deref() {
        threads = threads.filter(instr(title, text).gt(0).or(instr(body, text).gt(0)));
    }

    if let Some(wanted) = query.status {
        threads = threads.filter(status.eq(wanted));
    }

    threads
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a thread.
pub(crate) fn conv_thread_error(
    thread_id: ThreadId,
) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e: diesel::result::Error| match e {
        diesel::result::Error::NotFound => Error::ThreadNotFound { thread_id },
        _ => Error::from(e),
    }
}

impl<C: InnerConnection> Connection<C> {
    /// Get a thread.
    pub fn thread(&mut self, thread_id: ThreadId) -> Result<Thread> {
        use crate::schema::thread::columns::id;
        use crate::schema::thread::dsl::thread;

        thread
            .filter(id.eq(thread_id))
            .limit(1)
            .first(&mut self.inner)
            .map_err(conv_thread_error(thread_id))
    }

    /// Insert a new thread into the database.
    pub fn insert_thread(&mut self, new_thread: NewThread) -> Result<ThreadId> {
        use crate::schema::thread::columns::id;
        use crate::schema::thread::dsl::thread;

        Ok(insert_into(thread)
            .values(&new_thread)
            .returning(id)
            .get_result(&mut self.inner)?)
    }

    /// Replace a thread's title and body and bump its update time.
    pub fn update_thread(
        &mut self,
        thread_id: ThreadId,
        new_title: &str,
        new_body: &str,
    ) -> Result<()> {
        use crate::schema::thread::columns::{body, id, title, updated_at};
        use crate::schema::thread::dsl::thread;

        update(thread.filter(id.eq(thread_id)))
            .set((
                title.eq(new_title),
                body.eq(new_body),
                updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut self.inner)
            .map_err(conv_thread_error(thread_id))?;

        Ok(())
    }

    /// Move a thread along its triage lifecycle.
    pub fn set_thread_status(
        &mut self,
        thread_id: ThreadId,
        new_status: ThreadStatus,
    ) -> Result<()> {
        use crate::schema::thread::columns::{id, status};
        use crate::schema::thread::dsl::thread;

        update(thread.filter(id.eq(thread_id)))
            .set(status.eq(new_status))
            .execute(&mut self.inner)
            .map_err(conv_thread_error(thread_id))?;

        Ok(())
    }

    /// Delete a thread.
    ///
    /// Comments, attachment rows, tag links, and likes go with it through the
    /// schema's cascading foreign keys.
    pub fn delete_thread(&mut self, thread_id: ThreadId) -> Result<()> {
        use crate::schema::thread::columns::id;
        use crate::schema::thread::dsl::thread;

        delete(thread.filter(id.eq(thread_id))).execute(&mut self.inner)?;

        Ok(())
    }

    /// Get a single page of threads matching `query`.
    pub fn thread_page(&mut self, query: &ThreadQuery, page: Page) -> Result<Vec<Thread>> {
        use crate::schema::thread::columns::{created_at, like_count};

        let threads = match query.sort {
            SortKey::Newest => filtered_threads(query).order(created_at.desc()),
            SortKey::Popular => {
                filtered_threads(query).order((like_count.desc(), created_at.desc()))
            }
        };

        Ok(threads
            .limit(page.width as i64)
            .offset(page.offset() as i64)
            .load(&mut self.inner)?)
    }

    /// How many pages of threads match `query`.
    pub fn thread_page_count(&mut self, query: &ThreadQuery, page_width: u32) -> Result<u32> {
        let thread_count: i64 = filtered_threads(query).count().first(&mut self.inner)?;

        Ok((thread_count as f64 / page_width as f64).ceil() as u32)
    }

    /// Get the number of threads in the database.
    pub fn num_threads(&mut self) -> Result<i64> {
        use crate::schema::thread::dsl::thread;

        Ok(thread.count().first(&mut self.inner)?)
    }
}
