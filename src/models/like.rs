//! Types for per-user thread likes.

use chrono::{NaiveDateTime, Utc};

use diesel::{delete, insert_into, prelude::*, update};

use serde::Serialize;

use crate::models::thread::conv_thread_error;
use crate::models::{Connection, InnerConnection, ThreadId, UserId};
use crate::schema::thread_like;
use crate::Result;

/// A like ID.
pub type LikeId = i32;

/// A single user's endorsement of a single thread. At most one exists per
/// (thread, user) pair.
#[derive(Debug, Queryable, Serialize)]
pub struct Like {
    /// The ID of the like.
    pub id: LikeId,
    /// The liked thread.
    pub thread: ThreadId,
    /// The user who liked it.
    pub user: UserId,
    /// When the like was given.
    pub created_at: NaiveDateTime,
}

/// A new like to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = thread_like)]
pub struct NewLike {
    pub thread: ThreadId,
    pub user: UserId,
    pub created_at: NaiveDateTime,
}

/// The outcome of a like toggle.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct LikeState {
    /// Whether the user likes the thread now.
    pub liked: bool,
    /// The thread's like count after the toggle.
    pub like_count: i32,
}

impl<C: InnerConnection> Connection<C> {
    /// Toggle `user_id`'s like on a thread.
    ///
    /// The like row and the thread's `like_count` move together in one
    /// transaction, so the count always equals the number of like rows.
    pub fn toggle_like(&mut self, thread_id: ThreadId, user_id: UserId) -> Result<LikeState> {
        self.transaction(|conn| {
            use crate::schema::thread::columns as thread_columns;
            use crate::schema::thread::dsl::thread;
            use crate::schema::thread_like::columns as like_columns;
            use crate::schema::thread_like::dsl::thread_like;

            // Fetching the count up front doubles as the existence check.
            let like_count: i32 = thread
                .filter(thread_columns::id.eq(thread_id))
                .select(thread_columns::like_count)
                .limit(1)
                .first(&mut conn.inner)
                .map_err(conv_thread_error(thread_id))?;

            let existing: Option<LikeId> = thread_like
                .filter(like_columns::thread.eq(thread_id))
                .filter(like_columns::user.eq(user_id))
                .select(like_columns::id)
                .limit(1)
                .first(&mut conn.inner)
                .optional()?;

            let state = match existing {
                Some(like_id) => {
                    delete(thread_like.filter(like_columns::id.eq(like_id)))
                        .execute(&mut conn.inner)?;

                    update(thread.filter(thread_columns::id.eq(thread_id)))
                        .set(thread_columns::like_count.eq(thread_columns::like_count - 1))
                        .execute(&mut conn.inner)?;

                    LikeState {
                        liked: false,
                        like_count: like_count - 1,
                    }
                }
                None => {
                    insert_into(thread_like)
                        .values(&NewLike {
                            thread: thread_id,
                            user: user_id,
                            created_at: Utc::now().naive_utc(),
                        })
                        .execute(&mut conn.inner)?;

                    update(thread.filter(thread_columns::id.eq(thread_id)))
                        .set(thread_columns::like_count.eq(thread_columns::like_count + 1))
                        .execute(&mut conn.inner)?;

                    LikeState {
                        liked: true,
                        like_count: like_count + 1,
                    }
                }
            };

            Ok(state)
        })
    }

    /// The number of like rows for a thread.
    pub fn thread_like_count(&mut self, thread_id: ThreadId) -> Result<i64> {
        use crate::schema::thread_like::columns::thread;
        use crate::schema::thread_like::dsl::thread_like;

        Ok(thread_like
            .filter(thread.eq(thread_id))
            .count()
            .first(&mut self.inner)?)
    }
}
