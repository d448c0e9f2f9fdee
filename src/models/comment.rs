//! Types related to comments on a thread.

use chrono::{NaiveDateTime, Utc};

use diesel::{delete, insert_into, prelude::*};

use serde::Serialize;

use crate::models::{Connection, InnerConnection, ThreadId, UserId};
use crate::schema::comment;
use crate::{Error, Result};

/// A comment ID.
pub type CommentId = i32;

/// A reply attached to exactly one thread.
#[derive(Debug, Queryable, Serialize)]
pub struct Comment {
    /// The ID of the comment.
    pub id: CommentId,
    /// The thread this comment replies to.
    pub thread: ThreadId,
    /// The contents of the comment.
    pub body: String,
    /// The user that wrote the comment.
    pub author: UserId,
    /// When the comment was created.
    pub created_at: NaiveDateTime,
}

/// A new comment to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = comment)]
pub struct NewComment {
    pub thread: ThreadId,
    pub body: String,
    pub author: UserId,
    pub created_at: NaiveDateTime,
}

impl NewComment {
    /// A new comment on `thread` by `author`, timestamped now.
    pub fn new(thread: ThreadId, body: String, author: UserId) -> NewComment {
        NewComment {
            thread,
            body,
            author,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a comment.
fn conv_comment_error(comment_id: CommentId) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e: diesel::result::Error| match e {
        diesel::result::Error::NotFound => Error::CommentNotFound { comment_id },
        _ => Error::from(e),
    }
}

impl<C: InnerConnection> Connection<C> {
    /// Get a comment.
    pub fn comment(&mut self, comment_id: CommentId) -> Result<Comment> {
        use crate::schema::comment::columns::id;
        use crate::schema::comment::dsl::comment;

        comment
            .filter(id.eq(comment_id))
            .limit(1)
            .first(&mut self.inner)
            .map_err(conv_comment_error(comment_id))
    }

    /// Insert a new comment into the database.
    pub fn insert_comment(&mut self, new_comment: &NewComment) -> Result<CommentId> {
        use crate::schema::comment::columns::id;
        use crate::schema::comment::dsl::comment;

        Ok(insert_into(comment)
            .values(new_comment)
            .returning(id)
            .get_result(&mut self.inner)?)
    }

    /// Delete a comment.
    pub fn delete_comment(&mut self, comment_id: CommentId) -> Result<()> {
        use crate::schema::comment::columns::id;
        use crate::schema::comment::dsl::comment;

        delete(comment.filter(id.eq(comment_id))).execute(&mut self.inner)?;

        Ok(())
    }

    /// Get all of the comments on a thread, oldest first.
    pub fn comments_in_thread(&mut self, thread_id: ThreadId) -> Result<Vec<Comment>> {
        use crate::schema::comment::columns::{id, thread};
        use crate::schema::comment::dsl::comment;

        Ok(comment
            .filter(thread.eq(thread_id))
            .order(id.asc())
            .load(&mut self.inner)?)
    }

    /// Get the number of comments on a thread.
    pub fn thread_comment_count(&mut self, thread_id: ThreadId) -> Result<u32> {
        use crate::schema::comment::columns::thread;
        use crate::schema::comment::dsl::comment;

        let count: i64 = comment
            .filter(thread.eq(thread_id))
            .count()
            .first(&mut self.inner)?;

        Ok(count.try_into().expect("couldn't convert i64 to u32"))
    }

    /// Get the number of comments in the database.
    pub fn num_comments(&mut self) -> Result<i64> {
        use crate::schema::comment::dsl::comment;

        Ok(comment.count().first(&mut self.inner)?)
    }
}
