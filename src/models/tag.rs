//! Types for tags and their links to threads.

use diesel::{delete, insert_or_ignore_into, prelude::*};

use serde::Serialize;

use crate::models::{Connection, InnerConnection, ThreadId};
use crate::schema::{tag, thread_tag};
use crate::Result;

/// A tag ID.
pub type TagId = i32;

/// A named label applicable to many threads.
///
/// Tags are created lazily the first time someone uses the name; official
/// (curated) tags are only ever marked so by hand.
#[derive(Debug, Queryable, Serialize)]
pub struct Tag {
    /// The ID of the tag.
    pub id: TagId,
    /// The unique, case-sensitive name of the tag.
    pub name: String,
    /// Whether this is a curated tag.
    pub is_official: bool,
}

/// A new tag to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = tag)]
pub struct NewTag {
    pub name: String,
    pub is_official: bool,
}

/// A link between one thread and one tag.
#[derive(Debug, Queryable, Serialize)]
pub struct ThreadTag {
    pub id: i32,
    pub thread: ThreadId,
    pub tag: TagId,
}

/// A new thread/tag link to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = thread_tag)]
pub struct NewThreadTag {
    pub thread: ThreadId,
    pub tag: TagId,
}

impl<C: InnerConnection> Connection<C> {
    /// Get a tag by exact name, creating it on first use.
    pub fn ensure_tag(&mut self, tag_name: &str) -> Result<Tag> {
        use crate::schema::tag::columns::name;
        use crate::schema::tag::dsl::tag;

        insert_or_ignore_into(tag)
            .values(&NewTag {
                name: tag_name.to_string(),
                is_official: false,
            })
            .execute(&mut self.inner)?;

        Ok(tag
            .filter(name.eq(tag_name))
            .limit(1)
            .first(&mut self.inner)?)
    }

    /// Link a tag to a thread, creating the tag on first use. Linking an
    /// already-linked tag is a no-op.
    pub fn link_tag(&mut self, thread_id: ThreadId, tag_name: &str) -> Result<()> {
        use crate::schema::thread_tag::dsl::thread_tag;

        let linked_tag = self.ensure_tag(tag_name)?;

        insert_or_ignore_into(thread_tag)
            .values(&NewThreadTag {
                thread: thread_id,
                tag: linked_tag.id,
            })
            .execute(&mut self.inner)?;

        Ok(())
    }

    /// Replace the set of tags linked to a thread.
    ///
    /// Names are trimmed and empty names are skipped.
    pub fn set_thread_tags(&mut self, thread_id: ThreadId, tag_names: &[String]) -> Result<()> {
        self.clear_thread_tags(thread_id)?;

        for tag_name in tag_names {
            let tag_name = tag_name.trim();

            if tag_name.is_empty() {
                continue;
            }

            self.link_tag(thread_id, tag_name)?;
        }

        Ok(())
    }

    /// Remove every tag link from a thread. The tags themselves stay.
    pub fn clear_thread_tags(&mut self, thread_id: ThreadId) -> Result<()> {
        use crate::schema::thread_tag::columns::thread;
        use crate::schema::thread_tag::dsl::thread_tag;

        delete(thread_tag.filter(thread.eq(thread_id))).execute(&mut self.inner)?;

        Ok(())
    }

    /// Get the tags linked to a thread.
    pub fn tags_for_thread(&mut self, thread_id: ThreadId) -> Result<Vec<Tag>> {
        use crate::schema::tag::columns::{id, is_official, name};
        use crate::schema::tag::dsl::tag;
        use crate::schema::thread_tag::columns::thread;
        use crate::schema::thread_tag::dsl::thread_tag;

        Ok(thread_tag
            .inner_join(tag)
            .filter(thread.eq(thread_id))
            .select((id, name, is_official))
            .order(id.asc())
            .load(&mut self.inner)?)
    }

    /// Get all tags, sorted by name.
    pub fn all_tags(&mut self) -> Result<Vec<Tag>> {
        use crate::schema::tag::columns::name;
        use crate::schema::tag::dsl::tag;

        Ok(tag.order(name.asc()).load(&mut self.inner)?)
    }
}
