//! Types for files attached to threads.

use chrono::{NaiveDateTime, Utc};

use diesel::{insert_into, prelude::*};

use serde::Serialize;

use crate::models::{Connection, InnerConnection, ThreadId};
use crate::schema::attachment;
use crate::{Error, Result};

/// An attachment ID.
pub type AttachmentId = i32;

/// A user-uploaded file attached to a thread.
#[derive(Debug, Queryable, Serialize)]
pub struct Attachment {
    /// The ID of the attachment.
    pub id: AttachmentId,
    /// The thread the file is attached to.
    pub thread: ThreadId,
    /// The generated name the blob is saved under.
    pub save_name: String,
    /// The name the file had on the uploader's machine.
    pub original_filename: String,
    /// The content-type of the file, if known.
    pub content_type: Option<String>,
    /// The size of the file in bytes.
    pub file_size: i64,
    /// When the file was uploaded.
    pub created_at: NaiveDateTime,
}

/// A new attachment to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = attachment)]
pub struct NewAttachment {
    pub thread: ThreadId,
    pub save_name: String,
    pub original_filename: String,
    pub content_type: Option<String>,
    pub file_size: i64,
    pub created_at: NaiveDateTime,
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for an attachment.
fn conv_attachment_error(
    attachment_id: AttachmentId,
) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e: diesel::result::Error| match e {
        diesel::result::Error::NotFound => Error::AttachmentNotFound { attachment_id },
        _ => Error::from(e),
    }
}

impl<C: InnerConnection> Connection<C> {
    /// Get an attachment.
    pub fn attachment(&mut self, attachment_id: AttachmentId) -> Result<Attachment> {
        use crate::schema::attachment::columns::id;
        use crate::schema::attachment::dsl::attachment;

        attachment
            .filter(id.eq(attachment_id))
            .limit(1)
            .first(&mut self.inner)
            .map_err(conv_attachment_error(attachment_id))
    }

    /// Insert a new attachment into the database.
    pub fn insert_attachment(&mut self, new_attachment: &NewAttachment) -> Result<AttachmentId> {
        use crate::schema::attachment::columns::id;
        use crate::schema::attachment::dsl::attachment;

        Ok(insert_into(attachment)
            .values(new_attachment)
            .returning(id)
            .get_result(&mut self.inner)?)
    }

    /// Get all of the attachments on a thread, oldest first.
    pub fn attachments_in_thread(&mut self, thread_id: ThreadId) -> Result<Vec<Attachment>> {
        use crate::schema::attachment::columns::{id, thread};
        use crate::schema::attachment::dsl::attachment;

        Ok(attachment
            .filter(thread.eq(thread_id))
            .order(id.asc())
            .load(&mut self.inner)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing;

    #[test]
    fn records_attachments() -> Result<()> {
        let db = testing::database();
        let mut conn = db.connection()?;

        let author = testing::user(&mut conn, "author@example.com");
        let thread_id = testing::thread(&mut conn, author, "With a file");

        let attachment_id = conn.insert_attachment(&NewAttachment {
            thread: thread_id,
            save_name: "1718700000-deadbeef.txt".into(),
            original_filename: "notes.txt".into(),
            content_type: Some("text/plain".into()),
            file_size: 5,
            created_at: Utc::now().naive_utc(),
        })?;

        let attachment = conn.attachment(attachment_id)?;
        assert_eq!(attachment.original_filename, "notes.txt");
        assert_eq!(attachment.file_size, 5);

        assert_eq!(conn.attachments_in_thread(thread_id)?.len(), 1);

        match conn.attachment(attachment_id + 1) {
            Err(Error::AttachmentNotFound { .. }) => {}
            other => panic!("expected AttachmentNotFound, got {:?}", other),
        }

        Ok(())
    }
}
