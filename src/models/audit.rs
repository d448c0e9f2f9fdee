//! The append-only audit log.
//!
//! Entries are only ever inserted. Nothing in the crate updates or deletes
//! them.

use chrono::{NaiveDateTime, Utc};

use diesel::{insert_into, prelude::*};

use serde::Serialize;

use crate::models::{Connection, InnerConnection, UserId};
use crate::schema::audit_log;
use crate::Result;

/// An audit log entry ID.
pub type AuditLogId = i32;

/// A recorded action by a user.
#[derive(Debug, Queryable, Serialize)]
pub struct AuditLogEntry {
    /// The entry's ID in the database.
    pub id: AuditLogId,
    /// The user who performed the action.
    pub actor: UserId,
    /// A short dotted name for the action, like `thread.delete`.
    pub action: String,
    /// What kind of thing was acted on, if any.
    pub target_type: Option<String>,
    /// The ID of the thing acted on, if any.
    pub target_id: Option<i32>,
    /// A JSON payload with action-specific details.
    pub details: Option<String>,
    /// When the action was done.
    pub created_at: NaiveDateTime,
}

/// A new audit log entry to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = audit_log)]
pub struct NewAuditLogEntry {
    pub actor: UserId,
    pub action: String,
    pub target_type: Option<String>,
    pub target_id: Option<i32>,
    pub details: Option<String>,
    pub created_at: NaiveDateTime,
}

impl NewAuditLogEntry {
    /// An entry for `actor` doing `action` to the given target.
    pub fn new(
        actor: UserId,
        action: &str,
        target_type: Option<&str>,
        target_id: Option<i32>,
        details: Option<serde_json::Value>,
    ) -> NewAuditLogEntry {
        NewAuditLogEntry {
            actor,
            action: action.to_string(),
            target_type: target_type.map(str::to_string),
            target_id,
            details: details.map(|details| details.to_string()),
            created_at: Utc::now().naive_utc(),
        }
    }
}

impl<C: InnerConnection> Connection<C> {
    /// Record an action in the audit log.
    pub fn insert_audit(&mut self, new_entry: &NewAuditLogEntry) -> Result<()> {
        use crate::schema::audit_log::dsl::audit_log;

        insert_into(audit_log)
            .values(new_entry)
            .execute(&mut self.inner)?;

        Ok(())
    }

    /// Get up to `limit` of the most recent audit entries, newest first.
    pub fn recent_audit_entries(&mut self, limit: u32) -> Result<Vec<AuditLogEntry>> {
        use crate::schema::audit_log::columns::id;
        use crate::schema::audit_log::dsl::audit_log;

        Ok(audit_log
            .order(id.desc())
            .limit(limit.into())
            .load(&mut self.inner)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::testing;
    use crate::Result;

    #[test]
    fn entries_append_in_order() -> Result<()> {
        let db = testing::database();
        let mut conn = db.connection()?;

        let actor = testing::user(&mut conn, "mod@example.com");

        conn.insert_audit(&NewAuditLogEntry::new(
            actor,
            "thread.delete",
            Some("thread"),
            Some(7),
            Some(json!({ "title": "gone" })),
        ))?;
        conn.insert_audit(&NewAuditLogEntry::new(actor, "user.role", None, None, None))?;

        let entries = conn.recent_audit_entries(10)?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "user.role");
        assert_eq!(entries[1].action, "thread.delete");
        assert_eq!(entries[1].target_id, Some(7));
        assert!(entries[1].details.as_deref().unwrap().contains("gone"));

        Ok(())
    }
}
