//! Types for user reports of abusive content.

use std::str::FromStr;

use chrono::{NaiveDateTime, Utc};

use derive_more::Display;

use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use diesel::{insert_into, prelude::*, update};

use serde::Serialize;

use crate::models::{Connection, InnerConnection, UserId};
use crate::schema::report;
use crate::{Error, Result};

/// A report ID.
pub type ReportId = i32;

/// What kind of thing a report points at.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, AsExpression, FromSqlRow, Serialize)]
#[diesel(sql_type = Text)]
pub enum TargetType {
    #[display(fmt = "thread")]
    Thread,
    #[display(fmt = "comment")]
    Comment,
}

impl FromStr for TargetType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "thread" => Ok(TargetType::Thread),
            "comment" => Ok(TargetType::Comment),
            _ => Err(Error::UnknownTargetType {
                target_type: s.to_string(),
            }),
        }
    }
}

impl ToSql<Text, Sqlite> for TargetType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.to_string());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for TargetType {
    fn from_sql(value: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        text.parse::<TargetType>()
            .map_err(|err| err.to_string().into())
    }
}

/// The triage status of a report.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, AsExpression, FromSqlRow, Serialize)]
#[diesel(sql_type = Text)]
pub enum ReportStatus {
    #[display(fmt = "unhandled")]
    Unhandled,
    #[display(fmt = "in_progress")]
    InProgress,
    #[display(fmt = "done")]
    Done,
}

impl FromStr for ReportStatus {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "unhandled" => Ok(ReportStatus::Unhandled),
            "in_progress" => Ok(ReportStatus::InProgress),
            "done" => Ok(ReportStatus::Done),
            _ => Err(Error::UnknownStatus {
                status: s.to_string(),
            }),
        }
    }
}

impl ToSql<Text, Sqlite> for ReportStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.to_string());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for ReportStatus {
    fn from_sql(value: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        text.parse::<ReportStatus>()
            .map_err(|err| err.to_string().into())
    }
}

/// A report that a user made about a thread or comment.
#[derive(Debug, Queryable, Serialize)]
pub struct Report {
    /// The report ID.
    pub id: ReportId,
    /// What kind of thing was reported.
    pub target_type: TargetType,
    /// The ID of the reported thread or comment.
    pub target_id: i32,
    /// The reason the content should be removed.
    pub reason: String,
    /// The user that made the report.
    pub reporter: UserId,
    /// Where the report is in its triage lifecycle.
    pub status: ReportStatus,
    /// When the report was made.
    pub created_at: NaiveDateTime,
}

/// A new report to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = report)]
pub struct NewReport {
    pub target_type: TargetType,
    pub target_id: i32,
    pub reason: String,
    pub reporter: UserId,
    pub status: ReportStatus,
    pub created_at: NaiveDateTime,
}

impl NewReport {
    /// A new unhandled report by `reporter`, timestamped now.
    pub fn new(
        target_type: TargetType,
        target_id: i32,
        reason: String,
        reporter: UserId,
    ) -> NewReport {
        NewReport {
            target_type,
            target_id,
            reason,
            reporter,
            status: ReportStatus::Unhandled,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a report.
fn conv_report_error(report_id: ReportId) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e: diesel::result::Error| match e {
        diesel::result::Error::NotFound => Error::ReportNotFound { report_id },
        _ => Error::from(e),
    }
}

impl<C: InnerConnection> Connection<C> {
    /// Get a report.
    pub fn report(&mut self, report_id: ReportId) -> Result<Report> {
        use crate::schema::report::columns::id;
        use crate::schema::report::dsl::report;

        report
            .filter(id.eq(report_id))
            .limit(1)
            .first(&mut self.inner)
            .map_err(conv_report_error(report_id))
    }

    /// Insert a new report into the database.
    ///
    /// A reporter gets one report per target; a second submission surfaces
    /// as `AlreadyReported` off the unique constraint, whatever the first
    /// report's status.
    pub fn insert_report(&mut self, new_report: &NewReport) -> Result<ReportId> {
        use diesel::result::DatabaseErrorKind;

        use crate::schema::report::columns::id;
        use crate::schema::report::dsl::report;

        insert_into(report)
            .values(new_report)
            .returning(id)
            .get_result(&mut self.inner)
            .map_err(|err| match err {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    Error::AlreadyReported {
                        target_type: new_report.target_type,
                        target_id: new_report.target_id,
                    }
                }
                _ => Error::from(err),
            })
    }

    /// Move a report along its triage lifecycle.
    pub fn set_report_status(
        &mut self,
        report_id: ReportId,
        new_status: ReportStatus,
    ) -> Result<()> {
        use crate::schema::report::columns::{id, status};
        use crate::schema::report::dsl::report;

        update(report.filter(id.eq(report_id)))
            .set(status.eq(new_status))
            .execute(&mut self.inner)
            .map_err(conv_report_error(report_id))?;

        Ok(())
    }

    /// Get up to `limit` of the most recently created reports, newest first.
    pub fn recent_reports(&mut self, limit: u32) -> Result<Vec<Report>> {
        use crate::schema::report::columns::created_at;
        use crate::schema::report::dsl::report;

        Ok(report
            .order(created_at.desc())
            .limit(limit.into())
            .load(&mut self.inner)?)
    }

    /// Get the number of reports nobody has picked up yet.
    pub fn num_unhandled_reports(&mut self) -> Result<i64> {
        use crate::schema::report::columns::status;
        use crate::schema::report::dsl::report;

        Ok(report
            .filter(status.eq(ReportStatus::Unhandled))
            .count()
            .first(&mut self.inner)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing;

    #[test]
    fn one_report_per_reporter_and_target() -> Result<()> {
        let db = testing::database();
        let mut conn = db.connection()?;

        let author = testing::user(&mut conn, "author@example.com");
        let reporter = testing::user(&mut conn, "reporter@example.com");
        let bystander = testing::user(&mut conn, "bystander@example.com");
        let thread_id = testing::thread(&mut conn, author, "Spammy thread");

        let report_id = conn.insert_report(&NewReport::new(
            TargetType::Thread,
            thread_id,
            "spam".into(),
            reporter,
        ))?;
        assert_eq!(conn.report(report_id)?.status, ReportStatus::Unhandled);

        // A second report by the same reporter is rejected, even with a new
        // reason.
        match conn.insert_report(&NewReport::new(
            TargetType::Thread,
            thread_id,
            "really, spam".into(),
            reporter,
        )) {
            Err(Error::AlreadyReported { target_id, .. }) => assert_eq!(target_id, thread_id),
            other => panic!("expected AlreadyReported, got {:?}", other),
        }

        // A different reporter may still report the same target.
        conn.insert_report(&NewReport::new(
            TargetType::Thread,
            thread_id,
            "me too".into(),
            bystander,
        ))?;

        assert_eq!(conn.num_unhandled_reports()?, 2);

        Ok(())
    }

    #[test]
    fn reports_move_through_triage() -> Result<()> {
        let db = testing::database();
        let mut conn = db.connection()?;

        let author = testing::user(&mut conn, "author@example.com");
        let reporter = testing::user(&mut conn, "reporter@example.com");
        let thread_id = testing::thread(&mut conn, author, "Reported thread");

        let report_id = conn.insert_report(&NewReport::new(
            TargetType::Thread,
            thread_id,
            "spam".into(),
            reporter,
        ))?;

        conn.set_report_status(report_id, ReportStatus::Done)?;

        assert_eq!(conn.report(report_id)?.status, ReportStatus::Done);
        assert_eq!(conn.num_unhandled_reports()?, 0);

        Ok(())
    }

    #[test]
    fn recent_reports_come_newest_first() -> Result<()> {
        let db = testing::database();
        let mut conn = db.connection()?;

        let author = testing::user(&mut conn, "author@example.com");
        let thread_id = testing::thread(&mut conn, author, "Reported thread");

        for n in 0..4 {
            let reporter = testing::user(&mut conn, &format!("reporter{}@example.com", n));
            conn.insert_report(&NewReport::new(
                TargetType::Thread,
                thread_id,
                format!("reason {}", n),
                reporter,
            ))?;
        }

        let recent = conn.recent_reports(3)?;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].reason, "reason 3");
        assert!(recent[0].created_at >= recent[1].created_at);

        Ok(())
    }
}
