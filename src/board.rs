//! The board itself: every domain operation, behind one object.

use std::path::PathBuf;

use chrono::Utc;

use log::{info, warn};

use mime::Mime;

use serde::Serialize;

use serde_json::json;

use crate::config::Config;
use crate::files::FileStore;
use crate::models::{
    Attachment, AttachmentId, Comment, CommentId, Database, LikeState, NewAttachment, NewAuditLogEntry,
    NewComment, NewReport, NewThread, NewUser, Page, Report, ReportId, ReportStatus, Role, Tag,
    TargetType, Thread, ThreadId, ThreadQuery, ThreadStatus, User, UserId,
};
use crate::{Error, Result};

/// An open board: a database plus an attachment store.
///
/// One of these is constructed at startup and handed to whatever serves
/// requests; nothing in here is process-global.
#[derive(Debug)]
pub struct Board {
    db: Database,
    files: FileStore,
}

/// An uploaded file, as the transport layer hands it over.
#[derive(Clone, Debug)]
pub struct Upload {
    /// The filename on the uploader's machine.
    pub name: String,
    /// The content type the uploader claimed, if any.
    pub content_type: Option<Mime>,
    pub data: Vec<u8>,
}

/// Everything needed to open a new thread.
#[derive(Clone, Debug, Default)]
pub struct ThreadForm {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub uploads: Vec<Upload>,
}

/// Replacement content for an existing thread.
#[derive(Clone, Debug)]
pub struct ThreadEdit {
    pub title: String,
    pub body: String,
    /// The full new tag set; existing links not in here are removed.
    pub tags: Vec<String>,
}

/// A thread with everything its detail page shows.
#[derive(Debug, Serialize)]
pub struct ThreadDetail {
    pub thread: Thread,
    pub author: User,
    pub comments: Vec<Comment>,
    pub tags: Vec<Tag>,
    pub attachments: Vec<Attachment>,
}

/// One page of a thread listing.
#[derive(Debug, Serialize)]
pub struct ThreadListing {
    pub threads: Vec<Thread>,
    /// How many pages the query has in total.
    pub page_count: u32,
}

/// The numbers and recent reports the admin panel shows.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub total_threads: i64,
    pub total_comments: i64,
    pub total_users: i64,
    pub unhandled_reports: i64,
    pub recent_reports: Vec<Report>,
}

/// Authors can touch their own things; elevated roles can touch anything.
fn check_owner_or_elevated(actor: &User, owner: UserId, action: &str) -> Result<()> {
    if actor.id == owner || actor.is_elevated() {
        return Ok(());
    }

    warn!("user {} may not {}", actor.id, action);

    Err(Error::PermissionDenied {
        action: action.to_string(),
    })
}

fn check_elevated(actor: &User, action: &str) -> Result<()> {
    if actor.is_elevated() {
        return Ok(());
    }

    warn!("user {} may not {}", actor.id, action);

    Err(Error::PermissionDenied {
        action: action.to_string(),
    })
}

fn check_present(value: &str, param: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::MissingParam {
            param: param.to_string(),
        });
    }

    Ok(())
}

impl Board {
    /// Open the board described by `config`.
    pub fn open(config: &Config) -> Result<Board> {
        Ok(Board {
            db: Database::open(&config.database_path)?,
            files: FileStore::open(&config.upload_dir)?,
        })
    }

    /// Assemble a board from already-opened parts.
    pub fn new(db: Database, files: FileStore) -> Board {
        Board { db, files }
    }

    /// The underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The underlying attachment store.
    pub fn files(&self) -> &FileStore {
        &self.files
    }

    /// Register a new user with the default role.
    pub fn register_user(&self, name: &str, email: &str, dept: &str, password: &str) -> Result<UserId> {
        check_present(name, "name")?;
        check_present(email, "email")?;
        check_present(password, "password")?;

        let new_user = NewUser::new(name, email, dept, Role::User, password)?;
        let user_id = self.db.connection()?.insert_user(&new_user)?;

        info!("registered user {} <{}>", user_id, new_user.email);

        Ok(user_id)
    }

    /// Resolve credentials to a user.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let mut conn = self.db.connection()?;

        let user = match conn.user_by_email(email)? {
            Some(user) => user,
            None => {
                warn!("login failed for unknown e-mail {}", email);
                return Err(Error::InvalidCredentials);
            }
        };

        if !user.verify_password(password)? {
            warn!("login failed for user {}", user.id);
            return Err(Error::InvalidCredentials);
        }

        Ok(user)
    }

    /// Change a user's role. Elevated roles only.
    pub fn set_user_role(&self, actor_id: UserId, user_id: UserId, new_role: Role) -> Result<()> {
        let mut conn = self.db.connection()?;

        let actor = conn.user(actor_id)?;
        check_elevated(&actor, "change user roles")?;
        conn.user(user_id)?;

        conn.transaction(|conn| {
            conn.set_user_role(user_id, new_role)?;
            conn.insert_audit(&NewAuditLogEntry::new(
                actor_id,
                "user.role",
                Some("user"),
                Some(user_id),
                Some(json!({ "role": new_role.to_string() })),
            ))?;

            Ok(())
        })?;

        info!("user {} set role of user {} to {}", actor_id, user_id, new_role);

        Ok(())
    }

    /// Open a new thread, with tags and attachments, and return its ID.
    pub fn create_thread(&self, author_id: UserId, form: ThreadForm) -> Result<ThreadId> {
        let ThreadForm {
            title,
            body,
            tags,
            uploads,
        } = form;

        check_present(&title, "title")?;
        check_present(&body, "body")?;

        let mut conn = self.db.connection()?;
        conn.user(author_id)?;

        // Blobs land on disk before the transaction opens; if anything below
        // fails they are removed again, so no row ever points at a missing
        // blob and no committed thread is missing its attachments.
        let mut stored: Vec<(String, Upload)> = Vec::new();
        for upload in uploads {
            if upload.name.is_empty() || upload.data.is_empty() {
                continue;
            }

            match self.files.store(&upload.data, &upload.name) {
                Ok(save_name) => stored.push((save_name, upload)),
                Err(err) => {
                    self.discard_blobs(&stored);
                    return Err(err);
                }
            }
        }

        let inserted = conn.transaction(|conn| {
            let thread_id = conn.insert_thread(NewThread::new(title, body, author_id))?;

            conn.set_thread_tags(thread_id, &tags)?;

            for (save_name, upload) in &stored {
                let content_type = upload
                    .content_type
                    .clone()
                    .or_else(|| mime_guess::from_path(&upload.name).first())
                    .map(|mime| mime.to_string());

                conn.insert_attachment(&NewAttachment {
                    thread: thread_id,
                    save_name: save_name.clone(),
                    original_filename: upload.name.clone(),
                    content_type,
                    file_size: upload.data.len() as i64,
                    created_at: Utc::now().naive_utc(),
                })?;
            }

            Ok(thread_id)
        });

        let thread_id = match inserted {
            Ok(thread_id) => thread_id,
            Err(err) => {
                self.discard_blobs(&stored);
                return Err(err);
            }
        };

        info!("user {} created thread {}", author_id, thread_id);

        Ok(thread_id)
    }

    /// Replace a thread's title, body, and tag set. Author or elevated only.
    pub fn edit_thread(&self, actor_id: UserId, thread_id: ThreadId, edit: ThreadEdit) -> Result<()> {
        check_present(&edit.title, "title")?;
        check_present(&edit.body, "body")?;

        let mut conn = self.db.connection()?;

        let actor = conn.user(actor_id)?;
        let thread = conn.thread(thread_id)?;
        check_owner_or_elevated(&actor, thread.author, "edit this thread")?;

        conn.transaction(|conn| {
            conn.update_thread(thread_id, &edit.title, &edit.body)?;
            conn.set_thread_tags(thread_id, &edit.tags)?;
            conn.insert_audit(&NewAuditLogEntry::new(
                actor_id,
                "thread.edit",
                Some("thread"),
                Some(thread_id),
                Some(json!({ "title": edit.title })),
            ))?;

            Ok(())
        })?;

        info!("user {} edited thread {}", actor_id, thread_id);

        Ok(())
    }

    /// Delete a thread and everything attached to it. Author or elevated
    /// only.
    pub fn delete_thread(&self, actor_id: UserId, thread_id: ThreadId) -> Result<()> {
        let mut conn = self.db.connection()?;

        let actor = conn.user(actor_id)?;
        let thread = conn.thread(thread_id)?;
        check_owner_or_elevated(&actor, thread.author, "delete this thread")?;

        let attachments = conn.attachments_in_thread(thread_id)?;

        conn.transaction(|conn| {
            conn.delete_thread(thread_id)?;
            conn.insert_audit(&NewAuditLogEntry::new(
                actor_id,
                "thread.delete",
                Some("thread"),
                Some(thread_id),
                Some(json!({ "title": thread.title })),
            ))?;

            Ok(())
        })?;

        // The rows are gone; now the blobs.
        for attachment in &attachments {
            if let Err(err) = self.files.delete(&attachment.save_name) {
                warn!("couldn't delete upload {}: {}", attachment.save_name, err);
            }
        }

        info!("user {} deleted thread {}", actor_id, thread_id);

        Ok(())
    }

    /// Move a thread along its triage lifecycle. Elevated roles only.
    pub fn set_thread_status(
        &self,
        actor_id: UserId,
        thread_id: ThreadId,
        new_status: ThreadStatus,
    ) -> Result<()> {
        let mut conn = self.db.connection()?;

        let actor = conn.user(actor_id)?;
        check_elevated(&actor, "change thread status")?;
        conn.thread(thread_id)?;

        conn.transaction(|conn| {
            conn.set_thread_status(thread_id, new_status)?;
            conn.insert_audit(&NewAuditLogEntry::new(
                actor_id,
                "thread.status",
                Some("thread"),
                Some(thread_id),
                Some(json!({ "status": new_status.to_string() })),
            ))?;

            Ok(())
        })?;

        Ok(())
    }

    /// Get one page of the thread listing.
    pub fn thread_listing(&self, query: &ThreadQuery, page: Page) -> Result<ThreadListing> {
        let mut conn = self.db.connection()?;

        Ok(ThreadListing {
            threads: conn.thread_page(query, page)?,
            page_count: conn.thread_page_count(query, page.width)?,
        })
    }

    /// Get a thread with everything its detail page shows.
    pub fn thread_detail(&self, thread_id: ThreadId) -> Result<ThreadDetail> {
        let mut conn = self.db.connection()?;

        let thread = conn.thread(thread_id)?;
        let author = conn.user(thread.author)?;

        Ok(ThreadDetail {
            author,
            comments: conn.comments_in_thread(thread_id)?,
            tags: conn.tags_for_thread(thread_id)?,
            attachments: conn.attachments_in_thread(thread_id)?,
            thread,
        })
    }

    /// Add a comment to a thread.
    pub fn add_comment(&self, author_id: UserId, thread_id: ThreadId, body: &str) -> Result<CommentId> {
        check_present(body, "body")?;

        let mut conn = self.db.connection()?;

        conn.user(author_id)?;
        conn.thread(thread_id)?;

        let comment_id =
            conn.insert_comment(&NewComment::new(thread_id, body.to_string(), author_id))?;

        info!("user {} commented on thread {}", author_id, thread_id);

        Ok(comment_id)
    }

    /// Delete a comment. Author or elevated only.
    pub fn delete_comment(&self, actor_id: UserId, comment_id: CommentId) -> Result<()> {
        let mut conn = self.db.connection()?;

        let actor = conn.user(actor_id)?;
        let comment = conn.comment(comment_id)?;
        check_owner_or_elevated(&actor, comment.author, "delete this comment")?;

        conn.transaction(|conn| {
            conn.delete_comment(comment_id)?;
            conn.insert_audit(&NewAuditLogEntry::new(
                actor_id,
                "comment.delete",
                Some("comment"),
                Some(comment_id),
                Some(json!({ "thread": comment.thread })),
            ))?;

            Ok(())
        })?;

        info!("user {} deleted comment {}", actor_id, comment_id);

        Ok(())
    }

    /// Toggle `user_id`'s like on a thread.
    pub fn toggle_like(&self, user_id: UserId, thread_id: ThreadId) -> Result<LikeState> {
        let mut conn = self.db.connection()?;

        conn.user(user_id)?;
        conn.toggle_like(thread_id, user_id)
    }

    /// Report a thread or comment.
    pub fn create_report(
        &self,
        reporter_id: UserId,
        target_type: TargetType,
        target_id: i32,
        reason: &str,
    ) -> Result<ReportId> {
        check_present(reason, "reason")?;

        let mut conn = self.db.connection()?;
        conn.user(reporter_id)?;

        let report_id = conn.transaction(|conn| {
            let report_id = conn.insert_report(&NewReport::new(
                target_type,
                target_id,
                reason.to_string(),
                reporter_id,
            ))?;

            conn.insert_audit(&NewAuditLogEntry::new(
                reporter_id,
                "report.create",
                Some(&target_type.to_string()),
                Some(target_id),
                None,
            ))?;

            Ok(report_id)
        })?;

        info!(
            "user {} reported {} {} (report {})",
            reporter_id, target_type, target_id, report_id
        );

        Ok(report_id)
    }

    /// Move a report along its triage lifecycle. Elevated roles only.
    pub fn set_report_status(
        &self,
        actor_id: UserId,
        report_id: ReportId,
        new_status: ReportStatus,
    ) -> Result<()> {
        let mut conn = self.db.connection()?;

        let actor = conn.user(actor_id)?;
        check_elevated(&actor, "triage reports")?;
        conn.report(report_id)?;

        conn.transaction(|conn| {
            conn.set_report_status(report_id, new_status)?;
            conn.insert_audit(&NewAuditLogEntry::new(
                actor_id,
                "report.status",
                Some("report"),
                Some(report_id),
                Some(json!({ "status": new_status.to_string() })),
            ))?;

            Ok(())
        })?;

        Ok(())
    }

    /// Resolve an attachment to its record and on-disk blob path, for
    /// download.
    pub fn attachment_download(&self, attachment_id: AttachmentId) -> Result<(Attachment, PathBuf)> {
        let mut conn = self.db.connection()?;

        let attachment = conn.attachment(attachment_id)?;
        let path = self.files.path(&attachment.save_name);

        if !path.exists() {
            return Err(Error::AttachmentNotFound { attachment_id });
        }

        Ok((attachment, path))
    }

    /// The admin panel's numbers and recent reports. Elevated roles only.
    pub fn admin_summary(&self, actor_id: UserId) -> Result<Summary> {
        let mut conn = self.db.connection()?;

        let actor = conn.user(actor_id)?;
        check_elevated(&actor, "view the admin summary")?;

        Ok(Summary {
            total_threads: conn.num_threads()?,
            total_comments: conn.num_comments()?,
            total_users: conn.num_users()?,
            unhandled_reports: conn.num_unhandled_reports()?,
            recent_reports: conn.recent_reports(10)?,
        })
    }

    fn discard_blobs(&self, stored: &[(String, Upload)]) {
        for (save_name, _) in stored {
            if let Err(err) = self.files.delete(save_name) {
                warn!("couldn't remove orphaned upload {}: {}", save_name, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{thread_rng, Rng};

    use super::*;
    use crate::models::report::TargetType;

    fn test_board() -> Board {
        let db = Database::open_in_memory().expect("couldn't open in-memory database");
        let dir = std::env::temp_dir().join(format!("corkboard-test-{:08x}", thread_rng().gen::<u32>()));
        let files = FileStore::open(dir).expect("couldn't open test file store");

        Board::new(db, files)
    }

    fn register(board: &Board, email: &str) -> UserId {
        board
            .register_user("Test User", email, "eng", "hunter2")
            .expect("couldn't register user")
    }

    fn promote(board: &Board, user_id: UserId) {
        board
            .database()
            .connection()
            .unwrap()
            .set_user_role(user_id, Role::Moderator)
            .expect("couldn't promote user");
    }

    #[test]
    fn thread_lifecycle_end_to_end() -> Result<()> {
        let board = test_board();

        let u1 = register(&board, "u1@example.com");
        let u2 = register(&board, "u2@example.com");

        let thread_id = board.create_thread(
            u1,
            ThreadForm {
                title: "T1".into(),
                body: "first thread".into(),
                tags: vec!["infra".into(), "auto".into()],
                uploads: Vec::new(),
            },
        )?;

        let detail = board.thread_detail(thread_id)?;
        assert_eq!(detail.thread.status, ThreadStatus::Unconfirmed);
        assert_eq!(detail.thread.like_count, 0);
        assert_eq!(detail.tags.len(), 2);
        assert_eq!(detail.author.id, u1);

        let state = board.toggle_like(u1, thread_id)?;
        assert!(state.liked);
        assert_eq!(state.like_count, 1);

        let state = board.toggle_like(u1, thread_id)?;
        assert!(!state.liked);
        assert_eq!(state.like_count, 0);

        board.add_comment(u2, thread_id, "looks good")?;
        assert_eq!(board.thread_detail(thread_id)?.comments.len(), 1);

        board.toggle_like(u2, thread_id)?;
        board.delete_thread(u1, thread_id)?;

        match board.thread_detail(thread_id) {
            Err(Error::ThreadNotFound { .. }) => {}
            other => panic!("expected ThreadNotFound, got {:?}", other.map(|d| d.thread.id)),
        }

        // Everything hanging off the thread is gone too.
        let mut conn = board.database().connection()?;
        assert!(conn.comments_in_thread(thread_id)?.is_empty());
        assert!(conn.tags_for_thread(thread_id)?.is_empty());
        assert_eq!(conn.thread_like_count(thread_id)?, 0);

        Ok(())
    }

    #[test]
    fn attachments_follow_their_thread() -> Result<()> {
        let board = test_board();
        let author = register(&board, "author@example.com");

        let thread_id = board.create_thread(
            author,
            ThreadForm {
                title: "With files".into(),
                body: "see attached".into(),
                tags: Vec::new(),
                uploads: vec![Upload {
                    name: "notes.txt".into(),
                    content_type: None,
                    data: b"hello".to_vec(),
                }],
            },
        )?;

        let detail = board.thread_detail(thread_id)?;
        assert_eq!(detail.attachments.len(), 1);

        let attachment = &detail.attachments[0];
        assert_eq!(attachment.original_filename, "notes.txt");
        assert_ne!(attachment.save_name, "notes.txt");
        assert_eq!(attachment.file_size, 5);
        assert_eq!(attachment.content_type.as_deref(), Some("text/plain"));
        assert!(board.files().exists(&attachment.save_name));

        let (downloaded, path) = board.attachment_download(attachment.id)?;
        assert_eq!(downloaded.id, attachment.id);
        assert_eq!(std::fs::read(path)?, b"hello");

        let save_name = attachment.save_name.clone();
        board.delete_thread(author, thread_id)?;
        assert!(!board.files().exists(&save_name));

        Ok(())
    }

    #[test]
    fn non_authors_need_an_elevated_role() -> Result<()> {
        let board = test_board();

        let author = register(&board, "author@example.com");
        let stranger = register(&board, "stranger@example.com");

        let thread_id = board.create_thread(
            author,
            ThreadForm {
                title: "Mine".into(),
                body: "hands off".into(),
                tags: vec!["infra".into()],
                uploads: Vec::new(),
            },
        )?;

        let edit = ThreadEdit {
            title: "Defaced".into(),
            body: "gotcha".into(),
            tags: Vec::new(),
        };

        match board.edit_thread(stranger, thread_id, edit.clone()) {
            Err(Error::PermissionDenied { .. }) => {}
            other => panic!("expected PermissionDenied, got {:?}", other),
        }

        match board.delete_thread(stranger, thread_id) {
            Err(Error::PermissionDenied { .. }) => {}
            other => panic!("expected PermissionDenied, got {:?}", other),
        }

        // The denied edit left the thread untouched.
        let detail = board.thread_detail(thread_id)?;
        assert_eq!(detail.thread.title, "Mine");
        assert_eq!(detail.tags.len(), 1);

        // A moderator can do both.
        promote(&board, stranger);
        board.edit_thread(stranger, thread_id, edit)?;
        assert_eq!(board.thread_detail(thread_id)?.thread.title, "Defaced");
        board.delete_thread(stranger, thread_id)?;

        Ok(())
    }

    #[test]
    fn comment_deletion_follows_the_same_rule() -> Result<()> {
        let board = test_board();

        let author = register(&board, "author@example.com");
        let commenter = register(&board, "commenter@example.com");

        let thread_id = board.create_thread(
            author,
            ThreadForm {
                title: "A thread".into(),
                body: "body".into(),
                ..ThreadForm::default()
            },
        )?;

        let comment_id = board.add_comment(commenter, thread_id, "my two cents")?;

        // The thread's author doesn't own the comment.
        match board.delete_comment(author, comment_id) {
            Err(Error::PermissionDenied { .. }) => {}
            other => panic!("expected PermissionDenied, got {:?}", other),
        }

        board.delete_comment(commenter, comment_id)?;
        assert!(board.thread_detail(thread_id)?.comments.is_empty());

        Ok(())
    }

    #[test]
    fn empty_fields_are_rejected() -> Result<()> {
        let board = test_board();
        let author = register(&board, "author@example.com");

        let form = ThreadForm {
            title: "   ".into(),
            body: "body".into(),
            ..ThreadForm::default()
        };

        match board.create_thread(author, form) {
            Err(Error::MissingParam { param }) => assert_eq!(param, "title"),
            other => panic!("expected MissingParam, got {:?}", other),
        }

        let thread_id = board.create_thread(
            author,
            ThreadForm {
                title: "Fine".into(),
                body: "body".into(),
                ..ThreadForm::default()
            },
        )?;

        match board.add_comment(author, thread_id, " \n") {
            Err(Error::MissingParam { param }) => assert_eq!(param, "body"),
            other => panic!("expected MissingParam, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn duplicate_tag_submissions_link_once() -> Result<()> {
        let board = test_board();
        let author = register(&board, "author@example.com");

        let thread_id = board.create_thread(
            author,
            ThreadForm {
                title: "Tagged".into(),
                body: "body".into(),
                tags: vec!["infra".into(), "infra".into(), " infra ".into()],
                uploads: Vec::new(),
            },
        )?;

        assert_eq!(board.thread_detail(thread_id)?.tags.len(), 1);

        Ok(())
    }

    #[test]
    fn reporting_is_once_per_reporter() -> Result<()> {
        let board = test_board();

        let author = register(&board, "author@example.com");
        let u1 = register(&board, "u1@example.com");

        let thread_id = board.create_thread(
            author,
            ThreadForm {
                title: "T1".into(),
                body: "body".into(),
                ..ThreadForm::default()
            },
        )?;

        board.create_report(u1, TargetType::Thread, thread_id, "spam")?;

        match board.create_report(u1, TargetType::Thread, thread_id, "still spam") {
            Err(Error::AlreadyReported { .. }) => {}
            other => panic!("expected AlreadyReported, got {:?}", other),
        }

        match board.create_report(u1, TargetType::Thread, thread_id, "  ") {
            Err(Error::MissingParam { param }) => assert_eq!(param, "reason"),
            other => panic!("expected MissingParam, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn admin_summary_is_gated_and_counts() -> Result<()> {
        let board = test_board();

        let author = register(&board, "author@example.com");
        let reporter = register(&board, "reporter@example.com");
        let moderator = register(&board, "mod@example.com");

        let thread_id = board.create_thread(
            author,
            ThreadForm {
                title: "T1".into(),
                body: "body".into(),
                ..ThreadForm::default()
            },
        )?;
        board.add_comment(reporter, thread_id, "hm")?;
        let report_id = board.create_report(reporter, TargetType::Thread, thread_id, "spam")?;

        match board.admin_summary(author) {
            Err(Error::PermissionDenied { .. }) => {}
            other => panic!("expected PermissionDenied, got {:?}", other.map(|s| s.total_threads)),
        }

        promote(&board, moderator);

        let summary = board.admin_summary(moderator)?;
        assert_eq!(summary.total_threads, 1);
        assert_eq!(summary.total_comments, 1);
        assert_eq!(summary.total_users, 3);
        assert_eq!(summary.unhandled_reports, 1);
        assert_eq!(summary.recent_reports.len(), 1);

        board.set_report_status(moderator, report_id, ReportStatus::Done)?;
        assert_eq!(board.admin_summary(moderator)?.unhandled_reports, 0);

        Ok(())
    }

    #[test]
    fn moderation_is_audit_logged() -> Result<()> {
        let board = test_board();

        let author = register(&board, "author@example.com");
        let moderator = register(&board, "mod@example.com");
        promote(&board, moderator);

        let thread_id = board.create_thread(
            author,
            ThreadForm {
                title: "T1".into(),
                body: "body".into(),
                ..ThreadForm::default()
            },
        )?;

        board.set_thread_status(moderator, thread_id, ThreadStatus::InProgress)?;
        board.delete_thread(moderator, thread_id)?;

        let mut conn = board.database().connection()?;
        let entries = conn.recent_audit_entries(10)?;
        let actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();

        assert_eq!(actions, vec!["thread.delete", "thread.status"]);
        assert!(entries.iter().all(|e| e.actor == moderator));

        Ok(())
    }

    #[test]
    fn authentication_checks_the_password() -> Result<()> {
        let board = test_board();

        let user_id = register(&board, "login@example.com");

        let user = board.authenticate("login@example.com", "hunter2")?;
        assert_eq!(user.id, user_id);

        match board.authenticate("login@example.com", "wrong") {
            Err(Error::InvalidCredentials) => {}
            other => panic!("expected InvalidCredentials, got {:?}", other.map(|u| u.id)),
        }

        match board.authenticate("nobody@example.com", "hunter2") {
            Err(Error::InvalidCredentials) => {}
            other => panic!("expected InvalidCredentials, got {:?}", other.map(|u| u.id)),
        }

        match board.register_user("Test User", "login@example.com", "eng", "hunter2") {
            Err(Error::EmailTaken { .. }) => {}
            other => panic!("expected EmailTaken, got {:?}", other),
        }

        Ok(())
    }
}
