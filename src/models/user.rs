//! Types for users, roles, and credentials.

use std::str::FromStr;

use argon2::{hash_encoded, verify_encoded};

use chrono::{NaiveDateTime, Utc};

use derive_more::Display;

use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use diesel::{insert_into, prelude::*, update};

use rand::{thread_rng, Rng};

use serde::Serialize;

use crate::models::{Connection, InnerConnection};
use crate::schema::user;
use crate::{Error, Result};

/// A user ID.
pub type UserId = i32;

/// The permission tier of a user.
///
/// Moderators and admins hold the same elevated capabilities; nothing in the
/// board distinguishes them.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsExpression,
    FromSqlRow,
    Serialize,
)]
#[diesel(sql_type = Text)]
pub enum Role {
    #[display(fmt = "user")]
    User,
    #[display(fmt = "moderator")]
    Moderator,
    #[display(fmt = "admin")]
    Admin,
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(Error::UnknownRole {
                role: s.to_string(),
            }),
        }
    }
}

impl ToSql<Text, Sqlite> for Role {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.to_string());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Role {
    fn from_sql(value: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        text.parse::<Role>().map_err(|err| err.to_string().into())
    }
}

/// A registered user.
#[derive(Debug, Queryable, Serialize)]
pub struct User {
    /// The user's ID in the database.
    pub id: UserId,
    /// The user's display name.
    pub name: String,
    /// The user's e-mail address. Unique; doubles as the login name.
    pub email: String,
    /// The department the user belongs to.
    pub dept: String,
    /// The user's permission tier.
    pub role: Role,
    /// The argon2 hash of the user's password.
    pub password_hash: String,
    /// When the account was created.
    pub created_at: NaiveDateTime,
}

impl User {
    /// Whether the user holds an elevated role.
    pub fn is_elevated(&self) -> bool {
        self.role >= Role::Moderator
    }

    /// Check a plaintext password against the stored hash.
    pub fn verify_password(&self, password: &str) -> Result<bool> {
        Ok(verify_encoded(&self.password_hash, password.as_bytes())?)
    }
}

/// A new user to insert into the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = user)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub dept: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

impl NewUser {
    /// Create a `NewUser` with a freshly hashed password.
    pub fn new(name: &str, email: &str, dept: &str, role: Role, password: &str) -> Result<NewUser> {
        Ok(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            dept: dept.to_string(),
            role,
            password_hash: hash_password(password)?,
            created_at: Utc::now().naive_utc(),
        })
    }
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String> {
    let salt: [u8; 20] = thread_rng().gen();
    let conf = argon2::Config::default();

    Ok(hash_encoded(password.as_bytes(), &salt, &conf)?)
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a user.
fn conv_user_error(user_id: UserId) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e: diesel::result::Error| match e {
        diesel::result::Error::NotFound => Error::UserNotFound { user_id },
        _ => Error::from(e),
    }
}

impl<C: InnerConnection> Connection<C> {
    /// Get a user.
    pub fn user(&mut self, user_id: UserId) -> Result<User> {
        use crate::schema::user::columns::id;
        use crate::schema::user::dsl::user;

        user.filter(id.eq(user_id))
            .limit(1)
            .first(&mut self.inner)
            .map_err(conv_user_error(user_id))
    }

    /// Look up a user by e-mail address.
    pub fn user_by_email(&mut self, address: &str) -> Result<Option<User>> {
        use crate::schema::user::columns::email;
        use crate::schema::user::dsl::user;

        Ok(user
            .filter(email.eq(address))
            .limit(1)
            .first(&mut self.inner)
            .optional()?)
    }

    /// Insert a new user into the database.
    ///
    /// The e-mail address is unique; registering one twice surfaces as
    /// `EmailTaken`.
    pub fn insert_user(&mut self, new_user: &NewUser) -> Result<UserId> {
        use diesel::result::DatabaseErrorKind;

        use crate::schema::user::columns::id;
        use crate::schema::user::dsl::user;

        insert_into(user)
            .values(new_user)
            .returning(id)
            .get_result(&mut self.inner)
            .map_err(|err| match err {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    Error::EmailTaken {
                        email: new_user.email.clone(),
                    }
                }
                _ => Error::from(err),
            })
    }

    /// Change a user's role.
    pub fn set_user_role(&mut self, user_id: UserId, new_role: Role) -> Result<()> {
        use crate::schema::user::columns::{id, role};
        use crate::schema::user::dsl::user;

        update(user.filter(id.eq(user_id)))
            .set(role.eq(new_role))
            .execute(&mut self.inner)
            .map_err(conv_user_error(user_id))?;

        Ok(())
    }

    /// Get all users.
    pub fn all_users(&mut self) -> Result<Vec<User>> {
        use crate::schema::user::columns::id;
        use crate::schema::user::dsl::user;

        Ok(user.order(id.asc()).load(&mut self.inner)?)
    }

    /// Get the number of registered users.
    pub fn num_users(&mut self) -> Result<i64> {
        use crate::schema::user::dsl::user;

        Ok(user.count().first(&mut self.inner)?)
    }
}
