/// Contact model and database operations
///
/// Every query in this module is scoped by `owner`: a contact is only ever
/// read, changed or removed through the id of the user who created it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE contacts (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     email VARCHAR(254) NOT NULL,
///     phone VARCHAR(40) NOT NULL,
///     favorite BOOLEAN NOT NULL DEFAULT FALSE,
///     owner BIGINT NOT NULL REFERENCES users (id) ON UPDATE CASCADE ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Contact row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub favorite: bool,

    /// Id of the owning user
    pub owner: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a contact
#[derive(Debug, Clone, PartialEq)]
pub struct CreateContact {
    /// Id of the owning user (taken from the authenticated context)
    pub owner: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Partial update of a contact
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub favorite: Option<bool>,
}

impl ContactPatch {
    /// True when no field would be written
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.favorite.is_none()
    }

    /// Applies the patch to an in-memory contact
    pub fn apply(&self, contact: &mut Contact) {
        if let Some(name) = &self.name {
            contact.name = name.clone();
        }
        if let Some(email) = &self.email {
            contact.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            contact.phone = phone.clone();
        }
        if let Some(favorite) = self.favorite {
            contact.favorite = favorite;
        }
    }
}

/// Owner-scoped listing filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactFilter {
    pub owner: i64,

    /// Restrict to contacts with this favorite flag
    pub favorite: Option<bool>,

    /// Maximum number of rows to return
    pub limit: i64,

    /// Number of rows to skip
    pub offset: i64,
}

impl Contact {
    /// Creates a new contact owned by `data.owner`
    ///
    /// # Errors
    ///
    /// Returns an error if a column check fails, the owner does not exist,
    /// or the database connection fails
    pub async fn create(pool: &PgPool, data: CreateContact) -> Result<Self, sqlx::Error> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (name, email, phone, owner)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, phone, favorite, owner, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.phone)
        .bind(data.owner)
        .fetch_one(pool)
        .await?;

        Ok(contact)
    }

    /// Finds a contact by id, visible only to its owner
    pub async fn find(pool: &PgPool, owner: i64, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, name, email, phone, favorite, owner, created_at, updated_at
            FROM contacts
            WHERE id = $1 AND owner = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?;

        Ok(contact)
    }

    /// Lists an owner's contacts in ascending id order
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use contacts_shared::models::contact::{Contact, ContactFilter};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// // Second page of 10 favorites
    /// let page = Contact::list(
    ///     &pool,
    ///     ContactFilter { owner: 7, favorite: Some(true), limit: 10, offset: 10 },
    /// )
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list(pool: &PgPool, filter: ContactFilter) -> Result<Vec<Self>, sqlx::Error> {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, name, email, phone, favorite, owner, created_at, updated_at
            FROM contacts
            WHERE owner = $1 AND ($2::BOOLEAN IS NULL OR favorite = $2)
            ORDER BY id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.owner)
        .bind(filter.favorite)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

        Ok(contacts)
    }

    /// Applies a partial update to an owner's contact
    ///
    /// # Returns
    ///
    /// Number of affected rows (0 when the contact is absent for this owner)
    pub async fn update(
        pool: &PgPool,
        owner: i64,
        id: i64,
        patch: ContactPatch,
    ) -> Result<u64, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE contacts SET updated_at = NOW()");
        let mut bind_count = 2;

        if patch.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if patch.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if patch.phone.is_some() {
            bind_count += 1;
            query.push_str(&format!(", phone = ${}", bind_count));
        }
        if patch.favorite.is_some() {
            bind_count += 1;
            query.push_str(&format!(", favorite = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1 AND owner = $2");

        let mut q = sqlx::query(&query).bind(id).bind(owner);

        if let Some(name) = patch.name {
            q = q.bind(name);
        }
        if let Some(email) = patch.email {
            q = q.bind(email);
        }
        if let Some(phone) = patch.phone {
            q = q.bind(phone);
        }
        if let Some(favorite) = patch.favorite {
            q = q.bind(favorite);
        }

        let result = q.execute(pool).await?;

        Ok(result.rows_affected())
    }

    /// Deletes an owner's contact
    ///
    /// # Returns
    ///
    /// Number of affected rows
    pub async fn delete(pool: &PgPool, owner: i64, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> Contact {
        Contact {
            id: 1,
            name: "Allen Raymond".to_string(),
            email: "nulla.ante@vestibul.co.uk".to_string(),
            phone: "(992) 914-3792".to_string(),
            favorite: false,
            owner: 9,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_patch_default_is_empty() {
        assert!(ContactPatch::default().is_empty());
        assert!(!ContactPatch {
            favorite: Some(true),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_patch_apply_only_touches_present_fields() {
        let mut c = contact();
        ContactPatch {
            phone: Some("+1 555 0100".to_string()),
            favorite: Some(true),
            ..Default::default()
        }
        .apply(&mut c);

        assert_eq!(c.name, "Allen Raymond");
        assert_eq!(c.phone, "+1 555 0100");
        assert!(c.favorite);
        assert_eq!(c.owner, 9);
    }
}
