/// Contact services
///
/// Every operation takes the authenticated user's id as `owner` and never
/// reaches another owner's rows.

use contacts_shared::models::contact::{Contact, ContactFilter, ContactPatch, CreateContact};
use contacts_shared::validation::schemas::{CreateContactBody, UpdateContactBody};

use super::ServiceResult;
use crate::app::AppState;
use crate::error::ApiError;
use crate::pipeline::PageQuery;

fn not_effective() -> ApiError {
    ApiError::bad_request().with_message("Nothing to update or update was not effective")
}

/// Lists a page of the owner's contacts in ascending id order
pub async fn list(state: &AppState, owner: i64, query: PageQuery) -> ServiceResult<Vec<Contact>> {
    let contacts = state
        .store
        .list_contacts(ContactFilter {
            owner,
            favorite: query.favorite,
            limit: i64::from(query.limit),
            offset: query.offset(),
        })
        .await?;

    tracing::debug!(owner, rows = contacts.len(), page = query.page, "Listed contacts");

    Ok(contacts)
}

pub async fn get(state: &AppState, owner: i64, id: i64) -> ServiceResult<Option<Contact>> {
    Ok(state.store.find_contact(owner, id).await?)
}

pub async fn create(state: &AppState, owner: i64, body: CreateContactBody) -> ServiceResult<Contact> {
    let contact = state
        .store
        .create_contact(CreateContact {
            owner,
            name: body.name,
            email: body.email,
            phone: body.phone,
        })
        .await?;

    tracing::info!(owner, contact_id = contact.id, "Contact created");

    Ok(contact)
}

/// Applies a partial update
///
/// # Returns
///
/// The updated contact, or `None` when the owner has no such contact
///
/// # Errors
///
/// 400 when the store changed nothing although the contact still exists
pub async fn update(
    state: &AppState,
    owner: i64,
    id: i64,
    body: UpdateContactBody,
) -> ServiceResult<Option<Contact>> {
    let patch = ContactPatch {
        name: body.name,
        email: body.email,
        phone: body.phone,
        favorite: None,
    };

    apply_patch(state, owner, id, patch).await
}

/// Sets the favorite flag; setting the current value again is not an error
pub async fn toggle_favorite(
    state: &AppState,
    owner: i64,
    id: i64,
    favorite: bool,
) -> ServiceResult<Option<Contact>> {
    let patch = ContactPatch {
        favorite: Some(favorite),
        ..Default::default()
    };

    apply_patch(state, owner, id, patch).await
}

async fn apply_patch(
    state: &AppState,
    owner: i64,
    id: i64,
    patch: ContactPatch,
) -> ServiceResult<Option<Contact>> {
    let rows = state.store.update_contact(owner, id, patch).await?;
    let current = state.store.find_contact(owner, id).await?;

    if rows == 0 && current.is_some() {
        return Err(not_effective().into());
    }

    if rows > 0 {
        tracing::info!(owner, contact_id = id, rows, "Contact updated");
    }

    Ok(current)
}

/// Deletes a contact
///
/// # Returns
///
/// The deleted contact, or `None` when the owner has no such contact
pub async fn delete(state: &AppState, owner: i64, id: i64) -> ServiceResult<Option<Contact>> {
    let Some(existing) = state.store.find_contact(owner, id).await? else {
        return Ok(None);
    };

    let rows = state.store.delete_contact(owner, id).await?;
    if rows == 0 {
        // Gone in between: report absence, not a failed delete
        return match state.store.find_contact(owner, id).await? {
            Some(_) => Err(not_effective().into()),
            None => Ok(None),
        };
    }

    tracing::info!(owner, contact_id = id, "Contact deleted");

    Ok(Some(existing))
}
