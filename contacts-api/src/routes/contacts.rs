/// Contact endpoints
///
/// All routes require a bearer token; the authenticated user is the owner
/// every query is scoped to.
///
/// # Endpoints
///
/// - `GET /api/contacts?page=&limit=&favorite=` - List a page of contacts
/// - `POST /api/contacts` - Create a contact
/// - `GET /api/contacts/:id` - Get one contact
/// - `PUT /api/contacts/:id` - Partially update a contact
/// - `DELETE /api/contacts/:id` - Delete a contact
/// - `PATCH /api/contacts/:id/favorite` - Set the favorite flag

use crate::{
    app::AppState,
    error::ApiResult,
    pipeline::{dispatch, require_found, IdParam, PageQuery, ValidatedBody},
    services::contacts,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use contacts_shared::{
    auth::middleware::AuthContext,
    models::contact::Contact,
    validation::schemas::{CreateContactBody, UpdateContactBody, UpdateFavoriteBody},
};
use serde::{Deserialize, Serialize};

const ENTITY: &str = "Contact";

/// Contact as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub favorite: bool,
    pub owner: i64,
}

impl From<Contact> for ContactView {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            favorite: contact.favorite,
            owner: contact.owner,
        }
    }
}

pub async fn list_contacts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    query: PageQuery,
) -> ApiResult<Json<Vec<ContactView>>> {
    let contacts = dispatch(contacts::list(&state, auth.user_id, query)).await?;

    Ok(Json(contacts.into_iter().map(ContactView::from).collect()))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdParam(id): IdParam,
) -> ApiResult<Json<ContactView>> {
    let contact = dispatch(contacts::get(&state, auth.user_id, id)).await?;
    let contact = require_found(ENTITY, id, contact)?;

    Ok(Json(contact.into()))
}

pub async fn create_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedBody(body): ValidatedBody<CreateContactBody>,
) -> ApiResult<(StatusCode, Json<ContactView>)> {
    let contact = dispatch(contacts::create(&state, auth.user_id, body)).await?;

    Ok((StatusCode::CREATED, Json(contact.into())))
}

/// Partial update
///
/// # Errors
///
/// - 400: Empty or invalid body, or nothing was changed
/// - 404: No such contact for this user
pub async fn update_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdParam(id): IdParam,
    ValidatedBody(body): ValidatedBody<UpdateContactBody>,
) -> ApiResult<Json<ContactView>> {
    let contact = dispatch(contacts::update(&state, auth.user_id, id, body)).await?;
    let contact = require_found(ENTITY, id, contact)?;

    Ok(Json(contact.into()))
}

/// Delete endpoint; responds with the removed contact
pub async fn delete_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdParam(id): IdParam,
) -> ApiResult<Json<ContactView>> {
    let contact = dispatch(contacts::delete(&state, auth.user_id, id)).await?;
    let contact = require_found(ENTITY, id, contact)?;

    Ok(Json(contact.into()))
}

pub async fn update_favorite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdParam(id): IdParam,
    ValidatedBody(body): ValidatedBody<UpdateFavoriteBody>,
) -> ApiResult<Json<ContactView>> {
    let contact = dispatch(contacts::toggle_favorite(&state, auth.user_id, id, body.favorite)).await?;
    let contact = require_found(ENTITY, id, contact)?;

    Ok(Json(contact.into()))
}
