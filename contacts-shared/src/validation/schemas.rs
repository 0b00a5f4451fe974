/// Bodies accepted by the auth and contacts routes

use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use super::rules::{add_tips, email_violations, password_violations, PASSWORD_MAX_LENGTH};
use super::{Field, FieldKind, Schema};
use crate::models::user::Subscription;

/// `POST /api/auth/register`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
}

impl Validate for RegisterUser {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        add_tips(&mut errors, "email", "email", email_violations(&self.email));
        add_tips(&mut errors, "password", "password", password_violations(&self.password));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Schema for RegisterUser {
    const FIELDS: &'static [Field] = &[
        Field::required("email", FieldKind::String),
        Field::required("password", FieldKind::String),
    ];
}

/// `POST /api/auth/login`
///
/// The password is only bounded here; its strength rules apply at
/// registration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub email: String,
    pub password: String,
}

impl Validate for LoginUser {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        add_tips(&mut errors, "email", "email", email_violations(&self.email));

        if self.password.chars().count() > PASSWORD_MAX_LENGTH {
            add_tips(
                &mut errors,
                "password",
                "length",
                vec![format!("should have a maximum length of {} characters", PASSWORD_MAX_LENGTH).into()],
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Schema for LoginUser {
    const FIELDS: &'static [Field] = &[
        Field::required("email", FieldKind::String),
        Field::required("password", FieldKind::String),
    ];
}

/// `POST /api/auth/verify`
#[derive(Debug, Clone, Deserialize)]
pub struct ResendVerification {
    pub email: String,
}

impl Validate for ResendVerification {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        add_tips(&mut errors, "email", "email", email_violations(&self.email));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Schema for ResendVerification {
    const FIELDS: &'static [Field] = &[Field::required("email", FieldKind::String)];
}

/// `PATCH /api/auth/subscription`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSubscription {
    pub subscription: String,
}

impl UpdateSubscription {
    /// The requested tier
    ///
    /// # Errors
    ///
    /// Returns the parse error for a value outside [`Subscription::VALUES`]
    pub fn tier(&self) -> Result<Subscription, String> {
        self.subscription.parse()
    }
}

impl Validate for UpdateSubscription {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.tier().is_err() {
            let mut error = ValidationError::new("subscription");
            error.message = Some(
                format!(
                    "'subscription' must be one of: '{}'",
                    Subscription::VALUES.join("', '")
                )
                .into(),
            );
            errors.add("subscription", error);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Schema for UpdateSubscription {
    const FIELDS: &'static [Field] = &[Field::required("subscription", FieldKind::String)];
}

/// `POST /api/contacts`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateContactBody {
    #[validate(length(max = 100, message = "'name' should have a maximum length of 100 characters"))]
    pub name: String,

    #[validate(
        email(message = "'email' value should be a valid e-mail address"),
        length(min = 6, max = 254, message = "'email' should have a length between 6 and 254 characters")
    )]
    pub email: String,

    #[validate(length(max = 40, message = "'phone' should have a maximum length of 40 characters"))]
    pub phone: String,
}

impl Schema for CreateContactBody {
    const FIELDS: &'static [Field] = &[
        Field::required("name", FieldKind::String),
        Field::required("email", FieldKind::String),
        Field::required("phone", FieldKind::String),
    ];
}

/// `PUT /api/contacts/:id`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateContactBody {
    #[validate(length(max = 100, message = "'name' should have a maximum length of 100 characters"))]
    pub name: Option<String>,

    #[validate(
        email(message = "'email' value should be a valid e-mail address"),
        length(min = 6, max = 254, message = "'email' should have a length between 6 and 254 characters")
    )]
    pub email: Option<String>,

    #[validate(length(max = 40, message = "'phone' should have a maximum length of 40 characters"))]
    pub phone: Option<String>,
}

impl Schema for UpdateContactBody {
    const FIELDS: &'static [Field] = &[
        Field::optional("name", FieldKind::String),
        Field::optional("email", FieldKind::String),
        Field::optional("phone", FieldKind::String),
    ];
    const REQUIRE_ANY: bool = true;
}

/// `PATCH /api/contacts/:id/favorite`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateFavoriteBody {
    pub favorite: bool,
}

impl Schema for UpdateFavoriteBody {
    const FIELDS: &'static [Field] = &[Field::required("favorite", FieldKind::Boolean)];
}
