//! Client-side validation of the sign-up form.
//!
//! A [`RegistrationForm`] can only be obtained by validating a [`RegistrationDraft`], so the
//! submitter never sees unchecked input.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::imaging::{self, JPEG_QUALITY};
use crate::positions::PositionCatalog;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 60;
pub const PHOTO_MIN_SIDE: u32 = 70;
/// Encoded photos must be strictly smaller than this.
pub const PHOTO_MAX_BYTES: usize = 5 * 1024 * 1024;

const REQUIRED: &str = "Required field";

/// RFC 5322 style address, matched case-insensitively.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r##"(?i)^(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?|\[(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)(?:\.(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)){3}|[a-z0-9-]*[a-z0-9]:(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\])$"##,
    )
    .expect("valid regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?380[0-9]{9}$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
    Position,
    Photo,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Position => "position",
            Field::Photo => "photo",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Every field that failed validation, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: Field, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Violations in field order.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Message for `field`, if it failed.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Whether `field` has at least one violation.
    pub fn contains(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

/// Raw sign-up input as the user typed it.
#[derive(Debug, Clone, Default)]
pub struct RegistrationDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position_id: Option<i64>,
    /// Photo in any decodable format.
    pub photo: Option<Vec<u8>>,
}

/// Validated sign-up payload. The photo is already re-encoded as JPEG.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    name: String,
    email: String,
    phone: String,
    position_id: i64,
    photo_jpeg: Vec<u8>,
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("position_id", &self.position_id)
            .field("photo_jpeg", &self.photo_jpeg.len())
            .finish()
    }
}

impl RegistrationForm {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn position_id(&self) -> i64 {
        self.position_id
    }

    /// The re-encoded JPEG that will be uploaded.
    pub fn photo_jpeg(&self) -> &[u8] {
        &self.photo_jpeg
    }
}

impl RegistrationDraft {
    /// Check every field against the current catalog.
    ///
    /// Returns all failures at once.
    pub fn validate(
        &self,
        catalog: &PositionCatalog,
    ) -> Result<RegistrationForm, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if let Err(message) = check_name(&self.name) {
            errors.push(Field::Name, message);
        }

        let email = self.email.trim();
        if let Err(message) = check_email(email) {
            errors.push(Field::Email, message);
        }

        if let Err(message) = check_phone(&self.phone) {
            errors.push(Field::Phone, message);
        }

        let position_id = match self.position_id {
            None => {
                errors.push(Field::Position, "Select a position");
                None
            }
            Some(id) if !catalog.contains(id) => {
                errors.push(Field::Position, "Unknown position");
                None
            }
            Some(id) => Some(id),
        };

        let photo_jpeg = match self.photo.as_deref().map(prepare_photo) {
            None => {
                errors.push(Field::Photo, "Photo is required");
                None
            }
            Some(Err(message)) => {
                errors.push(Field::Photo, message);
                None
            }
            Some(Ok(jpeg)) => Some(jpeg),
        };

        match (position_id, photo_jpeg) {
            (Some(position_id), Some(photo_jpeg)) if errors.is_empty() => Ok(RegistrationForm {
                name: self.name.clone(),
                email: email.to_owned(),
                phone: self.phone.clone(),
                position_id,
                photo_jpeg,
            }),
            _ => Err(errors),
        }
    }
}

/// Length in characters, not bytes, must be within the name bounds.
pub fn check_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(REQUIRED.to_owned());
    }
    let chars = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
        return Err(format!(
            "Name must be {NAME_MIN_CHARS} to {NAME_MAX_CHARS} characters"
        ));
    }
    Ok(())
}

/// `email` is expected to be trimmed already.
pub fn check_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err(REQUIRED.to_owned());
    }
    if !EMAIL_RE.is_match(email) {
        return Err("Invalid email format".to_owned());
    }
    Ok(())
}

/// Ukrainian mobile number, leading `+` optional.
pub fn check_phone(phone: &str) -> Result<(), String> {
    if phone.is_empty() {
        return Err(REQUIRED.to_owned());
    }
    if !PHONE_RE.is_match(phone) {
        return Err("Phone must look like +380XXXXXXXXX".to_owned());
    }
    Ok(())
}

/// Decode, size-check and re-encode a photo as JPEG.
pub fn prepare_photo(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let image =
        imaging::decode(bytes).map_err(|err| format!("Photo could not be read: {err}"))?;
    let (width, height) = (image.width(), image.height());
    if width < PHOTO_MIN_SIDE || height < PHOTO_MIN_SIDE {
        return Err(format!(
            "Photo must be at least {PHOTO_MIN_SIDE}x{PHOTO_MIN_SIDE} pixels"
        ));
    }
    let jpeg = imaging::encode_jpeg(&image, JPEG_QUALITY).map_err(|e| e.to_string())?;
    if jpeg.len() >= PHOTO_MAX_BYTES {
        return Err("Photo must be smaller than 5 MB".to_owned());
    }
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Position;
    use crate::test_utils::png_fixture;

    fn catalog() -> PositionCatalog {
        PositionCatalog::from_positions(vec![
            Position {
                id: 1,
                name: "Lawyer".to_owned(),
            },
            Position {
                id: 4,
                name: "Designer".to_owned(),
            },
        ])
    }

    fn valid_draft() -> RegistrationDraft {
        RegistrationDraft {
            name: "Jo".to_owned(),
            email: " user.name+tag@sub.domain.co ".to_owned(),
            phone: "+380501234567".to_owned(),
            position_id: Some(4),
            photo: Some(png_fixture(70, 70)),
        }
    }

    #[test]
    fn name_length_bounds() {
        assert_eq!(check_name("").unwrap_err(), "Required field");
        assert!(check_name("A").is_err());
        assert!(check_name("Jo").is_ok());
        assert!(check_name(&"x".repeat(60)).is_ok());
        assert!(check_name(&"x".repeat(61)).is_err());
        assert!(check_name("Їж").is_ok(), "counts characters, not bytes");
    }

    #[test]
    fn email_patterns() {
        assert_eq!(check_email("").unwrap_err(), "Required field");
        assert_eq!(check_email("a@@b").unwrap_err(), "Invalid email format");
        assert!(check_email("plainaddress").is_err());
        assert!(check_email("user.name+tag@sub.domain.co").is_ok());
        assert!(check_email("USER@EXAMPLE.COM").is_ok());
        assert!(check_email("\"quoted.local\"@example.com").is_ok());
        assert!(check_email("admin@[192.168.0.1]").is_ok());
        assert!(check_email("user@-example.com").is_err());
    }

    #[test]
    fn phone_patterns() {
        assert!(check_phone("+380501234567").is_ok());
        assert!(check_phone("380501234567").is_ok());
        assert!(check_phone("0501234567").is_err());
        assert!(check_phone("+38050123456").is_err());
        assert!(check_phone("+3805012345678").is_err());
        assert_eq!(check_phone("").unwrap_err(), "Required field");
    }

    #[test]
    fn photo_checks() {
        assert!(prepare_photo(&png_fixture(69, 200)).is_err());
        let unreadable = prepare_photo(b"nope").unwrap_err();
        assert!(unreadable.starts_with("Photo could not be read: "), "{unreadable}");

        let jpeg = prepare_photo(&png_fixture(70, 70)).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn valid_draft_builds_form() {
        let form = valid_draft().validate(&catalog()).unwrap();
        assert_eq!(form.name(), "Jo");
        assert_eq!(form.email(), "user.name+tag@sub.domain.co");
        assert_eq!(form.position_id(), 4);
        assert!(!form.photo_jpeg().is_empty());
    }

    #[test]
    fn every_failure_is_reported() {
        let draft = RegistrationDraft {
            name: "A".to_owned(),
            email: "a@@b".to_owned(),
            phone: "0501234567".to_owned(),
            position_id: Some(99),
            photo: None,
        };
        let errors = draft.validate(&catalog()).unwrap_err();

        assert_eq!(errors.len(), 5);
        assert_eq!(
            errors.errors().iter().map(|e| e.field).collect::<Vec<_>>(),
            vec![
                Field::Name,
                Field::Email,
                Field::Phone,
                Field::Position,
                Field::Photo
            ]
        );
        assert_eq!(errors.get(Field::Photo), Some("Photo is required"));
        assert_eq!(errors.get(Field::Position), Some("Unknown position"));
    }

    #[test]
    fn missing_position_is_reported() {
        let draft = RegistrationDraft {
            position_id: None,
            ..valid_draft()
        };
        let errors = draft.validate(&catalog()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.to_string(), "position: Select a position");
    }
}
