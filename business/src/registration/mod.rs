//! Sign-up flow: validate a draft, build the multipart body, submit, interpret the status.

pub mod multipart;
pub mod submit;
pub mod validate;

pub use multipart::MultipartBody;
pub use submit::{RegistrationSubmitter, SubmitOutcome, SubmitStatus, interpret};
pub use validate::{Field, FieldError, RegistrationDraft, RegistrationForm, ValidationErrors};
