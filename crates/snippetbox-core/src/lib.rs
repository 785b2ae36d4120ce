// ABOUTME: Core domain types for snippetbox: the Snippet model, form validation, and forms.
// ABOUTME: Has no I/O; the store and server crates build on these types.

pub mod form;
pub mod model;
pub mod validator;

pub use form::CreateSnippetForm;
pub use model::{Snippet, human_date};
pub use validator::{Validator, max_chars, not_blank, permitted_int};
