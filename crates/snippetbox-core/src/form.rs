// ABOUTME: Typed form records decoded from POST bodies, each carrying its own Validator.
// ABOUTME: Holds the validation rules for creating a snippet.

use serde::Deserialize;

use crate::validator::{Validator, max_chars, not_blank, permitted_int};

/// Expiry choices (in days) offered by the create form.
pub const PERMITTED_EXPIRY_DAYS: [i64; 3] = [1, 7, 365];

pub const TITLE_MAX_CHARS: usize = 100;

/// Form data for creating a snippet. Missing fields decode to their zero values
/// and are then caught by validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateSnippetForm {
    pub title: String,
    pub content: String,
    pub expires: i64,
    #[serde(skip)]
    pub validator: Validator,
}

impl CreateSnippetForm {
    /// A blank form as first shown to the user, with a one-year expiry preselected.
    pub fn new() -> Self {
        Self {
            expires: 365,
            ..Self::default()
        }
    }

    /// Run every field check and report whether the form is valid.
    pub fn validate(&mut self) -> bool {
        self.validator.check_field(
            not_blank(&self.title),
            "title",
            "This field cannot be blank",
        );
        self.validator.check_field(
            max_chars(&self.title, TITLE_MAX_CHARS),
            "title",
            "This field cannot be more than 100 characters long",
        );
        self.validator.check_field(
            not_blank(&self.content),
            "content",
            "This field cannot be blank",
        );
        self.validator.check_field(
            permitted_int(self.expires, &PERMITTED_EXPIRY_DAYS),
            "expires",
            "This field must equal 1, 7 or 365",
        );

        self.validator.valid()
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.validator.field_error(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, content: &str, expires: i64) -> CreateSnippetForm {
        CreateSnippetForm {
            title: title.to_string(),
            content: content.to_string(),
            expires,
            validator: Validator::new(),
        }
    }

    #[test]
    fn new_form_defaults_to_one_year() {
        let f = CreateSnippetForm::new();
        assert_eq!(f.expires, 365);
        assert!(f.title.is_empty());
        assert!(f.validator.valid());
    }

    #[test]
    fn valid_form_passes() {
        let mut f = form("O snail", "Climb Mount Fuji", 7);
        assert!(f.validate());
        assert!(f.validator.field_errors().is_empty());
    }

    #[test]
    fn blank_fields_are_reported() {
        let mut f = form("  ", "", 1);
        assert!(!f.validate());
        assert_eq!(f.field_error("title"), Some("This field cannot be blank"));
        assert_eq!(f.field_error("content"), Some("This field cannot be blank"));
        assert_eq!(f.field_error("expires"), None);
    }

    #[test]
    fn blank_title_reports_blank_not_length() {
        let mut f = form("", "body", 1);
        f.validate();
        assert_eq!(f.field_error("title"), Some("This field cannot be blank"));
    }

    #[test]
    fn long_title_is_reported() {
        let mut f = form(&"x".repeat(101), "body", 365);
        assert!(!f.validate());
        assert_eq!(
            f.field_error("title"),
            Some("This field cannot be more than 100 characters long")
        );
    }

    #[test]
    fn multibyte_title_at_limit_is_accepted() {
        let mut f = form(&"é".repeat(100), "body", 365);
        assert!(f.validate());
    }

    #[test]
    fn unsupported_expiry_is_reported() {
        for days in [0, 2, 30, -7] {
            let mut f = form("title", "body", days);
            assert!(!f.validate(), "{days} should be rejected");
            assert_eq!(
                f.field_error("expires"),
                Some("This field must equal 1, 7 or 365")
            );
        }
    }
}
