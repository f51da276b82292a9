//! Input forms. Field-level rules live here; uniqueness and existence checks
//! need the database and happen in the services.

use std::borrow::Cow;

use poem_openapi::Object;
use validator::{Validate, ValidationError};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("required").with_message(Cow::Borrowed("This field is required.")))
    } else {
        Ok(())
    }
}

/// Usernames are stored trimmed, so the length rule applies to the trimmed text.
fn username_length(value: &str) -> Result<(), ValidationError> {
    if (2..=20).contains(&value.trim().chars().count()) {
        Ok(())
    } else {
        Err(ValidationError::new("length")
            .with_message(Cow::Borrowed("Username must be between 2 and 20 characters.")))
    }
}

#[derive(Clone, Debug, Object, Validate)]
#[oai(rename_all = "snake_case")]
pub struct RegisterForm {
    #[validate(custom(function = "username_length"))]
    pub username: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub confirm_password: String,
}

#[derive(Clone, Debug, Object, Validate)]
#[oai(rename_all = "snake_case")]
pub struct LoginForm {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    /// Keep the session alive for the long ("remember me") lifetime.
    #[oai(default)]
    pub remember: bool,
}

#[derive(Clone, Debug, Validate)]
pub struct ProfileForm {
    #[validate(custom(function = "username_length"))]
    pub username: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    pub bio: Option<String>,
}

#[derive(Clone, Debug, Object, Validate)]
#[oai(rename_all = "snake_case")]
pub struct PostForm {
    #[validate(custom(function = "not_blank"), length(max = 200, message = "Title is too long."))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub content: String,
    pub category_id: i32,
    /// Comma separated tag names.
    pub tags: Option<String>,
}

#[derive(Clone, Debug, Object, Validate)]
#[oai(rename_all = "snake_case")]
pub struct CommentForm {
    #[validate(custom(function = "not_blank"))]
    pub content: String,
    /// Comment being replied to, on the same post.
    pub parent_id: Option<i32>,
}

#[derive(Clone, Debug, Object, Validate)]
#[oai(rename_all = "snake_case")]
pub struct CategoryForm {
    #[validate(custom(function = "not_blank"), length(max = 50, message = "Name is too long."))]
    pub name: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldErrors;

    fn register(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn register_requires_matching_passwords() {
        assert!(register("pw", "pw").validate().is_ok());
        let errors = FieldErrors::from(register("pw", "other").validate().unwrap_err());
        assert!(errors.get("confirm_password").is_some());
    }

    #[test]
    fn register_checks_username_length_and_email() {
        let mut form = register("pw", "pw");
        form.username = "a".into();
        form.email = "not-an-email".into();
        let errors = FieldErrors::from(form.validate().unwrap_err());
        assert!(errors.get("username").is_some());
        assert!(errors.get("email").is_some());
    }

    #[test]
    fn username_length_ignores_surrounding_spaces() {
        let mut form = register("pw", "pw");
        form.username = "   ".into();
        assert!(FieldErrors::from(form.validate().unwrap_err()).get("username").is_some());
        form.username = "  a  ".into();
        assert!(form.validate().is_err());
        form.username = " ab ".into();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn blank_post_fields_are_rejected() {
        let form = PostForm { title: "   ".into(), content: "".into(), category_id: 1, tags: None };
        let errors = FieldErrors::from(form.validate().unwrap_err());
        assert_eq!(errors.get("title").unwrap(), ["This field is required."]);
        assert!(errors.get("content").is_some());
    }
}
