//! Input shapes and their validation. One explicit validation function per
//! shape, shared by the form-posting web surface and the JSON API.

use serde::Deserialize;

use crate::domain::error::FieldError;
use crate::domain::user::NewAccount;

pub const TITLE_MAX_LEN: usize = 50;
pub const USERNAME_MAX_LEN: usize = 30;
pub const NAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub repassword: String,
}

impl SignupForm {
    pub fn into_account(self) -> NewAccount {
        NewAccount {
            username: self.username.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub fn validate_post(title: &str, content: &str) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    check_title(title, &mut errors);
    check_content(content, &mut errors);
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Partial-update variant: absent fields stay untouched, present fields
/// follow the same rules as creation.
pub fn validate_post_patch(
    title: Option<&str>,
    content: Option<&str>,
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    if let Some(title) = title {
        check_title(title, &mut errors);
    }
    if let Some(content) = content {
        check_content(content, &mut errors);
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn validate_signup(form: &SignupForm) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    let username = form.username.trim();
    if username.is_empty() {
        errors.push(FieldError::new("username", "username is required"));
    } else if username.chars().count() > USERNAME_MAX_LEN {
        errors.push(FieldError::new(
            "username",
            format!("username must be at most {} characters", USERNAME_MAX_LEN),
        ));
    }

    for (field, value) in [
        ("first_name", &form.first_name),
        ("last_name", &form.last_name),
    ] {
        if value.trim().chars().count() > NAME_MAX_LEN {
            errors.push(FieldError::new(
                field,
                format!("must be at most {} characters", NAME_MAX_LEN),
            ));
        }
    }

    let email = form.email.trim();
    if email.is_empty() {
        errors.push(FieldError::new("email", "email is required"));
    } else if !looks_like_email(email) || email.chars().count() > EMAIL_MAX_LEN {
        errors.push(FieldError::new("email", "enter a valid email address"));
    }

    if form.password.chars().count() < PASSWORD_MIN_LEN {
        errors.push(FieldError::new(
            "password",
            format!("password must be at least {} characters", PASSWORD_MIN_LEN),
        ));
    }
    if form.password != form.repassword {
        errors.push(FieldError::new("repassword", "passwords don't match"));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn validate_login(form: &LoginForm) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    if form.username.trim().is_empty() {
        errors.push(FieldError::new("username", "username is required"));
    }
    if form.password.is_empty() {
        errors.push(FieldError::new("password", "password is required"));
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    let title = title.trim();
    if title.is_empty() {
        errors.push(FieldError::new("title", "title is required"));
    } else if title.chars().count() > TITLE_MAX_LEN {
        errors.push(FieldError::new(
            "title",
            format!("title must be at most {} characters", TITLE_MAX_LEN),
        ));
    }
}

fn check_content(content: &str, errors: &mut Vec<FieldError>) {
    if content.trim().is_empty() {
        errors.push(FieldError::new("content", "content is required"));
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_names(errors: Vec<FieldError>) -> Vec<&'static str> {
        errors.into_iter().map(|e| e.field).collect()
    }

    #[test]
    fn post_title_boundary() {
        assert!(validate_post(&"x".repeat(50), "body").is_ok());
        let errors = validate_post(&"x".repeat(51), "body").unwrap_err();
        assert_eq!(field_names(errors), vec!["title"]);
    }

    #[test]
    fn post_requires_title_and_content() {
        let errors = validate_post("   ", "").unwrap_err();
        assert_eq!(field_names(errors), vec!["title", "content"]);
    }

    #[test]
    fn patch_validates_only_present_fields() {
        assert!(validate_post_patch(None, None).is_ok());
        assert!(validate_post_patch(Some("ok"), None).is_ok());
        let errors = validate_post_patch(Some(""), Some("body")).unwrap_err();
        assert_eq!(field_names(errors), vec!["title"]);
    }

    fn signup() -> SignupForm {
        SignupForm {
            username: "ada".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "analytical".into(),
            repassword: "analytical".into(),
        }
    }

    #[test]
    fn signup_accepts_valid_input() {
        assert!(validate_signup(&signup()).is_ok());
    }

    #[test]
    fn signup_rejects_password_mismatch() {
        let mut form = signup();
        form.repassword = "different".into();
        let errors = validate_signup(&form).unwrap_err();
        assert_eq!(field_names(errors), vec!["repassword"]);
    }

    #[test]
    fn signup_rejects_short_password() {
        let mut form = signup();
        form.password = "short".into();
        form.repassword = "short".into();
        let errors = validate_signup(&form).unwrap_err();
        assert_eq!(field_names(errors), vec!["password"]);
    }

    #[test]
    fn signup_rejects_long_username() {
        let mut form = signup();
        form.username = "u".repeat(31);
        let errors = validate_signup(&form).unwrap_err();
        assert_eq!(field_names(errors), vec!["username"]);
    }

    #[test]
    fn signup_rejects_bad_email() {
        for email in ["", "not-an-email", "a@b", "a@.com"] {
            let mut form = signup();
            form.email = email.into();
            let errors = validate_signup(&form).unwrap_err();
            assert_eq!(field_names(errors), vec!["email"], "email: {email:?}");
        }
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = validate_login(&LoginForm::default()).unwrap_err();
        assert_eq!(field_names(errors), vec!["username", "password"]);
    }
}
