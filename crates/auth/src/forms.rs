//! Login and registration form rules.
//!
//! Raw submissions (`*Request`) are deserialized straight from the HTML form
//! body; `validate()` turns them into checked values or a list of field errors.
//! Uniqueness against stored employees is not a form rule.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use validator::ValidateEmail;

use epm_core::{EmployeeNumber, ValidationErrors};

pub const MIN_USERNAME_LEN: usize = 10;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const PASSWORD_SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

const REQUIRED: &str = "This field is required.";

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s\-]+$").expect("name pattern is a valid regex"));

fn min_length_message(min: usize) -> String {
    format!("Field must be at least {min} characters long.")
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// HTML checkbox semantics: absent means unchecked.
fn checkbox(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes" | "y")
    )
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub remember: bool,
}

impl LoginRequest {
    pub fn validate(self) -> Result<LoginForm, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if is_blank(&self.username) {
            errors.push("username", REQUIRED);
        } else if self.username.chars().count() < MIN_USERNAME_LEN {
            errors.push("username", min_length_message(MIN_USERNAME_LEN));
        }

        if self.password.is_empty() {
            errors.push("password", REQUIRED);
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push("password", min_length_message(MIN_PASSWORD_LEN));
        }

        let remember = checkbox(self.remember.as_deref());
        errors.into_result(LoginForm {
            username: self.username,
            password: self.password,
            remember,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub employee_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub employee_number: EmployeeNumber,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// First failing password complexity rule, if any.
pub fn password_complexity_error(password: &str) -> Option<&'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Some("Password must be at least 8 characters long.");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Some("Password must contain at least one uppercase letter.");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Some("Password must contain at least one lowercase letter.");
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARACTERS.contains(c)) {
        return Some("Password must contain at least one special character.");
    }
    None
}

impl RegistrationRequest {
    pub fn validate(self) -> Result<RegistrationForm, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.push("name", REQUIRED);
        } else if !NAME_PATTERN.is_match(&name) {
            errors.push("name", "Name must contain only letters.");
        }

        let employee_number = if is_blank(&self.employee_number) {
            errors.push("employee_number", REQUIRED);
            None
        } else {
            match self.employee_number.trim().parse::<i64>() {
                Ok(v) if v > 0 => Some(EmployeeNumber::new(v)),
                Ok(_) => {
                    errors.push("employee_number", "Employee number must be a positive integer.");
                    None
                }
                Err(_) => {
                    errors.push("employee_number", "Not a valid integer value.");
                    None
                }
            }
        };

        let email = self.email.trim().to_string();
        if email.is_empty() {
            errors.push("email", REQUIRED);
        } else if !email.validate_email() {
            errors.push("email", "Invalid email address.");
        }

        let username = self.username.trim().to_string();
        if username.is_empty() {
            errors.push("username", REQUIRED);
        } else if username.chars().count() < MIN_USERNAME_LEN {
            errors.push("username", min_length_message(MIN_USERNAME_LEN));
        }

        if self.password.is_empty() {
            errors.push("password", REQUIRED);
        } else if let Some(message) = password_complexity_error(&self.password) {
            errors.push("password", message);
        }

        match employee_number {
            Some(employee_number) if errors.is_empty() => Ok(RegistrationForm {
                name,
                employee_number,
                email,
                username,
                password: self.password,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn registration() -> RegistrationRequest {
        RegistrationRequest {
            name: "Jane Smith-Jones".to_string(),
            employee_number: "202".to_string(),
            email: "jane@example.com".to_string(),
            username: "janesmith202".to_string(),
            password: "Password123!".to_string(),
        }
    }

    #[test]
    fn valid_login_form() {
        let form = LoginRequest {
            username: "validusername".to_string(),
            password: "Validpassword123!".to_string(),
            remember: Some("on".to_string()),
        }
        .validate()
        .unwrap();

        assert!(form.remember);
    }

    #[test]
    fn login_requires_minimum_lengths() {
        let errors = LoginRequest {
            username: "short".to_string(),
            password: "short".to_string(),
            remember: None,
        }
        .validate()
        .unwrap_err();

        assert_eq!(
            errors.for_field("username"),
            vec!["Field must be at least 10 characters long."]
        );
        assert_eq!(
            errors.for_field("password"),
            vec!["Field must be at least 8 characters long."]
        );
    }

    #[test]
    fn login_reports_missing_fields() {
        let errors = LoginRequest::default().validate().unwrap_err();
        assert_eq!(errors.for_field("username"), vec![REQUIRED]);
        assert_eq!(errors.for_field("password"), vec![REQUIRED]);
    }

    #[test]
    fn valid_registration_trims_text_fields() {
        let mut req = registration();
        req.email = "  jane@example.com ".to_string();

        let form = req.validate().unwrap();
        assert_eq!(form.email, "jane@example.com");
        assert_eq!(form.employee_number, EmployeeNumber::new(202));
    }

    #[test]
    fn registration_rejects_digits_in_name() {
        let mut req = registration();
        req.name = "Jane 2".to_string();

        let errors = req.validate().unwrap_err();
        assert_eq!(errors.for_field("name"), vec!["Name must contain only letters."]);
    }

    #[test]
    fn registration_rejects_malformed_email_and_number() {
        let mut req = registration();
        req.email = "not-an-email".to_string();
        req.employee_number = "twelve".to_string();

        let errors = req.validate().unwrap_err();
        assert_eq!(errors.for_field("email"), vec!["Invalid email address."]);
        assert_eq!(errors.for_field("employee_number"), vec!["Not a valid integer value."]);
    }

    #[test]
    fn registration_rejects_non_positive_number() {
        let mut req = registration();
        req.employee_number = "0".to_string();

        let errors = req.validate().unwrap_err();
        assert!(errors.has_field("employee_number"));
    }

    #[test]
    fn password_rules_report_first_failure() {
        assert_eq!(
            password_complexity_error("Sh0rt!"),
            Some("Password must be at least 8 characters long.")
        );
        assert_eq!(
            password_complexity_error("password123!"),
            Some("Password must contain at least one uppercase letter.")
        );
        assert_eq!(
            password_complexity_error("PASSWORD123!"),
            Some("Password must contain at least one lowercase letter.")
        );
        assert_eq!(
            password_complexity_error("Password123"),
            Some("Password must contain at least one special character.")
        );
        assert_eq!(password_complexity_error("Password123!"), None);
    }

    #[test]
    fn all_failing_fields_are_collected() {
        let errors = RegistrationRequest::default().validate().unwrap_err();
        for field in ["name", "employee_number", "email", "username", "password"] {
            assert!(errors.has_field(field), "missing error for {field}");
        }
    }

    proptest! {
        /// Property: a password containing each character class and at least
        /// eight characters always passes the complexity rules.
        #[test]
        fn complete_passwords_pass(
            upper in "[A-Z]{1,4}",
            lower in "[a-z]{1,4}",
            special in "[!@#$%^&*]{1,2}",
            digits in "[0-9]{5,8}",
        ) {
            let password = format!("{upper}{lower}{special}{digits}");
            prop_assert_eq!(password_complexity_error(&password), None);
        }

        /// Property: usernames shorter than ten characters never validate.
        #[test]
        fn short_usernames_fail(username in "[a-z]{1,9}") {
            let errors = LoginRequest {
                username,
                password: "Password123!".to_string(),
                remember: None,
            }
            .validate()
            .unwrap_err();
            prop_assert!(errors.has_field("username"));
        }
    }
}
