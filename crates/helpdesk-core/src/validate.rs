//! Field rules shared by the ticket, user and department forms.
//!
//! Lengths are counted in characters after trimming surrounding whitespace.

use crate::{
    error::ValidationError,
    model::{NewDepartment, NewTicket, NewUser},
};

pub const SUBJECT_MIN: usize = 5;
pub const SUBJECT_MAX: usize = 200;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 4000;
pub const COMMENT_MAX: usize = 2000;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const FULL_NAME_MAX: usize = 100;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 64;
const DEPARTMENT_CODE_MIN: usize = 2;
const DEPARTMENT_CODE_MAX: usize = 32;
const DEPARTMENT_NAME_MIN: usize = 2;
const DEPARTMENT_NAME_MAX: usize = 128;
const DEPARTMENT_DESCRIPTION_MAX: usize = 512;

/// Trims `value` and checks it is non-empty and within `min..=max` characters.
pub fn required_text(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        return Err(ValidationError::Required { field });
    }
    if len < min {
        return Err(ValidationError::TooShort { field, min });
    }
    if len > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

/// Trims `value`; blank input becomes `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    let Some(trimmed) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(Some(trimmed.to_string()))
}

pub fn subject(value: &str) -> Result<String, ValidationError> {
    required_text("subject", value, SUBJECT_MIN, SUBJECT_MAX)
}

pub fn description(value: &str) -> Result<String, ValidationError> {
    required_text("description", value, DESCRIPTION_MIN, DESCRIPTION_MAX)
}

pub fn comment(value: &str) -> Result<String, ValidationError> {
    required_text("content", value, 1, COMMENT_MAX)
}

/// Checks a ticket creation request, returning it with trimmed text.
pub fn new_ticket(ticket: &NewTicket) -> Result<NewTicket, ValidationError> {
    Ok(NewTicket {
        subject: subject(&ticket.subject)?,
        description: description(&ticket.description)?,
        priority: ticket.priority,
        category: ticket.category,
    })
}

/// Minimal shape check: one `@` with a non-empty local part and a dotted
/// domain. The server performs the authoritative check.
pub fn email(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field: "email" });
    }
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !trimmed.contains(char::is_whitespace)
                && domain
                    .split('.')
                    .filter(|label| !label.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "email",
            message: "must be a valid email address",
        })
    }
}

/// 8-64 characters with at least one lowercase, uppercase, digit and special
/// character.
pub fn password(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 {
        return Err(ValidationError::Required { field });
    }
    let complex = value.chars().any(char::is_lowercase)
        && value.chars().any(char::is_uppercase)
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| !c.is_alphanumeric());
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) || !complex {
        return Err(ValidationError::InvalidFormat {
            field,
            message: "must be 8-64 characters and include upper, lower, digit, and special character",
        });
    }
    Ok(())
}

pub fn new_user(user: NewUser) -> Result<NewUser, ValidationError> {
    let username = required_text("username", &user.username, USERNAME_MIN, USERNAME_MAX)?;
    let email = email(&user.email)?;
    let full_name = required_text("fullName", &user.full_name, 1, FULL_NAME_MAX)?;
    if let Some(temp) = user.temp_password.as_deref() {
        password("tempPassword", temp)?;
    }
    Ok(NewUser {
        username,
        email,
        full_name,
        ..user
    })
}

pub fn full_name(value: &str) -> Result<String, ValidationError> {
    required_text("fullName", value, 1, FULL_NAME_MAX)
}

/// Department codes are 2-32 characters from `[A-Za-z0-9_-]`.
pub fn department_code(value: &str) -> Result<String, ValidationError> {
    let code = required_text("code", value, DEPARTMENT_CODE_MIN, DEPARTMENT_CODE_MAX)?;
    if code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(code)
    } else {
        Err(ValidationError::InvalidFormat {
            field: "code",
            message: "may only contain letters, numbers, underscore and hyphen",
        })
    }
}

pub fn department_name(value: &str) -> Result<String, ValidationError> {
    required_text("name", value, DEPARTMENT_NAME_MIN, DEPARTMENT_NAME_MAX)
}

pub fn department_description(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    optional_text("description", value, DEPARTMENT_DESCRIPTION_MAX)
}

pub fn new_department(department: &NewDepartment) -> Result<NewDepartment, ValidationError> {
    Ok(NewDepartment {
        code: department_code(&department.code)?,
        name: department_name(&department.name)?,
        description: department_description(department.description.as_deref())?,
        active: department.active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, Role, TicketCategory};

    #[test]
    fn test_required_text_trims_and_bounds() {
        assert_eq!(subject("  Laptop dead  ").unwrap(), "Laptop dead");
        assert_eq!(
            subject("   ").unwrap_err(),
            ValidationError::Required { field: "subject" }
        );
        assert_eq!(
            subject("abc").unwrap_err(),
            ValidationError::TooShort {
                field: "subject",
                min: SUBJECT_MIN
            }
        );
        assert_eq!(
            subject(&"s".repeat(SUBJECT_MAX + 1)).unwrap_err(),
            ValidationError::TooLong {
                field: "subject",
                max: SUBJECT_MAX
            }
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let accented = "é".repeat(SUBJECT_MAX);
        assert!(subject(&accented).is_ok());
    }

    #[test]
    fn test_optional_text_treats_blank_as_absent() {
        assert_eq!(optional_text("note", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("note", None, 10).unwrap(), None);
        assert_eq!(
            optional_text("note", Some(" hi "), 10).unwrap().as_deref(),
            Some("hi")
        );
    }

    #[test]
    fn test_new_ticket_returns_trimmed_copy() {
        let ticket = new_ticket(&NewTicket {
            subject: " Monitor flickers ".to_string(),
            description: " Flickers every few seconds ".to_string(),
            priority: Priority::Low,
            category: TicketCategory::Hardware,
        })
        .unwrap();

        assert_eq!(ticket.subject, "Monitor flickers");
        assert_eq!(ticket.description, "Flickers every few seconds");
    }

    #[test]
    fn test_email_shape() {
        assert!(email("ana@example.com").is_ok());
        assert!(email("ana@localhost").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("ana@@example.com").is_err());
        assert!(email("ana example@example.com").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(password("newPassword", "Str0ng!pass").is_ok());
        assert!(password("newPassword", "weakpass").is_err());
        assert!(password("newPassword", "NoDigits!!").is_err());
        assert!(password("newPassword", "Sh0rt!").is_err());
        assert_eq!(
            password("newPassword", "").unwrap_err(),
            ValidationError::Required {
                field: "newPassword"
            }
        );
    }

    #[test]
    fn test_new_user_checks_temp_password_only_when_given() {
        let user = NewUser {
            username: " agent7 ".to_string(),
            email: "agent7@example.com".to_string(),
            full_name: "Agent Seven".to_string(),
            role: Role::Agent,
            department_id: None,
            active: None,
            temp_password: None,
        };
        assert_eq!(new_user(user.clone()).unwrap().username, "agent7");

        let weak = NewUser {
            temp_password: Some("password".to_string()),
            ..user
        };
        assert!(new_user(weak).is_err());
    }

    #[test]
    fn test_department_code_charset() {
        assert_eq!(department_code(" IT-ops_2 ").unwrap(), "IT-ops_2");
        assert!(department_code("I").is_err());
        assert!(department_code("IT ops").is_err());
        assert!(department_code(&"A".repeat(33)).is_err());
    }
}
