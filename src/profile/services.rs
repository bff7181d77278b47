use time::{macros::format_description, Date};

use super::dto::UpdateProfileRequest;
use super::repo::ProfileChanges;
use crate::auth::services::{hash_password, is_valid_email, verify_password};
use crate::error::{AppError, AppResult};

/// Whole years between `birth` and `today`, counting a year only once the
/// birthday has been reached.
pub fn age_on(birth: Date, today: Date) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month() as u8, today.day()) < (birth.month() as u8, birth.day()) {
        age -= 1;
    }
    age
}

pub fn parse_birth_date(raw: &str) -> AppResult<Date> {
    // accept full ISO timestamps as sent by date pickers, keep the date part
    let date_part = raw.trim().get(..10).unwrap_or(raw.trim());
    Date::parse(date_part, format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::validation("birthDate must be YYYY-MM-DD"))
}

fn provided(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Turns a profile update into column changes. A new password needs the
/// current one; blank fields are ignored.
pub fn plan_changes(req: UpdateProfileRequest, current_hash: &str) -> AppResult<ProfileChanges> {
    let password_hash = match req.new_password.filter(|p| !p.is_empty()) {
        None => None,
        Some(new_password) => {
            let old = req
                .old_password
                .filter(|p| !p.is_empty())
                .ok_or_else(|| AppError::validation("Old password is required"))?;
            if !verify_password(&old, current_hash)? {
                return Err(AppError::validation("Old password is incorrect"));
            }
            Some(hash_password(&new_password)?)
        }
    };

    let email = provided(req.email).map(|e| e.to_lowercase());
    if let Some(email) = &email {
        if !is_valid_email(email) {
            return Err(AppError::validation("Invalid email"));
        }
    }

    Ok(ProfileChanges {
        username: provided(req.username),
        email,
        phone: provided(req.phone),
        birth_date: provided(req.birth_date)
            .map(|d| parse_birth_date(&d))
            .transpose()?,
        password_hash,
    })
}
