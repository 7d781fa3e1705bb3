use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};

use crate::errors::AppError;
use crate::state::AppState;

pub const MEMBER_ID_HEADER: &str = "x-member-id";
pub const MEMBER_NAME_HEADER: &str = "x-member-name";
pub const MEMBER_EMAIL_HEADER: &str = "x-member-email";

/// The authenticated caller, as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub member_id: String,
    pub display_name: String,
    pub email: String,
    pub is_admin: bool,
}

impl Caller {
    pub fn member(member_id: &str, display_name: &str, email: &str) -> Self {
        Caller {
            member_id: member_id.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            is_admin: false,
        }
    }

    pub fn admin(member_id: &str, display_name: &str, email: &str) -> Self {
        Caller {
            is_admin: true,
            ..Caller::member(member_id, display_name, email)
        }
    }
}

/// Case-insensitive match against the configured administrator address.
pub fn is_admin_email(admin_email: Option<&str>, email: &str) -> bool {
    match admin_email {
        Some(admin) if !admin.is_empty() => admin.eq_ignore_ascii_case(email.trim()),
        _ => false,
    }
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Identity headers are set by the authenticating proxy in front of the API.
impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(member_id) = header(req, MEMBER_ID_HEADER) else {
            return ready(Err(AppError::Unauthenticated));
        };
        let email = header(req, MEMBER_EMAIL_HEADER).unwrap_or_default();
        let display_name = header(req, MEMBER_NAME_HEADER).unwrap_or_else(|| "Member".to_string());

        let admin_email = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.config.admin_email.clone());
        let is_admin = is_admin_email(admin_email.as_deref(), &email);

        ready(Ok(Caller {
            member_id,
            display_name,
            email,
            is_admin,
        }))
    }
}

/// Returns Err(AppError) unless the caller is an administrator.
pub fn require_admin(caller: &Caller) -> Result<(), AppError> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(AppError::PermissionDenied("admin".to_string()))
    }
}
