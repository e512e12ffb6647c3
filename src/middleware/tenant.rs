use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::checkout::CheckoutContext;
use crate::error::AppError;

pub const BUSINESS_ID_HEADER: &str = "x-business-id";
pub const STORE_ID_HEADER: &str = "x-store-id";
pub const STAFF_ID_HEADER: &str = "x-staff-id";

/// Identity the fronting platform attaches to every request after it has
/// authenticated the operator and resolved the tenant. This service trusts
/// the headers; it performs no credential checks of its own.
#[derive(Debug, Clone)]
pub struct StaffContext {
    pub staff_id: Uuid,
    pub business_id: Uuid,
    pub store_id: Uuid,
}

impl StaffContext {
    pub fn checkout_context(&self) -> CheckoutContext {
        CheckoutContext {
            business_id: self.business_id,
            store_id: self.store_id,
            created_by: self.staff_id,
        }
    }
}

fn header_uuid(parts: &Parts, name: &str) -> Result<Uuid, AppError> {
    let value = parts
        .headers
        .get(name)
        .ok_or_else(|| AppError::BadRequest(format!("Missing {name} header")))?;

    let value = value
        .to_str()
        .map_err(|_| AppError::BadRequest(format!("Invalid {name} header")))?;

    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::BadRequest(format!("Invalid {name} header")))
}

impl<S> FromRequestParts<S> for StaffContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(StaffContext {
            staff_id: header_uuid(parts, STAFF_ID_HEADER)?,
            business_id: header_uuid(parts, BUSINESS_ID_HEADER)?,
            store_id: header_uuid(parts, STORE_ID_HEADER)?,
        })
    }
}
