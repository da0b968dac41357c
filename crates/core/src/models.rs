use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

// Role values as stored in users.role
pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_ORGANIZER: &str = "Organizer";

// Terminal success status on payments.status
pub const PAYMENT_COMPLETED: &str = "Completed";

// ==================== User ====================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

// Events, tickets, reservations, and payments are only ever read through
// report-shaped projections (see reporting.rs), so they get no full row
// structs here.
