//! Reporting query layer with mandatory event scoping.
//!
//! All aggregate queries for organizer-scoped data MUST go through this
//! module and take the resolved event-id scope explicitly, so a handler can
//! never accidentally widen an organizer's report past their own events.
//! Global (platform-wide) aggregates are separate, unscoped functions used
//! only by the admin report.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::activity::{
    ActivityEntry, KIND_EVENT_CREATED, KIND_PAYMENT_COMPLETED, KIND_RESERVATION_MADE,
    KIND_USER_REGISTERED,
};
use crate::models::{User, PAYMENT_COMPLETED};

/// Cheap connectivity check, used before any report work starts.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

// ==================== Scope resolution ====================

/// All event ids on the platform, ordered by event date.
pub async fn all_event_ids(pool: &PgPool) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM events ORDER BY date")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Event ids owned by one organizer, ordered by event date.
pub async fn event_ids_for_organizer(
    pool: &PgPool,
    organizer_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT id FROM events WHERE organizer_id = $1 ORDER BY date")
            .bind(organizer_id)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

// ==================== Global aggregates (admin report) ====================

pub async fn count_users(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_events(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_reservations(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reservations")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_tickets(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tickets")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Platform-wide revenue: every completed payment counts.
pub async fn sum_revenue(pool: &PgPool) -> Result<Decimal, sqlx::Error> {
    let (total,): (Decimal,) =
        sqlx::query_as("SELECT COALESCE(SUM(amount), 0) FROM payments WHERE status = $1")
            .bind(PAYMENT_COMPLETED)
            .fetch_one(pool)
            .await?;
    Ok(total)
}

/// User counts grouped by role, largest group first.
pub async fn users_by_role(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT role, COUNT(*) FROM users GROUP BY role ORDER BY COUNT(*) DESC, role",
    )
    .fetch_all(pool)
    .await
}

/// Number of distinct event creation timestamps over the trailing six
/// months.
///
/// TODO: group by date_trunc('month', created_at) so this becomes a real
/// monthly bucket count instead of one bucket per insert timestamp.
pub async fn events_created_by_month(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(DISTINCT created_at)
        FROM events
        WHERE created_at >= NOW() - INTERVAL '6 months'
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}

// ==================== Scoped aggregates (organizer report) ====================

/// Tickets belonging to any in-scope event.
pub async fn count_tickets_for_events(
    pool: &PgPool,
    scope: &[Uuid],
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM tickets WHERE event_id = ANY($1)")
            .bind(scope)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Distinct non-null reservation ids among in-scope tickets.
pub async fn count_distinct_reservations_for_events(
    pool: &PgPool,
    scope: &[Uuid],
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(DISTINCT reservation_id)
        FROM tickets
        WHERE event_id = ANY($1) AND reservation_id IS NOT NULL
        "#,
    )
    .bind(scope)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Completed payments whose reservation holds at least one in-scope ticket.
/// The whole payment amount counts, even when the reservation spans events
/// outside the scope.
pub async fn sum_revenue_for_events(
    pool: &PgPool,
    scope: &[Uuid],
) -> Result<Decimal, sqlx::Error> {
    let (total,): (Decimal,) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(p.amount), 0)
        FROM payments p
        WHERE p.status = $2
          AND EXISTS (
              SELECT 1 FROM tickets t
              WHERE t.reservation_id = p.reservation_id AND t.event_id = ANY($1)
          )
        "#,
    )
    .bind(scope)
    .bind(PAYMENT_COMPLETED)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

// ==================== Per-event performance ====================

#[derive(Debug, Clone)]
pub struct EventPerformance {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub total_tickets: i64,
    pub sold_tickets: i64,
    pub revenue: Decimal,
    pub conversion_rate: f64,
}

/// Conversion rate in percent: distinct reservations over total tickets.
/// An event with no tickets converts at 0, not NaN.
pub fn conversion_rate(reservations: i64, tickets: i64) -> f64 {
    if tickets == 0 {
        0.0
    } else {
        reservations as f64 / tickets as f64 * 100.0
    }
}

/// One row per in-scope event: its ticket count, its distinct reservation
/// count, and its own completed-payment revenue.
pub async fn event_performance_for_events(
    pool: &PgPool,
    scope: &[Uuid],
) -> Result<Vec<EventPerformance>, sqlx::Error> {
    let rows: Vec<(Uuid, String, DateTime<Utc>, i64, i64, Decimal)> = sqlx::query_as(
        r#"
        SELECT e.id, e.title, e.date,
               COUNT(t.id) AS total_tickets,
               COUNT(DISTINCT t.reservation_id) AS sold_tickets,
               COALESCE((
                   SELECT SUM(p.amount)
                   FROM payments p
                   WHERE p.status = $2
                     AND EXISTS (
                         SELECT 1 FROM tickets t2
                         WHERE t2.reservation_id = p.reservation_id
                           AND t2.event_id = e.id
                     )
               ), 0) AS revenue
        FROM events e
        LEFT JOIN tickets t ON t.event_id = e.id
        WHERE e.id = ANY($1)
        GROUP BY e.id, e.title, e.date
        ORDER BY e.date
        "#,
    )
    .bind(scope)
    .bind(PAYMENT_COMPLETED)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, title, date, total_tickets, sold_tickets, revenue)| EventPerformance {
            id,
            title,
            date,
            total_tickets,
            sold_tickets,
            revenue,
            conversion_rate: conversion_rate(sold_tickets, total_tickets),
        })
        .collect())
}

/// In-scope events with their organizer's display name, for the organizer
/// report's event listing.
#[derive(Debug, Clone)]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub organizer: String,
}

pub async fn events_with_organizer(
    pool: &PgPool,
    scope: &[Uuid],
) -> Result<Vec<EventSummary>, sqlx::Error> {
    let rows: Vec<(Uuid, String, Option<String>, DateTime<Utc>, DateTime<Utc>, String)> =
        sqlx::query_as(
            r#"
            SELECT e.id, e.title, e.description, e.date, e.created_at, u.name
            FROM events e
            JOIN users u ON u.id = e.organizer_id
            WHERE e.id = ANY($1)
            ORDER BY e.date
            "#,
        )
        .bind(scope)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, title, description, date, created_at, organizer)| EventSummary {
            id,
            title,
            description,
            date,
            created_at,
            organizer,
        })
        .collect())
}

// ==================== Activity sources ====================

/// Render a payment amount for feed descriptions, always two decimals.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.to_f64().unwrap_or(0.0))
}

/// Plain-number view of a revenue total for the JSON boundary.
pub fn revenue_to_f64(total: Decimal) -> f64 {
    total.to_f64().unwrap_or(0.0)
}

/// Latest user registrations (admin feed).
pub async fn recent_user_registrations(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let users: Vec<User> = sqlx::query_as(
        "SELECT id, name, email, role, created_at FROM users ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(users
        .into_iter()
        .map(|user| {
            ActivityEntry::new(
                KIND_USER_REGISTERED,
                user.id,
                format!("New user registered: {} ({})", user.name, user.email),
                user.created_at,
            )
        })
        .collect())
}

/// Latest created events (admin feed), optionally narrowed to one
/// organizer.
pub async fn recent_event_creations(
    pool: &PgPool,
    organizer_id: Option<Uuid>,
    limit: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let rows: Vec<(Uuid, String, String, DateTime<Utc>)> = if let Some(organizer_id) = organizer_id
    {
        sqlx::query_as(
            r#"
            SELECT e.id, e.title, u.name, e.created_at
            FROM events e
            JOIN users u ON u.id = e.organizer_id
            WHERE e.organizer_id = $1
            ORDER BY e.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(organizer_id)
        .bind(limit)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as(
            r#"
            SELECT e.id, e.title, u.name, e.created_at
            FROM events e
            JOIN users u ON u.id = e.organizer_id
            ORDER BY e.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?
    };

    Ok(rows
        .into_iter()
        .map(|(id, title, organizer, created_at)| {
            ActivityEntry::new(
                KIND_EVENT_CREATED,
                id,
                format!("New event created: {} by {}", title, organizer),
                created_at,
            )
        })
        .collect())
}

fn reservation_entry(
    id: Uuid,
    user_name: String,
    event_title: Option<String>,
    created_at: DateTime<Utc>,
) -> ActivityEntry {
    let title = event_title.unwrap_or_else(|| "an event".to_string());
    ActivityEntry::new(
        KIND_RESERVATION_MADE,
        id,
        format!("New reservation by {} for {}", user_name, title),
        created_at,
    )
}

/// Latest reservations platform-wide (admin feed). The shown event title is
/// the first ticket's event, arbitrary tie-break when a reservation spans
/// several events.
pub async fn recent_reservations(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let rows: Vec<(Uuid, String, Option<String>, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT r.id, u.name,
               (SELECT e.title
                FROM tickets t
                JOIN events e ON e.id = t.event_id
                WHERE t.reservation_id = r.id
                LIMIT 1) AS event_title,
               r.created_at
        FROM reservations r
        JOIN users u ON u.id = r.user_id
        ORDER BY r.created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, title, created_at)| reservation_entry(id, name, title, created_at))
        .collect())
}

/// Latest reservations holding at least one in-scope ticket (organizer
/// feed). The shown title is restricted to in-scope events.
pub async fn recent_reservations_for_events(
    pool: &PgPool,
    scope: &[Uuid],
    limit: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let rows: Vec<(Uuid, String, Option<String>, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT r.id, u.name,
               (SELECT e.title
                FROM tickets t
                JOIN events e ON e.id = t.event_id
                WHERE t.reservation_id = r.id AND t.event_id = ANY($1)
                LIMIT 1) AS event_title,
               r.created_at
        FROM reservations r
        JOIN users u ON u.id = r.user_id
        WHERE EXISTS (
            SELECT 1 FROM tickets t
            WHERE t.reservation_id = r.id AND t.event_id = ANY($1)
        )
        ORDER BY r.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(scope)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, title, created_at)| reservation_entry(id, name, title, created_at))
        .collect())
}

fn payment_entry(
    id: Uuid,
    amount: Decimal,
    event_title: Option<String>,
    created_at: DateTime<Utc>,
) -> ActivityEntry {
    let title = event_title.unwrap_or_else(|| "an event".to_string());
    ActivityEntry::new(
        KIND_PAYMENT_COMPLETED,
        id,
        format!("Payment of {} completed for {}", format_amount(amount), title),
        created_at,
    )
}

/// Latest completed payments platform-wide (admin feed).
pub async fn recent_completed_payments(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let rows: Vec<(Uuid, Decimal, Option<String>, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT p.id, p.amount,
               (SELECT e.title
                FROM tickets t
                JOIN events e ON e.id = t.event_id
                WHERE t.reservation_id = p.reservation_id
                LIMIT 1) AS event_title,
               p.created_at
        FROM payments p
        WHERE p.status = $1
        ORDER BY p.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(PAYMENT_COMPLETED)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, amount, title, created_at)| payment_entry(id, amount, title, created_at))
        .collect())
}

/// Latest completed payments tied to in-scope events (organizer feed).
///
/// One hand-written round trip rather than per-payment lookups: the scope
/// is a dynamic event-id list, and the EXISTS clause does all the scoping.
pub async fn recent_completed_payments_for_events(
    pool: &PgPool,
    scope: &[Uuid],
    limit: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let rows: Vec<(Uuid, Decimal, Option<String>, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT p.id, p.amount,
               (SELECT e.title
                FROM tickets t
                JOIN events e ON e.id = t.event_id
                WHERE t.reservation_id = p.reservation_id AND t.event_id = ANY($1)
                LIMIT 1) AS event_title,
               p.created_at
        FROM payments p
        WHERE p.status = $3
          AND EXISTS (
              SELECT 1 FROM tickets t
              WHERE t.reservation_id = p.reservation_id AND t.event_id = ANY($1)
          )
        ORDER BY p.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(scope)
    .bind(limit)
    .bind(PAYMENT_COMPLETED)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, amount, title, created_at)| payment_entry(id, amount, title, created_at))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn conversion_rate_is_percent_of_tickets() {
        assert_eq!(conversion_rate(1, 2), 50.0);
        assert_eq!(conversion_rate(3, 3), 100.0);
        assert_eq!(conversion_rate(0, 5), 0.0);
    }

    #[test]
    fn conversion_rate_handles_zero_tickets() {
        assert_eq!(conversion_rate(0, 0), 0.0);
    }

    #[test]
    fn amount_formatting_keeps_two_decimals() {
        assert_eq!(format_amount(dec!(25)), "25.00");
        assert_eq!(format_amount(dec!(19.5)), "19.50");
        assert_eq!(format_amount(dec!(0.009)), "0.01");
    }

    #[test]
    fn revenue_converts_to_plain_number() {
        assert_eq!(revenue_to_f64(dec!(25.00)), 25.0);
        assert_eq!(revenue_to_f64(dec!(0)), 0.0);
    }
}
