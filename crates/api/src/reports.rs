use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use tickethub_auth::{require_admin, require_organizer, AuthClaims};
use tickethub_core::activity::merge_feeds;
use tickethub_core::models::ROLE_ADMIN;
use tickethub_core::reporting;

use crate::error::ApiError;
use crate::AppState;

/// Per-source bound on the admin activity feed.
const ADMIN_FEED_SLICE: i64 = 3;
/// Per-source bound on the organizer activity feed.
const ORGANIZER_FEED_SLICE: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct AdminReportParams {
    pub organizer_id: Option<Uuid>,
}

/// The admin report accepts the organizer filter either as a query
/// parameter or as an x-organizer-id header; the parameter wins.
fn organizer_filter(params: &AdminReportParams, headers: &HeaderMap) -> Option<Uuid> {
    params.organizer_id.or_else(|| {
        headers
            .get("x-organizer-id")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
    })
}

/// Platform-wide statistics for administrators.
/// GET /api/reports/admin
pub async fn admin_report(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    Query(params): Query<AdminReportParams>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_admin(&claims)?;

    let pool = &state.pool;
    reporting::ping(pool)
        .await
        .map_err(|_| ApiError::DataStoreUnavailable)?;

    // Only narrows the recent-events feed, not the headline totals.
    let organizer_filter = organizer_filter(&params, &headers);

    // Headline counts degrade to 0 individually instead of failing the
    // whole report.
    let (total_users, total_events, total_reservations, total_tickets) = tokio::join!(
        reporting::count_users(pool),
        reporting::count_events(pool),
        reporting::count_reservations(pool),
        reporting::count_tickets(pool),
    );
    let total_users = total_users.unwrap_or_else(|e| {
        tracing::warn!("user count failed, defaulting to 0: {:?}", e);
        0
    });
    let total_events = total_events.unwrap_or_else(|e| {
        tracing::warn!("event count failed, defaulting to 0: {:?}", e);
        0
    });
    let total_reservations = total_reservations.unwrap_or_else(|e| {
        tracing::warn!("reservation count failed, defaulting to 0: {:?}", e);
        0
    });
    let total_tickets = total_tickets.unwrap_or_else(|e| {
        tracing::warn!("ticket count failed, defaulting to 0: {:?}", e);
        0
    });

    let (total_revenue, users_by_role, events_by_month) = tokio::try_join!(
        reporting::sum_revenue(pool),
        reporting::users_by_role(pool),
        reporting::events_created_by_month(pool),
    )?;

    let (users_feed, events_feed, reservations_feed, payments_feed) = tokio::try_join!(
        reporting::recent_user_registrations(pool, ADMIN_FEED_SLICE),
        reporting::recent_event_creations(pool, organizer_filter, ADMIN_FEED_SLICE),
        reporting::recent_reservations(pool, ADMIN_FEED_SLICE),
        reporting::recent_completed_payments(pool, ADMIN_FEED_SLICE),
    )?;

    let recent_activity = merge_feeds(vec![
        users_feed,
        events_feed,
        reservations_feed,
        payments_feed,
    ]);

    let users_by_role: Vec<Value> = users_by_role
        .into_iter()
        .map(|(role, count)| json!({ "role": role, "count": count }))
        .collect();

    let data = json!({
        "totalUsers": total_users,
        "totalEvents": total_events,
        "totalReservations": total_reservations,
        "totalTickets": total_tickets,
        "totalRevenue": reporting::revenue_to_f64(total_revenue),
        "recentActivity": recent_activity,
        "usersByRole": users_by_role,
        "eventsByMonth": events_by_month,
    });

    Ok(Json(json!({
        "data": data,
        "message": "Admin report generated successfully",
    })))
}

/// Per-organizer statistics; admins see all events.
/// GET /api/reports/organizer
pub async fn organizer_report(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
) -> Result<Json<Value>, ApiError> {
    let production = state.config.environment.is_production();
    organizer_report_inner(&state, &claims)
        .await
        .map_err(|err| if production { err.redacted() } else { err })
}

async fn organizer_report_inner(
    state: &AppState,
    claims: &AuthClaims,
) -> Result<Json<Value>, ApiError> {
    let caller = require_organizer(claims)?;

    let pool = &state.pool;
    reporting::ping(pool)
        .await
        .map_err(|_| ApiError::DataStoreUnavailable)?;

    let scope = if caller.role == ROLE_ADMIN {
        reporting::all_event_ids(pool).await?
    } else {
        reporting::event_ids_for_organizer(pool, caller.user_id).await?
    };
    let total_events = scope.len() as i64;

    let (total_tickets, total_reservations, total_revenue) = tokio::try_join!(
        reporting::count_tickets_for_events(pool, &scope),
        reporting::count_distinct_reservations_for_events(pool, &scope),
        reporting::sum_revenue_for_events(pool, &scope),
    )?;

    let (performance, events, reservations_feed, payments_feed) = tokio::try_join!(
        reporting::event_performance_for_events(pool, &scope),
        reporting::events_with_organizer(pool, &scope),
        reporting::recent_reservations_for_events(pool, &scope, ORGANIZER_FEED_SLICE),
        reporting::recent_completed_payments_for_events(pool, &scope, ORGANIZER_FEED_SLICE),
    )?;

    let recent_activity = merge_feeds(vec![reservations_feed, payments_feed]);

    let event_performance: Vec<Value> = performance
        .into_iter()
        .map(|p| {
            json!({
                "id": p.id,
                "title": p.title,
                "date": p.date,
                "totalTickets": p.total_tickets,
                "soldTickets": p.sold_tickets,
                "revenue": reporting::revenue_to_f64(p.revenue),
                "conversionRate": p.conversion_rate,
            })
        })
        .collect();

    let events: Vec<Value> = events
        .into_iter()
        .map(|e| {
            json!({
                "id": e.id,
                "title": e.title,
                "description": e.description,
                "date": e.date,
                "createdAt": e.created_at,
                "organizer": e.organizer,
            })
        })
        .collect();

    let data = json!({
        "totalEvents": total_events,
        "totalTickets": total_tickets,
        "totalReservations": total_reservations,
        "totalRevenue": reporting::revenue_to_f64(total_revenue),
        "recentActivity": recent_activity,
        "eventPerformance": event_performance,
        "events": events,
    });

    Ok(Json(json!({
        "data": data,
        "message": "Organizer report generated successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn filter_prefers_query_parameter() {
        let from_query = Uuid::new_v4();
        let from_header = Uuid::new_v4();
        let params = AdminReportParams {
            organizer_id: Some(from_query),
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-organizer-id",
            HeaderValue::from_str(&from_header.to_string()).unwrap(),
        );
        assert_eq!(organizer_filter(&params, &headers), Some(from_query));
    }

    #[test]
    fn filter_falls_back_to_header() {
        let from_header = Uuid::new_v4();
        let params = AdminReportParams { organizer_id: None };
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-organizer-id",
            HeaderValue::from_str(&from_header.to_string()).unwrap(),
        );
        assert_eq!(organizer_filter(&params, &headers), Some(from_header));
    }

    #[test]
    fn filter_ignores_garbage_header() {
        let params = AdminReportParams { organizer_id: None };
        let mut headers = HeaderMap::new();
        headers.insert("x-organizer-id", HeaderValue::from_static("not-a-uuid"));
        assert_eq!(organizer_filter(&params, &headers), None);
    }

    #[test]
    fn filter_absent_everywhere_is_none() {
        let params = AdminReportParams { organizer_id: None };
        assert_eq!(organizer_filter(&params, &HeaderMap::new()), None);
    }
}
