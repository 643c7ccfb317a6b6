//! Canned backend for mock mode.
//!
//! When `ClientConfig::mock_mode` is set the client answers from here and
//! never opens a connection. Useful for front-end development without a
//! running backend.

use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::{ApiError, RequestDescriptor};

pub const MOCK_USER_ID: i64 = 999;
pub const MOCK_EMAIL: &str = "mock@cukee.com";

fn mock_user() -> Value {
    json!({
        "userId": MOCK_USER_ID,
        "email": MOCK_EMAIL,
        "nickname": "dev",
        "createdAt": "2026-01-01T00:00:00Z",
    })
}

fn mock_tickets() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "title": "MZ style",
            "curatorName": "MZ style",
            "tags": ["highteen", "romcom", "short"],
            "ticketImageUrl": "/ticket/t1.png",
            "characterImageUrl": "/cara/c1.png",
            "width": 356,
            "height": 638,
            "ticketCode": "shortform_mz",
        }),
        json!({
            "id": 2,
            "title": "Calm feelings",
            "curatorName": "Calm feelings",
            "tags": ["growth", "healing", "daily life"],
            "ticketImageUrl": "/ticket/t2.png",
            "characterImageUrl": "/cara/c1.png",
            "width": 295,
            "height": 638,
            "ticketCode": "calm_feelings",
        }),
        json!({
            "id": 3,
            "title": "MINOR lover",
            "curatorName": "MINOR lover",
            "tags": ["high rating", "low audience", "minor"],
            "ticketImageUrl": "/ticket/t3.png",
            "characterImageUrl": "/cara/c1.png",
            "width": 399,
            "height": 652,
            "ticketCode": "minor_lover",
        }),
    ]
}

fn mock_exhibitions(page: u64, limit: u64) -> Value {
    let all: Vec<Value> = mock_tickets()
        .iter()
        .map(|t| {
            json!({
                "id": t["id"],
                "ticketId": t["id"],
                "title": t["title"],
                "curator": t["curatorName"],
                "curatorMsg": "Enjoy the show",
                "likes": 0,
                "imageUrl": t["ticketImageUrl"],
            })
        })
        .collect();
    let total = all.len();
    let start = page.saturating_sub(1).saturating_mul(limit) as usize;
    let data: Vec<Value> = all.into_iter().skip(start).take(limit as usize).collect();
    json!({ "data": data, "total": total, "page": page, "limit": limit })
}

fn mock_console_keys() -> Value {
    json!([
        { "id": 1, "name": "Production Key (Mock)", "key_preview": "ck_live...001", "created_at": "2026.01.17" },
        { "id": 2, "name": "Development Key (Mock)", "key_preview": "ck_test...002", "created_at": "2026.01.10" },
    ])
}

fn mock_usage_summary() -> Value {
    json!({
        "total_requests": 1240842,
        "success_rate": 99.98,
        "avg_latency_ms": 24,
        "traffic": [30, 60, 40, 80, 50, 90, 70, 40, 100, 60, 40, 85],
        "top_endpoints": [
            { "endpoint": "/api/ai/generate", "method": "POST", "status": "200", "count": 1200 },
            { "endpoint": "/api/ai/generate", "method": "POST", "status": "500", "count": 4 },
        ],
    })
}

fn mock_billing_summary() -> Value {
    json!({
        "total_30d": 452100,
        "history": [
            { "date": "2026-01", "amount": 154000, "status": "Paid" },
            { "date": "2025-12", "amount": 142000, "status": "Paid" },
            { "date": "2025-11", "amount": 168000, "status": "Refund" },
        ],
        "next_billing_date": "2026-02-01",
    })
}

fn query_u64(descriptor: &RequestDescriptor, key: &str, default: u64) -> u64 {
    descriptor
        .query()
        .iter()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

/// Answer a request from canned data
pub fn respond(descriptor: &RequestDescriptor) -> Result<Value, ApiError> {
    debug!(method = %descriptor.method(), path = descriptor.path(), "Mock mode response");

    let path = descriptor.path().trim_end_matches('/');
    let get = *descriptor.method() == Method::GET;
    let post = *descriptor.method() == Method::POST;

    let value = match path {
        "/users/me" if get => mock_user(),
        "/auth/login" | "/auth/signup" if post => mock_user(),
        "/auth/logout" if post => json!({ "message": "Logged out successfully" }),
        "/auth/refresh" if post => json!({ "message": "Token refreshed" }),
        "/tickets" if get => {
            let tickets = mock_tickets();
            json!({ "total": tickets.len(), "data": tickets })
        }
        "/exhibitions" if get => mock_exhibitions(
            query_u64(descriptor, "page", 1),
            query_u64(descriptor, "limit", 20),
        ),
        "/console/auth/login" | "/console/auth/logout" if post => json!({ "message": "ok" }),
        "/console/auth/me" if get => json!({ "message": "ok" }),
        "/console/keys" if get => mock_console_keys(),
        "/console/usage/summary" if get => mock_usage_summary(),
        "/console/billing/summary" if get => mock_billing_summary(),
        p if get && p.starts_with("/tickets/") => {
            let code = &p["/tickets/".len()..];
            mock_tickets()
                .into_iter()
                .find(|t| t["ticketCode"] == code)
                .ok_or_else(|| not_found(descriptor))?
        }
        _ => return Err(not_found(descriptor)),
    };
    Ok(value)
}

fn not_found(descriptor: &RequestDescriptor) -> ApiError {
    ApiError::from_status(
        StatusCode::NOT_FOUND,
        &format!(r#"{{"detail": "No mock for {} {}"}}"#, descriptor.method(), descriptor.path()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestOptions;
    use crate::models::{
        BillingSummary, ExhibitionListResponse, Ticket, TicketListResponse, UsageSummary, User,
    };

    fn get(path: &str, options: RequestOptions) -> RequestDescriptor {
        RequestDescriptor::new(Method::GET, path, None, options)
    }

    #[test]
    fn test_mock_user() {
        let value = respond(&get("/users/me", RequestOptions::new())).unwrap();
        let user: User = serde_json::from_value(value).unwrap();
        assert_eq!(user.user_id, MOCK_USER_ID);
        assert_eq!(user.email, MOCK_EMAIL);
    }

    #[test]
    fn test_mock_tickets_and_detail() {
        let list: TicketListResponse =
            serde_json::from_value(respond(&get("/tickets", RequestOptions::new())).unwrap()).unwrap();
        assert_eq!(list.total, 3);

        let ticket: Ticket =
            serde_json::from_value(respond(&get("/tickets/minor_lover", RequestOptions::new())).unwrap())
                .unwrap();
        assert_eq!(ticket.id, 3);

        let err = respond(&get("/tickets/missing", RequestOptions::new())).unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_mock_exhibitions_paginate() {
        let options = RequestOptions::new().query("page", 2).query("limit", 2);
        let page: ExhibitionListResponse =
            serde_json::from_value(respond(&get("/exhibitions", options)).unwrap()).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.page, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, 3);
    }

    #[test]
    fn test_mock_usage_and_billing() {
        let usage: UsageSummary =
            serde_json::from_value(respond(&get("/console/usage/summary", RequestOptions::new())).unwrap())
                .unwrap();
        assert_eq!(usage.total_requests, 1_240_842);
        assert_eq!(usage.traffic.len(), 12);
        assert_eq!(usage.top_endpoints[1].status, "500");

        let billing: BillingSummary =
            serde_json::from_value(respond(&get("/console/billing/summary", RequestOptions::new())).unwrap())
                .unwrap();
        assert_eq!(billing.history.len(), 3);
        assert_eq!(billing.history[2].status, "Refund");
    }

    #[test]
    fn test_admin_routes_have_no_mock() {
        let err = respond(&get("/admin/console-tokens", RequestOptions::new())).unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_unknown_route_is_not_found() {
        let err = respond(&get("/admin/stats", RequestOptions::new())).unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.detail().unwrap().contains("/admin/stats"));
    }
}
