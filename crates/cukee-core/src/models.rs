//! Request and response types for the backend endpoints the client consumes.
//!
//! The backend is inconsistent about casing (some routes serialize by alias,
//! some by field name), so identifier fields accept both spellings.

use serde::{Deserialize, Serialize};

// ===== Auth =====

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: i64,
    pub email: String,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: i64,
    pub email: String,
    pub nickname: String,
    #[serde(rename = "createdAt", alias = "created_at", default)]
    pub created_at: Option<String>,
}

/// `{"message": "..."}` acknowledgement from logout, refresh, and token logins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Console and admin sessions are opened with an issued token, not a password
#[derive(Debug, Clone, Serialize)]
pub struct TokenLoginRequest {
    pub token: String,
}

// ===== Ticket =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    #[serde(rename = "curatorName")]
    pub curator_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "ticketImageUrl", default)]
    pub ticket_image_url: Option<String>,
    #[serde(rename = "characterImageUrl", default)]
    pub character_image_url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(rename = "ticketCode", default)]
    pub ticket_code: Option<String>,
    #[serde(rename = "curatorMessage", default)]
    pub curator_message: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketListResponse {
    pub data: Vec<Ticket>,
    pub total: u64,
}

// ===== Exhibition =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exhibition {
    pub id: i64,
    #[serde(rename = "ticketId")]
    pub ticket_id: i64,
    pub title: String,
    pub curator: String,
    #[serde(rename = "curatorMsg", default)]
    pub curator_msg: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExhibitionListResponse {
    pub data: Vec<Exhibition>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

// ===== Console =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleKey {
    pub id: i64,
    pub name: Option<String>,
    pub key_preview: String,
    pub created_at: String,
}

impl ConsoleKey {
    pub fn display_name(&self) -> &str {
        display_name(&self.name)
    }
}

fn display_name(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("(unnamed)")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointUsage {
    pub endpoint: String,
    pub method: String,
    pub status: String,
    pub count: u64,
}

/// Last 24 hours of API usage, with traffic in twelve 2-hour buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total_requests: u64,
    /// Percentage, 0-100
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub traffic: Vec<u64>,
    #[serde(default)]
    pub top_endpoints: Vec<EndpointUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingRecord {
    /// Billing month, `YYYY-MM`
    pub date: String,
    pub amount: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub total_30d: f64,
    #[serde(default)]
    pub history: Vec<BillingRecord>,
    pub next_billing_date: String,
}

// ===== Admin =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminConsoleToken {
    pub id: i64,
    pub name: Option<String>,
    pub token_preview: String,
    pub created_at: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub is_revoked: bool,
}

impl AdminConsoleToken {
    pub fn display_name(&self) -> &str {
        display_name(&self.name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateConsoleTokenRequest {
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedConsoleToken {
    pub id: i64,
    pub name: Option<String>,
    pub token: String,
    pub api_key: String,
    pub created_at: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminApiKey {
    pub id: i64,
    pub owner_token_id: i64,
    pub name: Option<String>,
    pub key_preview: String,
    pub created_at: String,
    #[serde(default)]
    pub is_revoked: bool,
}

impl AdminApiKey {
    pub fn display_name(&self) -> &str {
        display_name(&self.name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateApiKeyRequest {
    pub owner_token_id: i64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedApiKey {
    pub id: i64,
    pub owner_token_id: i64,
    pub name: Option<String>,
    pub key: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_accepts_both_casings() {
        let camel: LoginResponse =
            serde_json::from_str(r#"{"userId": 7, "email": "a@b.c", "nickname": "cukee"}"#).unwrap();
        let snake: LoginResponse =
            serde_json::from_str(r#"{"user_id": 7, "email": "a@b.c", "nickname": "cukee"}"#).unwrap();
        assert_eq!(camel, snake);
    }

    #[test]
    fn test_user_without_created_at() {
        let user: User =
            serde_json::from_str(r#"{"userId": 1, "email": "a@b.c", "nickname": "n"}"#).unwrap();
        assert!(user.created_at.is_none());
    }

    #[test]
    fn test_ticket_list_parses_sparse_tickets() {
        let json = r#"{"data": [{"id": 1, "title": "MZ style", "curatorName": "MZ style", "tags": ["highteen"], "ticketCode": "shortform_mz"}], "total": 1}"#;
        let list: TicketListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.data[0].ticket_code.as_deref(), Some("shortform_mz"));
        assert!(list.data[0].color.is_none());
    }

    #[test]
    fn test_console_key_display_name() {
        let key = ConsoleKey {
            id: 1,
            name: None,
            key_preview: "ck_live...001".to_string(),
            created_at: "2026.01.17".to_string(),
        };
        assert_eq!(key.display_name(), "(unnamed)");
    }

    #[test]
    fn test_usage_summary_with_empty_history() {
        let json = r#"{"total_requests": 0, "success_rate": 0.0, "avg_latency_ms": 0.0, "traffic": [0,0,0,0,0,0,0,0,0,0,0,0], "top_endpoints": []}"#;
        let usage: UsageSummary = serde_json::from_str(json).unwrap();
        assert_eq!(usage.traffic.len(), 12);
        assert!(usage.top_endpoints.is_empty());

        let json = r#"{"total_30d": 0.0, "history": [], "next_billing_date": "2026-02-01"}"#;
        let billing: BillingSummary = serde_json::from_str(json).unwrap();
        assert_eq!(billing.next_billing_date, "2026-02-01");
    }

    #[test]
    fn test_create_console_token_omits_missing_expiry() {
        let body = serde_json::to_value(CreateConsoleTokenRequest {
            name: None,
            expires_in_days: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"name": null}));
    }

    #[test]
    fn test_admin_api_key_parses_backend_datetime() {
        let json = r#"{"id": 3, "owner_token_id": 1, "name": null, "key_preview": "cuk_ab...wxyz", "created_at": "2026-01-17T09:30:00", "is_revoked": true}"#;
        let key: AdminApiKey = serde_json::from_str(json).unwrap();
        assert!(key.is_revoked);
        assert_eq!(key.display_name(), "(unnamed)");
    }
}
