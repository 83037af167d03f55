// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the thin ERP routes that sit behind the
//! security gate. All types derive `ToSchema` for the OpenAPI document.
//!
//! ## Model Categories
//!
//! - **Orders**: order headers with line items
//! - **Customers**: customer records
//! - **Receipts**: supplier receipts pushed by the ingestion service
//! - **Automation**: rules and the log of bridge-triggered commands

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct OrderLine {
    pub sku: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub lines: Vec<OrderLine>,
    /// Token label of the caller that created the order
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub lines: Vec<OrderLine>,
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Receipts
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngestReceiptRequest {
    pub supplier: String,
    pub total_cents: i64,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    pub supplier: String,
    pub total_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub ingested_by: String,
    pub ingested_at: DateTime<Utc>,
}

// =============================================================================
// Automation
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AutomationRule {
    pub id: String,
    pub name: String,
    /// Bridge intent that triggers the rule
    pub intent: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CreateAutomationRuleRequest {
    pub name: String,
    pub intent: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// A verified bridge command handed to automation.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRecord {
    pub id: String,
    pub intent: String,
    #[schema(value_type = Object)]
    pub slots: Map<String, Value>,
    /// Linked app user, if the command carried an account-link token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_by: Option<String>,
    /// Ids of enabled rules matching the intent
    pub matched_rules: Vec<String>,
    pub received_at: DateTime<Utc>,
}
