// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store backing the thin ERP routes.
//!
//! Persistence is not this service's concern; the store only gives the
//! gated routes something real to read and write.

use std::collections::{BTreeMap, VecDeque};

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    AutomationRecord, AutomationRule, CreateAutomationRuleRequest, CreateOrderRequest, Customer,
    IngestReceiptRequest, Order, Receipt,
};

/// Most recent bridge commands kept in the automation log.
pub const AUTOMATION_LOG_CAPACITY: usize = 1_000;

#[derive(Default)]
pub struct InMemoryStore {
    orders: BTreeMap<String, Order>,
    customers: BTreeMap<String, Customer>,
    receipts: Vec<Receipt>,
    rules: BTreeMap<String, AutomationRule>,
    automation_log: VecDeque<AutomationRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_orders(&self) -> Vec<Order> {
        self.orders.values().cloned().collect()
    }

    pub fn create_order(
        &mut self,
        request: CreateOrderRequest,
        created_by: String,
    ) -> Result<Order, ApiError> {
        if request.lines.is_empty() {
            return Err(ApiError::unprocessable("Order needs at least one line"));
        }
        let order = Order {
            id: Uuid::new_v4().to_string(),
            customer_id: request.customer_id,
            lines: request.lines,
            created_by,
            created_at: Utc::now(),
        };
        self.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    pub fn delete_order(&mut self, order_id: &str) -> Result<(), ApiError> {
        if self.orders.remove(order_id).is_some() {
            Ok(())
        } else {
            Err(ApiError::not_found("Order not found"))
        }
    }

    pub fn insert_customer(&mut self, name: impl Into<String>) -> Customer {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
        };
        self.customers.insert(customer.id.clone(), customer.clone());
        customer
    }

    pub fn list_customers(&self) -> Vec<Customer> {
        self.customers.values().cloned().collect()
    }

    pub fn ingest_receipt(&mut self, request: IngestReceiptRequest, ingested_by: String) -> Receipt {
        let receipt = Receipt {
            id: Uuid::new_v4().to_string(),
            supplier: request.supplier,
            total_cents: request.total_cents,
            reference: request.reference,
            ingested_by,
            ingested_at: Utc::now(),
        };
        self.receipts.push(receipt.clone());
        receipt
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn list_rules(&self) -> Vec<AutomationRule> {
        self.rules.values().cloned().collect()
    }

    pub fn create_rule(&mut self, request: CreateAutomationRuleRequest) -> AutomationRule {
        let rule = AutomationRule {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            intent: request.intent,
            enabled: request.enabled,
        };
        self.rules.insert(rule.id.clone(), rule.clone());
        rule
    }

    /// Record a verified bridge command against the enabled rules for its intent.
    pub fn record_automation(
        &mut self,
        intent: String,
        slots: Map<String, Value>,
        linked_by: Option<String>,
    ) -> AutomationRecord {
        let matched_rules = self
            .rules
            .values()
            .filter(|rule| rule.enabled && rule.intent.eq_ignore_ascii_case(&intent))
            .map(|rule| rule.id.clone())
            .collect();
        let record = AutomationRecord {
            id: Uuid::new_v4().to_string(),
            intent,
            slots,
            linked_by,
            matched_rules,
            received_at: Utc::now(),
        };
        if self.automation_log.len() == AUTOMATION_LOG_CAPACITY {
            self.automation_log.pop_front();
        }
        self.automation_log.push_back(record.clone());
        record
    }

    /// Recorded bridge commands, oldest first.
    pub fn automation_log(&self) -> &VecDeque<AutomationRecord> {
        &self.automation_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderLine;

    fn order_request() -> CreateOrderRequest {
        CreateOrderRequest {
            customer_id: "cust-1".to_string(),
            lines: vec![OrderLine {
                sku: "BOLT-M8".to_string(),
                quantity: 40,
            }],
        }
    }

    #[test]
    fn create_and_delete_order() {
        let mut store = InMemoryStore::new();
        let order = store
            .create_order(order_request(), "APP_AUTH_TOKENS[0]".to_string())
            .unwrap();
        assert_eq!(store.list_orders(), vec![order.clone()]);
        assert_eq!(order.created_by, "APP_AUTH_TOKENS[0]");

        store.delete_order(&order.id).unwrap();
        assert!(store.list_orders().is_empty());
        assert_eq!(
            store.delete_order(&order.id).unwrap_err().status,
            axum::http::StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn empty_order_is_rejected() {
        let mut store = InMemoryStore::new();
        let mut request = order_request();
        request.lines.clear();
        assert!(store.create_order(request, "x".to_string()).is_err());
    }

    #[test]
    fn automation_matches_enabled_rules_by_intent() {
        let mut store = InMemoryStore::new();
        let active = store.create_rule(CreateAutomationRuleRequest {
            name: "Reorder".to_string(),
            intent: "StockCheck".to_string(),
            enabled: true,
        });
        store.create_rule(CreateAutomationRuleRequest {
            name: "Paused".to_string(),
            intent: "StockCheck".to_string(),
            enabled: false,
        });

        let record = store.record_automation("stockcheck".to_string(), Map::new(), None);
        assert_eq!(record.matched_rules, vec![active.id]);
        assert_eq!(store.automation_log().len(), 1);
    }

    #[test]
    fn automation_log_drops_oldest_when_full() {
        let mut store = InMemoryStore::new();
        let first = store.record_automation("first".to_string(), Map::new(), None);
        for _ in 1..AUTOMATION_LOG_CAPACITY {
            store.record_automation("filler".to_string(), Map::new(), None);
        }
        assert_eq!(store.automation_log().len(), AUTOMATION_LOG_CAPACITY);
        assert_eq!(store.automation_log()[0].id, first.id);

        let last = store.record_automation("last".to_string(), Map::new(), None);
        assert_eq!(store.automation_log().len(), AUTOMATION_LOG_CAPACITY);
        assert_ne!(store.automation_log()[0].id, first.id);
        assert_eq!(store.automation_log().back().map(|r| &r.id), Some(&last.id));
    }
}
