//! A small in-memory customer directory backing the `/api/v1/customers`
//! pass-through routes (§4.10). Customer persistence is an external
//! collaborator's relational schema per the purpose statement's scope
//! line; this directory exists only so the HTTP surface is complete
//! without pulling that schema into the repository port.

use std::collections::HashMap;

use masking::Secret;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub name: Option<String>,
    pub email: Option<Secret<String>>,
    pub phone: Option<Secret<String>>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CreateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<Secret<String>>,
    pub phone: Option<Secret<String>>,
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<Secret<String>>,
    pub phone: Option<Secret<String>>,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerSearchQuery {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Default)]
pub struct CustomerDirectory {
    customers: RwLock<HashMap<Uuid, Customer>>,
}

impl CustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, merchant_id: Uuid, request: CreateCustomerRequest) -> Customer {
        let customer = Customer {
            id: common_utils::ids::new_uuid(),
            merchant_id,
            name: request.name,
            email: request.email,
            phone: request.phone,
            description: request.description,
            metadata: request.metadata,
            created_at: OffsetDateTime::now_utc(),
        };
        self.customers.write().await.insert(customer.id, customer.clone());
        customer
    }

    pub async fn find(&self, merchant_id: Uuid, id: Uuid) -> Option<Customer> {
        self.customers
            .read()
            .await
            .get(&id)
            .filter(|c| c.merchant_id == merchant_id)
            .cloned()
    }

    pub async fn update(&self, merchant_id: Uuid, id: Uuid, request: UpdateCustomerRequest) -> Option<Customer> {
        let mut guard = self.customers.write().await;
        let customer = guard.get_mut(&id).filter(|c| c.merchant_id == merchant_id)?;
        if let Some(name) = request.name {
            customer.name = Some(name);
        }
        if let Some(email) = request.email {
            customer.email = Some(email);
        }
        if let Some(phone) = request.phone {
            customer.phone = Some(phone);
        }
        if let Some(description) = request.description {
            customer.description = Some(description);
        }
        if let Some(metadata) = request.metadata {
            customer.metadata = metadata;
        }
        Some(customer.clone())
    }

    pub async fn delete(&self, merchant_id: Uuid, id: Uuid) -> bool {
        let mut guard = self.customers.write().await;
        if guard.get(&id).is_some_and(|c| c.merchant_id == merchant_id) {
            guard.remove(&id);
            true
        } else {
            false
        }
    }

    /// List + search on email/name/phone (§4.10's customers CRUD line), most
    /// recently created first.
    pub async fn list(&self, merchant_id: Uuid, query: &CustomerSearchQuery, limit: usize, offset: usize) -> (Vec<Customer>, usize) {
        let guard = self.customers.read().await;
        let mut matching: Vec<Customer> = guard
            .values()
            .filter(|c| c.merchant_id == merchant_id)
            .filter(|c| matches_query(c, query))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len();
        (matching.into_iter().skip(offset).take(limit).collect(), total)
    }
}

fn matches_query(customer: &Customer, query: &CustomerSearchQuery) -> bool {
    use masking::PeekInterface;
    if let Some(email) = &query.email {
        if customer.email.as_ref().map(|e| e.peek().as_str()) != Some(email.as_str()) {
            return false;
        }
    }
    if let Some(name) = &query.name {
        if customer.name.as_deref() != Some(name.as_str()) {
            return false;
        }
    }
    if let Some(phone) = &query.phone {
        if customer.phone.as_ref().map(|p| p.peek().as_str()) != Some(phone.as_str()) {
            return false;
        }
    }
    true
}
