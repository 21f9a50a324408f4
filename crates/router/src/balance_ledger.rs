//! A small in-memory balance ledger backing `/api/v1/balance/*` (§4.10).
//! Not part of `StorageInterface`: the balance ledger is named as an
//! external collaborator's relational schema, so this exists only to keep
//! the HTTP surface complete, the same rationale as
//! [`crate::customer_directory::CustomerDirectory`]. The orchestrator
//! appends one entry per captured charge and per settled refund; nothing
//! else reads or writes it.

use hyperswitch_domain_models::money::{Currency, MinorUnit};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BalanceTransactionType {
    Charge,
    Refund,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceTransaction {
    pub id: Uuid,
    pub merchant_id: Uuid,
    #[serde(rename = "type")]
    pub kind: BalanceTransactionType,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub source_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyBalance {
    pub currency: Currency,
    pub available: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceSummary {
    pub balances: Vec<CurrencyBalance>,
}

#[derive(Default)]
pub struct BalanceLedger {
    entries: RwLock<Vec<BalanceTransaction>>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, merchant_id: Uuid, kind: BalanceTransactionType, amount: MinorUnit, currency: Currency, source_id: Uuid, now: OffsetDateTime) {
        self.entries.write().await.push(BalanceTransaction {
            id: common_utils::ids::new_uuid(),
            merchant_id,
            kind,
            amount,
            currency,
            source_id,
            created_at: now,
        });
    }

    pub async fn find(&self, merchant_id: Uuid, id: Uuid) -> Option<BalanceTransaction> {
        self.entries.read().await.iter().find(|entry| entry.merchant_id == merchant_id && entry.id == id).cloned()
    }

    pub async fn list(&self, merchant_id: Uuid, limit: i64, offset: i64) -> (Vec<BalanceTransaction>, i64) {
        let guard = self.entries.read().await;
        let mut matching: Vec<BalanceTransaction> = guard.iter().filter(|entry| entry.merchant_id == merchant_id).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        let data = matching.into_iter().skip(offset.max(0) as usize).take(limit.max(0) as usize).collect();
        (data, total)
    }

    /// Net available balance per currency: charges add, refunds subtract.
    pub async fn summary(&self, merchant_id: Uuid) -> BalanceSummary {
        let guard = self.entries.read().await;
        let mut totals: Vec<(Currency, i64)> = Vec::new();
        for entry in guard.iter().filter(|entry| entry.merchant_id == merchant_id) {
            let signed = match entry.kind {
                BalanceTransactionType::Charge => entry.amount.get_amount_as_i64(),
                BalanceTransactionType::Refund => -entry.amount.get_amount_as_i64(),
            };
            match totals.iter_mut().find(|(currency, _)| *currency == entry.currency) {
                Some((_, total)) => *total += signed,
                None => totals.push((entry.currency, signed)),
            }
        }
        let mut balances: Vec<CurrencyBalance> =
            totals.into_iter().map(|(currency, available)| CurrencyBalance { currency, available }).collect();
        balances.sort_by_key(|balance| balance.currency.to_string());
        BalanceSummary { balances }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_charge_then_a_partial_refund_nets_out_in_one_currency() {
        let ledger = BalanceLedger::new();
        let merchant_id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        ledger
            .record(merchant_id, BalanceTransactionType::Charge, MinorUnit::new(10_000), Currency::USD, Uuid::new_v4(), now)
            .await;
        ledger
            .record(merchant_id, BalanceTransactionType::Refund, MinorUnit::new(4_000), Currency::USD, Uuid::new_v4(), now)
            .await;

        let summary = ledger.summary(merchant_id).await;
        assert_eq!(summary.balances.len(), 1);
        assert_eq!(summary.balances[0].currency, Currency::USD);
        assert_eq!(summary.balances[0].available, 6_000);
    }

    #[tokio::test]
    async fn balances_are_kept_separate_per_currency() {
        let ledger = BalanceLedger::new();
        let merchant_id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        ledger.record(merchant_id, BalanceTransactionType::Charge, MinorUnit::new(1_000), Currency::USD, Uuid::new_v4(), now).await;
        ledger.record(merchant_id, BalanceTransactionType::Charge, MinorUnit::new(2_000), Currency::EUR, Uuid::new_v4(), now).await;

        let summary = ledger.summary(merchant_id).await;
        assert_eq!(summary.balances.len(), 2);
    }

    #[tokio::test]
    async fn another_merchants_entries_never_show_up() {
        let ledger = BalanceLedger::new();
        let merchant_a = Uuid::new_v4();
        let merchant_b = Uuid::new_v4();
        ledger
            .record(merchant_a, BalanceTransactionType::Charge, MinorUnit::new(500), Currency::USD, Uuid::new_v4(), OffsetDateTime::now_utc())
            .await;

        assert!(ledger.summary(merchant_b).await.balances.is_empty());
        let (transactions, total) = ledger.list(merchant_b, 10, 0).await;
        assert!(transactions.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let ledger = BalanceLedger::new();
        let merchant_id = Uuid::new_v4();
        let base = OffsetDateTime::now_utc();
        for offset_secs in 0..3 {
            let source_id = Uuid::new_v4();
            ledger
                .record(
                    merchant_id,
                    BalanceTransactionType::Charge,
                    MinorUnit::new(100),
                    Currency::USD,
                    source_id,
                    base + time::Duration::seconds(offset_secs),
                )
                .await;
        }

        let (page, total) = ledger.list(merchant_id, 2, 0).await;
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert!(page[0].created_at > page[1].created_at);
    }
}
