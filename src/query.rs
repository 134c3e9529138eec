//! Read-side paging and filters for listings.
//!
//! Filters are plain data; `MemoryStore` evaluates them with `matches`,
//! `PgStore` turns them into `WHERE` clauses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::models::{Account, AccountStatus, Client};
use crate::core_types::{AccountNumber, ClientId, CurrencyCode};
use crate::money::Amount;
use crate::transaction::types::{
    Transaction, TransactionMethod, TransactionStatus, TransactionType,
};
use crate::transfer::state::TransferStatus;
use crate::transfer::types::Transfer;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Desc,
    Asc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Desc => "DESC",
            SortDirection::Asc => "ASC",
        }
    }
}

/// Zero-based page request. Size 0 means the default; sizes above
/// [`MAX_PAGE_SIZE`] are capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: SortDirection,
}

impl PageRequest {
    pub fn new(page: u32, size: u32, sort: SortDirection) -> Self {
        let size = match size {
            0 => DEFAULT_PAGE_SIZE,
            s => s.min(MAX_PAGE_SIZE),
        };
        Self { page, size, sort }
    }

    pub fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }

    pub fn limit(&self) -> u64 {
        self.size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE, SortDirection::Desc)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: &PageRequest, total_items: u64) -> Self {
        let size = request.size.max(1) as u64;
        Self {
            items,
            page: request.page,
            size: request.size,
            total_items,
            total_pages: total_items.div_ceil(size),
        }
    }

    /// Slice an in-memory, already sorted collection.
    pub fn from_sorted(all: Vec<T>, request: &PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Self::new(items, request, total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

fn in_range(ts: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    from.is_none_or(|f| ts >= f) && to.is_none_or(|t| ts <= t)
}

// ============================================================================
// Filters
// ============================================================================

/// Live clients, optionally narrowed by a case-insensitive substring of
/// name, email or phone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientFilter {
    pub search: Option<String>,
}

impl ClientFilter {
    /// The search text, trimmed and lower-cased; `None` when blank.
    pub fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, client: &Client) -> bool {
        if client.deleted {
            return false;
        }
        match self.needle() {
            None => true,
            Some(needle) => [&client.name, &client.email, &client.phone]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountFilter {
    pub owner_id: Option<ClientId>,
    pub status: Option<AccountStatus>,
    pub currency: Option<CurrencyCode>,
    pub include_deleted: bool,
}

impl AccountFilter {
    pub fn matches(&self, account: &Account) -> bool {
        (self.include_deleted || !account.deleted)
            && self.owner_id.is_none_or(|o| account.owner_id == o)
            && self.status.is_none_or(|s| account.status == s)
            && self.currency.as_ref().is_none_or(|c| &account.currency == c)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub account_number: Option<AccountNumber>,
    pub tx_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub method: Option<TransactionMethod>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.account_number
            .as_ref()
            .is_none_or(|n| &tx.account_number == n)
            && self.tx_type.is_none_or(|t| tx.tx_type == t)
            && self.status.is_none_or(|s| tx.status == s)
            && self.method.is_none_or(|m| tx.method == m)
            && in_range(tx.timestamp, self.from, self.to)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferFilter {
    pub from_account: Option<AccountNumber>,
    pub to_account: Option<AccountNumber>,
    pub from_currency: Option<CurrencyCode>,
    pub to_currency: Option<CurrencyCode>,
    pub status: Option<TransferStatus>,
    /// Bounds on `amount_sent`
    pub min_amount: Option<Amount>,
    pub max_amount: Option<Amount>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TransferFilter {
    pub fn matches(&self, transfer: &Transfer) -> bool {
        self.from_account
            .as_ref()
            .is_none_or(|n| &transfer.from_account_number == n)
            && self
                .to_account
                .as_ref()
                .is_none_or(|n| &transfer.to_account_number == n)
            && self
                .from_currency
                .as_ref()
                .is_none_or(|c| &transfer.from_currency == c)
            && self
                .to_currency
                .as_ref()
                .is_none_or(|c| &transfer.to_currency == c)
            && self.status.is_none_or(|s| transfer.status == s)
            && self.min_amount.is_none_or(|m| transfer.amount_sent >= m)
            && self.max_amount.is_none_or(|m| transfer.amount_sent <= m)
            && in_range(transfer.timestamp, self.from, self.to)
    }
}
