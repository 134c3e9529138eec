//! In-memory ledger store
//!
//! All maps sit behind one lock, so a unit of work is validated and applied
//! while holding it and no reader ever sees half of a commit.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{LedgerStore, StoreError, UnitOfWork};
use crate::account::models::{Account, Client};
use crate::core_types::{AccountId, AccountNumber, ClientId};
use crate::query::{
    AccountFilter, ClientFilter, Page, PageRequest, SortDirection, TransactionFilter, TransferFilter,
};
use crate::transaction::types::Transaction;
use crate::transfer::types::Transfer;

#[derive(Debug, Default)]
struct Inner {
    clients: HashMap<ClientId, Client>,
    accounts: HashMap<AccountId, Account>,
    account_numbers: HashMap<AccountNumber, AccountId>,
    transactions: Vec<Transaction>,
    transaction_refs: HashMap<String, usize>,
    transfers: Vec<Transfer>,
    transfer_refs: HashMap<String, usize>,
}

impl Inner {
    fn check_client_unique(&self, client: &Client) -> Result<(), StoreError> {
        for other in self.clients.values().filter(|c| c.id != client.id) {
            if other.email == client.email {
                return Err(StoreError::UniqueViolation { field: "email" });
            }
            if other.phone == client.phone {
                return Err(StoreError::UniqueViolation { field: "phone" });
            }
        }
        Ok(())
    }

    fn account_by_number(&self, number: &AccountNumber) -> Option<&Account> {
        self.account_numbers
            .get(number)
            .and_then(|id| self.accounts.get(id))
    }
}

fn sort_by_timestamp<T>(
    items: &mut [T],
    sort: SortDirection,
    key: impl Fn(&T) -> chrono::DateTime<Utc>,
) {
    match sort {
        SortDirection::Asc => items.sort_by_key(|i| key(i)),
        SortDirection::Desc => items.sort_by_key(|i| std::cmp::Reverse(key(i))),
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn transaction_count(&self) -> usize {
        self.inner.read().await.transactions.len()
    }

    pub async fn transfer_count(&self) -> usize {
        self.inner.read().await.transfers.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_client_unique(client)?;
        inner.clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn update_client(&self, client: &Client) -> Result<Client, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_client_unique(client)?;
        let stored = inner
            .clients
            .get_mut(&client.id)
            .filter(|c| c.version == client.version)
            .ok_or_else(|| StoreError::Conflict {
                entity: "client",
                key: client.id.to_string(),
            })?;
        stored.name = client.name.clone();
        stored.email = client.email.clone();
        stored.phone = client.phone.clone();
        stored.deleted = client.deleted;
        stored.audit.touch();
        stored.version = stored.version.next();
        Ok(stored.clone())
    }

    async fn find_client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        Ok(self.inner.read().await.clients.get(&id).cloned())
    }

    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.clients.values().find(|c| c.email == email).cloned())
    }

    async fn find_client_by_phone(&self, phone: &str) -> Result<Option<Client>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.clients.values().find(|c| c.phone == phone).cloned())
    }

    async fn list_clients(
        &self,
        filter: &ClientFilter,
        page: &PageRequest,
    ) -> Result<Page<Client>, StoreError> {
        let inner = self.inner.read().await;
        let mut all: Vec<Client> = inner.clients.values().filter(|c| filter.matches(c)).cloned().collect();
        sort_by_timestamp(&mut all, page.sort, |c| c.audit.created_at);
        Ok(Page::from_sorted(all, page))
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.account_numbers.contains_key(&account.account_number) {
            return Err(StoreError::UniqueViolation {
                field: "account_number",
            });
        }
        if !inner.clients.contains_key(&account.owner_id) {
            return Err(StoreError::Backend(format!(
                "owner {} does not exist",
                account.owner_id
            )));
        }
        inner
            .account_numbers
            .insert(account.account_number.clone(), account.id);
        inner.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .accounts
            .get_mut(&account.id)
            .filter(|a| a.version == account.version)
            .ok_or_else(|| StoreError::Conflict {
                entity: "account",
                key: account.account_number.to_string(),
            })?;
        stored.status = account.status;
        stored.deleted = account.deleted;
        stored.audit.touch();
        stored.version = stored.version.next();
        Ok(stored.clone())
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.read().await.account_by_number(number).cloned())
    }

    async fn list_accounts(
        &self,
        filter: &AccountFilter,
        page: &PageRequest,
    ) -> Result<Page<Account>, StoreError> {
        let inner = self.inner.read().await;
        let mut all: Vec<Account> = inner
            .accounts
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        sort_by_timestamp(&mut all, page.sort, |a| a.audit.created_at);
        Ok(Page::from_sorted(all, page))
    }

    async fn find_transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .transaction_refs
            .get(reference)
            .map(|&idx| inner.transactions[idx].clone()))
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: &PageRequest,
    ) -> Result<Page<Transaction>, StoreError> {
        let inner = self.inner.read().await;
        let mut all: Vec<Transaction> = inner
            .transactions
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        sort_by_timestamp(&mut all, page.sort, |t| t.timestamp);
        Ok(Page::from_sorted(all, page))
    }

    async fn find_transfer_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transfer>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .transfer_refs
            .get(reference)
            .map(|&idx| inner.transfers[idx].clone()))
    }

    async fn list_transfers(
        &self,
        filter: &TransferFilter,
        page: &PageRequest,
    ) -> Result<Page<Transfer>, StoreError> {
        let inner = self.inner.read().await;
        let mut all: Vec<Transfer> = inner
            .transfers
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        sort_by_timestamp(&mut all, page.sort, |t| t.timestamp);
        Ok(Page::from_sorted(all, page))
    }

    async fn commit(&self, work: UnitOfWork) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        // Validate everything before touching anything
        for update in &work.balance_updates {
            let current = inner
                .accounts
                .get(&update.account_id)
                .map(|a| a.version);
            if current != Some(update.expected_version) {
                return Err(StoreError::Conflict {
                    entity: "account",
                    key: update.account_number.to_string(),
                });
            }
        }
        let mut seen = HashSet::new();
        for tx in &work.transactions {
            if inner.transaction_refs.contains_key(&tx.reference) || !seen.insert(&tx.reference) {
                return Err(StoreError::DuplicateReference(tx.reference.clone()));
            }
        }
        #[allow(clippy::collapsible_if)]
        if let Some(transfer) = &work.transfer {
            if inner.transfer_refs.contains_key(&transfer.reference) {
                return Err(StoreError::DuplicateReference(transfer.reference.clone()));
            }
        }

        for update in work.balance_updates {
            if let Some(account) = inner.accounts.get_mut(&update.account_id) {
                account.total_balance = update.total_balance;
                account.usable_balance = update.usable_balance;
                account.audit.touch();
                account.version = account.version.next();
            }
        }
        for tx in work.transactions {
            let idx = inner.transactions.len();
            inner.transaction_refs.insert(tx.reference.clone(), idx);
            inner.transactions.push(tx);
        }
        if let Some(transfer) = work.transfer {
            let idx = inner.transfers.len();
            inner.transfer_refs.insert(transfer.reference.clone(), idx);
            inner.transfers.push(transfer);
        }
        Ok(())
    }
}
