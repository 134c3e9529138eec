//! Transaction Recorder
//!
//! Appends debit and credit entries and moves the account balance with them.
//! The entry insert and the balance update are committed as one unit of work;
//! a stale account version or a reference collision restarts the operation
//! from the account lookup, up to `max_conflict_retries` times.
//!
//! Recording is not idempotent: two calls create two entries.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::types::{
    Transaction, TransactionMethod, TransactionStatus, TransactionType, generate_reference,
};
use crate::account::ledger::{AccountLedger, BalanceChange};
use crate::account::models::Account;
use crate::account::validation;
use crate::core_types::{AccountNumber, TransactionId, Version};
use crate::error::{AccountRole, LedgerError};
use crate::money::Amount;
use crate::query::{Page, PageRequest, TransactionFilter};
use crate::store::{BalanceUpdate, LedgerStore, UnitOfWork, conflict_backoff};

/// Request to record one debit or credit.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryCommand {
    pub account_number: AccountNumber,
    pub amount: Amount,
    pub method: TransactionMethod,
    pub description: Option<String>,
}

/// A transaction and the balance write it implies, not yet committed.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedEntry {
    pub transaction: Transaction,
    pub update: BalanceUpdate,
}

pub struct TransactionRecorder {
    store: Arc<dyn LedgerStore>,
    ledger: AccountLedger,
    max_conflict_retries: u32,
}

impl TransactionRecorder {
    pub fn new(store: Arc<dyn LedgerStore>, ledger: AccountLedger, max_conflict_retries: u32) -> Self {
        Self {
            store,
            ledger,
            max_conflict_retries,
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn ledger(&self) -> &AccountLedger {
        &self.ledger
    }

    pub fn max_conflict_retries(&self) -> u32 {
        self.max_conflict_retries
    }

    /// Look up an account by number; absence is reported for `role`.
    pub async fn resolve(
        &self,
        number: &AccountNumber,
        role: AccountRole,
    ) -> Result<Account, LedgerError> {
        self.store
            .find_account_by_number(number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound {
                role,
                account_number: number.to_string(),
            })
    }

    /// Check the debit rules against `account` as read and build the entry.
    pub fn stage_debit(
        &self,
        account: &Account,
        amount: Amount,
        method: TransactionMethod,
        description: Option<String>,
    ) -> Result<StagedEntry, LedgerError> {
        ensure_positive(amount)?;
        self.ledger.ensure_can_withdraw(account, amount)?;
        let balance = self.ledger.balance_after_withdrawal(account, amount)?;
        Ok(stage(account, TransactionType::Debit, amount, method, description, balance))
    }

    /// Check the credit rules against `account` as read and build the entry.
    pub fn stage_credit(
        &self,
        account: &Account,
        amount: Amount,
        method: TransactionMethod,
        description: Option<String>,
    ) -> Result<StagedEntry, LedgerError> {
        ensure_positive(amount)?;
        self.ledger.ensure_can_deposit(account)?;
        let balance = self.ledger.balance_after_deposit(account, amount)?;
        Ok(stage(account, TransactionType::Credit, amount, method, description, balance))
    }

    pub async fn record_debit(&self, cmd: EntryCommand) -> Result<Transaction, LedgerError> {
        self.record(TransactionType::Debit, cmd).await
    }

    pub async fn record_credit(&self, cmd: EntryCommand) -> Result<Transaction, LedgerError> {
        self.record(TransactionType::Credit, cmd).await
    }

    async fn record(
        &self,
        tx_type: TransactionType,
        cmd: EntryCommand,
    ) -> Result<Transaction, LedgerError> {
        ensure_positive(cmd.amount)?;
        let description = validation::description(cmd.description.as_deref())?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let account = self.resolve(&cmd.account_number, AccountRole::Account).await?;

            let staged = match tx_type {
                TransactionType::Debit => {
                    self.stage_debit(&account, cmd.amount, cmd.method, description.clone())?
                }
                TransactionType::Credit => {
                    self.stage_credit(&account, cmd.amount, cmd.method, description.clone())?
                }
            };
            let transaction = staged.transaction.clone();
            let work = UnitOfWork {
                balance_updates: vec![staged.update],
                transactions: vec![staged.transaction],
                transfer: None,
            };

            match self.store.commit(work).await {
                Ok(()) => {
                    info!(
                        account = %cmd.account_number,
                        reference = %transaction.reference,
                        tx_type = %tx_type,
                        amount = %cmd.amount,
                        attempt,
                        "Transaction recorded"
                    );
                    return Ok(transaction);
                }
                Err(e) if e.is_retryable() && attempt <= self.max_conflict_retries => {
                    warn!(
                        account = %cmd.account_number,
                        tx_type = %tx_type,
                        attempt,
                        error = %e,
                        "Commit rejected, retrying"
                    );
                    tokio::time::sleep(conflict_backoff(attempt)).await;
                }
                Err(e) => {
                    warn!(
                        account = %cmd.account_number,
                        tx_type = %tx_type,
                        attempt,
                        error = %e,
                        "Transaction not recorded"
                    );
                    return Err(e.into());
                }
            }
        }
    }

    pub async fn get_by_reference(&self, reference: &str) -> Result<Transaction, LedgerError> {
        let reference = reference.trim();
        self.store
            .find_transaction_by_reference(reference)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound(reference.to_string()))
    }

    pub async fn list(
        &self,
        filter: &TransactionFilter,
        page: &PageRequest,
    ) -> Result<Page<Transaction>, LedgerError> {
        Ok(self.store.list_transactions(filter, page).await?)
    }
}

fn ensure_positive(amount: Amount) -> Result<(), LedgerError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::validation("amount must be greater than zero"))
    }
}

fn stage(
    account: &Account,
    tx_type: TransactionType,
    amount: Amount,
    method: TransactionMethod,
    description: Option<String>,
    balance: BalanceChange,
) -> StagedEntry {
    let transaction = Transaction {
        id: TransactionId::new(),
        reference: generate_reference(tx_type.reference_prefix()),
        account_id: account.id,
        account_number: account.account_number.clone(),
        currency: account.currency.clone(),
        tx_type,
        method,
        status: TransactionStatus::Success,
        amount,
        description,
        timestamp: Utc::now(),
        version: Version::INITIAL,
    };
    debug!(
        account = %account.account_number,
        reference = %transaction.reference,
        expected_version = %account.version,
        "Entry staged"
    );
    StagedEntry {
        transaction,
        update: BalanceUpdate {
            account_id: account.id,
            account_number: account.account_number.clone(),
            expected_version: account.version,
            total_balance: balance.total_balance,
            usable_balance: balance.usable_balance,
        },
    }
}
