//! Transfer Coordinator
//!
//! Drives a transfer through its lifecycle:
//!
//! 1. validate the request and resolve the rate provider
//! 2. resolve source and destination accounts
//! 3. obtain the exchange rate (bounded retry with backoff, no locks held)
//! 4. stage the debit, the credit and the transfer record
//! 5. commit all three as one unit of work
//!
//! A version conflict or reference collision at step 5 re-reads both
//! accounts and re-stages. Nothing is written before step 5, so a failure at
//! any step leaves both balances untouched.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::state::TransferStatus;
use super::types::{TRANSFER_REFERENCE_PREFIX, Transfer, TransferCommand};
use crate::account::models::Account;
use crate::account::validation;
use crate::config::{ExchangeRateConfig, LedgerConfig};
use crate::core_types::{CurrencyCode, TransferId, Version};
use crate::error::{AccountRole, LedgerError};
use crate::exchange_rate::{ExchangeRateError, ExchangeRateRegistry, ProviderKind};
use crate::money::{Amount, ExchangeRate};
use crate::query::{Page, PageRequest, TransferFilter};
use crate::store::{UnitOfWork, conflict_backoff};
use crate::transaction::recorder::TransactionRecorder;
use crate::transaction::types::{TransactionMethod, generate_reference};

/// Retry limits for the two recoverable failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPolicy {
    /// Extra attempts after a version conflict or duplicate reference
    pub max_conflict_retries: u32,
    /// Total rate lookups per transfer, including the first
    pub rate_max_attempts: u32,
    /// Sleep before rate lookup attempt `n` is `rate_backoff * (n - 1)`
    pub rate_backoff: Duration,
}

impl TransferPolicy {
    pub fn from_config(ledger: &LedgerConfig, rates: &ExchangeRateConfig) -> Self {
        Self {
            max_conflict_retries: ledger.max_conflict_retries,
            rate_max_attempts: rates.max_attempts.max(1),
            rate_backoff: Duration::from_millis(rates.backoff_ms),
        }
    }
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            rate_max_attempts: 2,
            rate_backoff: Duration::from_millis(100),
        }
    }
}

pub struct TransferCoordinator {
    recorder: Arc<TransactionRecorder>,
    rates: Arc<ExchangeRateRegistry>,
    policy: TransferPolicy,
}

impl TransferCoordinator {
    pub fn new(
        recorder: Arc<TransactionRecorder>,
        rates: Arc<ExchangeRateRegistry>,
        policy: TransferPolicy,
    ) -> Self {
        Self {
            recorder,
            rates,
            policy,
        }
    }

    pub fn policy(&self) -> TransferPolicy {
        self.policy
    }

    /// Move `cmd.amount` from one account to another, converting currency.
    ///
    /// Returns the committed transfer with status COMPLETED. On error no
    /// balance, transaction or transfer row has been written.
    pub async fn make_transfer(&self, cmd: TransferCommand) -> Result<Transfer, LedgerError> {
        let from = cmd.from_account.clone();
        let to = cmd.to_account.clone();
        match self.execute(cmd).await {
            Ok(transfer) => Ok(transfer),
            Err(e) => {
                if e.is_business() {
                    warn!(
                        from = %from,
                        to = %to,
                        state = %TransferStatus::Failed,
                        code = e.code(),
                        error = %e,
                        "Transfer rejected"
                    );
                } else {
                    error!(
                        from = %from,
                        to = %to,
                        state = %TransferStatus::Failed,
                        code = e.code(),
                        error = %e,
                        "Transfer failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn execute(&self, cmd: TransferCommand) -> Result<Transfer, LedgerError> {
        if !cmd.amount.is_positive() {
            return Err(LedgerError::validation("amount must be greater than zero"));
        }
        if cmd.from_account == cmd.to_account {
            return Err(LedgerError::validation(
                "source and destination accounts must differ",
            ));
        }
        let description = validation::description(cmd.description.as_deref())?;
        let provider = self.rates.resolve(cmd.rate_provider.as_deref())?;

        let mut state = TransferStatus::Initiated;
        let mut source = self.recorder.resolve(&cmd.from_account, AccountRole::Source).await?;
        let mut destination = self
            .recorder
            .resolve(&cmd.to_account, AccountRole::Destination)
            .await?;
        debug!(
            from = %cmd.from_account,
            to = %cmd.to_account,
            amount = %cmd.amount,
            provider = %provider,
            state = %state,
            "Transfer initiated"
        );

        let rate = self
            .fetch_rate(provider, &source.currency, &destination.currency)
            .await?;
        state = advance(state, TransferStatus::Pending);
        debug!(
            from = %cmd.from_account,
            to = %cmd.to_account,
            rate = %rate,
            state = %state,
            "Exchange rate locked"
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            let (work, transfer) =
                self.stage(&source, &destination, cmd.amount, rate, provider, &description)?;

            match self.recorder.store().commit(work).await {
                Ok(()) => {
                    state = advance(state, TransferStatus::Completed);
                    info!(
                        reference = %transfer.reference,
                        from = %transfer.from_account_number,
                        to = %transfer.to_account_number,
                        amount_sent = %transfer.amount_sent,
                        amount_received = %transfer.amount_received,
                        rate = %transfer.exchange_rate,
                        attempt,
                        state = %state,
                        "Transfer completed"
                    );
                    return Ok(transfer);
                }
                Err(e) if e.is_retryable() && attempt <= self.policy.max_conflict_retries => {
                    warn!(
                        reference = %transfer.reference,
                        attempt,
                        error = %e,
                        "Transfer commit rejected, re-reading accounts"
                    );
                    tokio::time::sleep(conflict_backoff(attempt)).await;
                    source = self.recorder.resolve(&cmd.from_account, AccountRole::Source).await?;
                    destination = self
                        .recorder
                        .resolve(&cmd.to_account, AccountRole::Destination)
                        .await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn stage(
        &self,
        source: &Account,
        destination: &Account,
        amount: Amount,
        rate: ExchangeRate,
        provider: ProviderKind,
        description: &Option<String>,
    ) -> Result<(UnitOfWork, Transfer), LedgerError> {
        let debit = self.recorder.stage_debit(
            source,
            amount,
            TransactionMethod::Transfer,
            description.clone(),
        )?;
        let received = amount.checked_convert(rate)?;
        if !received.is_positive() {
            return Err(LedgerError::validation(format!(
                "amount {amount} converts to {received} {}",
                destination.currency
            )));
        }
        let credit = self.recorder.stage_credit(
            destination,
            received,
            TransactionMethod::Transfer,
            description.clone(),
        )?;

        let transfer = Transfer {
            id: TransferId::new(),
            reference: generate_reference(TRANSFER_REFERENCE_PREFIX),
            debit_transaction_id: debit.transaction.id,
            debit_reference: debit.transaction.reference.clone(),
            credit_transaction_id: credit.transaction.id,
            credit_reference: credit.transaction.reference.clone(),
            from_account_id: source.id,
            from_account_number: source.account_number.clone(),
            to_account_id: destination.id,
            to_account_number: destination.account_number.clone(),
            from_currency: source.currency.clone(),
            to_currency: destination.currency.clone(),
            amount_sent: amount,
            amount_received: received,
            exchange_rate: rate,
            rate_provider: provider.as_str().to_string(),
            fee: Amount::ZERO,
            status: TransferStatus::Completed,
            description: description.clone(),
            timestamp: Utc::now(),
            version: Version::INITIAL,
        };
        let work = UnitOfWork {
            balance_updates: vec![debit.update, credit.update],
            transactions: vec![debit.transaction, credit.transaction],
            transfer: Some(transfer.clone()),
        };
        Ok((work, transfer))
    }

    /// Rate lookup with linear backoff. Only unavailability and timeouts are
    /// retried.
    async fn fetch_rate(
        &self,
        provider: ProviderKind,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<ExchangeRate, ExchangeRateError> {
        let mut attempt = 1;
        loop {
            match self.rates.get_rate(provider, from, to).await {
                Ok(rate) => return Ok(rate),
                Err(e) if e.is_retryable() && attempt < self.policy.rate_max_attempts => {
                    let delay = self.policy.rate_backoff * attempt;
                    warn!(
                        provider = %provider,
                        %from,
                        %to,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying exchange rate lookup"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn get_by_reference(&self, reference: &str) -> Result<Transfer, LedgerError> {
        let reference = reference.trim();
        self.recorder
            .store()
            .find_transfer_by_reference(reference)
            .await?
            .ok_or_else(|| LedgerError::TransferNotFound(reference.to_string()))
    }

    pub async fn list(
        &self,
        filter: &TransferFilter,
        page: &PageRequest,
    ) -> Result<Page<Transfer>, LedgerError> {
        Ok(self.recorder.store().list_transfers(filter, page).await?)
    }
}

fn advance(from: TransferStatus, to: TransferStatus) -> TransferStatus {
    debug_assert!(from.can_transition_to(to), "{from} -> {to}");
    to
}
