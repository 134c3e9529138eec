use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use fund_transfer::account::{
    Account, AccountLedger, AccountService, AccountStatus, Client, NewAccount, NewClient,
};
use fund_transfer::core_types::{AccountId, AccountNumber, ClientId, CurrencyCode};
use fund_transfer::exchange_rate::{ExchangeRateRegistry, FixedRates, ProviderKind, RateProvider};
use fund_transfer::query::{
    AccountFilter, ClientFilter, Page, PageRequest, TransactionFilter, TransferFilter,
};
use fund_transfer::store::{LedgerStore, MemoryStore, StoreError, UnitOfWork};
use fund_transfer::transaction::{
    EntryCommand, Transaction, TransactionMethod, TransactionStatus, TransactionType,
};
use fund_transfer::transfer::{
    Transfer, TransferCommand, TransferCoordinator, TransferPolicy, TransferStatus,
};
use fund_transfer::{Amount, ExchangeRate, LedgerError, TransactionRecorder};

// ============================================================================
// Fixtures
// ============================================================================

struct Ledger {
    store: Arc<MemoryStore>,
    accounts: AccountService,
    recorder: Arc<TransactionRecorder>,
    transfers: Arc<TransferCoordinator>,
}

fn amount(s: &str) -> Amount {
    Amount::parse(s).unwrap()
}

fn ccy(s: &str) -> CurrencyCode {
    CurrencyCode::new(s).unwrap()
}

fn registry() -> ExchangeRateRegistry {
    let fixed = FixedRates::new()
        .with_rate(ccy("USD"), ccy("EUR"), ExchangeRate::parse("1.25").unwrap())
        .with_rate(ccy("EUR"), ccy("USD"), ExchangeRate::parse("0.8").unwrap())
        .with_rate(ccy("USD"), ccy("JPY"), ExchangeRate::parse("149.333").unwrap());
    ExchangeRateRegistry::new(ProviderKind::Fixed, Duration::from_secs(1))
        .with_provider(RateProvider::Fixed(fixed))
}

fn ledger_with(store: Arc<MemoryStore>, shared: Arc<dyn LedgerStore>, retries: u32) -> Ledger {
    let recorder = Arc::new(TransactionRecorder::new(
        shared.clone(),
        AccountLedger::default(),
        retries,
    ));
    let policy = TransferPolicy {
        max_conflict_retries: retries,
        rate_max_attempts: 2,
        rate_backoff: Duration::from_millis(1),
    };
    let transfers = Arc::new(TransferCoordinator::new(
        recorder.clone(),
        Arc::new(registry()),
        policy,
    ));
    Ledger {
        store,
        accounts: AccountService::new(shared),
        recorder,
        transfers,
    }
}

fn ledger() -> Ledger {
    let store = Arc::new(MemoryStore::new());
    ledger_with(store.clone(), store, 3)
}

static SEQ: AtomicU32 = AtomicU32::new(0);

async fn open_account(ledger: &Ledger, currency: &str, balance: &str) -> Account {
    let n = SEQ.fetch_add(1, Ordering::Relaxed);
    let client = ledger
        .accounts
        .create_client(NewClient {
            name: format!("Client {n}"),
            email: format!("client{n}@example.com"),
            phone: format!("+1555{n:07}"),
        })
        .await
        .unwrap();
    let account = ledger
        .accounts
        .create_account(NewAccount {
            owner_id: client.id,
            currency: currency.into(),
            status: None,
        })
        .await
        .unwrap();
    if balance != "0" {
        ledger
            .recorder
            .record_credit(entry(&account.account_number, balance))
            .await
            .unwrap();
    }
    account
}

fn entry(number: &AccountNumber, value: &str) -> EntryCommand {
    EntryCommand {
        account_number: number.clone(),
        amount: amount(value),
        method: TransactionMethod::Desk,
        description: None,
    }
}

fn transfer(from: &Account, to: &Account, value: &str) -> TransferCommand {
    TransferCommand {
        from_account: from.account_number.clone(),
        to_account: to.account_number.clone(),
        amount: amount(value),
        description: Some("invoice 42".into()),
        rate_provider: None,
    }
}

async fn balance_of(ledger: &Ledger, account: &Account) -> Amount {
    ledger
        .accounts
        .get_account_by_number(&account.account_number)
        .await
        .unwrap()
        .total_balance
}

// ============================================================================
// Debit / credit properties
// ============================================================================

#[tokio::test]
async fn inactive_accounts_reject_debit_and_credit() {
    let ledger = ledger();
    for status in [
        AccountStatus::Inactive,
        AccountStatus::Suspended,
        AccountStatus::Closed,
    ] {
        let account = open_account(&ledger, "USD", "50").await;
        ledger
            .accounts
            .update_account_status(&account.account_number, status)
            .await
            .unwrap();

        let err = ledger
            .recorder
            .record_debit(entry(&account.account_number, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountInactive { .. }), "{status}");
        let err = ledger
            .recorder
            .record_credit(entry(&account.account_number, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountInactive { .. }), "{status}");
        assert_eq!(balance_of(&ledger, &account).await, amount("50"));
    }
}

#[tokio::test]
async fn soft_deleted_account_is_not_active() {
    let ledger = ledger();
    let account = open_account(&ledger, "USD", "50").await;
    ledger
        .accounts
        .delete_account(&account.account_number)
        .await
        .unwrap();
    let err = ledger
        .recorder
        .record_credit(entry(&account.account_number, "1"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::AccountInactive {
            account_number: account.account_number.to_string(),
            state: "DELETED",
        }
    );
}

#[tokio::test]
async fn debit_at_or_above_balance_is_insufficient() {
    let ledger = ledger();
    let account = open_account(&ledger, "USD", "100").await;
    for value in ["100", "100.001", "5000"] {
        let err = ledger
            .recorder
            .record_debit(entry(&account.account_number, value))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }), "{value}");
    }
    assert_eq!(balance_of(&ledger, &account).await, amount("100"));
}

#[tokio::test]
async fn debit_below_balance_truncates_and_records_one_entry() {
    let ledger = ledger();
    let account = open_account(&ledger, "USD", "100").await;

    let tx = ledger
        .recorder
        .record_debit(entry(&account.account_number, "33.3339"))
        .await
        .unwrap();

    assert_eq!(tx.tx_type, TransactionType::Debit);
    assert_eq!(tx.status, TransactionStatus::Success);
    assert_eq!(tx.amount, amount("33.333"));
    assert_eq!(balance_of(&ledger, &account).await, amount("66.667"));

    let filter = TransactionFilter {
        account_number: Some(account.account_number.clone()),
        tx_type: Some(TransactionType::Debit),
        ..TransactionFilter::default()
    };
    let page = ledger
        .recorder
        .list(&filter, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_items, 1);
}

#[tokio::test]
async fn credit_then_debit_round_trips() {
    let ledger = ledger();
    let account = open_account(&ledger, "EUR", "10").await;
    ledger
        .recorder
        .record_credit(entry(&account.account_number, "123.456"))
        .await
        .unwrap();
    ledger
        .recorder
        .record_debit(entry(&account.account_number, "123.456"))
        .await
        .unwrap();
    let stored = ledger
        .accounts
        .get_account_by_number(&account.account_number)
        .await
        .unwrap();
    assert_eq!(stored.total_balance, amount("10"));
    assert_eq!(stored.usable_balance, amount("10"));
}

// ============================================================================
// Transfer properties
// ============================================================================

#[tokio::test]
async fn usd_to_eur_scenario() {
    let ledger = ledger();
    let a = open_account(&ledger, "USD", "1000").await;
    let b = open_account(&ledger, "EUR", "500").await;
    let tx_before = ledger.store.transaction_count().await;

    let t = ledger.transfers.make_transfer(transfer(&a, &b, "100")).await.unwrap();

    assert_eq!(balance_of(&ledger, &a).await, amount("900"));
    assert_eq!(balance_of(&ledger, &b).await, amount("625"));
    assert_eq!(t.amount_received, amount("125"));
    assert_eq!(t.status, TransferStatus::Completed);
    assert_eq!(t.from_currency, ccy("USD"));
    assert_eq!(t.to_currency, ccy("EUR"));
    assert_eq!(ledger.store.transaction_count().await, tx_before + 2);

    let debit = ledger.recorder.get_by_reference(&t.debit_reference).await.unwrap();
    assert_eq!(debit.tx_type, TransactionType::Debit);
    assert_eq!(debit.account_number, a.account_number);
    assert_eq!(debit.amount, amount("100"));
    let credit = ledger.recorder.get_by_reference(&t.credit_reference).await.unwrap();
    assert_eq!(credit.tx_type, TransactionType::Credit);
    assert_eq!(credit.account_number, b.account_number);
    assert_eq!(credit.amount, amount("125"));
}

#[tokio::test]
async fn same_currency_transfer_is_one_to_one() {
    let ledger = ledger();
    let a = open_account(&ledger, "EUR", "10").await;
    let b = open_account(&ledger, "EUR", "0").await;
    let t = ledger
        .transfers
        .make_transfer(transfer(&a, &b, "9.9999"))
        .await
        .unwrap();
    assert_eq!(t.exchange_rate, ExchangeRate::ONE);
    assert_eq!(t.amount_sent, amount("9.999"));
    assert_eq!(t.amount_received, t.amount_sent);
}

#[tokio::test]
async fn converted_amount_truncates_toward_zero() {
    let ledger = ledger();
    let a = open_account(&ledger, "USD", "10").await;
    let b = open_account(&ledger, "JPY", "0").await;
    // 0.007 * 149.333 = 1.045331
    let t = ledger
        .transfers
        .make_transfer(transfer(&a, &b, "0.007"))
        .await
        .unwrap();
    assert_eq!(t.amount_received, amount("1.045"));
}

#[tokio::test]
async fn failing_rate_provider_changes_nothing() {
    let ledger = ledger();
    let a = open_account(&ledger, "GBP", "100").await;
    let b = open_account(&ledger, "EUR", "100").await;
    let tx_before = ledger.store.transaction_count().await;

    let err = ledger
        .transfers
        .make_transfer(transfer(&a, &b, "10"))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::ExchangeRateUnavailable(_)));
    assert!(!err.is_business());
    assert_eq!(balance_of(&ledger, &a).await, amount("100"));
    assert_eq!(balance_of(&ledger, &b).await, amount("100"));
    assert_eq!(ledger.store.transaction_count().await, tx_before);
    assert_eq!(ledger.store.transfer_count().await, 0);
}

#[tokio::test]
async fn unknown_source_account() {
    let ledger = ledger();
    let b = open_account(&ledger, "EUR", "0").await;
    let tx_before = ledger.store.transaction_count().await;

    let err = ledger
        .transfers
        .make_transfer(TransferCommand {
            from_account: AccountNumber::from("ACC-DOES-NOT-EXIST"),
            ..transfer(&b, &b, "1")
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Source Account Not Found");
    assert_eq!(err.code(), "SOURCE_ACCOUNT_NOT_FOUND");
    assert_eq!(ledger.store.transaction_count().await, tx_before);
    assert_eq!(ledger.store.transfer_count().await, 0);
}

#[tokio::test]
async fn unknown_destination_account() {
    let ledger = ledger();
    let a = open_account(&ledger, "USD", "10").await;
    let err = ledger
        .transfers
        .make_transfer(TransferCommand {
            to_account: AccountNumber::from("ACC-DOES-NOT-EXIST"),
            ..transfer(&a, &a, "1")
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Destination Account Not Found");
    assert_eq!(balance_of(&ledger, &a).await, amount("10"));
}

#[tokio::test]
async fn failed_credit_leg_rolls_back_debit() {
    let ledger = ledger();
    let a = open_account(&ledger, "USD", "100").await;
    let b = open_account(&ledger, "EUR", "0").await;
    ledger
        .accounts
        .update_account_status(&b.account_number, AccountStatus::Suspended)
        .await
        .unwrap();

    let err = ledger
        .transfers
        .make_transfer(transfer(&a, &b, "10"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountInactive { .. }));
    assert_eq!(balance_of(&ledger, &a).await, amount("100"));
    assert_eq!(ledger.store.transfer_count().await, 0);
}

#[tokio::test]
async fn transfers_are_listed_by_filter() {
    let ledger = ledger();
    let a = open_account(&ledger, "USD", "1000").await;
    let b = open_account(&ledger, "EUR", "0").await;
    let c = open_account(&ledger, "USD", "0").await;
    for value in ["10", "20", "30"] {
        ledger.transfers.make_transfer(transfer(&a, &b, value)).await.unwrap();
    }
    ledger.transfers.make_transfer(transfer(&a, &c, "40")).await.unwrap();

    let page = ledger
        .transfers
        .list(
            &TransferFilter {
                to_currency: Some(ccy("EUR")),
                min_amount: Some(amount("15")),
                ..TransferFilter::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total_items, 2);
    assert!(page.items.iter().all(|t| t.to_account_number == b.account_number));

    let page = ledger
        .transfers
        .list(
            &TransferFilter {
                status: Some(TransferStatus::Completed),
                ..TransferFilter::default()
            },
            &PageRequest::new(1, 3, Default::default()),
        )
        .await
        .unwrap();
    assert_eq!(page.total_items, 4);
    assert_eq!(page.items.len(), 1);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_debits_never_overdraw() {
    let ledger = ledger();
    let account = open_account(&ledger, "USD", "100").await;

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let recorder = ledger.recorder.clone();
            let number = account.account_number.clone();
            tokio::spawn(async move { recorder.record_debit(entry(&number, "60")).await })
        })
        .collect();

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) => assert!(
                matches!(
                    e,
                    LedgerError::InsufficientFunds { .. } | LedgerError::ConcurrentModification { .. }
                ),
                "unexpected {e:?}"
            ),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(balance_of(&ledger, &account).await, amount("40"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_conserve_value() {
    let store = Arc::new(MemoryStore::new());
    let ledger = ledger_with(store.clone(), store, 50);
    let a = open_account(&ledger, "USD", "1000").await;
    let b = open_account(&ledger, "EUR", "0").await;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let transfers = ledger.transfers.clone();
            let cmd = transfer(&a, &b, "10");
            tokio::spawn(async move { transfers.make_transfer(cmd).await })
        })
        .collect();

    let mut completed = 0u32;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            completed += 1;
        }
    }

    let sent = amount("10").value() * rust_decimal::Decimal::from(completed);
    assert_eq!(
        balance_of(&ledger, &a).await,
        Amount::new(rust_decimal::Decimal::from(1000) - sent).unwrap()
    );
    assert_eq!(
        balance_of(&ledger, &b).await,
        Amount::new(sent * rust_decimal::Decimal::new(125, 2)).unwrap()
    );
    assert_eq!(ledger.store.transfer_count().await, completed as usize);
}

// ============================================================================
// Conflict injection
// ============================================================================

/// Rejects the first `conflicts` commits with a version conflict.
struct ConflictingStore {
    inner: Arc<MemoryStore>,
    conflicts: AtomicU32,
    commits: AtomicU32,
}

impl ConflictingStore {
    fn new(inner: Arc<MemoryStore>, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts: AtomicU32::new(conflicts),
            commits: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl LedgerStore for ConflictingStore {
    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        self.inner.insert_client(client).await
    }
    async fn update_client(&self, client: &Client) -> Result<Client, StoreError> {
        self.inner.update_client(client).await
    }
    async fn find_client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        self.inner.find_client(id).await
    }
    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>, StoreError> {
        self.inner.find_client_by_email(email).await
    }
    async fn find_client_by_phone(&self, phone: &str) -> Result<Option<Client>, StoreError> {
        self.inner.find_client_by_phone(phone).await
    }
    async fn list_clients(
        &self,
        filter: &ClientFilter,
        page: &PageRequest,
    ) -> Result<Page<Client>, StoreError> {
        self.inner.list_clients(filter, page).await
    }
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.inner.insert_account(account).await
    }
    async fn update_account(&self, account: &Account) -> Result<Account, StoreError> {
        self.inner.update_account(account).await
    }
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        self.inner.find_account(id).await
    }
    async fn find_account_by_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, StoreError> {
        self.inner.find_account_by_number(number).await
    }
    async fn list_accounts(
        &self,
        filter: &AccountFilter,
        page: &PageRequest,
    ) -> Result<Page<Account>, StoreError> {
        self.inner.list_accounts(filter, page).await
    }
    async fn find_transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, StoreError> {
        self.inner.find_transaction_by_reference(reference).await
    }
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: &PageRequest,
    ) -> Result<Page<Transaction>, StoreError> {
        self.inner.list_transactions(filter, page).await
    }
    async fn find_transfer_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transfer>, StoreError> {
        self.inner.find_transfer_by_reference(reference).await
    }
    async fn list_transfers(
        &self,
        filter: &TransferFilter,
        page: &PageRequest,
    ) -> Result<Page<Transfer>, StoreError> {
        self.inner.list_transfers(filter, page).await
    }
    async fn commit(&self, work: UnitOfWork) -> Result<(), StoreError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Conflict {
                entity: "account",
                key: "injected".into(),
            });
        }
        self.inner.commit(work).await
    }
}

#[tokio::test]
async fn transfer_retries_past_version_conflicts() {
    let memory = Arc::new(MemoryStore::new());
    let flaky = Arc::new(ConflictingStore::new(memory.clone(), 0));
    let ledger = ledger_with(memory.clone(), flaky.clone(), 3);
    let a = open_account(&ledger, "USD", "100").await;
    let b = open_account(&ledger, "EUR", "0").await;

    flaky.conflicts.store(2, Ordering::SeqCst);
    flaky.commits.store(0, Ordering::SeqCst);

    let t = ledger.transfers.make_transfer(transfer(&a, &b, "10")).await.unwrap();
    assert_eq!(flaky.commits.load(Ordering::SeqCst), 3);
    assert_eq!(t.status, TransferStatus::Completed);
    assert_eq!(balance_of(&ledger, &a).await, amount("90"));
    assert_eq!(memory.transfer_count().await, 1);
}

#[tokio::test]
async fn exhausted_retries_surface_concurrent_modification() {
    let memory = Arc::new(MemoryStore::new());
    let flaky = Arc::new(ConflictingStore::new(memory.clone(), 0));
    let ledger = ledger_with(memory.clone(), flaky.clone(), 2);
    let a = open_account(&ledger, "USD", "100").await;
    let b = open_account(&ledger, "EUR", "0").await;

    flaky.conflicts.store(u32::MAX, Ordering::SeqCst);
    flaky.commits.store(0, Ordering::SeqCst);

    let err = ledger
        .transfers
        .make_transfer(transfer(&a, &b, "10"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ConcurrentModification { .. }));
    assert!(!err.is_business());
    // First attempt plus two retries
    assert_eq!(flaky.commits.load(Ordering::SeqCst), 3);
    assert_eq!(balance_of(&ledger, &a).await, amount("100"));
    assert_eq!(memory.transfer_count().await, 0);

    flaky.conflicts.store(1, Ordering::SeqCst);
    let err = ledger
        .recorder
        .record_credit(entry(&a.account_number, "1"))
        .await;
    assert!(err.is_ok(), "one conflict is within the retry budget");
}
