//! PostgreSQL ledger store
//!
//! A unit of work runs in one database transaction: balance updates are
//! compare-and-swap writes on `version`, followed by the inserts. Any failure
//! drops the transaction, which rolls everything back.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::schema::{
    ACCOUNTS_NUMBER_KEY, CLIENTS_EMAIL_KEY, CLIENTS_PHONE_KEY, TRANSACTIONS_REFERENCE_KEY,
    TRANSFERS_REFERENCE_KEY,
};
use super::{LedgerStore, StoreError, UnitOfWork};
use crate::account::models::{Account, AccountStatus, Client};
use crate::core_types::{
    AccountId, AccountNumber, Auditable, ClientId, CurrencyCode, EntityId, Version,
};
use crate::db::Database;
use crate::money::{Amount, ExchangeRate};
use crate::query::{
    AccountFilter, ClientFilter, Page, PageRequest, TransactionFilter, TransferFilter,
};
use crate::transaction::types::{
    Transaction, TransactionMethod, TransactionStatus, TransactionType,
};
use crate::transfer::state::TransferStatus;
use crate::transfer::types::Transfer;

/// SQLSTATEs that abort a transaction only because of a concurrent writer.
const DEADLOCK_DETECTED: &str = "40P01";
const SERIALIZATION_FAILURE: &str = "40001";

fn is_write_race(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().as_deref(),
            Some(DEADLOCK_DETECTED | SERIALIZATION_FAILURE)
        ),
        _ => false,
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_write_race(&err) {
            return StoreError::Conflict {
                entity: "transaction",
                key: err.to_string(),
            };
        }
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return match db_err.constraint() {
                    Some(CLIENTS_EMAIL_KEY) => StoreError::UniqueViolation { field: "email" },
                    Some(CLIENTS_PHONE_KEY) => StoreError::UniqueViolation { field: "phone" },
                    Some(ACCOUNTS_NUMBER_KEY) => StoreError::UniqueViolation {
                        field: "account_number",
                    },
                    Some(c @ (TRANSACTIONS_REFERENCE_KEY | TRANSFERS_REFERENCE_KEY)) => {
                        StoreError::DuplicateReference(c.to_string())
                    }
                    _ => StoreError::Backend(db_err.to_string()),
                };
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// Replace the constraint name of a duplicate-reference error by the value.
fn with_reference(err: sqlx::Error, reference: &str) -> StoreError {
    match StoreError::from(err) {
        StoreError::DuplicateReference(_) => StoreError::DuplicateReference(reference.to_string()),
        other => other,
    }
}

/// Attribute a write race on a balance row to that account.
fn on_account(err: sqlx::Error, number: &AccountNumber) -> StoreError {
    match StoreError::from(err) {
        StoreError::Conflict { .. } => StoreError::Conflict {
            entity: "account",
            key: number.to_string(),
        },
        other => other,
    }
}

fn corrupt(what: &str, value: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("Invalid {} in database: {}", what, value))
}

fn get_id(row: &PgRow, column: &str) -> Result<EntityId, StoreError> {
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|_| corrupt(column, raw))
}

fn get_currency(row: &PgRow, column: &str) -> Result<CurrencyCode, StoreError> {
    let raw: String = row.try_get(column)?;
    CurrencyCode::new(&raw).map_err(|_| corrupt(column, raw))
}

fn get_amount(row: &PgRow, column: &str) -> Result<Amount, StoreError> {
    let raw: Decimal = row.try_get(column)?;
    Amount::new(raw).map_err(|_| corrupt(column, raw))
}

const CLIENT_COLUMNS: &str =
    "client_id, name, email, phone, deleted, version, created_at, updated_at";

const ACCOUNT_COLUMNS: &str = "account_id, account_number, owner_id, currency, status, \
     total_balance, usable_balance, deleted, version, created_at, updated_at";

const TRANSACTION_SELECT: &str = r#"
    SELECT t.transaction_id, t.reference, t.account_id, a.account_number, a.currency,
           t.tx_type, t.method, t.status, t.amount, t.description, t.created_at, t.version
    FROM transactions_tb t
    JOIN accounts_tb a ON a.account_id = t.account_id
"#;

const TRANSACTION_COUNT: &str = r#"
    SELECT COUNT(*) FROM transactions_tb t
    JOIN accounts_tb a ON a.account_id = t.account_id
"#;

const TRANSFER_SELECT: &str = r#"
    SELECT tr.transfer_id, tr.reference,
           tr.debit_transaction_id, d.reference AS debit_reference,
           tr.credit_transaction_id, c.reference AS credit_reference,
           tr.from_account_id, fa.account_number AS from_account_number,
           tr.to_account_id, ta.account_number AS to_account_number,
           tr.from_currency, tr.to_currency, tr.amount_sent, tr.amount_received,
           tr.exchange_rate, tr.rate_provider, tr.fee, tr.status, tr.description,
           tr.created_at, tr.version
    FROM transfers_tb tr
    JOIN transactions_tb d ON d.transaction_id = tr.debit_transaction_id
    JOIN transactions_tb c ON c.transaction_id = tr.credit_transaction_id
    JOIN accounts_tb fa ON fa.account_id = tr.from_account_id
    JOIN accounts_tb ta ON ta.account_id = tr.to_account_id
"#;

const TRANSFER_COUNT: &str = r#"
    SELECT COUNT(*) FROM transfers_tb tr
    JOIN accounts_tb fa ON fa.account_id = tr.from_account_id
    JOIN accounts_tb ta ON ta.account_id = tr.to_account_id
"#;

fn push_transaction_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &TransactionFilter) {
    qb.push(" WHERE TRUE");
    if let Some(number) = &filter.account_number {
        qb.push(" AND a.account_number = ").push_bind(number.as_str().to_string());
    }
    if let Some(tx_type) = filter.tx_type {
        qb.push(" AND t.tx_type = ").push_bind(tx_type.id());
    }
    if let Some(status) = filter.status {
        qb.push(" AND t.status = ").push_bind(status.id());
    }
    if let Some(method) = filter.method {
        qb.push(" AND t.method = ").push_bind(method.id());
    }
    if let Some(from) = filter.from {
        qb.push(" AND t.created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND t.created_at <= ").push_bind(to);
    }
}

fn push_transfer_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &TransferFilter) {
    qb.push(" WHERE TRUE");
    if let Some(number) = &filter.from_account {
        qb.push(" AND fa.account_number = ").push_bind(number.as_str().to_string());
    }
    if let Some(number) = &filter.to_account {
        qb.push(" AND ta.account_number = ").push_bind(number.as_str().to_string());
    }
    if let Some(currency) = &filter.from_currency {
        qb.push(" AND tr.from_currency = ").push_bind(currency.as_str().to_string());
    }
    if let Some(currency) = &filter.to_currency {
        qb.push(" AND tr.to_currency = ").push_bind(currency.as_str().to_string());
    }
    if let Some(status) = filter.status {
        qb.push(" AND tr.status = ").push_bind(status.id());
    }
    if let Some(min) = filter.min_amount {
        qb.push(" AND tr.amount_sent >= ").push_bind(min.value());
    }
    if let Some(max) = filter.max_amount {
        qb.push(" AND tr.amount_sent <= ").push_bind(max.value());
    }
    if let Some(from) = filter.from {
        qb.push(" AND tr.created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND tr.created_at <= ").push_bind(to);
    }
}

fn push_client_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ClientFilter) {
    qb.push(" WHERE deleted = FALSE");
    if let Some(needle) = filter.needle() {
        let pattern = format!("%{}%", escape_like(&needle));
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE` pattern.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn push_account_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &AccountFilter) {
    qb.push(" WHERE TRUE");
    if !filter.include_deleted {
        qb.push(" AND deleted = FALSE");
    }
    if let Some(owner) = filter.owner_id {
        qb.push(" AND owner_id = ").push_bind(owner.to_string());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.id());
    }
    if let Some(currency) = &filter.currency {
        qb.push(" AND currency = ").push_bind(currency.as_str().to_string());
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, column: &str, page: &PageRequest) {
    qb.push(format!(" ORDER BY {} {}", column, page.sort.as_sql()))
        .push(" LIMIT ")
        .push_bind(page.limit() as i64)
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    fn row_to_client(row: &PgRow) -> Result<Client, StoreError> {
        Ok(Client {
            id: get_id(row, "client_id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            deleted: row.try_get("deleted")?,
            audit: Auditable {
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            },
            version: Version::new(row.try_get("version")?),
        })
    }

    fn row_to_account(row: &PgRow) -> Result<Account, StoreError> {
        let status_id: i16 = row.try_get("status")?;
        let account_number: String = row.try_get("account_number")?;
        Ok(Account {
            id: get_id(row, "account_id")?,
            account_number: AccountNumber::from(account_number),
            owner_id: get_id(row, "owner_id")?,
            currency: get_currency(row, "currency")?,
            status: AccountStatus::from_id(status_id).ok_or_else(|| corrupt("status", status_id))?,
            total_balance: get_amount(row, "total_balance")?,
            usable_balance: get_amount(row, "usable_balance")?,
            deleted: row.try_get("deleted")?,
            audit: Auditable {
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            },
            version: Version::new(row.try_get("version")?),
        })
    }

    fn row_to_transaction(row: &PgRow) -> Result<Transaction, StoreError> {
        let type_id: i16 = row.try_get("tx_type")?;
        let method_id: i16 = row.try_get("method")?;
        let status_id: i16 = row.try_get("status")?;
        let account_number: String = row.try_get("account_number")?;
        Ok(Transaction {
            id: get_id(row, "transaction_id")?,
            reference: row.try_get("reference")?,
            account_id: get_id(row, "account_id")?,
            account_number: AccountNumber::from(account_number),
            currency: get_currency(row, "currency")?,
            tx_type: TransactionType::from_id(type_id).ok_or_else(|| corrupt("tx_type", type_id))?,
            method: TransactionMethod::from_id(method_id)
                .ok_or_else(|| corrupt("method", method_id))?,
            status: TransactionStatus::from_id(status_id)
                .ok_or_else(|| corrupt("status", status_id))?,
            amount: get_amount(row, "amount")?,
            description: row.try_get("description")?,
            timestamp: row.try_get("created_at")?,
            version: Version::new(row.try_get("version")?),
        })
    }

    fn row_to_transfer(row: &PgRow) -> Result<Transfer, StoreError> {
        let status_id: i16 = row.try_get("status")?;
        let rate: Decimal = row.try_get("exchange_rate")?;
        let from_number: String = row.try_get("from_account_number")?;
        let to_number: String = row.try_get("to_account_number")?;
        Ok(Transfer {
            id: get_id(row, "transfer_id")?,
            reference: row.try_get("reference")?,
            debit_transaction_id: get_id(row, "debit_transaction_id")?,
            debit_reference: row.try_get("debit_reference")?,
            credit_transaction_id: get_id(row, "credit_transaction_id")?,
            credit_reference: row.try_get("credit_reference")?,
            from_account_id: get_id(row, "from_account_id")?,
            from_account_number: AccountNumber::from(from_number),
            to_account_id: get_id(row, "to_account_id")?,
            to_account_number: AccountNumber::from(to_number),
            from_currency: get_currency(row, "from_currency")?,
            to_currency: get_currency(row, "to_currency")?,
            amount_sent: get_amount(row, "amount_sent")?,
            amount_received: get_amount(row, "amount_received")?,
            exchange_rate: ExchangeRate::new(rate).map_err(|_| corrupt("exchange_rate", rate))?,
            rate_provider: row.try_get("rate_provider")?,
            fee: get_amount(row, "fee")?,
            status: TransferStatus::from_id(status_id)
                .ok_or_else(|| corrupt("status", status_id))?,
            description: row.try_get("description")?,
            timestamp: row.try_get("created_at")?,
            version: Version::new(row.try_get("version")?),
        })
    }

    async fn count(&self, mut qb: QueryBuilder<'_, Postgres>) -> Result<u64, StoreError> {
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO clients_tb
                (client_id, name, email, phone, deleted, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(client.id.to_string())
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(client.deleted)
        .bind(client.version.get())
        .bind(client.audit.created_at)
        .bind(client.audit.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_client(&self, client: &Client) -> Result<Client, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE clients_tb
            SET name = $1, email = $2, phone = $3, deleted = $4,
                version = version + 1, updated_at = NOW()
            WHERE client_id = $5 AND version = $6
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        ))
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(client.deleted)
        .bind(client.id.to_string())
        .bind(client.version.get())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_client(&row),
            None => Err(StoreError::Conflict {
                entity: "client",
                key: client.id.to_string(),
            }),
        }
    }

    async fn find_client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM clients_tb WHERE client_id = $1",
            CLIENT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_client).transpose()
    }

    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM clients_tb WHERE email = $1",
            CLIENT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_client).transpose()
    }

    async fn find_client_by_phone(&self, phone: &str) -> Result<Option<Client>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM clients_tb WHERE phone = $1",
            CLIENT_COLUMNS
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_client).transpose()
    }

    async fn list_clients(
        &self,
        filter: &ClientFilter,
        page: &PageRequest,
    ) -> Result<Page<Client>, StoreError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM clients_tb");
        push_client_filter(&mut count_qb, filter);
        let total = self.count(count_qb).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {} FROM clients_tb", CLIENT_COLUMNS));
        push_client_filter(&mut qb, filter);
        push_page(&mut qb, "created_at", page);
        let rows = qb.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(Self::row_to_client)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, total))
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts_tb
                (account_id, account_number, owner_id, currency, status, total_balance,
                 usable_balance, deleted, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(account.id.to_string())
        .bind(account.account_number.as_str())
        .bind(account.owner_id.to_string())
        .bind(account.currency.as_str())
        .bind(account.status.id())
        .bind(account.total_balance.value())
        .bind(account.usable_balance.value())
        .bind(account.deleted)
        .bind(account.version.get())
        .bind(account.audit.created_at)
        .bind(account.audit.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> Result<Account, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE accounts_tb
            SET status = $1, deleted = $2, version = version + 1, updated_at = NOW()
            WHERE account_id = $3 AND version = $4
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(account.status.id())
        .bind(account.deleted)
        .bind(account.id.to_string())
        .bind(account.version.get())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_account(&row),
            None => Err(StoreError::Conflict {
                entity: "account",
                key: account.account_number.to_string(),
            }),
        }
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts_tb WHERE account_id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_account).transpose()
    }

    async fn find_account_by_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts_tb WHERE account_number = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(number.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_account).transpose()
    }

    async fn list_accounts(
        &self,
        filter: &AccountFilter,
        page: &PageRequest,
    ) -> Result<Page<Account>, StoreError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM accounts_tb");
        push_account_filter(&mut count_qb, filter);
        let total = self.count(count_qb).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {} FROM accounts_tb", ACCOUNT_COLUMNS));
        push_account_filter(&mut qb, filter);
        push_page(&mut qb, "created_at", page);
        let rows = qb.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(Self::row_to_account)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, total))
    }

    async fn find_transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, StoreError> {
        let row = sqlx::query(&format!("{} WHERE t.reference = $1", TRANSACTION_SELECT))
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: &PageRequest,
    ) -> Result<Page<Transaction>, StoreError> {
        let mut count_qb = QueryBuilder::new(TRANSACTION_COUNT);
        push_transaction_filter(&mut count_qb, filter);
        let total = self.count(count_qb).await?;

        let mut qb = QueryBuilder::new(TRANSACTION_SELECT);
        push_transaction_filter(&mut qb, filter);
        push_page(&mut qb, "t.created_at", page);
        let rows = qb.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(Self::row_to_transaction)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, total))
    }

    async fn find_transfer_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transfer>, StoreError> {
        let row = sqlx::query(&format!("{} WHERE tr.reference = $1", TRANSFER_SELECT))
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_transfer).transpose()
    }

    async fn list_transfers(
        &self,
        filter: &TransferFilter,
        page: &PageRequest,
    ) -> Result<Page<Transfer>, StoreError> {
        let mut count_qb = QueryBuilder::new(TRANSFER_COUNT);
        push_transfer_filter(&mut count_qb, filter);
        let total = self.count(count_qb).await?;

        let mut qb = QueryBuilder::new(TRANSFER_SELECT);
        push_transfer_filter(&mut qb, filter);
        push_page(&mut qb, "tr.created_at", page);
        let rows = qb.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(Self::row_to_transfer)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, total))
    }

    async fn commit(&self, work: UnitOfWork) -> Result<(), StoreError> {
        let mut db_tx = self.pool.begin().await?;

        // Row locks are taken in account id order so that opposite-direction
        // transfers cannot deadlock each other.
        let mut updates: Vec<_> = work.balance_updates.iter().collect();
        updates.sort_by_key(|update| update.account_id);

        for update in updates {
            let result = sqlx::query(
                r#"
                UPDATE accounts_tb
                SET total_balance = $1, usable_balance = $2,
                    version = version + 1, updated_at = NOW()
                WHERE account_id = $3 AND version = $4
                "#,
            )
            .bind(update.total_balance.value())
            .bind(update.usable_balance.value())
            .bind(update.account_id.to_string())
            .bind(update.expected_version.get())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| on_account(e, &update.account_number))?;

            if result.rows_affected() == 0 {
                // Dropping db_tx rolls back earlier updates
                return Err(StoreError::Conflict {
                    entity: "account",
                    key: update.account_number.to_string(),
                });
            }
        }

        for tx in &work.transactions {
            sqlx::query(
                r#"
                INSERT INTO transactions_tb
                    (transaction_id, reference, account_id, tx_type, method, status,
                     amount, description, created_at, version)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(tx.id.to_string())
            .bind(&tx.reference)
            .bind(tx.account_id.to_string())
            .bind(tx.tx_type.id())
            .bind(tx.method.id())
            .bind(tx.status.id())
            .bind(tx.amount.value())
            .bind(&tx.description)
            .bind(tx.timestamp)
            .bind(tx.version.get())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| with_reference(e, &tx.reference))?;
        }

        if let Some(transfer) = &work.transfer {
            sqlx::query(
                r#"
                INSERT INTO transfers_tb
                    (transfer_id, reference, debit_transaction_id, credit_transaction_id,
                     from_account_id, to_account_id, from_currency, to_currency,
                     amount_sent, amount_received, exchange_rate, rate_provider, fee,
                     status, description, created_at, version)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                "#,
            )
            .bind(transfer.id.to_string())
            .bind(&transfer.reference)
            .bind(transfer.debit_transaction_id.to_string())
            .bind(transfer.credit_transaction_id.to_string())
            .bind(transfer.from_account_id.to_string())
            .bind(transfer.to_account_id.to_string())
            .bind(transfer.from_currency.as_str())
            .bind(transfer.to_currency.as_str())
            .bind(transfer.amount_sent.value())
            .bind(transfer.amount_received.value())
            .bind(transfer.exchange_rate.value())
            .bind(&transfer.rate_provider)
            .bind(transfer.fee.value())
            .bind(transfer.status.id())
            .bind(&transfer.description)
            .bind(transfer.timestamp)
            .bind(transfer.version.get())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| with_reference(e, &transfer.reference))?;
        }

        db_tx.commit().await?;
        Ok(())
    }
}
