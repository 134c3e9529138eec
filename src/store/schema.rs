//! PostgreSQL schema
//!
//! Amounts and rates are NUMERIC(19,3), matching the ledger scale. Status
//! and type columns hold the SMALLINT ids of their enums. Unique constraints
//! carry explicit names so violations can be mapped back to the field.

pub const CLIENTS_EMAIL_KEY: &str = "clients_email_key";
pub const CLIENTS_PHONE_KEY: &str = "clients_phone_key";
pub const ACCOUNTS_NUMBER_KEY: &str = "accounts_number_key";
pub const TRANSACTIONS_REFERENCE_KEY: &str = "transactions_reference_key";
pub const TRANSFERS_REFERENCE_KEY: &str = "transfers_reference_key";

/// Idempotent DDL, executed in order.
pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS clients_tb (
        client_id   TEXT PRIMARY KEY,
        name        VARCHAR(100) NOT NULL,
        email       VARCHAR(254) NOT NULL CONSTRAINT clients_email_key UNIQUE,
        phone       VARCHAR(20)  NOT NULL CONSTRAINT clients_phone_key UNIQUE,
        deleted     BOOLEAN      NOT NULL DEFAULT FALSE,
        version     BIGINT       NOT NULL DEFAULT 0,
        created_at  TIMESTAMPTZ  NOT NULL,
        updated_at  TIMESTAMPTZ  NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS accounts_tb (
        account_id      TEXT PRIMARY KEY,
        account_number  VARCHAR(32)    NOT NULL CONSTRAINT accounts_number_key UNIQUE,
        owner_id        TEXT           NOT NULL REFERENCES clients_tb (client_id),
        currency        VARCHAR(3)     NOT NULL,
        status          SMALLINT       NOT NULL,
        total_balance   NUMERIC(19, 3) NOT NULL DEFAULT 0,
        usable_balance  NUMERIC(19, 3) NOT NULL DEFAULT 0,
        deleted         BOOLEAN        NOT NULL DEFAULT FALSE,
        version         BIGINT         NOT NULL DEFAULT 0,
        created_at      TIMESTAMPTZ    NOT NULL,
        updated_at      TIMESTAMPTZ    NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_accounts_owner ON accounts_tb (owner_id)",
    r#"
    CREATE TABLE IF NOT EXISTS transactions_tb (
        transaction_id  TEXT PRIMARY KEY,
        reference       VARCHAR(32)    NOT NULL CONSTRAINT transactions_reference_key UNIQUE,
        account_id      TEXT           NOT NULL REFERENCES accounts_tb (account_id),
        tx_type         SMALLINT       NOT NULL,
        method          SMALLINT       NOT NULL,
        status          SMALLINT       NOT NULL,
        amount          NUMERIC(19, 3) NOT NULL CHECK (amount > 0),
        description     VARCHAR(255),
        created_at      TIMESTAMPTZ    NOT NULL,
        version         BIGINT         NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions_tb (account_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS transfers_tb (
        transfer_id            TEXT PRIMARY KEY,
        reference              VARCHAR(32)    NOT NULL CONSTRAINT transfers_reference_key UNIQUE,
        debit_transaction_id   TEXT           NOT NULL UNIQUE REFERENCES transactions_tb (transaction_id),
        credit_transaction_id  TEXT           NOT NULL UNIQUE REFERENCES transactions_tb (transaction_id),
        from_account_id        TEXT           NOT NULL REFERENCES accounts_tb (account_id),
        to_account_id          TEXT           NOT NULL REFERENCES accounts_tb (account_id),
        from_currency          VARCHAR(3)     NOT NULL,
        to_currency            VARCHAR(3)     NOT NULL,
        amount_sent            NUMERIC(19, 3) NOT NULL CHECK (amount_sent > 0),
        amount_received        NUMERIC(19, 3) NOT NULL,
        exchange_rate          NUMERIC(19, 3) NOT NULL CHECK (exchange_rate > 0),
        rate_provider          VARCHAR(32)    NOT NULL,
        fee                    NUMERIC(19, 3) NOT NULL DEFAULT 0,
        status                 SMALLINT       NOT NULL,
        description            VARCHAR(255),
        created_at             TIMESTAMPTZ    NOT NULL,
        version                BIGINT         NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_transfers_from ON transfers_tb (from_account_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_transfers_to ON transfers_tb (to_account_id, created_at)",
];
