//! Account Ledger
//!
//! Balance rules every debit and credit goes through:
//!
//! - only ACTIVE, non-deleted accounts accept debits or credits
//! - a debit needs the balance to cover the amount (strictly, by default)
//! - balances change by exactly the transaction amount, no partial mutation

use serde::{Deserialize, Serialize};

use crate::account::models::{Account, AccountStatus};
use crate::error::LedgerError;
use crate::money::Amount;

/// How a debit amount is compared with the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SufficiencyRule {
    /// `balance > amount`: a debit may never empty the account.
    #[default]
    Strict,
    /// `balance >= amount`.
    Inclusive,
}

/// Balances an account would hold after a debit or credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub total_balance: Amount,
    pub usable_balance: Amount,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccountLedger {
    rule: SufficiencyRule,
}

impl AccountLedger {
    pub fn new(rule: SufficiencyRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> SufficiencyRule {
        self.rule
    }

    pub fn is_active(&self, account: &Account) -> bool {
        account.status == AccountStatus::Active && !account.deleted
    }

    pub fn has_sufficient_funds(&self, account: &Account, amount: Amount) -> bool {
        match self.rule {
            SufficiencyRule::Strict => account.total_balance > amount,
            SufficiencyRule::Inclusive => account.total_balance >= amount,
        }
    }

    pub fn can_withdraw(&self, account: &Account, amount: Amount) -> bool {
        self.is_active(account) && self.has_sufficient_funds(account, amount)
    }

    pub fn can_deposit(&self, account: &Account) -> bool {
        self.is_active(account)
    }

    pub fn has_same_currency(&self, a: &Account, b: &Account) -> bool {
        a.currency == b.currency
    }

    /// Usable balance once `held` is reserved for in-flight operations.
    pub fn usable_balance(&self, account: &Account, held: Amount) -> Result<Amount, LedgerError> {
        Ok(account.total_balance.checked_sub(held)?)
    }

    /// Check a debit is allowed. Inactivity is reported before insufficiency.
    pub fn ensure_can_withdraw(&self, account: &Account, amount: Amount) -> Result<(), LedgerError> {
        self.ensure_active(account)?;
        if !self.has_sufficient_funds(account, amount) {
            return Err(LedgerError::InsufficientFunds {
                account_number: account.account_number.to_string(),
            });
        }
        Ok(())
    }

    pub fn ensure_can_deposit(&self, account: &Account) -> Result<(), LedgerError> {
        self.ensure_active(account)
    }

    pub fn balance_after_deposit(
        &self,
        account: &Account,
        amount: Amount,
    ) -> Result<BalanceChange, LedgerError> {
        Ok(BalanceChange {
            total_balance: account.total_balance.checked_add(amount)?,
            usable_balance: account.usable_balance.checked_add(amount)?,
        })
    }

    pub fn balance_after_withdrawal(
        &self,
        account: &Account,
        amount: Amount,
    ) -> Result<BalanceChange, LedgerError> {
        Ok(BalanceChange {
            total_balance: account.total_balance.checked_sub(amount)?,
            usable_balance: account.usable_balance.checked_sub(amount)?,
        })
    }

    fn ensure_active(&self, account: &Account) -> Result<(), LedgerError> {
        if self.is_active(account) {
            return Ok(());
        }
        let state = if account.deleted {
            "DELETED"
        } else {
            account.status.as_str()
        };
        Err(LedgerError::AccountInactive {
            account_number: account.account_number.to_string(),
            state,
        })
    }
}
