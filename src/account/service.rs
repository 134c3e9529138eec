//! Client and account management
//!
//! Plain CRUD on top of [`LedgerStore`]. Deletion is soft: the row stays and
//! its `deleted` flag is set. Balances are never touched here.

use std::sync::Arc;

use tracing::info;

use super::models::{Account, AccountStatus, Client};
use super::validation::{ClientName, Email, PhoneNumber, ValidationError};
use crate::core_types::{AccountNumber, ClientId, CurrencyCode};
use crate::error::{AccountRole, LedgerError};
use crate::query::{AccountFilter, ClientFilter, Page, PageRequest};
use crate::store::LedgerStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Partial client update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub owner_id: ClientId,
    pub currency: String,
    /// Defaults to ACTIVE
    pub status: Option<AccountStatus>,
}

pub struct AccountService {
    store: Arc<dyn LedgerStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    // === Clients ===

    pub async fn create_client(&self, req: NewClient) -> Result<Client, LedgerError> {
        let mut violations = Violations::default();
        let name = violations.check(ClientName::new(&req.name));
        let email = violations.check(Email::new(&req.email));
        let phone = violations.check(PhoneNumber::new(&req.phone));
        violations.into_result()?;
        let (Some(name), Some(email), Some(phone)) = (name, email, phone) else {
            return Err(LedgerError::validation("invalid client"));
        };

        self.ensure_unique(None, email.as_str(), phone.as_str())
            .await?;
        let client = Client::new(name.into_string(), email.into_string(), phone.into_string());
        self.store.insert_client(&client).await?;
        info!(client_id = %client.id, "Client created");
        Ok(client)
    }

    /// Active (not deleted) client by id.
    pub async fn get_client(&self, id: ClientId) -> Result<Client, LedgerError> {
        self.store
            .find_client(id)
            .await?
            .filter(|c| !c.deleted)
            .ok_or_else(|| LedgerError::ClientNotFound(id.to_string()))
    }

    pub async fn update_client(
        &self,
        id: ClientId,
        update: ClientUpdate,
    ) -> Result<Client, LedgerError> {
        let mut client = self.get_client(id).await?;

        let mut violations = Violations::default();
        let name = update
            .name
            .as_deref()
            .and_then(|n| violations.check(ClientName::new(n)));
        let email = update
            .email
            .as_deref()
            .and_then(|e| violations.check(Email::new(e)));
        let phone = update
            .phone
            .as_deref()
            .and_then(|p| violations.check(PhoneNumber::new(p)));
        violations.into_result()?;

        if let Some(name) = name {
            client.name = name.into_string();
        }
        if let Some(email) = email {
            client.email = email.into_string();
        }
        if let Some(phone) = phone {
            client.phone = phone.into_string();
        }
        self.ensure_unique(Some(id), &client.email, &client.phone)
            .await?;

        client.audit.touch();
        let updated = self.store.update_client(&client).await?;
        info!(client_id = %id, version = %updated.version, "Client updated");
        Ok(updated)
    }

    pub async fn delete_client(&self, id: ClientId) -> Result<Client, LedgerError> {
        let mut client = self.get_client(id).await?;
        client.deleted = true;
        client.audit.touch();
        let deleted = self.store.update_client(&client).await?;
        info!(client_id = %id, "Client deleted");
        Ok(deleted)
    }

    pub async fn list_clients(
        &self,
        filter: &ClientFilter,
        page: &PageRequest,
    ) -> Result<Page<Client>, LedgerError> {
        Ok(self.store.list_clients(filter, page).await?)
    }

    async fn ensure_unique(
        &self,
        id: Option<ClientId>,
        email: &str,
        phone: &str,
    ) -> Result<(), LedgerError> {
        let other = move |c: &Client| Some(c.id) != id;
        if let Some(existing) = self.store.find_client_by_email(email).await?
            && other(&existing)
        {
            return Err(LedgerError::DuplicateValue { field: "email" });
        }
        if let Some(existing) = self.store.find_client_by_phone(phone).await?
            && other(&existing)
        {
            return Err(LedgerError::DuplicateValue { field: "phone" });
        }
        Ok(())
    }

    // === Accounts ===

    /// Open a zero-balance account for an existing client.
    pub async fn create_account(&self, req: NewAccount) -> Result<Account, LedgerError> {
        let currency = CurrencyCode::new(&req.currency.trim().to_ascii_uppercase())?;
        let owner = self.get_client(req.owner_id).await?;
        let status = req.status.unwrap_or(AccountStatus::Active);

        let account = Account::open(owner.id, currency, status);
        self.store.insert_account(&account).await?;
        info!(
            account = %account.account_number,
            owner_id = %owner.id,
            currency = %account.currency,
            status = %account.status,
            "Account opened"
        );
        Ok(account)
    }

    /// Account by number, including soft-deleted ones.
    pub async fn get_account_by_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Account, LedgerError> {
        self.store
            .find_account_by_number(number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound {
                role: AccountRole::Account,
                account_number: number.to_string(),
            })
    }

    pub async fn update_account_status(
        &self,
        number: &AccountNumber,
        status: AccountStatus,
    ) -> Result<Account, LedgerError> {
        let mut account = self.get_account_by_number(number).await?;
        if account.deleted {
            return Err(LedgerError::AccountInactive {
                account_number: number.to_string(),
                state: "DELETED",
            });
        }
        let previous = account.status;
        account.status = status;
        account.audit.touch();
        let updated = self.store.update_account(&account).await?;
        info!(account = %number, from = %previous, to = %status, "Account status changed");
        Ok(updated)
    }

    pub async fn delete_account(&self, number: &AccountNumber) -> Result<Account, LedgerError> {
        let mut account = self.get_account_by_number(number).await?;
        if account.deleted {
            return Ok(account);
        }
        account.deleted = true;
        account.audit.touch();
        let deleted = self.store.update_account(&account).await?;
        info!(account = %number, "Account deleted");
        Ok(deleted)
    }

    pub async fn list_accounts(
        &self,
        filter: &AccountFilter,
        page: &PageRequest,
    ) -> Result<Page<Account>, LedgerError> {
        Ok(self.store.list_accounts(filter, page).await?)
    }
}

/// Collects every field violation instead of stopping at the first.
#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.0.push(e.to_string());
                None
            }
        }
    }

    fn into_result(self) -> Result<(), LedgerError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::ValidationFailed(self.0))
        }
    }
}
