//! Gateway types
//!
//! ## Input Types
//! - [`AmountInput`]: string-only decimal amount
//! - [`ValidatedJson`]: body extractor running `validator` rules
//! - request bodies and listing query strings
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: success envelope
//! - [`ApiError`]: structured failure with correlation id

pub mod money;
pub mod request;
pub mod response;

pub use money::AmountInput;
pub use request::{
    AccountQuery, ClientQuery, CreateAccountRequest, CreateClientRequest, EntryRequest, PageQuery,
    TransactionQuery, TransferQuery, TransferRequest, UpdateAccountRequest, UpdateClientRequest,
    ValidatedJson, page_of,
};
pub use response::{ApiError, ApiResponse, ApiResult, ErrorBody, created, error_codes, ok};
