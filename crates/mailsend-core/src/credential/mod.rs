//! Provider credential models.
//!
//! Plain data describing one provider's static configuration plus cached
//! runtime token state. Models hold no encryption key material and
//! perform no I/O.

mod model;
mod validation;

pub use model::{
    Authority, CredentialConfig, GoogleApiConfig, MsGraphConfig, ProviderKind, TokenRecord,
};
pub use validation::{ValidationError, ValidationResult, validate_config};
