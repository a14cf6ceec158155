//! Email address types.

use crate::encoding::encode_header_value;
use crate::error::{Error, Result};

/// Bare email address (addr-spec).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive key used for recipient dedup.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        self.0.to_lowercase()
    }

    /// Validates an email address (basic validation).
    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("address cannot be empty".into()));
        }

        let parts: Vec<&str> = addr.split('@').collect();
        if parts.len() != 2 {
            return Err(Error::InvalidAddress(format!(
                "address must have exactly one @: {addr}"
            )));
        }

        if parts[0].is_empty() || parts[1].is_empty() {
            return Err(Error::InvalidAddress(format!(
                "local and domain parts cannot be empty: {addr}"
            )));
        }

        if addr.chars().any(|c| c.is_whitespace() || c == '<' || c == '>') {
            return Err(Error::InvalidAddress(format!(
                "address contains illegal characters: {addr}"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mailbox (optional display name + address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name (optional).
    pub name: Option<String>,
    /// Email address.
    pub address: Address,
}

impl Mailbox {
    /// Creates a new mailbox with just an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: None,
            address: Address::new(address)?,
        })
    }

    /// Creates a new mailbox with a display name and address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: Some(name.into()),
            address: Address::new(address)?,
        })
    }

    /// Parses `Name <addr>` or a bare `addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid addr-spec can be extracted.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if let Some(start) = input.rfind('<') {
            let end = input
                .rfind('>')
                .filter(|end| *end > start)
                .ok_or_else(|| Error::InvalidAddress(format!("unclosed angle bracket: {input}")))?;
            let address = Address::new(input[start + 1..end].trim())?;
            let name = input[..start].trim().trim_matches('"').trim();
            Ok(Self {
                name: (!name.is_empty()).then(|| name.to_string()),
                address,
            })
        } else {
            Self::new(input)
        }
    }

    /// Renders the mailbox for a header: `Name <addr>` or bare addr.
    ///
    /// Display names with non-ASCII content are RFC 2047 encoded;
    /// names containing specials are quoted.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        match &self.name {
            None => self.address.as_str().to_string(),
            Some(name) => {
                let rendered = if name.is_ascii() {
                    if name.contains(|c: char| "()<>[]:;@\\,.\"".contains(c)) {
                        format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
                    } else {
                        name.clone()
                    }
                } else {
                    encode_header_value(name)
                };
                format!("{rendered} <{}>", self.address)
            }
        }
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_header_value())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
    }

    #[test]
    fn invalid_addresses_rejected() {
        assert!(Address::new("").is_err());
        assert!(Address::new("userexample.com").is_err());
        assert!(Address::new("@example.com").is_err());
        assert!(Address::new("user@").is_err());
        assert!(Address::new("a@b@c").is_err());
        assert!(Address::new("user name@example.com").is_err());
    }

    #[test]
    fn dedup_key_is_case_insensitive() {
        let a = Address::new("User@Example.COM").unwrap();
        let b = Address::new("user@example.com").unwrap();
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn parse_bare_address() {
        let mailbox = Mailbox::parse("user@example.com").unwrap();
        assert!(mailbox.name.is_none());
        assert_eq!(mailbox.address.as_str(), "user@example.com");
    }

    #[test]
    fn parse_named_address() {
        let mailbox = Mailbox::parse("John Doe <john@example.com>").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("John Doe"));
        assert_eq!(mailbox.address.as_str(), "john@example.com");
    }

    #[test]
    fn parse_quoted_named_address() {
        let mailbox = Mailbox::parse("\"Doe, John\" <john@example.com>").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("Doe, John"));
    }

    #[test]
    fn parse_unclosed_bracket_rejected() {
        assert!(Mailbox::parse("John <john@example.com").is_err());
    }

    #[test]
    fn header_value_plain() {
        let mailbox = Mailbox::new("user@example.com").unwrap();
        assert_eq!(mailbox.to_header_value(), "user@example.com");
    }

    #[test]
    fn header_value_with_name() {
        let mailbox = Mailbox::with_name("John Doe", "john@example.com").unwrap();
        assert_eq!(mailbox.to_header_value(), "John Doe <john@example.com>");
    }

    #[test]
    fn header_value_quotes_specials() {
        let mailbox = Mailbox::with_name("Doe, John", "john@example.com").unwrap();
        assert_eq!(
            mailbox.to_header_value(),
            "\"Doe, John\" <john@example.com>"
        );
    }

    #[test]
    fn header_value_encodes_non_ascii_name() {
        let mailbox = Mailbox::with_name("Jürgen", "j@example.com").unwrap();
        let rendered = mailbox.to_header_value();
        assert!(rendered.starts_with("=?UTF-8?B?"));
        assert!(rendered.ends_with("<j@example.com>"));
    }
}
