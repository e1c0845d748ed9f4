//! Sender and recipient addresses as reported by the mail client.

/// A display name plus address pair.
///
/// Displays as `"John Smith <j@x.com>"`, or whichever half is known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The address (`user@domain`); empty when unknown.
    pub address: String,
}

impl EmailAddress {
    /// Build an address from the separate name and address fields a mail
    /// client exposes. When both are equal the name is dropped.
    pub fn new(display_name: impl Into<String>, address: impl Into<String>) -> Self {
        let display_name = display_name.into().trim().to_string();
        let address = address.into().trim().to_string();
        if display_name == address {
            return Self {
                display_name: String::new(),
                address,
            };
        }
        Self {
            display_name,
            address,
        }
    }

    /// Build a sender from the name, address and address type a mail client
    /// reports. Only SMTP addresses are kept; Exchange-internal senders carry
    /// an X.500 distinguished name there, which is shown as the name alone.
    pub fn from_sender(
        display_name: impl Into<String>,
        address: impl Into<String>,
        address_type: &str,
    ) -> Self {
        let address_type = address_type.trim();
        if address_type.is_empty() || address_type.eq_ignore_ascii_case("SMTP") {
            Self::new(display_name, address)
        } else {
            Self::new(display_name, "")
        }
    }

    /// `true` when neither a name nor an address is known.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_empty() && self.address.is_empty()
    }

    /// Format for display: `"Name <address>"`, or whichever half is present.
    pub fn display(&self) -> String {
        match (self.display_name.is_empty(), self.address.is_empty()) {
            (true, _) => self.address.clone(),
            (false, true) => self.display_name.clone(),
            (false, false) => format!("{} <{}>", self.display_name, self.address),
        }
    }

    /// Join a recipient list for a single line of output.
    pub fn format_list(list: &[EmailAddress]) -> String {
        list.iter()
            .map(EmailAddress::display)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_and_address() {
        let addr = EmailAddress::new(" John Smith ", "j@x.com");
        assert_eq!(addr.display_name, "John Smith");
        assert_eq!(addr.display(), "John Smith <j@x.com>");
        assert_eq!(addr.to_string(), "John Smith <j@x.com>");
    }

    #[test]
    fn test_display_address_only() {
        let addr = EmailAddress::new("", "user@example.com");
        assert_eq!(addr.display(), "user@example.com");
    }

    #[test]
    fn test_display_name_only() {
        let addr = EmailAddress::new("The Neuron", "");
        assert_eq!(addr.display(), "The Neuron");
        assert!(!addr.is_empty());
    }

    #[test]
    fn test_new_drops_duplicate_name() {
        let addr = EmailAddress::new("a@b.com", "a@b.com");
        assert_eq!(addr.display(), "a@b.com");
    }

    #[test]
    fn test_sender_keeps_smtp_address() {
        let addr = EmailAddress::from_sender("Ann Lee", "ann@x.com", "SMTP");
        assert_eq!(addr.display(), "Ann Lee <ann@x.com>");
        let addr = EmailAddress::from_sender("Ann Lee", "ann@x.com", "");
        assert_eq!(addr.address, "ann@x.com");
    }

    #[test]
    fn test_exchange_sender_shows_name_only() {
        let addr = EmailAddress::from_sender(
            "Ann Lee",
            "/O=EXCHANGELABS/OU=EXCHANGE ADMINISTRATIVE GROUP/CN=RECIPIENTS/CN=ANN",
            "EX",
        );
        assert_eq!(addr.display(), "Ann Lee");
    }

    #[test]
    fn test_format_list() {
        let list = vec![
            EmailAddress::new("Alice", "alice@example.com"),
            EmailAddress::new("", "bob@example.com"),
        ];
        assert_eq!(
            EmailAddress::format_list(&list),
            "Alice <alice@example.com>, bob@example.com"
        );
        assert_eq!(EmailAddress::format_list(&[]), "");
    }

    #[test]
    fn test_empty() {
        assert!(EmailAddress::new("  ", "").is_empty());
        assert!(EmailAddress::default().is_empty());
    }
}
