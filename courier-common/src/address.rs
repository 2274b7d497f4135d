use std::{
    fmt::{self, Display},
    str::FromStr,
};

use mailparse::MailAddr;
use serde::{Deserialize, Serialize};

use crate::error::AddressError;

/// A single mailbox, optionally with a display name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub display_name: Option<String>,
    pub email: String,
}

impl Address {
    /// The domain part of the address.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.email
            .rsplit_once('@')
            .map_or("", |(_, domain)| domain)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| AddressError::Invalid {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let list = mailparse::addrparse(input).map_err(|e| invalid(&e.to_string()))?;

        let single = match list.as_slice() {
            [MailAddr::Single(single)] => single,
            [] => return Err(invalid("empty address")),
            _ => return Err(AddressError::NotSingle(input.to_string())),
        };

        match single.addr.rsplit_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(Self {
                display_name: single.display_name.clone(),
                email: single.addr.clone(),
            }),
            _ => Err(invalid("missing local part or domain")),
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{name} <{}>", self.email),
            None => f.write_str(&self.email),
        }
    }
}
