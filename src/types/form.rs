use std::fmt;

/// Input field of the transfer/deposit form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormField {
    AddressTo,
    Amount,
    Keyword,
    Message,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FormField::AddressTo => "addressTo",
            FormField::Amount => "amount",
            FormField::Keyword => "keyword",
            FormField::Message => "message",
        })
    }
}

/// Raw, unvalidated form input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormData {
    address_to: String,
    amount: String,
    keyword: String,
    message: String,
}

impl FormData {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::AddressTo => &self.address_to,
            FormField::Amount => &self.amount,
            FormField::Keyword => &self.keyword,
            FormField::Message => &self.message,
        }
    }

    pub(crate) fn set(&mut self, field: FormField, value: String) {
        let slot = match field {
            FormField::AddressTo => &mut self.address_to,
            FormField::Amount => &mut self.amount,
            FormField::Keyword => &mut self.keyword,
            FormField::Message => &mut self.message,
        };
        *slot = value;
    }

    pub fn address_to(&self) -> &str {
        &self.address_to
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
