mod card;
mod customer_profile;
mod phone_number;
mod transaction;

pub use card::{CardRecord, CardSelection};
pub use customer_profile::{CustomerProfile, ProfileRow, non_blank};
pub use phone_number::PhoneNumber;
pub use transaction::{AmountRange, Currency, Transaction};
