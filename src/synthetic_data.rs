//! src/synthetic_data.rs
use fake::Fake;
use fake::faker::address::en::{
    BuildingNumber, CityName, CountryCode, PostCode, StateName, StreetName,
};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber as FakePhoneNumber;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use crate::domain::PhoneNumber;

/// Produces plausible personal data for fields the profile dataset
/// cannot supply.
///
/// Every call draws fresh values. The generator is shared between the
/// scheduler and manual runs, hence the lock around the RNG.
#[derive(Debug)]
pub struct SyntheticDataProvider {
    rng: Mutex<StdRng>,
}

impl Default for SyntheticDataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticDataProvider {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A provider whose sequence of values is reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A panic while holding the lock cannot leave an RNG in a broken state.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *rng)
    }

    pub fn first_name(&self) -> String {
        self.with_rng(|rng| FirstName().fake_with_rng(rng))
    }

    pub fn last_name(&self) -> String {
        self.with_rng(|rng| LastName().fake_with_rng(rng))
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name(), self.last_name())
    }

    pub fn email(&self) -> String {
        self.with_rng(|rng| SafeEmail().fake_with_rng(rng))
    }

    pub fn street_address(&self) -> String {
        self.with_rng(|rng| {
            let number: String = BuildingNumber().fake_with_rng(rng);
            let street: String = StreetName().fake_with_rng(rng);
            format!("{} {}", number, street)
        })
    }

    pub fn city(&self) -> String {
        self.with_rng(|rng| CityName().fake_with_rng(rng))
    }

    pub fn state(&self) -> String {
        self.with_rng(|rng| StateName().fake_with_rng(rng))
    }

    pub fn country_code(&self) -> String {
        self.with_rng(|rng| CountryCode().fake_with_rng(rng))
    }

    pub fn postal_code(&self) -> String {
        self.with_rng(|rng| PostCode().fake_with_rng(rng))
    }

    pub fn uuid(&self) -> Uuid {
        self.with_rng(|rng| uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid())
    }

    /// A phone number in whatever format the generator happens to pick.
    pub fn raw_phone_number(&self) -> String {
        self.with_rng(|rng| FakePhoneNumber().fake_with_rng(rng))
    }

    pub fn phone_number(&self) -> PhoneNumber {
        PhoneNumber::normalize(&self.raw_phone_number())
    }
}
