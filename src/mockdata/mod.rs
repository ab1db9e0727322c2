//! Synthetic test users
//!
//! Users are assembled from an embedded data set of Croatian first names,
//! last names and addresses, with derived user names, e-mail addresses,
//! passwords, phone numbers and checksum-valid OIBs.

pub mod oib;
pub mod text;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const USER_MOCK_DATA: &str = include_str!("../../data/user_mock_data.json");

const MAIL_HOSTS: [&str; 6] = ["gmail.com", "yahoo.com", "outlook.com", "aol.com", "mail.com", "inbox.com"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UsersMockData {
    pub first_names: Vec<String>,
    pub last_names: Vec<String>,
    pub addresses: Vec<AddressMockData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressMockData {
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

/// A generated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MockUser {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub street_number: String,
    pub city: String,
    pub postal_code: String,
    pub user_name: String,
    pub password: String,
    pub email: String,
    pub oib: String,
    pub phone: String,
}

impl MockUser {
    /// Derive the remaining fields of a user from a name and an address
    pub fn generate<R: Rng + ?Sized>(first_name: &str, last_name: &str, address: &AddressMockData, rng: &mut R) -> Self {
        let mut street_number = rng.gen_range(1..99).to_string();
        let letter: u8 = rng.gen_range(80..103);
        if letter >= b'a' {
            street_number.push(char::from(letter));
        }

        let initial: String = first_name.chars().take(1).collect();
        let user_name = text::sanitize_for_url(&format!("{}{}", initial, last_name).to_lowercase()).replace('-', "");

        let password: String = (0..10).map(|_| char::from(rng.gen_range(48u8..90))).collect();

        let host = MAIL_HOSTS.choose(rng).copied().unwrap_or(MAIL_HOSTS[0]);
        let email = format!(
            "{}.{}@{}",
            text::sanitize_for_url(first_name),
            text::sanitize_for_url(last_name),
            host
        );

        let phone = format!("+38596{}{}", rng.gen_range(100..1000), rng.gen_range(100..1000));

        MockUser {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            street: address.street.clone(),
            street_number,
            city: address.city.clone(),
            postal_code: address.postal_code.clone(),
            user_name,
            password,
            email,
            oib: oib::generate(rng),
            phone,
        }
    }
}

/// The embedded data set
pub fn mock_data() -> Result<UsersMockData> {
    Ok(serde_json::from_str(USER_MOCK_DATA)?)
}

/// `count` random users drawn with the thread-local RNG
pub fn create_mock_users(count: usize) -> Result<Vec<MockUser>> {
    create_mock_users_with_rng(&mut rand::thread_rng(), count)
}

/// `count` random users drawn from `rng`
pub fn create_mock_users_with_rng<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Result<Vec<MockUser>> {
    let data = mock_data()?;
    create_mock_users_from(&data, rng, count)
}

/// `count` random users drawn from a custom data set
pub fn create_mock_users_from<R: Rng + ?Sized>(data: &UsersMockData, rng: &mut R, count: usize) -> Result<Vec<MockUser>> {
    let empty = |what: &str| Error::ConfigError(format!("mock data set has no {}", what));
    let mut users = Vec::with_capacity(count);
    for _ in 0..count {
        let first = data.first_names.choose(rng).ok_or_else(|| empty("first names"))?;
        let last = data.last_names.choose(rng).ok_or_else(|| empty("last names"))?;
        let address = data.addresses.choose(rng).ok_or_else(|| empty("addresses"))?;
        users.push(MockUser::generate(first, last, address, rng));
    }
    Ok(users)
}
