//! Process-wide display-name lookup, keyed by address.
//!
//! Populated lazily on first lookup per key and never evicted; entries
//! live for the life of the process.

use crate::types::Address;
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        OnceLock,
    },
};

#[derive(Clone, Debug)]
pub struct PlayerProfile {
    pub address: Address,
    pub display_name: String,
}

static PROFILE_CACHE: OnceLock<Mutex<HashMap<Address, PlayerProfile>>> =
    OnceLock::new();

fn cache() -> &'static Mutex<HashMap<Address, PlayerProfile>> {
    PROFILE_CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Pin a known display name (the local profile, seeded opponents).
pub fn remember(address: Address, display_name: impl Into<String>) {
    let mut cache = cache().lock().expect("profile cache lock poisoned");
    cache.insert(
        address,
        PlayerProfile {
            address,
            display_name: display_name.into(),
        },
    );
}

/// Display name for an address, generating a placeholder on first
/// sight when nothing better is known.
pub fn display_name(address: Address) -> String {
    let mut cache = cache().lock().expect("profile cache lock poisoned");
    cache
        .entry(address)
        .or_insert_with(|| PlayerProfile {
            address,
            display_name: placeholder_name(address),
        })
        .display_name
        .clone()
}

fn placeholder_name(address: Address) -> String {
    format!("{} {}", fakeit::name::first(), address.short())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn display_name__is_stable_across_lookups() {
        let address = Address::new([0x77; 20]);
        let first = display_name(address);
        let second = display_name(address);
        assert_eq!(first, second);
    }

    #[test]
    fn remember__overrides_the_generated_placeholder() {
        let address = Address::new([0x78; 20]);
        let _ = display_name(address);
        remember(address, "Kamala");
        assert_eq!(display_name(address), "Kamala");
    }
}
