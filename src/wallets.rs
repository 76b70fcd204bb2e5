//! Named player profiles on disk: a profile file holds the address the
//! client connects as. Signing happens behind the gateway bridge, so a
//! profile carries no key material.

use crate::types::Address;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

const PROFILE_EXTENSION: &str = "profile";

#[derive(Clone, Debug)]
pub struct ProfileDescriptor {
    pub name: String,
    pub path: PathBuf,
}

impl ProfileDescriptor {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ProfileFile {
    address: Address,
}

pub fn default_profile_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".moksha").join("profiles"))
}

pub fn resolve_profile_dir(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => default_profile_dir(),
    }
}

pub fn list_profiles(dir: &Path) -> Result<Vec<ProfileDescriptor>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut profiles = Vec::new();
    for entry in fs::read_dir(dir).wrap_err("Failed to read profile directory")? {
        let entry = entry.wrap_err("Failed to read profile entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(PROFILE_EXTENSION) {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| eyre!("Invalid profile filename {:?}", path))?
            .to_owned();
        profiles.push(ProfileDescriptor::new(name, path));
    }
    profiles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(profiles)
}

pub fn find_profile(dir: &Path, name: &str) -> Result<ProfileDescriptor> {
    let profiles = list_profiles(dir)?;
    profiles
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| {
            eyre!("Profile '{name}' not found in {}", dir.to_string_lossy())
        })
}

pub fn load_address(descriptor: &ProfileDescriptor) -> Result<Address> {
    let data = fs::read(&descriptor.path).wrap_err_with(|| {
        format!("Failed to read profile '{}'", descriptor.name)
    })?;
    let profile: ProfileFile = serde_json::from_slice(&data).wrap_err_with(|| {
        format!("Profile '{}' is not valid JSON", descriptor.name)
    })?;
    Ok(profile.address)
}

pub fn save_profile(dir: &Path, name: &str, address: Address) -> Result<ProfileDescriptor> {
    if !dir.exists() {
        fs::create_dir_all(dir).wrap_err("Failed to create profile directory")?;
    }
    let path = dir.join(format!("{name}.{PROFILE_EXTENSION}"));
    let json = serde_json::to_vec_pretty(&ProfileFile { address })
        .wrap_err("Failed to serialize profile")?;
    fs::write(&path, json)
        .wrap_err_with(|| format!("Failed to write profile '{name}'"))?;
    Ok(ProfileDescriptor::new(name, path))
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use tempdir::TempDir;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn save_profile__round_trips_through_find_and_load() {
        // given
        let dir = TempDir::new("profiles").unwrap();

        // when
        save_profile(dir.path(), "alice", addr(1)).unwrap();
        let found = find_profile(dir.path(), "alice").unwrap();
        let address = load_address(&found).unwrap();

        // then
        assert_eq!(address, addr(1));
    }

    #[test]
    fn list_profiles__ignores_unrelated_files() {
        let dir = TempDir::new("profiles").unwrap();
        save_profile(dir.path(), "alice", addr(1)).unwrap();
        fs::write(dir.path().join("notes.txt"), b"hi").unwrap();

        let profiles = list_profiles(dir.path()).unwrap();

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "alice");
    }

    #[test]
    fn find_profile__unknown_name_is_an_error() {
        let dir = TempDir::new("profiles").unwrap();
        assert!(find_profile(dir.path(), "bob").is_err());
    }

    #[test]
    fn list_profiles__missing_directory_is_empty() {
        let dir = TempDir::new("profiles").unwrap();
        let missing = dir.path().join("nope");
        assert!(list_profiles(&missing).unwrap().is_empty());
    }
}
