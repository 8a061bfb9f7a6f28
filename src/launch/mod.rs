//! Launch spec assembly
//!
//! Builds the environment, command line and host settings for a workload
//! immediately before its container is created. Nothing here is cached;
//! every start attempt reads the credential store afresh.

use crate::error::{DmcError, Result};
use crate::store::{
    CredentialStore, KEY_DMC_ANIP_URI, KEY_DMC_SESSION_URI, KEY_DMC_URI, KEY_FCU_URL,
    KEY_GCS_URL, KEY_ID, KEY_MOCK_IMSI, KEY_MOCK_POSITION, KEY_PASSWORD, KEY_SIM_TYPE,
};
use crate::workload::{ResolvedWorkload, WorkloadMode};

/// Keys forwarded to an onboard container, in emission order
pub const ONBOARD_ENV_KEYS: &[&str] = &[
    KEY_ID,
    KEY_PASSWORD,
    KEY_FCU_URL,
    KEY_GCS_URL,
    KEY_DMC_URI,
    KEY_DMC_SESSION_URI,
    KEY_DMC_ANIP_URI,
    KEY_MOCK_IMSI,
    KEY_MOCK_POSITION,
];

/// Keys forwarded to a simulated container. No flight controller or ground
/// station: the simulator provides both.
pub const SIMULATED_ENV_KEYS: &[&str] = &[
    KEY_ID,
    KEY_PASSWORD,
    KEY_DMC_URI,
    KEY_DMC_SESSION_URI,
    KEY_DMC_ANIP_URI,
    KEY_MOCK_IMSI,
    KEY_MOCK_POSITION,
];

/// Restart behaviour requested from the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    No,
    UnlessStopped,
}

/// Host-level container settings. `None` fields use runtime defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSettings {
    pub privileged: bool,
    pub network_mode: Option<String>,
    pub restart_policy: Option<RestartPolicy>,
}

/// Everything needed to create a workload container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// `KEY=VALUE` pairs, only for keys with non-empty values
    pub env: Vec<String>,
    pub command: Vec<String>,
    pub host: HostSettings,
}

/// Caller switches that shape the launch spec
#[derive(Debug, Clone, Copy)]
pub struct LaunchOptions {
    pub auto_restart: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self { auto_restart: true }
    }
}

/// Build the launch spec for `workload`.
///
/// Simulated workloads persist the store first so that a location passed
/// on the command line survives the run; a failed write aborts the launch.
pub fn assemble(
    workload: &ResolvedWorkload,
    store: &CredentialStore,
    options: LaunchOptions,
) -> Result<LaunchSpec> {
    match workload.mode {
        WorkloadMode::Onboard => Ok(onboard(store, options)),
        WorkloadMode::Simulated => simulated(store),
    }
}

fn onboard(store: &CredentialStore, options: LaunchOptions) -> LaunchSpec {
    let restart_policy = if options.auto_restart {
        RestartPolicy::UnlessStopped
    } else {
        RestartPolicy::No
    };

    LaunchSpec {
        env: env_list(store, ONBOARD_ENV_KEYS),
        command: Vec::new(),
        host: HostSettings {
            privileged: true,
            network_mode: Some("host".to_string()),
            restart_policy: Some(restart_policy),
        },
    }
}

fn simulated(store: &CredentialStore) -> Result<LaunchSpec> {
    let location = require_location(store)?;

    store.persist()?;

    // Heading is not configurable; the simulator expects it as a fourth field.
    let mut command = vec!["--location".to_string(), format!("{},0", location)];
    if let Some(sim_type) = store.get(KEY_SIM_TYPE) {
        command.push("--type".to_string());
        command.push(sim_type.to_string());
    }

    Ok(LaunchSpec {
        env: env_list(store, SIMULATED_ENV_KEYS),
        command,
        host: HostSettings::default(),
    })
}

/// `KEY=VALUE` for every key in `keys` that has a value
pub fn env_list(store: &CredentialStore, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| store.get(key).map(|value| format!("{}={}", key, value)))
        .collect()
}

/// The configured simulation location, which must be present and valid
pub fn require_location(store: &CredentialStore) -> Result<&str> {
    let location = store
        .get(KEY_MOCK_POSITION)
        .ok_or(DmcError::MissingSimulationLocation)?;
    validate_location(location)?;
    Ok(location)
}

/// Check a `LAT,LNG,ALT` triple
pub fn validate_location(location: &str) -> Result<()> {
    let parts: Vec<&str> = location.split(',').map(str::trim).collect();
    let valid = parts.len() == 3 && parts.iter().all(|p| p.parse::<f64>().is_ok());
    if valid {
        Ok(())
    } else {
        Err(DmcError::InvalidSimulationLocation(location.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KEY_IMAGE;
    use crate::workload;
    use tempfile::TempDir;

    fn resolved(name: &str, store: &CredentialStore) -> ResolvedWorkload {
        workload::resolve(name).unwrap().resolve_image(store).unwrap()
    }

    #[test]
    fn test_onboard_example() {
        let mut store = CredentialStore::new("unused.yaml");
        store.set(KEY_IMAGE, "dmc-rpi");
        store.set(KEY_ID, "abc");
        store.set(KEY_PASSWORD, "xyz");
        store.set(KEY_FCU_URL, "udp://:14650@");

        let spec = assemble(&resolved("drone", &store), &store, LaunchOptions::default()).unwrap();
        assert_eq!(spec.env, vec!["ID=abc", "PASSWORD=xyz", "FCU_URL=udp://:14650@"]);
        assert!(spec.command.is_empty());
        assert!(spec.host.privileged);
        assert_eq!(spec.host.network_mode.as_deref(), Some("host"));
        assert_eq!(spec.host.restart_policy, Some(RestartPolicy::UnlessStopped));
    }

    #[test]
    fn test_onboard_no_restart() {
        let mut store = CredentialStore::new("unused.yaml");
        store.set(KEY_IMAGE, "dmc-x86");
        let spec = assemble(
            &resolved("drone", &store),
            &store,
            LaunchOptions { auto_restart: false },
        )
        .unwrap();
        assert_eq!(spec.host.restart_policy, Some(RestartPolicy::No));
    }

    #[test]
    fn test_empty_values_are_omitted() {
        let mut store = CredentialStore::new("unused.yaml");
        store.set(KEY_ID, "abc");
        store.set(KEY_GCS_URL, "");
        assert_eq!(env_list(&store, ONBOARD_ENV_KEYS), vec!["ID=abc"]);
    }

    #[test]
    fn test_simulated_requires_location() {
        let store = CredentialStore::new("unused.yaml");
        let err = assemble(&resolved("sim", &store), &store, LaunchOptions::default()).unwrap_err();
        assert!(matches!(err, DmcError::MissingSimulationLocation));
    }

    #[test]
    fn test_simulated_persists_and_builds_command() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dmc.yaml");
        let mut store = CredentialStore::new(&path);
        store.set(KEY_ID, "abc");
        store.set(KEY_FCU_URL, "udp://:14650@");
        store.set(KEY_MOCK_POSITION, "57.7,11.9,30");
        store.set(KEY_SIM_TYPE, "copter");

        let spec = assemble(&resolved("sim", &store), &store, LaunchOptions::default()).unwrap();
        assert_eq!(
            spec.command,
            vec!["--location", "57.7,11.9,30,0", "--type", "copter"]
        );
        assert_eq!(spec.env, vec!["ID=abc", "MOCK_POSITION=57.7,11.9,30"]);
        assert_eq!(spec.host, HostSettings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_simulated_persist_failure_aborts() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the write fail
        let mut store = CredentialStore::new(dir.path());
        store.set(KEY_MOCK_POSITION, "57.7,11.9,30");
        let err = assemble(&resolved("sim", &store), &store, LaunchOptions::default()).unwrap_err();
        assert!(matches!(err, DmcError::ConfigPersistError(_)));
    }

    #[test]
    fn test_require_location() {
        let mut store = CredentialStore::new("unused.yaml");
        assert!(matches!(
            require_location(&store),
            Err(DmcError::MissingSimulationLocation)
        ));
        store.set(KEY_MOCK_POSITION, "57.7,11.9");
        assert!(matches!(
            require_location(&store),
            Err(DmcError::InvalidSimulationLocation(_))
        ));
        store.set(KEY_MOCK_POSITION, "57.7,11.9,30");
        assert_eq!(require_location(&store).unwrap(), "57.7,11.9,30");
    }

    #[test]
    fn test_validate_location() {
        assert!(validate_location("57.7, 11.9, 30").is_ok());
        assert!(validate_location("57.7,11.9").is_err());
        assert!(validate_location("north,11.9,30").is_err());
    }
}
