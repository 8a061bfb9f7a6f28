//! Workload registry
//!
//! Static knowledge of the workloads dmctl can control. The `drone`
//! workload's image is chosen at configuration time (`dmctl config obc`),
//! so its descriptor carries an image template that is resolved against
//! the credential store right before each operation.

use serde::Serialize;

use crate::error::{DmcError, Result};
use crate::store::{CredentialStore, KEY_ID, KEY_IMAGE, KEY_PASSWORD};

/// Registry path every workload image lives under
pub const IMAGE_BASE: &str = "docker.io/tobiasfriden/";

/// Image variant that runs the drone software against a simulator
pub const SIM_IMAGE_VARIANT: &str = "dmc-sim";

/// Selectable onboard computer types and the image variant each one runs
pub const IMAGE_VARIANTS: &[(&str, &str)] = &[
    ("rpi", "dmc-rpi"),
    ("x86", "dmc-x86"),
    ("sim", SIM_IMAGE_VARIANT),
];

/// How a workload talks to the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadMode {
    /// Real hardware: privileged, host networking, auto restart
    Onboard,
    /// Simulated vehicle: runtime defaults, location passed on the command line
    Simulated,
}

impl WorkloadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onboard => "onboard",
            Self::Simulated => "simulated",
        }
    }
}

impl std::fmt::Display for WorkloadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a workload's image name comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Always the same image variant
    Fixed(&'static str),
    /// The variant stored under `IMAGE` in the credential store
    Configured,
}

/// Immutable definition of a controllable workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadDescriptor {
    /// Unique key, also used as the container name
    pub name: &'static str,
    pub image: ImageSource,
    pub mode: WorkloadMode,
    /// Store keys that must be set before the workload may start
    pub required_config_keys: &'static [&'static str],
}

/// A descriptor with its image resolved against the current configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWorkload {
    pub descriptor: &'static WorkloadDescriptor,
    /// Full image reference, e.g. `docker.io/tobiasfriden/dmc-rpi`
    pub image: String,
    /// Effective mode; a `drone` configured with the sim image runs simulated
    pub mode: WorkloadMode,
}

impl ResolvedWorkload {
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }
}

static WORKLOADS: &[WorkloadDescriptor] = &[
    WorkloadDescriptor {
        name: "drone",
        image: ImageSource::Configured,
        mode: WorkloadMode::Onboard,
        required_config_keys: &[KEY_ID, KEY_PASSWORD],
    },
    WorkloadDescriptor {
        name: "sim",
        image: ImageSource::Fixed(SIM_IMAGE_VARIANT),
        mode: WorkloadMode::Simulated,
        required_config_keys: &[KEY_ID, KEY_PASSWORD],
    },
];

/// All known workloads
pub fn all() -> &'static [WorkloadDescriptor] {
    WORKLOADS
}

/// Look up a workload by name
pub fn resolve(name: &str) -> Result<&'static WorkloadDescriptor> {
    WORKLOADS
        .iter()
        .find(|w| w.name == name)
        .ok_or_else(|| DmcError::UnknownWorkload(name.to_string()))
}

/// Map an onboard computer type (`rpi`, `x86`, `sim`) to its image variant.
/// Full variant names are accepted as well.
pub fn image_variant(obc: &str) -> Option<&'static str> {
    IMAGE_VARIANTS
        .iter()
        .find(|(short, variant)| *short == obc || *variant == obc)
        .map(|(_, variant)| *variant)
}

impl WorkloadDescriptor {
    /// Substitute the configured image variant and settle the effective mode
    pub fn resolve_image(&'static self, store: &CredentialStore) -> Result<ResolvedWorkload> {
        let variant = match self.image {
            ImageSource::Fixed(variant) => variant.to_string(),
            ImageSource::Configured => store
                .get(KEY_IMAGE)
                .ok_or(DmcError::ImageNotConfigured)?
                .to_string(),
        };

        let mode = if variant == SIM_IMAGE_VARIANT {
            WorkloadMode::Simulated
        } else {
            self.mode
        };

        Ok(ResolvedWorkload {
            descriptor: self,
            image: qualify_image(&variant),
            mode,
        })
    }

    /// First required key that is absent or empty
    pub fn missing_config_key(&self, store: &CredentialStore) -> Option<&'static str> {
        self.required_config_keys
            .iter()
            .copied()
            .find(|key| store.get(key).is_none())
    }
}

/// Prefix a bare variant with the image registry. References that already
/// name a registry or repository are left untouched.
fn qualify_image(variant: &str) -> String {
    if variant.contains('/') {
        variant.to_string()
    } else {
        format!("{}{}", IMAGE_BASE, variant)
    }
}
