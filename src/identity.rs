//! Identity records and their repository
//!
//! An identity owns a root and an intermediate certificate plus a map of
//! devices keyed by device uuid. Identities are stored as one record map
//! per dataset, keyed by identity uuid.
//!
//! Generators take the random source as a parameter so tests can seed it:
//!
//! ```ignore
//! let mut rng = StdRng::seed_from_u64(7);
//! let alice = Identity::generate(&mut rng);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use vault_core::{Reference, VaultResult};
use vault_engine::{load_map, load_record, save_record, Database, Dataset};

/// Default dataset holding identities
pub const IDENTITIES_DATASET: &str = "identities";

/// Letters random strings are drawn from
pub const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of a generated certificate body
pub const CERTIFICATE_PEM_LEN: usize = 2048;
/// Length of a generated device uuid
pub const DEVICE_UUID_LEN: usize = 100;
/// Length of a generated device description
pub const DEVICE_DESCRIPTION_LEN: usize = 200;
/// Length of a generated identity uuid
pub const IDENTITY_UUID_LEN: usize = 50;

/// Metadata key every new identity carries
pub const ENCRYPTED_ROOT_KEY: &str = "EncryptedRootKey";

/// `n` letters drawn uniformly from [`LETTERS`]
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, n: usize) -> String {
    (0..n)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect()
}

/// A PEM-encoded certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Certificate body
    pub pem: String,
}

impl Certificate {
    /// Certificate with a random body
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Certificate {
            pem: random_string(rng, CERTIFICATE_PEM_LEN),
        }
    }
}

/// A device registered to an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Device identifier
    pub uuid: String,
    /// Device certificate
    pub certificate: Certificate,
    /// Free-form description
    pub description: String,
    /// Arbitrary key/value metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Device {
    /// Device with random identifier, certificate, and description
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Device {
            uuid: random_string(rng, DEVICE_UUID_LEN),
            certificate: Certificate::generate(rng),
            description: random_string(rng, DEVICE_DESCRIPTION_LEN),
            metadata: BTreeMap::new(),
        }
    }
}

/// A user identity and its devices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Identity identifier
    pub uuid: String,
    /// Root certificate
    pub root_certificate: Certificate,
    /// Intermediate certificate
    pub intermediate_certificate: Certificate,
    /// Devices keyed by device uuid
    pub devices: BTreeMap<String, Device>,
    /// Arbitrary key/value metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Identity {
    /// Identity with one random device and an empty encrypted root key
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let device = Device::generate(rng);
        let mut identity = Identity {
            uuid: random_string(rng, IDENTITY_UUID_LEN),
            root_certificate: Certificate::generate(rng),
            intermediate_certificate: Certificate::generate(rng),
            devices: BTreeMap::new(),
            metadata: BTreeMap::from([(ENCRYPTED_ROOT_KEY.to_string(), String::new())]),
        };
        identity.add_device(device);
        identity
    }

    /// Register `device`, replacing any device with the same uuid
    pub fn add_device(&mut self, device: Device) -> Option<Device> {
        self.devices.insert(device.uuid.clone(), device)
    }
}

/// Identities stored in one dataset, keyed by identity uuid
#[derive(Debug, Clone)]
pub struct IdentityRepository {
    dataset: Dataset,
}

impl IdentityRepository {
    /// Repository over the default [`IDENTITIES_DATASET`]
    pub fn open(db: &Arc<Database>) -> VaultResult<Self> {
        Ok(Self::with_dataset(db.dataset(IDENTITIES_DATASET)?))
    }

    /// Repository over an arbitrary dataset
    pub fn with_dataset(dataset: Dataset) -> Self {
        IdentityRepository { dataset }
    }

    /// Underlying dataset
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Insert or overwrite `identity` and commit
    ///
    /// Returns the new head. A concurrent writer makes this fail with
    /// `ConcurrentModification`; nothing is retried.
    pub fn save(&self, identity: &Identity) -> VaultResult<Reference> {
        let head = save_record(&self.dataset, &identity.uuid, identity)?;
        debug!(
            target: "vault::commit",
            dataset = self.dataset.name(),
            devices = identity.devices.len(),
            "Identity saved"
        );
        Ok(head)
    }

    /// Identity stored under `uuid`, if any
    pub fn load(&self, uuid: &str) -> VaultResult<Option<Identity>> {
        load_record(&self.dataset, uuid)
    }

    /// Uuids of every stored identity, in order
    pub fn list(&self) -> VaultResult<Vec<String>> {
        Ok(load_map(&self.dataset)?.keys().map(str::to_string).collect())
    }
}
