//! Default catalog
//!
//! The versioned seed dataset of hardware profiles, operating systems and
//! firmware. The built-in catalog ships as `src/config/catalog.json`; a
//! different catalog can be loaded from a file (see `[catalog] path` in the
//! global config) or built directly in tests.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::core::model::{Firmware, Hardware, OperatingSystem, ResourceKind};
use crate::core::state::{FirmwareRecord, HardwareRecord, OsRecord};
use crate::error::CatalogError;

/// Catalog shipped with this build
const BUILTIN_CATALOG: &str = include_str!("../config/catalog.json");

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    version: String,
    #[serde(default)]
    hardware: Vec<HardwareRecord>,
    #[serde(default)]
    os: Vec<OsRecord>,
    #[serde(default)]
    firmware: Vec<FirmwareRecord>,
}

/// A validated, internally consistent set of default entries
///
/// Every entry has `is_default == true`, every OS references hardware and
/// firmware the catalog itself ships, and ids are unique per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    version: semver::Version,
    hardware: Vec<Hardware>,
    os: Vec<OperatingSystem>,
    firmware: Vec<Firmware>,
}

impl Catalog {
    /// Build a catalog from entries, marking them as defaults
    pub fn new(
        version: semver::Version,
        hardware: Vec<Hardware>,
        os: Vec<OperatingSystem>,
        firmware: Vec<Firmware>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            version,
            hardware: hardware
                .into_iter()
                .map(|hw| Hardware {
                    is_default: true,
                    ..hw
                })
                .collect(),
            os: os
                .into_iter()
                .map(|os| OperatingSystem {
                    is_default: true,
                    ..os
                })
                .collect(),
            firmware: firmware
                .into_iter()
                .map(|fw| Firmware {
                    is_default: true,
                    ..fw
                })
                .collect(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog compiled into this binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse a catalog from JSON
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument =
            serde_json::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;

        let version =
            semver::Version::parse(&document.version).map_err(|e| CatalogError::InvalidVersion {
                version: document.version.clone(),
                error: e.to_string(),
            })?;

        let hardware = document
            .hardware
            .into_iter()
            .map(Hardware::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let os = document
            .os
            .into_iter()
            .map(OperatingSystem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let firmware = document
            .firmware
            .into_iter()
            .map(Firmware::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(version, hardware, os, firmware)
    }

    /// Load a catalog from a JSON file
    pub fn load_from_path(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Catalog version
    pub fn version(&self) -> &semver::Version {
        &self.version
    }

    pub fn hardware(&self) -> &[Hardware] {
        &self.hardware
    }

    pub fn os(&self) -> &[OperatingSystem] {
        &self.os
    }

    pub fn firmware(&self) -> &[Firmware] {
        &self.firmware
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut hardware_ids = BTreeSet::new();
        for hw in &self.hardware {
            if !hardware_ids.insert(hw.id.as_str()) {
                return Err(CatalogError::DuplicateEntry {
                    kind: ResourceKind::Hardware,
                    id: hw.id.to_string(),
                });
            }
        }

        let mut firmware_ids = BTreeSet::new();
        for fw in &self.firmware {
            if !firmware_ids.insert(fw.id.as_str()) {
                return Err(CatalogError::DuplicateEntry {
                    kind: ResourceKind::Firmware,
                    id: fw.id.to_string(),
                });
            }
        }

        let mut os_ids = BTreeSet::new();
        for os in &self.os {
            if !os_ids.insert(os.id.as_str()) {
                return Err(CatalogError::DuplicateEntry {
                    kind: ResourceKind::Os,
                    id: os.id.to_string(),
                });
            }
            if !firmware_ids.contains(os.firmware_id.as_str()) {
                return Err(CatalogError::DanglingReference {
                    kind: ResourceKind::Os,
                    id: os.id.to_string(),
                    target_kind: ResourceKind::Firmware,
                    target: os.firmware_id.to_string(),
                });
            }
            if let Some(missing) = os
                .hardware_ids
                .iter()
                .find(|hw| !hardware_ids.contains(hw.as_str()))
            {
                return Err(CatalogError::DanglingReference {
                    kind: ResourceKind::Os,
                    id: os.id.to_string(),
                    target_kind: ResourceKind::Hardware,
                    target: missing.to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// One board, one OS, one firmware: enough to exercise the registry
    pub(crate) const MINIMAL_CATALOG: &str = r#"{
        "version": "0.1.0",
        "hardware": [
            {"id": "rpi4b", "name": "RaspberryPi 4B", "qemu_arch": "aarch64", "qemu_args": "-m 4g"}
        ],
        "os": [
            {"id": "netbsd", "name": "NetBSD", "details": "v10 aarch64", "firmware_id": "edk2",
             "hardware_ids": ["rpi4b"], "dl_link": "https://example.com/netbsd.img.gz"}
        ],
        "firmware": [
            {"id": "edk2", "dl_link": "https://example.com/QEMU_EFI.fd"}
        ]
    }"#;

    pub(crate) fn minimal_catalog() -> Catalog {
        Catalog::from_json(MINIMAL_CATALOG).unwrap()
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.hardware().len(), 5);
        assert_eq!(catalog.os().len(), 2);
        assert_eq!(catalog.firmware().len(), 2);
        assert!(catalog.hardware().iter().all(|hw| hw.is_default));
        assert!(catalog.firmware().iter().all(|fw| fw.is_default));
    }

    #[test]
    fn test_builtin_catalog_entries() {
        let catalog = Catalog::builtin().unwrap();
        let netbsd = catalog
            .os()
            .iter()
            .find(|os| os.id.as_str() == "netbsd_aarch64")
            .unwrap();
        assert_eq!(netbsd.firmware_id.as_str(), "aarch64_tianocore_edk2");
        assert_eq!(netbsd.hardware_ids.len(), 4);
        assert!(netbsd.dl_link.ends_with(".img.gz"));
    }

    #[test]
    fn test_is_default_forced_on_catalog_entries() {
        let json = r#"{
            "version": "1.0.0",
            "firmware": [{"id": "fw", "dl_link": "https://example.com/fw", "is_default": false}]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert!(catalog.firmware()[0].is_default);
    }

    #[test]
    fn test_rejects_dangling_firmware_reference() {
        let json = r#"{
            "version": "1.0.0",
            "hardware": [{"id": "hw", "name": "HW", "qemu_arch": "arm"}],
            "os": [{"id": "os", "name": "OS", "firmware_id": "missing",
                    "hardware_ids": ["hw"], "dl_link": "https://example.com/os.img"}]
        }"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::DanglingReference { .. }));
    }

    #[test]
    fn test_rejects_dangling_hardware_reference() {
        let json = r#"{
            "version": "1.0.0",
            "firmware": [{"id": "fw", "dl_link": "https://example.com/fw"}],
            "os": [{"id": "os", "name": "OS", "firmware_id": "fw",
                    "hardware_ids": ["nope"], "dl_link": "https://example.com/os.img"}]
        }"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_rejects_duplicate_entries() {
        let json = r#"{
            "version": "1.0.0",
            "firmware": [
                {"id": "fw", "dl_link": "https://example.com/a"},
                {"id": "fw", "dl_link": "https://example.com/b"}
            ]
        }"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateEntry { .. }));
    }

    #[test]
    fn test_rejects_bad_version() {
        let json = r#"{"version": "one"}"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidVersion { .. }));
    }

    #[test]
    fn test_load_from_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        std::fs::write(&path, MINIMAL_CATALOG).unwrap();

        let catalog = Catalog::load_from_path(&path).unwrap();
        assert_eq!(catalog.version(), &semver::Version::new(0, 1, 0));
    }

    #[test]
    fn test_load_from_missing_path() {
        let err = Catalog::load_from_path(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
