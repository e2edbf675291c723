//! Registry state and its persisted form
//!
//! [`RegistryState`] holds the four entity maps. [`StateDocument`] is the
//! on-disk JSON contract (`hardware`, `os`, `image`, `firmware`,
//! `last_image`); other tooling reads it, so field names are fixed.
//!
//! [`merge_defaults`] is the pure half of "reset to defaults": it rebuilds
//! the catalog portion of a state while keeping every user-created entry.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::catalog::Catalog;
use crate::core::model::{
    Firmware, FirmwareId, Hardware, HardwareId, Image, ImageId, OperatingSystem, OsId,
    ResourceKind,
};
use crate::error::IdError;

/// Persisted hardware entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    pub qemu_arch: String,
    #[serde(default)]
    pub qemu_args: String,
}

/// Persisted operating system entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub hardware_ids: Vec<String>,
    pub dl_link: String,
    pub firmware_id: String,
}

/// Persisted firmware entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareRecord {
    pub id: String,
    pub dl_link: String,
    /// Older documents did not record this flag
    #[serde(default)]
    pub is_default: bool,
}

/// Persisted image entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Derived from the other three fields; recomputed on load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub hardware_id: String,
    pub os_id: String,
}

/// The state document as written to `index.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
    pub hardware: Vec<HardwareRecord>,
    pub os: Vec<OsRecord>,
    pub image: Vec<ImageRecord>,
    pub firmware: Vec<FirmwareRecord>,
    #[serde(default)]
    pub last_image: Option<String>,
    /// Catalog version the default entries were seeded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_version: Option<String>,
}

impl From<&Hardware> for HardwareRecord {
    fn from(hw: &Hardware) -> Self {
        Self {
            id: hw.id.to_string(),
            name: hw.name.clone(),
            is_default: hw.is_default,
            qemu_arch: hw.qemu_arch.clone(),
            qemu_args: hw.qemu_args.clone(),
        }
    }
}

impl TryFrom<HardwareRecord> for Hardware {
    type Error = IdError;

    fn try_from(record: HardwareRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: HardwareId::parse(&record.id)?,
            name: record.name,
            is_default: record.is_default,
            qemu_arch: record.qemu_arch,
            qemu_args: record.qemu_args,
        })
    }
}

impl From<&OperatingSystem> for OsRecord {
    fn from(os: &OperatingSystem) -> Self {
        Self {
            id: os.id.to_string(),
            name: os.name.clone(),
            details: os.details.clone(),
            is_default: os.is_default,
            hardware_ids: os.hardware_ids.iter().map(ToString::to_string).collect(),
            dl_link: os.dl_link.clone(),
            firmware_id: os.firmware_id.to_string(),
        }
    }
}

impl TryFrom<OsRecord> for OperatingSystem {
    type Error = IdError;

    fn try_from(record: OsRecord) -> Result<Self, Self::Error> {
        let mut hardware_ids: Vec<HardwareId> = Vec::with_capacity(record.hardware_ids.len());
        for raw in &record.hardware_ids {
            let id = HardwareId::parse(raw)?;
            if !hardware_ids.contains(&id) {
                hardware_ids.push(id);
            }
        }
        Ok(Self {
            id: OsId::parse(&record.id)?,
            name: record.name,
            details: record.details,
            is_default: record.is_default,
            hardware_ids,
            dl_link: record.dl_link,
            firmware_id: FirmwareId::parse(&record.firmware_id)?,
        })
    }
}

impl From<&Firmware> for FirmwareRecord {
    fn from(fw: &Firmware) -> Self {
        Self {
            id: fw.id.to_string(),
            dl_link: fw.dl_link.clone(),
            is_default: fw.is_default,
        }
    }
}

impl TryFrom<FirmwareRecord> for Firmware {
    type Error = IdError;

    fn try_from(record: FirmwareRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: FirmwareId::parse(&record.id)?,
            dl_link: record.dl_link,
            is_default: record.is_default,
        })
    }
}

impl From<&Image> for ImageRecord {
    fn from(image: &Image) -> Self {
        Self {
            id: Some(image.id.to_string()),
            name: image.name.clone(),
            hardware_id: image.hardware_id.to_string(),
            os_id: image.os_id.to_string(),
        }
    }
}

impl TryFrom<ImageRecord> for Image {
    type Error = IdError;

    fn try_from(record: ImageRecord) -> Result<Self, Self::Error> {
        let image = Image::new(
            &record.name,
            HardwareId::parse(&record.hardware_id)?,
            OsId::parse(&record.os_id)?,
        )?;
        if let Some(stored) = record.id.as_deref() {
            if stored != image.id.as_str() {
                tracing::debug!(
                    "Image id '{stored}' does not match derived id '{}', using derived id",
                    image.id
                );
            }
        }
        Ok(image)
    }
}

/// A reference from one entry to an entry that does not exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub kind: ResourceKind,
    pub id: String,
    pub target_kind: ResourceKind,
    pub target: String,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' references missing {} '{}'",
            self.kind, self.id, self.target_kind, self.target
        )
    }
}

/// In-memory registry contents, ordered by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryState {
    pub hardware: BTreeMap<HardwareId, Hardware>,
    pub os: BTreeMap<OsId, OperatingSystem>,
    pub images: BTreeMap<ImageId, Image>,
    pub firmware: BTreeMap<FirmwareId, Firmware>,
    pub last_image: Option<ImageId>,
    pub catalog_version: Option<semver::Version>,
}

impl RegistryState {
    /// A state holding exactly the catalog's entries
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            hardware: catalog
                .hardware()
                .iter()
                .map(|hw| (hw.id.clone(), hw.clone()))
                .collect(),
            os: catalog
                .os()
                .iter()
                .map(|os| (os.id.clone(), os.clone()))
                .collect(),
            images: BTreeMap::new(),
            firmware: catalog
                .firmware()
                .iter()
                .map(|fw| (fw.id.clone(), fw.clone()))
                .collect(),
            last_image: None,
            catalog_version: Some(catalog.version().clone()),
        }
    }

    /// Parse a state from the JSON document
    ///
    /// The error string describes what is wrong; the caller attaches the
    /// file path.
    pub fn from_json(content: &str) -> Result<Self, String> {
        let document: StateDocument =
            serde_json::from_str(content).map_err(|e| e.to_string())?;
        Self::from_document(document)
    }

    /// Convert a parsed document, rejecting invalid or duplicate ids
    pub fn from_document(document: StateDocument) -> Result<Self, String> {
        let mut state = Self::default();

        for record in document.hardware {
            let hw = Hardware::try_from(record).map_err(|e| e.to_string())?;
            if state.hardware.contains_key(&hw.id) {
                return Err(format!("duplicate hardware id '{}'", hw.id));
            }
            state.hardware.insert(hw.id.clone(), hw);
        }
        for record in document.os {
            let os = OperatingSystem::try_from(record).map_err(|e| e.to_string())?;
            if state.os.contains_key(&os.id) {
                return Err(format!("duplicate os id '{}'", os.id));
            }
            state.os.insert(os.id.clone(), os);
        }
        for record in document.image {
            let image = Image::try_from(record).map_err(|e| e.to_string())?;
            if state.images.contains_key(&image.id) {
                return Err(format!("duplicate image id '{}'", image.id));
            }
            state.images.insert(image.id.clone(), image);
        }
        for record in document.firmware {
            let fw = Firmware::try_from(record).map_err(|e| e.to_string())?;
            if state.firmware.contains_key(&fw.id) {
                return Err(format!("duplicate firmware id '{}'", fw.id));
            }
            state.firmware.insert(fw.id.clone(), fw);
        }

        state.last_image = match document.last_image {
            Some(raw) => {
                let id = ImageId::parse(&raw).map_err(|e| e.to_string())?;
                if state.images.contains_key(&id) {
                    Some(id)
                } else {
                    tracing::warn!("last_image '{raw}' is not a known image, ignoring");
                    None
                }
            }
            None => None,
        };

        state.catalog_version = match document.catalog_version {
            Some(raw) => Some(
                semver::Version::parse(&raw)
                    .map_err(|e| format!("invalid catalog_version '{raw}': {e}"))?,
            ),
            None => None,
        };

        Ok(state)
    }

    /// Convert to the persisted document
    pub fn to_document(&self) -> StateDocument {
        StateDocument {
            hardware: self.hardware.values().map(HardwareRecord::from).collect(),
            os: self.os.values().map(OsRecord::from).collect(),
            image: self.images.values().map(ImageRecord::from).collect(),
            firmware: self.firmware.values().map(FirmwareRecord::from).collect(),
            last_image: self.last_image.as_ref().map(ToString::to_string),
            catalog_version: self.catalog_version.as_ref().map(ToString::to_string),
        }
    }

    /// Serialize to pretty JSON; identical states give identical bytes
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(&self.to_document())?;
        json.push('\n');
        Ok(json)
    }

    /// Whether an entry of `kind` with `id` exists
    pub fn contains(&self, kind: ResourceKind, id: &str) -> bool {
        match kind {
            ResourceKind::Hardware => self.hardware.contains_key(id),
            ResourceKind::Os => self.os.contains_key(id),
            ResourceKind::Image => self.images.contains_key(id),
            ResourceKind::Firmware => self.firmware.contains_key(id),
        }
    }

    /// Whether the entry is a catalog entry; `None` if it does not exist
    ///
    /// Images are never defaults.
    pub fn is_default(&self, kind: ResourceKind, id: &str) -> Option<bool> {
        match kind {
            ResourceKind::Hardware => self.hardware.get(id).map(|hw| hw.is_default),
            ResourceKind::Os => self.os.get(id).map(|os| os.is_default),
            ResourceKind::Image => self.images.get(id).map(|_| false),
            ResourceKind::Firmware => self.firmware.get(id).map(|fw| fw.is_default),
        }
    }

    /// Entries that reference the given entry, rendered as `kind 'id'`
    pub fn dependents_of(&self, kind: ResourceKind, id: &str) -> Vec<String> {
        match kind {
            ResourceKind::Hardware => {
                let os = self
                    .os
                    .values()
                    .filter(|os| os.hardware_ids.iter().any(|hw| hw.as_str() == id))
                    .map(|os| format!("{} '{}'", ResourceKind::Os, os.id));
                let images = self
                    .images
                    .values()
                    .filter(|image| image.hardware_id.as_str() == id)
                    .map(|image| format!("{} '{}'", ResourceKind::Image, image.id));
                os.chain(images).collect()
            }
            ResourceKind::Os => self
                .images
                .values()
                .filter(|image| image.os_id.as_str() == id)
                .map(|image| format!("{} '{}'", ResourceKind::Image, image.id))
                .collect(),
            ResourceKind::Firmware => self
                .os
                .values()
                .filter(|os| os.firmware_id.as_str() == id)
                .map(|os| format!("{} '{}'", ResourceKind::Os, os.id))
                .collect(),
            ResourceKind::Image => Vec::new(),
        }
    }

    /// Every reference that points at a missing entry
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();

        for os in self.os.values() {
            if !self.firmware.contains_key(&os.firmware_id) {
                dangling.push(DanglingReference {
                    kind: ResourceKind::Os,
                    id: os.id.to_string(),
                    target_kind: ResourceKind::Firmware,
                    target: os.firmware_id.to_string(),
                });
            }
            for hw in &os.hardware_ids {
                if !self.hardware.contains_key(hw) {
                    dangling.push(DanglingReference {
                        kind: ResourceKind::Os,
                        id: os.id.to_string(),
                        target_kind: ResourceKind::Hardware,
                        target: hw.to_string(),
                    });
                }
            }
        }

        for image in self.images.values() {
            if !self.os.contains_key(&image.os_id) {
                dangling.push(DanglingReference {
                    kind: ResourceKind::Image,
                    id: image.id.to_string(),
                    target_kind: ResourceKind::Os,
                    target: image.os_id.to_string(),
                });
            }
            if !self.hardware.contains_key(&image.hardware_id) {
                dangling.push(DanglingReference {
                    kind: ResourceKind::Image,
                    id: image.id.to_string(),
                    target_kind: ResourceKind::Hardware,
                    target: image.hardware_id.to_string(),
                });
            }
        }

        dangling
    }

    /// Entries of `kind` as `(total, user-created)`
    pub fn count(&self, kind: ResourceKind) -> (usize, usize) {
        match kind {
            ResourceKind::Hardware => (
                self.hardware.len(),
                self.hardware.values().filter(|hw| !hw.is_default).count(),
            ),
            ResourceKind::Os => (
                self.os.len(),
                self.os.values().filter(|os| !os.is_default).count(),
            ),
            ResourceKind::Image => (self.images.len(), self.images.len()),
            ResourceKind::Firmware => (
                self.firmware.len(),
                self.firmware.values().filter(|fw| !fw.is_default).count(),
            ),
        }
    }
}

/// Result of re-seeding a state from a catalog
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub state: RegistryState,
    /// Catalog entries replaced by a user entry with the same id
    pub shadowed: Vec<(ResourceKind, String)>,
    /// User entries that point at something the new catalog no longer ships
    pub dangling: Vec<DanglingReference>,
}

/// Rebuild `old` from `catalog`, keeping every user-created entry
///
/// Entries with `is_default == false` (and all images) are carried over and
/// win on id collision with a catalog entry. Old default entries are
/// discarded and replaced by the catalog's.
pub fn merge_defaults(old: &RegistryState, catalog: &Catalog) -> MergeOutcome {
    let mut state = RegistryState::from_catalog(catalog);
    let mut shadowed = Vec::new();

    for hw in old.hardware.values().filter(|hw| !hw.is_default) {
        if state.hardware.insert(hw.id.clone(), hw.clone()).is_some() {
            shadowed.push((ResourceKind::Hardware, hw.id.to_string()));
        }
    }
    for os in old.os.values().filter(|os| !os.is_default) {
        if state.os.insert(os.id.clone(), os.clone()).is_some() {
            shadowed.push((ResourceKind::Os, os.id.to_string()));
        }
    }
    for fw in old.firmware.values().filter(|fw| !fw.is_default) {
        if state.firmware.insert(fw.id.clone(), fw.clone()).is_some() {
            shadowed.push((ResourceKind::Firmware, fw.id.to_string()));
        }
    }
    state.images = old.images.clone();
    state.last_image = old.last_image.clone();

    // Only user entries can dangle after a merge; catalog entries are
    // validated when the catalog is loaded.
    let user_ids: BTreeSet<(ResourceKind, String)> = old
        .hardware
        .values()
        .filter(|hw| !hw.is_default)
        .map(|hw| (ResourceKind::Hardware, hw.id.to_string()))
        .chain(
            old.os
                .values()
                .filter(|os| !os.is_default)
                .map(|os| (ResourceKind::Os, os.id.to_string())),
        )
        .chain(
            old.images
                .keys()
                .map(|id| (ResourceKind::Image, id.to_string())),
        )
        .collect();
    let dangling = state
        .dangling_references()
        .into_iter()
        .filter(|d| user_ids.contains(&(d.kind, d.id.clone())))
        .collect();

    MergeOutcome {
        state,
        shadowed,
        dangling,
    }
}
