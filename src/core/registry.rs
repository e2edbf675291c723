//! Resource registry
//!
//! [`Registry`] owns the four entity maps of a data directory, enforces
//! referential integrity on create and delete, and persists every mutation
//! to `index.json` with a durable replace.
//!
//! Mutations are staged on a copy of the state. The copy is saved first and
//! only then swapped in, so the in-memory maps and the document on disk
//! always agree: a failed save leaves both at the previous state.

use std::path::PathBuf;

use crate::config::defaults;
use crate::core::catalog::Catalog;
use crate::core::command::{build_qemu_command, QemuCommand};
use crate::core::model::{
    Firmware, FirmwareId, Hardware, HardwareId, Image, ImageId, OperatingSystem, OsId,
    ResourceKind,
};
use crate::core::state::{merge_defaults, DanglingReference, RegistryState};
use crate::error::{FilesystemError, RegistryError};
use crate::infra::dirs::DataLayout;
use crate::infra::download::ProgressCallback;
use crate::infra::fetch::{ArtifactFetcher, FetchOutcome};
use crate::infra::filesystem;

/// Summary of an `update_defaults` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultsUpdate {
    /// Catalog version the registry was seeded from before the update
    pub previous_version: Option<semver::Version>,
    /// Catalog version now in effect
    pub version: semver::Version,
    /// Catalog entries hidden by a user entry with the same id
    pub shadowed: Vec<(ResourceKind, String)>,
    /// User entries referencing something the catalog no longer ships
    pub dangling: Vec<DanglingReference>,
}

/// A newly registered entry and the artifact fetched for it
#[derive(Debug, Clone)]
pub struct Created<T> {
    pub entry: T,
    pub artifact: FetchOutcome,
}

/// The registry of one data directory
#[derive(Debug)]
pub struct Registry {
    layout: DataLayout,
    catalog: Catalog,
    fetcher: ArtifactFetcher,
    emulator_prefix: Option<String>,
    state: RegistryState,
}

impl Registry {
    /// Open the registry stored in `layout`
    ///
    /// A missing state document is seeded from `catalog` and written
    /// immediately. An unreadable or malformed document is reported as
    /// [`RegistryError::CorruptState`] and left untouched on disk.
    pub fn load(
        layout: DataLayout,
        catalog: Catalog,
        fetcher: ArtifactFetcher,
    ) -> Result<Self, RegistryError> {
        filesystem::create_dir_all(layout.root())?;
        filesystem::create_dir_all(&layout.images_dir())?;
        filesystem::create_dir_all(&layout.firmware_dir())?;

        let state_file = layout.state_file();
        let mut registry = Self {
            layout,
            catalog,
            fetcher,
            emulator_prefix: None,
            state: RegistryState::default(),
        };

        if state_file.exists() {
            let content = filesystem::read_file(&state_file).map_err(|e| {
                RegistryError::CorruptState {
                    path: state_file.clone(),
                    error: e.to_string(),
                }
            })?;
            registry.state =
                RegistryState::from_json(&content).map_err(|error| RegistryError::CorruptState {
                    path: state_file.clone(),
                    error,
                })?;
            tracing::debug!("Loaded state from {}", state_file.display());
            registry.hint_catalog_update();
        } else {
            tracing::info!(
                "No state at {}, seeding from catalog {}",
                state_file.display(),
                registry.catalog.version()
            );
            let seeded = RegistryState::from_catalog(&registry.catalog);
            registry.commit(seeded)?;
        }

        Ok(registry)
    }

    /// Use `prefix` instead of `qemu-system-` for emulator binaries
    #[must_use]
    pub fn with_emulator_prefix(mut self, prefix: Option<String>) -> Self {
        self.emulator_prefix = prefix;
        self
    }

    fn hint_catalog_update(&self) {
        let shipped = self.catalog.version();
        match &self.state.catalog_version {
            Some(seeded) if seeded >= shipped => {}
            Some(seeded) => tracing::warn!(
                "Defaults come from catalog {seeded}, catalog {shipped} is available. \
                 Run `rpem defaults update` to refresh them"
            ),
            None => tracing::warn!(
                "Defaults have no recorded catalog version. \
                 Run `rpem defaults update` to refresh them to catalog {shipped}"
            ),
        }
    }

    /// Save `next` and make it the current state
    fn commit(&mut self, next: RegistryState) -> Result<(), RegistryError> {
        let path = self.layout.state_file();
        let json = next.to_json().map_err(|e| FilesystemError::WriteFile {
            path: path.clone(),
            error: e.to_string(),
        })?;
        filesystem::write_file_atomic(&path, &json)?;
        tracing::debug!("Saved state to {}", path.display());
        self.state = next;
        Ok(())
    }

    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn last_image(&self) -> Option<&ImageId> {
        self.state.last_image.as_ref()
    }

    /// Whether an entry of `kind` with `id` exists
    pub fn has_resource(&self, kind: ResourceKind, id: &str) -> bool {
        self.state.contains(kind, id)
    }

    /// Register a user hardware profile
    pub fn create_hardware(
        &mut self,
        id: &str,
        name: &str,
        qemu_arch: &str,
        qemu_args: &str,
    ) -> Result<Hardware, RegistryError> {
        let id = HardwareId::parse(id)?;
        if self.state.hardware.contains_key(&id) {
            return Err(RegistryError::DuplicateId {
                kind: ResourceKind::Hardware,
                id: id.to_string(),
            });
        }

        let hardware = Hardware {
            id,
            name: name.to_string(),
            is_default: false,
            qemu_arch: qemu_arch.trim().to_string(),
            qemu_args: qemu_args.to_string(),
        };

        let mut next = self.state.clone();
        next.hardware.insert(hardware.id.clone(), hardware.clone());
        self.commit(next)?;

        tracing::info!("Created hardware '{}'", hardware.id);
        Ok(hardware)
    }

    /// Register a user operating system
    ///
    /// Every reference is checked before anything changes. Repeated hardware
    /// ids are collapsed, keeping the first occurrence.
    pub fn create_os(
        &mut self,
        id: &str,
        name: &str,
        details: &str,
        firmware_id: &str,
        hardware_ids: &[&str],
        dl_link: &str,
    ) -> Result<OperatingSystem, RegistryError> {
        let id = OsId::parse(id)?;
        if self.state.os.contains_key(&id) {
            return Err(RegistryError::DuplicateId {
                kind: ResourceKind::Os,
                id: id.to_string(),
            });
        }

        let firmware_id = FirmwareId::parse(firmware_id)?;
        if !self.state.firmware.contains_key(&firmware_id) {
            return Err(RegistryError::UnknownReference {
                kind: ResourceKind::Firmware,
                id: firmware_id.to_string(),
            });
        }

        let mut resolved: Vec<HardwareId> = Vec::with_capacity(hardware_ids.len());
        for raw in hardware_ids {
            let hw = HardwareId::parse(raw)?;
            if !self.state.hardware.contains_key(&hw) {
                return Err(RegistryError::UnknownReference {
                    kind: ResourceKind::Hardware,
                    id: hw.to_string(),
                });
            }
            if !resolved.contains(&hw) {
                resolved.push(hw);
            }
        }

        let os = OperatingSystem {
            id,
            name: name.to_string(),
            details: details.to_string(),
            is_default: false,
            hardware_ids: resolved,
            dl_link: dl_link.to_string(),
            firmware_id,
        };

        let mut next = self.state.clone();
        next.os.insert(os.id.clone(), os.clone());
        self.commit(next)?;

        tracing::info!("Created operating system '{}'", os.id);
        Ok(os)
    }

    /// Register a user firmware, downloading it first
    ///
    /// The entry is only added once `fw/<id>.fw` is in place.
    pub async fn create_firmware(
        &mut self,
        id: &str,
        dl_link: &str,
        progress: Option<&ProgressCallback>,
    ) -> Result<Created<Firmware>, RegistryError> {
        let id = FirmwareId::parse(id)?;
        if self.state.firmware.contains_key(&id) {
            return Err(RegistryError::DuplicateId {
                kind: ResourceKind::Firmware,
                id: id.to_string(),
            });
        }

        let outcome = self
            .fetcher
            .ensure_present(
                &self.layout.firmware_dir(),
                id.as_str(),
                defaults::FIRMWARE_EXT,
                dl_link,
                progress,
            )
            .await
            .map_err(|source| RegistryError::Fetch {
                kind: ResourceKind::Firmware,
                id: id.to_string(),
                source,
            })?;

        let firmware = Firmware {
            id,
            dl_link: dl_link.to_string(),
            is_default: false,
        };

        let mut next = self.state.clone();
        next.firmware.insert(firmware.id.clone(), firmware.clone());
        if let Err(e) = self.commit(next) {
            discard_download(&outcome);
            return Err(e);
        }

        tracing::info!("Created firmware '{}'", firmware.id);
        Ok(Created {
            entry: firmware,
            artifact: outcome,
        })
    }

    /// Create an image of `os_id` for `hardware_id`, downloading the OS
    ///
    /// The image becomes `last_image`.
    pub async fn create_image(
        &mut self,
        name: &str,
        hardware_id: &str,
        os_id: &str,
        progress: Option<&ProgressCallback>,
    ) -> Result<Created<Image>, RegistryError> {
        let hardware_id = HardwareId::parse(hardware_id)?;
        if !self.state.hardware.contains_key(&hardware_id) {
            return Err(RegistryError::UnknownReference {
                kind: ResourceKind::Hardware,
                id: hardware_id.to_string(),
            });
        }
        let os_id = OsId::parse(os_id)?;
        let Some(os) = self.state.os.get(&os_id) else {
            return Err(RegistryError::UnknownReference {
                kind: ResourceKind::Os,
                id: os_id.to_string(),
            });
        };
        if !os.supports(&hardware_id) {
            tracing::warn!(
                "Operating system '{}' does not list hardware '{}' as supported",
                os.id,
                hardware_id
            );
        }
        let dl_link = os.dl_link.clone();

        let image = Image::new(name, hardware_id, os_id)?;
        if self.state.images.contains_key(&image.id) {
            return Err(RegistryError::DuplicateResource {
                id: image.id.to_string(),
                name: image.name,
                os_id: image.os_id.to_string(),
                hardware_id: image.hardware_id.to_string(),
            });
        }

        let outcome = self
            .fetcher
            .ensure_present(
                &self.layout.images_dir(),
                image.id.as_str(),
                defaults::IMAGE_EXT,
                &dl_link,
                progress,
            )
            .await
            .map_err(|source| RegistryError::Fetch {
                kind: ResourceKind::Image,
                id: image.id.to_string(),
                source,
            })?;

        let mut next = self.state.clone();
        next.images.insert(image.id.clone(), image.clone());
        next.last_image = Some(image.id.clone());
        if let Err(e) = self.commit(next) {
            discard_download(&outcome);
            return Err(e);
        }

        tracing::info!("Created image '{}' at {}", image.id, outcome.path.display());
        Ok(Created {
            entry: image,
            artifact: outcome,
        })
    }

    /// Delete a user entry
    ///
    /// Catalog entries are protected and entries that others reference are
    /// kept. Deleting an image or firmware also removes its file; once the
    /// entry is gone from the saved state, a file that cannot be removed is
    /// only logged.
    pub fn delete_resource(&mut self, kind: ResourceKind, id: &str) -> Result<(), RegistryError> {
        match self.state.is_default(kind, id) {
            None => {
                return Err(RegistryError::UnknownReference {
                    kind,
                    id: id.to_string(),
                })
            }
            Some(true) => {
                return Err(RegistryError::ProtectedResource {
                    kind,
                    id: id.to_string(),
                })
            }
            Some(false) => {}
        }

        let dependents = self.state.dependents_of(kind, id);
        if !dependents.is_empty() {
            return Err(RegistryError::ResourceInUse {
                kind,
                id: id.to_string(),
                dependents,
            });
        }

        let mut next = self.state.clone();
        let artifact: Option<PathBuf> = match kind {
            ResourceKind::Hardware => {
                next.hardware.remove(id);
                None
            }
            ResourceKind::Os => {
                next.os.remove(id);
                None
            }
            ResourceKind::Image => {
                next.images.remove(id);
                if next.last_image.as_ref().is_some_and(|last| last.as_str() == id) {
                    next.last_image = None;
                }
                Some(self.layout.image_path(id))
            }
            ResourceKind::Firmware => {
                next.firmware.remove(id);
                Some(self.layout.firmware_path(id))
            }
        };
        self.commit(next)?;

        if let Some(path) = artifact {
            match filesystem::remove_file_if_exists(&path) {
                Ok(true) => tracing::debug!("Removed {}", path.display()),
                Ok(false) => {}
                Err(e) => tracing::warn!("Deleted {kind} '{id}' but kept its file: {e}"),
            }
        }

        tracing::info!("Deleted {} '{}'", kind, id);
        Ok(())
    }

    /// Re-seed the catalog entries, keeping every user entry
    pub fn update_defaults(&mut self) -> Result<DefaultsUpdate, RegistryError> {
        let previous_version = self.state.catalog_version.clone();
        let outcome = merge_defaults(&self.state, &self.catalog);

        for (kind, id) in &outcome.shadowed {
            tracing::warn!("User {kind} '{id}' shadows the catalog entry with the same id");
        }
        for dangling in &outcome.dangling {
            tracing::warn!("{dangling}");
        }

        self.commit(outcome.state)?;
        tracing::info!("Defaults updated to catalog {}", self.catalog.version());

        Ok(DefaultsUpdate {
            previous_version,
            version: self.catalog.version().clone(),
            shadowed: outcome.shadowed,
            dangling: outcome.dangling,
        })
    }

    /// Record `image_id` as the most recently used image
    pub fn set_last_image(&mut self, image_id: &str) -> Result<(), RegistryError> {
        let Some(image) = self.state.images.get(image_id) else {
            return Err(RegistryError::UnknownReference {
                kind: ResourceKind::Image,
                id: image_id.to_string(),
            });
        };
        if self.state.last_image.as_ref() == Some(&image.id) {
            return Ok(());
        }

        let mut next = self.state.clone();
        next.last_image = Some(image.id.clone());
        self.commit(next)
    }

    /// Build the emulator invocation for an image
    ///
    /// Downloads the firmware on first use, and the image again if its file
    /// has gone missing. Both are no-ops when the files are present.
    pub async fn get_qemu_cmd(
        &self,
        image_id: &str,
        progress: Option<&ProgressCallback>,
    ) -> Result<QemuCommand, RegistryError> {
        let image = self
            .state
            .images
            .get(image_id)
            .ok_or_else(|| RegistryError::UnknownReference {
                kind: ResourceKind::Image,
                id: image_id.to_string(),
            })?;
        let hardware = self.state.hardware.get(&image.hardware_id).ok_or_else(|| {
            RegistryError::UnknownReference {
                kind: ResourceKind::Hardware,
                id: image.hardware_id.to_string(),
            }
        })?;
        let os = self
            .state
            .os
            .get(&image.os_id)
            .ok_or_else(|| RegistryError::UnknownReference {
                kind: ResourceKind::Os,
                id: image.os_id.to_string(),
            })?;
        let firmware = self.state.firmware.get(&os.firmware_id).ok_or_else(|| {
            RegistryError::UnknownReference {
                kind: ResourceKind::Firmware,
                id: os.firmware_id.to_string(),
            }
        })?;

        let image_file = self
            .fetcher
            .ensure_present(
                &self.layout.images_dir(),
                image.id.as_str(),
                defaults::IMAGE_EXT,
                &os.dl_link,
                progress,
            )
            .await
            .map_err(|source| RegistryError::Fetch {
                kind: ResourceKind::Image,
                id: image.id.to_string(),
                source,
            })?;
        let firmware_file = self
            .fetcher
            .ensure_present(
                &self.layout.firmware_dir(),
                firmware.id.as_str(),
                defaults::FIRMWARE_EXT,
                &firmware.dl_link,
                progress,
            )
            .await
            .map_err(|source| RegistryError::Fetch {
                kind: ResourceKind::Firmware,
                id: firmware.id.to_string(),
                source,
            })?;

        Ok(build_qemu_command(
            self.emulator_prefix.as_deref(),
            hardware,
            &image_file.path,
            &firmware_file.path,
        ))
    }
}

/// Remove a file downloaded for an entry that was never saved
fn discard_download(outcome: &FetchOutcome) {
    if !outcome.downloaded {
        return;
    }
    if let Err(e) = filesystem::remove_file_if_exists(&outcome.path) {
        tracing::warn!("Failed to remove unregistered download: {e}");
    }
}
