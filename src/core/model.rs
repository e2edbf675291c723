//! Registry entity types
//!
//! Hardware profiles, operating systems, firmware blobs and materialized
//! images. Each kind has its own identifier type so an `OsId` can never be
//! looked up in the hardware map by accident.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::error::IdError;

/// Longest accepted identifier, including derived image ids
pub const MAX_ID_LEN: usize = 128;

/// The four kinds of resource the registry tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Hardware,
    Os,
    Image,
    Firmware,
}

impl ResourceKind {
    /// All kinds, in document order
    pub const ALL: [ResourceKind; 4] = [Self::Hardware, Self::Os, Self::Image, Self::Firmware];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware => write!(f, "hardware"),
            Self::Os => write!(f, "operating system"),
            Self::Image => write!(f, "image"),
            Self::Firmware => write!(f, "firmware"),
        }
    }
}

/// Check that `id` is usable as an identifier (and therefore a file name)
pub fn validate_id(kind: ResourceKind, id: &str) -> Result<(), IdError> {
    let reject = |reason: &str| IdError {
        kind,
        id: id.to_string(),
        reason: reason.to_string(),
    };

    if id.is_empty() {
        return Err(reject("id must not be empty"));
    }
    if id.len() > MAX_ID_LEN {
        return Err(reject(&format!("id is longer than {MAX_ID_LEN} characters")));
    }
    if !id.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(reject("id must start with a letter or digit"));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(reject(&format!("character '{bad}' is not allowed")));
    }
    Ok(())
}

macro_rules! define_id {
    ($name:ident, $kind:expr) => {
        /// Typed identifier for one resource kind.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// The resource kind this id belongs to.
            pub const KIND: ResourceKind = $kind;

            /// Parses and validates an id.
            pub fn parse(s: &str) -> Result<Self, IdError> {
                validate_id(Self::KIND, s)?;
                Ok(Self(s.to_string()))
            }

            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(HardwareId, ResourceKind::Hardware);
define_id!(OsId, ResourceKind::Os);
define_id!(FirmwareId, ResourceKind::Firmware);
define_id!(ImageId, ResourceKind::Image);

/// An emulated board profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hardware {
    pub id: HardwareId,
    pub name: String,
    pub is_default: bool,
    /// Suffix of the emulator binary, e.g. `aarch64`
    pub qemu_arch: String,
    /// Raw emulator flags, passed through verbatim
    pub qemu_args: String,
}

/// An installable operating system image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatingSystem {
    pub id: OsId,
    pub name: String,
    pub details: String,
    pub is_default: bool,
    /// Hardware this OS boots on, ordered and without duplicates
    pub hardware_ids: Vec<HardwareId>,
    pub dl_link: String,
    pub firmware_id: FirmwareId,
}

impl OperatingSystem {
    /// Whether this OS lists `hardware_id` as supported
    pub fn supports(&self, hardware_id: &HardwareId) -> bool {
        self.hardware_ids.contains(hardware_id)
    }
}

/// A firmware blob, cached on disk as `fw/<id>.fw`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firmware {
    pub id: FirmwareId,
    pub dl_link: String,
    pub is_default: bool,
}

/// A materialized disk image, stored as `images/<id>.img`
///
/// Images are always user-created; the id is derived from the
/// (os, hardware, name) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: ImageId,
    pub name: String,
    pub hardware_id: HardwareId,
    pub os_id: OsId,
}

impl Image {
    /// Build an image record, deriving its id
    pub fn new(name: &str, hardware_id: HardwareId, os_id: OsId) -> Result<Self, IdError> {
        let id = derive_image_id(&os_id, &hardware_id, name)?;
        Ok(Self {
            id,
            name: name.to_string(),
            hardware_id,
            os_id,
        })
    }
}

/// Lowercase `name` and replace everything outside `[a-z0-9_]` with `_`
pub fn sanitize_image_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Derive the image id `{os}_{hardware}_{sanitized name}`
pub fn derive_image_id(
    os_id: &OsId,
    hardware_id: &HardwareId,
    name: &str,
) -> Result<ImageId, IdError> {
    if name.trim().is_empty() {
        return Err(IdError {
            kind: ResourceKind::Image,
            id: name.to_string(),
            reason: "image name must not be empty".to_string(),
        });
    }
    ImageId::parse(&format!(
        "{os_id}_{hardware_id}_{}",
        sanitize_image_name(name)
    ))
}
