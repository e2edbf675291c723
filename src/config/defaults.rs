//! Default configuration values

/// Name of the data directory under the user's home
pub const DATA_DIR_NAME: &str = ".rpem";

/// State document file name inside the data directory
pub const STATE_FILE: &str = "index.json";

/// Subdirectory holding materialized disk images
pub const IMAGES_SUBDIR: &str = "images";

/// Subdirectory holding firmware blobs
pub const FIRMWARE_SUBDIR: &str = "fw";

/// File extension of materialized disk images
pub const IMAGE_EXT: &str = "img";

/// File extension of firmware blobs
pub const FIRMWARE_EXT: &str = "fw";

/// Emulator binary prefix; the hardware's arch is appended
pub const DEFAULT_EMULATOR_PREFIX: &str = "qemu-system-";

/// Overall HTTP timeout for artifact downloads (in seconds)
///
/// OS images are hundreds of megabytes, so this is generous.
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 3600;

/// HTTP connect timeout (in seconds)
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// User agent sent with downloads
pub const USER_AGENT: &str = concat!("rpem/", env!("CARGO_PKG_VERSION"));
