//! Artifact decompression
//!
//! Detects the compression of a download from its URL and unpacks gzip or
//! xz files, including files made of several concatenated streams. Decoding
//! streams through a buffer, so multi-gigabyte disk images never sit in
//! memory.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use crate::error::FetchError;
use crate::infra::filesystem;

/// Compression of a downloaded artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Xz,
}

impl Compression {
    /// Detect compression from the trailing extension of a URL's path
    ///
    /// Query string and fragment are ignored; matching is case-insensitive.
    pub fn from_url(url: &str) -> Self {
        let path = match reqwest::Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url
                .split(|c| c == '?' || c == '#')
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        let path = path.to_ascii_lowercase();

        if path.ends_with(".gz") {
            Self::Gzip
        } else if path.ends_with(".xz") {
            Self::Xz
        } else {
            Self::None
        }
    }

    /// Extension used for the in-flight download file
    pub fn download_suffix(self) -> &'static str {
        match self {
            Self::None => "part",
            Self::Gzip => "gz",
            Self::Xz => "xz",
        }
    }

    pub fn is_compressed(self) -> bool {
        self != Self::None
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Gzip => write!(f, "gzip"),
            Self::Xz => write!(f, "xz"),
        }
    }
}

/// Decompress `src` into `dest`, returning the decompressed size
///
/// `dest` is removed if decoding fails part way, so a corrupt stream never
/// leaves output behind. `Compression::None` copies the file.
pub fn decompress_file(compression: Compression, src: &Path, dest: &Path) -> Result<u64, FetchError> {
    let result = decode_into(compression, src, dest);
    if result.is_err() {
        if let Err(e) = filesystem::remove_file_if_exists(dest) {
            tracing::warn!("Failed to clean up after decompression: {e}");
        }
    }
    result
}

fn decode_into(compression: Compression, src: &Path, dest: &Path) -> Result<u64, FetchError> {
    let input = File::open(src).map_err(|e| FetchError::Io {
        path: src.to_path_buf(),
        error: e.to_string(),
    })?;
    let input = BufReader::new(input);

    let output = File::create(dest).map_err(|e| FetchError::Io {
        path: dest.to_path_buf(),
        error: e.to_string(),
    })?;
    let mut output = BufWriter::new(output);

    let copied = match compression {
        Compression::Gzip => {
            let mut decoder = flate2::bufread::MultiGzDecoder::new(input);
            io::copy(&mut decoder, &mut output)
        }
        Compression::Xz => {
            let mut decoder = xz2::bufread::XzDecoder::new_multi_decoder(input);
            io::copy(&mut decoder, &mut output)
        }
        Compression::None => {
            let mut input = input;
            io::copy(&mut input, &mut output)
        }
    };

    let size = copied.map_err(|e| FetchError::Decompression {
        path: src.to_path_buf(),
        format: compression.to_string(),
        error: e.to_string(),
    })?;

    let file = output.into_inner().map_err(|e| FetchError::Io {
        path: dest.to_path_buf(),
        error: e.error().to_string(),
    })?;
    file.sync_all().map_err(|e| FetchError::Io {
        path: dest.to_path_buf(),
        error: e.to_string(),
    })?;

    tracing::debug!(
        "Decompressed {} ({}) -> {} ({} bytes)",
        src.display(),
        compression,
        dest.display(),
        size
    );

    Ok(size)
}

/// Compress bytes with gzip (test fixtures)
#[cfg(test)]
pub(crate) fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    use std::io::Write;
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Compress bytes with xz (test fixtures)
#[cfg(test)]
pub(crate) fn xz_bytes(data: &[u8]) -> Vec<u8> {
    use std::io::Write;
    let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 1);
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}
