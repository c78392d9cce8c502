use std::io::{Read, Write};

use flate2::Compression as GzLevel;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::rep::{RepError, Result};

/// gzip member magic used by compressed class stores.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

const MAX_DECOMPRESSED_BYTES: usize = 256 * 1024 * 1024;

/// Compression mode detected for a store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
	/// Raw uncompressed stream.
	None,
	/// gzip-compressed stream.
	Gzip,
}

impl Compression {
	/// Render compression mode as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Gzip => "gzip",
		}
	}
}

/// Detect and decode compression, returning `(mode, decoded_bytes)`.
pub fn decode_bytes(raw: Vec<u8>) -> Result<(Compression, Vec<u8>)> {
	if !raw.starts_with(&GZIP_MAGIC) {
		return Ok((Compression::None, raw));
	}

	let mut decoder = GzDecoder::new(raw.as_slice());
	let mut out = Vec::new();
	let mut buf = [0_u8; 8192];

	loop {
		let read = decoder.read(&mut buf)?;
		if read == 0 {
			break;
		}

		if out.len() + read > MAX_DECOMPRESSED_BYTES {
			return Err(RepError::DecompressedTooLarge { limit: MAX_DECOMPRESSED_BYTES });
		}

		out.extend_from_slice(&buf[..read]);
	}

	Ok((Compression::Gzip, out))
}

/// gzip-encode a finished store image.
pub fn encode_gzip(bytes: &[u8]) -> Result<Vec<u8>> {
	let mut encoder = GzEncoder::new(Vec::new(), GzLevel::default());
	encoder.write_all(bytes)?;
	Ok(encoder.finish()?)
}
