pub mod manifest;
pub mod target;

pub use manifest::{EventManifest, MANIFEST_FILE_NAME, MAX_PAD_WIDTH};
pub use target::{parse_offset, parse_target, resolve_target, ELAPSED};
