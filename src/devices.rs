use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crate::error::{ClientError, Result};
use crate::models::location::Coordinates;

/// Base64 payloads above this are refused before upload.
pub const MAX_AVATAR_BASE64_LEN: usize = 5_000_000;

/// Foreground location. `None` means permission was denied or no fix is available;
/// callers degrade instead of failing.
pub trait LocationProvider: Send + Sync {
    fn current_position(&self) -> impl Future<Output = Option<Coordinates>> + Send;
}

/// A location source that always answers the same, e.g. from CLI flags.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedLocation(pub Option<Coordinates>);

impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Option<Coordinates> {
        self.0.filter(Coordinates::is_valid)
    }
}

/// Image library access. `Ok(None)` means the user denied access or cancelled.
pub trait ImageSource: Send + Sync {
    fn pick_image(&self) -> Result<Option<Vec<u8>>>;
}

pub struct FileImage {
    path: PathBuf,
}

impl FileImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for FileImage {
    fn pick_image(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Encodes picked image bytes as the data URI the profile endpoint expects.
pub fn avatar_data_uri(bytes: &[u8]) -> Result<String> {
    let encoded = STANDARD.encode(bytes);
    if encoded.len() > MAX_AVATAR_BASE64_LEN {
        return Err(ClientError::validation("Image is too large, please pick a smaller one"));
    }
    Ok(format!("data:image/jpeg;base64,{}", encoded))
}
