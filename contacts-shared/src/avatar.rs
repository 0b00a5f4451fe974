/// Avatar helpers
///
/// - [`gravatar_url`]: deterministic Gravatar URL for an email
/// - [`AvatarProber`]: liveness check for candidate image URLs
/// - [`resolve_avatar_url`]: picks the first live candidate or the bundled default
/// - [`AvatarStorage`]: moves uploads into the public directory and removes
///   superseded files

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// URL prefix (and directory under the public dir) for stored avatars
pub const AVATARS_URL_PREFIX: &str = "/avatars";

/// Bundled image used when no remote avatar is reachable
pub const DEFAULT_AVATAR_URL: &str = "/avatars/avatar_default_abstract.png";

/// Upload size limit in KiB
pub const AVATAR_MAX_SIZE_KB: usize = 1024;

/// Accepted upload extensions (lowercase)
pub const AVATAR_ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Gravatar image size in pixels
pub const GRAVATAR_SIZE: u32 = 250;

/// Error type for avatar operations
#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    /// Probe got a status that is neither success nor 404
    #[error("Unexpected response status: {0}")]
    UnexpectedStatus(u16),

    /// Probe request failed
    #[error("Error checking image URL: {0}")]
    Request(String),

    /// Upload has no usable file extension
    #[error("file extension must be one of: {}", AVATAR_ALLOWED_EXTENSIONS.join(", "))]
    UnsupportedExtension,

    /// Upload exceeds the size limit
    #[error("file size must not exceed {} KB", AVATAR_MAX_SIZE_KB)]
    TooLarge,

    /// Filesystem failure while storing the upload
    #[error("Failed to store avatar: {0}")]
    Io(#[from] std::io::Error),
}

/// Gravatar URL for `email`, returning 404 when no image exists
pub fn gravatar_url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());

    format!(
        "https://gravatar.com/avatar/{}?d=404&s={}&r=g",
        hex::encode(digest),
        GRAVATAR_SIZE
    )
}

/// Checks whether an image URL is live
#[async_trait]
pub trait AvatarProber: Send + Sync {
    /// `Ok(true)` on HTTP success, `Ok(false)` on 404, error otherwise
    async fn is_available(&self, url: &str) -> Result<bool, AvatarError>;
}

/// Probes URLs with `reqwest`
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Builds a prober whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, AvatarError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AvatarError::Request(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl AvatarProber for HttpProber {
    async fn is_available(&self, url: &str) -> Result<bool, AvatarError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AvatarError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(AvatarError::UnexpectedStatus(status.as_u16()))
        }
    }
}

/// Picks the avatar for a new account
///
/// Tries the Gravatar URL, then `fallback_url` if set; probe errors count
/// as unavailable. Returns [`DEFAULT_AVATAR_URL`] when nothing is live.
pub async fn resolve_avatar_url(
    prober: &dyn AvatarProber,
    email: &str,
    fallback_url: Option<&str>,
) -> String {
    let gravatar = gravatar_url(email);
    let candidates = std::iter::once(gravatar.as_str()).chain(fallback_url);

    for candidate in candidates {
        match prober.is_available(candidate).await {
            Ok(true) => return candidate.to_string(),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(url = %candidate, error = %e, "Avatar probe failed");
            }
        }
    }

    DEFAULT_AVATAR_URL.to_string()
}

/// Lowercased extension of `file_name` if it is an accepted image type
pub fn allowed_extension(file_name: &str) -> Result<String, AvatarError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or(AvatarError::UnsupportedExtension)?;

    if AVATAR_ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(AvatarError::UnsupportedExtension)
    }
}

/// Stores uploaded avatars under `<public_dir>/avatars`
#[derive(Debug, Clone)]
pub struct AvatarStorage {
    public_dir: PathBuf,
    temp_dir: PathBuf,
}

impl AvatarStorage {
    pub fn new(public_dir: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Directory the avatars are served from
    pub fn avatars_dir(&self) -> PathBuf {
        self.public_dir.join(AVATARS_URL_PREFIX.trim_start_matches('/'))
    }

    /// Stages `bytes` in the temp dir, then moves them into the avatars dir
    ///
    /// # Returns
    ///
    /// The public URL path (`/avatars/<user_id>_<uuid>.<ext>`)
    ///
    /// # Errors
    ///
    /// Size, extension or filesystem failures
    pub async fn store_upload(
        &self,
        user_id: i64,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, AvatarError> {
        if bytes.len() > AVATAR_MAX_SIZE_KB * 1024 {
            return Err(AvatarError::TooLarge);
        }
        let extension = allowed_extension(file_name)?;

        let id = Uuid::new_v4().simple().to_string();
        let staged = self.temp_dir.join(format!("{}.{}", id, extension));

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        tokio::fs::write(&staged, bytes).await?;

        let stored_name = format!("{}_{}.{}", user_id, id, extension);
        let avatars_dir = self.avatars_dir();
        let target = avatars_dir.join(&stored_name);

        let moved = async {
            tokio::fs::create_dir_all(&avatars_dir).await?;
            move_file(&staged, &target).await
        }
        .await;

        if let Err(e) = moved {
            let _ = tokio::fs::remove_file(&staged).await;
            return Err(e.into());
        }

        Ok(format!("{}/{}", AVATARS_URL_PREFIX, stored_name))
    }

    /// Deletes a superseded avatar, logging instead of failing
    ///
    /// The bundled default and remote URLs are never touched.
    pub async fn remove_previous(&self, avatar_url: &str) {
        let Some(file_name) = self.local_file_name(avatar_url) else {
            return;
        };
        let path = self.avatars_dir().join(file_name);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed previous avatar"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Previous avatar not found, nothing to delete");
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                tracing::warn!(path = %path.display(), "Permission denied while deleting previous avatar");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to delete previous avatar");
            }
        }
    }

    fn local_file_name<'a>(&self, avatar_url: &'a str) -> Option<&'a str> {
        if avatar_url == DEFAULT_AVATAR_URL {
            return None;
        }

        let name = avatar_url.strip_prefix(AVATARS_URL_PREFIX)?.strip_prefix('/')?;

        // Only plain file names inside the avatars dir
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
            return None;
        }

        Some(name)
    }
}

async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        // Temp and public dirs on different filesystems
        Err(_) => {
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
    }
}
