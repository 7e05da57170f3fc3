use crate::config::UploadConfig;
use crate::error::{AppError, AppResult};
use crate::utils::secure_filename;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Local-directory store for uploaded payment proofs.
///
/// Stored files are addressed by the sanitised reference returned from
/// [`ProofStorage::save`]; that reference is what orders record.
#[derive(Clone, Debug)]
pub struct ProofStorage {
    root: PathBuf,
    max_bytes: usize,
}

impl ProofStorage {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            root: PathBuf::from(&config.dir),
            max_bytes: config.max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Writes `bytes` under `{user_id}_{YYYYmmddHHMMSS}_{original_name}`.
    pub async fn save(&self, user_id: i64, original_name: &str, bytes: &[u8]) -> AppResult<String> {
        if bytes.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Payment proof exceeds {} bytes",
                self.max_bytes
            )));
        }

        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let mut reference = secure_filename(&format!("{user_id}_{stamp}_{original_name}"));
        if reference.is_empty() {
            return Err(AppError::ValidationError(
                "Invalid payment proof file name".to_string(),
            ));
        }

        self.ensure_root().await?;
        // same user, same second, same name: keep both files
        if tokio::fs::try_exists(self.root.join(&reference)).await? {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            reference = format!("{}_{}", &suffix[..8], reference);
        }

        tokio::fs::write(self.root.join(&reference), bytes).await?;
        log::info!(
            "Stored payment proof {reference} ({} bytes) for user {user_id}",
            bytes.len()
        );
        Ok(reference)
    }

    /// Reads back a stored proof. References that are not already sanitised
    /// are refused instead of being resolved against the file system.
    pub async fn read(&self, reference: &str) -> AppResult<Vec<u8>> {
        if reference.is_empty() || secure_filename(reference) != reference {
            return Err(AppError::NotFound("Payment proof not found".to_string()));
        }

        match tokio::fs::read(self.root.join(reference)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("Payment proof not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
