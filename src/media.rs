//! Image uploads to the public storage buckets

use std::fmt;

use fitcooker_storage::FileOptions;

use crate::error::{Error, Result};
use crate::FitCooker;

/// Largest accepted image, 5 MiB
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const CACHE_CONTROL_SECONDS: &str = "3600";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Avatars,
    RecipeImages,
}

impl Bucket {
    pub fn id(&self) -> &'static str {
        match self {
            Bucket::Avatars => "avatars",
            Bucket::RecipeImages => "recipe-images",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Rejects anything that is not an image or is too large
pub fn check_image(content_type: &str, size: usize) -> Result<()> {
    if !content_type.trim().to_lowercase().starts_with("image/") {
        return Err(Error::invalid_input(format!(
            "only images can be uploaded, got {}",
            content_type
        )));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(Error::invalid_input(format!(
            "image is {} bytes, the limit is {}",
            size, MAX_IMAGE_BYTES
        )));
    }
    Ok(())
}

/// Extension of `file_name`, or one derived from the content type
fn extension(file_name: &str, content_type: &str) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.unwrap_or_else(|| {
        match content_type.trim().to_lowercase().trim_start_matches("image/") {
            "jpeg" => "jpg".to_string(),
            "svg+xml" => "svg".to_string(),
            other if !other.is_empty() => other.to_string(),
            _ => "bin".to_string(),
        }
    })
}

/// `{user_id}/{folder}/{name}.{ext}`, without the folder segment when there is none
pub fn object_path(user_id: &str, folder: Option<&str>, name: &str, ext: &str) -> String {
    match folder.map(|f| f.trim_matches('/')).filter(|f| !f.is_empty()) {
        Some(folder) => format!("{}/{}/{}.{}", user_id, folder, name, ext),
        None => format!("{}/{}.{}", user_id, name, ext),
    }
}

pub struct Media<'a> {
    client: &'a FitCooker,
}

impl<'a> Media<'a> {
    pub(crate) fn new(client: &'a FitCooker) -> Self {
        Self { client }
    }

    /// Upload an image under a fresh unique name and return its public URL
    pub async fn upload_image(
        &self,
        bucket: Bucket,
        user_id: &str,
        folder: Option<&str>,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        check_image(content_type, bytes.len())?;
        if user_id.trim().is_empty() {
            return Err(Error::NotSignedIn);
        }

        let name = uuid::Uuid::new_v4().simple().to_string();
        let path = object_path(user_id, folder, &name, &extension(file_name, content_type));

        let options = FileOptions::new()
            .with_content_type(content_type)
            .with_cache_control(CACHE_CONTROL_SECONDS)
            .with_upsert(false);

        let storage = self.client.storage();
        let objects = storage.from(bucket.id());
        objects.upload_bytes(&path, bytes, Some(options)).await?;
        tracing::info!(%bucket, path = %path, "image uploaded");

        Ok(objects.get_public_url(&path))
    }

    pub async fn delete_image(&self, bucket: Bucket, path: &str) -> Result<()> {
        let storage = self.client.storage();
        storage.from(bucket.id()).remove(vec![path]).await?;
        tracing::debug!(%bucket, path, "image removed");
        Ok(())
    }
}
