//! Shared key generation for storage backends.
//!
//! Key format: `{company_id}/{item_id}/{timestamp}_{random}.{ext}`. The key
//! is stored on the media row alongside the public URL.

use rand::distr::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

const RANDOM_SUFFIX_LEN: usize = 8;

/// Generate a storage key for a media upload.
pub fn generate_media_key(company_id: Uuid, item_id: Uuid, extension: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!(
        "{}/{}/{}_{}.{}",
        company_id,
        item_id,
        chrono::Utc::now().timestamp_millis(),
        suffix,
        extension.trim_start_matches('.')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_media_key_format() {
        let company = Uuid::new_v4();
        let item = Uuid::new_v4();
        let key = generate_media_key(company, item, "png");
        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], company.to_string());
        assert_eq!(parts[1], item.to_string());
        assert!(parts[2].ends_with(".png"));
        assert!(parts[2].contains('_'));
    }

    #[test]
    fn test_generate_media_key_unique() {
        let company = Uuid::new_v4();
        let item = Uuid::new_v4();
        assert_ne!(
            generate_media_key(company, item, "pdf"),
            generate_media_key(company, item, "pdf")
        );
    }

}
