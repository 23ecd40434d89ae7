//! Azure Blob Storage.

use edrs_config::AzureStorageConfig;

use crate::storage::FileStorage;
use crate::upload::{UploadMethod, UploadRules, UploadTarget, join_url};

/// Blob container in an Azure storage account.
#[derive(Debug, Clone)]
pub struct AzureStorage {
    base: String,
    sas_token: Option<String>,
    rules: UploadRules,
}

impl AzureStorage {
    #[must_use]
    pub fn new(config: &AzureStorageConfig, rules: UploadRules) -> Self {
        Self {
            base: format!(
                "https://{}.blob.core.windows.net/{}",
                config.account, config.container
            ),
            sas_token: config
                .sas_token
                .as_deref()
                .map(|token| token.trim_start_matches('?').to_owned())
                .filter(|token| !token.is_empty()),
            rules,
        }
    }
}

impl FileStorage for AzureStorage {
    fn backend(&self) -> &'static str {
        "azure"
    }

    fn rules(&self) -> &UploadRules {
        &self.rules
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.base, key)
    }

    fn upload_target(&self, key: &str, content_type: &str) -> UploadTarget {
        let mut url = join_url(&self.base, key);
        if let Some(token) = &self.sas_token {
            url.push('?');
            url.push_str(token);
        }
        UploadTarget::new(UploadMethod::Put, url)
            .header("Content-Type", content_type)
            .header("x-ms-blob-type", "BlockBlob")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn storage(sas_token: Option<&str>) -> AzureStorage {
        AzureStorage::new(
            &AzureStorageConfig {
                account: "edrsfiles".to_owned(),
                container: "documents".to_owned(),
                sas_token: sas_token.map(str::to_owned),
            },
            UploadRules {
                max_bytes: 1024,
                allowed_extensions: Vec::new(),
            },
        )
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            storage(None).public_url("contracts/a.pdf"),
            "https://edrsfiles.blob.core.windows.net/documents/contracts/a.pdf"
        );
    }

    #[test]
    fn test_upload_target_appends_sas() {
        let target =
            storage(Some("?sv=2022-11-02&sig=abc")).upload_target("a.pdf", "application/pdf");
        assert_eq!(
            target.url,
            "https://edrsfiles.blob.core.windows.net/documents/a.pdf?sv=2022-11-02&sig=abc"
        );
        assert_eq!(target.header_value("x-ms-blob-type"), Some("BlockBlob"));
    }

    #[test]
    fn test_public_url_never_leaks_sas() {
        assert!(!storage(Some("sig=abc")).public_url("a.pdf").contains("sig"));
    }
}
