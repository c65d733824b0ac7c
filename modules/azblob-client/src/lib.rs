pub mod error;

pub use error::{BlobError, Result};

use std::time::Duration;

use tracing::info;
use url::Url;
use uuid::Uuid;

/// Upload client for one blob container.
///
/// Uploads are keyed by a generated unique prefix plus the original file
/// name, so repeated uploads of the same file never collide; an upload to an
/// existing name overwrites it. Authentication uses the SAS token carried in
/// the connection string.
#[derive(Debug)]
pub struct BlobClient {
    endpoint: String,
    container: String,
    sas_token: String,
    http: reqwest::Client,
}

impl BlobClient {
    /// Parse a `BlobEndpoint=…;SharedAccessSignature=…` connection string.
    /// An account-name form (`AccountName=…;EndpointSuffix=…`) is accepted
    /// for the endpoint; a SAS token is required either way.
    pub fn from_connection_string(connection_string: &str, container: &str) -> Result<Self> {
        let mut endpoint = None;
        let mut account = None;
        let mut suffix = "core.windows.net".to_string();
        let mut protocol = "https".to_string();
        let mut sas = None;

        for pair in connection_string.split(';') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key.trim() {
                "BlobEndpoint" => endpoint = Some(value.trim().trim_end_matches('/').to_string()),
                "AccountName" => account = Some(value.trim().to_string()),
                "EndpointSuffix" => suffix = value.trim().to_string(),
                "DefaultEndpointsProtocol" => protocol = value.trim().to_string(),
                // `value` keeps everything after the first '=', so the
                // token's own k=v pairs survive intact.
                "SharedAccessSignature" => {
                    sas = Some(value.trim().trim_start_matches('?').to_string())
                }
                _ => {}
            }
        }

        let endpoint = match (endpoint, account) {
            (Some(e), _) => e,
            (None, Some(a)) => format!("{protocol}://{a}.blob.{suffix}"),
            (None, None) => {
                return Err(BlobError::ConnectionString(
                    "no BlobEndpoint or AccountName present".to_string(),
                ))
            }
        };
        let sas_token = sas.ok_or_else(|| {
            BlobError::ConnectionString("no SharedAccessSignature present".to_string())
        })?;

        Ok(Self {
            endpoint,
            container: container.to_string(),
            sas_token,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
        })
    }

    /// Upload `bytes` under a fresh `{uuid}_{file_name}` blob name and
    /// return the stored name the search index will eventually surface.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let stored_name = format!("{}_{}", Uuid::new_v4(), file_name);
        let raw = format!(
            "{}/{}/{}?{}",
            self.endpoint, self.container, stored_name, self.sas_token
        );
        let url = Url::parse(&raw)
            .map_err(|e| BlobError::ConnectionString(format!("invalid upload URL: {e}")))?;

        info!(blob = %stored_name, size = bytes.len(), "Uploading document blob");

        let resp = self
            .http
            .put(url)
            .header("x-ms-blob-type", "BlockBlob")
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BlobError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(stored_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blob_endpoint_form() {
        let client = BlobClient::from_connection_string(
            "BlobEndpoint=https://acct.blob.core.windows.net/;SharedAccessSignature=sv=2024&sig=abc",
            "docs",
        )
        .unwrap();
        assert_eq!(client.endpoint, "https://acct.blob.core.windows.net");
        assert_eq!(client.sas_token, "sv=2024&sig=abc");
    }

    #[test]
    fn parses_account_name_form() {
        let client = BlobClient::from_connection_string(
            "DefaultEndpointsProtocol=https;AccountName=acct;SharedAccessSignature=?sig=abc;EndpointSuffix=core.windows.net",
            "docs",
        )
        .unwrap();
        assert_eq!(client.endpoint, "https://acct.blob.core.windows.net");
        assert_eq!(client.sas_token, "sig=abc");
    }

    #[test]
    fn missing_sas_is_rejected() {
        let err = BlobClient::from_connection_string(
            "BlobEndpoint=https://acct.blob.core.windows.net",
            "docs",
        )
        .unwrap_err();
        assert!(matches!(err, BlobError::ConnectionString(_)));
    }

    #[test]
    fn stored_names_are_prefixed_and_unique() {
        let a = format!("{}_{}", Uuid::new_v4(), "제안서.pdf");
        let b = format!("{}_{}", Uuid::new_v4(), "제안서.pdf");
        assert_ne!(a, b);
        assert!(a.ends_with("_제안서.pdf"));
        assert_eq!(a.split('_').next().unwrap().len(), 36);
    }
}
