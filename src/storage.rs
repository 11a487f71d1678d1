//! File transfer to pre-signed storage URLs.
//!
//! Uploads pick their wire encoding per storage provider: Azure-issued URLs
//! need a blob-type header and a multipart body, everything else takes a raw
//! PUT (the legacy S3 path). Success here is any 2xx status, looser than the
//! API core's exact-200 rule; the two contracts are deliberately separate.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::api::transport::ConnectFailure;
use crate::error::StorageError;

/// Storage providers that need special handling on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageProvider {
    /// Azure blob storage: multipart body plus `x-ms-blob-type`.
    AzureBlob,
}

/// Matches a pre-signed URL to the provider that issued it.
pub struct ProviderRule {
    pub provider: StorageProvider,
    matcher: fn(&str) -> bool,
}

impl ProviderRule {
    pub fn new(provider: StorageProvider, matcher: fn(&str) -> bool) -> Self {
        Self { provider, matcher }
    }

    pub fn matches(&self, url: &str) -> bool {
        (self.matcher)(url)
    }
}

fn azure_marker(url: &str) -> bool {
    url.contains("windows") || url.contains("azure")
}

/// Rules matching the URLs the platform issues today.
pub fn default_rules() -> Vec<ProviderRule> {
    vec![ProviderRule::new(StorageProvider::AzureBlob, azure_marker)]
}

/// Wire encoding for the file bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadBody {
    /// Plain PUT body.
    Raw(Vec<u8>),
    /// Multipart form with a single part named `file`.
    Multipart(Vec<u8>),
}

/// A PUT against a pre-signed URL.
#[derive(Debug, Clone)]
pub struct BlobPut {
    pub url: String,
    pub body: UploadBody,
    pub headers: Vec<(String, String)>,
}

/// Seam to the storage backend so tests can capture uploads.
#[async_trait]
pub trait BlobTransport: Send + Sync {
    /// Perform the PUT and return the response status.
    async fn put(&self, request: BlobPut) -> Result<u16, ConnectFailure>;
}

/// reqwest-backed blob transport.
#[derive(Default)]
pub struct HttpBlobTransport {
    client: reqwest::Client,
}

impl HttpBlobTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobTransport for HttpBlobTransport {
    async fn put(&self, request: BlobPut) -> Result<u16, ConnectFailure> {
        let mut builder = match request.body {
            UploadBody::Raw(bytes) => self.client.put(&request.url).body(bytes),
            UploadBody::Multipart(bytes) => {
                let form = reqwest::multipart::Form::new()
                    .part("file", reqwest::multipart::Part::bytes(bytes));
                self.client.put(&request.url).multipart(form)
            }
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder
            .send()
            .await
            .map_err(|e| ConnectFailure(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

/// Uploads local files to pre-signed URLs.
///
/// One-shot: nothing here retries. A failed upload surfaces immediately and
/// the caller re-requests an upload URL and starts over.
pub struct FileStore {
    rules: Vec<ProviderRule>,
    transport: Arc<dyn BlobTransport>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::with_transport(Arc::new(HttpBlobTransport::new()))
    }

    pub fn with_transport(transport: Arc<dyn BlobTransport>) -> Self {
        Self {
            rules: default_rules(),
            transport,
        }
    }

    /// Replace the provider rule set.
    pub fn with_rules(mut self, rules: Vec<ProviderRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Upload the file at `path` to `upload_url`. Succeeds on any 2xx.
    pub async fn upload(&self, upload_url: &str, path: &Path) -> Result<(), StorageError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|_| StorageError::InvalidFilePath(path.to_path_buf()))?;

        let request = match self.rules.iter().find(|rule| rule.matches(upload_url)) {
            Some(rule) => {
                debug!(provider = ?rule.provider, "provider-specific upload");
                match rule.provider {
                    StorageProvider::AzureBlob => BlobPut {
                        url: upload_url.to_string(),
                        body: UploadBody::Multipart(bytes),
                        headers: vec![("x-ms-blob-type".to_string(), "BlockBlob".to_string())],
                    },
                }
            }
            None => BlobPut {
                url: upload_url.to_string(),
                body: UploadBody::Raw(bytes),
                headers: Vec::new(),
            },
        };

        let status = self
            .transport
            .put(request)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        if status / 100 == 2 {
            debug!(status, "file stored");
            Ok(())
        } else {
            warn!(status, "file store rejected upload");
            Err(StorageError::UploadFailed(status))
        }
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use super::*;

    /// Records puts and returns a scripted result for each.
    struct CapturingBlob {
        results: Mutex<Vec<Result<u16, ConnectFailure>>>,
        puts: Mutex<Vec<BlobPut>>,
    }

    impl CapturingBlob {
        fn new(results: Vec<Result<u16, ConnectFailure>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results),
                puts: Mutex::new(Vec::new()),
            })
        }

        fn recorded(&self) -> Vec<BlobPut> {
            self.puts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BlobTransport for CapturingBlob {
        async fn put(&self, request: BlobPut) -> Result<u16, ConnectFailure> {
            self.puts.lock().unwrap().push(request);
            self.results.lock().unwrap().remove(0)
        }
    }

    fn temp_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[tokio::test]
    async fn azure_url_gets_blob_header_and_multipart_body() {
        let blob = CapturingBlob::new(vec![Ok(201)]);
        let store = FileStore::with_transport(blob.clone());
        let file = temp_file(b"payload");

        store
            .upload("https://acct.blob.core.windows.net/c/f?sig=x", file.path())
            .await
            .unwrap();

        let puts = blob.recorded();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].body, UploadBody::Multipart(b"payload".to_vec()));
        assert_eq!(
            puts[0].headers,
            vec![("x-ms-blob-type".to_string(), "BlockBlob".to_string())]
        );
    }

    #[tokio::test]
    async fn azure_marker_also_matches_plain_azure_substring() {
        let blob = CapturingBlob::new(vec![Ok(200)]);
        let store = FileStore::with_transport(blob.clone());
        let file = temp_file(b"x");

        store
            .upload("https://upload.azure.example/f", file.path())
            .await
            .unwrap();

        assert!(matches!(blob.recorded()[0].body, UploadBody::Multipart(_)));
    }

    #[tokio::test]
    async fn unmatched_url_sends_a_raw_put() {
        let blob = CapturingBlob::new(vec![Ok(200)]);
        let store = FileStore::with_transport(blob.clone());
        let file = temp_file(b"raw bytes");

        store
            .upload("https://bucket.s3.amazonaws.com/f?sig=x", file.path())
            .await
            .unwrap();

        let puts = blob.recorded();
        assert_eq!(puts[0].body, UploadBody::Raw(b"raw bytes".to_vec()));
        assert!(puts[0].headers.is_empty());
    }

    #[tokio::test]
    async fn missing_file_fails_before_any_network_call() {
        let blob = CapturingBlob::new(Vec::new());
        let store = FileStore::with_transport(blob.clone());

        let err = store
            .upload("https://bucket.s3.amazonaws.com/f", Path::new("/no/such/file"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::InvalidFilePath(_)));
        assert!(blob.recorded().is_empty());
    }

    #[tokio::test]
    async fn any_2xx_status_is_success() {
        let blob = CapturingBlob::new(vec![Ok(204)]);
        let store = FileStore::with_transport(blob);
        let file = temp_file(b"x");

        store
            .upload("https://bucket.s3.amazonaws.com/f", file.path())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_2xx_status_is_an_upload_failure() {
        let blob = CapturingBlob::new(vec![Ok(403)]);
        let store = FileStore::with_transport(blob);
        let file = temp_file(b"x");

        let err = store
            .upload("https://bucket.s3.amazonaws.com/f", file.path())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UploadFailed(403)));
    }

    #[tokio::test]
    async fn connection_failure_maps_to_unavailable() {
        let blob = CapturingBlob::new(vec![Err(ConnectFailure("reset".to_string()))]);
        let store = FileStore::with_transport(blob);
        let file = temp_file(b"x");

        let err = store
            .upload("https://bucket.s3.amazonaws.com/f", file.path())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }
}
