use std::time::Duration;

use reqwest::Client;
use tracing::{error, info};

use crate::error::Result;

/// 下载完成的附件
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Downloads attachment URLs referenced by mapped records. A failed
/// download skips the upload; it never fails the message.
pub struct AttachmentService {
    client: Client,
    bearer_token: Option<String>,
}

impl AttachmentService {
    pub fn new(bearer_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            bearer_token,
        })
    }

    pub async fn fetch(&self, url: &str) -> Option<Attachment> {
        let file_name = url.rsplit('/').next().unwrap_or(url).to_string();
        let mime_type = guess_mime_type(&file_name).to_string();

        let mut request = self.client.get(url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await.and_then(|r| r.error_for_status()) {
            Ok(response) => response,
            Err(err) => {
                error!("attachment '{url}' cannot be downloaded, skipping upload: {err}");
                return None;
            }
        };

        let content = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(err) => {
                error!("attachment '{url}' cannot be read, skipping upload: {err}");
                return None;
            }
        };

        info!("successfully downloaded attachment '{url}'");
        Some(Attachment {
            file_name,
            mime_type,
            content,
        })
    }
}

/// 按扩展名猜 MIME 类型
fn guess_mime_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("photo.JPG"), "image/jpeg");
        assert_eq!(guess_mime_type("doc.pdf"), "application/pdf");
        assert_eq!(guess_mime_type("no_extension"), "application/octet-stream");
    }
}
