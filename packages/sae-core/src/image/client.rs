use crate::errors::{ConfigError, ImageServiceError};
use crate::image::format::OutputFormat;
use crate::image::service::{CropBox, ImageAttr, ImageService};
use bytes::Bytes;
use reqwest::blocking::{Client, Response};

const ACCESS_KEY_HEADER: &str = "X-Sae-AccessKey";

/// 積み上げられた操作
#[derive(Debug, Clone, PartialEq)]
enum Operation {
    Crop(CropBox),
    Resize(u32, u32),
    Rotate(f64),
    FlipV,
    FlipH,
}

impl Operation {
    fn to_param(&self) -> String {
        match self {
            Self::Crop(c) => format!("crop,{},{},{},{}", c.left, c.right, c.top, c.bottom),
            Self::Resize(w, h) => format!("resize,{w},{h}"),
            Self::Rotate(degrees) => format!("rotate,{degrees}"),
            Self::FlipV => "flipV".to_string(),
            Self::FlipH => "flipH".to_string(),
        }
    }
}

/// SAE Image の HTTP クライアント
///
/// 操作はローカルに積み上げ、`exec` で画像と一緒に 1 回のリクエストとして送る。
pub struct HttpImageClient {
    client: Client,
    base_url: String,
    access_key: String,
    data: Option<Bytes>,
    operations: Vec<Operation>,
}

impl HttpImageClient {
    pub fn new(base_url: String, access_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key,
            data: None,
            operations: Vec::new(),
        }
    }

    /// 環境変数から HttpImageClient を作成する
    ///
    /// 必須の環境変数:
    /// - SAE_IMAGE_URL
    /// - SAE_ACCESS_KEY
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            std::env::var("SAE_IMAGE_URL").map_err(|_| ConfigError::Missing("SAE_IMAGE_URL"))?;
        let access_key =
            std::env::var("SAE_ACCESS_KEY").map_err(|_| ConfigError::Missing("SAE_ACCESS_KEY"))?;

        Ok(Self::new(base_url, access_key))
    }

    fn ops_param(&self) -> String {
        self.operations
            .iter()
            .map(Operation::to_param)
            .collect::<Vec<_>>()
            .join(";")
    }

    fn post(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Response, ImageServiceError> {
        let data = self.data.clone().ok_or(ImageServiceError::NoData)?;

        let response = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .header(ACCESS_KEY_HEADER, &self.access_key)
            .query(query)
            .body(data)
            .send()
            .map_err(|e| ImageServiceError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(endpoint = %endpoint, status = %status, body = %body, "SAE Image rejected request");
            return Err(ImageServiceError::Rejected(format!("{status}: {body}")));
        }

        Ok(response)
    }
}

impl ImageService for HttpImageClient {
    fn set_data(&mut self, data: &[u8]) {
        self.data = Some(Bytes::copy_from_slice(data));
        self.operations.clear();
    }

    fn image_attr(&mut self) -> Result<ImageAttr, ImageServiceError> {
        self.post("attr", &[])?
            .json::<ImageAttr>()
            .map_err(|e| ImageServiceError::Request(e.to_string()))
    }

    fn crop(&mut self, crop: CropBox) {
        self.operations.push(Operation::Crop(crop));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.operations.push(Operation::Resize(width, height));
    }

    fn rotate(&mut self, degrees: f64) {
        self.operations.push(Operation::Rotate(degrees));
    }

    fn flip_v(&mut self) {
        self.operations.push(Operation::FlipV);
    }

    fn flip_h(&mut self) {
        self.operations.push(Operation::FlipH);
    }

    fn exec(&mut self, format: Option<OutputFormat>) -> Result<Bytes, ImageServiceError> {
        let mut query = vec![("ops", self.ops_param())];
        if let Some(format) = format {
            query.push(("format", format.extension().to_string()));
        }

        tracing::debug!(ops = %query[0].1, "executing SAE Image operations");
        self.post("exec", &query)?
            .bytes()
            .map_err(|e| ImageServiceError::Request(e.to_string()))
    }

    fn clean(&mut self) {
        self.data = None;
        self.operations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpImageClient {
        HttpImageClient::new("https://image.example.com/".to_string(), "key".to_string())
    }

    #[test]
    fn test_new_client() {
        assert_eq!(client().base_url, "https://image.example.com");
    }

    #[test]
    fn test_operations_are_queued_in_order() {
        let mut client = client();
        client.set_data(b"image");
        client.crop(CropBox {
            left: 0.05,
            right: 0.55,
            top: 0.0,
            bottom: 1.0,
        });
        client.resize(50, 100);
        client.rotate(-90.0);
        client.flip_v();

        assert_eq!(
            client.ops_param(),
            "crop,0.05,0.55,0,1;resize,50,100;rotate,-90;flipV"
        );
    }

    #[test]
    fn test_clean_drops_data_and_operations() {
        let mut client = client();
        client.set_data(b"image");
        client.flip_h();
        client.clean();

        assert!(client.operations.is_empty());
        // データがなければリクエストを送らずに失敗する
        assert!(matches!(client.exec(None), Err(ImageServiceError::NoData)));
    }
}
