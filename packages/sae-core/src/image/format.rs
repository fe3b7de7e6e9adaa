/// 出力フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
}

impl OutputFormat {
    /// 文字列（拡張子・フォーマット名）から OutputFormat を作成
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "jpeg" | "jpg" | "jpe" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// MIME タイプから OutputFormat を作成
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Content-Type を取得
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }

    /// 保存時の拡張子。SAE Image の exec に渡すフォーマット名も兼ねる
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }
}

/// SAE Image が扱える MIME タイプかどうか
pub fn supports_mime_type(mime: &str) -> bool {
    OutputFormat::from_mime(mime).is_some()
}
