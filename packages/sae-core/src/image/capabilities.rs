//! 編集セッションが外部に委ねる寸法計算と出力フォーマット決定

use crate::filename::split_extension;
use crate::image::dimensions::{ResizeDimensions, resize_dimensions};
use crate::image::format::OutputFormat;
use crate::storage::path::{basename, dirname, join_key};

/// 保存・ストリーム時の出力先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub filename: Option<String>,
    pub extension: String,
    pub mime_type: String,
}

/// 寸法計算と出力フォーマット決定
pub trait EditorCapabilities {
    fn resize_dimensions(
        &self,
        orig_w: u32,
        orig_h: u32,
        max_w: Option<u32>,
        max_h: Option<u32>,
        crop: bool,
    ) -> Option<ResizeDimensions>;

    fn output_format(
        &self,
        filename: Option<&str>,
        mime_type: Option<&str>,
        current_file: &str,
        current_mime: Option<&str>,
    ) -> OutputTarget;
}

/// ホスト（WordPress）の画像エディタと同じ規則
#[derive(Debug, Clone, Copy, Default)]
pub struct WordPressCapabilities;

impl EditorCapabilities for WordPressCapabilities {
    fn resize_dimensions(
        &self,
        orig_w: u32,
        orig_h: u32,
        max_w: Option<u32>,
        max_h: Option<u32>,
        crop: bool,
    ) -> Option<ResizeDimensions> {
        resize_dimensions(orig_w, orig_h, max_w, max_h, crop)
    }

    /// 要求された MIME タイプとファイル名の拡張子から出力を決める
    ///
    /// MIME タイプが指定されていないか、ファイルの形式と同じならファイルの形式を使う。
    /// ファイル名の拡張子が出力形式と異なる場合は拡張子を差し替える。
    fn output_format(
        &self,
        filename: Option<&str>,
        mime_type: Option<&str>,
        current_file: &str,
        current_mime: Option<&str>,
    ) -> OutputTarget {
        let source = filename.unwrap_or(current_file);
        let file_ext = extension_of(source);
        let file_format = match filename {
            Some(_) => OutputFormat::from_str(file_ext),
            None => current_mime
                .and_then(OutputFormat::from_mime)
                .or_else(|| OutputFormat::from_str(file_ext)),
        };

        let requested = mime_type.and_then(OutputFormat::from_mime);
        let format = match (requested, file_format) {
            (Some(requested), Some(file)) if requested == file => file,
            (Some(requested), _) => requested,
            (None, Some(file)) => file,
            (None, None) => OutputFormat::Jpeg,
        };

        let extension = if Some(format) == OutputFormat::from_str(file_ext) {
            file_ext.to_string()
        } else {
            format.extension().to_string()
        };

        let filename = filename.map(|name| {
            if extension == file_ext {
                name.to_string()
            } else {
                let (stem, _) = split_extension(basename(name));
                join_key(dirname(name), &format!("{stem}.{extension}"))
            }
        });

        OutputTarget {
            filename,
            extension,
            mime_type: format.content_type().to_string(),
        }
    }
}

fn extension_of(path: &str) -> &str {
    split_extension(basename(path)).1.trim_start_matches('.')
}
