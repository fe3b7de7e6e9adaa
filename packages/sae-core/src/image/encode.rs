use crate::image::format::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, ImageFormat};
use std::io::Cursor;

/// デコード済みの画像をエンコードする
///
/// ローカルのビットマップを受け取ったセッションでのみ使う。
/// 通常のペイロードは SAE Image 側でエンコードされる。
pub fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, ImageError> {
    let mut buf = Cursor::new(Vec::new());

    match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            img.to_rgb8().write_with_encoder(encoder)?;
        }
        OutputFormat::Png => img.write_to(&mut buf, ImageFormat::Png)?,
        // GIF は RGBA8 のみ対応
        OutputFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buf, ImageFormat::Gif)?
        }
    }

    Ok(buf.into_inner())
}
