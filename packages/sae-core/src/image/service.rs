//! SAE Image サービスとのインターフェース
//!
//! SAE Image はステートフルなリモートサービスで、`set_data` で画像を送り、
//! 操作を積み上げて `exec` で実行し、`clean` でセッションを解放する。

use crate::errors::ImageServiceError;
use crate::image::format::OutputFormat;
use bytes::Bytes;
use serde::Deserialize;
use std::ops::{Deref, DerefMut};

/// リモートから取得した画像属性
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageAttr {
    pub width: u32,
    pub height: u32,
    pub mime: String,
}

/// 元画像の幅・高さに対する割合（0..1）で表した切り出し範囲
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl CropBox {
    /// ピクセル単位の矩形を割合に変換する
    pub fn from_pixels(
        src_x: u32,
        src_y: u32,
        src_w: u32,
        src_h: u32,
        orig_w: u32,
        orig_h: u32,
    ) -> Self {
        let orig_w = orig_w as f64;
        let orig_h = orig_h as f64;
        Self {
            left: src_x as f64 / orig_w,
            right: (src_x as f64 + src_w as f64) / orig_w,
            top: src_y as f64 / orig_h,
            bottom: (src_y as f64 + src_h as f64) / orig_h,
        }
    }

    /// 範囲が元画像に収まっているか
    pub fn is_within_image(&self) -> bool {
        self.left >= 0.0
            && self.top >= 0.0
            && self.left < self.right
            && self.top < self.bottom
            && self.right <= 1.0
            && self.bottom <= 1.0
    }
}

/// SAE Image クライアント
pub trait ImageService {
    /// 処理対象の画像を送る
    fn set_data(&mut self, data: &[u8]);

    /// 送った画像の幅・高さ・MIME タイプ
    fn image_attr(&mut self) -> Result<ImageAttr, ImageServiceError>;

    fn crop(&mut self, crop: CropBox);

    fn resize(&mut self, width: u32, height: u32);

    /// 時計回りに回転する
    fn rotate(&mut self, degrees: f64);

    fn flip_v(&mut self);

    fn flip_h(&mut self);

    /// 積み上げた操作を実行し、結果の画像を返す
    fn exec(&mut self, format: Option<OutputFormat>) -> Result<Bytes, ImageServiceError>;

    /// リモートセッションを解放する
    fn clean(&mut self);
}

/// 画像を送ってからスコープを抜けるまでの間リモートセッションを保持する
///
/// 成功・失敗にかかわらず、破棄時に必ず `clean` を呼ぶ。
pub struct RemoteScope<'s, I: ImageService + ?Sized> {
    service: &'s mut I,
}

impl<'s, I: ImageService + ?Sized> RemoteScope<'s, I> {
    pub fn acquire(service: &'s mut I, data: &[u8]) -> Self {
        service.set_data(data);
        Self { service }
    }
}

impl<I: ImageService + ?Sized> Deref for RemoteScope<'_, I> {
    type Target = I;

    fn deref(&self) -> &I {
        self.service
    }
}

impl<I: ImageService + ?Sized> DerefMut for RemoteScope<'_, I> {
    fn deref_mut(&mut self) -> &mut I {
        self.service
    }
}

impl<I: ImageService + ?Sized> Drop for RemoteScope<'_, I> {
    fn drop(&mut self) {
        self.service.clean();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeImageService, fake_image};

    #[test]
    fn test_crop_box_from_pixels() {
        let crop = CropBox::from_pixels(10, 10, 100, 100, 200, 200);
        assert_eq!(crop.left, 0.05);
        assert_eq!(crop.right, 0.55);
        assert_eq!(crop.top, 0.05);
        assert_eq!(crop.bottom, 0.55);
        assert!(crop.is_within_image());
    }

    #[test]
    fn test_crop_box_large_coordinates() {
        let crop = CropBox::from_pixels(u32::MAX - 5, 0, 100, 100, 200, 200);
        assert!(crop.right > 1.0);
        assert!(!crop.is_within_image());

        assert!(CropBox::from_pixels(0, 0, 200, 200, 200, 200).is_within_image());
        assert!(!CropBox::from_pixels(0, 0, 0, 100, 200, 200).is_within_image());
    }

    #[test]
    fn test_remote_scope_cleans_on_drop() {
        let mut service = FakeImageService::default();
        let handle = service.clone();

        {
            let mut scope = RemoteScope::acquire(&mut service, &fake_image(10, 20, "image/png"));
            let attr = scope.image_attr().unwrap();
            assert_eq!((attr.width, attr.height), (10, 20));
        }

        assert_eq!(
            handle.calls(),
            vec![Call::SetData, Call::Attr, Call::Clean]
        );
    }
}
