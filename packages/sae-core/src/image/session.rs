//! SAE Image を使った画像編集セッション
//!
//! 画像データはメモリに保持し、変換はすべて SAE Image へのリモート呼び出しで行う。
//! 変換が成功した場合のみペイロードと寸法を更新し、失敗時は何も変更しない。

use crate::constants::{DEFAULT_QUALITY, MAX_IMAGE_BYTES};
use crate::errors::{EditorError, ImageServiceError, StorageError};
use crate::filename::{FilenameResolver, split_extension};
use crate::image::capabilities::{EditorCapabilities, WordPressCapabilities};
use crate::image::encode::encode_image;
use crate::image::format::OutputFormat;
use crate::image::service::{CropBox, ImageAttr, ImageService, RemoteScope};
use crate::storage::ObjectStore;
use crate::storage::path::{
    StoragePath, basename, convert_to_wrapper, join_key, strip_wrapper, wrapper_prefix,
};
use bytes::Bytes;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// 画像の寸法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// `multi_resize` に渡すサイズ指定
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SizeSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(default)]
    pub crop: bool,
}

/// 保存結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedImage {
    pub path: String,
    pub file: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "mime-type")]
    pub mime_type: String,
}

/// 中間サイズのメタデータ（パスを含まない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizedImage {
    pub file: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "mime-type")]
    pub mime_type: String,
}

impl From<SavedImage> for ResizedImage {
    fn from(saved: SavedImage) -> Self {
        Self {
            file: saved.file,
            width: saved.width,
            height: saved.height,
            mime_type: saved.mime_type,
        }
    }
}

/// セッションが保持する画像データ
enum Payload {
    /// エンコード済みのバイト列（通常はこちら）
    Encoded(Bytes),
    /// ローカルのエディタから引き継いだデコード済みビットマップ
    Bitmap(DynamicImage),
}

/// 1 枚の画像に対する編集セッション
pub struct ImageSession<'a, S, I, C = WordPressCapabilities>
where
    S: ObjectStore + ?Sized,
    I: ImageService,
    C: EditorCapabilities,
{
    file: String,
    domain: String,
    store: &'a S,
    service: I,
    capabilities: C,
    payload: Option<Payload>,
    size: Option<Size>,
    mime_type: Option<String>,
    quality: u8,
    max_bytes: u64,
}

impl<'a, S, I> ImageSession<'a, S, I, WordPressCapabilities>
where
    S: ObjectStore + ?Sized,
    I: ImageService,
{
    /// `file` はローカルパス・http(s) URL・スキームパスのいずれか
    pub fn new(file: &str, domain: &str, store: &'a S, service: I) -> Self {
        Self::with_capabilities(file, domain, store, service, WordPressCapabilities)
    }
}

impl<'a, S, I, C> ImageSession<'a, S, I, C>
where
    S: ObjectStore + ?Sized,
    I: ImageService,
    C: EditorCapabilities,
{
    pub fn with_capabilities(
        file: &str,
        domain: &str,
        store: &'a S,
        service: I,
        capabilities: C,
    ) -> Self {
        Self {
            file: convert_to_wrapper(file, domain),
            domain: domain.to_string(),
            store,
            service,
            capabilities,
            payload: None,
            size: None,
            mime_type: None,
            quality: DEFAULT_QUALITY,
            max_bytes: MAX_IMAGE_BYTES,
        }
    }

    /// デコード済みのビットマップを読み込み済みの状態で引き継ぐ
    pub fn with_bitmap(mut self, image: DynamicImage, mime_type: &str) -> Self {
        self.size = Some(Size::new(image.width(), image.height()));
        self.mime_type = Some(mime_type.to_string());
        self.payload = Some(Payload::Bitmap(image));
        self
    }

    /// ローカルエンコード時の品質（1-100 に丸める）
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// 読み込む画像の上限バイト数
    pub fn with_max_bytes(mut self, max: u64) -> Self {
        self.max_bytes = max;
        self
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn size(&self) -> Option<Size> {
        self.size
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.payload.is_some()
    }

    /// 画像を読み込み、寸法と MIME タイプを取得する
    ///
    /// 読み込み済みなら何もしない。
    pub fn load(&mut self) -> Result<(), EditorError> {
        if self.payload.is_some() {
            return Ok(());
        }

        let data = self.read_source()?;
        let attr = self.measure(&data)?;

        tracing::debug!(
            file = %self.file,
            width = attr.width,
            height = attr.height,
            mime = %attr.mime,
            "loaded image"
        );

        self.size = Some(Size::new(attr.width, attr.height));
        self.mime_type = Some(attr.mime);
        self.payload = Some(Payload::Encoded(data));

        Ok(())
    }

    /// 指定サイズにリサイズする
    ///
    /// 現在の寸法と同じなら何もしない（リモート呼び出しなし）。
    pub fn resize(
        &mut self,
        max_w: Option<u32>,
        max_h: Option<u32>,
        crop: bool,
    ) -> Result<(), EditorError> {
        let size = self.current_size()?;
        if Some(size.width) == max_w && Some(size.height) == max_h {
            return Ok(());
        }

        let resized = self.resize_remote(size, max_w, max_h, crop)?;
        self.commit(resized)
    }

    /// 元画像から複数のサイズを作成して保存する
    ///
    /// 失敗したサイズは結果から除かれる。セッションの画像と寸法は変更しない。
    pub fn multi_resize(
        &mut self,
        sizes: &BTreeMap<String, SizeSpec>,
    ) -> BTreeMap<String, ResizedImage> {
        let mut metadata = BTreeMap::new();

        let original = match self.current_size() {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!(file = %self.file, error = %e, "multi_resize on unloaded image");
                return metadata;
            }
        };

        for (name, spec) in sizes {
            if spec.width.is_none() && spec.height.is_none() {
                continue;
            }

            match self.resize_and_save(original, spec) {
                Ok(saved) => {
                    metadata.insert(name.clone(), saved.into());
                }
                Err(e) => {
                    tracing::warn!(
                        file = %self.file,
                        size = %name,
                        code = e.code(),
                        error = %e,
                        "skipping intermediate size"
                    );
                }
            }

            self.size = Some(original);
        }

        metadata
    }

    /// 指定範囲を切り出す
    ///
    /// `src_abs` が true の場合、`src_w` / `src_h` は終点の座標として扱う。
    /// 出力サイズが未指定なら `src_w` / `src_h` をそのまま使う（`src_abs` でも変換前の値）。
    #[allow(clippy::too_many_arguments)]
    pub fn crop(
        &mut self,
        src_x: u32,
        src_y: u32,
        src_w: u32,
        src_h: u32,
        dst_w: Option<u32>,
        dst_h: Option<u32>,
        src_abs: bool,
    ) -> Result<(), EditorError> {
        let size = self.current_size()?;

        // 出力サイズの既定値は終点座標への変換前の値
        let dst_w = dst_w.filter(|w| *w > 0).unwrap_or(src_w);
        let dst_h = dst_h.filter(|h| *h > 0).unwrap_or(src_h);
        let (src_w, src_h) = if src_abs {
            (src_w.saturating_sub(src_x), src_h.saturating_sub(src_y))
        } else {
            (src_w, src_h)
        };

        let crop_box = CropBox::from_pixels(src_x, src_y, src_w, src_h, size.width, size.height);
        if !crop_box.is_within_image() {
            tracing::warn!(
                file = %self.file,
                src_x,
                src_y,
                src_w,
                src_h,
                "crop region outside image"
            );
            return Err(EditorError::Crop {
                path: self.file.clone(),
            });
        }
        let data = self.payload_bytes()?;

        let cropped = self
            .execute(&data, None, |service| {
                service.crop(crop_box);
                service.resize(dst_w, dst_h);
            })
            .map_err(|e| {
                tracing::warn!(file = %self.file, error = %e, "SAE Image crop failed");
                EditorError::Crop {
                    path: self.file.clone(),
                }
            })?;

        self.commit(cropped)
    }

    /// 反時計回りに `angle` 度回転する
    pub fn rotate(&mut self, angle: f64) -> Result<(), EditorError> {
        let data = self.payload_bytes()?;

        // SAE Image は時計回り
        let rotated = self
            .execute(&data, None, |service| service.rotate(-angle))
            .map_err(|e| {
                tracing::warn!(file = %self.file, angle, error = %e, "SAE Image rotate failed");
                EditorError::Rotate {
                    path: self.file.clone(),
                }
            })?;

        self.commit(rotated)
    }

    /// 画像を反転する
    ///
    /// `horz` で `flip_v`、`vert` で `flip_h` を呼ぶ（SAE Image の軸の呼び方に合わせている）。
    pub fn flip(&mut self, horz: bool, vert: bool) -> Result<(), EditorError> {
        let data = self.payload_bytes()?;

        let flipped = self
            .execute(&data, None, |service| {
                if horz {
                    service.flip_v();
                }
                if vert {
                    service.flip_h();
                }
            })
            .map_err(|e| {
                tracing::warn!(file = %self.file, horz, vert, error = %e, "SAE Image flip failed");
                EditorError::Flip {
                    path: self.file.clone(),
                }
            })?;

        self.commit(flipped)
    }

    /// 現在の画像をストレージに保存する
    ///
    /// ファイル名が未指定なら `{元の名前}-{幅}x{高さ}.{拡張子}` を一意にして使う。
    pub fn save(
        &mut self,
        filename: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<SavedImage, EditorError> {
        let size = self.current_size()?;
        let data = self.payload_bytes()?;

        let saved = self.save_bytes(&data, size, filename, mime_type)?;
        self.file = saved.path.clone();
        self.mime_type = Some(saved.mime_type.clone());

        Ok(saved)
    }

    /// 現在の画像を `sink` に書き出し、Content-Type を返す
    pub fn stream<W: Write + ?Sized>(
        &mut self,
        mime_type: Option<&str>,
        sink: &mut W,
    ) -> Result<&'static str, EditorError> {
        let target =
            self.capabilities
                .output_format(None, mime_type, &self.file, self.mime_type.as_deref());
        let format = OutputFormat::from_mime(&target.mime_type).unwrap_or(OutputFormat::Jpeg);

        let output = if let Some(Payload::Bitmap(img)) = &self.payload {
            encode_image(img, format, self.quality)
                .map(Bytes::from)
                .map_err(|e| {
                    tracing::warn!(file = %self.file, error = %e, "local encode failed");
                    self.stream_error()
                })?
        } else {
            let data = self.payload_bytes()?;
            self.execute(&data, Some(format), |_| {}).map_err(|e| {
                tracing::warn!(file = %self.file, error = %e, "SAE Image stream failed");
                self.stream_error()
            })?
        };

        sink.write_all(&output).map_err(|e| {
            tracing::warn!(file = %self.file, error = %e, "failed to write image stream");
            self.stream_error()
        })?;

        Ok(format.content_type())
    }

    fn stream_error(&self) -> EditorError {
        EditorError::Stream {
            path: self.file.clone(),
        }
    }

    fn current_size(&self) -> Result<Size, EditorError> {
        self.size.ok_or_else(|| EditorError::NotLoaded {
            path: self.file.clone(),
        })
    }

    /// リモートに送るためのバイト列
    fn payload_bytes(&self) -> Result<Bytes, EditorError> {
        match &self.payload {
            None => Err(EditorError::NotLoaded {
                path: self.file.clone(),
            }),
            Some(Payload::Encoded(data)) => Ok(data.clone()),
            Some(Payload::Bitmap(img)) => {
                let format = self
                    .mime_type
                    .as_deref()
                    .and_then(OutputFormat::from_mime)
                    .unwrap_or(OutputFormat::Jpeg);
                encode_image(img, format, self.quality)
                    .map(Bytes::from)
                    .map_err(|_| EditorError::InvalidImage {
                        path: self.file.clone(),
                    })
            }
        }
    }

    /// 画像を送り、操作を積み、実行する。スコープを抜けると `clean` される
    fn execute<F>(
        &mut self,
        data: &[u8],
        format: Option<OutputFormat>,
        apply: F,
    ) -> Result<Bytes, ImageServiceError>
    where
        F: FnOnce(&mut I),
    {
        let mut scope = RemoteScope::acquire(&mut self.service, data);
        apply(&mut *scope);
        scope.exec(format)
    }

    /// リモートで画像属性を取得する
    fn measure(&mut self, data: &[u8]) -> Result<ImageAttr, EditorError> {
        let attr = {
            let mut scope = RemoteScope::acquire(&mut self.service, data);
            scope.image_attr()
        };

        match attr {
            Ok(attr) if attr.width > 0 && attr.height > 0 => Ok(attr),
            Ok(_) => Err(EditorError::InvalidImage {
                path: self.file.clone(),
            }),
            Err(e) => {
                tracing::warn!(file = %self.file, error = %e, "could not read image attributes");
                Err(EditorError::InvalidImage {
                    path: self.file.clone(),
                })
            }
        }
    }

    /// 変換結果を確定する。寸法はリモートで測り直した値を使う
    fn commit(&mut self, data: Bytes) -> Result<(), EditorError> {
        let attr = self.measure(&data)?;
        self.size = Some(Size::new(attr.width, attr.height));
        self.payload = Some(Payload::Encoded(data));
        Ok(())
    }

    fn resize_remote(
        &mut self,
        size: Size,
        max_w: Option<u32>,
        max_h: Option<u32>,
        crop: bool,
    ) -> Result<Bytes, EditorError> {
        let dims = self
            .capabilities
            .resize_dimensions(size.width, size.height, max_w, max_h, crop)
            .ok_or_else(|| EditorError::Dimensions {
                path: self.file.clone(),
            })?;

        let crop_box = CropBox::from_pixels(
            dims.src_x,
            dims.src_y,
            dims.src_w,
            dims.src_h,
            size.width,
            size.height,
        );
        let data = self.payload_bytes()?;

        self.execute(&data, None, |service| {
            service.crop(crop_box);
            service.resize(dims.dst_w, dims.dst_h);
        })
        .map_err(|e| {
            tracing::warn!(file = %self.file, error = %e, "SAE Image resize failed");
            EditorError::Resize {
                path: self.file.clone(),
            }
        })
    }

    fn resize_and_save(&mut self, original: Size, spec: &SizeSpec) -> Result<SavedImage, EditorError> {
        let resized = self.resize_remote(original, spec.width, spec.height, spec.crop)?;
        let attr = self.measure(&resized)?;
        self.save_bytes(&resized, Size::new(attr.width, attr.height), None, None)
    }

    fn save_bytes(
        &self,
        data: &[u8],
        size: Size,
        filename: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<SavedImage, EditorError> {
        let target =
            self.capabilities
                .output_format(filename, mime_type, &self.file, self.mime_type.as_deref());

        let key = match target.filename.as_deref() {
            Some(name) => {
                if let Some(other) = StoragePath::parse(name).filter(|p| p.domain != self.domain) {
                    tracing::error!(
                        domain = %self.domain,
                        target_domain = %other.domain,
                        file = %name,
                        "refusing to save into another domain"
                    );
                    return Err(EditorError::Save {
                        path: name.to_string(),
                    });
                }
                // スキームパスで渡された場合は二重に接頭辞を付けない
                strip_wrapper(name, &self.domain).trim_start_matches('/').to_string()
            }
            None => self.generate_key(size, &target.extension)?,
        };
        let path = format!("{}{}", wrapper_prefix(&self.domain), key);

        self.store.write(&self.domain, &key, data).map_err(|e| {
            tracing::error!(domain = %self.domain, key = %key, error = %e, "failed to save image");
            EditorError::Save { path: path.clone() }
        })?;

        tracing::info!(
            domain = %self.domain,
            key = %key,
            width = size.width,
            height = size.height,
            "saved image"
        );

        Ok(SavedImage {
            file: basename(&key).to_string(),
            path,
            width: size.width,
            height: size.height,
            mime_type: target.mime_type,
        })
    }

    /// 元ファイルと同じディレクトリに、寸法を付けた一意な名前を作る
    fn generate_key(&self, size: Size, extension: &str) -> Result<String, EditorError> {
        let directory = match StoragePath::parse(&self.file) {
            Some(path) if path.domain == self.domain => path.directory,
            _ => String::new(),
        };
        let (stem, _) = split_extension(basename(&self.file));
        let candidate = format!("{stem}-{}x{}.{extension}", size.width, size.height);

        let unique = FilenameResolver::new(self.store)
            .resolve(&self.domain, &directory, &candidate, None)
            .map_err(|e| {
                tracing::error!(file = %self.file, error = %e, "could not generate filename");
                EditorError::Save {
                    path: self.file.clone(),
                }
            })?;

        Ok(join_key(&directory, &unique))
    }

    /// 元ファイルを読み込む（ローカル・URL・SAE Storage）
    fn read_source(&self) -> Result<Bytes, EditorError> {
        if let Some(path) = StoragePath::parse(&self.file) {
            let data = self
                .store
                .read(&path.domain, &path.key())
                .map_err(|e| self.source_error(e))?;
            self.check_limit(data.len() as u64)?;
            return Ok(data);
        }

        if self.file.starts_with("http://") || self.file.starts_with("https://") {
            return self.fetch_url();
        }

        let local = Path::new(&self.file);
        if !local.is_file() {
            return Err(EditorError::Loading {
                path: self.file.clone(),
            });
        }

        let size = std::fs::metadata(local).map(|m| m.len()).unwrap_or(0);
        self.check_limit(size)?;

        let data = std::fs::read(local).map(Bytes::from).map_err(|e| {
            tracing::warn!(file = %self.file, error = %e, "failed to read local image");
            EditorError::Loading {
                path: self.file.clone(),
            }
        })?;
        self.check_limit(data.len() as u64)?;

        Ok(data)
    }

    fn fetch_url(&self) -> Result<Bytes, EditorError> {
        let loading = || EditorError::Loading {
            path: self.file.clone(),
        };

        let response = reqwest::blocking::get(&self.file).map_err(|e| {
            tracing::warn!(file = %self.file, error = %e, "failed to fetch image");
            loading()
        })?;
        if !response.status().is_success() {
            tracing::warn!(file = %self.file, status = %response.status(), "failed to fetch image");
            return Err(loading());
        }
        if let Some(size) = response.content_length() {
            self.check_limit(size)?;
        }

        let data = response.bytes().map_err(|_| loading())?;
        self.check_limit(data.len() as u64)?;

        Ok(data)
    }

    fn check_limit(&self, size: u64) -> Result<(), EditorError> {
        if size > self.max_bytes {
            return Err(EditorError::TooLarge {
                path: self.file.clone(),
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }

    fn source_error(&self, err: StorageError) -> EditorError {
        match err {
            StorageError::TooLarge { size, max } => EditorError::TooLarge {
                path: self.file.clone(),
                size,
                max,
            },
            other => {
                tracing::warn!(file = %self.file, error = %other, "failed to read image from storage");
                EditorError::Loading {
                    path: self.file.clone(),
                }
            }
        }
    }
}

impl<S, I, C> Drop for ImageSession<'_, S, I, C>
where
    S: ObjectStore + ?Sized,
    I: ImageService,
    C: EditorCapabilities,
{
    fn drop(&mut self) {
        if self.payload.is_some() {
            self.service.clean();
        }
    }
}
