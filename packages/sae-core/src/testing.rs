//! テスト用の SAE Image の代替
//!
//! ペイロードは `FAKE {width}x{height} {mime}` 形式のテキストで表す。

use crate::errors::ImageServiceError;
use crate::image::format::OutputFormat;
use crate::image::service::{CropBox, ImageAttr, ImageService};
use bytes::Bytes;
use std::cell::RefCell;
use std::rc::Rc;

/// テスト用の画像ペイロードを作る
pub(crate) fn fake_image(width: u32, height: u32, mime: &str) -> Bytes {
    Bytes::from(format!("FAKE {width}x{height} {mime}"))
}

fn parse_fake(data: &[u8]) -> Option<ImageAttr> {
    let text = std::str::from_utf8(data).ok()?;
    let mut parts = text.strip_prefix("FAKE ")?.split(' ');
    let (w, h) = parts.next()?.split_once('x')?;
    Some(ImageAttr {
        width: w.parse().ok()?,
        height: h.parse().ok()?,
        mime: parts.next()?.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    SetData,
    Attr,
    Crop(CropBox),
    Resize(u32, u32),
    Rotate(f64),
    FlipV,
    FlipH,
    Exec(Option<OutputFormat>),
    Clean,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    current: Option<ImageAttr>,
    fail_exec: bool,
}

/// 呼び出しを記録する ImageService
///
/// clone したハンドルは同じ状態を共有する。
#[derive(Clone, Default)]
pub(crate) struct FakeImageService {
    state: Rc<RefCell<FakeState>>,
}

impl FakeImageService {
    pub(crate) fn failing_exec() -> Self {
        let service = Self::default();
        service.set_fail_exec(true);
        service
    }

    pub(crate) fn set_fail_exec(&self, fail: bool) {
        self.state.borrow_mut().fail_exec = fail;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl ImageService for FakeImageService {
    fn set_data(&mut self, data: &[u8]) {
        self.record(Call::SetData);
        self.state.borrow_mut().current = parse_fake(data);
    }

    fn image_attr(&mut self) -> Result<ImageAttr, ImageServiceError> {
        self.record(Call::Attr);
        self.state
            .borrow()
            .current
            .clone()
            .ok_or_else(|| ImageServiceError::Rejected("unreadable image".to_string()))
    }

    fn crop(&mut self, crop: CropBox) {
        self.record(Call::Crop(crop));
        if let Some(current) = self.state.borrow_mut().current.as_mut() {
            current.width = (current.width as f64 * (crop.right - crop.left)).round() as u32;
            current.height = (current.height as f64 * (crop.bottom - crop.top)).round() as u32;
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.record(Call::Resize(width, height));
        if let Some(current) = self.state.borrow_mut().current.as_mut() {
            current.width = width;
            current.height = height;
        }
    }

    fn rotate(&mut self, degrees: f64) {
        self.record(Call::Rotate(degrees));
        if let Some(current) = self.state.borrow_mut().current.as_mut()
            && (degrees.rem_euclid(180.0) - 90.0).abs() < f64::EPSILON
        {
            std::mem::swap(&mut current.width, &mut current.height);
        }
    }

    fn flip_v(&mut self) {
        self.record(Call::FlipV);
    }

    fn flip_h(&mut self) {
        self.record(Call::FlipH);
    }

    fn exec(&mut self, format: Option<OutputFormat>) -> Result<Bytes, ImageServiceError> {
        self.record(Call::Exec(format));
        let state = self.state.borrow();
        if state.fail_exec {
            return Err(ImageServiceError::Rejected("exec failed".to_string()));
        }
        let current = state.current.as_ref().ok_or(ImageServiceError::NoData)?;
        let mime = format.map_or(current.mime.as_str(), |f| f.content_type());
        Ok(fake_image(current.width, current.height, mime))
    }

    fn clean(&mut self) {
        self.record(Call::Clean);
        self.state.borrow_mut().current = None;
    }
}
