//! 画像エディタの選択
//!
//! ホストに登録されたエディタをすべて SAE Image のセッションに置き換える。

/// ホストに登録する SAE Image エディタの名前
pub const SAE_IMAGE_EDITOR: &str = "WP_Image_Editor_SAEImage";

/// 登録済みのエディタ一覧を SAE Image だけに差し替える
pub fn image_editors(_registered: &[String]) -> Vec<String> {
    vec![SAE_IMAGE_EDITOR.to_string()]
}

/// SAE Image で扱える MIME タイプか
pub fn supports_mime_type(mime: &str) -> bool {
    sae_core::supports_mime_type(mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HookConfig;
    use crate::hooks::StorageHooks;
    use bytes::Bytes;
    use sae_core::image::{CropBox, ImageAttr};
    use sae_core::{ImageService, ImageServiceError, MemoryStore, SaeOptions, Size};
    use std::cell::Cell;
    use std::rc::Rc;

    /// 常に 640x480 の JPEG として応答するサービス
    #[derive(Default)]
    struct StubService {
        cleans: Rc<Cell<usize>>,
    }

    impl ImageService for StubService {
        fn set_data(&mut self, _data: &[u8]) {}

        fn image_attr(&mut self) -> Result<ImageAttr, ImageServiceError> {
            Ok(ImageAttr {
                width: 640,
                height: 480,
                mime: "image/jpeg".to_string(),
            })
        }

        fn crop(&mut self, _crop: CropBox) {}

        fn resize(&mut self, _width: u32, _height: u32) {}

        fn rotate(&mut self, _degrees: f64) {}

        fn flip_v(&mut self) {}

        fn flip_h(&mut self) {}

        fn exec(&mut self, _format: Option<sae_core::OutputFormat>) -> Result<Bytes, ImageServiceError> {
            Err(ImageServiceError::NoData)
        }

        fn clean(&mut self) {
            self.cleans.set(self.cleans.get() + 1);
        }
    }

    fn hooks() -> StorageHooks<MemoryStore> {
        let store = MemoryStore::new("myapp", vec!["prod".to_string()]).with_object(
            "prod",
            "wp-uploads/a.jpg",
            "jpeg bytes",
        );
        let options = SaeOptions::new("myapp-prod", Some("wp-uploads".to_string()));
        StorageHooks::new(store, HookConfig::new(options, "/tmp/sae"))
    }

    #[test]
    fn test_image_editors_replaces_all() {
        let registered = vec!["WP_Image_Editor_Imagick".to_string(), "WP_Image_Editor_GD".to_string()];
        assert_eq!(image_editors(&registered), vec![SAE_IMAGE_EDITOR.to_string()]);
        assert_eq!(image_editors(&[]), vec![SAE_IMAGE_EDITOR.to_string()]);
    }

    #[test]
    fn test_supports_mime_type() {
        assert!(supports_mime_type("image/jpeg"));
        assert!(supports_mime_type("image/gif"));
        assert!(!supports_mime_type("image/webp"));
        assert!(!supports_mime_type("application/pdf"));
    }

    #[test]
    fn test_open_editor_from_public_url() {
        let hooks = hooks();
        let service = StubService::default();
        let cleans = Rc::clone(&service.cleans);

        let session = hooks
            .open_editor("http://myapp-prod.stor.sinaapp.com/wp-uploads/a.jpg", service)
            .unwrap();
        assert_eq!(session.file(), "saestor://prod/wp-uploads/a.jpg");
        assert_eq!(session.size(), Some(Size::new(640, 480)));
        assert_eq!(cleans.get(), 1);

        drop(session);
        assert_eq!(cleans.get(), 2);
    }

    #[test]
    fn test_open_editor_missing_file() {
        let hooks = hooks();
        let err = hooks
            .open_editor("saestor://prod/wp-uploads/missing.jpg", StubService::default())
            .err()
            .unwrap();
        assert_eq!(err.code(), "error_loading_image");
    }
}
