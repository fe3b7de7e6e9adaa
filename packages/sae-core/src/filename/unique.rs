//! ストレージ上で衝突しないファイル名を決定する
//!
//! 同名のオブジェクトが存在する場合、拡張子の直前に番号を付け、
//! 衝突しなくなるまで番号を増やしていく。

use crate::constants::MAX_UNIQUE_ATTEMPTS;
use crate::errors::SaeError;
use crate::filename::sanitize::{sanitize_file_name, split_extension};
use crate::storage::ObjectStore;
use crate::storage::path::{basename, join_key};

/// 衝突回避を呼び出し側で行うためのコールバック
///
/// 引数は（ディレクトリ, 名前, 拡張子）。戻り値はそのまま結果として使われる。
pub type UniqueFilenameCallback<'c> = &'c dyn Fn(&str, &str, &str) -> String;

/// 一意なファイル名を決定する
pub struct FilenameResolver<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    max_attempts: u32,
}

impl<'a, S: ObjectStore + ?Sized> FilenameResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            max_attempts: MAX_UNIQUE_ATTEMPTS,
        }
    }

    /// 試行回数の上限を変更する
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// `directory` 内で衝突しないファイル名を返す
    ///
    /// 拡張子に大文字が含まれる場合は小文字化した名前も同時に確認し、
    /// 小文字の拡張子を持つ名前を返す（サムネイルの上書きを防ぐため）。
    pub fn resolve(
        &self,
        domain: &str,
        directory: &str,
        filename: &str,
        callback: Option<UniqueFilenameCallback<'_>>,
    ) -> Result<String, SaeError> {
        let filename = sanitize_file_name(basename(filename));
        let (name, ext) = split_extension(&filename);

        if let Some(callback) = callback {
            return Ok(callback(directory, name, ext));
        }

        let lower_ext = ext.to_lowercase();
        let resolved = if lower_ext != ext {
            self.resolve_mixed_case(domain, directory, name, ext, &lower_ext)?
        } else {
            self.resolve_single(domain, directory, name, ext)?
        };

        if resolved != filename {
            tracing::debug!(
                domain = %domain,
                directory = %directory,
                requested = %filename,
                resolved = %resolved,
                "renamed upload to avoid collision"
            );
        }

        Ok(resolved)
    }

    fn resolve_single(
        &self,
        domain: &str,
        directory: &str,
        name: &str,
        ext: &str,
    ) -> Result<String, SaeError> {
        for number in 0..self.max_attempts {
            let candidate = numbered(name, number, ext);
            if !self.store.exists(domain, &join_key(directory, &candidate))? {
                return Ok(candidate);
            }
        }

        Err(self.exhausted(name, ext))
    }

    fn resolve_mixed_case(
        &self,
        domain: &str,
        directory: &str,
        name: &str,
        ext: &str,
        lower_ext: &str,
    ) -> Result<String, SaeError> {
        for number in 0..self.max_attempts {
            let original = numbered(name, number, ext);
            let lowered = numbered(name, number, lower_ext);

            let taken = self.store.exists(domain, &join_key(directory, &original))?
                || self.store.exists(domain, &join_key(directory, &lowered))?;
            if !taken {
                return Ok(lowered);
            }
        }

        Err(self.exhausted(name, ext))
    }

    fn exhausted(&self, name: &str, ext: &str) -> SaeError {
        tracing::error!(
            filename = %format!("{name}{ext}"),
            attempts = self.max_attempts,
            "gave up looking for a unique filename"
        );
        SaeError::UniqueFilenameExhausted {
            filename: format!("{name}{ext}"),
            attempts: self.max_attempts,
        }
    }
}

/// 拡張子の直前に番号を付ける（0 は番号なし）
fn numbered(name: &str, number: u32, ext: &str) -> String {
    if number == 0 {
        format!("{name}{ext}")
    } else {
        format!("{name}{number}{ext}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store_with(keys: &[&str]) -> MemoryStore {
        keys.iter().fold(MemoryStore::new("myapp", vec![]), |store, key| {
            store.with_object("prod", key, "x")
        })
    }

    #[test]
    fn test_no_collision_returns_sanitized_name() {
        let store = store_with(&[]);
        let resolver = FilenameResolver::new(&store);

        let name = resolver.resolve("prod", "uploads", "my photo.jpg", None).unwrap();
        assert_eq!(name, "my-photo.jpg");
        assert_eq!(store.probes(), 1);
    }

    #[test]
    fn test_numbered_variants() {
        let store = store_with(&["uploads/a.jpg", "uploads/a1.jpg", "uploads/a2.jpg"]);
        let resolver = FilenameResolver::new(&store);

        let name = resolver.resolve("prod", "uploads", "a.jpg", None).unwrap();
        assert_eq!(name, "a3.jpg");

        // 同じ状態なら同じ結果
        let again = resolver.resolve("prod", "uploads", "a.jpg", None).unwrap();
        assert_eq!(again, name);
    }

    #[test]
    fn test_other_directory_does_not_collide() {
        let store = store_with(&["other/a.jpg"]);
        let resolver = FilenameResolver::new(&store);

        assert_eq!(resolver.resolve("prod", "uploads", "a.jpg", None).unwrap(), "a.jpg");
    }

    #[test]
    fn test_uppercase_extension_checks_both_cases() {
        // 拡張子だけ小文字にした版が存在していても衝突とみなす
        // 名前部分の大文字小文字はそのまま（photo.jpg とは比較しない）
        let store = store_with(&["uploads/Photo.jpg"]);
        let resolver = FilenameResolver::new(&store);

        let name = resolver.resolve("prod", "uploads", "Photo.JPG", None).unwrap();
        assert_eq!(name, "Photo1.jpg");
        // 1 回目は 2 つ目の確認で衝突、2 回目は両方確認
        assert_eq!(store.probes(), 4);
    }

    #[test]
    fn test_stem_case_is_not_folded() {
        let store = store_with(&["uploads/photo.jpg"]);
        let resolver = FilenameResolver::new(&store);

        assert_eq!(resolver.resolve("prod", "uploads", "Photo.JPG", None).unwrap(), "Photo.jpg");
        assert_eq!(store.probes(), 2);
    }

    #[test]
    fn test_uppercase_extension_without_collision_is_lowercased() {
        let store = store_with(&[]);
        let resolver = FilenameResolver::new(&store);

        assert_eq!(resolver.resolve("prod", "uploads", "IMG.PNG", None).unwrap(), "IMG.png");
    }

    #[test]
    fn test_uppercase_extension_original_case_collides() {
        let store = store_with(&["uploads/IMG.PNG", "uploads/IMG1.png"]);
        let resolver = FilenameResolver::new(&store);

        assert_eq!(resolver.resolve("prod", "uploads", "IMG.PNG", None).unwrap(), "IMG2.png");
    }

    #[test]
    fn test_dotfile_has_empty_name() {
        let store = store_with(&["uploads/.ext"]);
        let resolver = FilenameResolver::new(&store);

        assert_eq!(resolver.resolve("prod", "uploads", ".ext", None).unwrap(), "1.ext");
    }

    #[test]
    fn test_no_extension() {
        let store = store_with(&["uploads/README", "uploads/README1"]);
        let resolver = FilenameResolver::new(&store);

        assert_eq!(resolver.resolve("prod", "uploads", "README", None).unwrap(), "README2");
    }

    #[test]
    fn test_empty_name_and_extension() {
        let store = store_with(&["uploads/"]);
        let resolver = FilenameResolver::new(&store);

        // 名前も拡張子も空なら番号だけが残る
        assert_eq!(resolver.resolve("prod", "uploads", "", None).unwrap(), "1");
    }

    #[test]
    fn test_path_components_are_stripped() {
        let store = store_with(&[]);
        let resolver = FilenameResolver::new(&store);

        assert_eq!(
            resolver.resolve("prod", "uploads", "/tmp/upload/a.jpg", None).unwrap(),
            "a.jpg"
        );
    }

    #[test]
    fn test_callback_is_used_verbatim() {
        let store = store_with(&["uploads/a.jpg"]);
        let resolver = FilenameResolver::new(&store);
        let callback = |dir: &str, name: &str, ext: &str| format!("{dir}|{name}|{ext}");

        let name = resolver.resolve("prod", "uploads", "a.JPG", Some(&callback)).unwrap();
        assert_eq!(name, "uploads|a|.JPG");
        assert_eq!(store.probes(), 0);
    }

    #[test]
    fn test_attempts_are_bounded() {
        let store = store_with(&["uploads/a.jpg", "uploads/a1.jpg", "uploads/a2.jpg"]);
        let resolver = FilenameResolver::new(&store).with_max_attempts(3);

        let err = resolver.resolve("prod", "uploads", "a.jpg", None).unwrap_err();
        assert!(matches!(
            err,
            SaeError::UniqueFilenameExhausted { attempts: 3, .. }
        ));
    }
}
