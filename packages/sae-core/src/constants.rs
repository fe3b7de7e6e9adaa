/// SAE Storage 上のファイルを指すストリームラッパーのスキーム
pub const STORAGE_SCHEME: &str = "saestor";

/// SAE Storage の公開ホスト名の末尾
pub const STORAGE_HOST_SUFFIX: &str = "stor.sinaapp.com";

/// 画像をメモリに読み込む際の上限（256MB）
pub const MAX_IMAGE_BYTES: u64 = 256 * 1024 * 1024;

/// 一意なファイル名を探す際の最大試行回数
pub const MAX_UNIQUE_ATTEMPTS: u32 = 10_000;

/// ローカルエンコード時のデフォルト品質（1-100）
pub const DEFAULT_QUALITY: u8 = 90;
