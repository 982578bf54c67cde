//! Security Module
//!
//! xlsxコンテナ（ZIP）を直接開く処理の防御を実装するモジュール。
//! リンク抽出ではrelationshipファイルに書かれたパスでXMLパートを
//! 取り出すため、ZIP bombとパストラバーサルへの対策を提供します。

/// ZIP読み取りの制限
#[derive(Debug, Clone)]
pub(crate) struct ZipLimits {
    /// 入力ワークブック全体の最大サイズ（バイト）
    /// デフォルト: 2GB (2_147_483_648 bytes)
    pub max_workbook_size: u64,
    /// 取り出す単一XMLパートの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_part_size: u64,
}

impl Default for ZipLimits {
    fn default() -> Self {
        Self {
            max_workbook_size: 2_147_483_648, // 2GB
            max_part_size: 104_857_600,       // 100MB
        }
    }
}

/// アーカイブ内パートパスの検証
///
/// relationshipファイルの内容は攻撃者が制御できるため、そこから組み
/// 立てたパスでアーカイブを引く前に検証します。
///
/// # 引数
///
/// * `path` - 検証するパートパス
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_part_path(path: &str) -> Result<(), String> {
    // 空のパスは拒否
    if path.is_empty() {
        return Err("Empty part path is not allowed".to_string());
    }

    // 絶対パスを拒否（Unix形式の`/`やWindows形式のドライブレター）
    if path.starts_with('/') || path.contains(":\\") {
        return Err(format!("Absolute part path is not allowed: {}", path));
    }

    // `..`を含むパスを拒否（ディレクトリトラバーサル攻撃）
    if path.contains("..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    // `\`を含むパスを拒否（Windows形式のパスセパレータ）
    if path.contains('\\') {
        return Err(format!("Backslash in part path is not allowed: {}", path));
    }

    Ok(())
}
