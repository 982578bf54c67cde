//! Hyperlink Extraction Module
//!
//! calamineはセルの値しか返さないため、ハイパーリンクはxlsxコンテナ
//! （ZIPアーカイブ）内のXMLを直接解析して取得するモジュール。
//! 対象シートのパートパスは `xl/workbook.xml` とworkbookのrelationship
//! から解決し、シートXMLの `<hyperlinks>` 要素を同じシートの
//! relationshipと突き合わせてセル座標ごとのURLを得ます。

use std::collections::HashMap;
use std::io::{Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::FeedError;
use crate::security::{validate_part_path, ZipLimits};
use crate::sheet::columns::parse_cell_ref;

/// シート1枚分のハイパーリンク索引
///
/// セル座標（0始まりの行・列）からURLを引けます。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::fs::File;
/// use ecddfeed::sheet::HyperlinkIndex;
///
/// # fn main() -> Result<(), ecddfeed::FeedError> {
/// let file = File::open("substances.xlsx")?;
/// let index = HyperlinkIndex::new(file, "Full Sheet")?;
///
/// if let Some(url) = index.get(4, 12) {
///     println!("M5 -> {}", url);
/// }
/// # Ok(())
/// # }
/// ```
pub struct HyperlinkIndex {
    /// (行, 列) -> URL のマッピング
    links: HashMap<(u32, u32), String>,
}

impl HyperlinkIndex {
    /// xlsxリーダーから指定シートのハイパーリンク索引を構築する
    ///
    /// # 引数
    ///
    /// * `reader` - xlsxファイルを読み込むためのリーダー（Read + Seekトレイトを実装）
    /// * `sheet_name` - 対象シート名
    ///
    /// # 戻り値
    ///
    /// * `Ok(HyperlinkIndex)` - 構築に成功した場合（リンクがなければ空の索引）
    /// * `Err(FeedError)` - シートが見つからない、またはアーカイブが壊れている場合
    pub fn new<R: Read + Seek>(reader: R, sheet_name: &str) -> Result<Self, FeedError> {
        let limits = ZipLimits::default();
        let mut archive =
            ZipArchive::new(reader).map_err(|e| FeedError::Zip(format!("{}", e)))?;

        // 1. workbook.xmlからシート名とrelationship IDの対応を取得
        let workbook_xml = read_part(&mut archive, "xl/workbook.xml", &limits)?;
        let sheet_rids = parse_workbook_sheets(&workbook_xml)?;
        let rid = sheet_rids.get(sheet_name).ok_or_else(|| {
            FeedError::Config(format!("Sheet '{}' not found in workbook", sheet_name))
        })?;

        // 2. workbookのrelationshipでシートXMLのパートパスを解決
        let workbook_rels = read_part(&mut archive, "xl/_rels/workbook.xml.rels", &limits)?;
        let targets = parse_relationships(&workbook_rels)?;
        let target = targets.get(rid).ok_or_else(|| {
            FeedError::Config(format!(
                "Sheet '{}' has no workbook relationship",
                sheet_name
            ))
        })?;
        let sheet_part = resolve_sheet_part(target);

        // 3. シートのrelationshipからID -> URLの対応を取得（ファイルがなければ空）
        let rels_part = rels_path_for(&sheet_part);
        let sheet_rels = match read_optional_part(&mut archive, &rels_part, &limits)? {
            Some(content) => parse_relationships(&content)?,
            None => HashMap::new(),
        };

        // 4. シートXMLの<hyperlinks>要素を解析
        let sheet_xml = read_part(&mut archive, &sheet_part, &limits)?;
        let links = parse_sheet_hyperlinks(&sheet_xml, &sheet_rels)?;

        Ok(Self { links })
    }

    /// テスト用: 座標 -> URL のマップから直接構築する
    #[cfg(test)]
    pub(crate) fn from_links(links: HashMap<(u32, u32), String>) -> Self {
        Self { links }
    }

    /// セル座標（0始まり）のハイパーリンクを取得する
    pub fn get(&self, row: u32, col: u32) -> Option<&str> {
        self.links.get(&(row, col)).map(String::as_str)
    }

    /// 索引に含まれるリンク数
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// 索引が空かどうか
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// アーカイブから必須パートを読み出す
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
    limits: &ZipLimits,
) -> Result<Vec<u8>, FeedError> {
    match read_optional_part(archive, part, limits)? {
        Some(content) => Ok(content),
        None => Err(FeedError::Zip(format!(
            "Missing part '{}' in workbook archive",
            part
        ))),
    }
}

/// アーカイブからパートを読み出す（存在しなければ`None`）
fn read_optional_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
    limits: &ZipLimits,
) -> Result<Option<Vec<u8>>, FeedError> {
    // パートパスはrelationshipの内容から組み立てられるため検証する
    validate_part_path(part)
        .map_err(|e| FeedError::SecurityViolation(format!("Invalid part path: {}", e)))?;

    let mut file = match archive.by_name(part) {
        Ok(file) => file,
        Err(_) => return Ok(None),
    };

    if file.size() > limits.max_part_size {
        return Err(FeedError::SecurityViolation(format!(
            "Part '{}' exceeds maximum size: {} bytes (max: {} bytes)",
            part,
            file.size(),
            limits.max_part_size
        )));
    }

    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(Some(content))
}

/// xl/workbook.xml からシート名 -> relationship ID の対応を解析する
fn parse_workbook_sheets(xml: &[u8]) -> Result<HashMap<String, String>, FeedError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheets = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                // <sheet name="Full Sheet" sheetId="1" r:id="rId1"/>
                if e.name().as_ref() == b"sheet" {
                    let mut name = None;
                    let mut rid = None;

                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| {
                            FeedError::Config(format!("XML attribute error: {}", e))
                        })?;
                        match attr.key.as_ref() {
                            b"name" => {
                                let value = attr.unescape_value().map_err(|e| {
                                    FeedError::Config(format!("XML attribute error: {}", e))
                                })?;
                                name = Some(value.into_owned());
                            }
                            b"r:id" => {
                                rid = Some(std::str::from_utf8(&attr.value)?.to_string());
                            }
                            _ => {}
                        }
                    }

                    if let (Some(name), Some(rid)) = (name, rid) {
                        sheets.insert(name, rid);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FeedError::Config(format!("XML parse error: {}", e))),
            _ => {}
        }
    }

    Ok(sheets)
}

/// relationshipファイルから ID -> Target の対応を解析する
fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>, FeedError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut relationships = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                // Event::Emptyは自己終了タグの場合に発生
                if e.name().as_ref() == b"Relationship" {
                    let mut id = None;
                    let mut target = None;

                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| {
                            FeedError::Config(format!("XML attribute error: {}", e))
                        })?;
                        match attr.key.as_ref() {
                            b"Id" => {
                                id = Some(std::str::from_utf8(&attr.value)?.to_string());
                            }
                            b"Target" => {
                                // URLは実体参照（&amp;など）を含むことがある
                                let value = attr.unescape_value().map_err(|e| {
                                    FeedError::Config(format!("XML attribute error: {}", e))
                                })?;
                                target = Some(value.into_owned());
                            }
                            _ => {}
                        }
                    }

                    if let (Some(id), Some(target)) = (id, target) {
                        relationships.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FeedError::Config(format!("XML parse error: {}", e))),
            _ => {}
        }
    }

    Ok(relationships)
}

/// シートXMLから <hyperlinks> 要素を解析し、セル座標 -> URL を構築する
fn parse_sheet_hyperlinks(
    xml: &[u8],
    relationships: &HashMap<String, String>,
) -> Result<HashMap<(u32, u32), String>, FeedError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut links = HashMap::new();
    let mut in_hyperlinks = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.name();
                let name_bytes = name.as_ref();

                if name_bytes == b"hyperlinks" {
                    in_hyperlinks = true;
                    continue;
                }

                // <hyperlink>要素は自己終了タグ（<hyperlink ... />）の可能性がある
                if in_hyperlinks && name_bytes == b"hyperlink" {
                    let mut cell_ref = None;
                    let mut rid = None;

                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| {
                            FeedError::Config(format!("XML attribute error: {}", e))
                        })?;
                        match attr.key.as_ref() {
                            b"ref" => {
                                cell_ref = Some(std::str::from_utf8(&attr.value)?.to_string());
                            }
                            b"r:id" => {
                                rid = Some(std::str::from_utf8(&attr.value)?.to_string());
                            }
                            _ => {}
                        }
                    }

                    if let (Some(cell_ref), Some(rid)) = (cell_ref, rid) {
                        // 範囲参照（"A1:B2"）はアンカーセルに割り当てる
                        let anchor = cell_ref.split(':').next().unwrap_or(&cell_ref);
                        if let Some(coord) = parse_cell_ref(anchor) {
                            if let Some(url) = relationships.get(&rid) {
                                links.insert(coord, url.clone());
                            }
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"hyperlinks" {
                    in_hyperlinks = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FeedError::Config(format!("XML parse error: {}", e))),
            _ => {}
        }
    }

    Ok(links)
}

/// workbook relationshipのTargetをアーカイブ内パスへ解決する
fn resolve_sheet_part(target: &str) -> String {
    let target = target.trim_start_matches('/');
    if target.starts_with("xl/") {
        target.to_string()
    } else {
        format!("xl/{}", target)
    }
}

/// シートXMLパスから対応するrelationshipファイルのパスを組み立てる
fn rels_path_for(sheet_part: &str) -> String {
    match sheet_part.rfind('/') {
        Some(pos) => format!(
            "{}/_rels/{}.rels",
            &sheet_part[..pos],
            &sheet_part[pos + 1..]
        ),
        None => format!("_rels/{}.rels", sheet_part),
    }
}
