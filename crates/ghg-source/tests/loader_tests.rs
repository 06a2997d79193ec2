use ghg_source::document::{DocumentKind, SourceRole, SourceSet};
use ghg_source::encoding::TextEncoding;
use ghg_source::loader::{load_path, LoadOptions};
use ghg_source::sections::{SectionMarker, SectionParser};
use ghg_source::{CellRef, CellValue, LabelQuery, SourceError};
use pretty_assertions::assert_eq;
use std::io::Write;

fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(bytes).unwrap();
    path
}

#[test]
fn test_gbk_csv_is_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let (bytes, _, _) = encoding_rs::GBK.encode("参数,值\ncompany_name,某某公司\nscope_1_emissions,1200.5\n");
    let path = write_file(&dir, "data.csv", &bytes);

    let docs = load_path(&path, SourceRole::Primary, &LoadOptions::default()).unwrap();
    assert_eq!(docs.len(), 1);
    let doc = docs[0].as_delimited().unwrap();
    assert_eq!(doc.encoding(), Some(TextEncoding::Gbk));
    assert_eq!(doc.lookup("company_name", 1), Some("某某公司"));
    assert_eq!(docs[0].kind(), DocumentKind::Delimited);
    assert!(docs[0].checksum().is_some());
}

#[test]
fn test_utf8_signature_csv() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = [b"\xEF\xBB\xBF".as_slice(), "范围一直接排放源,,\n类别,排放源,\n固定燃烧,天然气,\n".as_bytes()].concat();
    let path = write_file(&dir, "sections.csv", &bytes);

    let docs = load_path(&path, SourceRole::Primary, &LoadOptions::default()).unwrap();
    let doc = docs[0].as_delimited().unwrap();
    assert_eq!(doc.encoding(), Some(TextEncoding::Utf8Sig));

    let parser = SectionParser::new(vec![SectionMarker::new("scope1", ["范围一", "排放源"])]);
    assert_eq!(parser.parse(doc).get("scope1").len(), 1);
}

#[test]
fn test_tsv_and_roles() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "extra.tsv", b"k\tv\n");
    let docs = load_path(&path, SourceRole::Secondary, &LoadOptions::default()).unwrap();

    let mut set = SourceSet::new();
    docs.into_iter().for_each(|d| set.insert(d));
    let doc = set.iter().next().unwrap();
    assert_eq!(doc.role(), SourceRole::Secondary);
    assert_eq!(doc.as_delimited().unwrap().field(0, 1), "v");
}

#[test]
fn test_undecodable_file_with_narrow_encodings() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "bad.csv", &[0xFF, 0xFE, 0xFD]);
    let options = LoadOptions::default().with_encodings(vec![TextEncoding::Utf8]);
    let err = load_path(&path, SourceRole::Primary, &options).unwrap_err();
    assert!(matches!(err, SourceError::Undecodable { .. }));
}

#[test]
fn test_corrupt_workbook_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "broken.xlsx", b"not a zip archive");
    let err = load_path(&path, SourceRole::Secondary, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, SourceError::Workbook { .. }));
}

fn minimal_xlsx(sheets: &[(&str, &str)]) -> Vec<u8> {
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    let ns = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
    let rel_ns = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    let sheet_entries: String = sheets
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!(r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#, n = i + 1))
        .collect();
    let rel_entries: String = (1..=sheets.len())
        .map(|n| {
            format!(r#"<Relationship Id="rId{n}" Type="{rel_ns}/worksheet" Target="worksheets/sheet{n}.xml"/>"#)
        })
        .collect();
    let overrides: String = (1..=sheets.len())
        .map(|n| {
            format!(
                r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            )
        })
        .collect();

    let mut parts = vec![
        (
            "[Content_Types].xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
            ),
        ),
        (
            "_rels/.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{rel_ns}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
            ),
        ),
        (
            "xl/workbook.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="{ns}" xmlns:r="{rel_ns}"><sheets>{sheet_entries}</sheets></workbook>"#
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rel_entries}</Relationships>"#
            ),
        ),
    ];
    for (i, (_, rows)) in sheets.iter().enumerate() {
        parts.push((
            format!("xl/worksheets/sheet{}.xml", i + 1),
            format!(r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="{ns}"><sheetData>{rows}</sheetData></worksheet>"#),
        ));
    }

    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, body) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

#[test]
fn test_xlsx_sheets_become_grids() {
    let main = r#"<row r="2"><c r="B2" t="inlineStr"><is><t>组织名称：</t></is></c><c r="C2" t="inlineStr"><is><t>Acme</t></is></c></row>"#;
    let table = r#"<row r="1"><c r="A1" t="inlineStr"><is><t>总排放量</t></is></c><c r="B1"><v>1500.5</v></c></row>"#;
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "inventory.xlsx", &minimal_xlsx(&[("温室气体盘查清册", main), ("表1", table)]));

    let docs = load_path(&path, SourceRole::Secondary, &LoadOptions::default()).unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id().sheet_name(), Some("温室气体盘查清册"));
    assert_eq!(docs[1].id().sheet_name(), Some("表1"));
    assert_eq!(docs[0].kind(), DocumentKind::Grid);
    assert_eq!(docs[0].role(), SourceRole::Secondary);

    let found = docs[0].as_grid().unwrap().try_locate(&LabelQuery::new("组织名称")).unwrap();
    assert_eq!(found.label_at, CellRef::new(2, 2));
    assert_eq!(found.value, CellValue::Text("Acme".to_string()));
    assert_eq!(
        docs[1].as_grid().unwrap().locate(&LabelQuery::new("总排放量")),
        Some(CellValue::Number(1500.5))
    );
}
