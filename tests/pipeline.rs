use policy_sheet::{Config, Criteria, PolicySheetError};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONFIG: &str = r#"{
    "page": "Page",
    "policy_name": "Name",
    "roles_begin": "RoleBegin",
    "roles_end": "RoleEnd",
    "type": "Type",
    "technical_group_name": "Technical group name",
    "display_name": "Display name",
    "pages_names": { "home": "Home", "Billing": "Billing" }
}"#;

const WORKBOOK: &str = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>
        <sheet name="Matrix" sheetId="1" r:id="rId1"/>
        <sheet name="Notes" sheetId="2" r:id="rId2"/>
    </sheets>
</workbook>"#;

const RELATIONSHIPS: &str = r#"<Relationships>
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
</Relationships>"#;

const NOTES: &str = r#"<worksheet><sheetData>
    <row r="1"><c r="A1" t="inlineStr"><is><t>nothing to see</t></is></c></row>
</sheetData></worksheet>"#;

/// Renders rows of text as an inline-string worksheet.
fn worksheet(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<worksheet><sheetData>");
    for (row, cells) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
        for (col, text) in cells.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            let column = (b'A' + col as u8) as char;
            xml.push_str(&format!(
                r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                column,
                row + 1,
                text
            ));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn write_workbook(path: &Path, matrix: &str) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in [
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", RELATIONSHIPS),
        ("xl/worksheets/sheet1.xml", matrix),
        ("xl/worksheets/sheet2.xml", NOTES),
    ] {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

fn matrix() -> String {
    worksheet(&[
        &["Page", "Name", "RoleBegin", "Editor", "Viewer", "RoleEnd"],
        &["home, billing", "view", "", "yes", "YES", ""],
        &["home", "edit", "", "Yes", "no", ""],
        &["unknown", "delete", "", "yes", "", ""],
        &[],
        &["Type", "Technical group name", "Display name"],
        &["grp", "org:team:editor", "Editors"],
    ])
}

fn only_subdirectory(root: &Path) -> PathBuf {
    let entries = std::fs::read_dir(root)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.is_dir())
        .collect::<Vec<_>>();
    assert_eq!(entries.len(), 1, "expected one output directory, got {:?}", entries);
    entries.into_iter().next().unwrap()
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[test]
fn writes_policies_for_extracted_sheet() {
    let workspace = tempfile::tempdir().unwrap();
    let book = workspace.path().join("matrix.xlsx");
    write_workbook(&book, &matrix());
    let out = workspace.path().join("out");
    std::fs::create_dir(&out).unwrap();

    let config = Config::from_json(CONFIG).unwrap();
    let report = policy_sheet::parse(book.to_str().unwrap(), &out, &config, &Criteria::default()).unwrap();

    assert_eq!(report.sheets.len(), 2);
    assert_eq!(report.policy_count(), 4);
    assert!(report.has_warnings());
    assert_eq!(
        report.warnings_html(),
        concat!(
            "<b>Matrix</b>: cannot find binding name for 'viewer'<br>",
            "<b>Matrix</b>: page 'unknown' (row 4) isn't in config file: skipped<br>",
            "<b>Notes</b>: cannot find <i>Page</i>, <i>Name</i> or bounds for roles<br>",
        )
    );

    let directory = only_subdirectory(&out);
    assert!(directory.file_name().unwrap().to_str().unwrap().ends_with("_Matrix"));

    assert_eq!(
        read_json(&directory.join("editor_home.json")),
        serde_json::json!({
            "name": "pn:grp:home:editor",
            "description": "Editors",
            "subjects": ["org:team:editor"],
            "actions": ["view", "edit"],
            "effect": "allow",
            "conditions": {},
            "resources": ["rn:home"],
        })
    );
    assert_eq!(
        read_json(&directory.join("editor_billing.json"))["actions"],
        serde_json::json!(["view"])
    );
    let missing = read_json(&directory.join("viewer_MISSING.json"));
    assert_eq!(missing["subjects"], serde_json::json!(["MISSING"]));
    assert_eq!(missing["name"], "viewer:MISSING");
}

#[test]
fn sheet_criteria_limit_output() {
    let workspace = tempfile::tempdir().unwrap();
    let book = workspace.path().join("matrix.xlsx");
    write_workbook(&book, &matrix());

    let config = Config::from_json(CONFIG).unwrap();
    let criteria = Criteria::with_sheet_patterns(&["Notes"]).unwrap();
    let report = policy_sheet::parse(book.to_str().unwrap(), workspace.path(), &config, &criteria).unwrap();

    assert_eq!(report.sheets.len(), 1);
    assert_eq!(report.policy_count(), 0);
    let directories = std::fs::read_dir(workspace.path())
        .unwrap()
        .filter(|entry| entry.as_ref().unwrap().path().is_dir())
        .count();
    assert_eq!(directories, 0);
}

#[test]
fn unsupported_extension_is_rejected() {
    let workspace = tempfile::tempdir().unwrap();
    let config = Config::from_json(CONFIG).unwrap();
    let error = policy_sheet::parse("matrix.csv", workspace.path(), &config, &Criteria::default()).unwrap_err();
    assert!(error.to_string().starts_with("cannot open 'matrix.csv'"));
    assert!(matches!(error, PolicySheetError::WithContextError(_)));
}
