//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end: config loading, checkpoint seeding,
//! content fetching and the chapter files written to disk.

use corpus_harvest::checkpoint::CheckpointStore;
use corpus_harvest::config::{load_config, Config};
use corpus_harvest::crawler::run_crawl;
use corpus_harvest::Metadata;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One metadata row in the catalog's JSON layout
fn metadata_row(number: u32, title: &str, source_url: &str, has_chapters: bool) -> serde_json::Value {
    serde_json::json!({
        "documentId": format!("RCN_{:03}", number),
        "documentNumber": number,
        "genre": {"code": "N", "category": "newTestament", "vietnamese": "Tân Ước"},
        "tags": [],
        "title": title,
        "author": "",
        "sourceType": "web",
        "sourceURL": source_url,
        "source": "example.org",
        "hasChapters": has_chapters,
        "publishedTime": "01/02/2003",
        "language": "Tiếng Việt",
        "requiresManualCheck": false
    })
}

/// Writes the metadata file and a config pointing at it, then loads the config
fn create_test_config(dir: &Path, rows: Vec<serde_json::Value>, source: &str) -> Config {
    let metadata_path = dir.join("metadata.json");
    std::fs::write(&metadata_path, serde_json::Value::Array(rows).to_string()).unwrap();

    let content = format!(
        r#"
[crawler]
name = "kinhthanh"
domain = "R"
sub-domain = "C"
timeout-secs = 10
formats = ["xml", "json"]

[user-agent]
crawler-name = "TestHarvest"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "test@example.com"

[paths]
metadata-path = "{metadata}"
output-dir = "{output}"

[source]
retries = 0
retry-delay-ms = 10
{source}
"#,
        metadata = metadata_path.display(),
        output = dir.join("out").display(),
        source = source,
    );

    let config_path = dir.join("harvest.toml");
    std::fs::write(&config_path, content).unwrap();
    load_config(&config_path).unwrap()
}

fn chapter_file(config: &Config, document: &str, chapter: &str, ext: &str) -> PathBuf {
    config
        .paths
        .output_dir
        .join("newTestament")
        .join(document)
        .join(format!("{}.{}", chapter, ext))
}

fn checkpoint_state(config: &Config, id: &str) -> Option<bool> {
    let store = CheckpointStore::<Metadata>::open(&config.checkpoint_path()).unwrap();
    store.get(id).map(|c| c.completed)
}

fn chapter_pages(chapter: u32, text: &str) -> String {
    serde_json::json!([{
        "id": format!("RCN_001.{:03}.001", chapter),
        "number": 1,
        "sentences": [
            {
                "type": "single",
                "id": format!("RCN_001.{:03}.001.01", chapter),
                "text": text,
                "headings": [{
                    "text": format!("Chương {}", chapter),
                    "level": 2,
                    "order": 0,
                    "sentenceId": format!("RCN_001.{:03}.001.01", chapter)
                }],
                "footnotes": [{
                    "label": "a",
                    "text": "Chú thích",
                    "position": 3,
                    "sentenceId": format!("RCN_001.{:03}.001.01", chapter)
                }]
            },
            {
                "type": "multiple",
                "id": format!("RCN_001.{:03}.001.02", chapter),
                "array": [
                    {"languageCode": "vi", "text": "Xin chào."},
                    {"languageCode": "en", "text": "Hello."}
                ]
            }
        ]
    }])
    .to_string()
}

#[tokio::test]
async fn test_full_crawl_json_source() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/mt/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"href":"1.json","chapterNumber":1,"chapterName":"Chương 1"},
                {"href":"2.json","chapterNumber":2,"chapterName":"Chương 2"}]"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/mt/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(chapter_pages(1, "Gia phả Đức Giê-su.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/mt/2.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(chapter_pages(2, "Các nhà chiêm tinh.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        vec![metadata_row(1, "Mát-thêu", &format!("{}/mt/index.json", base_url), true)],
        "kind = \"json\"",
    );

    let report = run_crawl(&config).await.expect("Crawl should succeed");
    assert_eq!(report.documents_seen, 1);
    assert_eq!(report.documents_completed, 1);
    assert_eq!(report.chapters_written, 2);
    assert_eq!(report.chapters_failed, 0);

    let xml_path = chapter_file(&config, "RCN_001 (Mát-thêu)", "RCN_001.001", "xml");
    let xml = std::fs::read_to_string(&xml_path).unwrap();
    assert!(xml.contains("<SECT ID=\"RCN_001.001\" NAME=\"Chương 1\" NUMBER=\"1\">"));
    assert!(xml.contains("<en>Hello.</en>"));
    assert!(xml.contains("LABEL=\"a\" POSITION=\"3\" ORDER=\"0\">Chú thích</FOOTNOTE>"));

    let json_path = chapter_file(&config, "RCN_001 (Mát-thêu)", "RCN_001.002", "json");
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["root"]["file"]["sect"]["id"], "RCN_001.002");
    assert_eq!(
        json["root"]["file"]["sect"]["headings"][0]["text"],
        "Chương 2"
    );

    assert_eq!(checkpoint_state(&config, "RCN_001"), Some(true));

    // The document is complete, so a second run fetches nothing
    let report = run_crawl(&config).await.unwrap();
    assert_eq!(report.documents_seen, 0);
}

/// Reads every file under `dir` into a sorted path-to-contents map
fn snapshot_files(dir: &Path) -> Vec<(PathBuf, String)> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let contents = std::fs::read_to_string(&path).unwrap();
                files.push((path.strip_prefix(dir).unwrap().to_path_buf(), contents));
            }
        }
    }
    files.sort();
    files
}

#[tokio::test]
async fn test_forced_rerun_rewrites_identical_files() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/mt/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"href":"1.json","chapterNumber":1,"chapterName":"Chương 1"}]"#,
        ))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/mt/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(chapter_pages(1, "Gia phả Đức Giê-su.")))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(
        dir.path(),
        vec![metadata_row(1, "Mát-thêu", &format!("{}/mt/index.json", base_url), true)],
        "kind = \"json\"",
    );

    let report = run_crawl(&config).await.unwrap();
    assert_eq!(report.chapters_written, 1);
    let first = snapshot_files(&config.paths.output_dir);
    assert!(first
        .iter()
        .any(|(path, _)| path.ends_with("RCN_001.001.xml")));

    config.checkpoint.force_all = true;
    let report = run_crawl(&config).await.unwrap();
    assert_eq!(report.documents_seen, 1);
    assert_eq!(report.documents_completed, 1);

    let second = snapshot_files(&config.paths.output_dir);
    assert_eq!(first, second);
    assert_eq!(checkpoint_state(&config, "RCN_001"), Some(true));
}

#[tokio::test]
async fn test_document_without_chapters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/single.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(chapter_pages(1, "Một câu.")))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        vec![metadata_row(
            1,
            "Thư ngắn",
            &format!("{}/single.json", mock_server.uri()),
            false,
        )],
        "kind = \"json\"",
    );

    let report = run_crawl(&config).await.unwrap();
    assert_eq!(report.documents_completed, 1);
    assert_eq!(report.chapters_written, 1);

    let json_path = chapter_file(&config, "RCN_001 (Thư ngắn)", "RCN_001.001", "json");
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["root"]["file"]["sect"]["name"], "");
}

#[tokio::test]
async fn test_discovery_failure_leaves_document_pending() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing/index.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        vec![metadata_row(
            1,
            "Mát-thêu",
            &format!("{}/missing/index.json", mock_server.uri()),
            true,
        )],
        "kind = \"json\"",
    );

    let report = run_crawl(&config).await.expect("Failures are contained");
    assert_eq!(report.documents_seen, 1);
    assert_eq!(report.documents_failed, 1);
    assert_eq!(report.chapters_written, 0);

    assert_eq!(checkpoint_state(&config, "RCN_001"), Some(false));
    assert!(!config.paths.output_dir.join("newTestament").exists());

    // Still pending, so the next run tries again
    let report = run_crawl(&config).await.unwrap();
    assert_eq!(report.documents_seen, 1);
}

#[tokio::test]
async fn test_full_crawl_html_source() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sach/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><ul class="toc">
                <li><a href="ch1.html">Chương 1</a></li>
                <li><a href="mailto:admin@example.org">Liên hệ</a></li>
            </ul></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sach/ch1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><div class="content">
                <h2>Gia phả</h2>
                <p>Gia phả Đức Giê-su Ki-tô.<sup class="ref">1</sup> Ông Áp-ra-ham sinh I-xa-ác.</p>
                <p class="note">[1] Con cháu vua Đa-vít.</p>
            </div></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        vec![metadata_row(1, "Mát-thêu", &format!("{}/sach/index.html", base_url), true)],
        r#"kind = "html"
export-markdown = true

[source.selectors]
chapter-link = "ul.toc a"
content = "div.content"
footnote-ref = "sup.ref"
footnote-body = "p.note""#,
    );

    let report = run_crawl(&config).await.unwrap();
    assert_eq!(report.documents_completed, 1);
    assert_eq!(report.chapters_written, 1);

    let xml = std::fs::read_to_string(chapter_file(
        &config,
        "RCN_001 (Mát-thêu)",
        "RCN_001.001",
        "xml",
    ))
    .unwrap();
    assert!(xml.contains("NAME=\"Chương 1\""));
    assert!(xml.contains(">Gia phả Đức Giê-su Ki-tô.</STC>"));
    assert!(xml.contains(">Ông Áp-ra-ham sinh I-xa-ác.</STC>"));
    assert!(xml.contains("LABEL=\"1\""));
    assert!(xml.contains(">Con cháu vua Đa-vít.</FOOTNOTE>"));
    assert!(xml.contains("LEVEL=\"2\" ORDER=\"0\">Gia phả</HEADING>"));

    let markdown = std::fs::read_to_string(chapter_file(
        &config,
        "RCN_001 (Mát-thêu)",
        "RCN_001.001",
        "md",
    ))
    .unwrap();
    assert!(markdown.starts_with("## Gia phả"));

    assert_eq!(checkpoint_state(&config, "RCN_001"), Some(true));
}
