//! Integration tests for the extractor
//!
//! These tests use wiremock to stand in for the listing service, detail
//! pages, image hosts and PDF hosts, and run the coordinator end-to-end.

use scholar_snapshot::config::{load_config, Config, RenderBackend};
use scholar_snapshot::crawler::Coordinator;
use scholar_snapshot::enrich::slug_digest;
use scholar_snapshot::output::{write_snapshot, Snapshot};
use scholar_snapshot::thumbnail::{NoopRenderer, PageRenderer, RenderError};
use scholar_snapshot::{FetchError, StopReason};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Renderer that writes a placeholder JPEG for anything that looks like a PDF
struct FakeRenderer;

impl PageRenderer for FakeRenderer {
    fn name(&self) -> &str {
        "fake"
    }

    fn available(&self) -> bool {
        true
    }

    fn render_first_page(&self, pdf: &Path, output: &Path) -> Result<(), RenderError> {
        let bytes = std::fs::read(pdf)?;
        if !bytes.starts_with(b"%PDF") {
            return Err(RenderError::Failed {
                path: pdf.to_path_buf(),
                message: "not a PDF".to_string(),
            });
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, [0xFF, 0xD8, 0xFF, 0xE0])?;
        Ok(())
    }
}

/// Creates a test configuration pointing every endpoint at the mock server
fn create_test_config(uri: &str, dir: &Path, page_size: usize) -> Config {
    let mut config = Config::default();
    config.profile.profile_id = "TESTPROFILE".to_string();
    config.profile.base_url = format!("{}/citations", uri);
    config.profile.host = uri.to_string();
    config.profile.image_host_filter = None;
    config.crawler.page_size = page_size;
    config.crawler.request_delay = 100; // Shortest delay validation allows
    config.crawler.page_timeout = 5;
    config.crawler.image_timeout = 5;
    config.crawler.pdf_timeout = 5;
    config.output.snapshot_path = dir
        .join("data/publications_scraped.json")
        .to_string_lossy()
        .into_owned();
    config.output.images_dir = dir.join("images").to_string_lossy().into_owned();
    config.output.pdf_tmp_dir = dir.join("pdfs").to_string_lossy().into_owned();
    config.render.backend = RenderBackend::None;
    config
}

/// One listing row in the service's markup
fn listing_row(title: &str, authors: &str, detail: &str, image: Option<&str>) -> String {
    let img = image
        .map(|src| format!(r#"<img src="{}">"#, src))
        .unwrap_or_default();
    format!(
        r##"<tr class="gsc_a_tr">
             <td class="gsc_a_t">{img}
               <a href="{detail}" class="gsc_a_at">{title}</a>
               <div class="gs_gray">{authors}</div>
               <div class="gs_gray">Medical Image Analysis, 2021</div>
             </td>
             <td class="gsc_a_c"><a href="#">12</a></td>
             <td class="gsc_a_y"><span class="gsc_a_h">2021</span></td>
           </tr>"##
    )
}

/// A listing page containing `rows`
fn listing_page(rows: &[String]) -> String {
    format!(
        r#"<html><body><table id="gsc_a_t"><tbody>{}</tbody></table></body></html>"#,
        rows.concat()
    )
}

/// `count` accepted rows titled "<prefix> 1", "<prefix> 2", ...
fn accepted_rows(prefix: &str, count: usize) -> Vec<String> {
    (1..=count)
        .map(|i| {
            listing_row(
                &format!("{} {}", prefix, i),
                "JC Paetzold, A Author",
                "",
                None,
            )
        })
        .collect()
}

async fn mount_listing(server: &MockServer, cstart: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/citations"))
        .and(query_param("cstart", cstart))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_short_page_ends_crawl_without_another_request() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&mock_server, "0", listing_page(&accepted_rows("Paper", 2)), 1).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), 3);
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(NoopRenderer))
        .expect("Failed to create coordinator");
    let report = coordinator.run().await;

    assert!(matches!(report.stop_reason, StopReason::LastPage));
    assert_eq!(report.len(), 2);
    assert_eq!(report.records[0].id, "scraped_001");
    assert_eq!(report.records[1].id, "scraped_002");
    assert_eq!(report.records[0].year, Some(2021));
    assert_eq!(report.records[0].venue, "Medical Image Analysis");
    assert_eq!(report.records[0].citations, 12);
    assert_eq!(report.stats.pages_fetched, 1);
}

#[tokio::test]
async fn test_pagination_sends_profile_query_and_advances_offset() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/citations"))
        .and(query_param("user", "TESTPROFILE"))
        .and(query_param("hl", "en"))
        .and(query_param("pagesize", "2"))
        .and(query_param("cstart", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&accepted_rows("First", 2))),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_listing(&mock_server, "2", listing_page(&accepted_rows("Second", 1)), 1).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), 2);
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(NoopRenderer)).unwrap();
    let report = coordinator.run().await;

    assert!(matches!(report.stop_reason, StopReason::LastPage));
    let titles: Vec<_> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["First 1", "First 2", "Second 1"]);
    assert_eq!(report.records[2].id, "scraped_003");
    assert_eq!(report.stats.pages_fetched, 2);
    assert_eq!(report.stats.rows_seen, 3);
}

#[tokio::test]
async fn test_empty_first_page_is_empty_profile() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&mock_server, "0", listing_page(&[]), 1).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), 2);
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(NoopRenderer)).unwrap();
    let report = coordinator.run().await;

    assert!(matches!(report.stop_reason, StopReason::EmptyProfile));
    assert!(report.is_empty());
    assert!(!report.stop_reason.is_failure());
}

#[tokio::test]
async fn test_empty_later_page_is_exhausted() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&mock_server, "0", listing_page(&accepted_rows("Paper", 2)), 1).await;
    mount_listing(&mock_server, "2", listing_page(&[]), 1).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), 2);
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(NoopRenderer)).unwrap();
    let report = coordinator.run().await;

    assert!(matches!(report.stop_reason, StopReason::Exhausted));
    assert_eq!(report.len(), 2);
}

#[tokio::test]
async fn test_page_cap_stops_full_pages() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&mock_server, "0", listing_page(&accepted_rows("Paper", 2)), 1).await;
    mount_listing(&mock_server, "2", listing_page(&accepted_rows("Never", 2)), 0).await;

    let mut config = create_test_config(&mock_server.uri(), dir.path(), 2);
    config.crawler.max_pages = 1;
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(NoopRenderer)).unwrap();
    let report = coordinator.run().await;

    assert!(matches!(report.stop_reason, StopReason::PageCap));
    assert_eq!(report.len(), 2);
}

#[tokio::test]
async fn test_failed_second_page_keeps_first_page_records() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&mock_server, "0", listing_page(&accepted_rows("Kept", 2)), 1).await;
    Mock::given(method("GET"))
        .and(path("/citations"))
        .and(query_param("cstart", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path(), 2);
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(NoopRenderer)).unwrap();
    let report = coordinator.run().await;

    assert!(report.stop_reason.is_failure());
    assert!(matches!(
        report.stop_reason,
        StopReason::Aborted(FetchError::Status { status: 503, .. })
    ));
    let titles: Vec<_> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Kept 1", "Kept 2"]);
}

#[tokio::test]
async fn test_author_filter_and_missing_title_are_skipped() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let rows = vec![
        listing_row("Leading", "JC Paetzold, B, C, D, E, F", "", None),
        listing_row("Buried", "A, B, C, JC Paetzold, E, F", "", None),
        r#"<tr class="gsc_a_tr"><td class="gsc_a_t"><div class="gs_gray">JC Paetzold</div></td></tr>"#
            .to_string(),
        listing_row("Senior", "A, B, C, D, E, JC Paetzold", "", None),
    ];
    mount_listing(&mock_server, "0", listing_page(&rows), 1).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), 10);
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(NoopRenderer)).unwrap();
    let report = coordinator.run().await;

    let titles: Vec<_> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Leading", "Senior"]);
    // Ids count accepted rows only
    assert_eq!(report.records[1].id, "scraped_002");
    assert_eq!(report.stats.rows_seen, 4);
    assert_eq!(report.stats.rejected_author, 1);
    assert_eq!(report.stats.rejected_no_title, 1);
}

#[tokio::test]
async fn test_failed_detail_fetch_falls_back_to_default_thumbnail() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let rows = vec![listing_row("Lonely", "JC Paetzold", "/detail/1", None)];
    mount_listing(&mock_server, "0", listing_page(&rows), 1).await;
    Mock::given(method("GET"))
        .and(path("/detail/1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path(), 10);
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(FakeRenderer)).unwrap();
    let report = coordinator.run().await;

    assert_eq!(report.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.thumbnail, "images/publications/default.png");
    assert_eq!(record.pdf_link, None);
    assert_eq!(record.url, format!("{}/detail/1", mock_server.uri()));
    assert_eq!(report.stats.detail_page_failures, 1);
    assert_eq!(report.stats.thumbnails_default, 1);
}

#[tokio::test]
async fn test_failed_image_download_falls_back_to_default_thumbnail() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let rows = vec![listing_row(
        "Broken Image",
        "JC Paetzold",
        "",
        Some("/img/missing.jpg"),
    )];
    mount_listing(&mock_server, "0", listing_page(&rows), 1).await;
    Mock::given(method("GET"))
        .and(path("/img/missing.jpg"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path(), 10);
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(NoopRenderer)).unwrap();
    let report = coordinator.run().await;

    assert_eq!(report.records[0].thumbnail, "images/publications/default.png");
    assert_eq!(report.stats.image_download_failures, 1);
}

#[tokio::test]
async fn test_pdf_cover_overrides_listing_thumbnail() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let uri = mock_server.uri();

    let rows = vec![listing_row(
        "Covered Paper",
        "JC Paetzold",
        "/detail/1",
        Some("/img/covered.jpg"),
    )];
    mount_listing(&mock_server, "0", listing_page(&rows), 1).await;
    Mock::given(method("GET"))
        .and(path("/img/covered.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/detail/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><body>
                 <a href="/relative.pdf">[PDF] relative</a>
                 <a href="{}/files/paper.pdf">[PDF] example.org</a>
               </body></html>"#,
            uri
        )))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/paper.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.5 test".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&uri, dir.path(), 10);
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(FakeRenderer)).unwrap();
    let report = coordinator.run().await;

    let record = &report.records[0];
    let images = dir.path().join("images");
    assert_eq!(
        record.thumbnail,
        images.join("covered_paper_pdf.jpg").to_string_lossy()
    );
    assert_eq!(
        record.pdf_link.as_deref(),
        Some(format!("{}/files/paper.pdf", uri).as_str())
    );
    assert!(images.join("covered_paper.jpg").exists());
    assert!(images.join("covered_paper_pdf.jpg").exists());
    assert!(dir.path().join("pdfs").join("covered_paper.pdf").exists());
    assert_eq!(report.stats.thumbnails_pdf, 1);
    assert_eq!(report.stats.thumbnails_listing, 0);
}

#[tokio::test]
async fn test_render_failure_keeps_listing_thumbnail() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let uri = mock_server.uri();

    let rows = vec![listing_row(
        "Bad Pdf",
        "JC Paetzold",
        "/detail/1",
        Some("/img/bad.jpg"),
    )];
    mount_listing(&mock_server, "0", listing_page(&rows), 1).await;
    Mock::given(method("GET"))
        .and(path("/img/bad.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/detail/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<a href="{}/files/bad.pdf">download</a>"#,
            uri
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/bad.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login wall</html>"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&uri, dir.path(), 10);
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(FakeRenderer)).unwrap();
    let report = coordinator.run().await;

    let record = &report.records[0];
    assert_eq!(
        record.thumbnail,
        dir.path().join("images").join("bad_pdf.jpg").to_string_lossy()
    );
    assert!(record.pdf_link.is_some());
    assert_eq!(report.stats.render_failures, 1);
    assert_eq!(report.stats.thumbnails_listing, 1);
}

#[tokio::test]
async fn test_unavailable_renderer_still_downloads_pdf() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let uri = mock_server.uri();

    let rows = vec![listing_row("No Renderer", "JC Paetzold", "/detail/1", None)];
    mount_listing(&mock_server, "0", listing_page(&rows), 1).await;
    Mock::given(method("GET"))
        .and(path("/detail/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<a href="{}/files/paper.pdf">PDF</a>"#,
            uri
        )))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/paper.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&uri, dir.path(), 10);
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(NoopRenderer)).unwrap();
    let report = coordinator.run().await;

    let record = &report.records[0];
    assert_eq!(
        record.pdf_link.as_deref(),
        Some(format!("{}/files/paper.pdf", uri).as_str())
    );
    assert_eq!(record.thumbnail, "images/publications/default.png");
    assert_eq!(
        std::fs::read(dir.path().join("pdfs").join("no_renderer.pdf")).unwrap(),
        b"%PDF".to_vec()
    );
    assert!(!dir.path().join("images").join("no_renderer_pdf.jpg").exists());
    assert_eq!(report.stats.renderer_unavailable, 1);
    assert_eq!(report.stats.pdf_download_failures, 0);
}

#[tokio::test]
async fn test_duplicate_titles_get_distinct_thumbnails() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let rows = vec![
        listing_row("My Paper", "JC Paetzold", "", Some("/img/a.jpg")),
        listing_row("My Paper!", "JC Paetzold", "", Some("/img/b.jpg")),
    ];
    mount_listing(&mock_server, "0", listing_page(&rows), 1).await;
    Mock::given(method("GET"))
        .and(path("/img/a.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8]))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/b.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![2u8]))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), dir.path(), 10);
    config.crawler.enrich_concurrency = 4;
    let mut coordinator = Coordinator::with_renderer(&config, Arc::new(NoopRenderer)).unwrap();
    let report = coordinator.run().await;

    let images = dir.path().join("images");
    let second = format!("my_paper_{}.jpg", slug_digest("my_paper"));
    assert_eq!(
        report.records[0].thumbnail,
        images.join("my_paper.jpg").to_string_lossy()
    );
    assert_eq!(report.records[1].thumbnail, images.join(&second).to_string_lossy());
    assert_eq!(std::fs::read(images.join("my_paper.jpg")).unwrap(), vec![1u8]);
    assert_eq!(std::fs::read(images.join(second)).unwrap(), vec![2u8]);
}

#[tokio::test]
async fn test_config_file_run_writes_snapshot() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let uri = mock_server.uri();

    let rows = vec![listing_row(
        "Graph Neural Network for Vessel Segmentation",
        "JC Paetzold, A Author",
        "/detail/1",
        None,
    )];
    mount_listing(&mock_server, "0", listing_page(&rows), 1).await;

    let snapshot_path = dir.path().join("out").join("publications.json");
    let config_path = dir.path().join("snapshot.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[profile]
profile-id = "TESTPROFILE"
base-url = "{uri}/citations"
host = "{uri}"

[crawler]
page-size = 5
request-delay = 100

[output]
snapshot-path = "{snapshot}"
images-dir = "{images}"
pdf-tmp-dir = "{pdfs}"

[render]
backend = "none"
"#,
            uri = uri,
            snapshot = snapshot_path.display(),
            images = dir.path().join("images").display(),
            pdfs = dir.path().join("pdfs").display(),
        ),
    )
    .unwrap();

    let config = load_config(&config_path).expect("Failed to load config");
    let mut coordinator = Coordinator::new(&config).unwrap();
    let report = coordinator.run().await;
    assert_eq!(report.len(), 1);

    let snapshot = Snapshot::new(report.records);
    write_snapshot(&snapshot, Path::new(&config.output.snapshot_path)).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&snapshot_path).unwrap()).unwrap();
    let publication = &value["publications"][0];
    assert_eq!(publication["id"], "scraped_001");
    assert_eq!(publication["categories"], serde_json::json!(["gnn", "segmentation"]));
    assert_eq!(publication["primary_category"], "gnn");
    assert_eq!(publication["venue_tag"], "MEDICAL IMAGE ANALYSIS");
    assert_eq!(publication["year"], 2021);
    assert_eq!(publication["pdf_link"], "");
    assert_eq!(publication["featuredOrder"], 999);
    assert_eq!(publication["scholar_link"], "/detail/1");
    assert!(value["last_updated"].is_string());
}
