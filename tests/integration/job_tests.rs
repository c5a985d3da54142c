use crate::common::{listing_page, product_page, test_runner};
use storefront_harvester::JobStatus;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_listing_job_with_pagination() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let runner = test_runner(&dir);

    Mock::given(method("GET"))
        .and(path("/catalog/drills/"))
        .respond_with(html(listing_page(
            3,
            &["/product/drill-a/", "/product/drill-b/"],
            Some("/catalog/drills/page-2/"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    // drill-b appears on both pages
    Mock::given(method("GET"))
        .and(path("/catalog/drills/page-2/"))
        .respond_with(html(listing_page(
            3,
            &["/product/drill-b/?utm_source=listing", "/product/drill-c/"],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    for (slug, price) in [("drill-a", "4 590 ₽"), ("drill-b", "12 990,50 ₽"), ("drill-c", "990 ₽")] {
        Mock::given(method("GET"))
            .and(path(format!("/product/{}/", slug)))
            .respond_with(html(product_page(slug, price, "750")))
            .expect(1)
            .mount(&server)
            .await;
    }

    let url = format!("{}/catalog/drills/", server.uri());
    let id = runner
        .submit_job("baucenter", &url, "Мощность", "Вес")
        .unwrap();
    let status = runner.run_job(id).await.unwrap();

    assert_eq!(status, JobStatus::Done);
    let job = runner.job(id).unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert!(job.error.is_none());

    let mut records: Vec<_> = runner
        .records(id)
        .unwrap()
        .into_iter()
        .map(|r| r.row)
        .collect();
    records.sort_by(|a, b| a.url.cmp(&b.url));

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].name, "drill-a");
    assert_eq!(records[0].price, "4590");
    assert_eq!(records[1].price, "12991");
    assert_eq!(records[1].url, format!("{}/product/drill-b/", server.uri()));
    assert_eq!(records[2].stock, "5");
    assert!(records.iter().all(|r| r.tx1 == "750"));
    assert!(records.iter().all(|r| r.tx2 == "unknown"));
}

#[tokio::test]
async fn test_challenge_cleared_by_reload() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let runner = test_runner(&dir);

    Mock::given(method("GET"))
        .and(path("/product/guarded/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><title>DDoS-Guard</title></html>", "text/html"),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/guarded/"))
        .respond_with(html(product_page("guarded", "1 200 ₽", "500")))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/product/guarded/", server.uri());
    let id = runner.submit_job("baucenter", &url, "Мощность", "").unwrap();

    assert_eq!(runner.run_job(id).await.unwrap(), JobStatus::Done);
    let records = runner.records(id).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].row.price, "1200");
    assert_eq!(records[0].row.tx2, "unknown");
}

#[tokio::test]
async fn test_listing_without_links_ends_in_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let runner = test_runner(&dir);

    Mock::given(method("GET"))
        .and(path("/catalog/empty/"))
        .respond_with(html(listing_page(0, &[], None)))
        .mount(&server)
        .await;

    let url = format!("{}/catalog/empty/", server.uri());
    let id = runner.submit_job("baucenter", &url, "", "").unwrap();

    assert_eq!(runner.run_job(id).await.unwrap(), JobStatus::Error);

    let job = runner.job(id).unwrap();
    let error = job.error.unwrap();
    assert!(error.contains("0 product links"), "unexpected error: {}", error);
    assert!(error.contains("title='Дрели'"));
    assert!(runner.records(id).unwrap().is_empty());
}

#[tokio::test]
async fn test_all_items_failing_ends_in_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let runner = test_runner(&dir);

    Mock::given(method("GET"))
        .and(path("/catalog/gone/"))
        .respond_with(html(listing_page(1, &["/product/missing/"], None)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/missing/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>Нет такого</html>"))
        .mount(&server)
        .await;

    let url = format!("{}/catalog/gone/", server.uri());
    let id = runner.submit_job("baucenter", &url, "", "").unwrap();

    assert_eq!(runner.run_job(id).await.unwrap(), JobStatus::Error);
    let error = runner.job(id).unwrap().error.unwrap();
    assert!(error.contains("got 1 product links but 0 results"));
    assert!(error.contains("HTTP 404"));
}

#[tokio::test]
async fn test_unknown_site_fails_without_network() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let runner = test_runner(&dir);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let url = format!("{}/catalog/", server.uri());
    let id = runner.submit_job("ozon", &url, "", "").unwrap();

    assert_eq!(runner.run_job(id).await.unwrap(), JobStatus::Error);
    assert_eq!(
        runner.job(id).unwrap().error.as_deref(),
        Some("Parser for site 'ozon' not found")
    );
}

#[tokio::test]
async fn test_finished_job_cannot_rerun() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let runner = test_runner(&dir);

    Mock::given(method("GET"))
        .and(path("/product/once/"))
        .respond_with(html(product_page("once", "100 ₽", "1")))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/product/once/", server.uri());
    let id = runner.submit_job("baucenter", &url, "", "").unwrap();

    assert_eq!(runner.spawn(id).await.unwrap().unwrap(), JobStatus::Done);
    assert!(runner.run_job(id).await.is_err());
    assert_eq!(runner.job(id).unwrap().status, JobStatus::Done);
    assert_eq!(runner.records(id).unwrap().len(), 1);
}
