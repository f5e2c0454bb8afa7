use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shelfsync_core::Error;
use shelfsync_feed::{FeedIngester, PAGE_SIZE};

/// Build a feed page with `count` items, ids offset so pages don't collide.
fn feed_page(count: usize, offset: usize) -> String {
    let mut xml = String::from(r#"<?xml version="1.0"?><rss version="2.0"><channel>"#);
    for i in 0..count {
        let n = offset + i;
        xml.push_str(&format!(
            "<item><title>Book {n:04}</title><book_id>{n}</book_id>\
             <author_name>Author {n}</author_name>\
             <user_shelves>shelf-{}</user_shelves></item>",
            n % 3
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

#[tokio::test]
async fn stops_after_a_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/review/list_rss/77"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed_page(PAGE_SIZE, 0)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/review/list_rss/77"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed_page(PAGE_SIZE, 100)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/review/list_rss/77"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed_page(42, 200)))
        .expect(1)
        .mount(&server)
        .await;

    let ingester = FeedIngester::with_base_url(server.uri());
    let (books, shelves) = ingester.fetch_all_books("77").await.unwrap();

    // [100, 100, 42] -> exactly 3 fetches (verified by mock expectations),
    // 242 books.
    assert_eq!(books.len(), 242);
    assert_eq!(shelves, vec!["all", "shelf-0", "shelf-1", "shelf-2"]);

    // Sorted by title, and every id survived normalization.
    let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
    let mut sorted = titles.clone();
    sorted.sort();
    assert_eq!(titles, sorted);
}

#[tokio::test]
async fn single_short_page_is_one_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/review/list_rss/5"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed_page(3, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let ingester = FeedIngester::with_base_url(server.uri());
    let (books, shelves) = ingester.fetch_all_books("5").await.unwrap();
    assert_eq!(books.len(), 3);
    assert!(shelves.contains(&"all".to_string()));
}

#[tokio::test]
async fn upstream_error_surfaces_as_feed_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/review/list_rss/9"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let ingester = FeedIngester::with_base_url(server.uri());
    let err = ingester.fetch_all_books("9").await.unwrap_err();
    assert!(matches!(err, Error::FeedFetch(_)));
}

#[tokio::test]
async fn garbage_body_surfaces_as_feed_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/review/list_rss/9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>sign in</html>"))
        .mount(&server)
        .await;

    let ingester = FeedIngester::with_base_url(server.uri());
    let err = ingester.fetch_all_books("9").await.unwrap_err();
    assert!(matches!(err, Error::FeedFetch(_)));
}
