use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use imgvec_core::config::FetchSettings;
use imgvec_core::traits::ImageSource;
use imgvec_core::FetchError;
use imgvec_image::HttpFetcher;
use std::net::SocketAddr;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(&FetchSettings::default()).expect("client")
}

#[tokio::test]
async fn returns_body_bytes_on_success() {
    let app = Router::new().route("/cat.jpg", get(|| async { vec![1u8, 2, 3, 4] }));
    let addr = serve(app).await;

    let bytes = fetcher().fetch(&format!("http://{addr}/cat.jpg")).await.expect("fetch");
    assert_eq!(bytes, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let app = Router::new().route("/gone", get(|| async { (StatusCode::NOT_FOUND, "nope") }));
    let addr = serve(app).await;
    let url = format!("http://{addr}/gone");

    match fetcher().fetch(&url).await {
        Err(FetchError::Status { url: u, status }) => {
            assert_eq!(status, 404);
            assert_eq!(u, url);
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetcher().fetch(&format!("http://{addr}/img.png")).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }), "{err:?}");
}

#[tokio::test]
async fn unparseable_or_non_http_urls_are_rejected_up_front() {
    for url in ["not a url", "ftp://example.com/a.png", ""] {
        let err = fetcher().fetch(url).await.unwrap_err();
        assert_eq!(err, FetchError::InvalidUrl(url.to_string()));
    }
}
