use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use status_page::server::{AppState, configure};
use status_page::source::{FileSource, StatusSource};
use status_page::Config;
use std::sync::Arc;
use tempfile::TempDir;

fn body_for(days: u32) -> String {
    format!(
        r#"{{"overall_status": "All Systems Operational", "granularity": "daily",
            "services": [{{"service_alias": "api-{days}", "service_title": "API",
                           "current_status": "operational", "uptime_90d": 99.5, "daily": []}}]}}"#
    )
}

fn state() -> (TempDir, web::Data<AppState>) {
    let dir = TempDir::new().unwrap();
    for days in [1, 7, 30, 90] {
        std::fs::write(dir.path().join(format!("status_{}.json", days)), body_for(days)).unwrap();
    }

    let source: Arc<dyn StatusSource> = Arc::new(FileSource::new(dir.path()));
    let state = AppState::new(Config::default(), source);
    (dir, web::Data::new(state))
}

async fn body_text(resp: actix_web::dev::ServiceResponse) -> String {
    let body = test::read_body(resp).await;
    String::from_utf8(body.to_vec()).unwrap()
}

fn theme_cookie(resp: &actix_web::dev::ServiceResponse) -> Option<String> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "THEME")
        .map(|c| c.value().to_string())
}

#[actix_web::test]
async fn test_health_check() {
    let (_dir, data) = state();
    let app = test::init_service(App::new().app_data(data).configure(configure)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "OK");
}

#[actix_web::test]
async fn test_range_comes_from_each_request() {
    let (_dir, data) = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert!(resp.headers().contains_key("accept-ch"));
    let html = body_text(resp).await;
    assert!(html.contains(r#"data-alias="api-1""#));
    assert!(html.contains(r#"class="range-btn active" data-range="1""#));

    let req = test::TestRequest::get().uri("/?days=30").to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert!(html.contains(r#"data-alias="api-30""#));
    assert!(html.contains(r#"class="range-btn active" data-range="30""#));

    // another viewer without a range still gets the default
    let req = test::TestRequest::get().uri("/").to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert!(html.contains(r#"data-alias="api-1""#));

    assert_eq!(data.controller.tracked_ranges().await, vec![1, 30]);
}

#[actix_web::test]
async fn test_unoffered_range_falls_back_to_default() {
    let (_dir, data) = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

    let req = test::TestRequest::get().uri("/?days=5").to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert!(html.contains(r#"data-alias="api-1""#));
    assert_eq!(data.controller.tracked_ranges().await, vec![1]);
}

#[actix_web::test]
async fn test_client_hint_is_stored_in_cookie() {
    let (_dir, data) = state();
    let app = test::init_service(App::new().app_data(data).configure(configure)).await;

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(("Sec-CH-Prefers-Color-Scheme", "\"dark\""))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(theme_cookie(&resp).as_deref(), Some("dark"));
    let html = body_text(resp).await;
    assert!(html.contains(r#"<html lang="en" class="dark">"#));

    // a second viewer's preference is their own
    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(("Sec-CH-Prefers-Color-Scheme", "\"light\""))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(theme_cookie(&resp).as_deref(), Some("light"));
    let html = body_text(resp).await;
    assert!(html.contains(r#"<html lang="en" class="">"#));
}

#[actix_web::test]
async fn test_cookie_wins_over_client_hint() {
    let (_dir, data) = state();
    let app = test::init_service(App::new().app_data(data).configure(configure)).await;

    let req = test::TestRequest::get()
        .uri("/")
        .cookie(actix_web::cookie::Cookie::new("THEME", "dark"))
        .insert_header(("Sec-CH-Prefers-Color-Scheme", "\"light\""))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(theme_cookie(&resp), None);
    let html = body_text(resp).await;
    assert!(html.contains(r#"<html lang="en" class="dark">"#));
}

#[actix_web::test]
async fn test_theme_toggle_sets_cookie() {
    let (_dir, data) = state();
    let app = test::init_service(App::new().app_data(data).configure(configure)).await;

    let req = test::TestRequest::post().uri("/theme?days=7").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(), "/?days=7");
    assert_eq!(theme_cookie(&resp).as_deref(), Some("dark"));

    let req = test::TestRequest::post()
        .uri("/theme")
        .cookie(actix_web::cookie::Cookie::new("THEME", "dark"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(theme_cookie(&resp).as_deref(), Some("light"));
}

#[actix_web::test]
async fn test_refresh_redirects_to_range() {
    let (_dir, data) = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

    let req = test::TestRequest::post().uri("/refresh?days=7").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(), "/?days=7");
    assert!(matches!(
        data.controller.view(7).await,
        status_page::ViewState::Loaded { .. }
    ));
}
