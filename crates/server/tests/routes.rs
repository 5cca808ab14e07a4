use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use axum_extra::extract::cookie::Key;
use http_body_util::BodyExt;
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{NOTICE_COOKIE, SESSION_COOKIE, ServerConfig};

async fn engine(db: &DatabaseConnection) -> Engine {
    Engine::builder()
        .database(db.clone())
        .password_cost(4)
        .build()
        .await
        .unwrap()
}

/// Router over a fresh database holding one pharmacy (id 1).
async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let seed = json!([{
        "Name": "Аптека на Тверской",
        "Address": "ул. Тверская, 5, Москва",
        "Category": "Аптека",
        "MinDiscountSize": "10%",
        "geoData": { "coordinates": [37.61, 55.76] }
    }]);
    let records = seed.as_array().unwrap();
    engine(&db).await.import_locations(records).await.unwrap();

    server::app(
        engine(&db).await,
        ServerConfig {
            key: Key::generate(),
            maps_api_key: Some("maps-key".to_string()),
        },
    )
}

fn get(uri: &str, cookies: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookies)
        .body(Body::empty())
        .unwrap()
}

fn post_form(uri: &str, cookies: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookies)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// `name=value` pairs of every cookie the response sets.
fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::to_string)
        .collect()
}

fn cookie_named(response: &Response, name: &str) -> String {
    set_cookies(response)
        .into_iter()
        .find(|cookie| cookie.starts_with(&format!("{name}=")))
        .unwrap()
}

/// Register and log in `alice`, returning her session cookie.
async fn login_alice(app: &Router) -> String {
    let res = send(
        app,
        post_form(
            "/register",
            "",
            "username=alice&email=alice%40example.com&password=secret",
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");

    let res = send(app, post_form("/login", "", "username=alice&password=secret")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    cookie_named(&res, SESSION_COOKIE)
}

#[tokio::test]
async fn listing_returns_locations_and_categories() {
    let app = app().await;

    // search=Тверск&category=
    let uri = "/?search=%D0%A2%D0%B2%D0%B5%D1%80%D1%81%D0%BA&category=";
    let res = send(&app, get(uri, "")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["locations"].as_array().unwrap().len(), 1);
    assert_eq!(body["locations"][0]["discount"], "10%");
    assert_eq!(body["categories"], json!(["Аптека"]));
    assert_eq!(body["filter"]["search"], "Тверск");
    assert!(body["current_user"].is_null());

    let res = send(&app, get("/?category=%D0%9A%D0%B0%D1%84%D0%B5", "")).await;
    let body = json_body(res).await;
    assert!(body["locations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn map_lists_points_with_api_key() {
    let app = app().await;

    let body = json_body(send(&app, get("/map", "")).await).await;
    assert_eq!(body["total_points"], 1);
    assert_eq!(body["api_key"], "maps-key");
    assert_eq!(body["points"][0]["lat"], 55.76);
    assert_eq!(body["points"][0]["lon"], 37.61);
}

#[tokio::test]
async fn missing_location_is_404() {
    let app = app().await;

    let res = send(&app, get("/location/999", "")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await["error"], "not_found");
}

#[tokio::test]
async fn anonymous_detail_has_no_viewer_state() {
    let app = app().await;

    let res = send(&app, get("/location/1", "")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["location"]["name"], "Аптека на Тверской");
    assert_eq!(body["average_rating"], 0.0);
    assert!(body["is_favorite"].is_null());
    assert!(body["user_vote"].is_null());
}

#[tokio::test]
async fn anonymous_mutations_are_refused() {
    let app = app().await;

    let res = send(&app, post_form("/toggle_favorite/1", "", "")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await["error"], "unauthorized");

    let res = send(&app, post_form("/add_review/1", "", "text=hi&rating=4")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
    let notice = cookie_named(&res, NOTICE_COOKIE);

    let res = send(&app, get("/login", &notice)).await;
    let body = json_body(res).await;
    assert_eq!(body["notice"]["level"], "warning");
    assert_eq!(body["notice"]["message"], "Необходимо войти в систему");

    let body = json_body(send(&app, get("/location/1", "")).await).await;
    assert!(body["reviews"].as_array().unwrap().is_empty());

    let res = send(&app, get("/profile", "")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn registration_failures_return_the_form() {
    let app = app().await;
    login_alice(&app).await;

    let res = send(
        &app,
        post_form(
            "/register",
            "",
            "username=alice&email=other%40example.com&password=pw",
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(res).await;
    assert_eq!(
        body["notice"]["message"],
        "Пользователь с таким именем уже существует"
    );
    assert_eq!(body["username"], "alice");

    let res = send(
        &app,
        post_form(
            "/register",
            "",
            "username=bob&email=alice%40example.com&password=pw",
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json_body(res).await["notice"]["message"],
        "Пользователь с таким email уже существует"
    );

    let res = send(&app, post_form("/register", "", "username=bob&email=&password=pw")).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json_body(res).await["notice"]["message"],
        "Все поля обязательны для заполнения"
    );
}

#[tokio::test]
async fn wrong_password_gets_the_generic_notice() {
    let app = app().await;
    login_alice(&app).await;

    for body in ["username=alice&password=nope", "username=bob&password=secret"] {
        let res = send(&app, post_form("/login", "", body)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookies(&res).is_empty());
        assert_eq!(
            json_body(res).await["notice"]["message"],
            "Неверное имя пользователя или пароль"
        );
    }
}

#[tokio::test]
async fn forged_session_cookie_is_anonymous() {
    let app = app().await;

    let res = send(&app, get("/profile", &format!("{SESSION_COOKIE}=forged"))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn logged_in_user_reviews_votes_and_favorites() {
    let app = app().await;
    let session = login_alice(&app).await;

    let res = send(&app, post_form("/toggle_favorite/1", &session, "")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["status"], "added");
    assert_eq!(body["message"], "Добавлено в избранное");

    let res = send(&app, post_form("/toggle_favorite/999", &session, "")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = send(
        &app,
        post_form("/add_review/1", &session, "text=Отлично&rating=7"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/location/1");

    let res = send(&app, post_form("/add_review/1", &session, "text=++&rating=3")).await;
    assert_eq!(location(&res), "/location/1");
    let notice = cookie_named(&res, NOTICE_COOKIE);
    assert!(notice.ends_with("review_empty"));

    let res = send(&app, post_form("/vote_discount/1", &session, "is_valid=0")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/location/1");

    let cookies = format!("{session}; {notice}");
    let res = send(&app, get("/location/1", &cookies)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["current_user"], "alice");
    assert_eq!(body["notice"]["message"], "Отзыв не может быть пустым");
    assert_eq!(body["is_favorite"], true);
    assert_eq!(body["user_vote"], false);
    assert_eq!(body["votes"], json!({"valid": 0, "invalid": 1}));
    let reviews = body["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["rating"], 5);
    assert_eq!(reviews[0]["username"], "alice");
    assert_eq!(body["average_rating"], 5.0);

    let body = json_body(send(&app, get("/favorites", &session)).await).await;
    assert_eq!(body["locations"][0]["id"], 1);

    let body = json_body(send(&app, get("/profile", &session)).await).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["reviews_count"], 1);
    assert_eq!(body["favorites_count"], 1);

    let res = send(&app, post_form("/toggle_favorite/1", &session, "")).await;
    assert_eq!(json_body(res).await["status"], "removed");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = app().await;
    let session = login_alice(&app).await;

    let res = send(&app, get("/logout", &session)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    assert!(cookie_named(&res, NOTICE_COOKIE).ends_with("logged_out"));

    let res = send(&app, get("/profile", &session)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
}
