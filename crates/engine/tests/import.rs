use encoding_rs::WINDOWS_1251;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use serde_json::{Value, json};

use engine::{Engine, EngineError, IMPORT_BATCH_SIZE, SkipReason, decode_feed, locations};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .password_cost(4)
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn pharmacy(name: &str) -> Value {
    json!({
        "Name": name,
        "Address": "ул. Тверская, 5, Москва",
        "Category": "Аптека",
        "MinDiscountSize": "10%",
        "geoData": { "coordinates": [37.61, 55.76] }
    })
}

#[tokio::test]
async fn admitted_records_become_locations() {
    let (engine, db) = engine_with_db().await;

    let mut outside = pharmacy("Аптека Невская");
    outside["Address"] = json!("Невский пр., 1, Санкт-Петербург");
    let records = vec![pharmacy("Аптека Тверская"), outside, json!("garbage")];

    let report = engine.import_locations(&records).await.unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.skipped_by_reason[&SkipReason::OutsideCity], 1);
    assert_eq!(report.skipped_by_reason[&SkipReason::NotAnObject], 1);

    let stored = locations::Entity::find().all(&db).await.unwrap();
    assert_eq!(stored.len(), 1);
    let location = engine::Location::from(stored[0].clone());
    assert_eq!(location.name, "Аптека Тверская");
    assert_eq!(location.discount_min, Some(10.0));
    assert_eq!(location.discount_display(), "10%");
    assert_eq!(location.coordinates(), Some((55.76, 37.61)));
}

#[tokio::test]
async fn rerunning_the_same_feed_adds_nothing() {
    let (engine, db) = engine_with_db().await;
    let records = vec![pharmacy("Аптека 1"), pharmacy("Аптека 2")];

    let first = engine.import_locations(&records).await.unwrap();
    assert_eq!(first.added, 2);

    let second = engine.import_locations(&records).await.unwrap();
    assert_eq!(second.added, 0);
    assert_eq!(second.skipped_by_reason[&SkipReason::Duplicate], 2);
    assert_eq!(locations::Entity::find().count(&db).await.unwrap(), 2);
}

#[tokio::test]
async fn duplicates_within_one_feed_are_skipped() {
    let (engine, _db) = engine_with_db().await;
    let records = vec![pharmacy("Аптека"), pharmacy("Аптека")];

    let report = engine.import_locations(&records).await.unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(report.skipped_by_reason[&SkipReason::Duplicate], 1);
}

#[tokio::test]
async fn large_feeds_span_several_batches() {
    let (engine, db) = engine_with_db().await;
    let total = IMPORT_BATCH_SIZE * 2 + 7;
    let records: Vec<_> = (0..total)
        .map(|i| pharmacy(&format!("Аптека №{i}")))
        .collect();

    let report = engine.import_locations(&records).await.unwrap();
    assert_eq!(report.added, total);
    assert_eq!(report.skipped, 0);
    assert_eq!(
        locations::Entity::find().count(&db).await.unwrap(),
        total as u64
    );
}

#[tokio::test]
async fn failed_insert_keeps_only_committed_batches() {
    let (engine, db) = engine_with_db().await;
    db.execute_unprepared(
        "CREATE TRIGGER fail_import BEFORE INSERT ON locations \
         WHEN NEW.name = 'Аптека №150' \
         BEGIN SELECT RAISE(ABORT, 'import failure'); END;",
    )
    .await
    .unwrap();

    let records: Vec<_> = (0..IMPORT_BATCH_SIZE * 2)
        .map(|i| pharmacy(&format!("Аптека №{i}")))
        .collect();

    let err = engine.import_locations(&records).await.unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));

    let names: Vec<String> = locations::Entity::find()
        .all(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|location| location.name)
        .collect();
    assert_eq!(names.len(), IMPORT_BATCH_SIZE);
    for i in 0..IMPORT_BATCH_SIZE {
        assert!(names.contains(&format!("Аптека №{i}")));
    }
    for i in IMPORT_BATCH_SIZE..150 {
        assert!(!names.contains(&format!("Аптека №{i}")));
    }
}

#[tokio::test]
async fn records_without_discount_are_skipped() {
    let (engine, _db) = engine_with_db().await;
    let record = json!({
        "Name": "Кафе",
        "Address": "Москва, Арбат, 1",
        "Category": "Кафе"
    });

    let report = engine.import_locations(&[record]).await.unwrap();
    assert_eq!(report.added, 0);
    assert_eq!(report.skipped_by_reason[&SkipReason::NoDiscount], 1);
}

#[test]
fn feed_is_decoded_from_windows_1251() {
    let text = r#"[{"Name": "Аптека", "Address": "Москва"}]"#;
    let (bytes, _, _) = WINDOWS_1251.encode(text);

    let records = decode_feed(&bytes).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["Name"], "Аптека");
}

#[test]
fn feed_must_be_an_array() {
    let err = decode_feed(br#"{"Name": "x"}"#).unwrap_err();
    assert!(matches!(err, EngineError::InvalidFeed(_)));

    let err = decode_feed(b"[{").unwrap_err();
    assert!(matches!(err, EngineError::InvalidFeed(_)));
}
