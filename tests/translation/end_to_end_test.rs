use nlsql::engine::LocalGenerator;
use nlsql::result::{ErrorKind, TranslationResult};
use nlsql::schema::Schema;
use nlsql::sql::validate_sql;

fn demo_schema() -> Schema {
    Schema::from_json(include_str!("../../demos/schema.json")).unwrap()
}

fn translate(prompt: &str) -> TranslationResult {
    LocalGenerator::new().translate(prompt, &demo_schema())
}

fn sql_of(result: &TranslationResult) -> &str {
    match result {
        TranslationResult::Success(t) => &t.sql,
        TranslationResult::Failure(f) => panic!("expected success, got {:?}", f),
    }
}

#[test]
fn test_like_filter_on_single_entity() {
    let result = translate("show users with email containing gmail");

    insta::assert_snapshot!(sql_of(&result), @r#"
    SELECT u.email
    FROM "user" u
    WHERE
      u.email LIKE '%gmail%'
    "#);
    assert!(result.confidence() >= 0.7);
    assert!((result.confidence() - 0.9).abs() < 1e-9);
    assert!(validate_sql(sql_of(&result)).is_ok());
}

#[test]
fn test_join_from_owning_side() {
    let result = translate("show orders where email of users = bob");

    insta::assert_snapshot!(sql_of(&result), @r#"
    SELECT u.email
    FROM purchase_order o
    INNER JOIN "user" u ON o.customer_id = u.id
    WHERE
      u.email = 'bob'
    "#);
    let TranslationResult::Success(t) = &result else {
        unreachable!()
    };
    assert_eq!(t.entities, vec!["Order", "User"]);
    assert_eq!(t.paths, vec!["Order → User"]);
    assert!(validate_sql(&t.sql).is_ok());
}

#[test]
fn test_join_through_collection() {
    let result = translate("show users where total of orders > 100");

    insta::assert_snapshot!(sql_of(&result), @r#"
    SELECT o.total
    FROM "user" u
    INNER JOIN purchase_order o ON o.customer_id = u.id
    WHERE
      o.total > 100
    "#);
    assert!(validate_sql(sql_of(&result)).is_ok());
}

#[test]
fn test_alias_names_an_entity() {
    let result = translate("show member where age >= 18");

    insta::assert_snapshot!(sql_of(&result), @r#"
    SELECT u.age
    FROM "user" u
    WHERE
      u.age >= 18
    "#);
}

#[test]
fn test_unrelated_entity_has_no_path() {
    let result = translate("show users where city = paris");

    assert_eq!(result.error(), Some(&ErrorKind::NoPathFound));
    assert!(result.sql().is_none());
}

#[test]
fn test_unknown_entity_suggests_schema_names() {
    let TranslationResult::Failure(f) = translate("how is the weather today") else {
        panic!("expected failure");
    };

    assert_eq!(f.error, ErrorKind::EntityNotFound);
    assert_eq!(f.suggestions, vec!["User", "Order", "Warehouse"]);
    assert_eq!(f.provider, "local");
}

#[test]
fn test_result_json_shape() {
    let json = translate("show users with email containing gmail").to_json();

    assert_eq!(json["success"], serde_json::json!(true));
    assert_eq!(json["provider"], serde_json::json!("local"));
    assert_eq!(json["entities"], serde_json::json!(["User"]));
    assert!(json.get("error").is_none());
}
