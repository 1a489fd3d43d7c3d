use std::sync::Arc;

use sql_dal::{Criteria, DalError, Dialect, QueryBuilder, SqlValue, TableSchema};

fn schema() -> Arc<TableSchema> {
    Arc::new(
        TableSchema::new(
            "model_name",
            vec![
                "index".into(),
                "name".into(),
                "email".into(),
                "age".into(),
                "field".into(),
            ],
            Dialect::Mssql,
        )
        .with_primary_key("index"),
    )
}

fn builder() -> QueryBuilder {
    QueryBuilder::new(schema())
}

fn strict_builder() -> QueryBuilder {
    QueryBuilder::new(schema()).strict(true)
}

#[test]
fn empty_criteria_selects_everything() {
    let sql = builder().build(&Criteria::new()).unwrap();
    assert_eq!(sql, "SELECT * FROM [model_name];");
}

#[test]
fn bare_where_implies_select() {
    let sql = builder()
        .build(&Criteria::new().filter([("name", "Joseph")]))
        .unwrap();
    assert_eq!(sql, "SELECT * FROM [model_name] WHERE [name] = 'Joseph';");
}

#[test]
fn select_list_joins_without_spaces() {
    let sql = builder()
        .build(&Criteria::select(vec!["name", "email"]).filter([("age", 21)]))
        .unwrap();
    assert_eq!(
        sql,
        "SELECT [name],[email] FROM [model_name] WHERE [age] = 21;"
    );
}

#[test]
fn select_list_with_only_unknown_columns_falls_back_to_star() {
    let sql = builder()
        .build(&Criteria::select(vec!["bogus", "missing"]))
        .unwrap();
    assert_eq!(sql, "SELECT * FROM [model_name];");
}

#[test]
fn raw_select_list_passes_through_for_aliasing() {
    let sql = builder()
        .build(&Criteria::select("name AS who, age"))
        .unwrap();
    assert_eq!(sql, "SELECT name AS who, age FROM [model_name];");
}

#[test]
fn where_predicates_join_with_and_in_input_order() {
    let sql = builder()
        .build(&Criteria::new().filter([("name", SqlValue::from("Joseph")), ("age", 30.into())]))
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM [model_name] WHERE [name] = 'Joseph' AND [age] = 30;"
    );
}

#[test]
fn where_key_carries_operator_after_first_space() {
    let sql = builder()
        .build(&Criteria::new().filter([
            ("name <>", SqlValue::from("john")),
            ("age not in", vec![21, 30].into()),
        ]))
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM [model_name] WHERE [name] <> 'john' AND [age] not in (21,30);"
    );
}

#[test]
fn list_value_defaults_to_in_with_parentheses() {
    let sql = builder()
        .build(&Criteria::new().filter([("name", SqlValue::from(vec!["john", "jane"]))]))
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM [model_name] WHERE [name] IN ('john','jane');"
    );
}

#[test]
fn null_value_defaults_to_is() {
    let sql = builder()
        .build(&Criteria::new().filter([("email", SqlValue::Null)]))
        .unwrap();
    assert_eq!(sql, "SELECT * FROM [model_name] WHERE [email] IS NULL;");
}

#[test]
fn null_comparison_ignores_an_explicit_operator() {
    // `<> NULL` is always UNKNOWN and would silently match nothing.
    let sql = builder()
        .build(&Criteria::new().filter([("age <>", SqlValue::Null)]))
        .unwrap();
    assert_eq!(sql, "SELECT * FROM [model_name] WHERE [age] IS NULL;");
}

#[test]
fn booleans_render_as_bits() {
    let sql = builder()
        .build(&Criteria::new().filter([("field", true)]))
        .unwrap();
    assert_eq!(sql, "SELECT * FROM [model_name] WHERE [field] = 1;");
}

#[test]
fn unknown_where_columns_are_dropped_when_lenient() {
    let sql = builder()
        .build(&Criteria::new().filter([
            ("name", SqlValue::from("Joseph")),
            ("bogus", SqlValue::from(1)),
        ]))
        .unwrap();
    assert_eq!(sql, "SELECT * FROM [model_name] WHERE [name] = 'Joseph';");
}

#[test]
fn all_predicates_dropped_is_an_error() {
    let err = builder()
        .build(&Criteria::new().filter([("bogus", 1)]))
        .unwrap_err();
    assert!(matches!(err, DalError::EmptyPredicate));
}

#[test]
fn strict_mode_refuses_unknown_where_column() {
    let err = strict_builder()
        .build(&Criteria::new().filter([("bogus", 1)]))
        .unwrap_err();
    assert!(matches!(err, DalError::StrictValidation(col) if col == "bogus"));
}

#[test]
fn limit_offset_and_order_render_in_fixed_positions() {
    let sql = builder()
        .build(
            &Criteria::new()
                .filter([("age >", 21)])
                .order("name DESC")
                .limit(10)
                .offset(5),
        )
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM [model_name] WHERE [age] > 21 ORDER BY name DESC LIMIT 10 OFFSET 5;"
    );
}

#[test]
fn zero_limit_and_offset_are_dropped() {
    let sql = builder()
        .build(&Criteria::new().limit(0).offset(0))
        .unwrap();
    assert_eq!(sql, "SELECT * FROM [model_name];");
}

#[test]
fn order_by_terms_join_with_commas() {
    let sql = builder()
        .build(&Criteria::new().order_by(["name", "age DESC"]))
        .unwrap();
    assert_eq!(sql, "SELECT * FROM [model_name] ORDER BY name,age DESC;");
}

#[test]
fn page_computes_limit_and_offset() {
    let sql = builder().build(&Criteria::new().page(2, 25)).unwrap();
    assert_eq!(sql, "SELECT * FROM [model_name] LIMIT 25 OFFSET 50;");
}

#[test]
fn page_overrides_explicit_limit_and_offset() {
    let sql = builder()
        .build(&Criteria::new().limit(3).offset(7).page_pair([1, 10]))
        .unwrap();
    assert_eq!(sql, "SELECT * FROM [model_name] LIMIT 10 OFFSET 10;");
}

#[test]
fn insert_carries_implicit_primary_key_output() {
    let sql = builder()
        .build(&Criteria::insert([("index", "1234"), ("name", "Joseph")]))
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO [model_name]([index], [name]) OUTPUT inserted.[index] VALUES ('1234', 'Joseph');"
    );
}

#[test]
fn insert_with_explicit_returning_columns() {
    let sql = builder()
        .build(
            &Criteria::insert([("index", "1234"), ("name", "Joseph")])
                .returning(vec!["index", "name"]),
        )
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO [model_name]([index], [name]) OUTPUT inserted.[index], inserted.[name] VALUES ('1234', 'Joseph');"
    );
}

#[test]
fn multi_row_insert_uses_first_row_field_list() {
    let sql = builder()
        .build(&Criteria::insert_many([
            vec![("index", "1"), ("name", "Joseph")],
            vec![("index", "2"), ("name", "Jane")],
        ]))
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO [model_name]([index], [name]) OUTPUT inserted.[index] VALUES ('1', 'Joseph'), ('2', 'Jane');"
    );
}

#[test]
fn insert_renders_missing_fields_as_null() {
    let sql = builder()
        .build(&Criteria::insert_many([
            vec![("index", "1"), ("name", "Joseph")],
            vec![("index", "2")],
        ]))
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO [model_name]([index], [name]) OUTPUT inserted.[index] VALUES ('1', 'Joseph'), ('2', NULL);"
    );
}

#[test]
fn insert_drops_unknown_columns_when_lenient() {
    let sql = builder()
        .build(&Criteria::insert([("index", "1"), ("bogus", "x")]))
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO [model_name]([index]) OUTPUT inserted.[index] VALUES ('1');"
    );
}

#[test]
fn strict_mode_refuses_unknown_insert_column() {
    let err = strict_builder()
        .build(&Criteria::insert([("index", "1"), ("bogus", "x")]))
        .unwrap_err();
    assert!(matches!(err, DalError::StrictValidation(col) if col == "bogus"));
}

#[test]
fn update_assignments_render_in_reverse_input_order() {
    let sql = builder()
        .build(
            &Criteria::update([("index", "1234"), ("name", "Joseph")])
                .filter([("index", "1234")]),
        )
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE [model_name] SET [name] = 'Joseph', [index] = '1234' WHERE [index] = '1234';"
    );
}

#[test]
fn update_without_where_is_allowed_when_lenient() {
    let sql = builder()
        .build(&Criteria::update([("name", "Joseph")]))
        .unwrap();
    assert_eq!(sql, "UPDATE [model_name] SET [name] = 'Joseph';");
}

#[test]
fn strict_mode_refuses_update_without_where() {
    let err = strict_builder()
        .build(&Criteria::update([("name", "Joseph")]))
        .unwrap_err();
    assert!(matches!(err, DalError::MissingWhere("UPDATE")));
}

#[test]
fn delete_all_is_unconditional() {
    let sql = builder().build(&Criteria::delete_all()).unwrap();
    assert_eq!(sql, "DELETE FROM [model_name];");
}

#[test]
fn delete_with_predicates() {
    let sql = builder()
        .build(&Criteria::delete([
            ("name", SqlValue::from("Joseph")),
            ("age", 30.into()),
        ]))
        .unwrap();
    assert_eq!(
        sql,
        "DELETE FROM [model_name] WHERE [name] = 'Joseph' AND [age] = 30;"
    );
}

#[test]
fn strict_mode_refuses_delete_without_where() {
    let err = strict_builder().build(&Criteria::delete_all()).unwrap_err();
    assert!(matches!(err, DalError::MissingWhere("DELETE")));
}

#[test]
fn builder_is_reusable_across_builds() {
    let b = builder();
    let criteria = Criteria::new().filter([("name", "Joseph")]);
    let first = b.build(&criteria).unwrap();
    let second = b.build(&criteria).unwrap();
    assert_eq!(first, second);
}

#[test]
fn prepare_peek_matches_build() {
    let b = builder();
    let criteria = Criteria::select(vec!["name"]).filter([("age >=", 18)]).order("age");
    let buffer = b.prepare(&criteria).unwrap();
    assert_eq!(buffer.peek_sql(), b.build(&criteria).unwrap());
}
