use super::*;
use quarry_query::{FieldPath, Ordering, Select};
use rstest::rstest;

fn col(name: &str) -> Expression {
	Expression::path(FieldPath::single(name))
}

fn op(operand: Expression, operator: Operator, args: Vec<Expression>) -> Expression {
	Expression::operate(operand, operator, args)
}

fn users() -> QueryStructure {
	QueryStructure::from_table("users")
}

// =============================================================================
// Clauses
// =============================================================================

#[rstest]
fn test_select_everything() {
	let (sql, params) = SqlRenderer::new(Dialect::Sqlite).render(&users()).unwrap();
	assert_eq!(sql, "SELECT * FROM \"users\"");
	assert!(params.is_empty());
}

#[rstest]
fn test_full_query_layout() {
	let count = op(Expression::constant(1), Operator::Count, vec![]);
	let query = users()
		.with_select(Select::tuple(vec![col("city"), count]).distinct())
		.and_where(op(col("age"), Operator::Ge, vec![Expression::constant(18)]))
		.add_group_by(col("city"))
		.and_having(op(
			op(Expression::constant(1), Operator::Count, vec![]),
			Operator::Gt,
			vec![Expression::constant(2)],
		))
		.add_order_by(Ordering::desc(col("city")))
		.with_offset(Some(20))
		.with_limit(Some(10));

	let (sql, _) = SqlRenderer::new(Dialect::Sqlite).render(&query).unwrap();
	assert_eq!(
		sql,
		"SELECT DISTINCT \"city\", COUNT(1) FROM \"users\" WHERE \"age\" >= 18 \
		 GROUP BY \"city\" HAVING COUNT(1) > 2 ORDER BY \"city\" DESC LIMIT 10 OFFSET 20"
	);
}

#[rstest]
fn test_values_are_bound_in_order() {
	let query = users().and_where(op(
		op(col("name"), Operator::Like, vec![Expression::constant("a%")]),
		Operator::And,
		vec![
			op(col("score"), Operator::Lt, vec![Expression::constant(2.5)]),
			op(col("active"), Operator::Eq, vec![Expression::constant(true)]),
			op(col("deleted_at"), Operator::IsNull, vec![]),
		],
	));

	let (sql, params) = SqlRenderer::new(Dialect::Postgres).render(&query).unwrap();
	assert_eq!(
		sql,
		"SELECT * FROM \"users\" WHERE \"name\" LIKE $1 AND \"score\" < $2 \
		 AND \"active\" = TRUE AND \"deleted_at\" IS NULL"
	);
	assert_eq!(params, vec![Value::from("a%"), Value::Double(2.5)]);
}

#[rstest]
fn test_sub_query_source_is_aliased() {
	let inner = users().add_group_by(col("city")).with_select(Select::scalar(col("city")));
	let (sql, _) = SqlRenderer::new(Dialect::Sqlite)
		.render(&inner.count_query())
		.unwrap();
	assert_eq!(
		sql,
		"SELECT COUNT(1) FROM (SELECT \"city\" FROM \"users\" GROUP BY \"city\") AS \"q0\""
	);
}

#[rstest]
fn test_distinct_count_keeps_distinct_inside_sub_query() {
	let genres = QueryStructure::from_table("books")
		.with_select(Select::scalar(col("genre")).distinct())
		.and_where(op(col("genre"), Operator::IsNotNull, vec![]));
	let (sql, _) = SqlRenderer::new(Dialect::Postgres)
		.render(&genres.count_query())
		.unwrap();
	assert_eq!(
		sql,
		"SELECT COUNT(1) FROM (SELECT DISTINCT \"genre\" FROM \"books\" \
		 WHERE \"genre\" IS NOT NULL) AS \"q0\""
	);
}

#[rstest]
#[case(Dialect::Sqlite, "SELECT * FROM \"users\" LIMIT -1 OFFSET 5")]
#[case(Dialect::Postgres, "SELECT * FROM \"users\" OFFSET 5")]
#[case(Dialect::Mysql, "SELECT * FROM `users` LIMIT 18446744073709551615 OFFSET 5")]
fn test_offset_without_limit(#[case] dialect: Dialect, #[case] expected: &str) {
	let (sql, _) = SqlRenderer::new(dialect)
		.render(&users().with_offset(Some(5)))
		.unwrap();
	assert_eq!(sql, expected);
}

#[rstest]
#[case(Dialect::Postgres, LockMode::PessimisticWrite, " FOR UPDATE")]
#[case(Dialect::Mysql, LockMode::PessimisticRead, " FOR SHARE")]
#[case(Dialect::Postgres, LockMode::PessimisticForceIncrement, " FOR UPDATE")]
#[case(Dialect::Postgres, LockMode::Optimistic, "")]
#[case(Dialect::Sqlite, LockMode::PessimisticWrite, "")]
fn test_lock_clause(#[case] dialect: Dialect, #[case] lock_mode: LockMode, #[case] suffix: &str) {
	let (sql, _) = SqlRenderer::new(dialect)
		.render(&users().with_limit(Some(1)).with_lock_mode(lock_mode))
		.unwrap();
	assert!(sql.ends_with(&format!("LIMIT 1{}", suffix)), "{}", sql);
}

// =============================================================================
// Expressions
// =============================================================================

#[rstest]
fn test_precedence_parentheses() {
	let ored = op(
		op(col("a"), Operator::Eq, vec![Expression::constant(1)]),
		Operator::Or,
		vec![op(col("b"), Operator::Eq, vec![Expression::constant(2)])],
	);
	let anded = op(
		ored,
		Operator::And,
		vec![op(col("c"), Operator::Eq, vec![Expression::constant(3)])],
	);

	let (sql, _) = SqlRenderer::new(Dialect::Sqlite)
		.render_expression(&anded)
		.unwrap();
	assert_eq!(sql, "(\"a\" = 1 OR \"b\" = 2) AND \"c\" = 3");
}

#[rstest]
fn test_nested_comparison_is_parenthesized() {
	let expr = op(
		op(col("a"), Operator::Gt, vec![Expression::constant(1)]),
		Operator::Eq,
		vec![Expression::constant(true)],
	);
	let (sql, params) = SqlRenderer::new(Dialect::Postgres).render_expression(&expr).unwrap();
	assert_eq!(sql, "(\"a\" > 1) = TRUE");
	assert!(params.is_empty());
}

#[rstest]
fn test_empty_in_lists() {
	let renderer = SqlRenderer::new(Dialect::Sqlite);
	let none = renderer
		.render_expression(&op(col("x"), Operator::In, vec![]))
		.unwrap();
	let all = renderer
		.render_expression(&op(col("x"), Operator::NotIn, vec![]))
		.unwrap();
	assert_eq!(none.0, "1 = 0");
	assert_eq!(all.0, "1 = 1");
}

#[rstest]
#[case(Dialect::Sqlite, "(\"first\" || $p || \"last\")")]
#[case(Dialect::Mysql, "CONCAT(`first`, $p, `last`)")]
fn test_concat_per_dialect(#[case] dialect: Dialect, #[case] expected: &str) {
	let expr = op(col("first"), Operator::Concat, vec![Expression::constant(" "), col("last")]);
	let (sql, params) = SqlRenderer::new(dialect).render_expression(&expr).unwrap();
	assert_eq!(sql, expected.replace("$p", "?"));
	assert_eq!(params, vec![Value::from(" ")]);
}

#[rstest]
fn test_negation_of_constant_is_wrapped() {
	let expr = op(Expression::constant(-5), Operator::Neg, vec![]);
	let (sql, _) = SqlRenderer::new(Dialect::Sqlite).render_expression(&expr).unwrap();
	assert_eq!(sql, "-(-5)");
}

#[rstest]
fn test_functions_and_between() {
	let expr = op(
		op(op(col("name"), Operator::Trim, vec![]), Operator::Lower, vec![]),
		Operator::Between,
		vec![Expression::constant("a"), Expression::constant("m")],
	);
	let (sql, params) = SqlRenderer::new(Dialect::Postgres).render_expression(&expr).unwrap();
	assert_eq!(sql, "LOWER(TRIM(\"name\")) BETWEEN $1 AND $2");
	assert_eq!(params.len(), 2);
}

// =============================================================================
// Unsupported constructs
// =============================================================================

#[rstest]
fn test_nested_paths_are_unsupported() {
	let path = Expression::path_of(["author", "name"]).unwrap();
	let query = users().and_where(op(path, Operator::Eq, vec![Expression::constant("x")]));
	let err = SqlRenderer::new(Dialect::Sqlite).render(&query).unwrap_err();
	assert!(matches!(err, QueryError::Unsupported(_)));
}

#[rstest]
fn test_fetch_is_unsupported() {
	let query = users().add_fetch(FieldPath::single("author"));
	let err = SqlRenderer::new(Dialect::Sqlite).render(&query).unwrap_err();
	assert!(matches!(err, QueryError::Unsupported(_)));
}
