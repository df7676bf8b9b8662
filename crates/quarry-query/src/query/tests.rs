use super::*;
use crate::ordering::Ordering;
use rstest::{fixture, rstest};

fn path(name: &str) -> Expression {
	Expression::path(FieldPath::single(name))
}

fn cmp(name: &str, operator: Operator, value: i32) -> Expression {
	Expression::operate(path(name), operator, vec![Expression::constant(value)])
}

#[fixture]
fn base() -> QueryStructure {
	QueryStructure::from_table("users")
		.and_where(cmp("age", Operator::Gt, 18))
		.add_order_by(Ordering::asc(path("name")))
}

// =============================================================================
// Copy-on-write
// =============================================================================

#[rstest]
fn test_branches_do_not_share_state(base: QueryStructure) {
	let snapshot = base.clone();
	let left = base.and_where(cmp("id", Operator::Eq, 1));
	let right = base.and_where(cmp("id", Operator::Eq, 2));

	assert_eq!(base, snapshot);
	assert_ne!(left.where_clause(), right.where_clause());
	assert_eq!(left.to_string(), "select * from users where age > 18 AND id = 1 orderBy name asc");
	assert_eq!(right.to_string(), "select * from users where age > 18 AND id = 2 orderBy name asc");
}

#[rstest]
fn test_defaults() {
	let q = QueryStructure::from_table("users");

	assert!(q.where_clause().is_true_literal());
	assert!(q.having().is_true_literal());
	assert_eq!(q.select(), &Select::entity());
	assert_eq!(q.lock_mode(), LockMode::None);
	assert_eq!(q.to_string(), "select * from users");
}

#[rstest]
fn test_fetch_deduplicates_by_identity() {
	let author = FieldPath::new(["author"]).unwrap();
	let q = QueryStructure::from_table("books")
		.add_fetch(author.clone())
		.add_fetch(FieldPath::single("author"))
		.add_fetch(author.concat(&FieldPath::single("publisher")));

	assert_eq!(q.fetch().len(), 2);
	assert_eq!(q.to_string(), "select * fetch author, author.publisher from books");
}

// =============================================================================
// Terminal derivations
// =============================================================================

#[rstest]
fn test_plain_count_drops_order_paging_and_lock(base: QueryStructure) {
	let paged = base
		.with_offset(Some(20))
		.with_limit(Some(10))
		.with_lock_mode(LockMode::PessimisticWrite);
	let count = paged.count_query();

	assert!(!paged.requires_sub_query_count());
	assert_eq!(count.to_string(), "select COUNT(1) from users where age > 18");
	assert_eq!(count.lock_mode(), LockMode::None);
	assert!(count.order_by().is_empty());
}

#[rstest]
fn test_grouped_count_is_promoted(base: QueryStructure) {
	let grouped = base
		.with_select(Select::scalar(path("city")))
		.add_group_by(path("city"));
	let count = grouped.count_query();

	assert!(grouped.requires_sub_query_count());
	assert!(matches!(count.source(), Source::SubQuery(_)));
	assert_eq!(
		count.to_string(),
		"select COUNT(1) from (select city from users where age > 18 group by city)"
	);
}

#[rstest]
fn test_aggregate_having_requires_promotion() {
	let count_ids = Expression::operate(path("id"), Operator::Count, vec![]);
	let q = QueryStructure::from_table("orders").and_having(Expression::operate(
		count_ids,
		Operator::Gt,
		vec![Expression::constant(2)],
	));

	assert!(q.requires_sub_query_count());
}

#[rstest]
fn test_aggregate_select_requires_promotion() {
	let total = Expression::operate(path("amount"), Operator::Sum, vec![]);
	let q = QueryStructure::from_table("orders").with_select(Select::scalar(total));

	assert!(q.requires_sub_query_count());
	assert_eq!(
		q.count_query().to_string(),
		"select COUNT(1) from (select SUM(amount) from orders)"
	);
}

#[rstest]
fn test_distinct_count_is_promoted(base: QueryStructure) {
	let cities = base
		.with_select(Select::scalar(path("city")).distinct())
		.with_limit(Some(3));
	let count = cities.count_query();

	assert!(cities.requires_sub_query_count());
	assert_eq!(
		count.to_string(),
		"select COUNT(1) from (select distinct city from users where age > 18)"
	);
}

#[rstest]
#[case(0, "select 1 from users where age > 18 limit 1")]
#[case(5, "select 1 from users where age > 18 offset 5 limit 1")]
fn test_exist_query(base: QueryStructure, #[case] offset: u64, #[case] expected: &str) {
	let q = base.add_fetch(FieldPath::single("profile")).exist_query(offset);

	assert_eq!(q.to_string(), expected);
	assert!(q.fetch().is_empty());
}

#[rstest]
fn test_distinct_exist_skips_distinct_rows(base: QueryStructure) {
	let q = base
		.with_select(Select::scalar(path("city")).distinct())
		.exist_query(2);

	assert!(matches!(q.source(), Source::SubQuery(_)));
	assert_eq!(
		q.to_string(),
		"select 1 from (select distinct city from users where age > 18) offset 2 limit 1"
	);
}

#[rstest]
fn test_list_query_applies_paging_verbatim(base: QueryStructure) {
	let q = base.list_query(Some(10), Some(5), LockMode::PessimisticRead);

	assert_eq!(
		q.to_string(),
		"select * from users where age > 18 orderBy name asc offset 10 limit 5 lock(PESSIMISTIC_READ)"
	);
	assert_eq!(base.offset(), None);
}

#[rstest]
fn test_full_display() {
	let total = Expression::operate(path("amount"), Operator::Sum, vec![]);
	let q = QueryStructure::from_table("orders")
		.with_select(Select::tuple(vec![path("city"), total]).distinct())
		.and_where(cmp("amount", Operator::Ge, 10))
		.add_group_by(path("city"))
		.and_having(Expression::operate(
			Expression::operate(path("amount"), Operator::Sum, vec![]),
			Operator::Gt,
			vec![Expression::constant(100)],
		))
		.add_order_by(Ordering::desc(path("city")));

	assert_eq!(
		q.to_string(),
		"select distinct city, SUM(amount) from orders where amount >= 10 group by city having SUM(amount) > 100 orderBy city desc"
	);
	assert_eq!(q.root_table(), "orders");
	assert_eq!(q.count_query().root_table(), "orders");
}
