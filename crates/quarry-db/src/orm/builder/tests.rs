use super::*;
use quarry_query::Selection;
use rstest::rstest;

struct Publisher;
struct User;

impl Publisher {
	const NAME: Field<Publisher, String> = Field::new("name");
}

impl User {
	const NAME: Field<User, String> = Field::new("name");
	const AGE: Field<User, i32> = Field::new("age");
	const CITY: Field<User, Option<String>> = Field::new("city");
	const EMPLOYER: Field<User, Publisher> = Field::new("employer");
}

impl Model for Publisher {
	fn table_name() -> &'static str {
		"publishers"
	}
}

impl Model for User {
	fn table_name() -> &'static str {
		"users"
	}
}

fn users() -> QueryBuilder<User> {
	QueryBuilder::new()
}

// =============================================================================
// Filter chains
// =============================================================================

#[rstest]
fn test_new_builder_selects_everything() {
	let builder = users();
	assert_eq!(builder.structure().to_string(), "select * from users");
	assert_eq!(builder.pending_clause(), None);
}

#[rstest]
fn test_chain_stays_open_until_read() {
	let builder = users().filter(User::AGE).gt(18);
	assert_eq!(builder.pending_clause(), Some(Clause::Where));
	assert_eq!(
		builder.structure().to_string(),
		"select * from users where age > 18"
	);
}

#[rstest]
fn test_chain_groups_left_to_right() {
	let builder = users()
		.filter(User::AGE)
		.gt(18)
		.and(User::NAME)
		.ne("root")
		.or(User::CITY)
		.is_null();

	assert_eq!(
		builder.structure().where_clause().to_string(),
		"age > 18 AND name <> 'root' OR city IS NULL"
	);
}

#[rstest]
fn test_second_filter_ands_a_new_group() {
	let builder = users()
		.filter(User::AGE)
		.eq(1)
		.or(User::AGE)
		.eq(2)
		.filter(User::NAME)
		.eq("x");

	assert_eq!(
		builder.structure().where_clause().to_string(),
		"(age = 1 OR age = 2) AND name = 'x'"
	);
}

#[rstest]
fn test_chain_survives_non_filter_methods() {
	let builder = users()
		.filter(User::AGE)
		.eq(1)
		.or(User::AGE)
		.eq(2)
		.order_by(User::NAME.asc())
		.and(User::NAME)
		.eq("x");

	assert_eq!(
		builder.structure().to_string(),
		"select * from users where age = 1 OR age = 2 AND name = 'x' orderBy name asc"
	);
}

#[rstest]
fn test_and_without_open_chain_seeds_from_where() {
	let first = users().filter(User::AGE).gt(1);
	let settled = QueryBuilder::<User>::from_structure(first.structure());
	let extended = settled.or(User::AGE).lt(0);

	assert_eq!(
		extended.structure().where_clause().to_string(),
		"age > 1 OR age < 0"
	);
	assert_eq!(
		users().and(User::AGE).eq(3).structure().where_clause().to_string(),
		"age = 3"
	);
}

#[rstest]
fn test_not_negates_open_chain() {
	let builder = users()
		.filter(User::AGE)
		.lt(18)
		.or(User::AGE)
		.gt(65)
		.not();

	assert_eq!(
		builder.structure().where_clause().to_string(),
		"NOT (age < 18 OR age > 65)"
	);
	let plain = users().filter(User::AGE).lt(18).or(User::AGE).gt(65);
	assert_eq!(builder.not().structure(), plain.structure());
}

#[rstest]
fn test_not_without_filter_keeps_every_row() {
	let negated = users().not();

	assert_eq!(negated.structure().to_string(), "select * from users");
	assert!(negated.structure().where_clause().is_true_literal());
	assert_eq!(negated.pending_clause(), None);
	assert_eq!(
		negated.filter(User::AGE).gt(1).structure().where_clause().to_string(),
		"age > 1"
	);
}

#[rstest]
fn test_predicates_are_grouped() {
	let young_or_old = Predicate::of(User::AGE).lt(18).or(User::AGE).gt(65);
	let builder = users().filter(User::NAME).like("a%").and_where(&young_or_old);

	assert_eq!(
		builder.structure().where_clause().to_string(),
		"name LIKE 'a%' AND (age < 18 OR age > 65)"
	);

	let by = users().filter_by(&young_or_old).filter_by(&Predicate::of(User::NAME).eq("b"));
	assert_eq!(
		by.structure().where_clause().to_string(),
		"(age < 18 OR age > 65) AND name = 'b'"
	);
}

#[rstest]
fn test_or_where_closes_group() {
	let builder = users()
		.filter(User::AGE)
		.eq(1)
		.or_where(&Predicate::of(User::NAME).eq("a").and(User::CITY).eq("b"));

	assert_eq!(
		builder.structure().where_clause().to_string(),
		"age = 1 OR name = 'a' AND city = 'b'"
	);
}

#[rstest]
fn test_relation_navigation_in_filter() {
	let builder = users()
		.filter(User::EMPLOYER)
		.get(Publisher::NAME)
		.unwrap()
		.eq("acme");
	assert_eq!(
		builder.structure().where_clause().to_string(),
		"employer.name = 'acme'"
	);
}

// =============================================================================
// Copy-on-write
// =============================================================================

#[rstest]
fn test_branches_do_not_share_state() {
	let base = users().filter(User::AGE).ge(18);
	let by_name = base.and(User::NAME).eq("ann");
	let paged = base.offset(10).limit(5);
	let locked = base.lock(LockMode::PessimisticWrite);

	assert_eq!(base.structure().to_string(), "select * from users where age >= 18");
	assert_eq!(
		by_name.structure().to_string(),
		"select * from users where age >= 18 AND name = 'ann'"
	);
	assert_eq!(
		paged.structure().to_string(),
		"select * from users where age >= 18 offset 10 limit 5"
	);
	assert_eq!(locked.structure().lock_mode(), LockMode::PessimisticWrite);
	assert_eq!(base.structure().lock_mode(), LockMode::None);
}

// =============================================================================
// Projections, grouping, fetch
// =============================================================================

#[rstest]
fn test_scalar_and_tuple_projections() {
	let names: QueryBuilder<User, String> = users().select(User::NAME);
	assert_eq!(names.structure().to_string(), "select name from users");

	let pairs: QueryBuilder<User, (String, i32)> = users().select((User::NAME, User::AGE));
	assert_eq!(
		pairs.structure().select().selection,
		Selection::Tuple(vec![User::NAME.expression(), User::AGE.expression()])
	);

	let cities: QueryBuilder<User, Option<String>> = users().select_distinct(User::CITY);
	assert_eq!(cities.structure().to_string(), "select distinct city from users");
}

#[rstest]
fn test_projection_keeps_open_chain() {
	let builder = users().filter(User::AGE).gt(1).select(User::AGE.max());
	assert_eq!(
		builder.structure().to_string(),
		"select MAX(age) from users where age > 1"
	);
}

#[rstest]
fn test_group_by_and_having() {
	let builder = users()
		.select((User::CITY, Typed::<User, i64>::count_all()))
		.group_by(User::CITY)
		.having(Typed::<User, i64>::count_all())
		.gt(2i64);
	let structure = builder.structure();

	assert_eq!(builder.pending_clause(), Some(Clause::Having));
	assert_eq!(
		structure.to_string(),
		"select city, COUNT(1) from users group by city having COUNT(1) > 2"
	);
	assert!(structure.requires_sub_query_count());
}

#[rstest]
fn test_fetch_is_deduplicated() {
	let builder = users().fetch(User::EMPLOYER).fetch(User::EMPLOYER);
	assert_eq!(builder.structure().fetch().len(), 1);
	assert_eq!(
		builder.structure().to_string(),
		"select * fetch employer from users"
	);
}
