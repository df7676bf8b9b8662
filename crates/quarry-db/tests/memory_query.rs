//! Terminal operations of the query builder, evaluated in memory.

use proptest::prelude::*;
use quarry_db::prelude::*;
use quarry_query::Source;
use rstest::{fixture, rstest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Book {
	title: String,
	pages: i32,
	genre: Option<String>,
}

impl Book {
	const TITLE: Field<Book, String> = Field::new("title");
	const PAGES: Field<Book, i32> = Field::new("pages");
	const GENRE: Field<Book, Option<String>> = Field::new("genre");
}

impl Model for Book {
	fn table_name() -> &'static str {
		"books"
	}
}

fn book(title: &str, pages: i32, genre: Option<&str>) -> Book {
	Book {
		title: title.to_string(),
		pages,
		genre: genre.map(str::to_string),
	}
}

#[fixture]
fn shelf() -> MemoryExecutor {
	let executor = MemoryExecutor::new();
	executor
		.insert(&[
			book("dune", 412, Some("scifi")),
			book("emma", 474, Some("novel")),
			book("hyperion", 482, Some("scifi")),
			book("ubik", 202, Some("scifi")),
			book("walden", 352, None),
		])
		.unwrap();
	executor
}

fn books() -> QueryBuilder<Book> {
	QueryBuilder::new()
}

// =============================================================================
// Consistency of count, list and exist
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_count_list_and_exist_agree(shelf: MemoryExecutor) {
	let scifi = books().filter(Book::GENRE).eq("scifi");

	let count = scifi.count(&shelf).await.unwrap();
	let listed = scifi.list(&shelf).await.unwrap();
	assert_eq!(count, 3);
	assert_eq!(listed.len() as u64, count);
	assert!(scifi.exist(&shelf, 0).await.unwrap());
	assert!(scifi.exist(&shelf, 2).await.unwrap());
	assert!(!scifi.exist(&shelf, 3).await.unwrap());
}

#[rstest]
#[tokio::test]
async fn test_distinct_count_matches_distinct_rows(shelf: MemoryExecutor) {
	let genres = books().filter(Book::GENRE).is_not_null().select_distinct(Book::GENRE);

	let listed = genres.list(&shelf).await.unwrap();
	assert_eq!(listed.len(), 2);
	assert_eq!(genres.count(&shelf).await.unwrap(), 2);
	assert!(genres.exist(&shelf, 1).await.unwrap());
	assert!(!genres.exist(&shelf, 2).await.unwrap());

	let page = genres.slice(&shelf, 0, 1).await.unwrap();
	assert_eq!(page.total, 2);
	assert!(page.has_next());
}

#[rstest]
#[tokio::test]
async fn test_list_decodes_entities_in_order(shelf: MemoryExecutor) {
	let thick = books()
		.filter(Book::PAGES)
		.gt(400)
		.order_by(Book::PAGES.desc())
		.list(&shelf)
		.await
		.unwrap();
	assert_eq!(
		thick,
		vec![
			book("hyperion", 482, Some("scifi")),
			book("emma", 474, Some("novel")),
			book("dune", 412, Some("scifi")),
		]
	);
}

#[rstest]
#[tokio::test]
async fn test_projections(shelf: MemoryExecutor) {
	let titles: Vec<String> = books()
		.filter(Book::GENRE)
		.is_null()
		.select(Book::TITLE)
		.list(&shelf)
		.await
		.unwrap();
	assert_eq!(titles, vec!["walden".to_string()]);

	let pairs: Vec<(String, i32)> = books()
		.filter(Book::PAGES)
		.lt(300)
		.select((Book::TITLE, Book::PAGES))
		.list(&shelf)
		.await
		.unwrap();
	assert_eq!(pairs, vec![("ubik".to_string(), 202)]);

	let genres: Vec<Option<String>> = books()
		.select_distinct(Book::GENRE)
		.order_by(Book::GENRE.asc())
		.list(&shelf)
		.await
		.unwrap();
	assert_eq!(genres, vec![None, Some("novel".into()), Some("scifi".into())]);
}

#[rstest]
#[tokio::test]
async fn test_aggregate_count_uses_sub_query(shelf: MemoryExecutor) {
	let longest = books().select(Book::PAGES.max());
	let pages: Vec<i32> = longest.list(&shelf).await.unwrap();
	assert_eq!(pages, vec![482]);

	shelf.clear_served();
	assert_eq!(longest.count(&shelf).await.unwrap(), 1);
	let served = shelf.served();
	assert!(matches!(served[0].source(), Source::SubQuery(_)));
}

// =============================================================================
// first, single and slice
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_first_and_single(shelf: MemoryExecutor) {
	let shortest = books()
		.order_by(Book::PAGES.asc())
		.first(&shelf)
		.await
		.unwrap();
	assert_eq!(shortest.map(|b| b.title), Some("ubik".to_string()));

	let emma = books().filter(Book::TITLE).eq("emma").single(&shelf).await.unwrap();
	assert_eq!(emma.map(|b| b.pages), Some(474));

	let none = books().filter(Book::TITLE).eq("ulysses").single(&shelf).await.unwrap();
	assert_eq!(none, None);

	let err = books().filter(Book::GENRE).eq("scifi").single(&shelf).await.unwrap_err();
	assert!(matches!(err, QueryError::MultipleResults(2)));
}

#[rstest]
#[tokio::test]
async fn test_slice_pages_through_results(shelf: MemoryExecutor) {
	let by_title = books().order_by(Book::TITLE.asc());

	let page = by_title.slice(&shelf, 2, 2).await.unwrap();
	assert_eq!(page.total, 5);
	assert_eq!(
		page.data.iter().map(|b| b.title.as_str()).collect::<Vec<_>>(),
		vec!["hyperion", "ubik"]
	);
	assert!(page.has_next());

	let last = by_title.slice(&shelf, 4, 2).await.unwrap();
	assert_eq!(last.data.len(), 1);
	assert!(!last.has_next());
}

#[rstest]
#[tokio::test]
async fn test_slice_past_the_end_skips_list_query(shelf: MemoryExecutor) {
	shelf.clear_served();
	let page = books().slice(&shelf, 5, 10).await.unwrap();

	assert_eq!(page.total, 5);
	assert!(page.is_empty());
	assert_eq!(shelf.served().len(), 1, "only the count query should run");
}

#[rstest]
#[tokio::test]
async fn test_builders_are_copy_on_write(shelf: MemoryExecutor) {
	let base = books().filter(Book::PAGES).gt(400);
	let scifi = base.filter(Book::GENRE).eq("scifi");

	assert_eq!(base.count(&shelf).await.unwrap(), 3);
	assert_eq!(scifi.count(&shelf).await.unwrap(), 2);
	assert_eq!(base.count(&shelf).await.unwrap(), 3);
}

// =============================================================================
// Grouping of filter chains
// =============================================================================

#[derive(Debug, Clone)]
enum Link {
	AndPagesGt(i32),
	OrPagesLt(i32),
	AndTitleNe(usize),
	OrTitleEq(usize),
}

const TITLES: [&str; 4] = ["a", "b", "c", "d"];

fn link() -> impl Strategy<Value = Link> {
	prop_oneof![
		(0..100i32).prop_map(Link::AndPagesGt),
		(0..100i32).prop_map(Link::OrPagesLt),
		(0..TITLES.len()).prop_map(Link::AndTitleNe),
		(0..TITLES.len()).prop_map(Link::OrTitleEq),
	]
}

/// `and` extends the open AND-group, `or` closes it and opens another.
fn reference(start: i32, links: &[Link], book: &Book) -> bool {
	let mut closed = false;
	let mut group = book.pages >= start;
	for link in links {
		match link {
			Link::AndPagesGt(n) => group = group && book.pages > *n,
			Link::AndTitleNe(i) => group = group && book.title != TITLES[*i],
			Link::OrPagesLt(n) => {
				closed = closed || group;
				group = book.pages < *n;
			}
			Link::OrTitleEq(i) => {
				closed = closed || group;
				group = book.title == TITLES[*i];
			}
		}
	}
	closed || group
}

proptest! {
	#[test]
	fn prop_chain_groups_ands_before_ors(
		rows in prop::collection::vec((0..TITLES.len(), 0..100i32), 0..12),
		start in 0..100i32,
		links in prop::collection::vec(link(), 0..6),
	) {
		let records: Vec<Book> = rows
			.iter()
			.map(|(title, pages)| book(TITLES[*title], *pages, None))
			.collect();
		let executor = MemoryExecutor::new();
		executor.insert(&records).unwrap();

		let mut builder = books().filter(Book::PAGES).ge(start);
		for link in &links {
			builder = match link {
				Link::AndPagesGt(n) => builder.and(Book::PAGES).gt(*n),
				Link::OrPagesLt(n) => builder.or(Book::PAGES).lt(*n),
				Link::AndTitleNe(i) => builder.and(Book::TITLE).ne(TITLES[*i]),
				Link::OrTitleEq(i) => builder.or(Book::TITLE).eq(TITLES[*i]),
			};
		}

		let expected: Vec<Book> = records
			.iter()
			.filter(|b| reference(start, &links, b))
			.cloned()
			.collect();
		let actual: Vec<Book> = executor
			.evaluate(&builder.structure())
			.unwrap()
			.iter()
			.map(|row| row.decode(&quarry_query::Selection::Entity).unwrap())
			.collect();
		prop_assert_eq!(actual, expected);
	}
}
