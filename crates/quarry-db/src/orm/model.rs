/// A record type stored in a table.
///
/// Fields are declared as associated constants so that queries can refer to
/// them without reflection:
///
/// ```
/// use quarry_db::orm::{Field, Model};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct User {
///     id: Option<i64>,
///     name: String,
///     age: i32,
/// }
///
/// impl User {
///     const ID: Field<User, Option<i64>> = Field::new("id");
///     const NAME: Field<User, String> = Field::new("name");
///     const AGE: Field<User, i32> = Field::new("age");
/// }
///
/// impl Model for User {
///     fn table_name() -> &'static str {
///         "users"
///     }
/// }
///
/// assert_eq!(User::table_name(), "users");
/// assert_eq!(User::AGE.name(), "age");
/// ```
pub trait Model: Send + Sync + 'static {
	/// Name of the backing table
	fn table_name() -> &'static str;
}
