//! Resolving a [`NameTable`] into an ordered argument list.

use crate::builder::{build_query, NameTable, PlaceholderStyle};
use crate::value::{ToValue, Value};
use crate::{Error, Result};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Key/value container placeholders can be looked up in.
pub trait Mapping {
    fn lookup(&self, key: &str) -> Option<&dyn ToValue>;
}

impl<K, V, S> Mapping for HashMap<K, V, S>
where
    K: Borrow<str> + Eq + Hash,
    V: ToValue,
    S: BuildHasher,
{
    fn lookup(&self, key: &str) -> Option<&dyn ToValue> {
        self.get(key).map(|v| v as &dyn ToValue)
    }
}

impl<K, V> Mapping for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: ToValue,
{
    fn lookup(&self, key: &str) -> Option<&dyn ToValue> {
        self.get(key).map(|v| v as &dyn ToValue)
    }
}

/// Structured value whose fields can be read by placeholder name.
///
/// Usually generated with [`impl_record!`](crate::impl_record). Ordered `(name, value)` pair
/// lists implement it too.
pub trait Record {
    fn field(&self, name: &str) -> Option<&dyn ToValue>;
}

fn find_pair<'a, K, V>(pairs: &'a [(K, V)], name: &str) -> Option<&'a dyn ToValue>
where
    K: AsRef<str>,
    V: ToValue,
{
    pairs
        .iter()
        .find(|(key, _)| key.as_ref() == name)
        .map(|(_, value)| value as &dyn ToValue)
}

impl<K: AsRef<str>, V: ToValue> Record for [(K, V)] {
    fn field(&self, name: &str) -> Option<&dyn ToValue> {
        find_pair(self, name)
    }
}

impl<K: AsRef<str>, V: ToValue, const N: usize> Record for [(K, V); N] {
    fn field(&self, name: &str) -> Option<&dyn ToValue> {
        find_pair(self, name)
    }
}

impl<K: AsRef<str>, V: ToValue> Record for Vec<(K, V)> {
    fn field(&self, name: &str) -> Option<&dyn ToValue> {
        find_pair(self, name)
    }
}

/// Implements [`Record`] for a struct by listing the fields placeholders may refer to.
///
/// A field answers to its own name and, optionally, to an alias.
///
/// ```
/// use sqlx_named::{impl_record, Record};
///
/// struct User {
///     id: i64,
///     user_name: String,
/// }
///
/// impl_record!(User { id => "ID", user_name });
///
/// let user = User { id: 7, user_name: "alice".into() };
/// assert!(user.field("ID").is_some());
/// assert!(user.field("id").is_some());
/// assert!(user.field("email").is_none());
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ty { $($field:ident $(=> $alias:literal)?),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn field(&self, name: &str) -> ::std::option::Option<&dyn $crate::ToValue> {
                match name {
                    $(
                        ::std::stringify!($field) $(| $alias)? => {
                            ::std::option::Option::Some(&self.$field as &dyn $crate::ToValue)
                        }
                    )*
                    _ => ::std::option::Option::None,
                }
            }
        }
    };
}

/// Arguments supplied to a call, tagged by kind.
#[derive(Clone, Copy)]
pub enum Params<'a> {
    Positional(&'a [Value]),
    Mapping(&'a dyn Mapping),
    Record(&'a dyn Record),
}

impl Params<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Params::Positional(_) => "positional",
            Params::Mapping(_) => "mapping",
            Params::Record(_) => "record",
        }
    }
}

impl<'a> From<&'a [Value]> for Params<'a> {
    fn from(args: &'a [Value]) -> Self {
        Params::Positional(args)
    }
}

fn resolve<'a>(
    names: &NameTable,
    lookup: impl Fn(&str) -> Option<&'a dyn ToValue>,
) -> Result<Vec<Value>> {
    names
        .positions()
        .map(|name| {
            let value = lookup(name).ok_or_else(|| Error::MissingBindingKey(name.to_owned()))?;
            value.to_value().map_err(|source| Error::ValueConversion {
                name: name.to_owned(),
                source,
            })
        })
        .collect()
}

/// Builds the argument list for `names` from a mapping.
///
/// Argument order follows the marker order of the template, never the mapping's own order.
pub fn bind_mapping(names: &NameTable, params: Params<'_>) -> Result<Vec<Value>> {
    let Params::Mapping(map) = params else {
        return Err(Error::InvalidArgumentKind {
            expected: "mapping",
            found: params.kind(),
        });
    };
    resolve(names, |name| map.lookup(name))
}

/// Builds the argument list for `names` from a record's fields.
pub fn bind_record(names: &NameTable, params: Params<'_>) -> Result<Vec<Value>> {
    let Params::Record(record) = params else {
        return Err(Error::InvalidArgumentKind {
            expected: "record",
            found: params.kind(),
        });
    };
    resolve(names, |name| record.field(name))
}

/// Builds the argument list from either a mapping or a record.
pub fn bind_named(names: &NameTable, params: Params<'_>) -> Result<Vec<Value>> {
    match params {
        Params::Mapping(_) => bind_mapping(names, params),
        Params::Record(_) => bind_record(names, params),
        Params::Positional(_) => Err(Error::InvalidArgumentKind {
            expected: "mapping or record",
            found: params.kind(),
        }),
    }
}

/// Rewrites `template` and binds its placeholders in one go.
///
/// The argument kind is checked before the template is touched.
///
/// ```
/// use std::collections::HashMap;
/// use sqlx_named::bind::{bind_template, Params};
/// use sqlx_named::{PlaceholderStyle, Value};
///
/// let mut map = HashMap::new();
/// map.insert("name", Value::from("alice"));
/// map.insert("id", Value::from(7));
///
/// let (sql, args) = bind_template(
///     "UPDATE users SET name = ?name WHERE id = ?id",
///     PlaceholderStyle::Question,
///     Params::Mapping(&map),
/// )?;
/// assert_eq!(sql, "UPDATE users SET name = ? WHERE id = ?");
/// assert_eq!(args, vec![Value::from("alice"), Value::from(7)]);
/// # Ok::<(), sqlx_named::Error>(())
/// ```
pub fn bind_template(
    template: &str,
    style: PlaceholderStyle,
    params: Params<'_>,
) -> Result<(String, Vec<Value>)> {
    if let Params::Positional(_) = params {
        return Err(Error::InvalidArgumentKind {
            expected: "mapping or record",
            found: params.kind(),
        });
    }
    let built = build_query(template, style)?;
    let args = bind_named(&built.names, params)?;
    Ok((built.sql, args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BoxError;

    fn names(template: &str) -> NameTable {
        build_query(template, PlaceholderStyle::Question)
            .unwrap()
            .names
    }

    struct Row {
        x: i64,
        y: String,
    }

    impl_record!(Row { x => "X", y => "Y" });

    struct Email(String);

    impl ToValue for Email {
        fn to_value(&self) -> std::result::Result<Value, BoxError> {
            if !self.0.contains('@') {
                return Err(format!("not an email address: {}", self.0).into());
            }
            Ok(Value::Text(self.0.clone()))
        }
    }

    struct Signup {
        name: String,
        email: Email,
    }

    impl_record!(Signup { name, email });

    #[test]
    fn test_record_end_to_end() {
        let row = Row {
            x: 1,
            y: "s".into(),
        };
        let (sql, args) = bind_template(
            "insert into t (a,b) values (?X, ?Y)",
            PlaceholderStyle::Question,
            Params::Record(&row),
        )
        .unwrap();
        assert_eq!(sql, "insert into t (a,b) values (?, ?)");
        assert_eq!(args, vec![Value::Int(1), Value::Text("s".into())]);
    }

    #[test]
    fn test_mapping_order_follows_template() {
        let mut map = BTreeMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("c", 3);
        let args = bind_mapping(&names("SELECT ?c, ?a, ?b"), Params::Mapping(&map)).unwrap();
        assert_eq!(args, vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_repeated_name_binds_every_occurrence() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), Value::from("first"));
        map.insert("b".to_string(), Value::from("second"));
        let args = bind_mapping(&names("SELECT ?a, ?b, ?a"), Params::Mapping(&map)).unwrap();
        assert_eq!(
            args,
            vec![
                Value::from("first"),
                Value::from("second"),
                Value::from("first"),
            ]
        );
    }

    #[test]
    fn test_missing_mapping_key() {
        let mut map = HashMap::new();
        map.insert("id", 1);
        let err = bind_mapping(&names("SELECT ?id, ?name"), Params::Mapping(&map)).unwrap_err();
        assert!(matches!(err, Error::MissingBindingKey(ref name) if name == "name"));
    }

    #[test]
    fn test_missing_record_field_is_typed() {
        let row = Row {
            x: 1,
            y: "s".into(),
        };
        let err = bind_record(&names("SELECT ?X, ?Z"), Params::Record(&row)).unwrap_err();
        assert!(matches!(err, Error::MissingBindingKey(ref name) if name == "Z"));
    }

    #[test]
    fn test_invalid_argument_kind() {
        let positional = [Value::from(1)];
        let err = bind_mapping(&names("SELECT ?a"), Params::Positional(&positional)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArgumentKind {
                expected: "mapping",
                found: "positional"
            }
        ));

        let map: HashMap<String, i64> = HashMap::new();
        let err = bind_record(&names("SELECT ?a"), Params::Mapping(&map)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentKind { found: "mapping", .. }));

        let err = bind_template(
            "SELECT ?a",
            PlaceholderStyle::Question,
            Params::from(&positional[..]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentKind { .. }));
    }

    #[test]
    fn test_value_conversion_error_keeps_cause() {
        let signup = Signup {
            name: "alice".into(),
            email: Email("alice.example.com".into()),
        };
        let err =
            bind_record(&names("VALUES (?name, ?email)"), Params::Record(&signup)).unwrap_err();
        match err {
            Error::ValueConversion { name, source } => {
                assert_eq!(name, "email");
                assert!(source.to_string().contains("alice.example.com"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let signup = Signup {
            name: "alice".into(),
            email: Email("alice@example.com".into()),
        };
        let args = bind_record(&names("VALUES (?name, ?email)"), Params::Record(&signup)).unwrap();
        assert_eq!(args[1], Value::from("alice@example.com"));
    }

    #[test]
    fn test_pair_list_record() {
        let pairs = [("X", Value::from(1)), ("Y", Value::from("s"))];
        let args = bind_named(&names("SELECT ?Y, ?X"), Params::Record(&pairs)).unwrap();
        assert_eq!(args, vec![Value::from("s"), Value::from(1)]);
    }

    #[test]
    fn test_no_placeholders_binds_nothing() {
        let map: HashMap<&str, i64> = HashMap::new();
        let (sql, args) = bind_template(
            "SELECT 1",
            PlaceholderStyle::Question,
            Params::Mapping(&map),
        )
        .unwrap();
        assert_eq!(sql, "SELECT 1");
        assert!(args.is_empty());
    }
}
