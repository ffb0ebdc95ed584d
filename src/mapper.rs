//! Translation between Rust-side field names and table column names.
//!
//! A [`Mapper`] converts in both directions: `obj_to_table` turns a canonical field identifier
//! (`UserID`) into a column name (`user_id`), `table_to_obj` goes the other way. Result rows use
//! it so fields can be read by their canonical names.

use dashmap::DashMap;

/// Bidirectional identifier translation.
pub trait Mapper: Send + Sync {
    fn obj_to_table(&self, name: &str) -> String;
    fn table_to_obj(&self, name: &str) -> String;
}

/// Leaves names untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameMapper;

impl Mapper for SameMapper {
    fn obj_to_table(&self, name: &str) -> String {
        name.to_owned()
    }

    fn table_to_obj(&self, name: &str) -> String {
        name.to_owned()
    }
}

/// `UserID` ↔ `user_id`.
///
/// The reverse direction capitalises each segment, so acronyms do not survive a round trip:
/// `UserID` → `user_id` → `UserId`. Both spellings map to the same column, which is the
/// equivalence this mapper guarantees. Use [`GonicMapper`] when acronyms must come back intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeMapper;

impl Mapper for SnakeMapper {
    fn obj_to_table(&self, name: &str) -> String {
        snake_cased(name)
    }

    fn table_to_obj(&self, name: &str) -> String {
        title_cased(name, |_| false)
    }
}

/// Like [`SnakeMapper`], but restores common initialisms (`ID`, `URL`, `HTTP`, ...) in full
/// upper case on the way back, so `UserID` round-trips exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct GonicMapper;

const COMMON_INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID", "IP",
    "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS", "TTL",
    "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XSRF", "XSS",
];

impl Mapper for GonicMapper {
    fn obj_to_table(&self, name: &str) -> String {
        snake_cased(name)
    }

    fn table_to_obj(&self, name: &str) -> String {
        title_cased(name, |segment| {
            COMMON_INITIALISMS
                .iter()
                .any(|initialism| initialism.eq_ignore_ascii_case(segment))
        })
    }
}

/// Adds a fixed table prefix around another mapper (`Users` → `app_users`).
#[derive(Debug, Clone)]
pub struct PrefixMapper<M> {
    prefix: String,
    inner: M,
}

impl<M: Mapper> PrefixMapper<M> {
    pub fn new(prefix: impl Into<String>, inner: M) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }
}

impl<M: Mapper> Mapper for PrefixMapper<M> {
    fn obj_to_table(&self, name: &str) -> String {
        format!("{}{}", self.prefix, self.inner.obj_to_table(name))
    }

    fn table_to_obj(&self, name: &str) -> String {
        let name = name.strip_prefix(self.prefix.as_str()).unwrap_or(name);
        self.inner.table_to_obj(name)
    }
}

/// Memoises both directions of an inner mapper.
///
/// Each direction has its own unbounded cache keyed by the input string. Entries live as long
/// as the `CacheMapper` and are never evicted. Two callers missing on the same key at once both
/// compute it and store the same result.
#[derive(Debug, Default)]
pub struct CacheMapper<M> {
    inner: M,
    obj_to_table: DashMap<String, String>,
    table_to_obj: DashMap<String, String>,
}

impl<M: Mapper> CacheMapper<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            obj_to_table: DashMap::new(),
            table_to_obj: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

fn memoized(
    cache: &DashMap<String, String>,
    name: &str,
    map: impl FnOnce(&str) -> String,
) -> String {
    if let Some(hit) = cache.get(name) {
        return hit.value().clone();
    }
    let mapped = map(name);
    cache.insert(name.to_owned(), mapped.clone());
    mapped
}

impl<M: Mapper> Mapper for CacheMapper<M> {
    fn obj_to_table(&self, name: &str) -> String {
        let inner = &self.inner;
        memoized(&self.obj_to_table, name, |n| inner.obj_to_table(n))
    }

    fn table_to_obj(&self, name: &str) -> String {
        let inner = &self.inner;
        memoized(&self.table_to_obj, name, |n| inner.table_to_obj(n))
    }
}

/// Splits before an uppercase letter that follows a lowercase letter or digit, or that starts a
/// new word after an uppercase run (`HTTPServer` → `http_server`), then lowercases.
fn snake_cased(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (idx, &chr) in chars.iter().enumerate() {
        if chr.is_ascii_uppercase() && idx > 0 {
            let prev = chars[idx - 1];
            let next_is_lower = chars.get(idx + 1).is_some_and(|c| c.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.push(chr.to_ascii_lowercase());
    }
    out
}

fn title_cased(name: &str, is_initialism: impl Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(name.len());
    for segment in name.split('_').filter(|s| !s.is_empty()) {
        let segment = segment.to_ascii_lowercase();
        if is_initialism(&segment) {
            out.push_str(&segment.to_ascii_uppercase());
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    out
}
