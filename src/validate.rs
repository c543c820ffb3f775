//! Declarative field validation.
//!
//! A request type lists its constraints in [`Validate::validate`], in the
//! order the fields are declared. Every field is checked; for each field
//! only its first failing rule is reported, so the resulting list has at
//! most one entry per field and follows declaration order.
//!
//! ```rust
//! use strata::validate::{Validate, Validator};
//!
//! struct CreateUser { name: String, role: String }
//!
//! impl Validate for CreateUser {
//!     fn validate(&self, v: &mut Validator<'_>) {
//!         v.field("name", &self.name).required().max_len(32);
//!         v.field("role", &self.role).one_of(&["admin", "member"]);
//!     }
//! }
//! ```

use crate::error::{Error, FieldError};

/// One constraint on one field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Rule {
    Required,
    MinLen(usize),
    MaxLen(usize),
    OneOf(Vec<String>),
}

/// Renders a violated [`Rule`] as a human-readable message.
pub trait Locale: Send + Sync {
    fn message(&self, field: &str, rule: &Rule) -> String;
}

/// The default locale.
#[derive(Clone, Copy, Debug, Default)]
pub struct English;

impl Locale for English {
    fn message(&self, field: &str, rule: &Rule) -> String {
        fn characters(n: usize) -> &'static str {
            if n == 1 { "character" } else { "characters" }
        }

        match rule {
            Rule::Required => format!("{field} is a required field"),
            Rule::MinLen(n) => format!("{field} must be at least {n} {} in length", characters(*n)),
            Rule::MaxLen(n) => format!("{field} must be a maximum of {n} {} in length", characters(*n)),
            Rule::OneOf(options) => format!("{field} must be one of [{}]", options.join(" ")),
        }
    }
}

/// Implemented by every type [`decode`](crate::decode) can produce.
///
/// The default is a no-op, which is what non-struct shapes (lists, maps,
/// raw JSON values) want.
pub trait Validate {
    fn validate(&self, _v: &mut Validator<'_>) {}
}

impl Validate for serde_json::Value {}
impl Validate for String {}
impl<T> Validate for Vec<T> {}
impl<K, V, S> Validate for std::collections::HashMap<K, V, S> {}
impl<K, V> Validate for std::collections::BTreeMap<K, V> {}

/// Collects violations while a type validates itself.
pub struct Validator<'l> {
    locale: &'l dyn Locale,
    violations: Vec<FieldError>,
}

impl<'l> Validator<'l> {
    pub fn new(locale: &'l dyn Locale) -> Self {
        Self { locale, violations: Vec::new() }
    }

    /// Starts checking a field. `name` is the name clients see, which is the
    /// wire (JSON) name rather than the Rust field name.
    pub fn field<'a, V>(&'a mut self, name: &'a str, value: &'a V) -> FieldCheck<'a, 'l, V>
    where
        V: FieldValue + ?Sized,
    {
        FieldCheck { validator: self, name, value, failed: false }
    }

    /// `Ok` when nothing failed, otherwise a validation error carrying
    /// every violation in the order it was found.
    pub fn finish(self) -> Result<(), Error> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(self.violations))
        }
    }
}

/// Rule chain for one field. Rules after the first failure are skipped.
pub struct FieldCheck<'a, 'l, V: ?Sized> {
    validator: &'a mut Validator<'l>,
    name: &'a str,
    value: &'a V,
    failed: bool,
}

impl<V: FieldValue + ?Sized> FieldCheck<'_, '_, V> {
    pub fn required(self) -> Self {
        let ok = !self.value.is_zero();
        self.check(ok, Rule::Required)
    }

    /// Minimum length in characters (or items). Absent values pass;
    /// combine with [`required`](Self::required) to forbid them.
    pub fn min_len(self, n: usize) -> Self {
        let ok = self.value.length().is_none_or(|len| len >= n);
        self.check(ok, Rule::MinLen(n))
    }

    pub fn max_len(self, n: usize) -> Self {
        let ok = self.value.length().is_none_or(|len| len <= n);
        self.check(ok, Rule::MaxLen(n))
    }

    /// The value must equal one of `options`. Absent values pass.
    pub fn one_of(self, options: &[&str]) -> Self {
        let ok = self.value.text().is_none_or(|s| options.contains(&s));
        let rule = Rule::OneOf(options.iter().map(|o| (*o).to_owned()).collect());
        self.check(ok, rule)
    }

    fn check(mut self, ok: bool, rule: Rule) -> Self {
        if !self.failed && !ok {
            let message = self.validator.locale.message(self.name, &rule);
            self.validator.violations.push(FieldError::new(self.name, message));
            self.failed = true;
        }
        self
    }
}

// ── FieldValue ───────────────────────────────────────────────────────────────

/// What the rules need to know about a field's value.
pub trait FieldValue {
    /// `true` for the type's empty value: `""`, `0`, `false`, `None`, `[]`.
    fn is_zero(&self) -> bool;

    /// Length for length-bounded rules; `None` when the notion does not
    /// apply or the value is absent.
    fn length(&self) -> Option<usize> { None }

    /// Textual value for membership rules.
    fn text(&self) -> Option<&str> { None }
}

impl FieldValue for str {
    fn is_zero(&self) -> bool { self.is_empty() }
    fn length(&self) -> Option<usize> { Some(self.chars().count()) }
    fn text(&self) -> Option<&str> { Some(self) }
}

impl FieldValue for String {
    fn is_zero(&self) -> bool { self.is_empty() }
    fn length(&self) -> Option<usize> { self.as_str().length() }
    fn text(&self) -> Option<&str> { Some(self.as_str()) }
}

impl<T> FieldValue for Vec<T> {
    fn is_zero(&self) -> bool { self.is_empty() }
    fn length(&self) -> Option<usize> { Some(self.len()) }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn is_zero(&self) -> bool { self.as_ref().is_none_or(FieldValue::is_zero) }
    fn length(&self) -> Option<usize> { self.as_ref().and_then(FieldValue::length) }
    fn text(&self) -> Option<&str> { self.as_ref().and_then(FieldValue::text) }
}

impl FieldValue for bool {
    fn is_zero(&self) -> bool { !*self }
}

macro_rules! numeric_field_value {
    ($($t:ty),*) => {$(
        impl FieldValue for $t {
            #[allow(clippy::float_cmp)]
            fn is_zero(&self) -> bool { *self == (0 as $t) }
        }
    )*};
}

numeric_field_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    struct Signup {
        name: String,
        nickname: Option<String>,
        plan: String,
        seats: u32,
    }

    impl Validate for Signup {
        fn validate(&self, v: &mut Validator<'_>) {
            v.field("Name", &self.name).required().min_len(3).max_len(10);
            v.field("Nickname", &self.nickname).max_len(4);
            v.field("Plan", &self.plan).one_of(&["free", "pro"]);
            v.field("Seats", &self.seats).required();
        }
    }

    fn run(s: &Signup) -> Vec<FieldError> {
        let mut v = Validator::new(&English);
        s.validate(&mut v);
        match v.finish() {
            Ok(()) => Vec::new(),
            Err(err) => err.as_web().unwrap().fields().to_vec(),
        }
    }

    #[test]
    fn valid_value_passes() {
        let s = Signup { name: "alice".into(), nickname: None, plan: "pro".into(), seats: 2 };
        assert!(run(&s).is_empty());
    }

    #[test]
    fn every_field_reported_in_declaration_order() {
        let s = Signup { name: String::new(), nickname: Some("alfie".into()), plan: "gold".into(), seats: 0 };
        let fields = run(&s);
        assert_eq!(
            fields,
            [
                FieldError::new("Name", "Name is a required field"),
                FieldError::new("Nickname", "Nickname must be a maximum of 4 characters in length"),
                FieldError::new("Plan", "Plan must be one of [free pro]"),
                FieldError::new("Seats", "Seats is a required field"),
            ]
        );
    }

    #[test]
    fn only_first_failing_rule_per_field() {
        // Empty fails `required`; `min_len` would fail too but is skipped.
        let s = Signup { name: String::new(), nickname: None, plan: "free".into(), seats: 1 };
        assert_eq!(run(&s).len(), 1);

        let s = Signup { name: "al".into(), nickname: None, plan: "free".into(), seats: 1 };
        assert_eq!(run(&s)[0].error, "Name must be at least 3 characters in length");
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let s = Signup { name: "ééé".into(), nickname: None, plan: "free".into(), seats: 1 };
        assert!(run(&s).is_empty());
    }

    #[test]
    fn singular_character() {
        assert_eq!(English.message("Code", &Rule::MaxLen(1)), "Code must be a maximum of 1 character in length");
    }
}
