use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Error;
use crate::error::Map;

pub const CREATED_AT: &str = "createdAt";

/// Month, unpadded day and year, e.g. `Jan 5, 2024`.
const DISPLAY_FORMAT: &str = "%b %-d, %Y";

/// Largest distance from the epoch a JavaScript `Date` accepts, in milliseconds.
const MAX_TIMESTAMP_MS: f64 = 8.64e15;

/// Date-times without an offset, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
	"%Y-%m-%dT%H:%M:%S%.f",
	"%Y-%m-%dT%H:%M:%S",
	"%Y-%m-%dT%H:%M",
	"%Y-%m-%d %H:%M:%S%.f",
	"%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PostInfoInput {
	/// The slug of the post to look up.
	pub slug: Option<String>,
}

/// A single post, as returned by the content API.
///
/// Only `createdAt` is interpreted; every other field is opaque.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct Post(Map);

/// A post ready to be displayed.
///
/// Identical to the upstream post, field order included, except that
/// `createdAt` is a formatted date such as `Jan 5, 2024`.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct PostDisplay(Map);

impl Post {
	/// The instant the post was created at.
	pub fn created_at(&self) -> Result<DateTime<Utc>, Error> {
		match self.0.get(CREATED_AT) {
			None | Some(Value::Null) => Err(Error::MissingCreatedAt),
			Some(value) => {
				parse_timestamp(value).ok_or_else(|| Error::InvalidCreatedAt(value.clone()))
			}
		}
	}

	/// Replaces `createdAt` with its display form, rendered at `offset`.
	pub fn into_display(mut self, offset: &FixedOffset) -> Result<PostDisplay, Error> {
		let created_at = display_date(self.created_at()?, offset);

		// with `preserve_order`, this keeps the key where upstream put it
		self.0.insert(CREATED_AT.into(), Value::String(created_at));

		Ok(PostDisplay(self.0))
	}
}

impl PostDisplay {
	pub fn created_at(&self) -> Option<&str> {
		self.0.get(CREATED_AT).and_then(Value::as_str)
	}
}

/// Parses the subset of values a JavaScript `Date` accepts that content APIs
/// actually send: ISO 8601 / RFC 3339 strings, RFC 2822 strings and epoch
/// milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
	match value {
		Value::String(text) => parse_text(text.trim()),
		Value::Number(number) => number
			.as_i64()
			.or_else(|| number.as_f64().and_then(whole_millis))
			.and_then(DateTime::from_timestamp_millis),
		_ => None,
	}
}

/// Truncates fractional milliseconds, rejecting values outside the range a
/// JavaScript `Date` can hold.
#[allow(clippy::cast_possible_truncation)]
fn whole_millis(ms: f64) -> Option<i64> {
	(ms.is_finite() && ms.abs() <= MAX_TIMESTAMP_MS).then(|| ms.trunc() as i64)
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
	if let Ok(at) = DateTime::parse_from_rfc3339(text) {
		return Some(at.with_timezone(&Utc));
	}

	if let Ok(at) = DateTime::parse_from_rfc2822(text) {
		return Some(at.with_timezone(&Utc));
	}

	if let Some(at) = NAIVE_FORMATS
		.iter()
		.find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
	{
		return Some(Utc.from_utc_datetime(&at));
	}

	NaiveDate::parse_from_str(text, "%Y-%m-%d")
		.ok()
		.and_then(|date| date.and_hms_opt(0, 0, 0))
		.map(|at| Utc.from_utc_datetime(&at))
}

/// Formats `at` as `<Mon> <day>, <year>` in the given offset.
pub fn display_date(at: DateTime<Utc>, offset: &FixedOffset) -> String {
	at.with_timezone(offset).format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::*;

	fn utc() -> FixedOffset {
		FixedOffset::east_opt(0).unwrap()
	}

	fn display(value: Value) -> Result<PostDisplay, Error> {
		serde_json::from_value::<Post>(json!({ "slug": "a", "createdAt": value }))
			.unwrap()
			.into_display(&utc())
	}

	#[test]
	fn test_single_digit_day() {
		let post = display(json!("2024-01-05T00:00:00Z")).unwrap();

		assert_eq!(post.created_at(), Some("Jan 5, 2024"));
	}

	#[test]
	fn test_two_digit_day() {
		let post = display(json!("2024-12-25T00:00:00Z")).unwrap();

		assert_eq!(post.created_at(), Some("Dec 25, 2024"));
	}

	#[test]
	fn test_accepted_wire_forms() {
		let cases = [
			json!("2024-01-05T00:00:00.000Z"),
			json!("2024-01-05T09:30:00+02:00"),
			json!("2024-01-05T10:30:00"),
			json!("2024-01-05T10:30:00.250"),
			json!("2024-01-05 10:30:00"),
			json!("2024-01-05"),
			json!("Fri, 05 Jan 2024 10:30:00 +0000"),
			json!(1_704_412_800_000_i64),
			json!(1_704_412_800_000.5),
		];

		for case in cases {
			let post = display(case.clone()).unwrap();

			assert_eq!(post.created_at(), Some("Jan 5, 2024"), "{case}");
		}
	}

	#[test]
	fn test_display_offset() {
		let at = parse_timestamp(&json!("2024-01-05T02:00:00Z")).unwrap();

		assert_eq!(display_date(at, &utc()), "Jan 5, 2024");
		assert_eq!(
			display_date(at, &FixedOffset::west_opt(5 * 3600).unwrap()),
			"Jan 4, 2024"
		);
	}

	#[test]
	fn test_missing_created_at() {
		let post = serde_json::from_value::<Post>(json!({ "slug": "a" })).unwrap();

		assert!(matches!(
			post.into_display(&utc()),
			Err(Error::MissingCreatedAt)
		));
		assert!(matches!(display(Value::Null), Err(Error::MissingCreatedAt)));
	}

	#[test]
	fn test_invalid_created_at() {
		for case in [
			json!("yesterday"),
			json!(""),
			json!(true),
			json!({}),
			json!([]),
			json!(1e20),
			json!(-8.7e15),
		] {
			assert!(
				matches!(display(case.clone()), Err(Error::InvalidCreatedAt(ref v)) if *v == case),
				"{case}"
			);
		}
	}

	#[test]
	fn test_other_fields_are_untouched() {
		let upstream = json!({
			"slug": "hello-world",
			"title": "Hello",
			"createdAt": "2024-01-05T00:00:00Z",
			"author": { "name": "A", "id": 7 },
			"tags": ["a", "b"],
			"views": 12,
		});

		let post = serde_json::from_value::<Post>(upstream.clone())
			.unwrap()
			.into_display(&utc())
			.unwrap();

		let mut expected = upstream;
		expected[CREATED_AT] = json!("Jan 5, 2024");

		assert_eq!(serde_json::to_value(&post).unwrap(), expected);
		// field order is preserved, including the position of `createdAt`
		assert_eq!(
			serde_json::to_string(&post).unwrap(),
			serde_json::to_string(&expected).unwrap()
		);
	}
}
