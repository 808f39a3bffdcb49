// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Query-string options accepted by Management API read operations.

use std::collections::BTreeMap;

use url::Url;

/// A modifier applied to a request's query string.
///
/// Options are applied in order; a later option that sets the same key
/// replaces the earlier value. Keys are emitted sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOption {
	pairs: Vec<(String, String)>,
}

impl RequestOption {
	fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			pairs: pairs
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}

	/// Return only these fields.
	pub fn fields<I, S>(fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self::from_pairs([
			("fields", join(fields)),
			("include_fields", "true".to_string()),
		])
	}

	/// Return everything except these fields.
	pub fn without_fields<I, S>(fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self::from_pairs([
			("fields", join(fields)),
			("include_fields", "false".to_string()),
		])
	}

	/// Zero-based page index.
	pub fn page(page: u32) -> Self {
		Self::from_pairs([("page", page.to_string())])
	}

	pub fn per_page(per_page: u32) -> Self {
		Self::from_pairs([("per_page", per_page.to_string())])
	}

	pub fn include_totals(include: bool) -> Self {
		Self::from_pairs([("include_totals", include.to_string())])
	}

	/// Lucene query against the v3 search engine.
	pub fn query(query: impl Into<String>) -> Self {
		Self::from_pairs([
			("search_engine", "v3".to_string()),
			("q", query.into()),
		])
	}

	/// Any other query parameter.
	pub fn parameter(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self::from_pairs([(key.into(), value.into())])
	}
}

fn join<I, S>(fields: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	fields
		.into_iter()
		.map(|f| f.as_ref().trim().to_string())
		.filter(|f| !f.is_empty())
		.collect::<Vec<_>>()
		.join(",")
}

/// Apply `options` to `url`'s query string.
///
/// Existing query parameters on `url` take part in the same
/// later-replaces-earlier merge.
pub(crate) fn apply(mut url: Url, options: &[RequestOption]) -> Url {
	if options.is_empty() {
		return url;
	}

	let mut values: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
	for option in options {
		for (key, value) in &option.pairs {
			values.insert(key.clone(), value.clone());
		}
	}

	url.query_pairs_mut().clear().extend_pairs(values.iter());
	url
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn base() -> Url {
		Url::parse("https://example.auth0.com/api/v2/emails/provider").unwrap()
	}

	#[test]
	fn no_options_leaves_url_untouched() {
		let url = apply(base(), &[]);
		assert_eq!(url.query(), None);
	}

	#[test]
	fn fields_include_and_exclude() {
		let url = apply(base(), &[RequestOption::fields(["name", "enabled"])]);
		assert_eq!(url.query(), Some("fields=name%2Cenabled&include_fields=true"));

		let url = apply(base(), &[RequestOption::without_fields(["credentials"])]);
		assert_eq!(url.query(), Some("fields=credentials&include_fields=false"));
	}

	#[test]
	fn fields_skip_blank_entries() {
		let url = apply(base(), &[RequestOption::fields([" name ", "", "settings"])]);
		assert_eq!(url.query(), Some("fields=name%2Csettings&include_fields=true"));
	}

	#[test]
	fn later_option_replaces_earlier() {
		let url = apply(
			base(),
			&[
				RequestOption::page(1),
				RequestOption::per_page(50),
				RequestOption::page(3),
				RequestOption::include_totals(true),
			],
		);
		assert_eq!(url.query(), Some("include_totals=true&page=3&per_page=50"));
	}

	#[test]
	fn query_selects_search_engine() {
		let url = apply(base(), &[RequestOption::query("email:\"a@b.c\"")]);
		let pairs: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
		assert_eq!(pairs["q"], "email:\"a@b.c\"");
		assert_eq!(pairs["search_engine"], "v3");
	}

	#[test]
	fn merges_with_existing_query() {
		let mut url = base();
		url.set_query(Some("page=0&audience=x"));
		let url = apply(url, &[RequestOption::page(2)]);
		assert_eq!(url.query(), Some("audience=x&page=2"));
	}

	proptest! {
		#[test]
		fn parameters_round_trip_through_encoding(key in "[a-z_]{1,12}", value in "\\PC{0,24}") {
			let url = apply(base(), &[RequestOption::parameter(key.clone(), value.clone())]);
			let pairs: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
			prop_assert_eq!(pairs.get(&key), Some(&value));
		}
	}
}
