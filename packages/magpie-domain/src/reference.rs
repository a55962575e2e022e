use regex::Regex;

/// Formats an "Author (Year). Title." style citation line.
pub fn format_reference(authors: &[String], year: &str, title: &str) -> String {
	let author_part = match authors {
		[] => "Unknown".to_string(),
		[only] => only.clone(),
		[first, second] => format!("{first} and {second}"),
		[first, ..] => format!("{first} et al."),
	};
	let year = if year.trim().is_empty() { "Unknown" } else { year.trim() };
	let title = if title.trim().is_empty() { "Untitled Document" } else { title.trim() };

	format!("{author_part} ({year}). {title}.")
}

/// Pulls the first plausible publication year out of free-form text, e.g. a
/// parser creation date such as `D:20230115120000`.
pub fn extract_year(text: &str) -> Option<String> {
	let pattern = Regex::new(r"(19|20)\d{2}").ok()?;

	pattern.find(text).map(|found| found.as_str().to_string())
}
