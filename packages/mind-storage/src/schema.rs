pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_users.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_users.sql")),
				"tables/002_mood_entries.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_mood_entries.sql")),
				"tables/003_mood_labels.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_mood_labels.sql")),
				"tables/004_mood_entry_labels.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_mood_entry_labels.sql")),
				"tables/005_pipeline_runs.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_pipeline_runs.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn includes_are_expanded_in_order() {
		let sql = render_schema();
		let users = sql.find("CREATE TABLE IF NOT EXISTS users").expect("Missing users table.");
		let runs =
			sql.find("CREATE TABLE IF NOT EXISTS pipeline_runs").expect("Missing runs table.");

		assert!(users < runs);
		assert!(!sql.contains("\\ir "));
	}
}
