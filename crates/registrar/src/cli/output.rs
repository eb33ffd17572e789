//! Plain-text rendering for the terminal.

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::list::ListView;
use crate::record::Person;
use crate::validation::ValidationErrors;

/// One line per person: id, name, email, birth date, age, postal code.
#[must_use]
pub fn person_table(people: &[Person], today: NaiveDate) -> String {
    let mut out = format!(
        "{:>6}  {:<32}  {:<28}  {:<10}  {:>3}  {:<5}\n",
        "ID", "NAME", "EMAIL", "BORN", "AGE", "CP"
    );
    for person in people {
        let id = person.id.map(|id| id.to_string()).unwrap_or_default();
        let age = person
            .age_on(today)
            .map(|age| age.to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:>6}  {:<32}  {:<28}  {:<10}  {:>3}  {:<5}",
            id,
            clip(&person.full_name(), 32),
            clip(&person.email, 28),
            person.birth_date,
            age,
            person.address.postal_code,
        );
    }
    out
}

/// The current page with a footer describing position and search.
#[must_use]
pub fn list_page(view: &ListView, today: NaiveDate) -> String {
    let mut out = if view.records().is_empty() {
        "No people found.\n".to_string()
    } else {
        person_table(view.records(), today)
    };

    let _ = write!(out, "Page {}", view.page());
    if view.has_more() {
        out.push_str(" (more)");
    }
    if !view.search_term().is_empty() {
        let _ = write!(out, "  search: \"{}\"", view.search_term());
    }
    if let Some(error) = view.error() {
        let _ = write!(out, "\nError: {error}");
    }
    out
}

/// Field errors, one per line, labelled for the user.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("  --{}: {message}", flag_name(field.path())))
        .collect::<Vec<_>>()
        .join("\n")
}

fn flag_name(path: &str) -> String {
    path.trim_start_matches("address.").replace('_', "-")
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}
