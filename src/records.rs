//! Client-side handling of student records: intake-form validation and
//! search/filter over fetched bundles.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::{StudentBundle, StudentForm};
use crate::error::{AppError, AppResult};

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("phone regex"));

/// Validate an intake form before it is submitted: every field is required,
/// and the four phone fields must be exactly 10 digits. The first violation
/// is reported as a user-input error carrying the offending field.
pub fn validate_form(form: &StudentForm) -> AppResult<()> {
    for (field, value) in required_fields(form) {
        if value.trim().is_empty() {
            return Err(AppError::user_input(field.to_string(), format!("{} is required.", field)));
        }
    }
    for (field, label, value) in phone_fields(form) {
        if !PHONE_RE.is_match(value) {
            return Err(AppError::user_input(
                field.to_string(),
                format!("{} must be exactly 10 digits.", label),
            ));
        }
    }
    Ok(())
}

fn required_fields(form: &StudentForm) -> Vec<(&'static str, &str)> {
    vec![
        ("std_id", &form.std_id),
        ("prefix", &form.prefix),
        ("std_Fname", &form.std_fname),
        ("std_Lname", &form.std_lname),
        ("std_nickname", &form.std_nickname),
        ("std_religion", &form.std_religion),
        ("major", &form.major),
        ("std_tel", &form.std_tel),
        ("std_father_name", &form.std_father_name),
        ("std_father_tel", &form.std_father_tel),
        ("std_mother_name", &form.std_mother_name),
        ("std_mother_tel", &form.std_mother_tel),
        ("std_parent_name", &form.std_parent_name),
        ("std_parent_tel", &form.std_parent_tel),
        ("std_parent_rela", &form.std_parent_rela),
        ("allergic_things", &form.allergic_things),
        ("allergic_drugs", &form.allergic_drugs),
        ("allergic_condition", &form.allergic_condition),
        ("sch_name", &form.sch_name),
        ("sch_province", &form.sch_province),
    ]
}

fn phone_fields(form: &StudentForm) -> [(&'static str, &'static str, &str); 4] {
    [
        ("std_father_tel", "father phone number", &form.std_father_tel),
        ("std_mother_tel", "mother phone number", &form.std_mother_tel),
        ("std_parent_tel", "guardian phone number", &form.std_parent_tel),
        ("std_tel", "student phone number", &form.std_tel),
    ]
}

/// Field a search term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    All,
    StdId,
    FirstName,
    LastName,
    Nickname,
    Tel,
    Province,
    Major,
}

impl SearchField {
    /// Parse console input; accepts the backend field names.
    pub fn parse(s: &str) -> Option<SearchField> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Some(SearchField::All),
            "std_id" | "id" => Some(SearchField::StdId),
            "std_fname" | "fname" => Some(SearchField::FirstName),
            "std_lname" | "lname" => Some(SearchField::LastName),
            "std_nickname" | "nickname" => Some(SearchField::Nickname),
            "std_tel" | "tel" => Some(SearchField::Tel),
            "sch_province" | "province" => Some(SearchField::Province),
            "major" => Some(SearchField::Major),
            _ => None,
        }
    }
}

fn field_values<'a>(b: &'a StudentBundle, field: SearchField) -> Vec<&'a str> {
    match field {
        SearchField::All => vec![
            &b.student.std_id,
            &b.student.std_fname,
            &b.student.std_lname,
            &b.student.std_nickname,
            &b.student.std_tel,
            &b.school.sch_province,
            &b.student.major,
        ],
        SearchField::StdId => vec![&b.student.std_id],
        SearchField::FirstName => vec![&b.student.std_fname],
        SearchField::LastName => vec![&b.student.std_lname],
        SearchField::Nickname => vec![&b.student.std_nickname],
        SearchField::Tel => vec![&b.student.std_tel],
        SearchField::Province => vec![&b.school.sch_province],
        SearchField::Major => vec![&b.student.major],
    }
}

/// Keep the first bundle per std_id, preserving order.
pub fn dedup_by_id(records: &[StudentBundle]) -> Vec<&StudentBundle> {
    let mut seen: Vec<&str> = Vec::new();
    let mut out = Vec::new();
    for r in records {
        if seen.contains(&r.student.std_id.as_str()) {
            continue;
        }
        seen.push(&r.student.std_id);
        out.push(r);
    }
    out
}

/// Case-insensitive substring search over de-duplicated records. An empty
/// term matches everything.
pub fn search<'a>(records: &'a [StudentBundle], field: SearchField, term: &str) -> Vec<&'a StudentBundle> {
    let unique = dedup_by_id(records);
    if term.is_empty() {
        return unique;
    }
    let needle = term.to_lowercase();
    unique
        .into_iter()
        .filter(|r| field_values(r, field).iter().any(|v| v.to_lowercase().contains(&needle)))
        .collect()
}
