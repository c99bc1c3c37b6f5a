//! Commit message helpers for the two message stages.
//!
//! `prepare-message` transforms the pending message (never blocks);
//! `validate-message` inspects the transformed result.

/// Maximum subject line length before validation flags it.
pub const SUBJECT_LIMIT: usize = 72;

/// Extract a ticket token (`ABC-123`) from a branch name such as
/// `feature/ABC-123-add-thing`. Returns `None` for branches without a
/// token (`main`, `master`, bare slugs).
pub fn branch_token(branch: &str) -> Option<String> {
    let segment = branch.rsplit('/').next()?;

    let mut chars = segment.char_indices().peekable();
    let mut letters_end = 0;
    while let Some((i, c)) = chars.peek().copied() {
        if c.is_ascii_alphabetic() {
            letters_end = i + c.len_utf8();
            chars.next();
        } else {
            break;
        }
    }
    if letters_end == 0 {
        return None;
    }

    match chars.next() {
        Some((_, '-')) => {}
        _ => return None,
    }

    let digits_start = letters_end + 1;
    let mut digits_end = digits_start;
    for (i, c) in chars {
        if c.is_ascii_digit() {
            digits_end = i + 1;
        } else {
            break;
        }
    }
    if digits_end == digits_start {
        return None;
    }

    Some(segment[..digits_end].to_ascii_uppercase())
}

/// Prefix `message` with the branch ticket token, if one exists and the
/// subject does not already carry it. Returns the message unchanged
/// otherwise. This transform never blocks.
pub fn prepare_message(message: &str, branch: &str) -> String {
    let Some(token) = branch_token(branch) else {
        return message.to_string();
    };

    let subject = message.lines().next().unwrap_or("");
    if subject.to_ascii_uppercase().contains(&token) {
        return message.to_string();
    }

    format!("{token}: {message}")
}

/// Validate the (already prepared) commit message. Returns the list of
/// problems found; empty means the message passes.
pub fn validate_message(message: &str) -> Vec<String> {
    let mut issues = Vec::new();
    let subject = message.lines().next().unwrap_or("").trim();

    if subject.is_empty() {
        issues.push("commit subject is empty".to_string());
        return issues;
    }

    if subject.chars().count() > SUBJECT_LIMIT {
        issues.push(format!(
            "commit subject exceeds {SUBJECT_LIMIT} characters ({})",
            subject.chars().count()
        ));
    }

    let lowered = subject.to_ascii_lowercase();
    if lowered.starts_with("wip") || lowered.contains("do not merge") {
        issues.push("commit subject carries a work-in-progress marker".to_string());
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_token_extraction() {
        assert_eq!(
            branch_token("feature/ABC-123-add-login"),
            Some("ABC-123".to_string())
        );
        assert_eq!(
            branch_token("bugfix/proj-7-fix"),
            Some("PROJ-7".to_string())
        );
        assert_eq!(branch_token("main"), None);
        assert_eq!(branch_token("master"), None);
        assert_eq!(branch_token("feature/no-ticket-here"), None);
        assert_eq!(branch_token("release/2024"), None);
    }

    #[test]
    fn test_prepare_prefixes_from_branch() {
        let out = prepare_message("add login form", "feature/ABC-123-login");
        assert_eq!(out, "ABC-123: add login form");
    }

    #[test]
    fn test_prepare_skips_existing_token() {
        let out = prepare_message("ABC-123: add login form", "feature/ABC-123-login");
        assert_eq!(out, "ABC-123: add login form");

        // token mentioned anywhere in the subject also counts
        let out = prepare_message("login (abc-123)", "feature/ABC-123-login");
        assert_eq!(out, "login (abc-123)");
    }

    #[test]
    fn test_prepare_is_identity_without_token() {
        assert_eq!(prepare_message("quick fix", "main"), "quick fix");
    }

    #[test]
    fn test_validate_empty_subject() {
        let issues = validate_message("\nbody only");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("empty"));
    }

    #[test]
    fn test_validate_subject_length() {
        let long = "x".repeat(SUBJECT_LIMIT + 1);
        let issues = validate_message(&long);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("72"));

        assert!(validate_message(&"x".repeat(SUBJECT_LIMIT)).is_empty());
    }

    #[test]
    fn test_validate_wip_marker() {
        assert!(!validate_message("WIP: half done").is_empty());
        assert!(!validate_message("thing, DO NOT MERGE").is_empty());
        assert!(validate_message("ABC-123: finish feature").is_empty());
    }
}
