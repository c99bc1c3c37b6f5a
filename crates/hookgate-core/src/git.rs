//! Git collaborators: target file resolution and change-size metrics.
//!
//! The pipeline treats git as an external collaborator. Everything here is
//! a thin wrapper over `git` subcommands plus small, independently
//! testable parsers for their output.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{HookgateError, Result};

/// Aggregate change-size metrics for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub files: u64,
    pub insertions: u64,
    pub deletions: u64,
}

impl DiffStats {
    /// Changed-line count: insertions + deletions.
    pub fn lines(&self) -> u64 {
        self.insertions + self.deletions
    }
}

fn run_git(repo_dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .map_err(|e| HookgateError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(HookgateError::Git(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Check whether a directory is inside a git work tree.
pub fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Repository root for the given directory.
pub fn repo_root(dir: &Path) -> Result<PathBuf> {
    let out = run_git(dir, &["rev-parse", "--show-toplevel"])?;
    Ok(PathBuf::from(out.trim()))
}

/// Current branch name (`HEAD` when detached).
pub fn current_branch(repo_dir: &Path) -> Result<String> {
    let out = run_git(repo_dir, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(out.trim().to_string())
}

/// Staged file paths for the pending commit (added/copied/modified/renamed).
pub fn staged_files(repo_dir: &Path) -> Result<Vec<String>> {
    let out = run_git(
        repo_dir,
        &["diff", "--cached", "--name-only", "--diff-filter=ACMR"],
    )?;
    Ok(parse_name_list(&out))
}

/// File paths changed across a revision range (push/merge stages).
pub fn range_files(repo_dir: &Path, range: &str) -> Result<Vec<String>> {
    let out = run_git(repo_dir, &["diff", "--name-only", range])?;
    Ok(parse_name_list(&out))
}

/// Aggregate metrics for the staged diff.
pub fn staged_stats(repo_dir: &Path) -> Result<DiffStats> {
    let out = run_git(repo_dir, &["diff", "--cached", "--numstat"])?;
    Ok(parse_numstat(&out))
}

/// Aggregate metrics for a revision range.
pub fn range_stats(repo_dir: &Path, range: &str) -> Result<DiffStats> {
    let out = run_git(repo_dir, &["diff", "--numstat", range])?;
    Ok(parse_numstat(&out))
}

/// The command line being gatekept, for audit records.
pub fn invocation_command() -> String {
    std::env::args().collect::<Vec<_>>().join(" ")
}

fn parse_name_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `git diff --numstat` output into aggregate metrics.
///
/// Each line is `<insertions>\t<deletions>\t<path>`; binary files carry
/// `-` in the count columns and contribute zero lines.
pub fn parse_numstat(output: &str) -> DiffStats {
    let mut stats = DiffStats::default();
    for line in output.lines() {
        let mut cols = line.split('\t');
        let (Some(ins), Some(del), Some(_path)) = (cols.next(), cols.next(), cols.next()) else {
            continue;
        };
        stats.files += 1;
        stats.insertions += ins.trim().parse::<u64>().unwrap_or(0);
        stats.deletions += del.trim().parse::<u64>().unwrap_or(0);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init"]);
        git(dir.path(), &["config", "user.name", "test-user"]);
        git(dir.path(), &["config", "user.email", "test@example.com"]);
        git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }

    #[test]
    fn test_parse_numstat_sums_columns() {
        let out = "10\t2\tsrc/a.rs\n0\t5\tdocs/b.md\n";
        let stats = parse_numstat(out);
        assert_eq!(stats.files, 2);
        assert_eq!(stats.insertions, 10);
        assert_eq!(stats.deletions, 7);
        assert_eq!(stats.lines(), 17);
    }

    #[test]
    fn test_parse_numstat_binary_markers_count_zero_lines() {
        let out = "-\t-\tassets/logo.png\n3\t1\ta.sh\n";
        let stats = parse_numstat(out);
        assert_eq!(stats.files, 2);
        assert_eq!(stats.lines(), 4);
    }

    #[test]
    fn test_parse_numstat_empty_output() {
        assert_eq!(parse_numstat(""), DiffStats::default());
    }

    #[test]
    fn test_parse_name_list_trims_blanks() {
        let names = parse_name_list("a.sh\n\nb.md\n");
        assert_eq!(names, vec!["a.sh", "b.md"]);
    }

    #[test]
    fn test_staged_files_in_real_repo() {
        let repo = make_git_repo();
        std::fs::write(repo.path().join("hello.sh"), "echo hi\n").unwrap();
        git(repo.path(), &["add", "hello.sh"]);

        let files = staged_files(repo.path()).unwrap();
        assert_eq!(files, vec!["hello.sh"]);

        let stats = staged_stats(repo.path()).unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.insertions, 1);
    }

    #[test]
    fn test_current_branch_and_root() {
        let repo = make_git_repo();
        git(repo.path(), &["checkout", "-b", "feature/abc-123-demo"]);
        assert_eq!(
            current_branch(repo.path()).unwrap(),
            "feature/abc-123-demo"
        );
        let root = repo_root(repo.path()).unwrap();
        assert_eq!(root.canonicalize().unwrap(), repo.path().canonicalize().unwrap());
    }

    #[test]
    fn test_git_errors_surface_as_system_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = staged_files(dir.path()).unwrap_err();
        assert!(err.to_string().contains("git"));
    }

    #[test]
    fn test_is_git_repo() {
        let repo = make_git_repo();
        assert!(is_git_repo(repo.path()));
        let plain = tempfile::tempdir().unwrap();
        assert!(!is_git_repo(plain.path()));
    }
}
