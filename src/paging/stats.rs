use std::fmt;

/// Length a commit hash is shortened to on the status line.
const SHORT_COMMIT_LEN: usize = 7;

/// Data for the "Showing N of M" status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsLabel {
    pub loaded: usize,
    pub total: usize,
    pub commit: Option<String>,
}

impl StatsLabel {
    pub fn new(loaded: usize, total: usize) -> Self {
        Self {
            loaded,
            total,
            commit: None,
        }
    }

    pub fn with_commit(mut self, commit: Option<&str>) -> Self {
        self.commit = commit
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| short_commit(c).to_string());
        self
    }
}

impl fmt::Display for StatsLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Showing {} of {}",
            group_thousands(self.loaded),
            group_thousands(self.total)
        )?;
        if let Some(commit) = &self.commit {
            write!(f, " · {}", commit)?;
        }
        Ok(())
    }
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn short_commit(commit: &str) -> &str {
    match commit.char_indices().nth(SHORT_COMMIT_LEN) {
        Some((idx, _)) => &commit[..idx],
        None => commit,
    }
}
