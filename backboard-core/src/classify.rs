//! Source attribution
//!
//! Every source string the backend returns next to an answer is opaque text
//! of mixed provenance. [`SourceClassifier`] assigns it a [`SourceType`] and a
//! short display label without touching the text itself.
//!
//! Classification is an ordered rule table evaluated first-match-wins:
//!
//! | Order | Type | Matches on |
//! |-------|------|------------|
//! | 1 | Telegram | `telegram`, `[Jan 15, 21:05]` stamps, `@mention` + team member name |
//! | 2 | Git | `git`/`commit`, leading hex hash, `GIT COMMIT HISTORY`, `type: verb` subjects |
//! | 3 | Drive | document keywords (`adr`, `rfc`, `memo`, ...), `Title:`/`Document:` fields |
//! | 4 | Unknown | everything else |
//!
//! Categories overlap (a commit message may mention "drive"), so the order is
//! part of the contract. Keyword checks ignore case; structural patterns such
//! as hashes, timestamps and field prefixes are case-sensitive.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{default_team_members, ClassifierConfig};
use crate::types::{SourceFile, SourceType};

/// Label for sources no rule recognizes
pub const UNKNOWN_LABEL: &str = "Retrieved Context";

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("classifier pattern is valid")
}

// Telegram
static TELEGRAM_WORD: Lazy<Regex> = Lazy::new(|| pattern(r"\btelegram\b"));
static TELEGRAM_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| pattern(r"\[([A-Z][a-z]{2,8} \d{1,2}), (\d{1,2}:\d{2})\]"));
static MENTION: Lazy<Regex> = Lazy::new(|| pattern(r"@\w+"));

// Git
const GIT_KEYWORDS: [&str; 2] = ["git", "commit"];
static LEADING_HASH: Lazy<Regex> = Lazy::new(|| pattern(r"^[0-9a-f]{7,40}\s"));
static CONVENTIONAL_SUBJECT: Lazy<Regex> =
    Lazy::new(|| pattern(r"(?i)^\w+:\s*(?:add|fix|update|remove|implement|merge)"));
static HASH_AUTHOR: Lazy<Regex> = Lazy::new(|| pattern(r"^([0-9a-f]{7,40})\s+([^:\r\n]+?)\s*:"));

// Drive
const DRIVE_KEYWORDS: [&str; 10] = [
    "google drive",
    "drive",
    "adr",
    "rfc",
    "meeting notes",
    "post-mortem",
    "postmortem",
    "security audit",
    "legal compliance",
    "gdpr",
];
const DRIVE_FIELDS: [&str; 4] = ["Document:", "Title:", "Author:", "Status: ACCEPTED"];
static TITLE_FIELD: Lazy<Regex> = Lazy::new(|| pattern(r"(?:Title|Document):[ \t]*([^\r\n]*)"));
static ADR_TITLE: Lazy<Regex> = Lazy::new(|| pattern(r"ADR[-\s]?\d+[:\s]+[^\r\n]*"));
static PM_CODE: Lazy<Regex> = Lazy::new(|| pattern(r"PM-\d+-\d+"));
// `memo` alone needs a word boundary: "memory" is not a memo
static MEMO_WORD: Lazy<Regex> = Lazy::new(|| pattern(r"\bmemos?\b"));

static DEFAULT_CLASSIFIER: Lazy<SourceClassifier> = Lazy::new(SourceClassifier::default);

/// Classify with the built-in team roster.
pub fn classify(raw: &str) -> SourceFile {
    DEFAULT_CLASSIFIER.classify(raw)
}

/// A source string plus its lowercased form, computed once per classification.
struct Candidate<'a> {
    raw: &'a str,
    lower: String,
}

impl<'a> Candidate<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            raw,
            lower: raw.to_lowercase(),
        }
    }
}

type Predicate = fn(&SourceClassifier, &Candidate<'_>) -> bool;
type Labeler = fn(&Candidate<'_>) -> String;

struct Rule {
    source_type: SourceType,
    matches: Predicate,
    label: Labeler,
}

const RULES: [Rule; 3] = [
    Rule {
        source_type: SourceType::Telegram,
        matches: is_telegram,
        label: telegram_label,
    },
    Rule {
        source_type: SourceType::Git,
        matches: is_git,
        label: git_label,
    },
    Rule {
        source_type: SourceType::Drive,
        matches: is_drive,
        label: drive_label,
    },
];

/// Assigns provenance and display labels to backend source strings
#[derive(Debug, Clone)]
pub struct SourceClassifier {
    /// Lowercased first names
    team_members: Vec<String>,
}

impl Default for SourceClassifier {
    fn default() -> Self {
        Self::new(default_team_members())
    }
}

impl SourceClassifier {
    /// Evaluation order; `Unknown` always matches
    pub const ORDER: [SourceType; 4] = [
        SourceType::Telegram,
        SourceType::Git,
        SourceType::Drive,
        SourceType::Unknown,
    ];

    pub fn new<I, S>(team_members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            team_members: team_members
                .into_iter()
                .map(|name| name.as_ref().trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(&config.team_members)
    }

    /// Classify one source string. Never fails; `content` is the input verbatim.
    pub fn classify(&self, raw: &str) -> SourceFile {
        let candidate = Candidate::new(raw);

        let (source_type, source_label) = RULES
            .iter()
            .find(|rule| (rule.matches)(self, &candidate))
            .map(|rule| (rule.source_type, (rule.label)(&candidate)))
            .unwrap_or((SourceType::Unknown, UNKNOWN_LABEL.to_string()));

        tracing::trace!(source_type = %source_type, label = %source_label, "Classified source");

        SourceFile {
            path: source_type.bucket().to_string(),
            source_type,
            source_label,
            content: raw.to_string(),
            line_start: None,
            line_end: None,
        }
    }

    /// Classify a batch, preserving order
    pub fn classify_all<I, S>(&self, sources: I) -> Vec<SourceFile>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        sources
            .into_iter()
            .map(|raw| self.classify(raw.as_ref()))
            .collect()
    }

    /// Whether the rule for `source_type` alone would accept `raw`,
    /// ignoring the rules ahead of it.
    pub fn matches(&self, source_type: SourceType, raw: &str) -> bool {
        let candidate = Candidate::new(raw);
        RULES
            .iter()
            .find(|rule| rule.source_type == source_type)
            .map_or(true, |rule| (rule.matches)(self, &candidate))
    }

    fn mentions_team_member(&self, lower: &str) -> bool {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| self.team_members.iter().any(|name| name == word))
    }
}

// ============================================
// Telegram
// ============================================

fn is_telegram(classifier: &SourceClassifier, candidate: &Candidate<'_>) -> bool {
    TELEGRAM_WORD.is_match(&candidate.lower)
        || TELEGRAM_TIMESTAMP.is_match(candidate.raw)
        || (MENTION.is_match(candidate.raw) && classifier.mentions_team_member(&candidate.lower))
}

fn telegram_label(candidate: &Candidate<'_>) -> String {
    match TELEGRAM_TIMESTAMP.captures(candidate.raw) {
        Some(caps) => format!("Telegram Chat - {} at {}", &caps[1], &caps[2]),
        None => "Telegram Chat History".to_string(),
    }
}

// ============================================
// Git
// ============================================

fn is_git(_: &SourceClassifier, candidate: &Candidate<'_>) -> bool {
    GIT_KEYWORDS.iter().any(|kw| candidate.lower.contains(kw))
        || LEADING_HASH.is_match(candidate.raw)
        || candidate.raw.contains("GIT COMMIT HISTORY")
        || CONVENTIONAL_SUBJECT.is_match(candidate.raw)
}

fn git_label(candidate: &Candidate<'_>) -> String {
    match HASH_AUTHOR.captures(candidate.raw) {
        Some(caps) => format!("Git Commit - {} by {}", &caps[1][..7], caps[2].trim()),
        None => "Git Repository History".to_string(),
    }
}

// ============================================
// Google Drive
// ============================================

fn is_drive(_: &SourceClassifier, candidate: &Candidate<'_>) -> bool {
    DRIVE_KEYWORDS.iter().any(|kw| candidate.lower.contains(kw))
        || MEMO_WORD.is_match(&candidate.lower)
        || DRIVE_FIELDS.iter().any(|field| candidate.raw.contains(field))
}

fn drive_label(candidate: &Candidate<'_>) -> String {
    let title = drive_title(candidate);
    if title.is_empty() {
        "Google Drive Document".to_string()
    } else {
        format!("Google Drive - {}", title)
    }
}

fn drive_title(candidate: &Candidate<'_>) -> String {
    if let Some(title) = TITLE_FIELD
        .captures(candidate.raw)
        .map(|caps| caps[1].trim().to_string())
        .filter(|title| !title.is_empty())
    {
        return title;
    }

    let lower = candidate.lower.as_str();
    if lower.contains("adr") {
        return ADR_TITLE
            .find(candidate.raw)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| "ADR Document".to_string());
    }
    if lower.contains("post-mortem") || lower.contains("postmortem") {
        return PM_CODE
            .find(candidate.raw)
            .map(|m| format!("Post-Mortem {}", m.as_str()))
            .unwrap_or_else(|| "Post-Mortem".to_string());
    }
    if lower.contains("meeting") {
        return "Meeting Notes".to_string();
    }
    if MEMO_WORD.is_match(lower) {
        return "Team Memo".to_string();
    }
    String::new()
}
