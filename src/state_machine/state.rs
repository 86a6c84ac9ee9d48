//! Wizard state types

use crate::report::ReportFields;
use serde::{Deserialize, Serialize};

/// One prompt in the report wizard, in the order they are asked
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Title,
    Period,
    PaidLinks,
    PlannedReach,
    ActualReach,
    Mediaplan,
    OrganicLinks,
    OrganicReach,
    ScreenshotsChoice,
    ScreenshotsCollect,
    Confirm,
}

impl Step {
    pub const ALL: [Step; 11] = [
        Step::Title,
        Step::Period,
        Step::PaidLinks,
        Step::PlannedReach,
        Step::ActualReach,
        Step::Mediaplan,
        Step::OrganicLinks,
        Step::OrganicReach,
        Step::ScreenshotsChoice,
        Step::ScreenshotsCollect,
        Step::Confirm,
    ];

    /// Position in [`Step::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Document,
}

/// Opaque reference to media already uploaded to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub file_id: String,
}

impl MediaRef {
    pub fn photo(file_id: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Photo,
            file_id: file_id.into(),
        }
    }

    pub fn document(file_id: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Document,
            file_id: file_id.into(),
        }
    }
}

/// Screenshots are either uploaded directly or linked as a folder, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Screenshots {
    Folder { url: Option<String> },
    Uploaded { media: Vec<MediaRef> },
}

impl Default for Screenshots {
    fn default() -> Self {
        Screenshots::Folder { url: None }
    }
}

/// Answers collected so far for one report.
///
/// Fields belonging to steps that have not been answered yet stay at their
/// defaults; `step` is the prompt currently awaiting an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDraft {
    pub step: Step,
    pub title: Option<String>,
    pub period: Option<String>,
    pub paid_links: Vec<String>,
    pub planned_reach: Option<u64>,
    pub actual_reach: Option<u64>,
    pub mediaplan_url: Option<String>,
    pub organic_links: Vec<String>,
    pub organic_reach: Option<u64>,
    pub screenshots: Screenshots,
}

impl Default for ReportDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportDraft {
    pub fn new() -> Self {
        Self {
            step: Step::Title,
            title: None,
            period: None,
            paid_links: Vec::new(),
            planned_reach: None,
            actual_reach: None,
            mediaplan_url: None,
            organic_links: Vec::new(),
            organic_reach: None,
            screenshots: Screenshots::default(),
        }
    }

    /// Borrow the answers in the shape the renderer expects
    pub fn fields(&self) -> ReportFields<'_> {
        ReportFields {
            title: self.title.as_deref().unwrap_or_default(),
            period: self.period.as_deref().unwrap_or_default(),
            paid_links: &self.paid_links,
            organic_links: &self.organic_links,
            planned_reach: self.planned_reach.unwrap_or(0),
            actual_reach: self.actual_reach.unwrap_or(0),
            organic_reach: self.organic_reach.unwrap_or(0),
            mediaplan_url: self.mediaplan_url.as_deref(),
            screenshots_folder_url: self.screenshots_folder_url(),
        }
    }

    pub fn screenshots_folder_url(&self) -> Option<&str> {
        match &self.screenshots {
            Screenshots::Folder { url } => url.as_deref(),
            Screenshots::Uploaded { .. } => None,
        }
    }

    /// Uploaded screenshots, empty in folder mode
    pub fn media(&self) -> &[MediaRef] {
        match &self.screenshots {
            Screenshots::Uploaded { media } => media,
            Screenshots::Folder { .. } => &[],
        }
    }

    /// Whether the populated fields match `step` exactly: everything asked
    /// before the current step is answered, nothing after it is.
    pub fn is_consistent(&self) -> bool {
        let past = |step: Step| self.step > step;

        let screenshots_ok = match (&self.screenshots, self.step) {
            (Screenshots::Folder { url: None }, _) => self.step != Step::ScreenshotsCollect,
            (Screenshots::Folder { url: Some(_) }, step) => step == Step::Confirm,
            (Screenshots::Uploaded { media }, step) => {
                !media.is_empty() && step >= Step::ScreenshotsCollect
            }
        };

        self.title.is_some() == past(Step::Title)
            && self.period.is_some() == past(Step::Period)
            && (past(Step::PaidLinks) || self.paid_links.is_empty())
            && self.planned_reach.is_some() == past(Step::PlannedReach)
            && self.actual_reach.is_some() == past(Step::ActualReach)
            && (past(Step::Mediaplan) || self.mediaplan_url.is_none())
            && (past(Step::OrganicLinks) || self.organic_links.is_empty())
            && self.organic_reach.is_some() == past(Step::OrganicReach)
            && screenshots_ok
    }
}

/// Per-conversation wizard state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardState {
    /// No report in progress
    #[default]
    Idle,
    Active { draft: ReportDraft },
}

impl WizardState {
    pub fn draft(&self) -> Option<&ReportDraft> {
        match self {
            WizardState::Idle => None,
            WizardState::Active { draft } => Some(draft),
        }
    }

    pub fn step(&self) -> Option<Step> {
        self.draft().map(|d| d.step)
    }
}

/// Facts about the sender that the transport layer resolves before a
/// transition runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardContext {
    /// Result of the access guard for this sender
    pub authorized: bool,
}

impl WizardContext {
    pub fn authorized() -> Self {
        Self { authorized: true }
    }

    pub fn unauthorized() -> Self {
        Self { authorized: false }
    }
}
