//! The step-gated workflow that owns all session state.
//!
//! ```text
//!  1 ScriptEntered ──extract──▶ 2 ShotlistGenerated ──filters──▶ 3 FiltersConfigured
//!                                        │                              │
//!                                        └──────────search──────────────┤
//!                                                                       ▼
//!  6 Exported ◀──csv/zip── 5 SelectionMade ◀──select/toggle── 4 SearchedProvider
//!
//!  any ──reset──▶ 1 ScriptEntered
//! ```
//!
//! Every operation first asks the transition table ([`Step::next`]) whether
//! its event is legal from the current step. Illegal calls fail with
//! [`Error::InvalidStep`] before touching any state, and failed operations
//! leave both the step and the data exactly as they were.

use tracing::info;

use crate::bundle::{self, Bundle, ContentFetcher};
use crate::error::{Error, Result};
use crate::export;
use crate::extractor;
use crate::filters::FilterConfig;
use crate::gateway::MediaGateway;
use crate::llm::TextModel;
use crate::models::{MediaKind, Person, PersonResults, Selection};
use crate::progress::ProgressReporter;
use crate::search::{self, SearchPolicy};
use crate::selection::SelectionLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    ScriptEntered,
    ShotlistGenerated,
    FiltersConfigured,
    SearchedProvider,
    SelectionMade,
    Exported,
}

/// Things that move the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    ScriptSubmitted,
    ShotlistGenerated,
    FiltersConfigured,
    SearchCompleted,
    /// The ledger changed and holds at least one selection.
    SelectionMade,
    /// The ledger changed (possibly to empty).
    SelectionChanged,
    Exported,
    Reset,
}

impl Step {
    pub fn number(&self) -> u8 {
        match self {
            Step::ScriptEntered => 1,
            Step::ShotlistGenerated => 2,
            Step::FiltersConfigured => 3,
            Step::SearchedProvider => 4,
            Step::SelectionMade => 5,
            Step::Exported => 6,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::ScriptEntered => "script entered",
            Step::ShotlistGenerated => "shotlist generated",
            Step::FiltersConfigured => "filters configured",
            Step::SearchedProvider => "searched provider",
            Step::SelectionMade => "selection made",
            Step::Exported => "exported",
        }
    }

    /// The transition table. `None` means the event is illegal here.
    pub fn next(self, event: Event) -> Option<Step> {
        use Step::*;
        match (self, event) {
            (_, Event::Reset) => Some(ScriptEntered),

            (ScriptEntered, Event::ScriptSubmitted) => Some(ScriptEntered),
            (ScriptEntered, Event::ShotlistGenerated) => Some(ShotlistGenerated),

            (ShotlistGenerated | FiltersConfigured, Event::FiltersConfigured) => {
                Some(FiltersConfigured)
            }
            (ShotlistGenerated | FiltersConfigured, Event::SearchCompleted) => {
                Some(SearchedProvider)
            }

            (SearchedProvider, Event::SelectionChanged) => Some(SearchedProvider),
            (SearchedProvider | SelectionMade, Event::SelectionMade) => Some(SelectionMade),
            (SelectionMade | Exported, Event::SelectionChanged) => Some(self),
            (Exported, Event::SelectionMade) => Some(Exported),

            (SelectionMade | Exported, Event::Exported) => Some(Exported),

            _ => None,
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.number(), self.name())
    }
}

/// Single owner of the script, people, results, selections, and export.
#[derive(Debug)]
pub struct Workflow {
    step: Step,
    script: String,
    people: Vec<Person>,
    filter: FilterConfig,
    default_filter: FilterConfig,
    policy: SearchPolicy,
    results: Vec<PersonResults>,
    ledger: SelectionLedger,
    export: Option<String>,
}

impl Workflow {
    pub fn new(filter: FilterConfig, policy: SearchPolicy) -> Self {
        Self {
            step: Step::ScriptEntered,
            script: String::new(),
            people: Vec::new(),
            filter: filter.clone(),
            default_filter: filter,
            policy,
            results: Vec::new(),
            ledger: SelectionLedger::new(),
            export: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn filter(&self) -> &FilterConfig {
        &self.filter
    }

    pub fn policy(&self) -> &SearchPolicy {
        &self.policy
    }

    pub fn results(&self) -> &[PersonResults] {
        &self.results
    }

    pub fn selections(&self) -> &[Selection] {
        self.ledger.as_slice()
    }

    pub fn ledger(&self) -> &SelectionLedger {
        &self.ledger
    }

    /// The last compiled CSV, if the selection has not changed since.
    pub fn export_text(&self) -> Option<&str> {
        self.export.as_deref()
    }

    pub fn is_selected(&self, entity_index: usize, media_id: &str) -> bool {
        self.ledger.is_selected(entity_index, media_id)
    }

    fn require(&self, action: &'static str, event: Event) -> Result<Step> {
        self.step.next(event).ok_or(Error::InvalidStep {
            action,
            current: self.step,
        })
    }

    /// Stores the script text (step 1).
    pub fn submit_script(&mut self, text: &str) -> Result<()> {
        let next = self.require("submit a script", Event::ScriptSubmitted)?;
        if text.trim().is_empty() {
            return Err(Error::Extraction("script is empty".into()));
        }
        self.script = text.to_string();
        self.step = next;
        Ok(())
    }

    /// Extracts the people list from the stored script.
    pub async fn generate_shotlist(&mut self, model: &dyn TextModel) -> Result<&[Person]> {
        let next = self.require("generate a shotlist", Event::ShotlistGenerated)?;
        let people = extractor::extract_people(model, &self.script).await?;
        self.people = people;
        self.step = next;
        Ok(&self.people)
    }

    pub fn configure_filters(&mut self, filter: FilterConfig) -> Result<()> {
        let next = self.require("change filters", Event::FiltersConfigured)?;
        self.filter = filter;
        self.step = next;
        Ok(())
    }

    /// Searches the provider for every person. All-or-nothing.
    pub async fn search(
        &mut self,
        gateway: &dyn MediaGateway,
        progress: &dyn ProgressReporter,
    ) -> Result<&[PersonResults]> {
        let next = self.require("search", Event::SearchCompleted)?;
        let results =
            search::search_all(gateway, &self.people, &self.filter, &self.policy, progress)
                .await?;
        self.results = results;
        self.step = next;
        Ok(&self.results)
    }

    fn person_results(&self, entity_index: usize) -> Result<&PersonResults> {
        self.results.get(entity_index).ok_or_else(|| {
            Error::NotFound(format!(
                "person #{} (there are {})",
                entity_index + 1,
                self.results.len()
            ))
        })
    }

    // Checks that selections may change at all from this step.
    fn require_selectable(&self, action: &'static str) -> Result<()> {
        self.require(action, Event::SelectionChanged).map(|_| ())
    }

    // Invalidates the cached export and advances the step after a mutation.
    fn selection_changed(&mut self) {
        self.export = None;
        let event = if self.ledger.is_empty() {
            Event::SelectionChanged
        } else {
            Event::SelectionMade
        };
        if let Some(next) = self.step.next(event) {
            self.step = next;
        }
    }

    /// Toggles one result. Returns `true` if it is selected afterwards.
    pub fn toggle(&mut self, entity_index: usize, kind: MediaKind, media_id: &str) -> Result<bool> {
        self.require_selectable("change the selection")?;
        let result = self.person_results(entity_index)?;
        let media = result.find(kind, media_id).cloned().ok_or_else(|| {
            Error::NotFound(format!(
                "{} {} for {}",
                kind, media_id, result.person.name
            ))
        })?;
        let name = result.person.name.clone();

        let selected = self.ledger.toggle(entity_index, &name, &media, kind);
        self.selection_changed();
        Ok(selected)
    }

    /// Selects every result of `kind` for one person. Returns how many are
    /// selected afterwards.
    pub fn select_all_of_kind(&mut self, entity_index: usize, kind: MediaKind) -> Result<usize> {
        self.require_selectable("change the selection")?;
        let result = self.person_results(entity_index)?;
        let items = result.items(kind).to_vec();
        let name = result.person.name.clone();

        let selected = self
            .ledger
            .select_all_of_kind(entity_index, &name, &items, kind);
        self.selection_changed();
        Ok(selected)
    }

    pub fn deselect_all_of_kind(&mut self, entity_index: usize, kind: MediaKind) -> Result<()> {
        self.require_selectable("change the selection")?;
        self.person_results(entity_index)?;
        self.ledger.deselect_all_of_kind(entity_index, kind);
        self.selection_changed();
        Ok(())
    }

    pub fn select_all_global(&mut self, kind: MediaKind) -> Result<usize> {
        self.require_selectable("change the selection")?;
        self.ledger.select_all_global(kind, &self.results);
        self.selection_changed();
        Ok(self.ledger.count_of_kind(kind))
    }

    pub fn deselect_all_global(&mut self, kind: MediaKind) -> Result<()> {
        self.require_selectable("change the selection")?;
        self.ledger.deselect_all_global(kind);
        self.selection_changed();
        Ok(())
    }

    /// Compiles (or returns the cached) CSV export of the selection.
    pub fn compile_export(&mut self) -> Result<&str> {
        let next = self.require("export", Event::Exported)?;
        if self.export.is_none() {
            let csv = export::compile(self.ledger.as_slice(), &self.results)?;
            info!(rows = export::row_count(&csv), "compiled export");
            self.export = Some(csv);
        }
        self.step = next;
        Ok(self.export.as_deref().unwrap_or_default())
    }

    /// Downloads and zips the selection.
    pub async fn package_bundle(
        &mut self,
        fetcher: &dyn ContentFetcher,
        concurrency: usize,
        progress: &dyn ProgressReporter,
    ) -> Result<Bundle> {
        let next = self.require("package a bundle", Event::Exported)?;
        let bundle =
            bundle::package(fetcher, self.ledger.as_slice(), concurrency, progress).await?;
        self.step = next;
        Ok(bundle)
    }

    /// Discards everything and returns to step 1. Filters go back to their
    /// configured defaults.
    pub fn reset(&mut self) {
        self.step = Step::ScriptEntered;
        self.script.clear();
        self.people.clear();
        self.filter = self.default_filter.clone();
        self.results.clear();
        self.ledger.clear();
        self.export = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_numbers_run_one_to_six() {
        let steps = [
            Step::ScriptEntered,
            Step::ShotlistGenerated,
            Step::FiltersConfigured,
            Step::SearchedProvider,
            Step::SelectionMade,
            Step::Exported,
        ];
        let numbers: Vec<u8> = steps.iter().map(|s| s.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn transitions_never_go_backwards_except_reset() {
        let steps = [
            Step::ScriptEntered,
            Step::ShotlistGenerated,
            Step::FiltersConfigured,
            Step::SearchedProvider,
            Step::SelectionMade,
            Step::Exported,
        ];
        let events = [
            Event::ScriptSubmitted,
            Event::ShotlistGenerated,
            Event::FiltersConfigured,
            Event::SearchCompleted,
            Event::SelectionMade,
            Event::SelectionChanged,
            Event::Exported,
        ];
        for step in steps {
            for event in events {
                if let Some(next) = step.next(event) {
                    assert!(next >= step, "{:?} --{:?}--> {:?}", step, event, next);
                }
            }
            assert_eq!(step.next(Event::Reset), Some(Step::ScriptEntered));
        }
    }

    #[test]
    fn cannot_export_before_selecting() {
        for step in [
            Step::ScriptEntered,
            Step::ShotlistGenerated,
            Step::FiltersConfigured,
            Step::SearchedProvider,
        ] {
            assert_eq!(step.next(Event::Exported), None);
        }
    }

    #[test]
    fn cannot_search_twice() {
        assert_eq!(Step::SearchedProvider.next(Event::SearchCompleted), None);
        assert_eq!(Step::SelectionMade.next(Event::SearchCompleted), None);
    }

    #[test]
    fn invalid_operations_leave_state_untouched() {
        let mut wf = Workflow::new(FilterConfig::default(), SearchPolicy::default());
        assert!(matches!(
            wf.toggle(0, MediaKind::Video, "v1"),
            Err(Error::InvalidStep { .. })
        ));
        assert!(matches!(
            wf.compile_export(),
            Err(Error::InvalidStep { .. })
        ));
        assert!(matches!(
            wf.configure_filters(FilterConfig::default()),
            Err(Error::InvalidStep { .. })
        ));
        assert_eq!(wf.step(), Step::ScriptEntered);
    }

    #[test]
    fn empty_script_is_rejected() {
        let mut wf = Workflow::new(FilterConfig::default(), SearchPolicy::default());
        assert!(wf.submit_script("   \n").is_err());
        assert!(wf.script().is_empty());
        wf.submit_script("Jane Doe spoke.").unwrap();
        assert_eq!(wf.script(), "Jane Doe spoke.");
        assert_eq!(wf.step(), Step::ScriptEntered);
    }

    #[test]
    fn reset_restores_default_filters() {
        let mut defaults = FilterConfig::default();
        defaults.variety = true;
        let mut wf = Workflow::new(defaults.clone(), SearchPolicy::default());
        wf.submit_script("x").unwrap();
        wf.reset();
        assert_eq!(wf.filter(), &defaults);
        assert_eq!(wf.step(), Step::ScriptEntered);
        assert!(wf.script().is_empty());
    }
}
