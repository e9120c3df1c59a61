//! Facet selection and the filter compiler.
//!
//! A browse request may constrain the catalog along seven independent facet
//! kinds. Ids within one kind combine with OR; kinds combine with AND. An
//! empty kind places no constraint.
//!
//! Raw ids arrive as untrusted strings. [`FacetSelection::compile`] is the
//! only way to obtain [`CompiledFilters`], and it rejects anything that is
//! not a plain non-negative integer. The compiled form is what the store's
//! filtering procedure consumes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ArcadeError, Result};
use crate::ids::FacetId;

// ============================================================================
// Facet kinds
// ============================================================================

/// One of the seven facet dimensions of the catalog.
///
/// The declaration order is the parameter order of the filtering procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    /// Genre ids.
    Genre,
    /// Category ids.
    Category,
    /// Tag ids.
    Tag,
    /// Interface language ids.
    Language,
    /// Audio language ids.
    AudioLanguage,
    /// Developer ids.
    Developer,
    /// Publisher ids.
    Publisher,
}

impl FacetKind {
    /// All kinds in procedure parameter order.
    pub const ALL: [Self; 7] = [
        Self::Genre,
        Self::Category,
        Self::Tag,
        Self::Language,
        Self::AudioLanguage,
        Self::Developer,
        Self::Publisher,
    ];

    /// The query-string parameter name for this kind.
    #[must_use]
    pub const fn param(self) -> &'static str {
        match self {
            Self::Genre => "genre",
            Self::Category => "category",
            Self::Tag => "tag",
            Self::Language => "language",
            Self::AudioLanguage => "audio_language",
            Self::Developer => "developer",
            Self::Publisher => "publisher",
        }
    }
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param())
    }
}

impl FromStr for FacetKind {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|k| k.param() == s).ok_or(())
    }
}

// ============================================================================
// Selection (untrusted)
// ============================================================================

/// The facet ids selected on a browse request, still as raw strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetSelection {
    raw: BTreeMap<FacetKind, BTreeSet<String>>,
}

impl FacetSelection {
    /// An empty selection (browse everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from query-string pairs.
    ///
    /// Keys that are not facet parameters are ignored. Blank values mean
    /// "nothing selected" and are skipped.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut selection = Self::new();
        for (key, value) in pairs {
            if let Ok(kind) = key.parse::<FacetKind>() {
                selection.insert(kind, value);
            }
        }
        selection
    }

    /// Add one raw id for `kind`.
    pub fn insert(&mut self, kind: FacetKind, raw_id: &str) {
        if raw_id.is_empty() {
            return;
        }
        self.raw.entry(kind).or_default().insert(raw_id.to_string());
    }

    /// True iff no kind has any selected id.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.raw.values().all(BTreeSet::is_empty)
    }

    /// Validate every id and produce the typed parameter set.
    ///
    /// # Errors
    ///
    /// Returns `ArcadeError::InvalidFilter` for the first id that is not a
    /// non-negative integer.
    pub fn compile(&self) -> Result<CompiledFilters> {
        let mut ids = BTreeMap::new();
        for (kind, raw_ids) in &self.raw {
            let parsed = raw_ids
                .iter()
                .map(|raw| {
                    raw.parse::<FacetId>()
                        .map_err(|_| ArcadeError::InvalidFilter {
                            kind: kind.param().to_string(),
                            value: raw.clone(),
                        })
                })
                .collect::<Result<BTreeSet<_>>>()?;
            if !parsed.is_empty() {
                ids.insert(*kind, parsed);
            }
        }
        Ok(CompiledFilters { ids })
    }
}

// ============================================================================
// Compiled filters (trusted)
// ============================================================================

/// Validated facet ids, ready to be passed to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFilters {
    ids: BTreeMap<FacetKind, BTreeSet<FacetId>>,
}

impl CompiledFilters {
    /// True iff no kind constrains the result.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.ids.is_empty()
    }

    /// The selected ids for `kind`, ascending.
    pub fn ids(&self, kind: FacetKind) -> impl Iterator<Item = FacetId> + '_ {
        self.ids.get(&kind).into_iter().flatten().copied()
    }

    /// Whether `id` is selected for `kind`.
    #[must_use]
    pub fn is_selected(&self, kind: FacetKind, id: FacetId) -> bool {
        self.ids.get(&kind).is_some_and(|set| set.contains(&id))
    }

    /// The comma-joined id list for `kind`; empty when unconstrained.
    #[must_use]
    pub fn joined(&self, kind: FacetKind) -> String {
        self.ids(kind)
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The seven procedure parameters, in [`FacetKind::ALL`] order.
    #[must_use]
    pub fn params(&self) -> [String; 7] {
        FacetKind::ALL.map(|kind| self.joined(kind))
    }

    /// The selected ids as query-string pairs, for building page links.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        self.ids
            .iter()
            .flat_map(|(kind, set)| set.iter().map(|id| (kind.param(), id.to_string())))
            .collect()
    }
}

// ============================================================================
// Vocabulary
// ============================================================================

/// One selectable facet value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    /// Store key.
    pub id: FacetId,
    /// Display name.
    pub name: String,
}

/// Every facet value known to the store, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetVocabulary {
    groups: BTreeMap<FacetKind, Vec<Facet>>,
}

/// A facet value projected for display, with its selection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetOption {
    /// Store key.
    pub id: FacetId,
    /// Display name.
    pub name: String,
    /// Whether the current request selected it.
    pub selected: bool,
}

/// All options of one facet kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetGroupView {
    /// The facet kind.
    pub kind: FacetKind,
    /// Options in store order.
    pub options: Vec<FacetOption>,
}

impl FacetVocabulary {
    /// Replace the values for `kind`.
    pub fn set(&mut self, kind: FacetKind, facets: Vec<Facet>) {
        self.groups.insert(kind, facets);
    }

    /// The values for `kind`.
    #[must_use]
    pub fn get(&self, kind: FacetKind) -> &[Facet] {
        self.groups.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Project every group, marking the ids present in `filters`.
    #[must_use]
    pub fn mark(&self, filters: &CompiledFilters) -> Vec<FacetGroupView> {
        FacetKind::ALL
            .into_iter()
            .map(|kind| FacetGroupView {
                kind,
                options: self
                    .get(kind)
                    .iter()
                    .map(|facet| FacetOption {
                        id: facet.id,
                        name: facet.name.clone(),
                        selected: filters.is_selected(kind, facet.id),
                    })
                    .collect(),
            })
            .collect()
    }
}
