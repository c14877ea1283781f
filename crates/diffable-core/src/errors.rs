use diffable_core_types::RequestId;
use thiserror::Error;

/// Result type alias using DiffableError
pub type Result<T> = std::result::Result<T, DiffableError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, log assertions and test expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Snapshot preconditions
    DuplicateIdentifier,
    NotFound,
    NoSections,

    // View contract
    InvalidCoordinate,
    ViewContractViolation,

    // Internal
    /// An apply was abandoned before its batch completed
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::DuplicateIdentifier => "ERR_DUPLICATE_IDENTIFIER",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::NoSections => "ERR_NO_SECTIONS",
            ExErrorKind::InvalidCoordinate => "ERR_INVALID_COORDINATE",
            ExErrorKind::ViewContractViolation => "ERR_VIEW_CONTRACT_VIOLATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether this kind reports a caller precondition violation
    /// (as opposed to a broken view contract)
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ExErrorKind::DuplicateIdentifier | ExErrorKind::NotFound | ExErrorKind::NoSections
        )
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling and context
/// for debugging. Every [`DiffableError`] converts into one.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    section: Option<usize>,
    item: Option<usize>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            section: None,
            item: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add identifier context (debug rendering of the offending identifier)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add coordinate context
    pub fn with_coordinate(mut self, section: usize, item: Option<usize>) -> Self {
        self.section = Some(section);
        self.item = item;
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the `(section, item)` coordinate context, if any
    pub fn coordinate(&self) -> Option<(usize, Option<usize>)> {
        self.section.map(|section| (section, self.item))
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (id: {})", entity_id)?;
        }
        if let Some(section) = self.section {
            match self.item {
                Some(item) => write!(f, " (at: [{}, {}])", section, item)?,
                None => write!(f, " (at: section {})", section)?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for snapshot mutation and data source callbacks
///
/// Identifiers are carried as their `Debug` rendering so the error type
/// stays independent of the identifier types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffableError {
    // ===== Precondition Violations =====
    /// Section identifier already present in the snapshot (or repeated in the input)
    #[error("Section identifier already exists: {section_id}")]
    DuplicateSection { section_id: String },

    /// Item identifier already present in the snapshot (or repeated in the input)
    #[error("Item identifier already exists: {item_id}")]
    DuplicateItem { item_id: String },

    /// Section identifier not present in the snapshot
    #[error("Section not found: {section_id}")]
    SectionNotFound { section_id: String },

    /// Item identifier not present in the snapshot
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: String },

    /// Items were appended without a target section while the snapshot has none
    #[error("Cannot append items: snapshot has no sections")]
    NoSections,

    // ===== View Contract Violations =====
    /// The view asked for a coordinate the live snapshot does not contain
    #[error("Index path [{section}, {item}] is out of bounds")]
    InvalidIndexPath { section: usize, item: usize },

    /// The cell provider produced no cell for a coordinate that exists
    #[error("Cell provider returned no cell for [{section}, {item}] (item {item_id})")]
    CellProviderReturnedNone {
        section: usize,
        item: usize,
        item_id: String,
    },

    /// The supplementary view provider produced no view for the requested kind
    #[error("Supplementary view provider returned no view of kind '{kind}' for [{section}, {item}]")]
    SupplementaryProviderReturnedNone {
        kind: String,
        section: usize,
        item: usize,
    },
}

impl DiffableError {
    pub(crate) fn duplicate_section(id: &impl std::fmt::Debug) -> Self {
        DiffableError::DuplicateSection {
            section_id: format!("{:?}", id),
        }
    }

    pub(crate) fn duplicate_item(id: &impl std::fmt::Debug) -> Self {
        DiffableError::DuplicateItem {
            item_id: format!("{:?}", id),
        }
    }

    pub(crate) fn section_not_found(id: &impl std::fmt::Debug) -> Self {
        DiffableError::SectionNotFound {
            section_id: format!("{:?}", id),
        }
    }

    pub(crate) fn item_not_found(id: &impl std::fmt::Debug) -> Self {
        DiffableError::ItemNotFound {
            item_id: format!("{:?}", id),
        }
    }
}

impl From<DiffableError> for ExError {
    fn from(err: DiffableError) -> Self {
        match err {
            DiffableError::DuplicateSection { section_id } => {
                ExError::new(ExErrorKind::DuplicateIdentifier)
                    .with_entity_id(section_id)
                    .with_message("Section identifier already exists")
            }

            DiffableError::DuplicateItem { item_id } => {
                ExError::new(ExErrorKind::DuplicateIdentifier)
                    .with_entity_id(item_id)
                    .with_message("Item identifier already exists")
            }

            DiffableError::SectionNotFound { section_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(section_id)
                .with_message("Section not found"),

            DiffableError::ItemNotFound { item_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(item_id)
                .with_message("Item not found"),

            DiffableError::NoSections => ExError::new(ExErrorKind::NoSections)
                .with_op("append_items")
                .with_message("Snapshot has no sections to append into"),

            DiffableError::InvalidIndexPath { section, item } => {
                ExError::new(ExErrorKind::InvalidCoordinate)
                    .with_coordinate(section, Some(item))
                    .with_message("Index path is out of bounds")
            }

            DiffableError::CellProviderReturnedNone {
                section,
                item,
                item_id,
            } => ExError::new(ExErrorKind::ViewContractViolation)
                .with_op("cell")
                .with_entity_id(item_id)
                .with_coordinate(section, Some(item))
                .with_message("Cell provider returned no cell"),

            DiffableError::SupplementaryProviderReturnedNone {
                kind,
                section,
                item,
            } => ExError::new(ExErrorKind::ViewContractViolation)
                .with_op("supplementary_view")
                .with_coordinate(section, Some(item))
                .with_message(format!(
                    "Supplementary view provider returned no view of kind '{}'",
                    kind
                )),
        }
    }
}
