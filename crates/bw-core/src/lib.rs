pub mod catalog;
pub mod error;
pub mod event;
pub mod form;
pub mod id;
pub mod model;
pub mod project;
pub mod store;

pub use error::{BlockError, RelationshipError, ValidationError};
pub use event::{BlockEvent, SubscriptionId, Subscribers};
pub use form::{BlockForm, FormDiagnostic, FormSeverity, form_to_block_type, validate_form};
pub use id::{BlockId, IdAllocator};
pub use model::*;
pub use project::{FILE_VERSION, ProjectError, ProjectFile, TemplateFile};
pub use store::{BlockStore, IntegrityIssue, StoreSnapshot, validate_block, validate_name};
