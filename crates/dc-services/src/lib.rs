//! # dc-services
//!
//! The flows behind every DocConstruct screen.
//!
//! A flow validates through its contract, calls the backend through the
//! resource traits in `dc-client`, keeps local list state in sync and
//! reports the outcome to a [`Notifier`]. Failures are returned as well
//! as reported, so callers can decide what happens next.

pub mod base;
pub mod notify;
pub mod errors;
pub mod list;
pub mod projects;
pub mod professionals;
pub mod municipalities;
pub mod assignments;
pub mod file_area;
pub mod wizard;
pub mod surveys;
pub mod accounts;
pub mod delete;

pub use accounts::AccountService;
pub use assignments::AssignmentService;
pub use base::ServiceContext;
pub use delete::{DeleteFlow, DeleteState};
pub use errors::describe_error;
pub use file_area::{reconcile, FileArea, FileAreaService, FileEntry, FileOwner};
pub use list::EntityList;
pub use municipalities::{MunicipalityService, MunicipalitySetup};
pub use notify::{CollectingNotifier, Notice, NoticeLevel, Notifier, NotifierExt, TracingNotifier};
pub use professionals::{group_by_type, ProfessionalGroup, ProfessionalService};
pub use projects::{ProjectDetail, ProjectService};
pub use surveys::SurveySearch;
pub use wizard::{ProjectWizard, WizardError, WizardService};
