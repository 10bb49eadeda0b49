// Lifecycle services - the rules layer between the HTTP boundary and the store
//
// Each public operation runs its checks and its mutation in one store
// transaction, so invariants such as "one in_progress mission per cat" or
// "1 to 3 targets per mission" cannot be broken by interleaved requests.

pub mod cats;
pub mod errors;
pub mod missions;
pub mod targets;

pub use cats::CatService;
pub use errors::ServiceError;
pub use missions::MissionService;
pub use targets::TargetService;

pub(crate) const CAT_BUSY: &str = "the selected cat is already assigned to an active mission";
pub(crate) const TARGET_NOT_LINKED: &str = "the specified target is not linked to this mission";
