//! Query code, one repository per table plus the stored-function wrappers.

pub mod group_repo;
pub mod membership_repo;
pub mod notification_job_repo;
pub mod preference_rpc;
pub mod recipient_repo;

pub use group_repo::GroupRepo;
pub use membership_repo::MembershipRepo;
pub use notification_job_repo::NotificationJobRepo;
pub use preference_rpc::PreferenceRpc;
pub use recipient_repo::RecipientRepo;
