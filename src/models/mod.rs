mod applicant;
mod notification;
mod project;
mod skill;
mod user;

pub use applicant::{Applicant, ApplicationDetail, ApplicationStatus};
pub use notification::{
    accepted_message, pending_application_message, rejected_message, skill_accepted_message,
    skill_denied_message, Notification, NotificationFilter,
};
pub use project::{escape_like, NewPosition, Position, Project, ProjectForm, ProjectWithPositions};
pub use skill::{readable_to_url, url_to_readable, AllSkills, Skill, SkillConfirmation};
pub use user::{normalize_email, ProfileChanges, User, UserWithPassword};
