mod avatars;
mod forms;
mod formset;
mod page;
mod seo;
mod views;

pub use avatars::{make_thumbnail, remove_avatar, save_avatar, AVATAR_SIZE};
pub use forms::{check_csrf, FormData, FormErrors, SecureForm, NON_FIELD_ERRORS};
pub use formset::{field_name, PositionRow, PositionsFormset, TOTAL_FORMS};
pub use page::{
    NavUser, PageContext, TAB_ACCOUNT, TAB_ADMINISTRATIVE, TAB_APPLICATIONS, TAB_HOME,
    TAB_NOTIFICATIONS, TAB_PROFILE, TAB_PROJECTS, TAB_SEARCH,
};
pub use seo::Meta;
pub use views::{safe_next, template_to_response, HtmlResult};
