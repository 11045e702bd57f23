mod infrastructure;
mod middlewares;
mod routes;
mod services;

pub use infrastructure::AuthenticationToken;
pub use middlewares::{login_required_middleware, sessions_middleware, staff_required_middleware};
pub use routes::routes;
pub use services::{
    hash_password, set_session_cookies, verify_password, FormResult, LoginForm, NextParams,
    SignUpForm,
};
