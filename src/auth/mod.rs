mod basic;

pub use basic::{
    hash_password, login_required_middleware, routes, sessions_middleware,
    set_session_cookies, staff_required_middleware, verify_password, AuthenticationToken,
    FormResult, LoginForm, NextParams, SignUpForm,
};
