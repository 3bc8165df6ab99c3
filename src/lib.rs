//! Subscription-gated access control and timed learning sessions for the
//! exam-preparation portal.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub mod models {
    pub mod access;
    pub mod content;
    pub mod credential;
    pub mod session;
}

pub mod services {
    pub mod access_gate;
    pub mod api;
    pub mod content;
    pub mod credentials;
    pub mod navigation;
    pub mod page;
    pub mod session_timer;
    pub mod sessions;
    pub mod syllabus;
}

pub mod handlers {
    pub mod auth;
    pub mod content;
    pub mod response;
    pub mod sessions;
    pub mod syllabus;
}

pub mod middleware_layer {
    pub mod credentials;
}

pub mod validation {
    pub mod content;
    pub mod syllabus;
}
