pub mod lifecycle;
pub mod mailer;
pub mod notify;
pub mod token;
