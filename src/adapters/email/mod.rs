//! Email adapters: Resend over HTTP, and an in-memory recorder for tests.

mod mock_email_sender;
mod resend_email_sender;
mod templates;

pub use mock_email_sender::MockEmailSender;
pub use resend_email_sender::{ResendConfig, ResendEmailSender};
pub use templates::format_amount;
