//! HTML bodies for transactional email.

use crate::ports::{PaymentConfirmationEmail, WelcomeEmail};

pub(crate) const WELCOME_SUBJECT: &str = "Welcome to Aionyx!";
pub(crate) const PAYMENT_CONFIRMATION_SUBJECT: &str = "Payment Confirmation";

const BUTTON_STYLE: &str = "display: inline-block; padding: 10px 20px; background-color: #3B82F6; color: white; text-decoration: none; border-radius: 4px; font-weight: 500;";
const PARAGRAPH_STYLE: &str = "margin-top: 0; margin-bottom: 16px; font-size: 16px; color: #111827;";

/// Renders an amount in minor units as a display string, e.g. `$29.00`.
pub fn format_amount(amount: i64, currency: &str) -> String {
    let code = currency.to_ascii_uppercase();
    let (symbol, decimals) = match code.as_str() {
        "USD" => (Some("$"), 2),
        "EUR" => (Some("€"), 2),
        "GBP" => (Some("£"), 2),
        "JPY" => (Some("¥"), 0),
        "KRW" => (Some("₩"), 0),
        _ => (None, 2),
    };

    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    let number = if decimals == 0 {
        abs.to_string()
    } else {
        format!("{}.{:02}", abs / 100, abs % 100)
    };

    match symbol {
        Some(symbol) => format!("{}{}{}", sign, symbol, number),
        None => format!("{}{} {}", sign, number, code),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(inner: &str, link: &str, label: &str) -> String {
    format!(
        r#"<div style="font-family: system-ui, -apple-system, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <div style="text-align: center; margin-bottom: 32px;">
    <h1 style="margin: 0; font-size: 24px; font-weight: bold; color: #3B82F6;">Aionyx</h1>
  </div>
{inner}
  <div style="text-align: center; margin-top: 32px;">
    <a href="{link}" style="{BUTTON_STYLE}">{label}</a>
  </div>
  <p style="margin-top: 32px; margin-bottom: 0; font-size: 14px; color: #6B7280; text-align: center;">The Aionyx Team</p>
</div>"#
    )
}

pub fn welcome_html(email: &WelcomeEmail, app_url: &str) -> String {
    let name = escape_html(&email.first_name);
    let inner = format!(
        r#"  <p style="{PARAGRAPH_STYLE}">Hi {name},</p>
  <p style="{PARAGRAPH_STYLE}">Welcome to Aionyx! We're excited to have you on board.</p>
  <p style="{PARAGRAPH_STYLE}">Here are a few things you can do to get started:</p>
  <ul style="margin-top: 0; margin-bottom: 24px; padding-left: 24px; color: #111827;">
    <li style="margin-bottom: 8px;">Complete your profile</li>
    <li style="margin-bottom: 8px;">Explore our features</li>
    <li style="margin-bottom: 8px;">Check out our documentation</li>
  </ul>
  <p style="{PARAGRAPH_STYLE}">If you have any questions, feel free to reply to this email or contact our support team.</p>"#
    );
    layout(&inner, &format!("{}/dashboard", app_url), "Go to Dashboard")
}

pub fn payment_confirmation_html(email: &PaymentConfirmationEmail, app_url: &str) -> String {
    let name = escape_html(&email.first_name);
    let amount = format_amount(email.amount, &email.currency);
    let plan = escape_html(&email.plan);
    let date = email.date.as_datetime().format("%B %-d, %Y");
    let inner = format!(
        r#"  <p style="{PARAGRAPH_STYLE}">Hi {name},</p>
  <p style="{PARAGRAPH_STYLE}">Thank you for your payment. Here's your receipt:</p>
  <div style="background-color: #F9FAFB; border-radius: 8px; padding: 16px; margin-bottom: 24px;">
    <p style="margin: 0; margin-bottom: 8px;"><strong>Amount:</strong> {amount}</p>
    <p style="margin: 0; margin-bottom: 8px;"><strong>Plan:</strong> {plan}</p>
    <p style="margin: 0;"><strong>Date:</strong> {date}</p>
  </div>
  <p style="{PARAGRAPH_STYLE}">You can view your billing history and manage your subscription from your dashboard.</p>"#
    );
    layout(
        &inner,
        &format!("{}/dashboard/billing", app_url),
        "View Billing Details",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    #[test]
    fn formats_two_decimal_currencies() {
        assert_eq!(format_amount(2900, "usd"), "$29.00");
        assert_eq!(format_amount(5, "eur"), "€0.05");
        assert_eq!(format_amount(-1250, "gbp"), "-£12.50");
    }

    #[test]
    fn formats_zero_decimal_and_unknown_currencies() {
        assert_eq!(format_amount(500, "jpy"), "¥500");
        assert_eq!(format_amount(1999, "chf"), "19.99 CHF");
    }

    #[test]
    fn welcome_links_to_dashboard_and_escapes_name() {
        let html = welcome_html(
            &WelcomeEmail {
                email: "a@b.test".into(),
                first_name: "<Ada>".into(),
            },
            "https://app.aionyx.test",
        );
        assert!(html.contains("Hi &lt;Ada&gt;,"));
        assert!(html.contains(r#"href="https://app.aionyx.test/dashboard""#));
    }

    #[test]
    fn payment_confirmation_shows_receipt() {
        let html = payment_confirmation_html(
            &PaymentConfirmationEmail {
                email: "a@b.test".into(),
                first_name: "Ada".into(),
                amount: 2900,
                currency: "usd".into(),
                plan: "pro".into(),
                date: Timestamp::from_unix_secs(1_700_000_000).unwrap(),
            },
            "https://app.aionyx.test",
        );
        assert!(html.contains("<strong>Amount:</strong> $29.00"));
        assert!(html.contains("<strong>Plan:</strong> pro"));
        assert!(html.contains("<strong>Date:</strong> November 14, 2023"));
        assert!(html.contains("/dashboard/billing"));
    }
}
