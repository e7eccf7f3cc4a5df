//! HTML email bodies for try-on results.
//!
//! Every interpolated value (garment ids, URLs, failure reasons) is
//! HTML-escaped before it reaches the markup.

use std::fmt::Write;

use drapely_core::outcome::PipelineOutcome;
use drapely_core::types::{GarmentId, Tier};
use indexmap::IndexMap;

use crate::notification::Notification;

/// Subject line and HTML body of one email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Links embedded in every email.
#[derive(Debug, Clone, Copy)]
pub struct Branding<'a> {
    pub frontend_url: &'a str,
    pub logo_url: &'a str,
}

/// Render the email for a notification, success or failure.
pub fn render(notification: &Notification, branding: Branding<'_>) -> RenderedEmail {
    match &notification.outcome {
        PipelineOutcome::Success { urls } => RenderedEmail {
            subject: success_subject(notification.tier),
            html: success_html(urls, notification.tier, branding),
        },
        PipelineOutcome::Failure { reason } => RenderedEmail {
            subject: failure_subject(notification.tier),
            html: failure_html(reason, notification.tier, branding),
        },
    }
}

pub fn success_subject(tier: Tier) -> String {
    format!("Your Virtual Try-On Results Are Ready! ({} Plan)", tier.label())
}

pub fn failure_subject(tier: Tier) -> String {
    format!("Virtual Try-On Processing Error ({} Plan)", tier.label())
}

fn success_html(urls: &IndexMap<GarmentId, String>, tier: Tier, branding: Branding<'_>) -> String {
    let mut results = String::new();
    for (garment_id, url) in urls {
        let _ = write!(
            results,
            r#"<div style="margin:15px 0;padding:20px;border:1px solid #f0f0f0;border-radius:8px;">
<p style="margin:0 0 10px 0;font-weight:600;">Product: {garment}</p>
<a href="{url}" target="_blank" style="display:inline-block;padding:12px 24px;background:#ff4757;color:#fff;text-decoration:none;border-radius:6px;">View Try-On Result</a>
</div>
"#,
            garment = escape_html(garment_id),
            url = escape_html(url),
        );
    }

    let body = format!(
        r#"<p style="font-size:18px;font-weight:600;">Your Virtual Try-On is Complete!</p>
<p>We processed <strong>{count}</strong> garment(s) for your personalized try-on.</p>
<p>Plan: <strong>{tier}</strong> &middot; Total Processed: <strong>{count}</strong></p>
<h2 style="font-size:22px;">Your Try-On Results</h2>
{results}<p style="text-align:center;"><a href="{products}" style="display:inline-block;padding:16px 40px;background:#ff4757;color:#fff;text-decoration:none;border-radius:8px;">View All Products</a></p>"#,
        count = urls.len(),
        tier = tier.label(),
        products = escape_html(&products_url(branding.frontend_url)),
    );

    layout("Virtual Try-On Complete", &body, branding)
}

fn failure_html(reason: &str, tier: Tier, branding: Branding<'_>) -> String {
    let body = format!(
        r#"<p>Hello,</p>
<p>We encountered an error while processing your virtual try-on request. Please try again or contact support if the issue persists.</p>
<div style="background:#fff5f7;padding:15px;border-left:4px solid #ff6b9d;">
<p style="margin:0;"><strong>Plan:</strong> {tier}<br><strong>Error:</strong> {reason}</p>
</div>
<p style="text-align:center;"><a href="{products}" style="display:inline-block;padding:16px 40px;background:#ff4757;color:#fff;text-decoration:none;border-radius:8px;">Try Again</a></p>"#,
        tier = tier.label(),
        reason = escape_html(reason),
        products = escape_html(&products_url(branding.frontend_url)),
    );

    layout("Virtual Try-On Processing Error", &body, branding)
}

fn layout(title: &str, body: &str, branding: Branding<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><meta name="viewport" content="width=device-width, initial-scale=1.0"><title>{title} - DRAPELY.ai</title></head>
<body style="font-family:-apple-system,'Segoe UI',Roboto,Arial,sans-serif;color:#333;background:#fafafa;margin:0;padding:40px 20px;">
<div style="max-width:600px;margin:0 auto;background:#fff;border-radius:12px;overflow:hidden;">
<div style="padding:40px 30px;text-align:center;border-bottom:2px solid #ff6b9d;"><img src="{logo}" alt="DRAPELY.ai" style="max-width:180px;height:auto;"></div>
<div style="padding:40px 30px;">
{body}
<p style="margin-top:40px;text-align:center;color:#888;font-size:14px;">Thank you for using DRAPELY.ai Virtual Try-On.</p>
</div>
</div>
</body>
</html>
"#,
        logo = escape_html(branding.logo_url),
    )
}

fn products_url(frontend_url: &str) -> String {
    format!("{}/products", frontend_url.trim_end_matches('/'))
}

/// Escape the five HTML-significant characters.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
