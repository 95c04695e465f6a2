//! Display helpers. Values arrive raw from the API (cents, fractions, ISO
//! timestamps) and are only converted here, at render time.

use chrono::{DateTime, Utc};

/// Host of a URL or bare domain, without `www.`.
pub fn extract_domain(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let parsed = url::Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}

pub fn favicon_url(domain: &str) -> String {
    format!(
        "https://www.google.com/s2/favicons?domain={}&sz=32",
        urlencoding::encode(domain)
    )
}

/// Brand name, short mark and accent color for an integration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderBadge {
    pub name: &'static str,
    pub mark: &'static str,
    pub color: &'static str,
}

const UNKNOWN_PROVIDER: ProviderBadge = ProviderBadge {
    name: "Other",
    mark: "?",
    color: "#6b7280",
};

pub fn payment_provider_badge(kind: &str) -> ProviderBadge {
    match kind.to_ascii_lowercase().as_str() {
        "stripe" => ProviderBadge {
            name: "Stripe",
            mark: "S",
            color: "#635bff",
        },
        "paddle" => ProviderBadge {
            name: "Paddle",
            mark: "P",
            color: "#ffcc00",
        },
        "lemonsqueezy" | "lemon_squeezy" | "lemon-squeezy" => ProviderBadge {
            name: "Lemon Squeezy",
            mark: "L",
            color: "#7047eb",
        },
        "polar" => ProviderBadge {
            name: "Polar",
            mark: "Po",
            color: "#0062ff",
        },
        _ => UNKNOWN_PROVIDER,
    }
}

pub fn llm_provider_badge(kind: &str) -> ProviderBadge {
    match kind.to_ascii_lowercase().as_str() {
        "openai" => ProviderBadge {
            name: "OpenAI",
            mark: "AI",
            color: "#10a37f",
        },
        "anthropic" => ProviderBadge {
            name: "Anthropic",
            mark: "A",
            color: "#d97757",
        },
        "google" | "gemini" => ProviderBadge {
            name: "Google",
            mark: "G",
            color: "#4285f4",
        },
        "mistral" => ProviderBadge {
            name: "Mistral",
            mark: "M",
            color: "#fa520f",
        },
        "openrouter" => ProviderBadge {
            name: "OpenRouter",
            mark: "OR",
            color: "#6566f1",
        },
        _ => UNKNOWN_PROVIDER,
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "INR" => Some("₹"),
        "CAD" => Some("CA$"),
        "AUD" => Some("A$"),
        _ => None,
    }
}

/// Currencies without minor units still arrive in "cents" of one unit each.
fn minor_digits(code: &str) -> u32 {
    match code {
        "JPY" | "KRW" => 0,
        _ => 2,
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_number(n: u64) -> String {
    group_thousands(&n.to_string())
}

/// `123456, "USD"` -> `$1,234.56`. Unknown codes are spelled out: `CHF 12.00`.
pub fn format_currency(cents: i64, currency: Option<&str>) -> String {
    let code = currency.unwrap_or("USD").to_ascii_uppercase();
    let digits = minor_digits(&code);
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();

    let amount = if digits == 0 {
        group_thousands(&abs.to_string())
    } else {
        let scale = 10u64.pow(digits);
        format!(
            "{}.{:0width$}",
            group_thousands(&(abs / scale).to_string()),
            abs % scale,
            width = digits as usize
        )
    };

    match currency_symbol(&code) {
        Some(symbol) => format!("{}{}{}", sign, symbol, amount),
        None => format!("{}{} {}", sign, code, amount),
    }
}

/// LLM spend, which is often fractions of a cent.
pub fn format_cost(cents: f64) -> String {
    let dollars = cents / 100.0;
    if dollars != 0.0 && dollars.abs() < 1.0 {
        format!("${:.4}", dollars)
    } else {
        format_currency(cents.round() as i64, Some("USD"))
    }
}

/// `0.1234` -> `12.3%`
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Period-over-period change with an explicit sign.
pub fn format_change(fraction: f64) -> String {
    let pct = fraction * 100.0;
    if pct > 0.0 {
        format!("+{:.1}%", pct)
    } else {
        format!("{:.1}%", pct)
    }
}

/// `1234` -> `1.2K`, `5_600_000` -> `5.6M`
pub fn format_compact(n: u64) -> String {
    match n {
        0..=999 => n.to_string(),
        1_000..=999_999 => trim_decimal(n as f64 / 1_000.0, "K"),
        1_000_000..=999_999_999 => trim_decimal(n as f64 / 1_000_000.0, "M"),
        _ => trim_decimal(n as f64 / 1_000_000_000.0, "B"),
    }
}

fn trim_decimal(value: f64, suffix: &str) -> String {
    let text = format!("{:.1}", value);
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{}{}", text, suffix)
}

/// `125.0` -> `2m 05s`
pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}h {:02}m", h, m)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

pub fn format_latency(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else {
        format!("{:.0}ms", ms)
    }
}

/// ISO-8601 timestamp as `Mar 4, 2025 14:05` (UTC); unparseable input is shown as-is.
pub fn format_timestamp(iso: &str) -> String {
    match DateTime::parse_from_rfc3339(iso) {
        Ok(dt) => dt.with_timezone(&Utc).format("%b %-d, %Y %H:%M").to_string(),
        Err(_) => iso.to_string(),
    }
}
