//! Segmentation of w3af HTTP transaction logs (`output-http.txt`).
//!
//! The log is a sequence of numbered blocks:
//!
//! ```text
//! ======...Request 1 - <date>=====...
//! <request>
//! ======...Response 1 - <date>=====...
//! HTTP/1.1 200 OK
//! <headers through content-type>
//! <body>
//! ======...========
//! ```
//!
//! Windows are applied in order: request block, request/response split,
//! header/body split, status line. A window that does not match leaves its
//! field empty and the transaction is kept as a partial record.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::report::HttpTransaction;

static RE_REQUEST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^={30,}Request (\d+) [^\n]*$").expect("valid request marker regex")
});

static RE_RESPONSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^={20,}Response (\d+) [^\n]*$").expect("valid response marker regex")
});

static RE_TRAILER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^={70,}[ \t\r]*$").expect("valid trailer regex"));

static RE_HEADERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\A.*?content-type: [^\n]*\n").expect("valid response header regex")
});

static RE_STATUS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\AHTTP/\d\.\d ([^\r\n]+)").expect("valid status line regex"));

/// Split a transaction log into request/response records.
pub fn parse(text: &str) -> Vec<HttpTransaction> {
    let markers: Vec<_> = RE_REQUEST.captures_iter(text).collect();
    let mut transactions = Vec::with_capacity(markers.len());

    for (i, caps) in markers.iter().enumerate() {
        let (Some(marker), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let block = strip_trailer(text[marker.end()..end].trim_start_matches(['\r', '\n']));

        let id = match id.as_str().parse::<u32>() {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(id = id.as_str(), error = %e, "HTTP transaction id out of range");
                None
            }
        };
        let tx = transaction(id, block);
        if tx.is_partial() {
            tracing::warn!(id = ?tx.id, "Partial HTTP transaction");
        }
        transactions.push(tx);
    }

    transactions
}

/// Drop the closing `=====` line and anything after it.
fn strip_trailer(block: &str) -> &str {
    match RE_TRAILER.find(block) {
        Some(m) => &block[..m.start()],
        None => block,
    }
}

fn transaction(id: Option<u32>, block: &str) -> HttpTransaction {
    let Some(marker) = RE_RESPONSE.find(block) else {
        return HttpTransaction {
            id,
            request: non_blank(block),
            ..HttpTransaction::default()
        };
    };

    let request = non_blank(&block[..marker.start()]);
    let response = block[marker.end()..].trim_start_matches(['\r', '\n']);

    let response_status = RE_STATUS
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string());

    let (response_headers, response_body) = match RE_HEADERS.find(response) {
        Some(m) => (
            non_blank(&response[..m.end()]),
            non_blank(&response[m.end()..]),
        ),
        None => (None, None),
    };

    HttpTransaction {
        id,
        request,
        response_status,
        response_headers,
        response_body,
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
