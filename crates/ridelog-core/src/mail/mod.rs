//! Reading receipts out of exported email messages.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike};
use mailparse::{dateparse, parse_mail, MailHeaderMap, ParsedMail};
use tracing::{debug, warn};

use crate::error::{MailError, Result, RidelogError};
use crate::models::ride::RawReceipt;

/// A receipt message: the decoded receipt plus the headers we filter on.
#[derive(Debug, Clone)]
pub struct ReceiptMessage {
    pub subject: Option<String>,
    pub receipt: RawReceipt,
}

impl ReceiptMessage {
    /// Whether the subject contains `filter` (case-insensitive). Messages
    /// without a subject never match.
    pub fn subject_matches(&self, filter: &str) -> bool {
        self.subject
            .as_deref()
            .map(|s| s.to_lowercase().contains(&filter.to_lowercase()))
            .unwrap_or(false)
    }
}

/// Decode an RFC 822 message into a receipt.
///
/// The body is the first `text/plain` part; the fallback year comes from the
/// `Date` header, in the sender's own offset.
pub fn parse_message(bytes: &[u8]) -> std::result::Result<ReceiptMessage, MailError> {
    let mail = parse_mail(bytes)?;

    let body = find_text_body(&mail).ok_or(MailError::NoTextBody)?;
    let year = mail
        .headers
        .get_first_value("Date")
        .and_then(|d| header_year(&d))
        .ok_or(MailError::NoDate)?;
    let subject = mail.headers.get_first_value("Subject");

    Ok(ReceiptMessage {
        subject,
        receipt: RawReceipt::new(&body, year),
    })
}

/// Read one `.eml` file.
pub fn read_message(path: &Path) -> Result<ReceiptMessage> {
    let bytes = fs::read(path)?;
    let mut message = parse_message(&bytes)?;

    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    message.receipt = message.receipt.with_source(label);

    Ok(message)
}

/// Outcome of reading a set of message files.
#[derive(Debug, Default)]
pub struct LoadedReceipts {
    /// Receipts in input order.
    pub receipts: Vec<RawReceipt>,
    /// Messages left out by the subject filter.
    pub filtered: usize,
    /// Files that could not be read or decoded.
    pub failures: Vec<(PathBuf, RidelogError)>,
}

/// Read every file, skipping (and logging) the ones that cannot be decoded
/// or whose subject does not match `subject_filter`. `progress` is called
/// once per input path after it has been handled.
pub fn load_receipts<P: AsRef<Path>>(
    paths: &[P],
    subject_filter: Option<&str>,
    mut progress: impl FnMut(&Path),
) -> LoadedReceipts {
    let mut loaded = LoadedReceipts {
        receipts: Vec::with_capacity(paths.len()),
        ..LoadedReceipts::default()
    };

    for path in paths {
        let path = path.as_ref();
        match read_message(path) {
            Ok(message) => match subject_filter {
                Some(filter) if !message.subject_matches(filter) => {
                    debug!("Skipping {}: subject does not match {:?}", path.display(), filter);
                    loaded.filtered += 1;
                }
                _ => loaded.receipts.push(message.receipt),
            },
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                loaded.failures.push((path.to_path_buf(), e));
            }
        }
        progress(path);
    }

    loaded
}

fn find_text_body(mail: &ParsedMail) -> Option<String> {
    if mail.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
        if let Ok(body) = mail.get_body() {
            return Some(body);
        }
    }

    mail.subparts.iter().find_map(find_text_body)
}

fn header_year(date: &str) -> Option<i32> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(date.trim()) {
        return Some(parsed.year());
    }

    // Lenient fallback for headers chrono rejects.
    let timestamp = dateparse(date).ok()?;
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.year())
}
